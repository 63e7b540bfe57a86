use std::fmt;

use crate::{render::FrameInput, AnalysisSource, Result};

/// Binding between one playback source and its analysis graph.
///
/// There is at most one binding per session. Binding again while a source is
/// attached is a no-op; call [`AnimationSession::release`] first when the
/// playback element is replaced.
#[derive(Default)]
pub struct AnimationSession {
    source: Option<Box<dyn AnalysisSource>>,
    sample_rate: u32,
    frequency: Vec<u8>,
    time_domain: Vec<u8>,
}

impl AnimationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `source` unless one is already bound. Returns whether the
    /// source was taken.
    pub fn bind(&mut self, source: Box<dyn AnalysisSource>) -> bool {
        if self.source.is_some() {
            tracing::debug!("analysis source already bound, ignoring");
            return false;
        }

        self.sample_rate = source.sample_rate();
        tracing::info!(
            sample_rate = self.sample_rate,
            window = source.window_size(),
            "analysis source bound"
        );
        self.source = Some(source);
        true
    }

    /// Detaches and returns the current source.
    pub fn release(&mut self) -> Option<Box<dyn AnalysisSource>> {
        let source = self.source.take();
        if source.is_some() {
            tracing::info!("analysis source released");
        }
        self.sample_rate = 0;
        self.frequency.clear();
        self.time_domain.clear();
        source
    }

    pub fn is_bound(&self) -> bool {
        self.source.is_some()
    }

    /// Sample rate captured when the source was bound.
    pub fn sample_rate(&self) -> Option<u32> {
        self.source.as_ref().map(|_| self.sample_rate)
    }

    /// Resumes the bound graph. Without a binding there is nothing to resume.
    pub fn resume(&mut self) -> Result<()> {
        match self.source.as_mut() {
            Some(source) => source.resume(),
            None => Ok(()),
        }
    }

    /// Applies an analysis window size to the bound source.
    pub fn configure_window(&mut self, size: usize) -> Result<()> {
        let Some(source) = self.source.as_mut() else {
            return Ok(());
        };
        if source.window_size() != size {
            source.configure_window(size)?;
            tracing::debug!(window = size, "analysis window reconfigured");
        }
        Ok(())
    }

    /// Refreshes both frames in place and lends them out for one refresh.
    /// Returns `None` while no source is bound.
    pub fn pull_frame(&mut self, time: f64) -> Result<Option<FrameInput<'_>>> {
        let Some(source) = self.source.as_mut() else {
            return Ok(None);
        };

        let bins = source.bin_count();
        self.frequency.resize(bins, 0);
        self.time_domain.resize(bins, 128);
        source.fill_frequency_frame(&mut self.frequency)?;
        source.fill_time_domain_frame(&mut self.time_domain)?;

        Ok(Some(FrameInput {
            frequency: &self.frequency,
            time_domain: &self.time_domain,
            sample_rate: self.sample_rate,
            time,
        }))
    }
}

impl fmt::Debug for AnimationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationSession")
            .field("bound", &self.is_bound())
            .field("sample_rate", &self.sample_rate)
            .field("bins", &self.frequency.len())
            .finish()
    }
}
