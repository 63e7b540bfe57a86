use crate::{
    render::{ModeRenderer, Surface},
    AnalysisSource, AnimationSession, Result, VisualizerMode, VisualizerSettings,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverState {
    #[default]
    Idle,
    Running,
}

/// Identifies one started loop. Any later start or stop invalidates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoopToken(u64);

/// What a refresh did, and whether the host should schedule another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Drawn,
    /// Running but no analysis source is bound yet.
    Skipped,
    /// The token is stale or the driver is idle. Do not reschedule.
    Cancelled,
}

impl FrameOutcome {
    pub fn reschedule(self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

#[derive(Debug)]
struct ActiveLoop {
    token: LoopToken,
    mode: VisualizerMode,
    settings: VisualizerSettings,
    renderer: ModeRenderer,
    started_at: Option<f64>,
}

/// Per-refresh scheduler tied to playback state.
///
/// The host calls [`AnimationDriver::sync`] whenever playback, the mode or
/// the settings may have changed, and [`AnimationDriver::on_refresh`] on
/// every display refresh with the token it was handed.
#[derive(Debug, Default)]
pub struct AnimationDriver {
    session: AnimationSession,
    generation: u64,
    active: Option<ActiveLoop>,
    is_playing: bool,
}

impl AnimationDriver {
    pub fn new(session: AnimationSession) -> Self {
        Self {
            session,
            ..Self::default()
        }
    }

    pub fn session(&self) -> &AnimationSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut AnimationSession {
        &mut self.session
    }

    /// Binds the analysis source once. Later calls are ignored.
    pub fn bind(&mut self, source: Box<dyn AnalysisSource>) -> bool {
        self.session.bind(source)
    }

    pub fn state(&self) -> DriverState {
        if self.active.is_some() {
            DriverState::Running
        } else {
            DriverState::Idle
        }
    }

    pub fn current_token(&self) -> Option<LoopToken> {
        self.active.as_ref().map(|active| active.token)
    }

    pub fn mode(&self) -> Option<VisualizerMode> {
        self.active.as_ref().map(|active| active.mode)
    }

    /// Starts a fresh loop. Any running loop is stopped first so per-mode
    /// state is never shared between two loops.
    pub fn start(
        &mut self,
        mode: VisualizerMode,
        settings: &VisualizerSettings,
    ) -> Result<LoopToken> {
        self.stop();

        let settings = settings.sanitized();
        self.session.resume()?;
        self.session.configure_window(settings.bars.fft_size)?;

        self.generation += 1;
        let token = LoopToken(self.generation);
        self.active = Some(ActiveLoop {
            token,
            mode,
            settings,
            renderer: ModeRenderer::new(mode),
            started_at: None,
        });
        tracing::info!(?mode, generation = self.generation, "animation loop started");
        Ok(token)
    }

    /// Returns to idle. The outstanding token, if any, becomes stale.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            self.generation += 1;
            tracing::info!(mode = ?active.mode, "animation loop stopped");
        }
    }

    /// Reconciles the loop with the host's current inputs. Any change of the
    /// playing flag, mode or settings restarts the loop; unchanged inputs
    /// keep the running loop and its token.
    pub fn sync(
        &mut self,
        is_playing: bool,
        mode: VisualizerMode,
        settings: &VisualizerSettings,
    ) -> Result<Option<LoopToken>> {
        let was_playing = std::mem::replace(&mut self.is_playing, is_playing);
        if !is_playing {
            self.stop();
            return Ok(None);
        }

        if was_playing {
            if let Some(active) = &self.active {
                if active.mode == mode && active.settings == settings.sanitized() {
                    return Ok(Some(active.token));
                }
            }
        }

        match self.start(mode, settings) {
            Ok(token) => Ok(Some(token)),
            Err(err) => {
                self.is_playing = false;
                Err(err)
            }
        }
    }

    /// Runs one refresh of the loop identified by `token`. `timestamp` is the
    /// host's wall-clock time in seconds.
    pub fn on_refresh(
        &mut self,
        token: LoopToken,
        timestamp: f64,
        surface: &mut dyn Surface,
    ) -> Result<FrameOutcome> {
        let Some(active) = self.active.as_mut() else {
            return Ok(FrameOutcome::Cancelled);
        };
        if active.token != token {
            tracing::trace!(?token, "stale loop token");
            return Ok(FrameOutcome::Cancelled);
        }

        let started_at = *active.started_at.get_or_insert(timestamp);
        let elapsed = (timestamp - started_at).max(0.0);
        let Some(frame) = self.session.pull_frame(elapsed)? else {
            return Ok(FrameOutcome::Skipped);
        };

        active.renderer.render(frame, &active.settings, surface);
        Ok(FrameOutcome::Drawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DrawCommand, RecordingSurface};
    use crate::{AnalyserHandle, SoftwareAnalyser, VisualizerError};

    fn bound_driver() -> (AnimationDriver, AnalyserHandle) {
        let handle = AnalyserHandle::new(SoftwareAnalyser::new(48_000));
        let mut driver = AnimationDriver::default();
        assert!(driver.bind(Box::new(handle.clone())));
        (driver, handle)
    }

    #[test]
    fn playback_toggles_between_idle_and_running() {
        let (mut driver, handle) = bound_driver();
        let settings = VisualizerSettings::default();
        assert_eq!(driver.state(), DriverState::Idle);

        let token = driver.sync(true, VisualizerMode::Bars, &settings).unwrap();
        assert_eq!(driver.state(), DriverState::Running);
        assert_eq!(token, driver.current_token());
        assert_eq!(handle.state().unwrap(), crate::AnalyserState::Running);

        assert_eq!(driver.sync(true, VisualizerMode::Bars, &settings).unwrap(), token);

        assert_eq!(driver.sync(false, VisualizerMode::Bars, &settings).unwrap(), None);
        assert_eq!(driver.state(), DriverState::Idle);
    }

    #[test]
    fn stale_tokens_are_cancelled() {
        let (mut driver, _handle) = bound_driver();
        let mut surface = RecordingSurface::new(800.0, 600.0);
        let settings = VisualizerSettings::default();

        let first = driver.start(VisualizerMode::Bars, &settings).unwrap();
        let second = driver.start(VisualizerMode::Waveform, &settings).unwrap();
        assert_ne!(first, second);

        let outcome = driver.on_refresh(first, 0.0, &mut surface).unwrap();
        assert_eq!(outcome, FrameOutcome::Cancelled);
        assert!(!outcome.reschedule());
        assert!(surface.commands().is_empty());

        assert_eq!(driver.on_refresh(second, 0.0, &mut surface).unwrap(), FrameOutcome::Drawn);

        driver.stop();
        let outcome = driver.on_refresh(second, 0.016, &mut surface).unwrap();
        assert_eq!(outcome, FrameOutcome::Cancelled);
    }

    #[test]
    fn unbound_session_skips_frames() {
        let mut driver = AnimationDriver::default();
        let mut surface = RecordingSurface::new(800.0, 600.0);
        let token = driver.start(VisualizerMode::Circle, &VisualizerSettings::default()).unwrap();

        let outcome = driver.on_refresh(token, 0.0, &mut surface).unwrap();
        assert_eq!(outcome, FrameOutcome::Skipped);
        assert!(outcome.reschedule());
        assert!(surface.commands().is_empty());
    }

    #[test]
    fn binding_failure_leaves_driver_idle() {
        let (mut driver, handle) = bound_driver();
        handle.close().unwrap();

        let err = driver
            .sync(true, VisualizerMode::Bars, &VisualizerSettings::default())
            .unwrap_err();
        assert!(matches!(err, VisualizerError::Binding(_)));
        assert_eq!(driver.state(), DriverState::Idle);
    }

    #[test]
    fn settings_change_restarts_with_fresh_state() {
        let (mut driver, handle) = bound_driver();
        let mut settings = VisualizerSettings::default();
        let mut surface = RecordingSurface::new(800.0, 600.0);

        let first = driver.sync(true, VisualizerMode::Waveform, &settings).unwrap().unwrap();
        handle.push_samples(&[0.25; 2048]).unwrap();
        driver.on_refresh(first, 10.0, &mut surface).unwrap();

        settings.waveform.line_width = 5.0;
        let second = driver.sync(true, VisualizerMode::Waveform, &settings).unwrap().unwrap();
        assert_ne!(first, second);

        assert_eq!(driver.on_refresh(second, 11.0, &mut surface).unwrap(), FrameOutcome::Drawn);
        let DrawCommand::StrokePolyline(_, style) = &surface.commands()[1] else {
            panic!("expected the waveform stroke");
        };
        assert_eq!(style.width, 5.0);

        let third = driver.sync(true, VisualizerMode::Circle, &settings).unwrap().unwrap();
        assert_ne!(second, third);
        assert_eq!(driver.mode(), Some(VisualizerMode::Circle));
    }

    #[test]
    fn analysis_window_follows_fft_size() {
        let (mut driver, _handle) = bound_driver();
        let mut settings = VisualizerSettings::default();
        settings.bars.fft_size = 1000;
        let mut surface = RecordingSurface::new(800.0, 600.0);

        let token = driver.start(VisualizerMode::Bars, &settings).unwrap();
        driver.on_refresh(token, 0.0, &mut surface).unwrap();
        assert_eq!(driver.session_mut().pull_frame(0.0).unwrap().unwrap().frequency.len(), 512);
    }
}
