use std::{
    collections::VecDeque,
    f32::consts::PI,
    fmt,
    ops::Range,
    sync::{Arc, Mutex, MutexGuard},
};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};

use crate::{FrequencyRange, Result, VisualizerError};

pub const DEFAULT_WINDOW_SIZE: usize = 2048;
pub const DEFAULT_SMOOTHING_TIME_CONSTANT: f32 = 0.8;
pub const DEFAULT_MIN_DECIBELS: f32 = -100.0;
pub const DEFAULT_MAX_DECIBELS: f32 = -30.0;

const MIN_WINDOW_SIZE: usize = 32;
const MAX_WINDOW_SIZE: usize = 32_768;

/// Narrow view of the audio-analysis graph. The render loop only ever needs
/// two byte frames per refresh, the sample rate, and a way to wake the graph
/// up after it was suspended.
pub trait AnalysisSource {
    /// Sample rate of the analysed stream in Hz.
    fn sample_rate(&self) -> u32;

    /// Current analysis window size. Frames carry half as many values.
    fn window_size(&self) -> usize;

    /// Number of values in each frame.
    fn bin_count(&self) -> usize {
        self.window_size() / 2
    }

    /// Changes the analysis window size.
    fn configure_window(&mut self, size: usize) -> Result<()>;

    /// Refreshes `frame` in place with byte magnitudes, one per frequency bin.
    fn fill_frequency_frame(&mut self, frame: &mut [u8]) -> Result<()>;

    /// Refreshes `frame` in place with byte amplitudes (128 is silence).
    fn fill_time_domain_frame(&mut self, frame: &mut [u8]) -> Result<()>;

    /// Brings a suspended graph back to the running state.
    fn resume(&mut self) -> Result<()>;
}

/// Maps a frequency window onto bin indices: `floor(hz / nyquist * bins)`,
/// clamped to `[0, bins]`. The returned range is half-open and never inverted.
pub fn bin_range(range: FrequencyRange, sample_rate: u32, bins: usize) -> Range<usize> {
    let nyquist = sample_rate as f32 / 2.0;
    if nyquist <= 0.0 || bins == 0 {
        return 0..0;
    }

    let index = |hz: f32| {
        let raw = (hz / nyquist * bins as f32).floor();
        if raw.is_finite() {
            raw.clamp(0.0, bins as f32) as usize
        } else {
            0
        }
    };

    let start = index(range.min);
    let end = index(range.max).max(start);
    start..end
}

/// Lifecycle of the analysis graph, mirroring an audio context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyserState {
    Suspended,
    Running,
    Closed,
}

/// Software stand-in for a browser analyser node.
///
/// Keeps the most recent `window_size` mono samples. Frequency frames use a
/// Blackman window, an FFT, exponential smoothing over time, and a decibel
/// mapping of `[min_decibels, max_decibels]` onto `[0, 255]`.
pub struct SoftwareAnalyser {
    sample_rate: u32,
    window_size: usize,
    smoothing_time_constant: f32,
    min_decibels: f32,
    max_decibels: f32,
    state: AnalyserState,
    history: VecDeque<f32>,
    smoothed: Vec<f32>,
    fft: FftResources,
}

impl SoftwareAnalyser {
    /// Creates a suspended analyser with the default window size.
    pub fn new(sample_rate: u32) -> Self {
        let fft = FftResources::plan(DEFAULT_WINDOW_SIZE);
        Self {
            sample_rate,
            window_size: DEFAULT_WINDOW_SIZE,
            smoothing_time_constant: DEFAULT_SMOOTHING_TIME_CONSTANT,
            min_decibels: DEFAULT_MIN_DECIBELS,
            max_decibels: DEFAULT_MAX_DECIBELS,
            state: AnalyserState::Suspended,
            history: VecDeque::with_capacity(DEFAULT_WINDOW_SIZE),
            smoothed: vec![0.0; DEFAULT_WINDOW_SIZE / 2],
            fft,
        }
    }

    pub fn state(&self) -> AnalyserState {
        self.state
    }

    /// Sets how much of the previous frequency frame survives into the next.
    pub fn set_smoothing_time_constant(&mut self, value: f32) {
        if value.is_finite() {
            self.smoothing_time_constant = value.clamp(0.0, 1.0);
        }
    }

    /// Sets the decibel window mapped onto the byte range.
    pub fn set_decibel_range(&mut self, min: f32, max: f32) -> Result<()> {
        if !(min.is_finite() && max.is_finite()) || min >= max {
            return Err(VisualizerError::InvalidInput(
                "decibel range must be finite with min below max",
            ));
        }
        self.min_decibels = min;
        self.max_decibels = max;
        Ok(())
    }

    /// Feeds mono samples in [-1, 1]. Only the latest window is retained.
    pub fn push_samples(&mut self, samples: &[f32]) {
        for &sample in samples {
            if self.history.len() == self.window_size {
                self.history.pop_front();
            }
            self.history
                .push_back(if sample.is_finite() { sample } else { 0.0 });
        }
    }

    /// Permanently shuts the analyser down.
    pub fn close(&mut self) {
        self.state = AnalyserState::Closed;
        self.history.clear();
    }

    fn compute_magnitudes(&mut self) -> Result<()> {
        let len = self.window_size;
        let missing = len - self.history.len().min(len);

        for (index, slot) in self.fft.input.iter_mut().enumerate() {
            let sample = if index < missing {
                0.0
            } else {
                self.history.get(index - missing).copied().unwrap_or(0.0)
            };
            *slot = sample * blackman_value(index, len);
        }

        self.fft.plan.process_with_scratch(
            &mut self.fft.input,
            &mut self.fft.spectrum,
            &mut self.fft.scratch,
        )?;

        let tau = self.smoothing_time_constant;
        let scale = 1.0 / len as f32;
        for (smoothed, bin) in self.smoothed.iter_mut().zip(self.fft.spectrum.iter()) {
            let magnitude = bin.norm() * scale;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;
        }

        Ok(())
    }

    fn magnitude_to_byte(&self, magnitude: f32) -> u8 {
        if magnitude <= 0.0 {
            return 0;
        }
        let db = 20.0 * magnitude.log10();
        let range = self.max_decibels - self.min_decibels;
        let scaled = (255.0 / range) * (db - self.min_decibels);
        if scaled.is_finite() {
            scaled.clamp(0.0, 255.0) as u8
        } else {
            0
        }
    }
}

impl AnalysisSource for SoftwareAnalyser {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn window_size(&self) -> usize {
        self.window_size
    }

    fn configure_window(&mut self, size: usize) -> Result<()> {
        if !size.is_power_of_two() || !(MIN_WINDOW_SIZE..=MAX_WINDOW_SIZE).contains(&size) {
            return Err(VisualizerError::InvalidInput(
                "analysis window must be a power of two between 32 and 32768",
            ));
        }
        if size == self.window_size {
            return Ok(());
        }

        self.fft = FftResources::plan(size);
        self.window_size = size;
        self.smoothed = vec![0.0; size / 2];
        while self.history.len() > size {
            self.history.pop_front();
        }
        Ok(())
    }

    fn fill_frequency_frame(&mut self, frame: &mut [u8]) -> Result<()> {
        self.compute_magnitudes()?;
        let mut values = self.smoothed.iter();
        for slot in frame.iter_mut() {
            *slot = values
                .next()
                .map(|&magnitude| self.magnitude_to_byte(magnitude))
                .unwrap_or(0);
        }
        Ok(())
    }

    fn fill_time_domain_frame(&mut self, frame: &mut [u8]) -> Result<()> {
        let available = self.history.len();
        let missing = frame.len().saturating_sub(available);
        let skip = available.saturating_sub(frame.len());

        for (index, slot) in frame.iter_mut().enumerate() {
            *slot = if index < missing {
                128
            } else {
                let sample = self
                    .history
                    .get(skip + index - missing)
                    .copied()
                    .unwrap_or(0.0);
                (128.0 * (1.0 + sample)).clamp(0.0, 255.0) as u8
            };
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        match self.state {
            AnalyserState::Closed => Err(VisualizerError::binding(
                "cannot resume an analyser that has been closed",
            )),
            _ => {
                self.state = AnalyserState::Running;
                Ok(())
            }
        }
    }
}

impl fmt::Debug for SoftwareAnalyser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftwareAnalyser")
            .field("sample_rate", &self.sample_rate)
            .field("window_size", &self.window_size)
            .field("smoothing_time_constant", &self.smoothing_time_constant)
            .field("state", &self.state)
            .field("buffered", &self.history.len())
            .finish()
    }
}

/// Shared, thread-safe view over a [`SoftwareAnalyser`]. A producer thread
/// pushes samples through one clone while the render loop reads frames through
/// another.
#[derive(Clone)]
pub struct AnalyserHandle {
    shared: Arc<Mutex<SoftwareAnalyser>>,
}

impl AnalyserHandle {
    pub fn new(analyser: SoftwareAnalyser) -> Self {
        Self {
            shared: Arc::new(Mutex::new(analyser)),
        }
    }

    pub fn push_samples(&self, samples: &[f32]) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }
        self.lock()?.push_samples(samples);
        Ok(())
    }

    pub fn close(&self) -> Result<()> {
        self.lock()?.close();
        Ok(())
    }

    pub fn state(&self) -> Result<AnalyserState> {
        Ok(self.lock()?.state())
    }

    fn lock(&self) -> Result<MutexGuard<'_, SoftwareAnalyser>> {
        self.shared
            .lock()
            .map_err(|_| VisualizerError::msg("analyser has been poisoned"))
    }
}

impl AnalysisSource for AnalyserHandle {
    fn sample_rate(&self) -> u32 {
        self.lock().map(|engine| engine.sample_rate()).unwrap_or(0)
    }

    fn window_size(&self) -> usize {
        self.lock().map(|engine| engine.window_size()).unwrap_or(0)
    }

    fn configure_window(&mut self, size: usize) -> Result<()> {
        self.lock()?.configure_window(size)
    }

    fn fill_frequency_frame(&mut self, frame: &mut [u8]) -> Result<()> {
        self.lock()?.fill_frequency_frame(frame)
    }

    fn fill_time_domain_frame(&mut self, frame: &mut [u8]) -> Result<()> {
        self.lock()?.fill_time_domain_frame(frame)
    }

    fn resume(&mut self) -> Result<()> {
        self.lock()?.resume()
    }
}

impl fmt::Debug for AnalyserHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyserHandle").finish()
    }
}

struct FftResources {
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

impl FftResources {
    fn plan(size: usize) -> Self {
        let plan = RealFftPlanner::<f32>::new().plan_fft_forward(size);
        let scratch = plan.make_scratch_vec();
        let spectrum = plan.make_output_vec();
        let input = plan.make_input_vec();
        Self {
            plan,
            scratch,
            spectrum,
            input,
        }
    }
}

fn blackman_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }

    let phase = 2.0 * PI * index as f32 / len as f32;
    0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos()
}
