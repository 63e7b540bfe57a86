/// Result alias that carries the custom [`VisualizerError`] type.
pub type Result<T> = std::result::Result<T, VisualizerError>;

/// Common error type for the core crate.
///
/// Out-of-range settings and stale per-frame state are repaired in place and
/// never reach this type. What remains are problems the host has to act on:
/// a broken analysis binding, malformed calls, and boundary I/O.
#[derive(Debug, thiserror::Error)]
pub enum VisualizerError {
    /// Free-form message, mostly used for poisoned shared state.
    #[error("{0}")]
    Message(String),
    /// The caller handed the pipeline something it cannot work with.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Acquiring or resuming the audio-analysis graph failed.
    #[error("analysis binding failed: {0}")]
    Binding(String),
    /// The FFT backend rejected its buffers.
    #[error("fft failed: {0}")]
    Fft(#[from] realfft::FftError),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Settings documents that could not be (de)serialized.
    #[error("settings document is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

impl VisualizerError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Creates a binding error with the provided description.
    pub fn binding<T: Into<String>>(msg: T) -> Self {
        Self::Binding(msg.into())
    }
}

impl From<&str> for VisualizerError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for VisualizerError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
