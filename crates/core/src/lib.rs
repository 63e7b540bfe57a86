//! Core library for the audio visualizer.
//!
//! Each module owns one stage of the per-frame pipeline: the analysis
//! boundary, the bar height processor, the falling-bar physics, the mode
//! renderers and the driver that schedules them against playback state.
//! Hosts supply a [`render::Surface`] and an [`AnalysisSource`].

pub mod analysis;
pub mod color;
pub mod config;
pub mod driver;
pub mod error;
pub mod falling;
pub mod render;
pub mod session;
pub mod spectrum;

pub use analysis::{AnalyserHandle, AnalyserState, AnalysisSource, SoftwareAnalyser};
pub use color::{BlendMode, Rgba};
pub use config::{
    AmplitudeRange, BackgroundColors, BackgroundEffect, BackgroundSettings, BarColors,
    BarDirection, BarHeightSettings, BarStyle, BarsPosition, BarsSettings, CircleColors,
    CirclePosition, CircleSettings, FallingBarsSettings, FrequencyRange, RadiusRange,
    RenderStyle, SmoothingSettings, VisualizerMode, VisualizerSettings, WaveformColors,
    WaveformPosition, WaveformSettings,
};
pub use driver::{AnimationDriver, DriverState, FrameOutcome, LoopToken};
pub use error::{Result, VisualizerError};
pub use falling::{FallingBarState, FallingBarsSimulator};
pub use render::{FrameInput, ModeRenderer, Surface};
pub use session::AnimationSession;
pub use spectrum::SpectralFrameProcessor;
