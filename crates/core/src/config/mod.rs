use serde::{Deserialize, Deserializer, Serialize};

use crate::{BlendMode, Result, Rgba};

/// Which of the four rendering strategies is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizerMode {
    #[default]
    Bars,
    Waveform,
    Circle,
    Background,
}

/// Top-level configuration tree, replaced wholesale by the settings editor.
///
/// Every field has a default so partial documents deserialize into a fully
/// populated tree. Numeric ranges are not enforced by deserialization; call
/// [`VisualizerSettings::sanitized`] at the boundary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerSettings {
    pub bars: BarsSettings,
    pub waveform: WaveformSettings,
    pub circle: CircleSettings,
    pub background: BackgroundSettings,
}

impl VisualizerSettings {
    /// Parses an editor document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns a copy with every numeric setting clamped into its valid range.
    /// Non-finite values are replaced by the field's default.
    pub fn sanitized(&self) -> Self {
        Self {
            bars: self.bars.sanitized(),
            waveform: self.waveform.sanitized(),
            circle: self.circle.sanitized(),
            background: self.background.sanitized(),
        }
    }
}

/// Inclusive frequency window in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyRange {
    pub min: f32,
    pub max: f32,
}

impl Default for FrequencyRange {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 10_000.0,
        }
    }
}

impl FrequencyRange {
    pub const LIMIT_HZ: f32 = 20_000.0;

    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    fn sanitized(&self, fallback: FrequencyRange) -> Self {
        let min = clamp_or(self.min, 0.0, Self::LIMIT_HZ, fallback.min);
        let max = clamp_or(self.max, 0.0, Self::LIMIT_HZ, fallback.max);
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BarsSettings {
    pub frequency_range: FrequencyRange,
    pub bar_height: BarHeightSettings,
    pub position: BarsPosition,
    pub render_style: RenderStyle,
    pub colors: BarColors,
    pub bar_width: f32,
    pub gap: f32,
    /// Analysis window size; the frequency frame carries half as many bins.
    #[serde(deserialize_with = "deserialize_count")]
    pub fft_size: usize,
    pub smoothing: SmoothingSettings,
    pub falling_bars: FallingBarsSettings,
}

impl Default for BarsSettings {
    fn default() -> Self {
        Self {
            frequency_range: FrequencyRange::default(),
            bar_height: BarHeightSettings::default(),
            position: BarsPosition::default(),
            render_style: RenderStyle::default(),
            colors: BarColors::default(),
            bar_width: 4.0,
            gap: 2.0,
            fft_size: 2048,
            smoothing: SmoothingSettings::default(),
            falling_bars: FallingBarsSettings::default(),
        }
    }
}

impl BarsSettings {
    pub const MIN_FFT_SIZE: usize = 32;
    pub const MAX_FFT_SIZE: usize = 32_768;

    fn sanitized(&self) -> Self {
        let defaults = Self::default();
        Self {
            frequency_range: self.frequency_range.sanitized(defaults.frequency_range),
            bar_height: self.bar_height.sanitized(),
            position: self.position.sanitized(),
            render_style: self.render_style,
            colors: self.colors.clone(),
            bar_width: clamp_or(self.bar_width, 1.0, 50.0, defaults.bar_width),
            gap: clamp_or(self.gap, 0.0, 50.0, defaults.gap),
            fft_size: snap_fft_size(self.fft_size),
            smoothing: self.smoothing.sanitized(),
            falling_bars: self.falling_bars.sanitized(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BarHeightSettings {
    pub multiplier: f32,
    pub min_height: f32,
    pub max_height: f32,
    pub logarithmic: bool,
}

impl Default for BarHeightSettings {
    fn default() -> Self {
        Self {
            multiplier: 2.0,
            min_height: 1.0,
            max_height: 4000.0,
            logarithmic: false,
        }
    }
}

impl BarHeightSettings {
    fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let min_height = clamp_or(self.min_height, 0.0, 50.0, defaults.min_height);
        let max_height = clamp_or(self.max_height, 50.0, 4000.0, defaults.max_height);
        Self {
            multiplier: clamp_or(self.multiplier, 0.1, 10.0, defaults.multiplier),
            min_height,
            max_height: max_height.max(min_height),
            logarithmic: self.logarithmic,
        }
    }
}

/// Bars region in percent of the surface. The vertical bounds are optional in
/// editor documents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BarsPosition {
    pub start_x: f32,
    pub end_x: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_y: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_y: Option<f32>,
}

impl Default for BarsPosition {
    fn default() -> Self {
        Self {
            start_x: 0.0,
            end_x: 100.0,
            start_y: None,
            end_y: None,
        }
    }
}

impl BarsPosition {
    pub fn start_y(&self) -> f32 {
        self.start_y.unwrap_or(0.0)
    }

    pub fn end_y(&self) -> f32 {
        self.end_y.unwrap_or(100.0)
    }

    fn sanitized(&self) -> Self {
        Self {
            start_x: clamp_or(self.start_x, 0.0, 100.0, 0.0),
            end_x: clamp_or(self.end_x, 0.0, 100.0, 100.0),
            start_y: self.start_y.map(|v| clamp_or(v, 0.0, 100.0, 0.0)),
            end_y: self.end_y.map(|v| clamp_or(v, 0.0, 100.0, 100.0)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    #[serde(rename = "type")]
    pub kind: BarStyle,
    pub direction: BarDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarStyle {
    #[default]
    Bars,
    Dots,
    Lines,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarDirection {
    #[default]
    Up,
    Down,
    Both,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarColors {
    pub primary: Rgba,
    pub secondary: Rgba,
    pub gradient: bool,
}

impl Default for BarColors {
    fn default() -> Self {
        Self {
            primary: Rgba::rgb(0xff, 0x32, 0x32),
            secondary: Rgba::rgb(0xff, 0x66, 0x66),
            gradient: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SmoothingSettings {
    /// Number of interpolated bars inserted between neighbours (capped at 5).
    #[serde(deserialize_with = "deserialize_count")]
    pub neighbor_smoothing: u32,
    /// Weight of the previous frame in [0, 1].
    pub temporal_smoothing: f32,
}

impl Default for SmoothingSettings {
    fn default() -> Self {
        Self {
            neighbor_smoothing: 1,
            temporal_smoothing: 0.7,
        }
    }
}

impl SmoothingSettings {
    fn sanitized(&self) -> Self {
        Self {
            neighbor_smoothing: self.neighbor_smoothing.min(10),
            temporal_smoothing: clamp_or(self.temporal_smoothing, 0.0, 1.0, 0.7),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallingBarsSettings {
    pub enabled: bool,
    pub gravity: f32,
    pub peak: bool,
}

impl Default for FallingBarsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            gravity: 0.3,
            peak: true,
        }
    }
}

impl FallingBarsSettings {
    pub const MIN_GRAVITY: f32 = 0.01;

    fn sanitized(&self) -> Self {
        Self {
            enabled: self.enabled,
            gravity: clamp_or(self.gravity, Self::MIN_GRAVITY, 1.0, 0.3),
            peak: self.peak,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WaveformSettings {
    pub frequency_range: FrequencyRange,
    pub amplitude: AmplitudeRange,
    pub position: WaveformPosition,
    pub colors: WaveformColors,
    pub line_width: f32,
    pub smoothing: f32,
}

impl Default for WaveformSettings {
    fn default() -> Self {
        Self {
            frequency_range: FrequencyRange::default(),
            amplitude: AmplitudeRange::default(),
            position: WaveformPosition::default(),
            colors: WaveformColors::default(),
            line_width: 2.0,
            smoothing: 0.7,
        }
    }
}

impl WaveformSettings {
    fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let min = clamp_or(self.amplitude.min, 0.0, 300.0, defaults.amplitude.min);
        let max = clamp_or(self.amplitude.max, 0.0, 300.0, defaults.amplitude.max);
        Self {
            frequency_range: self.frequency_range.sanitized(defaults.frequency_range),
            amplitude: AmplitudeRange {
                min: min.min(max),
                max: max.max(min),
            },
            position: WaveformPosition {
                x: clamp_or(self.position.x, 0.0, 100.0, defaults.position.x),
                y: clamp_or(self.position.y, 0.0, 100.0, defaults.position.y),
                width: clamp_or(self.position.width, 10.0, 100.0, defaults.position.width),
                height: clamp_or(self.position.height, 10.0, 100.0, defaults.position.height),
            },
            colors: self.colors.clone(),
            line_width: clamp_or(self.line_width, 0.5, 10.0, defaults.line_width),
            smoothing: clamp_or(self.smoothing, 0.0, 1.0, defaults.smoothing),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmplitudeRange {
    pub min: f32,
    pub max: f32,
}

impl Default for AmplitudeRange {
    fn default() -> Self {
        Self { min: 0.0, max: 200.0 }
    }
}

/// Waveform region in percent of the surface; `y` is the vertical centre line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformPosition {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for WaveformPosition {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 50.0,
            width: 100.0,
            height: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WaveformColors {
    pub line_color: Rgba,
    pub background_color: Rgba,
    pub fill_gradient: bool,
}

impl Default for WaveformColors {
    fn default() -> Self {
        Self {
            line_color: Rgba::rgb(0x00, 0xff, 0x00),
            background_color: Rgba::BLACK,
            fill_gradient: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CircleSettings {
    pub frequency_range: FrequencyRange,
    pub radius: RadiusRange,
    pub position: CirclePosition,
    pub colors: CircleColors,
    pub point_size: f32,
    /// Radians per second; negative values rotate the other way.
    pub rotation_speed: f32,
}

impl Default for CircleSettings {
    fn default() -> Self {
        Self {
            frequency_range: FrequencyRange::default(),
            radius: RadiusRange::default(),
            position: CirclePosition::default(),
            colors: CircleColors::default(),
            point_size: 2.0,
            rotation_speed: 0.0,
        }
    }
}

impl CircleSettings {
    fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let min = clamp_or(self.radius.min, 10.0, 500.0, defaults.radius.min);
        let max = clamp_or(self.radius.max, 10.0, 500.0, defaults.radius.max);
        Self {
            frequency_range: self.frequency_range.sanitized(defaults.frequency_range),
            radius: RadiusRange {
                min: min.min(max),
                max: max.max(min),
            },
            position: CirclePosition {
                center_x: clamp_or(self.position.center_x, 0.0, 100.0, 50.0),
                center_y: clamp_or(self.position.center_y, 0.0, 100.0, 50.0),
            },
            colors: CircleColors {
                use_spectrum: self.colors.use_spectrum,
                custom_colors: self.colors.custom_colors.clone(),
                saturation: clamp_or(self.colors.saturation, 0.0, 100.0, 100.0),
                brightness: clamp_or(self.colors.brightness, 0.0, 100.0, 50.0),
            },
            point_size: clamp_or(self.point_size, 0.5, 10.0, defaults.point_size),
            rotation_speed: clamp_or(self.rotation_speed, -5.0, 5.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusRange {
    pub min: f32,
    pub max: f32,
}

impl Default for RadiusRange {
    fn default() -> Self {
        Self {
            min: 100.0,
            max: 300.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CirclePosition {
    pub center_x: f32,
    pub center_y: f32,
}

impl Default for CirclePosition {
    fn default() -> Self {
        Self {
            center_x: 50.0,
            center_y: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CircleColors {
    pub use_spectrum: bool,
    pub custom_colors: Vec<Rgba>,
    pub saturation: f32,
    pub brightness: f32,
}

impl Default for CircleColors {
    fn default() -> Self {
        Self {
            use_spectrum: true,
            custom_colors: vec![
                Rgba::rgb(0xff, 0, 0),
                Rgba::rgb(0, 0xff, 0),
                Rgba::rgb(0, 0, 0xff),
            ],
            saturation: 100.0,
            brightness: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackgroundSettings {
    pub frequency_range: FrequencyRange,
    pub sensitivity: f32,
    pub colors: BackgroundColors,
    pub effect: BackgroundEffect,
    pub intensity: f32,
}

impl Default for BackgroundSettings {
    fn default() -> Self {
        Self {
            frequency_range: FrequencyRange::new(0.0, 5000.0),
            sensitivity: 1.0,
            colors: BackgroundColors::default(),
            effect: BackgroundEffect::default(),
            intensity: 0.5,
        }
    }
}

impl BackgroundSettings {
    fn sanitized(&self) -> Self {
        let defaults = Self::default();
        Self {
            frequency_range: self.frequency_range.sanitized(defaults.frequency_range),
            sensitivity: clamp_or(self.sensitivity, 0.0, 3.0, defaults.sensitivity),
            colors: self.colors.clone(),
            effect: self.effect,
            intensity: clamp_or(self.intensity, 0.0, 1.0, defaults.intensity),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackgroundColors {
    pub base_color: Rgba,
    pub accent_color: Rgba,
    pub blend_mode: BlendMode,
}

impl Default for BackgroundColors {
    fn default() -> Self {
        Self {
            base_color: Rgba::BLACK,
            accent_color: Rgba::rgb(0xff, 0, 0),
            blend_mode: BlendMode::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundEffect {
    #[default]
    Solid,
    Gradient,
    Pulse,
    Wave,
}

/// Reads a count that editor sliders may emit as a fraction or a negative
/// number. Rounds to the nearest integer and saturates into the target type.
fn deserialize_count<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Count,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(T::saturating_from(raw.round()))
}

trait Count {
    fn saturating_from(value: f64) -> Self;
}

impl Count for u32 {
    fn saturating_from(value: f64) -> Self {
        value as u32
    }
}

impl Count for usize {
    fn saturating_from(value: f64) -> Self {
        value as usize
    }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

/// Snaps an analysis window size to the nearest supported power of two.
pub fn snap_fft_size(size: usize) -> usize {
    let size = size.clamp(BarsSettings::MIN_FFT_SIZE, BarsSettings::MAX_FFT_SIZE);
    if size.is_power_of_two() {
        return size;
    }

    let upper = size.next_power_of_two();
    let lower = upper / 2;
    if size - lower < upper - size {
        lower
    } else {
        upper
    }
}
