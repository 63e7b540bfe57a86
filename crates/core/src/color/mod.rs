use std::{fmt, str::FromStr};

use palette::{blend::Blend, FromColor, Hsl, LinSrgba, Mix, Srgb, Srgba, WithAlpha};
use serde::{Deserialize, Serialize};

use crate::{Result, VisualizerError};

/// 8-bit RGBA colour. Serialized as a lowercase `#rrggbb` (or `#rrggbbaa` when
/// translucent) string, which is what the settings editor produces. Colour
/// maths goes through `palette`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa`. The leading `#` is optional.
    pub fn from_hex(value: &str) -> Result<Self> {
        let digits = value.trim().trim_start_matches('#');
        if !digits.is_ascii() {
            return Err(VisualizerError::InvalidInput("colour must be a hex string"));
        }

        let parsed = match digits.len() {
            8 => Srgba::<u8>::from_str(digits),
            3 | 6 => Srgb::<u8>::from_str(digits).map(|color| color.with_alpha(u8::MAX)),
            _ => {
                return Err(VisualizerError::InvalidInput(
                    "colour must have 3, 6 or 8 hex digits",
                ))
            }
        };
        parsed
            .map(Self::from)
            .map_err(|_| VisualizerError::InvalidInput("colour contains non-hex digits"))
    }

    /// Returns the same colour with its alpha replaced by `alpha` in [0, 1].
    pub fn with_alpha(self, alpha: f32) -> Self {
        let alpha = if alpha.is_finite() { alpha.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            a: (alpha * 255.0).round() as u8,
            ..self
        }
    }

    /// Builds an opaque colour from hue in degrees and saturation/lightness in
    /// percent.
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let unit = |percent: f32| {
            if percent.is_finite() {
                (percent / 100.0).clamp(0.0, 1.0)
            } else {
                0.0
            }
        };
        let hue = if hue.is_finite() { hue } else { 0.0 };

        let hsl: Hsl = Hsl::new(hue, unit(saturation), unit(lightness));
        let rgb: Srgb = Srgb::from_color(hsl);
        rgb.into_format::<u8>().with_alpha(u8::MAX).into()
    }

    /// Linear interpolation between two colours, `t` clamped to [0, 1].
    pub fn mix(self, other: Rgba, t: f32) -> Rgba {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        self.to_float().mix(other.to_float(), t).into_format::<u8, u8>().into()
    }

    /// Composites `top` over `self` with the given blend mode. Channels are
    /// blended opaque in linear light; alpha is taken from `top`.
    pub fn blend(self, top: Rgba, mode: BlendMode) -> Rgba {
        let backdrop: LinSrgba = LinSrgba::from_color(self.with_alpha(1.0).to_float());
        let source: LinSrgba = LinSrgba::from_color(top.with_alpha(1.0).to_float());
        let blended = match mode {
            BlendMode::Normal => source,
            BlendMode::Multiply => source.multiply(backdrop),
            BlendMode::Screen => source.screen(backdrop),
            BlendMode::Overlay => source.overlay(backdrop),
        };

        let encoded: Srgba = Srgba::from_color(blended);
        let color: Rgba = encoded.into_format::<u8, u8>().into();
        Rgba { a: top.a, ..color }
    }

    fn to_float(self) -> Srgba {
        Srgba::<u8>::from(self).into_format::<f32, f32>()
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::BLACK
    }
}

impl From<Srgba<u8>> for Rgba {
    fn from(value: Srgba<u8>) -> Self {
        let (r, g, b, a) = value.into_components();
        Self::new(r, g, b, a)
    }
}

impl From<Rgba> for Srgba<u8> {
    fn from(value: Rgba) -> Self {
        Srgba::new(value.r, value.g, value.b, value.a)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == u8::MAX {
            write!(f, "#{:x}", Srgb::new(self.r, self.g, self.b))
        } else {
            write!(f, "#{:x}", Srgba::<u8>::from(*self))
        }
    }
}

impl TryFrom<String> for Rgba {
    type Error = VisualizerError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<Rgba> for String {
    fn from(value: Rgba) -> Self {
        value.to_string()
    }
}

/// How the background accent colour is composited onto the base colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
}
