use std::f64::consts::TAU;

use crate::{BackgroundEffect, BackgroundSettings};

use super::{FrameInput, GradientStop, Paint, Point, Rect, Surface};

/// Pulse oscillations per second.
const PULSE_HZ: f64 = 1.5;
const WAVE_COLUMN_WIDTH: f32 = 4.0;
const WAVE_SPATIAL_FREQUENCY: f64 = 0.02;
const WAVE_SPEED: f64 = 3.0;
/// Tallest wave column as a share of the surface height.
const WAVE_BAND_SHARE: f32 = 0.5;

/// Reduces the whole frame to a single level in [0, 1]: the mean magnitude
/// scaled by sensitivity and intensity.
pub fn background_level(frame: &[u8], settings: &BackgroundSettings) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }

    let sum: u64 = frame.iter().map(|&v| v as u64).sum();
    let mean = sum as f32 / frame.len() as f32 / 255.0;
    let level = mean * settings.sensitivity * settings.intensity;
    if level.is_finite() {
        level.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Redraws the whole surface for the configured effect and returns the level
/// that drove it. Nothing is carried between frames except `frame.time`.
pub fn render_background(
    surface: &mut dyn Surface,
    frame: FrameInput<'_>,
    settings: &BackgroundSettings,
) -> f32 {
    let level = background_level(frame.frequency, settings);
    let colors = &settings.colors;
    let base = colors.base_color;
    let accent = base.blend(colors.accent_color, colors.blend_mode);
    let bounds = surface.bounds();

    match settings.effect {
        BackgroundEffect::Solid => surface.clear(base.mix(accent, level)),
        BackgroundEffect::Gradient => {
            surface.clear(base);
            let paint = Paint::RadialGradient {
                center: Point::new(bounds.width / 2.0, bounds.height / 2.0),
                radius: bounds.width.hypot(bounds.height) / 2.0,
                stops: vec![
                    GradientStop::new(0.0, accent.with_alpha(level)),
                    GradientStop::new(1.0, accent.with_alpha(0.0)),
                ],
            };
            surface.fill_rect(bounds, &paint);
        }
        BackgroundEffect::Pulse => {
            surface.clear(base);
            let wave = ((frame.time * PULSE_HZ * TAU).sin() * 0.5 + 0.5) as f32;
            let alpha = wave * level;
            if alpha > 0.0 {
                surface.fill_rect(bounds, &Paint::Solid(accent.with_alpha(alpha)));
            }
        }
        BackgroundEffect::Wave => {
            surface.clear(base);
            let paint = Paint::Solid(accent);
            let center = bounds.height / 2.0;
            let tallest = bounds.height * WAVE_BAND_SHARE * level;
            let columns = (bounds.width / WAVE_COLUMN_WIDTH).ceil() as usize;

            for column in 0..columns {
                let x = column as f32 * WAVE_COLUMN_WIDTH;
                let phase = x as f64 * WAVE_SPATIAL_FREQUENCY + frame.time * WAVE_SPEED;
                let height = (phase.sin() * 0.5 + 0.5) as f32 * tallest;
                if height <= 0.0 {
                    continue;
                }
                let rect = Rect::new(x, center - height / 2.0, WAVE_COLUMN_WIDTH - 1.0, height);
                surface.fill_rect(rect, &paint);
            }
        }
    }

    level
}
