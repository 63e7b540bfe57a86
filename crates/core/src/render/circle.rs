use std::f32::consts::TAU;

use crate::{CircleSettings, Rgba};

use super::{FrameInput, Paint, Point, Surface};

/// Circular spectrum. Rotation is integrated over wall-clock time so the
/// angular speed does not depend on the refresh rate.
#[derive(Debug, Default, Clone)]
pub struct CircleRenderer {
    rotation: f32,
    last_time: Option<f64>,
}

impl CircleRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated rotation in radians, within `[0, 2π)`.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    fn advance(&mut self, time: f64, speed: f32) {
        if let Some(last) = self.last_time {
            let elapsed = (time - last).max(0.0) as f32;
            if speed.is_finite() {
                self.rotation = (self.rotation + speed * elapsed).rem_euclid(TAU);
            }
        }
        self.last_time = Some(time);
    }

    /// Draws one dot per frequency bin. The whole frame is mapped; the
    /// configured frequency range does not narrow it.
    pub fn render(
        &mut self,
        surface: &mut dyn Surface,
        frame: FrameInput<'_>,
        settings: &CircleSettings,
    ) {
        self.advance(frame.time, settings.rotation_speed);
        surface.clear(Rgba::TRANSPARENT);

        let values = frame.frequency;
        if values.is_empty() {
            return;
        }

        let center = Point::new(
            settings.position.center_x / 100.0 * surface.width(),
            settings.position.center_y / 100.0 * surface.height(),
        );
        let span = settings.radius.max - settings.radius.min;
        let count = values.len() as f32;
        let palette = (!settings.colors.use_spectrum && !settings.colors.custom_colors.is_empty())
            .then_some(settings.colors.custom_colors.as_slice());

        for (index, &value) in values.iter().enumerate() {
            let radius = settings.radius.min + value as f32 / 255.0 * span;
            let angle = index as f32 / count * TAU + self.rotation;
            let point = Point::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            );

            let color = match palette {
                Some(colors) => colors[index % colors.len()],
                None => Rgba::from_hsl(
                    index as f32 * 360.0 / count,
                    settings.colors.saturation,
                    settings.colors.brightness,
                ),
            };
            surface.fill_circle(point, settings.point_size, &Paint::Solid(color));
        }
    }
}
