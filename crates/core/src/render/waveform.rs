use crate::{WaveformPosition, WaveformSettings};

use super::{GradientStop, Paint, Point, Rect, StrokeStyle, Surface};

const FILL_TOP_ALPHA: f32 = 0.5;

/// Converts the percentage position into a pixel region of the surface.
/// `position.y` is the centre line of the returned rectangle. Negative or NaN
/// sizes collapse to zero.
pub fn waveform_region(position: &WaveformPosition, width: f32, height: f32) -> Rect {
    let region_height = (position.height / 100.0 * height).max(0.0);
    Rect::new(
        position.x / 100.0 * width,
        position.y / 100.0 * height - region_height / 2.0,
        (position.width / 100.0 * width).max(0.0),
        region_height,
    )
}

/// Clears the surface to the background colour and strokes the time-domain
/// frame as one polyline, optionally filling the area beneath it.
pub fn render_waveform(surface: &mut dyn Surface, samples: &[u8], settings: &WaveformSettings) {
    surface.clear(settings.colors.background_color);
    if samples.is_empty() {
        return;
    }

    let region = waveform_region(&settings.position, surface.width(), surface.height());
    let center = region.center_y();
    let half_height = (region.height / 2.0).max(0.0);
    let amplitude = (settings.amplitude.max - settings.amplitude.min) / 2.0;
    let step = if samples.len() > 1 {
        region.width / (samples.len() - 1) as f32
    } else {
        0.0
    };

    let points: Vec<Point> = samples
        .iter()
        .enumerate()
        .map(|(index, &sample)| {
            let offset = (sample as f32 / 128.0 - 1.0) * amplitude;
            Point::new(
                region.x + index as f32 * step,
                center - offset.clamp(-half_height, half_height),
            )
        })
        .collect();

    let line_color = settings.colors.line_color;
    if settings.colors.fill_gradient {
        let mut area = points.clone();
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            area.push(Point::new(last.x, region.bottom()));
            area.push(Point::new(first.x, region.bottom()));
        }
        let paint = Paint::LinearGradient {
            start: Point::new(region.x, region.y),
            end: Point::new(region.x, region.bottom()),
            stops: vec![
                GradientStop::new(0.0, line_color.with_alpha(FILL_TOP_ALPHA)),
                GradientStop::new(1.0, line_color.with_alpha(0.0)),
            ],
        };
        surface.fill_polygon(&area, &paint);
    }

    surface.stroke_polyline(
        &points,
        StrokeStyle {
            color: line_color,
            width: settings.line_width,
        },
    );
}
