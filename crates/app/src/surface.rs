use std::path::Path;

use audio_visualizer_core::{
    render::{GradientStop, Paint, Point, Rect, StrokeStyle},
    Result, Rgba, Surface, VisualizerError,
};
use tiny_skia as sk;

/// Rasterising surface backed by a `tiny-skia` pixmap.
pub struct PixmapSurface {
    pixmap: sk::Pixmap,
}

impl PixmapSurface {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = sk::Pixmap::new(width, height)
            .ok_or(VisualizerError::InvalidInput("surface size must be non-zero"))?;
        Ok(Self { pixmap })
    }

    pub fn pixmap(&self) -> &sk::Pixmap {
        &self.pixmap
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.pixmap.save_png(path).map_err(|err| {
            VisualizerError::msg(format!("failed to write {}: {err}", path.display()))
        })
    }
}

impl Surface for PixmapSurface {
    fn width(&self) -> f32 {
        self.pixmap.width() as f32
    }

    fn height(&self) -> f32 {
        self.pixmap.height() as f32
    }

    fn clear(&mut self, color: Rgba) {
        self.pixmap.fill(to_color(color));
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        let (Some(rect), Some(paint)) = (
            sk::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height),
            to_paint(paint),
        ) else {
            return;
        };
        self.pixmap
            .fill_rect(rect, &paint, sk::Transform::identity(), None);
    }

    fn fill_circle(&mut self, center: Point, radius: f32, paint: &Paint) {
        let (Some(path), Some(paint)) = (
            sk::PathBuilder::from_circle(center.x, center.y, radius),
            to_paint(paint),
        ) else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &paint,
            sk::FillRule::Winding,
            sk::Transform::identity(),
            None,
        );
    }

    fn fill_polygon(&mut self, points: &[Point], paint: &Paint) {
        let (Some(path), Some(paint)) = (build_path(points, true), to_paint(paint)) else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &paint,
            sk::FillRule::Winding,
            sk::Transform::identity(),
            None,
        );
    }

    fn stroke_polyline(&mut self, points: &[Point], style: StrokeStyle) {
        let Some(path) = build_path(points, false) else {
            return;
        };

        let mut paint = sk::Paint::default();
        paint.set_color(to_color(style.color));
        paint.anti_alias = true;
        let stroke = sk::Stroke {
            width: style.width,
            line_cap: sk::LineCap::Round,
            line_join: sk::LineJoin::Round,
            ..sk::Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, sk::Transform::identity(), None);
    }
}

fn to_color(color: Rgba) -> sk::Color {
    sk::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn to_point(point: Point) -> sk::Point {
    sk::Point::from_xy(point.x, point.y)
}

fn to_stops(stops: &[GradientStop]) -> Vec<sk::GradientStop> {
    stops
        .iter()
        .map(|stop| sk::GradientStop::new(stop.offset, to_color(stop.color)))
        .collect()
}

/// Degenerate gradients fall back to their first stop.
fn to_paint(paint: &Paint) -> Option<sk::Paint<'static>> {
    let shader = match paint {
        Paint::Solid(color) => sk::Shader::SolidColor(to_color(*color)),
        Paint::LinearGradient { start, end, stops } => sk::LinearGradient::new(
            to_point(*start),
            to_point(*end),
            to_stops(stops),
            sk::SpreadMode::Pad,
            sk::Transform::identity(),
        )
        .or_else(|| first_stop(stops))?,
        Paint::RadialGradient {
            center,
            radius,
            stops,
        } => sk::RadialGradient::new(
            to_point(*center),
            to_point(*center),
            *radius,
            to_stops(stops),
            sk::SpreadMode::Pad,
            sk::Transform::identity(),
        )
        .or_else(|| first_stop(stops))?,
    };

    Some(sk::Paint {
        shader,
        anti_alias: true,
        ..sk::Paint::default()
    })
}

fn first_stop(stops: &[GradientStop]) -> Option<sk::Shader<'static>> {
    stops
        .first()
        .map(|stop| sk::Shader::SolidColor(to_color(stop.color)))
}

fn build_path(points: &[Point], close: bool) -> Option<sk::Path> {
    let (first, rest) = points.split_first()?;
    let mut builder = sk::PathBuilder::new();
    builder.move_to(first.x, first.y);
    for point in rest {
        builder.line_to(point.x, point.y);
    }
    if close {
        builder.close();
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_surface_is_rejected() {
        assert!(PixmapSurface::new(0, 10).is_err());
    }

    #[test]
    fn rectangles_are_rasterised() {
        let mut surface = PixmapSurface::new(20, 20).unwrap();
        surface.clear(Rgba::BLACK);
        surface.fill_rect(
            Rect::new(0.0, 0.0, 10.0, 20.0),
            &Paint::Solid(Rgba::rgb(255, 0, 0)),
        );

        let inside = surface.pixmap().pixel(5, 5).unwrap();
        let outside = surface.pixmap().pixel(15, 5).unwrap();
        assert_eq!((inside.red(), inside.green()), (255, 0));
        assert_eq!((outside.red(), outside.alpha()), (0, 255));
    }

    #[test]
    fn degenerate_shapes_are_ignored() {
        let mut surface = PixmapSurface::new(8, 8).unwrap();
        surface.clear(Rgba::TRANSPARENT);
        surface.fill_rect(Rect::new(0.0, 0.0, 0.0, 4.0), &Paint::Solid(Rgba::BLACK));
        surface.stroke_polyline(&[], StrokeStyle { color: Rgba::BLACK, width: 2.0 });
        assert_eq!(surface.pixmap().pixel(0, 0).unwrap().alpha(), 0);
    }
}
