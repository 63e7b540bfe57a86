//! Drawing surface abstraction and the per-mode rendering strategies.
//!
//! Renderers only talk to a [`Surface`], which exposes the handful of 2D
//! raster operations the visualizer needs. Hosts adapt it to their canvas;
//! [`RecordingSurface`] keeps the calls as data for inspection.

mod background;
mod bars;
mod circle;
mod waveform;

pub use background::{background_level, render_background};
pub use bars::{bars_region, render_bars, BarsPipeline, PEAK_TICK_HEIGHT};
pub use circle::CircleRenderer;
pub use waveform::{render_waveform, waveform_region};

use crate::{Rgba, VisualizerMode, VisualizerSettings};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in surface pixels, `y` growing downwards.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Rgba,
}

impl GradientStop {
    pub const fn new(offset: f32, color: Rgba) -> Self {
        Self { offset, color }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    LinearGradient {
        start: Point,
        end: Point,
        stops: Vec<GradientStop>,
    },
    RadialGradient {
        center: Point,
        radius: f32,
        stops: Vec<GradientStop>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Rgba,
    pub width: f32,
}

/// 2D raster target. Every renderer clears the whole surface before drawing.
pub trait Surface {
    fn width(&self) -> f32;
    fn height(&self) -> f32;
    fn clear(&mut self, color: Rgba);
    fn fill_rect(&mut self, rect: Rect, paint: &Paint);
    fn fill_circle(&mut self, center: Point, radius: f32, paint: &Paint);
    fn fill_polygon(&mut self, points: &[Point], paint: &Paint);
    fn stroke_polyline(&mut self, points: &[Point], style: StrokeStyle);

    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width(), self.height())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Rgba),
    FillRect(Rect, Paint),
    FillCircle {
        center: Point,
        radius: f32,
        paint: Paint,
    },
    FillPolygon(Vec<Point>, Paint),
    StrokePolyline(Vec<Point>, StrokeStyle),
}

/// Surface that records draw calls instead of rasterising them.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    width: f32,
    height: f32,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn clear(&mut self, color: Rgba) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear(color));
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        self.commands.push(DrawCommand::FillRect(rect, paint.clone()));
    }

    fn fill_circle(&mut self, center: Point, radius: f32, paint: &Paint) {
        self.commands.push(DrawCommand::FillCircle {
            center,
            radius,
            paint: paint.clone(),
        });
    }

    fn fill_polygon(&mut self, points: &[Point], paint: &Paint) {
        self.commands
            .push(DrawCommand::FillPolygon(points.to_vec(), paint.clone()));
    }

    fn stroke_polyline(&mut self, points: &[Point], style: StrokeStyle) {
        self.commands
            .push(DrawCommand::StrokePolyline(points.to_vec(), style));
    }
}

/// Frame data handed to a renderer for one refresh.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub frequency: &'a [u8],
    pub time_domain: &'a [u8],
    pub sample_rate: u32,
    /// Wall-clock seconds since the loop started.
    pub time: f64,
}

/// The active rendering strategy together with the state it owns.
///
/// A new value is built for every loop start, so state from a previous mode
/// or settings snapshot is never reused.
#[derive(Debug)]
pub enum ModeRenderer {
    Bars(BarsPipeline),
    Waveform,
    Circle(CircleRenderer),
    Background,
}

impl ModeRenderer {
    pub fn new(mode: VisualizerMode) -> Self {
        match mode {
            VisualizerMode::Bars => Self::Bars(BarsPipeline::new()),
            VisualizerMode::Waveform => Self::Waveform,
            VisualizerMode::Circle => Self::Circle(CircleRenderer::new()),
            VisualizerMode::Background => Self::Background,
        }
    }

    pub fn mode(&self) -> VisualizerMode {
        match self {
            Self::Bars(_) => VisualizerMode::Bars,
            Self::Waveform => VisualizerMode::Waveform,
            Self::Circle(_) => VisualizerMode::Circle,
            Self::Background => VisualizerMode::Background,
        }
    }

    /// Clears `surface` and draws one frame using the given settings snapshot.
    pub fn render(
        &mut self,
        frame: FrameInput<'_>,
        settings: &VisualizerSettings,
        surface: &mut dyn Surface,
    ) {
        match self {
            Self::Bars(pipeline) => pipeline.render(frame, &settings.bars, surface),
            Self::Waveform => render_waveform(surface, frame.time_domain, &settings.waveform),
            Self::Circle(renderer) => renderer.render(surface, frame, &settings.circle),
            Self::Background => {
                render_background(surface, frame, &settings.background);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_surface_restarts_on_clear() {
        let mut surface = RecordingSurface::new(10.0, 10.0);
        surface.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), &Paint::Solid(Rgba::BLACK));
        surface.clear(Rgba::TRANSPARENT);
        surface.fill_circle(Point::new(5.0, 5.0), 2.0, &Paint::Solid(Rgba::BLACK));

        assert_eq!(surface.commands().len(), 2);
        assert_eq!(surface.commands()[0], DrawCommand::Clear(Rgba::TRANSPARENT));
    }

    #[test]
    fn every_mode_clears_the_surface_first() {
        let settings = VisualizerSettings::default();
        let frequency = vec![200_u8; 512];
        let time_domain = vec![128_u8; 512];
        let frame = FrameInput {
            frequency: &frequency,
            time_domain: &time_domain,
            sample_rate: 48_000,
            time: 0.25,
        };

        for mode in [
            VisualizerMode::Bars,
            VisualizerMode::Waveform,
            VisualizerMode::Circle,
            VisualizerMode::Background,
        ] {
            let mut renderer = ModeRenderer::new(mode);
            assert_eq!(renderer.mode(), mode);
            let mut surface = RecordingSurface::new(800.0, 600.0);
            renderer.render(frame, &settings, &mut surface);
            assert!(
                matches!(surface.commands().first(), Some(DrawCommand::Clear(_))),
                "{mode:?} did not clear"
            );
            assert!(surface.commands().len() > 1 || mode == VisualizerMode::Background);
        }
    }

    #[test]
    fn unsanitized_settings_render_without_panicking() {
        let mut settings = VisualizerSettings::default();
        settings.waveform.position.height = -20.0;
        settings.waveform.amplitude.max = f32::NAN;
        settings.bars.bar_width = -4.0;
        settings.bars.bar_height.min_height = 500.0;
        settings.bars.bar_height.max_height = 10.0;
        settings.circle.radius.max = f32::INFINITY;
        settings.background.intensity = f32::NAN;

        let frequency = vec![255_u8; 256];
        let time_domain = vec![255_u8; 256];
        let frame = FrameInput {
            frequency: &frequency,
            time_domain: &time_domain,
            sample_rate: 48_000,
            time: 1.0,
        };

        for mode in [
            VisualizerMode::Bars,
            VisualizerMode::Waveform,
            VisualizerMode::Circle,
            VisualizerMode::Background,
        ] {
            let mut surface = RecordingSurface::new(320.0, 240.0);
            ModeRenderer::new(mode).render(frame, &settings, &mut surface);
            assert!(matches!(surface.commands().first(), Some(DrawCommand::Clear(_))));
        }
    }
}
