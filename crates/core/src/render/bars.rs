use crate::{
    BarDirection, BarStyle, BarsPosition, BarsSettings, FallingBarsSimulator, Rgba,
    SpectralFrameProcessor,
};

use super::{FrameInput, GradientStop, Paint, Point, Rect, StrokeStyle, Surface};

/// Thickness of a peak marker in pixels.
pub const PEAK_TICK_HEIGHT: f32 = 2.0;
const MIN_DOT_RADIUS: f32 = 2.0;
const DOT_RADIUS_DIVISOR: f32 = 20.0;
const LINE_WIDTH: f32 = 2.0;

/// Converts the percentage position into a pixel region of the surface.
pub fn bars_region(position: &BarsPosition, width: f32, height: f32) -> Rect {
    let x = position.start_x / 100.0 * width;
    let y = position.start_y() / 100.0 * height;
    Rect::new(
        x,
        y,
        (position.end_x / 100.0 * width - x).max(0.0),
        (position.end_y() / 100.0 * height - y).max(0.0),
    )
}

/// Height processing plus the optional falling-bars stage, owned by one loop.
#[derive(Debug, Default)]
pub struct BarsPipeline {
    processor: SpectralFrameProcessor,
    falling: FallingBarsSimulator,
}

impl BarsPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn processor(&self) -> &SpectralFrameProcessor {
        &self.processor
    }

    pub fn falling(&self) -> &FallingBarsSimulator {
        &self.falling
    }

    pub fn render(
        &mut self,
        frame: FrameInput<'_>,
        settings: &BarsSettings,
        surface: &mut dyn Surface,
    ) {
        let region = bars_region(&settings.position, surface.width(), surface.height());
        let heights = self
            .processor
            .process(frame.frequency, settings, region, frame.sample_rate);

        if settings.falling_bars.enabled {
            self.falling.update(heights, &settings.falling_bars);
            let peaks = settings
                .falling_bars
                .peak
                .then(|| self.falling.peak_heights());
            render_bars(surface, self.falling.falling_heights(), peaks, settings, region);
        } else {
            self.falling.reset();
            render_bars(surface, heights, None, settings, region);
        }
    }
}

/// Clears the surface and draws `heights` in the configured style and
/// direction, plus peak ticks when `peaks` is given.
pub fn render_bars(
    surface: &mut dyn Surface,
    heights: &[f32],
    peaks: Option<&[f32]>,
    settings: &BarsSettings,
    region: Rect,
) {
    surface.clear(Rgba::TRANSPARENT);
    if heights.is_empty() {
        return;
    }

    let layout = Layout::new(heights.len(), settings, region);
    match settings.render_style.kind {
        BarStyle::Bars => draw_rects(surface, heights, settings, &layout),
        BarStyle::Dots => draw_dots(surface, heights, settings, &layout),
        BarStyle::Lines => draw_lines(surface, heights, settings, &layout),
    }

    if let Some(peaks) = peaks {
        draw_peaks(surface, peaks, settings, &layout);
    }
}

/// Horizontal slots and the vertical anchor for one frame of bars.
struct Layout {
    region: Rect,
    direction: BarDirection,
    style: BarStyle,
    bar_width: f32,
    step: f32,
    even_spacing: f32,
}

impl Layout {
    fn new(count: usize, settings: &BarsSettings, region: Rect) -> Self {
        Self {
            region,
            direction: settings.render_style.direction,
            style: settings.render_style.kind,
            bar_width: settings.bar_width,
            step: settings.bar_width + settings.gap,
            even_spacing: region.width / count as f32,
        }
    }

    /// Left edge and width of the slot at `index`.
    fn slot(&self, index: usize) -> (f32, f32) {
        match self.style {
            BarStyle::Bars => (self.region.x + index as f32 * self.step, self.bar_width),
            BarStyle::Dots | BarStyle::Lines => (
                self.region.x + index as f32 * self.even_spacing,
                self.even_spacing,
            ),
        }
    }

    fn center_x(&self, index: usize) -> f32 {
        let (x, width) = self.slot(index);
        x + width / 2.0
    }

    /// Vertical positions of the tip(s) of a bar of `height`.
    fn tips(&self, height: f32) -> Tips {
        match self.direction {
            BarDirection::Up => Tips::One(self.region.bottom() - height),
            BarDirection::Down => Tips::One(self.region.y + height),
            BarDirection::Both => {
                let center = self.region.center_y();
                Tips::Two(center - height / 2.0, center + height / 2.0)
            }
        }
    }

    /// Filled extent of a bar of `height` as `(top, height)`.
    fn extent(&self, height: f32) -> (f32, f32) {
        match self.direction {
            BarDirection::Up => (self.region.bottom() - height, height),
            BarDirection::Down => (self.region.y, height),
            BarDirection::Both => (self.region.center_y() - height / 2.0, height),
        }
    }
}

enum Tips {
    One(f32),
    Two(f32, f32),
}

impl Tips {
    fn for_each(self, mut f: impl FnMut(f32)) {
        match self {
            Tips::One(y) => f(y),
            Tips::Two(upper, lower) => {
                f(upper);
                f(lower);
            }
        }
    }
}

fn draw_rects(
    surface: &mut dyn Surface,
    heights: &[f32],
    settings: &BarsSettings,
    layout: &Layout,
) {
    let colors = &settings.colors;
    let solid = Paint::Solid(colors.primary);

    for (index, &height) in heights.iter().enumerate() {
        if height <= 0.0 {
            continue;
        }
        let (x, width) = layout.slot(index);
        let (top, extent) = layout.extent(height);
        let rect = Rect::new(x, top, width, extent);

        if colors.gradient {
            let paint = bar_gradient(rect, layout.direction, colors.primary, colors.secondary);
            surface.fill_rect(rect, &paint);
        } else {
            surface.fill_rect(rect, &solid);
        }
    }
}

/// Vertical gradient with the primary colour at the tip(s) and the secondary
/// colour at the base.
fn bar_gradient(rect: Rect, direction: BarDirection, primary: Rgba, secondary: Rgba) -> Paint {
    let stops = match direction {
        BarDirection::Up => vec![
            GradientStop::new(0.0, primary),
            GradientStop::new(1.0, secondary),
        ],
        BarDirection::Down => vec![
            GradientStop::new(0.0, secondary),
            GradientStop::new(1.0, primary),
        ],
        BarDirection::Both => vec![
            GradientStop::new(0.0, primary),
            GradientStop::new(0.5, secondary),
            GradientStop::new(1.0, primary),
        ],
    };
    Paint::LinearGradient {
        start: Point::new(rect.x, rect.y),
        end: Point::new(rect.x, rect.bottom()),
        stops,
    }
}

fn draw_dots(surface: &mut dyn Surface, heights: &[f32], settings: &BarsSettings, layout: &Layout) {
    let colors = &settings.colors;
    let last = heights.len().saturating_sub(1).max(1) as f32;

    for (index, &height) in heights.iter().enumerate() {
        let color = if colors.gradient {
            colors.primary.mix(colors.secondary, index as f32 / last)
        } else {
            colors.primary
        };
        let paint = Paint::Solid(color);
        let radius = (height / DOT_RADIUS_DIVISOR).max(MIN_DOT_RADIUS);
        let x = layout.center_x(index);
        layout
            .tips(height)
            .for_each(|y| surface.fill_circle(Point::new(x, y), radius, &paint));
    }
}

fn draw_lines(
    surface: &mut dyn Surface,
    heights: &[f32],
    settings: &BarsSettings,
    layout: &Layout,
) {
    let style = StrokeStyle {
        color: settings.colors.primary,
        width: LINE_WIDTH,
    };

    let mut upper = Vec::with_capacity(heights.len());
    let mut lower = Vec::new();
    for (index, &height) in heights.iter().enumerate() {
        let x = layout.center_x(index);
        match layout.tips(height) {
            Tips::One(y) => upper.push(Point::new(x, y)),
            Tips::Two(top, bottom) => {
                upper.push(Point::new(x, top));
                lower.push(Point::new(x, bottom));
            }
        }
    }

    surface.stroke_polyline(&upper, style);
    if !lower.is_empty() {
        surface.stroke_polyline(&lower, style);
    }
}

fn draw_peaks(surface: &mut dyn Surface, peaks: &[f32], settings: &BarsSettings, layout: &Layout) {
    let paint = Paint::Solid(settings.colors.secondary);
    for (index, &peak) in peaks.iter().enumerate() {
        if peak <= 0.0 {
            continue;
        }
        let (x, width) = layout.slot(index);
        layout.tips(peak).for_each(|y| {
            let rect = Rect::new(x, y - PEAK_TICK_HEIGHT / 2.0, width, PEAK_TICK_HEIGHT);
            surface.fill_rect(rect, &paint);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DrawCommand, RecordingSurface};

    fn settings(kind: BarStyle, direction: BarDirection) -> BarsSettings {
        let mut settings = BarsSettings::default();
        settings.render_style.kind = kind;
        settings.render_style.direction = direction;
        settings
    }

    fn rects(surface: &RecordingSurface) -> Vec<Rect> {
        surface
            .commands()
            .iter()
            .filter_map(|command| match command {
                DrawCommand::FillRect(rect, _) => Some(*rect),
                _ => None,
            })
            .collect()
    }

    fn input(frequency: &[u8]) -> FrameInput<'_> {
        FrameInput {
            frequency,
            time_domain: &[],
            sample_rate: 48_000,
            time: 0.0,
        }
    }

    const REGION: Rect = Rect::new(0.0, 100.0, 60.0, 400.0);

    #[test]
    fn region_from_percentages() {
        let position = BarsPosition {
            start_x: 10.0,
            end_x: 60.0,
            start_y: Some(20.0),
            end_y: None,
        };
        let region = bars_region(&position, 1000.0, 500.0);
        assert_eq!(region, Rect::new(100.0, 100.0, 500.0, 400.0));

        let inverted = BarsPosition {
            start_x: 80.0,
            end_x: 20.0,
            ..BarsPosition::default()
        };
        assert_eq!(bars_region(&inverted, 1000.0, 500.0).width, 0.0);
    }

    #[test]
    fn bars_grow_from_the_configured_edge() {
        let mut surface = RecordingSurface::new(60.0, 600.0);

        let up = settings(BarStyle::Bars, BarDirection::Up);
        render_bars(&mut surface, &[50.0, 0.0, 80.0], None, &up, REGION);
        assert_eq!(
            rects(&surface),
            vec![Rect::new(0.0, 450.0, 4.0, 50.0), Rect::new(12.0, 420.0, 4.0, 80.0)]
        );

        let down = settings(BarStyle::Bars, BarDirection::Down);
        render_bars(&mut surface, &[50.0], None, &down, REGION);
        assert_eq!(rects(&surface), vec![Rect::new(0.0, 100.0, 4.0, 50.0)]);

        let both = settings(BarStyle::Bars, BarDirection::Both);
        render_bars(&mut surface, &[50.0], None, &both, REGION);
        assert_eq!(rects(&surface), vec![Rect::new(0.0, 275.0, 4.0, 50.0)]);
    }

    #[test]
    fn gradient_runs_from_tip_to_base() {
        let mut surface = RecordingSurface::new(60.0, 600.0);
        let mut bars = settings(BarStyle::Bars, BarDirection::Up);
        bars.colors.gradient = true;

        render_bars(&mut surface, &[50.0], None, &bars, REGION);
        match &surface.commands()[1] {
            DrawCommand::FillRect(_, Paint::LinearGradient { start, end, stops }) => {
                assert_eq!(start.y, 450.0);
                assert_eq!(end.y, 500.0);
                assert_eq!(stops[0].color, bars.colors.primary);
                assert_eq!(stops[1].color, bars.colors.secondary);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn dots_are_evenly_spaced_and_scale_with_height() {
        let mut surface = RecordingSurface::new(60.0, 600.0);
        let dots = settings(BarStyle::Dots, BarDirection::Up);
        render_bars(&mut surface, &[10.0, 100.0, 0.0], None, &dots, REGION);

        let circles: Vec<(Point, f32)> = surface
            .commands()
            .iter()
            .filter_map(|command| match command {
                DrawCommand::FillCircle { center, radius, .. } => Some((*center, *radius)),
                _ => None,
            })
            .collect();

        assert_eq!(circles.len(), 3);
        assert_eq!(circles[0], (Point::new(10.0, 490.0), 2.0));
        assert_eq!(circles[1], (Point::new(30.0, 400.0), 5.0));
        assert_eq!(circles[2], (Point::new(50.0, 500.0), 2.0));
    }

    #[test]
    fn mirrored_lines_draw_two_polylines() {
        let mut surface = RecordingSurface::new(60.0, 600.0);
        let lines = settings(BarStyle::Lines, BarDirection::Both);
        render_bars(&mut surface, &[40.0, 80.0], None, &lines, REGION);

        let lines: Vec<&Vec<Point>> = surface
            .commands()
            .iter()
            .filter_map(|command| match command {
                DrawCommand::StrokePolyline(points, _) => Some(points),
                _ => None,
            })
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], &vec![Point::new(15.0, 280.0), Point::new(45.0, 260.0)]);
        assert_eq!(lines[1], &vec![Point::new(15.0, 320.0), Point::new(45.0, 340.0)]);
    }

    #[test]
    fn peak_ticks_follow_direction() {
        let mut surface = RecordingSurface::new(60.0, 600.0);
        let both = settings(BarStyle::Bars, BarDirection::Both);
        render_bars(&mut surface, &[0.0], Some(&[100.0]), &both, REGION);

        assert_eq!(
            rects(&surface),
            vec![Rect::new(0.0, 249.0, 4.0, 2.0), Rect::new(0.0, 349.0, 4.0, 2.0)]
        );
    }

    #[test]
    fn pipeline_substitutes_falling_heights() {
        let mut pipeline = BarsPipeline::new();
        let mut bars = BarsSettings::default();
        bars.frequency_range.max = 24_000.0;
        bars.smoothing.neighbor_smoothing = 0;
        bars.smoothing.temporal_smoothing = 0.0;
        bars.falling_bars.enabled = true;

        let loud = [255_u8; 4];
        let quiet = [0_u8; 4];
        let mut surface = RecordingSurface::new(24.0, 400.0);

        pipeline.render(input(&quiet), &bars, &mut surface);
        pipeline.render(input(&loud), &bars, &mut surface);
        pipeline.render(input(&quiet), &bars, &mut surface);

        assert_eq!(pipeline.processor().previous(), &[1.0; 4]);
        let falling = pipeline.falling().falling_heights();
        assert!(falling.iter().all(|&h| h > 1.0 && h < 400.0));

        // Bars plus one peak tick per bar.
        assert_eq!(rects(&surface).len(), 8);
    }
}
