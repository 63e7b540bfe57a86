//! Turns one frequency frame into per-bar pixel heights for the bars mode.

use crate::{analysis::bin_range, render::Rect, BarsSettings};

/// Raw heights below this many pixels are treated as noise floor.
pub const NOISE_FLOOR_PX: f32 = 5.0;
/// Upper bound on interpolated bars inserted between two real bars.
pub const MAX_INTERPOLATED_BARS: u32 = 5;
/// Lower bound of the height-derived scale applied to normalised samples.
pub const MIN_HEIGHT_SCALE: f32 = 200.0;

/// Number of bars of `bar_width` separated by `gap` that fit into `width`.
pub fn bar_capacity(width: f32, bar_width: f32, gap: f32) -> usize {
    let step = bar_width + gap;
    if !(width.is_finite() && step.is_finite()) || width <= 0.0 || step <= 0.0 {
        return 0;
    }
    (width / step).floor() as usize
}

/// Stateful height computation for the bars mode.
///
/// The only state carried between calls is the previous output, used for
/// temporal smoothing. It is replaced wholesale whenever the output length
/// changes.
#[derive(Debug, Default, Clone)]
pub struct SpectralFrameProcessor {
    previous: Vec<f32>,
}

impl SpectralFrameProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Heights produced by the most recent call to [`Self::process`].
    pub fn previous(&self) -> &[f32] {
        &self.previous
    }

    pub fn reset(&mut self) {
        self.previous.clear();
    }

    /// Computes bar heights for `frame` inside `region` and stores them as the
    /// baseline for the next call.
    pub fn process(
        &mut self,
        frame: &[u8],
        settings: &BarsSettings,
        region: Rect,
        sample_rate: u32,
    ) -> &[f32] {
        let bins = bin_range(settings.frequency_range, sample_rate, frame.len());
        let filtered = &frame[bins];

        let capacity = bar_capacity(region.width, settings.bar_width, settings.gap);
        let count = capacity.min(filtered.len());

        let scale = (region.height / 2.0).max(MIN_HEIGHT_SCALE);
        let shaping = HeightShaping::from_settings(settings);
        let mut heights: Vec<f32> = filtered[..count]
            .iter()
            .map(|&sample| shaping.apply(sample, scale))
            .collect();

        let neighbors = settings.smoothing.neighbor_smoothing.min(MAX_INTERPOLATED_BARS) as usize;
        if neighbors > 0 && heights.len() > 1 {
            heights = interpolate_neighbors(&heights, neighbors);
            heights.truncate(capacity);
        }

        let alpha = unit_or_zero(settings.smoothing.temporal_smoothing);
        if self.previous.len() == heights.len() {
            if alpha > 0.0 {
                for (current, previous) in heights.iter_mut().zip(&self.previous) {
                    *current = previous * alpha + *current * (1.0 - alpha);
                }
            }
        } else if !self.previous.is_empty() {
            tracing::trace!(
                previous = self.previous.len(),
                current = heights.len(),
                "bar count changed, temporal smoothing restarts"
            );
        }

        self.previous = heights;
        &self.previous
    }
}

/// Per-sample part of the pipeline: normalise, square, scale, threshold,
/// optional log boost, clamp.
struct HeightShaping {
    multiplier: f32,
    logarithmic: bool,
    min_height: f32,
    max_height: f32,
}

impl HeightShaping {
    fn from_settings(settings: &BarsSettings) -> Self {
        let height = &settings.bar_height;
        let min_height = finite_or(height.min_height, 0.0);
        let max_height = finite_or(height.max_height, min_height);
        Self {
            multiplier: finite_or(height.multiplier, 1.0),
            logarithmic: height.logarithmic,
            min_height: min_height.min(max_height),
            max_height: max_height.max(min_height),
        }
    }

    fn apply(&self, sample: u8, scale: f32) -> f32 {
        let normalized = sample as f32 / 255.0;
        let mut height = normalized * normalized * self.multiplier * scale;

        if height < NOISE_FLOOR_PX {
            height = 0.0;
        }

        if self.logarithmic && height > 0.0 {
            height *= (height + 1.0).log10();
        }

        height.max(self.min_height).min(self.max_height)
    }
}

/// Inserts `count` linearly interpolated values between each adjacent pair.
fn interpolate_neighbors(heights: &[f32], count: usize) -> Vec<f32> {
    let mut expanded = Vec::with_capacity(heights.len() + (heights.len() - 1) * count);
    for pair in heights.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        expanded.push(from);
        for step in 1..=count {
            let t = step as f32 / (count + 1) as f32;
            expanded.push(from + (to - from) * t);
        }
    }
    if let Some(&last) = heights.last() {
        expanded.push(last);
    }
    expanded
}

fn unit_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}
