//! Gravity and peak-hold post-processing for bar heights.

use crate::FallingBarsSettings;

/// Frames a fresh peak is held before it starts to fall (~0.5s at 60fps).
pub const PEAK_HOLD_FRAMES: u32 = 30;
/// Share of the falling height lost per frame, multiplied by gravity.
pub const FALL_RATE: f32 = 0.1;
/// Share of the peak height lost per frame once the hold expires.
pub const PEAK_FALL_RATE: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallingBarState {
    pub falling_height: f32,
    pub peak_height: f32,
    pub peak_timer: u32,
}

impl FallingBarState {
    fn settled(height: f32) -> Self {
        Self {
            falling_height: height,
            peak_height: height,
            peak_timer: 0,
        }
    }

    fn step(&mut self, current: f32, gravity: f32) {
        if current > self.falling_height {
            self.falling_height = current;
            if current > self.peak_height {
                self.peak_height = current;
                self.peak_timer = PEAK_HOLD_FRAMES;
            }
        } else {
            let decayed = self.falling_height - self.falling_height * gravity * FALL_RATE;
            self.falling_height = current.max(decayed);
        }

        if self.peak_timer > 0 {
            self.peak_timer -= 1;
        } else {
            let decayed = self.peak_height - self.peak_height * gravity * PEAK_FALL_RATE;
            self.peak_height = decayed.max(self.falling_height);
        }
    }
}

/// Per-index falling state. Owned by exactly one bars pipeline; a change in
/// bar count discards everything.
#[derive(Debug, Default, Clone)]
pub struct FallingBarsSimulator {
    states: Vec<FallingBarState>,
    falling: Vec<f32>,
    peaks: Vec<f32>,
}

impl FallingBarsSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn states(&self) -> &[FallingBarState] {
        &self.states
    }

    /// Heights to draw in place of the raw ones.
    pub fn falling_heights(&self) -> &[f32] {
        &self.falling
    }

    /// Peak marker heights.
    pub fn peak_heights(&self) -> &[f32] {
        &self.peaks
    }

    pub fn reset(&mut self) {
        self.states.clear();
        self.falling.clear();
        self.peaks.clear();
    }

    /// Advances every bar by one frame.
    pub fn update(&mut self, heights: &[f32], settings: &FallingBarsSettings) {
        if self.states.len() != heights.len() {
            tracing::trace!(
                previous = self.states.len(),
                current = heights.len(),
                "bar count changed, falling state reinitialised"
            );
            self.states = heights.iter().map(|&h| FallingBarState::settled(h)).collect();
        }

        let gravity = if settings.gravity.is_finite() {
            settings.gravity.clamp(FallingBarsSettings::MIN_GRAVITY, 1.0)
        } else {
            FallingBarsSettings::default().gravity
        };

        for (state, &current) in self.states.iter_mut().zip(heights) {
            state.step(current, gravity);
        }

        self.falling.clear();
        self.falling
            .extend(self.states.iter().map(|state| state.falling_height));
        self.peaks.clear();
        self.peaks.extend(self.states.iter().map(|state| state.peak_height));
    }
}
