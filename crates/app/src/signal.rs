use std::f32::consts::TAU;

/// Envelope cycles per second applied to the whole mixture.
const ENVELOPE_HZ: f32 = 0.25;

/// Mixture of sine tones under a slow amplitude envelope. Stands in for a
/// playing media element when rendering offline.
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    frequencies: Vec<f32>,
    sample_rate: u32,
    position: u64,
}

impl ToneGenerator {
    pub fn new(frequencies: Vec<f32>, sample_rate: u32) -> Self {
        let frequencies = frequencies
            .into_iter()
            .filter(|hz| hz.is_finite() && *hz > 0.0)
            .collect();
        Self {
            frequencies,
            sample_rate: sample_rate.max(1),
            position: 0,
        }
    }

    /// Produces the next `len` samples in [-1, 1].
    pub fn next_block(&mut self, len: usize) -> Vec<f32> {
        let rate = self.sample_rate as f32;
        let gain = 1.0 / self.frequencies.len().max(1) as f32;

        (0..len)
            .map(|_| {
                let t = (self.position % (self.sample_rate as u64 * 3600)) as f32 / rate;
                self.position += 1;
                let envelope = 0.6 + 0.4 * (TAU * ENVELOPE_HZ * t).sin();
                let mix: f32 = self
                    .frequencies
                    .iter()
                    .map(|hz| (TAU * hz * t).sin())
                    .sum();
                mix * gain * envelope
            })
            .collect()
    }
}
