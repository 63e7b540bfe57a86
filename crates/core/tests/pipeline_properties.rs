use audio_visualizer_core::{
    render::{bars_region, DrawCommand, Rect, RecordingSurface},
    AnalyserHandle, AnimationDriver, BarsSettings, FallingBarsSettings, FallingBarsSimulator,
    FrameOutcome, SoftwareAnalyser, SpectralFrameProcessor, VisualizerMode, VisualizerSettings,
};
use proptest::prelude::*;

const SAMPLE_RATE: u32 = 48_000;
/// Falling height treated as settled at zero.
const SETTLED: f32 = 1e-3;

fn capacity(width: f32, settings: &BarsSettings) -> usize {
    (width / (settings.bar_width + settings.gap)).floor() as usize
}

fn bars_settings() -> impl Strategy<Value = BarsSettings> {
    (
        (0.0_f32..12_000.0, 12_000.0_f32..24_000.0),
        (0.1_f32..10.0, any::<bool>()),
        (0.0_f32..50.0, 50.0_f32..4_000.0),
        (1.0_f32..50.0, 0.0_f32..50.0),
        (0_u32..10, 0.0_f32..=1.0),
    )
        .prop_map(|(range, shape, limits, spacing, smoothing)| {
            let mut settings = BarsSettings::default();
            (settings.frequency_range.min, settings.frequency_range.max) = range;
            (settings.bar_height.multiplier, settings.bar_height.logarithmic) = shape;
            (settings.bar_height.min_height, settings.bar_height.max_height) = limits;
            (settings.bar_width, settings.gap) = spacing;
            (
                settings.smoothing.neighbor_smoothing,
                settings.smoothing.temporal_smoothing,
            ) = smoothing;
            settings
        })
}

proptest! {
    #[test]
    fn heights_respect_capacity_and_clamp(
        settings in bars_settings(),
        first in prop::collection::vec(any::<u8>(), 0..1024),
        second in prop::collection::vec(any::<u8>(), 0..1024),
        width in 0.0_f32..2_000.0,
        height in 0.0_f32..2_000.0,
    ) {
        let region = Rect::new(0.0, 0.0, width, height);
        let limit = capacity(width, &settings);
        let (lo, hi) = (settings.bar_height.min_height, settings.bar_height.max_height);
        let tolerance = hi * 1e-5;
        let mut processor = SpectralFrameProcessor::new();

        for frame in [&first, &second] {
            let heights = processor.process(frame, &settings, region, SAMPLE_RATE);
            prop_assert!(heights.len() <= limit);
            for &h in heights {
                prop_assert!(
                    h >= lo - tolerance && h <= hi + tolerance,
                    "{h} outside [{lo}, {hi}]"
                );
            }
        }
    }

    #[test]
    fn identical_frames_give_identical_output_without_smoothing(
        mut settings in bars_settings(),
        frame in prop::collection::vec(any::<u8>(), 0..1024),
    ) {
        settings.smoothing.temporal_smoothing = 0.0;
        let region = Rect::new(0.0, 0.0, 800.0, 600.0);
        let mut processor = SpectralFrameProcessor::new();

        let first = processor.process(&frame, &settings, region, SAMPLE_RATE).to_vec();
        for _ in 0..3 {
            let again = processor.process(&frame, &settings, region, SAMPLE_RATE);
            prop_assert_eq!(again, first.as_slice());
        }
    }

    #[test]
    fn falling_heights_never_rise_after_a_drop(
        start in prop::collection::vec(0.0_f32..4_000.0, 1..64),
        floor_share in 0.0_f32..1.0,
        gravity in 0.01_f32..=1.0,
    ) {
        let settings = FallingBarsSettings { enabled: true, gravity, peak: true };
        let mut simulator = FallingBarsSimulator::new();
        simulator.update(&start, &settings);

        let dropped: Vec<f32> = start.iter().map(|h| h * floor_share).collect();
        let mut previous = simulator.falling_heights().to_vec();
        for _ in 0..120 {
            simulator.update(&dropped, &settings);
            let falling = simulator.falling_heights();
            for ((&now, &before), &current) in falling.iter().zip(&previous).zip(&dropped) {
                prop_assert!(now <= before);
                prop_assert!(now >= current);
            }
            for (peak, falling) in simulator.peak_heights().iter().zip(falling) {
                prop_assert!(peak >= falling);
            }
            previous = falling.to_vec();
        }
    }

    #[test]
    fn silence_drains_falling_bars_to_zero(
        start in 0.0_f32..4_000.0,
        gravity in 0.01_f32..=1.0,
    ) {
        let settings = FallingBarsSettings { enabled: true, gravity, peak: false };
        let mut simulator = FallingBarsSimulator::new();
        simulator.update(&[start], &settings);

        // Each silent frame keeps (1 - gravity / 10) of the height.
        let keep = 1.0 - gravity as f64 * 0.1;
        let frames = if start > SETTLED {
            ((SETTLED as f64 / start as f64).ln() / keep.ln()).ceil() as usize + 16
        } else {
            1
        };

        let mut previous = start;
        for _ in 0..frames {
            simulator.update(&[0.0], &settings);
            let now = simulator.falling_heights()[0];
            prop_assert!(now <= previous && now >= 0.0);
            previous = now;
        }
        prop_assert!(previous < SETTLED, "{previous} after {frames} frames");
    }
}

#[test]
fn reference_frame_emits_one_hundred_bars() {
    let settings = BarsSettings::default();
    let frame = vec![255_u8; 1024];
    let mut processor = SpectralFrameProcessor::new();

    let region = Rect::new(0.0, 0.0, 600.0, 400.0);
    let heights = processor.process(&frame, &settings, region, SAMPLE_RATE);
    assert_eq!(heights.len(), 100);
}

#[test]
fn default_settings_saturate_on_a_full_frame() {
    let settings = VisualizerSettings::default();
    assert_eq!(settings.bars.bar_height.multiplier, 2.0);

    // The height-derived scale is max(height / 2, 200), so a 4000 px surface
    // is the one where a full-scale bin reaches the 4000 px ceiling.
    let region = bars_region(&settings.bars.position, 600.0, 4_000.0);
    let frame = vec![255_u8; 1024];
    let mut processor = SpectralFrameProcessor::new();

    let heights = processor.process(&frame, &settings.bars, region, SAMPLE_RATE);
    assert!(!heights.is_empty());
    assert!(heights.iter().all(|&h| h == settings.bars.bar_height.max_height));
}

#[test]
fn single_spike_holds_its_peak_for_thirty_frames() {
    let settings = FallingBarsSettings {
        enabled: true,
        gravity: 0.3,
        peak: true,
    };
    let mut simulator = FallingBarsSimulator::new();
    simulator.update(&[0.0], &settings);

    simulator.update(&[200.0], &settings);
    assert_eq!(simulator.peak_heights(), &[200.0]);

    for frame in 0..29 {
        simulator.update(&[0.0], &settings);
        assert_eq!(simulator.peak_heights(), &[200.0], "silent frame {frame}");
    }

    simulator.update(&[0.0], &settings);
    assert!(simulator.peak_heights()[0] < 200.0);
}

#[test]
fn driver_draws_bars_from_a_live_tone() {
    let handle = AnalyserHandle::new(SoftwareAnalyser::new(SAMPLE_RATE));
    let mut driver = AnimationDriver::default();
    driver.bind(Box::new(handle.clone()));

    let settings = VisualizerSettings::default();
    let token = driver
        .sync(true, VisualizerMode::Bars, &settings)
        .unwrap()
        .unwrap();

    let tone: Vec<f32> = (0..2048)
        .map(|n| {
            let t = n as f32 / SAMPLE_RATE as f32;
            0.8 * (std::f32::consts::TAU * 1_000.0 * t).sin()
        })
        .collect();
    handle.push_samples(&tone).unwrap();

    let mut surface = RecordingSurface::new(600.0, 400.0);
    let outcome = driver.on_refresh(token, 0.0, &mut surface).unwrap();
    assert_eq!(outcome, FrameOutcome::Drawn);
    assert!(matches!(surface.commands()[0], DrawCommand::Clear(_)));
    assert!(surface
        .commands()
        .iter()
        .any(|command| matches!(command, DrawCommand::FillRect(..))));

    driver.sync(false, VisualizerMode::Bars, &settings).unwrap();
    let outcome = driver.on_refresh(token, 0.016, &mut surface).unwrap();
    assert_eq!(outcome, FrameOutcome::Cancelled);
}
