mod signal;
mod surface;

use std::path::{Path, PathBuf};

use audio_visualizer_core::{
    AnalyserHandle, AnimationDriver, FrameOutcome, SoftwareAnalyser, VisualizerError,
    VisualizerMode, VisualizerSettings,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::{signal::ToneGenerator, surface::PixmapSurface};

fn main() -> audio_visualizer_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => run_render(&args),
        Commands::Defaults => print_defaults(),
    }
}

fn run_render(args: &RenderArgs) -> audio_visualizer_core::Result<()> {
    let settings = load_settings(args.settings.as_deref())?;
    let mode = VisualizerMode::from(args.mode);
    tracing::info!(?mode, frames = args.frames, fps = args.fps, output = ?args.output, "rendering");

    std::fs::create_dir_all(&args.output)?;
    let mut surface = PixmapSurface::new(args.width, args.height)?;
    let mut tone = ToneGenerator::new(args.tones.clone(), args.sample_rate);

    let analyser = AnalyserHandle::new(SoftwareAnalyser::new(args.sample_rate));
    let mut driver = AnimationDriver::default();
    driver.bind(Box::new(analyser.clone()));

    let token = driver
        .sync(true, mode, &settings)?
        .ok_or_else(|| VisualizerError::msg("animation loop did not start"))?;

    let samples_per_frame = (args.sample_rate / args.fps).max(1) as usize;
    let mut saved = 0_u32;
    for frame in 0..args.frames {
        analyser.push_samples(&tone.next_block(samples_per_frame))?;
        let timestamp = frame as f64 / args.fps as f64;

        match driver.on_refresh(token, timestamp, &mut surface)? {
            FrameOutcome::Drawn => {
                if frame % args.save_every == 0 {
                    let path = args.output.join(format!("frame_{frame:05}.png"));
                    surface.save_png(&path)?;
                    saved += 1;
                }
            }
            FrameOutcome::Skipped => tracing::debug!(frame, "no analysis source"),
            FrameOutcome::Cancelled => break,
        }
    }

    driver.sync(false, mode, &settings)?;
    tracing::info!(saved, "render finished");
    Ok(())
}

fn load_settings(path: Option<&Path>) -> audio_visualizer_core::Result<VisualizerSettings> {
    let Some(path) = path else {
        return Ok(VisualizerSettings::default());
    };

    tracing::info!(?path, "loading settings");
    let json = std::fs::read_to_string(path)?;
    VisualizerSettings::from_json_str(&json)
}

fn print_defaults() -> audio_visualizer_core::Result<()> {
    println!("{}", VisualizerSettings::default().to_json_string_pretty()?);
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio-reactive visualizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a synthetic tone mixture to a sequence of PNG frames.
    Render(RenderArgs),
    /// Print the default settings document as JSON.
    Defaults,
}

#[derive(clap::Args, Debug)]
struct RenderArgs {
    /// Visualization mode.
    #[arg(short, long, value_enum, default_value_t = ModeArg::Bars)]
    mode: ModeArg,
    /// Settings document produced by the editor. Defaults apply when omitted.
    #[arg(short, long)]
    settings: Option<PathBuf>,
    #[arg(long, default_value_t = 800, value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,
    #[arg(long, default_value_t = 400, value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,
    /// Number of refreshes to simulate.
    #[arg(short, long, default_value_t = 120)]
    frames: u32,
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    fps: u32,
    #[arg(long, default_value_t = 48_000, value_parser = clap::value_parser!(u32).range(8_000..))]
    sample_rate: u32,
    /// Directory the PNG frames are written to.
    #[arg(short, long, default_value = "frames")]
    output: PathBuf,
    /// Tone frequencies in Hz, comma separated.
    #[arg(long, value_delimiter = ',', default_values_t = [110.0, 440.0, 2_500.0])]
    tones: Vec<f32>,
    /// Only every n-th drawn frame is written.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    save_every: u32,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ModeArg {
    Bars,
    Waveform,
    Circle,
    Background,
}

impl From<ModeArg> for VisualizerMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Bars => VisualizerMode::Bars,
            ModeArg::Waveform => VisualizerMode::Waveform,
            ModeArg::Circle => VisualizerMode::Circle,
            ModeArg::Background => VisualizerMode::Background,
        }
    }
}
