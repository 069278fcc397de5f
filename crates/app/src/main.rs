use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cue_engine_core::{AudioTransport, CueEngine, CueSheet, EngineConfig};
use tracing_subscriber::EnvFilter;

fn main() -> cue_engine_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { cue_sheet } => run_validate(&cue_sheet),
        Commands::Simulate {
            cue_sheet,
            duration_seconds,
            tick_hz,
        } => run_simulate(cue_sheet.as_deref(), duration_seconds, tick_hz),
    }
}

fn run_validate(path: &std::path::Path) -> cue_engine_core::Result<()> {
    let sheet = CueSheet::from_path(path)?;
    let cues = sheet.cues.len();
    let reveals = sheet.reveals.len();
    sheet.into_scheduler()?;
    tracing::info!(?path, cues, reveals, "cue sheet is valid");
    Ok(())
}

fn run_simulate(
    path: Option<&std::path::Path>,
    duration_seconds: f32,
    tick_hz: f32,
) -> cue_engine_core::Result<()> {
    let sheet = match path {
        Some(path) => CueSheet::from_path(path)?,
        None => CueSheet::demo(),
    };

    let mut engine = CueEngine::new(EngineConfig::default(), sheet)?;
    engine.begin();

    let mut transport = SimulatedTransport::new(duration_seconds);
    let tick_seconds = 1.0 / tick_hz;
    let total_ticks = (duration_seconds * tick_hz).ceil() as u64;

    let mut last_cue = None;
    let mut pulses = 0u32;
    for tick in 0..=total_ticks {
        transport.time = tick as f32 * tick_seconds;
        let now_ms = f64::from(transport.time) * 1000.0;
        let Some(output) = engine.tick(&transport, now_ms) else {
            break;
        };

        if output.event_pulse {
            pulses += 1;
        }
        if last_cue != Some(output.active_cue) {
            tracing::info!(
                time = output.current_time_seconds,
                cue = ?output.active_cue,
                palette = output.palette.active_index,
                "cue change"
            );
            last_cue = Some(output.active_cue);
        }
    }

    tracing::info!(pulses, phase = ?engine.phase(), "simulation finished");
    Ok(())
}

/// Deterministic stand-in for a real playback transport: a 220 Hz tone with
/// a short loud burst every half second, ending after the configured
/// duration.
struct SimulatedTransport {
    time: f32,
    duration_seconds: f32,
}

impl SimulatedTransport {
    const SAMPLE_RATE: f32 = 48_000.0;

    fn new(duration_seconds: f32) -> Self {
        Self {
            time: 0.0,
            duration_seconds,
        }
    }
}

impl AudioTransport for SimulatedTransport {
    fn current_time_seconds(&self) -> f32 {
        self.time
    }

    fn is_ended(&self) -> bool {
        self.time >= self.duration_seconds
    }

    fn copy_samples_into(&self, dst: &mut [f32]) {
        let beat_phase = self.time.rem_euclid(0.5);
        let gain = if beat_phase < 0.05 { 1.0 } else { 0.15 };
        for (index, slot) in dst.iter_mut().enumerate() {
            let t = self.time + index as f32 / Self::SAMPLE_RATE;
            *slot = gain * (2.0 * std::f32::consts::PI * 220.0 * t).sin();
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio-synchronized cue engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a cue sheet for parse and validation errors.
    Validate {
        /// Path to the cue sheet JSON file.
        cue_sheet: PathBuf,
    },
    /// Drive the engine against a synthesized transport and log cue
    /// transitions.
    Simulate {
        /// Cue sheet to run; the built-in demo schedule when omitted.
        #[arg(short, long)]
        cue_sheet: Option<PathBuf>,
        /// Length of the simulated track.
        #[arg(long, default_value_t = 130.0)]
        duration_seconds: f32,
        /// Tick rate of the simulated render loop.
        #[arg(long, default_value_t = 60.0)]
        tick_hz: f32,
    },
}
