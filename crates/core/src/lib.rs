//! Core library for the audio cue engine.
//!
//! The crate turns a live audio signal into render-ready data and timed
//! presentation cues. Each module owns a distinct stage of the per-tick
//! pipeline: signal sampling, fixed-point texture encoding, scalar event
//! detection, cue scheduling, palette cycling and the playback phase gate.
//! [`CueEngine`] sequences them behind a single `tick` entry point driven by
//! an external clock; rendering and audio transport stay outside the crate
//! and interact only through read-only snapshots.

pub mod config;
pub mod cues;
pub mod detector;
pub mod engine;
pub mod error;
pub mod palette;
pub mod phase;
pub mod sampler;
pub mod texture;

pub use config::{CueSheet, EngineConfig};
pub use cues::{CueEntry, CueId, CueScheduler, CueTable, RevealEntry, RevealSet};
pub use detector::{DetectorConfig, ScalarEventDetector};
pub use engine::{AudioTransport, CueEngine, TickOutput};
pub use error::{CueEngineError, Result};
pub use palette::{ColorPalette, PaletteConfig, PaletteCycler, PaletteState};
pub use phase::{Phase, PlaybackPhaseController};
pub use sampler::{AnalyzerMode, SamplerConfig, SignalSampler};
pub use texture::{EncodedTexture, TextureEncoder};
