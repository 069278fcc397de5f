use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    cues::{CueEntry, CueId, CueScheduler, CueTable, RevealEntry, RevealSet},
    detector::DetectorConfig,
    palette::PaletteConfig,
    sampler::SamplerConfig,
    Result,
};

/// Top-level configuration for [`crate::CueEngine`]. Every section has
/// defaults, so an empty JSON object is a valid config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sampler: SamplerConfig,
    pub detector: DetectorConfig,
    pub palette: PaletteConfig,
}

/// Declarative cue sheet: the visual schedule and the reveal gates for one
/// track, loaded from JSON supplied by the surrounding application.
///
/// Validation happens here, at load time. A sheet that parses but has no
/// default cue (an entry at or before time zero) is rejected before the
/// engine is ever constructed, so a bad sheet surfaces as a startup failure
/// rather than a stuck visual.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CueSheet {
    pub cues: Vec<CueEntry>,
    #[serde(default)]
    pub reveals: Vec<RevealEntry>,
}

impl CueSheet {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Validates the sheet and builds the scheduler the engine runs on.
    pub fn into_scheduler(self) -> Result<CueScheduler> {
        let table = CueTable::new(self.cues)?;
        let reveals = RevealSet::new(self.reveals)?;
        Ok(CueScheduler::new(table, reveals))
    }

    /// The built-in demo schedule.
    pub fn demo() -> Self {
        Self {
            cues: vec![
                CueEntry::new(0.0, CueId::DiffusedRing),
                CueEntry::new(31.0, CueId::Cube),
                CueEntry::new(46.0, CueId::Sphere),
                CueEntry::new(60.0, CueId::Cube),
                CueEntry::new(75.0, CueId::DiffusedRing),
                CueEntry::new(77.0, CueId::Grid),
                CueEntry::new(91.0, CueId::Ribbons),
                CueEntry::new(120.0, CueId::Treadmill),
            ],
            reveals: vec![
                RevealEntry {
                    id: "date".to_string(),
                    time_seconds: 60.0,
                },
                RevealEntry {
                    id: "location".to_string(),
                    time_seconds: 90.0,
                },
                RevealEntry {
                    id: "event".to_string(),
                    time_seconds: 120.0,
                },
            ],
        }
    }
}
