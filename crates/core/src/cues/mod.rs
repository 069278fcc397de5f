use serde::{Deserialize, Serialize};

use crate::{CueEngineError, Result};

/// Identifier for a discrete visual the presentation layer can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CueId {
    DiffusedRing,
    Cube,
    Sphere,
    Grid,
    Ribbons,
    Treadmill,
    Dna,
    MovingBoxes,
    Scope,
}

/// One row of a cue table: at `time_seconds` of playback, `id` becomes the
/// active visual.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CueEntry {
    #[serde(rename = "time")]
    pub time_seconds: f32,
    pub id: CueId,
}

impl CueEntry {
    pub fn new(time_seconds: f32, id: CueId) -> Self {
        Self { time_seconds, id }
    }
}

/// Ordered cue table, sorted once at construction and queried by binary
/// search afterwards.
///
/// Entries sharing a trigger time keep their declaration order (stable
/// sort), and resolution picks the last of them, so "last declared wins".
#[derive(Debug, Clone)]
pub struct CueTable {
    entries: Vec<CueEntry>,
}

impl CueTable {
    /// Sorts and validates the table. The caller does not need to pre-sort.
    /// Fails with [`CueEngineError::NoDefaultCue`] unless at least one entry
    /// triggers at or before time zero, so there is always something to show.
    pub fn new(mut entries: Vec<CueEntry>) -> Result<Self> {
        if entries.iter().any(|entry| !entry.time_seconds.is_finite()) {
            return Err(CueEngineError::config(
                "cue trigger times must be finite".to_string(),
            ));
        }

        entries.sort_by(|a, b| a.time_seconds.total_cmp(&b.time_seconds));
        match entries.first() {
            Some(first) if first.time_seconds <= 0.0 => Ok(Self { entries }),
            _ => Err(CueEngineError::NoDefaultCue),
        }
    }

    pub fn entries(&self) -> &[CueEntry] {
        &self.entries
    }

    /// Resolves the entry with the greatest trigger time at or before `t`.
    /// Before the first trigger (only possible with a negative `t`) the
    /// earliest entry is the default.
    pub fn resolve_active(&self, current_time_seconds: f32) -> CueId {
        let after = self
            .entries
            .partition_point(|entry| entry.time_seconds <= current_time_seconds);
        match after {
            0 => self.entries[0].id,
            index => self.entries[index - 1].id,
        }
    }
}

/// One-shot reveal gate: named content that appears at a trigger time and
/// stays visible for the rest of the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealEntry {
    pub id: String,
    #[serde(rename = "time")]
    pub time_seconds: f32,
}

/// Collection of reveal gates with one-way latches.
///
/// Once a gate latches it stays latched even if playback time later moves
/// backward (a seek): minor clock jitter must never make revealed content
/// flicker. Rolling back requires an explicit [`RevealSet::reset`].
#[derive(Debug, Clone, Default)]
pub struct RevealSet {
    entries: Vec<RevealEntry>,
    latched: Vec<bool>,
}

impl RevealSet {
    pub fn new(entries: Vec<RevealEntry>) -> Result<Self> {
        if entries.iter().any(|entry| !entry.time_seconds.is_finite()) {
            return Err(CueEngineError::config(
                "reveal trigger times must be finite".to_string(),
            ));
        }
        for (index, entry) in entries.iter().enumerate() {
            if entries[..index].iter().any(|other| other.id == entry.id) {
                return Err(CueEngineError::config(format!(
                    "duplicate reveal id `{}`",
                    entry.id
                )));
            }
        }

        let latched = vec![false; entries.len()];
        Ok(Self { entries, latched })
    }

    pub fn entries(&self) -> &[RevealEntry] {
        &self.entries
    }

    /// Latches every gate whose trigger time has passed.
    pub fn update(&mut self, current_time_seconds: f32) {
        for (entry, latched) in self.entries.iter().zip(&mut self.latched) {
            if !*latched && current_time_seconds >= entry.time_seconds {
                *latched = true;
                tracing::debug!(id = %entry.id, time = entry.time_seconds, "reveal latched");
            }
        }
    }

    /// Whether the named gate has latched. Unknown ids are simply not
    /// revealed.
    pub fn is_revealed(&self, id: &str) -> bool {
        self.entries
            .iter()
            .position(|entry| entry.id == id)
            .map(|index| self.latched[index])
            .unwrap_or(false)
    }

    /// Clears every latch for a fresh session.
    pub fn reset(&mut self) {
        self.latched.fill(false);
    }
}

/// Resolves the active cue and tracks reveal latches against the playback
/// clock. The table and reveal set are validated before the scheduler
/// exists, so per-tick resolution cannot fail.
#[derive(Debug, Clone)]
pub struct CueScheduler {
    table: CueTable,
    reveals: RevealSet,
}

impl CueScheduler {
    pub fn new(table: CueTable, reveals: RevealSet) -> Self {
        Self { table, reveals }
    }

    pub fn table(&self) -> &CueTable {
        &self.table
    }

    pub fn resolve_active(&self, current_time_seconds: f32) -> CueId {
        self.table.resolve_active(current_time_seconds)
    }

    pub fn update_reveals(&mut self, current_time_seconds: f32) {
        self.reveals.update(current_time_seconds);
    }

    pub fn is_revealed(&self, id: &str) -> bool {
        self.reveals.is_revealed(id)
    }

    pub fn reset_reveals(&mut self) {
        self.reveals.reset();
    }
}
