/// Result alias that carries the custom [`CueEngineError`] type.
pub type Result<T> = std::result::Result<T, CueEngineError>;

/// Common error type for the core crate.
///
/// Only construction and cue-sheet loading can fail. Per-tick operations
/// sanitize their inputs (clamping, zero-substitution) so the hot path is
/// total and never surfaces one of these variants at runtime.
#[derive(Debug, thiserror::Error)]
pub enum CueEngineError {
    /// Bad constructor parameters. Fatal at construction, never at tick time.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// A sample value exceeded the configured amplitude range. The hot path
    /// recovers by clamping; this variant is only returned by the checked
    /// encoding used for validation and tests.
    #[error("value {value} outside amplitude range ±{max_amplitude}")]
    ValueOutOfRange { value: f32, max_amplitude: f32 },
    /// A cue table contained no entry with a non-positive trigger time, so
    /// there is nothing to show before the first scheduled cue.
    #[error("cue table has no default entry at or before time zero")]
    NoDefaultCue,
    /// A cue sheet failed to parse or had an invalid shape.
    #[error("invalid cue sheet: {0}")]
    InvalidCueSheet(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl CueEngineError {
    /// Creates an [`CueEngineError::InvalidConfiguration`] from a message.
    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

impl From<serde_json::Error> for CueEngineError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidCueSheet(value.to_string())
    }
}
