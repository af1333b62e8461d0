//! Error types for score editing
//!
//! `EditError` is what every engine operation returns. The collaborator
//! parse errors convert into it so `?` works across layers.

use thiserror::Error;

use crate::models::Divisions;

/// Which kind of entity a failed lookup was for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Measure,
    PartMeasure,
    Note,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Measure => "measure",
            EntityKind::PartMeasure => "part-measure",
            EntityKind::Note => "note",
        };
        f.write_str(name)
    }
}

/// Failure of an edit. The score is left unchanged whenever one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// Referenced identity does not exist where it was expected
    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },

    /// Requested duration is not a positive number of divisions
    #[error("invalid duration {0}: durations must be at least one division")]
    InvalidDuration(i64),

    /// A tie would have to continue past the last measure of the score
    #[error("no measure follows '{measure_id}' ({overflow} divisions could not be placed)")]
    MeasureBoundsExceeded { measure_id: String, overflow: Divisions },

    #[error("bad time signature: {0}")]
    TimeSignature(#[from] TimeSignatureError),

    #[error("bad pitch spelling: {0}")]
    Pitch(#[from] PitchError),
}

impl EditError {
    pub(crate) fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        EditError::NotFound { kind, id: id.into() }
    }
}

/// Pitch spelling parse failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PitchError {
    #[error("empty pitch spelling")]
    Empty,

    #[error("unknown note letter '{0}'")]
    UnknownLetter(char),

    #[error("invalid octave '{0}'")]
    InvalidOctave(String),
}

/// Time signature parse failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeSignatureError {
    #[error("expected '<beats>/<beat unit>', got '{0}'")]
    Malformed(String),

    #[error("beat count must be positive in '{0}'")]
    ZeroBeats(String),

    #[error("beat unit {0} is not a power of two between 1 and 64")]
    UnsupportedBeatUnit(u32),

    #[error("beat unit 1/{beat_unit} is not a whole number of divisions at {divisions_per_quarter} per quarter")]
    IndivisibleBeat { beat_unit: u32, divisions_per_quarter: u32 },

    #[error("a {signature} measure at {divisions_per_quarter} divisions per quarter is too long to count in divisions")]
    MeasureTooLong { signature: String, divisions_per_quarter: u32 },
}

/// Configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("divisions_per_quarter must be positive")]
    ZeroDivisions,
}
