//! Diagnostics for score timing invariants
//!
//! Walks a score and reports every place where a part-measure does not
//! exactly fill its measure or a tie does not line up with its partner.

pub mod timing;

use serde::{Deserialize, Serialize};

pub use timing::check_music;

/// Severity level for diagnostic marks
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

/// A diagnostic mark pointing at a part-measure (and optionally a note in it)
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DiagnosticMark {
    /// Measure index in the score
    pub measure: usize,
    /// Part ordinal within the measure
    pub part: usize,
    /// Note position within the part-measure, if the issue is note-specific
    pub note: Option<usize>,
    pub severity: DiagnosticSeverity,
    /// Kind identifier (e.g., "gap", "dangling_tie")
    pub kind: String,
    /// Human-readable message
    pub message: String,
}

impl DiagnosticMark {
    pub fn new(
        measure: usize,
        part: usize,
        severity: DiagnosticSeverity,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            measure,
            part,
            note: None,
            severity,
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn at_note(mut self, note: usize) -> Self {
        self.note = Some(note);
        self
    }
}

/// Collection of diagnostic marks for a whole score
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Diagnostics {
    pub marks: Vec<DiagnosticMark>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self { marks: Vec::new() }
    }

    pub fn add(&mut self, mark: DiagnosticMark) {
        self.marks.push(mark);
    }

    pub fn has_errors(&self) -> bool {
        self.marks
            .iter()
            .any(|m| m.severity == DiagnosticSeverity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Marks of one kind
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a DiagnosticMark> + 'a {
        self.marks.iter().filter(move |m| m.kind == kind)
    }
}
