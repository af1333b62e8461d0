//! The note: one timed event inside a part-measure

use serde::{Deserialize, Serialize};

use super::Divisions;
use crate::errors::PitchError;
use crate::identity::IdGenerator;
use crate::parse::pitch::parse_pitch;

/// Tie situation of a note, derived from its two tie flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TieState {
    Untied,
    TiedForward,
    TiedBackward,
    TiedBoth,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Note {
    pub id: String,

    /// Owning measure
    pub measure_id: String,

    /// Owning part-measure
    pub part_measure_id: String,

    /// Pitch spelling such as "C#4"; empty for rests
    pub full_name: String,

    pub is_rest: bool,

    /// Offset from the start of the measure, in divisions
    pub start: Divisions,

    pub duration: Divisions,

    pub tied_to_next: bool,

    pub tied_to_prev: bool,
}

impl Note {
    /// Untied pitched note
    pub fn new(
        id: impl Into<String>,
        measure_id: impl Into<String>,
        part_measure_id: impl Into<String>,
        full_name: impl Into<String>,
        start: Divisions,
        duration: Divisions,
    ) -> Self {
        Self {
            id: id.into(),
            measure_id: measure_id.into(),
            part_measure_id: part_measure_id.into(),
            full_name: full_name.into(),
            is_rest: false,
            start,
            duration,
            tied_to_next: false,
            tied_to_prev: false,
        }
    }

    /// Untied rest
    pub fn rest(
        id: impl Into<String>,
        measure_id: impl Into<String>,
        part_measure_id: impl Into<String>,
        start: Divisions,
        duration: Divisions,
    ) -> Self {
        Self {
            is_rest: true,
            ..Self::new(id, measure_id, part_measure_id, "", start, duration)
        }
    }

    /// Field-for-field duplicate. Nothing is validated.
    pub fn create_from_copy(other: &Note) -> Note {
        other.clone()
    }

    /// End offset (exclusive)
    pub fn end(&self) -> Divisions {
        self.start + self.duration
    }

    pub fn tie_state(&self) -> TieState {
        match (self.tied_to_prev, self.tied_to_next) {
            (false, false) => TieState::Untied,
            (false, true) => TieState::TiedForward,
            (true, false) => TieState::TiedBackward,
            (true, true) => TieState::TiedBoth,
        }
    }

    /// Same pitch spelling and rest status; what a tie requires of its two ends
    pub fn sounds_like(&self, other: &Note) -> bool {
        self.is_rest == other.is_rest && (self.is_rest || self.full_name == other.full_name)
    }

    /// Respell to the enharmonic equivalent unless the note is a rest, has no
    /// accidental, or already uses the requested convention.
    ///
    /// Returns whether the spelling changed.
    pub fn toggle_accidental_spelling(&mut self, use_sharps: bool) -> Result<bool, PitchError> {
        if self.is_rest {
            return Ok(false);
        }
        let spelling = parse_pitch(&self.full_name)?;
        if spelling.accidental.matches_convention(use_sharps) {
            return Ok(false);
        }
        let toggled = spelling.toggled();
        if toggled == spelling {
            // natural, or no single-accidental equivalent
            return Ok(false);
        }
        self.full_name = toggled.to_string();
        Ok(true)
    }

    /// Fresh identity, rebound to another measure and part-measure.
    ///
    /// Pitch, timing and ties are untouched; placing the note in a sequence is
    /// up to the caller.
    pub fn reset_identity(
        &mut self,
        ids: &mut dyn IdGenerator,
        measure_id: impl Into<String>,
        part_measure_id: impl Into<String>,
    ) {
        self.id = ids.new_id();
        self.measure_id = measure_id.into();
        self.part_measure_id = part_measure_id.into();
    }

    pub fn location(&self) -> NoteLocation {
        NoteLocation::new(&self.measure_id, &self.part_measure_id, &self.id)
    }
}

/// Address of a note by identity
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NoteLocation {
    pub measure_id: String,
    pub part_measure_id: String,
    pub note_id: String,
}

impl NoteLocation {
    pub fn new(
        measure_id: impl Into<String>,
        part_measure_id: impl Into<String>,
        note_id: impl Into<String>,
    ) -> Self {
        Self {
            measure_id: measure_id.into(),
            part_measure_id: part_measure_id.into(),
            note_id: note_id.into(),
        }
    }
}
