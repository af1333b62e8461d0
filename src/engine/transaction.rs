//! Staged edits
//!
//! A `Transaction` copies each part-measure's note sequence the first time
//! it is touched and records every change as a `NoteEdit`. Nothing reaches
//! the score until `StagedEdit::commit`; dropping a transaction discards it.

use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::diagnostics;
use crate::errors::{EditError, EntityKind};
use crate::models::{Divisions, Music, Note};

/// One recorded change to a note
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteEdit {
    Added {
        measure_id: String,
        part_measure_id: String,
        note_id: String,
    },
    Removed {
        measure_id: String,
        part_measure_id: String,
        note_id: String,
    },
    Resized {
        note_id: String,
        from: Divisions,
        to: Divisions,
    },
    Moved {
        note_id: String,
        from: Divisions,
        to: Divisions,
    },
    TiedForward {
        note_id: String,
    },
    UntiedForward {
        note_id: String,
    },
    UntiedBackward {
        note_id: String,
    },
}

impl NoteEdit {
    pub(crate) fn added(note: &Note) -> Self {
        NoteEdit::Added {
            measure_id: note.measure_id.clone(),
            part_measure_id: note.part_measure_id.clone(),
            note_id: note.id.clone(),
        }
    }

    pub(crate) fn removed(note: &Note) -> Self {
        NoteEdit::Removed {
            measure_id: note.measure_id.clone(),
            part_measure_id: note.part_measure_id.clone(),
            note_id: note.id.clone(),
        }
    }

    /// The note this edit is about
    pub fn note_id(&self) -> &str {
        match self {
            NoteEdit::Added { note_id, .. }
            | NoteEdit::Removed { note_id, .. }
            | NoteEdit::Resized { note_id, .. }
            | NoteEdit::Moved { note_id, .. }
            | NoteEdit::TiedForward { note_id }
            | NoteEdit::UntiedForward { note_id }
            | NoteEdit::UntiedBackward { note_id } => note_id,
        }
    }
}

/// What a committed edit did
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditReport {
    pub edits: Vec<NoteEdit>,

    /// Ids of tied continuation notes created, in chain order
    pub continuations: Vec<String>,
}

impl EditReport {
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

pub(crate) struct Transaction<'a> {
    music: &'a Music,
    staged: BTreeMap<(usize, usize), Vec<Note>>,
    report: EditReport,
}

impl<'a> Transaction<'a> {
    pub fn new(music: &'a Music) -> Self {
        Self {
            music,
            staged: BTreeMap::new(),
            report: EditReport::default(),
        }
    }

    /// The score as it was before this transaction
    pub fn music(&self) -> &'a Music {
        self.music
    }

    /// Current (possibly staged) notes of a part-measure
    pub fn notes(&self, m: usize, p: usize) -> Result<&[Note], EditError> {
        if let Some(notes) = self.staged.get(&(m, p)) {
            return Ok(notes.as_slice());
        }
        self.music
            .part_measure(m, p)
            .map(|part| part.notes())
            .ok_or_else(|| missing_part(m, p))
    }

    /// Staged notes of a part-measure, copied from the score on first use
    pub fn notes_mut(&mut self, m: usize, p: usize) -> Result<&mut Vec<Note>, EditError> {
        match self.staged.entry((m, p)) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let part = self.music.part_measure(m, p).ok_or_else(|| missing_part(m, p))?;
                Ok(entry.insert(part.notes().to_vec()))
            }
        }
    }

    /// Id of the part-measure at (m, p) in the score
    pub fn part_measure_id(&self, m: usize, p: usize) -> Result<&'a str, EditError> {
        self.music
            .part_measure(m, p)
            .map(|part| part.id.as_str())
            .ok_or_else(|| missing_part(m, p))
    }

    pub fn record(&mut self, edit: NoteEdit) {
        log::debug!("staged {:?}", edit);
        self.report.edits.push(edit);
    }

    pub fn record_all(&mut self, edits: Vec<NoteEdit>) {
        for edit in edits {
            self.record(edit);
        }
    }

    pub fn record_continuation(&mut self, note_id: String) {
        self.report.continuations.push(note_id);
    }

    pub fn finish(self) -> StagedEdit {
        StagedEdit {
            staged: self.staged,
            report: self.report,
        }
    }
}

/// A fully computed edit, detached from the score it was computed against
pub(crate) struct StagedEdit {
    staged: BTreeMap<(usize, usize), Vec<Note>>,
    report: EditReport,
}

impl StagedEdit {
    pub fn commit(self, music: &mut Music) -> EditReport {
        let touched = self.staged.len();
        for ((m, p), notes) in self.staged {
            if let Some(part) = music.part_measure_mut(m, p) {
                part.replace_notes(notes);
            }
        }
        log::info!(
            "committed {} note edits across {} part-measures",
            self.report.edits.len(),
            touched
        );

        if cfg!(debug_assertions) {
            for mark in diagnostics::check_music(music).marks {
                log::warn!("after commit: {}", mark.message);
            }
        }

        self.report
    }
}

fn missing_part(m: usize, p: usize) -> EditError {
    EditError::not_found(EntityKind::PartMeasure, format!("part #{} of measure #{}", p, m))
}
