//! Duration and tie engine
//!
//! Keeps every part-measure exactly filling its measure while notes are
//! resized, and creates, reuses or clears the tied continuation notes that
//! carry a note across barlines.
//!
//! All mutations are staged in a transaction and committed only once the
//! whole edit, including every step of a tie chain, has succeeded.

pub mod reflow;
pub mod resize;
pub mod tie;
pub mod transaction;

pub use resize::{paste_note, resize_note};
pub use tie::untie_from_next;
pub use transaction::{EditReport, NoteEdit};

use crate::config::DanglingTiePolicy;
use crate::errors::EditError;
use crate::identity::IdGenerator;
use crate::models::{Note, NoteLocation, Score};

impl Score {
    /// See [`resize_note`]
    pub fn resize_note(
        &mut self,
        ids: &mut dyn IdGenerator,
        location: &NoteLocation,
        new_duration: i64,
        propagate_backward: bool,
    ) -> Result<EditReport, EditError> {
        resize_note(&mut self.music, ids, location, new_duration, propagate_backward)
    }

    /// See [`untie_from_next`]. In the last measure this follows the
    /// configured `DanglingTiePolicy`.
    pub fn untie_from_next(&mut self, note: &Note) -> Result<EditReport, EditError> {
        if self.config.dangling_ties == DanglingTiePolicy::Ignore {
            let (m, _) = self.music.locate_part(&note.measure_id, &note.part_measure_id)?;
            if m + 1 == self.music.len() {
                log::debug!("ignoring untie of {} in the last measure", note.id);
                return Ok(EditReport::default());
            }
        }
        untie_from_next(&mut self.music, note)
    }

    /// See [`paste_note`]
    pub fn paste_note(
        &mut self,
        ids: &mut dyn IdGenerator,
        note: &Note,
        at: &NoteLocation,
    ) -> Result<EditReport, EditError> {
        paste_note(&mut self.music, ids, note, at)
    }

    /// Append a measure of whole-measure rests; returns its id
    pub fn append_measure(&mut self, ids: &mut dyn IdGenerator, time_signature: &str) -> Result<String, EditError> {
        self.music.append_measure(ids, time_signature)
    }

    /// Respell one note and every note tied to it.
    ///
    /// Returns whether anything changed.
    pub fn toggle_accidental_spelling(&mut self, location: &NoteLocation, use_sharps: bool) -> Result<bool, EditError> {
        let (m, p, i) = self.music.locate(location)?;
        let mut note = self.music.note(location)?.clone();
        if !note.toggle_accidental_spelling(use_sharps)? {
            return Ok(false);
        }
        for (cm, note_id) in self.tie_chain(m, p, i) {
            if let Some(member) = self
                .music
                .part_measure_mut(cm, p)
                .and_then(|part| part.note_mut(&note_id))
            {
                member.full_name = note.full_name.clone();
            }
        }
        Ok(true)
    }

    /// Respell every pitched note to the configured convention.
    ///
    /// All spellings are parsed before any is changed. Returns the number
    /// of notes respelled.
    pub fn normalize_spelling(&mut self) -> Result<usize, EditError> {
        let use_sharps = self.config.prefer_sharps;
        let mut respelled = Vec::new();
        for (m, measure) in self.music.measures().iter().enumerate() {
            for (p, part) in measure.parts().iter().enumerate() {
                for note in part.notes() {
                    let mut candidate = note.clone();
                    if candidate.toggle_accidental_spelling(use_sharps)? {
                        respelled.push((m, p, note.id.clone(), candidate.full_name));
                    }
                }
            }
        }

        let count = respelled.len();
        for (m, p, note_id, full_name) in respelled {
            if let Some(note) = self
                .music
                .part_measure_mut(m, p)
                .and_then(|part| part.note_mut(&note_id))
            {
                note.full_name = full_name;
            }
        }
        log::info!("normalized spelling of {} notes", count);
        Ok(count)
    }

    /// Every note of the tie chain through (m, p, i), as (measure, note id)
    fn tie_chain(&self, m: usize, p: usize, i: usize) -> Vec<(usize, String)> {
        let music = &self.music;
        let Some(start) = music.part_measure(m, p).and_then(|part| part.notes().get(i)) else {
            return Vec::new();
        };
        let mut chain = vec![(m, start.id.clone())];

        let mut current = start;
        let mut cm = m;
        while current.tied_to_prev && cm > 0 {
            match music.part_measure(cm - 1, p).and_then(|part| part.last()) {
                Some(prev) if prev.tied_to_next && prev.sounds_like(current) => {
                    cm -= 1;
                    chain.push((cm, prev.id.clone()));
                    current = prev;
                }
                _ => break,
            }
        }

        let mut current = start;
        let mut cm = m;
        while current.tied_to_next {
            match music.part_measure(cm + 1, p).and_then(|part| part.first()) {
                Some(next) if next.tied_to_prev && next.sounds_like(current) => {
                    cm += 1;
                    chain.push((cm, next.id.clone()));
                    current = next;
                }
                _ => break,
            }
        }
        chain
    }
}
