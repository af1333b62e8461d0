//! Re-flow of one part-measure after a note changes length
//!
//! Growing eats into the following notes from the front; shrinking hands
//! the freed span to the next note, or to a filler rest at the barline.

use super::transaction::{NoteEdit, Transaction};
use crate::errors::EditError;
use crate::identity::IdGenerator;
use crate::models::{Divisions, Note};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReflowOutcome {
    /// A note that was tied forward lost its tie (removed or no longer at
    /// the barline); its partner in the next measure must be untied
    pub dropped_forward_tie: bool,
}

/// Set the duration of the note at `index` and re-flow its neighbors.
///
/// The note must end at or before `capacity` afterwards.
pub(crate) fn set_duration(
    tx: &mut Transaction<'_>,
    ids: &mut dyn IdGenerator,
    m: usize,
    p: usize,
    index: usize,
    new_duration: Divisions,
    capacity: Divisions,
) -> Result<ReflowOutcome, EditError> {
    let mut edits = Vec::new();
    let mut outcome = ReflowOutcome::default();

    let notes = tx.notes_mut(m, p)?;
    let (start, old) = (notes[index].start, notes[index].duration);
    let new_end = start + new_duration;
    debug_assert!(new_duration > 0 && new_end <= capacity);

    if new_duration > old {
        let next = index + 1;
        while next < notes.len() && notes[next].start < new_end {
            if notes[next].end() <= new_end {
                let removed = notes.remove(next);
                outcome.dropped_forward_tie |= removed.tied_to_next;
                edits.push(NoteEdit::removed(&removed));
            } else {
                let neighbor = &mut notes[next];
                let end = neighbor.end();
                edits.push(NoteEdit::Moved {
                    note_id: neighbor.id.clone(),
                    from: neighbor.start,
                    to: new_end,
                });
                edits.push(NoteEdit::Resized {
                    note_id: neighbor.id.clone(),
                    from: neighbor.duration,
                    to: end - new_end,
                });
                neighbor.start = new_end;
                neighbor.duration = end - new_end;
                break;
            }
        }
    } else if new_duration < old {
        let freed = old - new_duration;
        if let Some(neighbor) = notes.get_mut(index + 1) {
            edits.push(NoteEdit::Moved {
                note_id: neighbor.id.clone(),
                from: neighbor.start,
                to: neighbor.start - freed,
            });
            edits.push(NoteEdit::Resized {
                note_id: neighbor.id.clone(),
                from: neighbor.duration,
                to: neighbor.duration + freed,
            });
            neighbor.start -= freed;
            neighbor.duration += freed;
        } else {
            let target = &mut notes[index];
            let filler = Note::rest(
                ids.new_id(),
                target.measure_id.clone(),
                target.part_measure_id.clone(),
                new_end,
                freed,
            );
            if target.tied_to_next {
                target.tied_to_next = false;
                outcome.dropped_forward_tie = true;
                edits.push(NoteEdit::UntiedForward {
                    note_id: target.id.clone(),
                });
            }
            edits.push(NoteEdit::added(&filler));
            notes.push(filler);
        }
    }

    if new_duration != old {
        let target = &mut notes[index];
        edits.push(NoteEdit::Resized {
            note_id: target.id.clone(),
            from: old,
            to: new_duration,
        });
        target.duration = new_duration;
    }

    tx.record_all(edits);
    Ok(outcome)
}
