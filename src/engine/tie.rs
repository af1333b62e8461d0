//! Cross-barline ties: creating continuation notes and untying partners

use super::reflow::set_duration;
use super::transaction::{EditReport, NoteEdit, Transaction};
use crate::errors::{EditError, EntityKind};
use crate::identity::IdGenerator;
use crate::models::{Music, Note};

/// Clear the backward tie on the first note of part `p` in the measure after `m`.
///
/// Returns whether a note was actually untied.
pub(crate) fn untie_partner(tx: &mut Transaction<'_>, m: usize, p: usize) -> Result<bool, EditError> {
    let next = m + 1;
    if next >= tx.music().len() {
        log::debug!("tie from the last measure has no partner to clear");
        return Ok(false);
    }
    let notes = tx.notes_mut(next, p)?;
    let Some(partner) = notes.first_mut() else {
        return Ok(false);
    };
    if !partner.tied_to_prev {
        return Ok(false);
    }
    partner.tied_to_prev = false;
    let note_id = partner.id.clone();
    tx.record(NoteEdit::UntiedBackward { note_id });
    Ok(true)
}

/// Clear the forward tie on the last note of part `p` in the measure before `m`
pub(crate) fn untie_upstream(tx: &mut Transaction<'_>, m: usize, p: usize) -> Result<bool, EditError> {
    if m == 0 {
        return Ok(false);
    }
    let notes = tx.notes_mut(m - 1, p)?;
    let Some(origin) = notes.last_mut() else {
        return Ok(false);
    };
    if !origin.tied_to_next {
        return Ok(false);
    }
    origin.tied_to_next = false;
    let note_id = origin.id.clone();
    tx.record(NoteEdit::UntiedForward { note_id });
    Ok(true)
}

/// Put a continuation of `source` at the start of part `p` in measure `m`.
///
/// The current first note is displaced: the continuation takes over its
/// span, then settles at one beat of the measure. The caller resizes it to
/// the real overflow afterwards.
pub(crate) fn place_continuation(
    tx: &mut Transaction<'_>,
    ids: &mut dyn IdGenerator,
    source: &Note,
    m: usize,
    p: usize,
) -> Result<String, EditError> {
    let music = tx.music();
    let capacity = music.measure_duration(m)?;
    let beat = music.beat_duration(m)?.min(capacity);
    let measure_id = music.measures()[m].id.clone();
    let part_measure_id = tx.part_measure_id(m, p)?.to_string();

    let continuation = Note {
        id: ids.new_id(),
        measure_id,
        part_measure_id,
        full_name: source.full_name.clone(),
        is_rest: source.is_rest,
        start: 0,
        duration: capacity,
        tied_to_next: false,
        tied_to_prev: true,
    };
    let continuation_id = continuation.id.clone();

    let notes = tx.notes_mut(m, p)?;
    let displaced = if notes.is_empty() {
        None
    } else {
        Some(notes.remove(0))
    };
    let mut placed = continuation;
    if let Some(displaced) = &displaced {
        placed.duration = displaced.duration;
    }
    let added = NoteEdit::added(&placed);
    notes.insert(0, placed);

    if let Some(displaced) = displaced {
        tx.record(NoteEdit::removed(&displaced));
        if displaced.tied_to_next {
            untie_partner(tx, m, p)?;
        }
    }
    tx.record(added);
    tx.record_continuation(continuation_id.clone());
    log::debug!("continuation {} of {} placed in measure #{}", continuation_id, source.id, m);

    let outcome = set_duration(tx, ids, m, p, 0, beat, capacity)?;
    if outcome.dropped_forward_tie {
        untie_partner(tx, m, p)?;
    }
    Ok(continuation_id)
}

/// Clear the backward tie of the note following `note` across the barline.
///
/// Only the downstream side is touched; clearing `note.tied_to_next` is the
/// caller's job. Fails with `MeasureBoundsExceeded` when `note` is in the
/// last measure.
pub fn untie_from_next(music: &mut Music, note: &Note) -> Result<EditReport, EditError> {
    let (m, p) = music.locate_part(&note.measure_id, &note.part_measure_id)?;
    if m + 1 >= music.len() {
        return Err(EditError::MeasureBoundsExceeded {
            measure_id: note.measure_id.clone(),
            overflow: 0,
        });
    }

    let mut tx = Transaction::new(music);
    if tx.notes(m + 1, p)?.is_empty() {
        let part_id = tx.part_measure_id(m + 1, p)?.to_string();
        return Err(EditError::not_found(EntityKind::Note, format!("first note of {}", part_id)));
    }
    untie_partner(&mut tx, m, p)?;
    let staged = tx.finish();
    Ok(staged.commit(music))
}
