//! Note resizing across barlines
//!
//! A resize walks forward one measure at a time with the duration still to
//! place. Each step either fits the remainder into the current measure, or
//! fills to the barline, ties forward and carries the excess into the
//! parallel part of the next measure. The walk touches each measure at most
//! once, so a chain is never longer than the rest of the score.

use super::reflow::set_duration;
use super::tie::{place_continuation, untie_partner, untie_upstream};
use super::transaction::{EditReport, NoteEdit, Transaction};
use crate::errors::EditError;
use crate::identity::IdGenerator;
use crate::models::{Divisions, Music, Note, NoteLocation};

/// Resize a note, re-flowing its part-measure and extending or trimming
/// its tie chain as needed.
///
/// With `propagate_backward`, resizing a continuation resizes the whole
/// chain from its head so that the continuation ends up `new_duration` long.
/// On error nothing is changed.
pub fn resize_note(
    music: &mut Music,
    ids: &mut dyn IdGenerator,
    location: &NoteLocation,
    new_duration: i64,
    propagate_backward: bool,
) -> Result<EditReport, EditError> {
    let requested = checked_duration(new_duration)?;
    let (m, p, i) = music.locate(location)?;
    let (m, i, total) = if propagate_backward {
        chain_head(music, m, p, i, requested)?
    } else {
        (m, i, requested)
    };

    log::debug!(
        "resizing {} to {} divisions (walk starts at measure #{}, {} in total)",
        location.note_id,
        requested,
        m,
        total
    );

    let mut tx = Transaction::new(music);
    extend_from(&mut tx, ids, m, p, i, total)?;
    let staged = tx.finish();
    Ok(staged.commit(music))
}

/// Drop a copy of `note` into the slot of `at`, then size it like the original.
///
/// The copy gets a fresh identity, loses its ties, takes over the displaced
/// note's span and is then resized to the copied duration, tying forward if
/// it does not fit.
pub fn paste_note(
    music: &mut Music,
    ids: &mut dyn IdGenerator,
    note: &Note,
    at: &NoteLocation,
) -> Result<EditReport, EditError> {
    let duration = checked_duration(i64::from(note.duration))?;
    let (m, p, i) = music.locate(at)?;

    let mut copy = Note::create_from_copy(note);
    copy.reset_identity(ids, at.measure_id.clone(), at.part_measure_id.clone());
    copy.tied_to_next = false;
    copy.tied_to_prev = false;

    let mut tx = Transaction::new(music);
    let notes = tx.notes_mut(m, p)?;
    let displaced = notes.remove(i);
    copy.start = displaced.start;
    copy.duration = displaced.duration;
    let added = NoteEdit::added(&copy);
    notes.insert(i, copy);

    tx.record(NoteEdit::removed(&displaced));
    tx.record(added);
    if displaced.tied_to_next {
        untie_partner(&mut tx, m, p)?;
    }
    if displaced.tied_to_prev {
        untie_upstream(&mut tx, m, p)?;
    }

    extend_from(&mut tx, ids, m, p, i, duration)?;
    let staged = tx.finish();
    Ok(staged.commit(music))
}

fn checked_duration(duration: i64) -> Result<Divisions, EditError> {
    if duration <= 0 {
        return Err(EditError::InvalidDuration(duration));
    }
    Divisions::try_from(duration).map_err(|_| EditError::InvalidDuration(duration))
}

/// Walk back from a continuation to the head of its tie chain.
///
/// Returns the head's position and the total duration the chain must have
/// for the continuation to come out `requested` long. A total that does not
/// fit in `Divisions` is an invalid duration.
fn chain_head(
    music: &Music,
    m: usize,
    p: usize,
    i: usize,
    requested: Divisions,
) -> Result<(usize, usize, Divisions), EditError> {
    let (mut m, mut i, mut total) = (m, i, requested);
    loop {
        let Some(part) = music.part_measure(m, p) else { break };
        let note = &part.notes()[i];
        if !note.tied_to_prev || i != 0 || m == 0 {
            break;
        }
        let Some(prev_part) = music.part_measure(m - 1, p) else { break };
        let Some(prev) = prev_part.last() else { break };
        if !prev.tied_to_next || !prev.sounds_like(note) {
            log::warn!("note {} is tied backward but {} does not tie into it", note.id, prev.id);
            break;
        }
        total = total
            .checked_add(prev.duration)
            .ok_or_else(|| EditError::InvalidDuration(i64::from(total) + i64::from(prev.duration)))?;
        m -= 1;
        i = prev_part.notes().len() - 1;
    }
    Ok((m, i, total))
}

/// Give the note at (m, p, i) a total sounding length of `total`, tying
/// forward through as many measures as it takes.
fn extend_from(
    tx: &mut Transaction<'_>,
    ids: &mut dyn IdGenerator,
    m: usize,
    p: usize,
    i: usize,
    total: Divisions,
) -> Result<(), EditError> {
    let measure_count = tx.music().len();
    let (mut m, mut i, mut remaining) = (m, i, total);

    loop {
        let capacity = tx.music().measure_duration(m)?;
        let current = tx.notes(m, p)?[i].clone();
        let room = capacity.saturating_sub(current.start);

        if remaining <= room {
            let outcome = set_duration(tx, ids, m, p, i, remaining, capacity)?;
            // ending exactly on the barline keeps the length but not the tie
            let note = &mut tx.notes_mut(m, p)?[i];
            let still_tied = note.tied_to_next;
            if still_tied {
                note.tied_to_next = false;
                let note_id = note.id.clone();
                tx.record(NoteEdit::UntiedForward { note_id });
            }
            if outcome.dropped_forward_tie || still_tied {
                untie_partner(tx, m, p)?;
            }
            return Ok(());
        }

        let excess = remaining - room;
        let next = m + 1;
        if next >= measure_count {
            return Err(EditError::MeasureBoundsExceeded {
                measure_id: current.measure_id.clone(),
                overflow: excess,
            });
        }

        // a tied note swallowed here has its partner displaced below
        set_duration(tx, ids, m, p, i, room, capacity)?;
        if !current.tied_to_next {
            tx.notes_mut(m, p)?[i].tied_to_next = true;
            tx.record(NoteEdit::TiedForward {
                note_id: current.id.clone(),
            });
        }

        let reuse = current.tied_to_next
            && tx
                .notes(next, p)?
                .first()
                .map_or(false, |first| first.tied_to_prev && first.sounds_like(&current));
        if !reuse {
            place_continuation(tx, ids, &current, next, p)?;
        }

        m = next;
        i = 0;
        remaining = excess;
    }
}
