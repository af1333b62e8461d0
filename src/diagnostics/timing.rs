//! Timing and tie checks
//!
//! Errors: a part-measure that does not start at 0, has gaps or overlaps,
//! does not end on the barline or holds an empty note; a forward tie that
//! is not on the last note or has no matching partner; a backward tie with
//! no origin. Warnings: back-references that disagree with the owning
//! measure or part-measure, and part counts that differ between measures.

use super::{DiagnosticMark, DiagnosticSeverity, Diagnostics};
use crate::models::{Music, PartMeasure};

pub fn check_music(music: &Music) -> Diagnostics {
    let mut diags = Diagnostics::new();
    let part_count = music.measure(0).map(|m| m.parts().len()).unwrap_or(0);

    for (m, measure) in music.measures().iter().enumerate() {
        if measure.parts().len() != part_count {
            diags.add(DiagnosticMark::new(
                m,
                0,
                DiagnosticSeverity::Warning,
                "part_count",
                format!("measure {} has {} parts, expected {}", measure.id, measure.parts().len(), part_count),
            ));
        }

        let total = match music.measure_duration(m) {
            Ok(total) => total,
            Err(err) => {
                diags.add(DiagnosticMark::new(m, 0, DiagnosticSeverity::Error, "time_signature", err.to_string()));
                continue;
            }
        };

        for (p, part) in measure.parts().iter().enumerate() {
            check_fill(&mut diags, m, p, part, total, &measure.id);
            check_ties(&mut diags, music, m, p, part);
        }
    }

    diags
}

fn check_fill(diags: &mut Diagnostics, m: usize, p: usize, part: &PartMeasure, total: u32, measure_id: &str) {
    let notes = part.notes();
    if notes.is_empty() {
        diags.add(DiagnosticMark::new(
            m,
            p,
            DiagnosticSeverity::Error,
            "empty_part",
            format!("part-measure {} has no notes", part.id),
        ));
        return;
    }

    let mut expected_start = 0;
    for (i, note) in notes.iter().enumerate() {
        if note.duration == 0 {
            diags.add(
                DiagnosticMark::new(m, p, DiagnosticSeverity::Error, "zero_duration", format!("note {} has no duration", note.id))
                    .at_note(i),
            );
        }
        if note.start != expected_start {
            let kind = if note.start > expected_start { "gap" } else { "overlap" };
            diags.add(
                DiagnosticMark::new(
                    m,
                    p,
                    DiagnosticSeverity::Error,
                    kind,
                    format!("note {} starts at {}, expected {}", note.id, note.start, expected_start),
                )
                .at_note(i),
            );
        }
        if note.measure_id != measure_id || note.part_measure_id != part.id {
            diags.add(
                DiagnosticMark::new(
                    m,
                    p,
                    DiagnosticSeverity::Warning,
                    "back_reference",
                    format!("note {} points at {}/{}", note.id, note.measure_id, note.part_measure_id),
                )
                .at_note(i),
            );
        }
        expected_start = note.end();
    }

    if expected_start != total {
        diags.add(DiagnosticMark::new(
            m,
            p,
            DiagnosticSeverity::Error,
            "measure_fill",
            format!("part-measure {} ends at {}, measure is {} long", part.id, expected_start, total),
        ));
    }
}

fn check_ties(diags: &mut Diagnostics, music: &Music, m: usize, p: usize, part: &PartMeasure) {
    let notes = part.notes();
    let last = notes.len().saturating_sub(1);

    for (i, note) in notes.iter().enumerate() {
        if note.tied_to_next {
            if i != last {
                diags.add(
                    DiagnosticMark::new(
                        m,
                        p,
                        DiagnosticSeverity::Error,
                        "tie_not_at_barline",
                        format!("note {} is tied forward but is not the last note", note.id),
                    )
                    .at_note(i),
                );
            } else {
                match music.measure(m + 1).and_then(|next| next.part(p)).and_then(|part| part.first()) {
                    Some(partner) if partner.tied_to_prev && partner.sounds_like(note) => {}
                    Some(partner) => diags.add(
                        DiagnosticMark::new(
                            m,
                            p,
                            DiagnosticSeverity::Error,
                            "tie_mismatch",
                            format!("note {} is tied forward but {} does not continue it", note.id, partner.id),
                        )
                        .at_note(i),
                    ),
                    None => diags.add(
                        DiagnosticMark::new(
                            m,
                            p,
                            DiagnosticSeverity::Error,
                            "dangling_tie",
                            format!("note {} is tied forward with no following measure", note.id),
                        )
                        .at_note(i),
                    ),
                }
            }
        }

        if note.tied_to_prev {
            let origin = if i == 0 && m > 0 {
                music.measure(m - 1).and_then(|prev| prev.part(p)).and_then(|part| part.last())
            } else {
                None
            };
            let tied = origin.map_or(false, |o| o.tied_to_next && o.sounds_like(note));
            if !tied {
                diags.add(
                    DiagnosticMark::new(
                        m,
                        p,
                        DiagnosticSeverity::Error,
                        "orphan_tie",
                        format!("note {} is tied backward with no note tying into it", note.id),
                    )
                    .at_note(i),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Measure, Note};

    fn music_with(notes: Vec<Note>) -> Music {
        let mut music = Music::new(4);
        music.push_measure(Measure::new("m1", "4/4", vec![PartMeasure::new("p1", "m1", notes)]));
        music
    }

    #[test]
    fn test_clean_measure() {
        let music = music_with(vec![
            Note::new("a", "m1", "p1", "C4", 0, 4),
            Note::new("b", "m1", "p1", "D4", 4, 12),
        ]);
        assert!(check_music(&music).is_empty());
    }

    #[test]
    fn test_gap_and_short_fill() {
        let music = music_with(vec![
            Note::new("a", "m1", "p1", "C4", 0, 4),
            Note::new("b", "m1", "p1", "D4", 6, 8),
        ]);
        let diags = check_music(&music);
        assert!(diags.has_errors());
        assert_eq!(diags.of_kind("gap").count(), 1);
        assert_eq!(diags.of_kind("measure_fill").count(), 1);
    }

    #[test]
    fn test_dangling_and_orphan_ties() {
        let mut a = Note::new("a", "m1", "p1", "C4", 0, 16);
        a.tied_to_next = true;
        a.tied_to_prev = true;
        let diags = check_music(&music_with(vec![a]));
        assert_eq!(diags.of_kind("dangling_tie").count(), 1);
        assert_eq!(diags.of_kind("orphan_tie").count(), 1);
    }

    #[test]
    fn test_bad_time_signature() {
        let mut music = Music::new(4);
        music.push_measure(Measure::new("m1", "four/4", vec![]));
        assert_eq!(check_music(&music).of_kind("time_signature").count(), 1);
    }
}
