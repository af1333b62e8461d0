// Tie propagation: continuation chains, untying and tied respelling

use score_editor::diagnostics::check_music;
use score_editor::{
    DanglingTiePolicy, EditError, EngineConfig, Measure, Note, NoteEdit, NoteLocation, PartMeasure,
    Score, SequentialIds, TieState,
};

/// Helper to build a score with one part and one note per measure
fn build_score(config: EngineConfig, pitches: &[&str]) -> Score {
    let mut score = Score::new(config);
    for (k, pitch) in pitches.iter().enumerate() {
        let mid = format!("m{}", k + 1);
        let pid = format!("{}p1", mid);
        let note = Note::new(format!("{}n1", pid), &mid, &pid, *pitch, 0, 16);
        score
            .music
            .push_measure(Measure::new(mid.clone(), "4/4", vec![PartMeasure::new(pid, mid, vec![note])]));
    }
    score
}

fn first_note(score: &Score, m: usize) -> &Note {
    &score.music.measure(m).unwrap().parts()[0].notes()[0]
}

fn head(score: &Score) -> NoteLocation {
    first_note(score, 0).location()
}

fn assert_consistent(score: &Score) {
    let diags = check_music(&score.music);
    assert!(diags.is_empty(), "score has timing problems: {:?}", diags.marks);
}

#[test]
fn test_chain_spans_as_many_measures_as_needed() {
    for full_measures in 1..=3u32 {
        let mut score = build_score(EngineConfig::default(), &["C4", "D4", "E4", "F4", "G4"]);
        let mut ids = SequentialIds::new("c");

        let total = 16 * full_measures + 5;
        let report = score.resize_note(&mut ids, &head(&score), i64::from(total), false).unwrap();

        assert_eq!(report.continuations.len() as u32, full_measures);
        let n = full_measures as usize;
        for m in 1..n {
            let note = first_note(&score, m);
            assert_eq!(note.duration, 16);
            assert_eq!(note.tie_state(), TieState::TiedBoth);
            assert_eq!(note.full_name, "C4");
        }
        let last = first_note(&score, n);
        assert_eq!(last.duration, 5);
        assert_eq!(last.tie_state(), TieState::TiedBackward);
        assert_eq!(first_note(&score, 0).tie_state(), TieState::TiedForward);
        assert_consistent(&score);
    }
}

#[test]
fn test_shrinking_chain_to_a_barline() {
    for (total, segments) in [(32u32, 2usize), (16, 1)] {
        let mut score = build_score(EngineConfig::default(), &["C4", "D4", "E4"]);
        let mut ids = SequentialIds::new("c");
        score.resize_note(&mut ids, &head(&score), 40, false).unwrap();

        let report = score.resize_note(&mut ids, &head(&score), i64::from(total), false).unwrap();
        assert!(!report.is_empty());

        // the chain now ends on the barline after `segments` measures
        let last = first_note(&score, segments - 1);
        assert_eq!(last.duration, 16);
        assert!(!last.tied_to_next);
        assert!(report.edits.contains(&NoteEdit::UntiedForward {
            note_id: last.id.clone()
        }));
        let released = first_note(&score, segments);
        assert!(!released.tied_to_prev);
        assert!(report.edits.contains(&NoteEdit::UntiedBackward {
            note_id: released.id.clone()
        }));

        let sounding: u32 = (0..segments).map(|m| first_note(&score, m).duration).sum();
        assert_eq!(sounding, total);
        assert_consistent(&score);
    }
}

#[test]
fn test_growing_reuses_existing_continuation() {
    let mut score = build_score(EngineConfig::default(), &["C4", "D4"]);
    let mut ids = SequentialIds::new("c");

    score.resize_note(&mut ids, &head(&score), 20, false).unwrap();
    let continuation_id = first_note(&score, 1).id.clone();

    let report = score.resize_note(&mut ids, &head(&score), 24, false).unwrap();
    assert!(report.continuations.is_empty());
    assert_eq!(first_note(&score, 1).id, continuation_id);
    assert_eq!(first_note(&score, 1).duration, 8);
    assert_consistent(&score);
}

#[test]
fn test_shrinking_head_releases_partner() {
    let mut score = build_score(EngineConfig::default(), &["C4", "D4"]);
    let mut ids = SequentialIds::new("c");

    score.resize_note(&mut ids, &head(&score), 20, false).unwrap();
    let continuation_id = first_note(&score, 1).id.clone();

    let report = score.resize_note(&mut ids, &head(&score), 12, false).unwrap();

    assert_eq!(first_note(&score, 0).tie_state(), TieState::Untied);
    assert_eq!(first_note(&score, 0).duration, 12);
    let former = first_note(&score, 1);
    assert_eq!(former.id, continuation_id);
    assert_eq!(former.tie_state(), TieState::Untied);
    assert!(report.edits.contains(&NoteEdit::UntiedBackward {
        note_id: continuation_id.clone()
    }));
    assert_consistent(&score);
}

#[test]
fn test_resizing_continuation_with_backward_propagation() {
    let mut score = build_score(EngineConfig::default(), &["C4", "D4", "E4"]);
    let mut ids = SequentialIds::new("c");

    score.resize_note(&mut ids, &head(&score), 20, false).unwrap();
    let continuation = first_note(&score, 1).location();

    score.resize_note(&mut ids, &continuation, 10, true).unwrap();
    assert_eq!(first_note(&score, 0).duration, 16);
    assert_eq!(first_note(&score, 1).duration, 10);
    assert_eq!(first_note(&score, 1).id, continuation.note_id);

    let report = score.resize_note(&mut ids, &continuation, 20, true).unwrap();
    assert_eq!(report.continuations.len(), 1);
    assert_eq!(first_note(&score, 1).duration, 16);
    assert_eq!(first_note(&score, 1).tie_state(), TieState::TiedBoth);
    assert_eq!(first_note(&score, 2).duration, 4);
    assert_eq!(first_note(&score, 2).full_name, "C4");
    assert_consistent(&score);
}

#[test]
fn test_swallowing_tied_note_unties_its_partner() {
    let mut score = Score::new(EngineConfig::default());
    score.music.push_measure(Measure::new(
        "m1",
        "4/4",
        vec![PartMeasure::new(
            "p1",
            "m1",
            vec![
                Note::new("a", "m1", "p1", "C4", 0, 8),
                Note::new("b", "m1", "p1", "E4", 8, 8),
            ],
        )],
    ));
    score.music.push_measure(Measure::new(
        "m2",
        "4/4",
        vec![PartMeasure::new("p2", "m2", vec![Note::new("c", "m2", "p2", "G4", 0, 16)])],
    ));
    let mut ids = SequentialIds::new("x");

    // E4 ties into m2
    score.resize_note(&mut ids, &NoteLocation::new("m1", "p1", "b"), 12, false).unwrap();
    assert!(first_note(&score, 1).tied_to_prev);

    // C4 grows over E4
    score.resize_note(&mut ids, &NoteLocation::new("m1", "p1", "a"), 16, false).unwrap();

    assert_eq!(score.music.measure(0).unwrap().parts()[0].notes().len(), 1);
    let orphan = first_note(&score, 1);
    assert_eq!(orphan.full_name, "E4");
    assert!(!orphan.tied_to_prev);
    assert_consistent(&score);
}

#[test]
fn test_untie_from_next_clears_exactly_the_partner() {
    let mut score = build_score(EngineConfig::default(), &["C4", "D4", "E4"]);
    let mut ids = SequentialIds::new("c");
    score.resize_note(&mut ids, &head(&score), 20, false).unwrap();

    let before = score.clone();
    let note = first_note(&score, 0).clone();
    let report = score.untie_from_next(&note).unwrap();

    assert_eq!(report.edits.len(), 1);
    assert!(!first_note(&score, 1).tied_to_prev);
    // everything else as it was
    assert_eq!(first_note(&score, 0), first_note(&before, 0));
    assert_eq!(score.music.measure(2), before.music.measure(2));
    let after_rest = &score.music.measure(1).unwrap().parts()[0].notes()[1..];
    let before_rest = &before.music.measure(1).unwrap().parts()[0].notes()[1..];
    assert_eq!(after_rest, before_rest);
}

#[test]
fn test_untie_from_next_in_last_measure_is_rejected() {
    let mut score = build_score(EngineConfig::default(), &["C4", "D4"]);
    let before = score.clone();
    let last = first_note(&score, 1).clone();

    let err = score.untie_from_next(&last).unwrap_err();
    assert_eq!(
        err,
        EditError::MeasureBoundsExceeded {
            measure_id: "m2".into(),
            overflow: 0
        }
    );
    assert_eq!(score, before);
}

#[test]
fn test_untie_from_next_in_last_measure_can_be_ignored() {
    let config = EngineConfig {
        dangling_ties: DanglingTiePolicy::Ignore,
        ..EngineConfig::default()
    };
    let mut score = build_score(config, &["C4"]);
    let last = first_note(&score, 0).clone();

    let report = score.untie_from_next(&last).unwrap();
    assert!(report.is_empty());
}

#[test]
fn test_untie_from_next_unknown_measure() {
    let mut score = build_score(EngineConfig::default(), &["C4", "D4"]);
    let mut stray = first_note(&score, 0).clone();
    stray.measure_id = "gone".into();

    let err = score.untie_from_next(&stray).unwrap_err();
    assert!(matches!(err, EditError::NotFound { .. }));
}

#[test]
fn test_respelling_follows_the_tie() {
    let mut score = build_score(EngineConfig::default(), &["C#4", "D4", "E4"]);
    let mut ids = SequentialIds::new("c");
    score.resize_note(&mut ids, &head(&score), 36, false).unwrap();

    assert!(score.toggle_accidental_spelling(&head(&score), false).unwrap());
    for m in 0..3 {
        assert_eq!(first_note(&score, m).full_name, "Db4");
    }
    assert_consistent(&score);

    // already flat
    let continuation = first_note(&score, 2).location();
    assert!(!score.toggle_accidental_spelling(&continuation, false).unwrap());

    assert_eq!(score.normalize_spelling().unwrap(), 3);
    for m in 0..3 {
        assert_eq!(first_note(&score, m).full_name, "C#4");
    }
    assert_consistent(&score);
}

#[test]
fn test_normalize_spelling_is_all_or_nothing() {
    let mut score = build_score(
        EngineConfig {
            prefer_sharps: false,
            ..EngineConfig::default()
        },
        &["C#4", "??"],
    );

    assert!(matches!(score.normalize_spelling(), Err(EditError::Pitch(_))));
    assert_eq!(first_note(&score, 0).full_name, "C#4");
}

#[test]
fn test_rest_ties_as_rest() {
    let mut score = Score::new(EngineConfig::default());
    for k in 1..=2 {
        let mid = format!("m{}", k);
        let pid = format!("p{}", k);
        let rest = Note::rest(format!("r{}", k), &mid, &pid, 0, 16);
        score
            .music
            .push_measure(Measure::new(mid.clone(), "4/4", vec![PartMeasure::new(pid, mid, vec![rest])]));
    }
    let mut ids = SequentialIds::new("c");

    score.resize_note(&mut ids, &NoteLocation::new("m1", "p1", "r1"), 18, false).unwrap();

    let continuation = first_note(&score, 1);
    assert!(continuation.is_rest);
    assert!(continuation.tied_to_prev);
    assert_eq!(continuation.duration, 2);
    assert_consistent(&score);
}
