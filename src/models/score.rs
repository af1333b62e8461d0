//! Score structure: Score → Music → Measure → PartMeasure → Note
//!
//! Every ordered sequence keeps an identity → position index next to it.
//! Indices are not serialized; call `Score::reindex` after deserializing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::note::{Note, NoteLocation};
use super::Divisions;
use crate::config::EngineConfig;
use crate::errors::{EditError, EntityKind};
use crate::identity::IdGenerator;
use crate::parse::time_signature::{parse_time_signature, TimeSignature};

/// One instrument's notes inside one measure
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PartMeasure {
    pub id: String,
    pub measure_id: String,

    /// Ordered by start, contiguous, covering the whole measure
    notes: Vec<Note>,

    #[serde(skip)]
    note_index: HashMap<String, usize>,
}

impl PartMeasure {
    pub fn new(id: impl Into<String>, measure_id: impl Into<String>, notes: Vec<Note>) -> Self {
        let mut part = Self {
            id: id.into(),
            measure_id: measure_id.into(),
            notes,
            note_index: HashMap::new(),
        };
        part.reindex();
        part
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, note_id: &str) -> Option<&Note> {
        self.position_of(note_id).map(|i| &self.notes[i])
    }

    pub fn position_of(&self, note_id: &str) -> Option<usize> {
        self.note_index.get(note_id).copied()
    }

    pub fn first(&self) -> Option<&Note> {
        self.notes.first()
    }

    pub fn last(&self) -> Option<&Note> {
        self.notes.last()
    }

    /// Swap in a new note sequence (e.g. a committed staged edit)
    pub(crate) fn replace_notes(&mut self, notes: Vec<Note>) {
        self.notes = notes;
        self.reindex();
    }

    pub(crate) fn note_mut(&mut self, note_id: &str) -> Option<&mut Note> {
        let i = self.position_of(note_id)?;
        self.notes.get_mut(i)
    }

    pub fn reindex(&mut self) {
        self.note_index = self
            .notes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Measure {
    pub id: String,

    /// e.g. "4/4"
    pub time_signature: String,

    /// One per instrument, in the score-wide part order
    parts: Vec<PartMeasure>,

    #[serde(skip)]
    part_index: HashMap<String, usize>,
}

impl Measure {
    pub fn new(id: impl Into<String>, time_signature: impl Into<String>, parts: Vec<PartMeasure>) -> Self {
        let mut measure = Self {
            id: id.into(),
            time_signature: time_signature.into(),
            parts,
            part_index: HashMap::new(),
        };
        measure.reindex();
        measure
    }

    pub fn parts(&self) -> &[PartMeasure] {
        &self.parts
    }

    pub fn part(&self, ordinal: usize) -> Option<&PartMeasure> {
        self.parts.get(ordinal)
    }

    /// Ordinal of a part-measure within this measure
    pub fn ordinal_of(&self, part_measure_id: &str) -> Option<usize> {
        self.part_index.get(part_measure_id).copied()
    }

    pub fn signature(&self) -> Result<TimeSignature, EditError> {
        Ok(parse_time_signature(&self.time_signature)?)
    }

    pub(crate) fn part_mut(&mut self, ordinal: usize) -> Option<&mut PartMeasure> {
        self.parts.get_mut(ordinal)
    }

    pub fn reindex(&mut self) {
        for part in &mut self.parts {
            part.reindex();
        }
        self.part_index = self
            .parts
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
    }
}

/// Measures in performance order
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Music {
    /// Time grid shared by every measure
    pub divisions_per_quarter: u32,

    measures: Vec<Measure>,

    #[serde(skip)]
    measure_index: HashMap<String, usize>,
}

impl Music {
    pub fn new(divisions_per_quarter: u32) -> Self {
        Self {
            divisions_per_quarter,
            measures: Vec::new(),
            measure_index: HashMap::new(),
        }
    }

    pub fn measures(&self) -> &[Measure] {
        &self.measures
    }

    pub fn measure(&self, index: usize) -> Option<&Measure> {
        self.measures.get(index)
    }

    pub fn index_of(&self, measure_id: &str) -> Option<usize> {
        self.measure_index.get(measure_id).copied()
    }

    pub fn len(&self) -> usize {
        self.measures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }

    pub fn push_measure(&mut self, measure: Measure) {
        self.measure_index.insert(measure.id.clone(), self.measures.len());
        self.measures.push(measure);
    }

    /// Append a measure holding one whole-measure rest per part.
    ///
    /// The part count follows the existing measures (one part for an empty score).
    /// Returns the new measure's id.
    pub fn append_measure(
        &mut self,
        ids: &mut dyn IdGenerator,
        time_signature: &str,
    ) -> Result<String, EditError> {
        let total = parse_time_signature(time_signature)?.measure_divisions(self.divisions_per_quarter)?;
        let part_count = self.measures.last().map(|m| m.parts.len()).unwrap_or(1);
        let measure_id = ids.new_id();
        let parts = (0..part_count)
            .map(|_| {
                let part_id = ids.new_id();
                let rest = Note::rest(ids.new_id(), measure_id.clone(), part_id.clone(), 0, total);
                PartMeasure::new(part_id, measure_id.clone(), vec![rest])
            })
            .collect();
        log::debug!("appending measure {} ({}, {} parts)", measure_id, time_signature, part_count);
        self.push_measure(Measure::new(measure_id.clone(), time_signature, parts));
        Ok(measure_id)
    }

    /// Total length of a measure in divisions
    pub fn measure_duration(&self, index: usize) -> Result<Divisions, EditError> {
        let measure = self
            .measures
            .get(index)
            .ok_or_else(|| EditError::not_found(EntityKind::Measure, format!("#{}", index)))?;
        Ok(measure.signature()?.measure_divisions(self.divisions_per_quarter)?)
    }

    /// One beat of a measure in divisions
    pub fn beat_duration(&self, index: usize) -> Result<Divisions, EditError> {
        let measure = self
            .measures
            .get(index)
            .ok_or_else(|| EditError::not_found(EntityKind::Measure, format!("#{}", index)))?;
        Ok(measure.signature()?.divisions_per_beat(self.divisions_per_quarter)?)
    }

    /// Resolve a location to (measure index, part ordinal, note position)
    pub fn locate(&self, location: &NoteLocation) -> Result<(usize, usize, usize), EditError> {
        let (m, p) = self.locate_part(&location.measure_id, &location.part_measure_id)?;
        let i = self.measures[m].parts[p]
            .position_of(&location.note_id)
            .ok_or_else(|| EditError::not_found(EntityKind::Note, &location.note_id))?;
        Ok((m, p, i))
    }

    /// Resolve a part-measure to (measure index, part ordinal)
    pub fn locate_part(&self, measure_id: &str, part_measure_id: &str) -> Result<(usize, usize), EditError> {
        let m = self
            .index_of(measure_id)
            .ok_or_else(|| EditError::not_found(EntityKind::Measure, measure_id))?;
        let p = self.measures[m]
            .ordinal_of(part_measure_id)
            .ok_or_else(|| EditError::not_found(EntityKind::PartMeasure, part_measure_id))?;
        Ok((m, p))
    }

    pub fn note(&self, location: &NoteLocation) -> Result<&Note, EditError> {
        let (m, p, i) = self.locate(location)?;
        Ok(&self.measures[m].parts[p].notes[i])
    }

    pub(crate) fn part_measure(&self, m: usize, p: usize) -> Option<&PartMeasure> {
        self.measures.get(m).and_then(|measure| measure.part(p))
    }

    pub(crate) fn part_measure_mut(&mut self, m: usize, p: usize) -> Option<&mut PartMeasure> {
        self.measures.get_mut(m).and_then(|measure| measure.part_mut(p))
    }

    pub fn reindex(&mut self) {
        for measure in &mut self.measures {
            measure.reindex();
        }
        self.measure_index = self
            .measures
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id.clone(), i))
            .collect();
    }
}

/// Root of the model
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Score {
    pub config: EngineConfig,
    pub music: Music,
}

impl Score {
    pub fn new(config: EngineConfig) -> Self {
        let music = Music::new(config.divisions_per_quarter);
        Self { config, music }
    }

    /// Rebuild every identity index, e.g. after deserializing
    pub fn reindex(&mut self) {
        self.music.reindex();
    }
}

impl Default for Score {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::SequentialIds;

    fn one_measure_music() -> Music {
        let mut music = Music::new(4);
        let notes = vec![
            Note::new("a", "m1", "p1", "C4", 0, 8),
            Note::new("b", "m1", "p1", "D4", 8, 8),
        ];
        let part = PartMeasure::new("p1", "m1", notes);
        music.push_measure(Measure::new("m1", "4/4", vec![part]));
        music
    }

    #[test]
    fn test_locate_by_identity() {
        let music = one_measure_music();
        let loc = NoteLocation::new("m1", "p1", "b");
        assert_eq!(music.locate(&loc).unwrap(), (0, 0, 1));
        assert_eq!(music.note(&loc).unwrap().full_name, "D4");
    }

    #[test]
    fn test_locate_reports_missing_entity() {
        let music = one_measure_music();
        let err = music.locate(&NoteLocation::new("m1", "p1", "zz")).unwrap_err();
        assert_eq!(err, EditError::not_found(EntityKind::Note, "zz"));
        let err = music.locate(&NoteLocation::new("m1", "px", "a")).unwrap_err();
        assert_eq!(err, EditError::not_found(EntityKind::PartMeasure, "px"));
        let err = music.locate(&NoteLocation::new("mx", "p1", "a")).unwrap_err();
        assert_eq!(err, EditError::not_found(EntityKind::Measure, "mx"));
    }

    #[test]
    fn test_measure_and_beat_duration() {
        let music = one_measure_music();
        assert_eq!(music.measure_duration(0).unwrap(), 16);
        assert_eq!(music.beat_duration(0).unwrap(), 4);
        assert!(music.measure_duration(1).is_err());
    }

    #[test]
    fn test_append_measure_fills_with_rests() {
        let mut music = one_measure_music();
        let mut ids = SequentialIds::new("x");
        let id = music.append_measure(&mut ids, "3/4").unwrap();

        let measure = music.measure(1).unwrap();
        assert_eq!(measure.id, id);
        assert_eq!(music.index_of(&id), Some(1));
        assert_eq!(measure.parts().len(), 1);
        let rest = &measure.parts()[0].notes()[0];
        assert!(rest.is_rest);
        assert_eq!((rest.start, rest.duration), (0, 12));
        assert_eq!(rest.measure_id, id);
    }

    #[test]
    fn test_reindex_after_deserialize() {
        let music = one_measure_music();
        let json = serde_json::to_string(&music).unwrap();
        let mut restored: Music = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.index_of("m1"), None);
        restored.reindex();
        assert_eq!(restored.locate(&NoteLocation::new("m1", "p1", "a")).unwrap(), (0, 0, 0));
    }
}
