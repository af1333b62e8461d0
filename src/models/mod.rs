//! Data model for the score editor
//!
//! A score owns its music; music is an ordered run of measures; each
//! measure holds one part-measure per instrument; each part-measure holds
//! the notes that exactly fill the measure.

pub mod note;
pub mod score;

/// Indivisible unit of musical time for offsets and durations
pub type Divisions = u32;

pub use note::{Note, NoteLocation, TieState};
pub use score::{Measure, Music, PartMeasure, Score};
