//! Stateless parsers the engine depends on
//!
//! Pitch spellings and time signatures arrive as strings on the model and
//! are parsed on demand.

pub mod pitch;
pub mod time_signature;

pub use pitch::{parse_pitch, toggle_spelling, Accidental, Letter, PitchSpelling};
pub use time_signature::{parse_time_signature, TimeSignature};
