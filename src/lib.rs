//! Score editing core
//!
//! Models a multi-instrument score as measures of per-instrument notes on a
//! fixed division grid, and edits note durations while keeping every
//! part-measure exactly filled and every cross-barline tie consistent.

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod errors;
pub mod identity;
pub mod models;
pub mod parse;

// Re-export commonly used types
pub use config::{DanglingTiePolicy, EngineConfig};
pub use engine::{EditReport, NoteEdit};
pub use errors::{EditError, EntityKind};
pub use identity::{IdGenerator, SequentialIds, UuidGenerator};
pub use models::*;
