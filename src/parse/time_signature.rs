//! Time signature parsing
//!
//! "N/D" gives N beats of a 1/D note. The division grid is fixed per score
//! as a number of divisions per quarter note.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::TimeSignatureError;
use crate::models::Divisions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSignature {
    /// Beats per measure (numerator)
    pub beats: u32,
    /// Note value of one beat (denominator)
    pub beat_unit: u32,
}

impl TimeSignature {
    pub fn new(beats: u32, beat_unit: u32) -> Result<Self, TimeSignatureError> {
        if beats == 0 {
            return Err(TimeSignatureError::ZeroBeats(format!("{}/{}", beats, beat_unit)));
        }
        if !beat_unit.is_power_of_two() || beat_unit > 64 {
            return Err(TimeSignatureError::UnsupportedBeatUnit(beat_unit));
        }
        Ok(Self { beats, beat_unit })
    }

    /// Length of one beat in divisions
    pub fn divisions_per_beat(&self, divisions_per_quarter: u32) -> Result<Divisions, TimeSignatureError> {
        let whole = divisions_per_quarter
            .checked_mul(4)
            .ok_or_else(|| self.too_long(divisions_per_quarter))?;
        if whole % self.beat_unit != 0 || whole / self.beat_unit == 0 {
            return Err(TimeSignatureError::IndivisibleBeat {
                beat_unit: self.beat_unit,
                divisions_per_quarter,
            });
        }
        Ok(whole / self.beat_unit)
    }

    /// Total measure length in divisions: beats × divisions per beat
    pub fn measure_divisions(&self, divisions_per_quarter: u32) -> Result<Divisions, TimeSignatureError> {
        self.beats
            .checked_mul(self.divisions_per_beat(divisions_per_quarter)?)
            .ok_or_else(|| self.too_long(divisions_per_quarter))
    }

    fn too_long(&self, divisions_per_quarter: u32) -> TimeSignatureError {
        TimeSignatureError::MeasureTooLong {
            signature: self.to_string(),
            divisions_per_quarter,
        }
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats, self.beat_unit)
    }
}

impl FromStr for TimeSignature {
    type Err = TimeSignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_time_signature(s)
    }
}

/// Parse "4/4", "6/8", " 3 / 2 "
pub fn parse_time_signature(s: &str) -> Result<TimeSignature, TimeSignatureError> {
    let malformed = || TimeSignatureError::Malformed(s.to_string());
    let (beats, unit) = s.split_once('/').ok_or_else(malformed)?;
    let beats: u32 = beats.trim().parse().map_err(|_| malformed())?;
    let beat_unit: u32 = unit.trim().parse().map_err(|_| malformed())?;
    if beats == 0 {
        return Err(TimeSignatureError::ZeroBeats(s.to_string()));
    }
    TimeSignature::new(beats, beat_unit)
}
