//! Pitch spelling parsing and enharmonic respelling
//!
//! A spelling is a note letter, an optional single accidental and an
//! optional octave: "C4", "F#3", "bb2", "G".

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::PitchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    pub fn from_char(ch: char) -> Option<Letter> {
        match ch.to_ascii_uppercase() {
            'C' => Some(Letter::C),
            'D' => Some(Letter::D),
            'E' => Some(Letter::E),
            'F' => Some(Letter::F),
            'G' => Some(Letter::G),
            'A' => Some(Letter::A),
            'B' => Some(Letter::B),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Letter::C => 'C',
            Letter::D => 'D',
            Letter::E => 'E',
            Letter::F => 'F',
            Letter::G => 'G',
            Letter::A => 'A',
            Letter::B => 'B',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accidental {
    None,
    Sharp,
    Flat,
}

impl Accidental {
    pub fn symbol(&self) -> &'static str {
        match self {
            Accidental::None => "",
            Accidental::Sharp => "#",
            Accidental::Flat => "b",
        }
    }

    /// Whether this accidental already follows the requested convention
    pub fn matches_convention(&self, use_sharps: bool) -> bool {
        match self {
            Accidental::Sharp => use_sharps,
            Accidental::Flat => !use_sharps,
            Accidental::None => false,
        }
    }
}

/// Structured form of a pitch spelling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PitchSpelling {
    pub letter: Letter,
    pub accidental: Accidental,
    pub octave: Option<i8>,
}

impl PitchSpelling {
    /// Spelling of the same sounding pitch in the opposite accidental family.
    ///
    /// Only the five black keys have one; every other spelling is returned
    /// as is, which keeps the transform an involution.
    pub fn toggled(&self) -> PitchSpelling {
        match ENHARMONICS.get(&(self.letter, self.accidental)) {
            Some(&(letter, accidental)) => PitchSpelling {
                letter,
                accidental,
                octave: self.octave,
            },
            None => *self,
        }
    }
}

impl fmt::Display for PitchSpelling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter.as_char(), self.accidental.symbol())?;
        if let Some(octave) = self.octave {
            write!(f, "{}", octave)?;
        }
        Ok(())
    }
}

impl FromStr for PitchSpelling {
    type Err = PitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_pitch(s)
    }
}

// (letter, accidental) -> enharmonic in the other family, both directions
static ENHARMONICS: Lazy<HashMap<(Letter, Accidental), (Letter, Accidental)>> = Lazy::new(|| {
    let pairs = [
        (Letter::C, Letter::D),
        (Letter::D, Letter::E),
        (Letter::F, Letter::G),
        (Letter::G, Letter::A),
        (Letter::A, Letter::B),
    ];
    let mut table = HashMap::new();
    for (sharp, flat) in pairs {
        table.insert((sharp, Accidental::Sharp), (flat, Accidental::Flat));
        table.insert((flat, Accidental::Flat), (sharp, Accidental::Sharp));
    }
    table
});

/// Parse a pitch spelling such as "C#4" or "Bb"
pub fn parse_pitch(s: &str) -> Result<PitchSpelling, PitchError> {
    let s = s.trim();
    let mut chars = s.chars();
    let first = chars.next().ok_or(PitchError::Empty)?;
    let letter = Letter::from_char(first).ok_or(PitchError::UnknownLetter(first))?;

    let rest = chars.as_str();
    let (accidental, rest) = match rest.chars().next() {
        Some('#') => (Accidental::Sharp, &rest[1..]),
        Some('b') => (Accidental::Flat, &rest[1..]),
        _ => (Accidental::None, rest),
    };

    let octave = if rest.is_empty() {
        None
    } else {
        Some(
            rest.parse::<i8>()
                .map_err(|_| PitchError::InvalidOctave(rest.to_string()))?,
        )
    };

    Ok(PitchSpelling {
        letter,
        accidental,
        octave,
    })
}

/// Enharmonic equivalent of a spelling string, in canonical form
pub fn toggle_spelling(s: &str) -> Result<String, PitchError> {
    Ok(parse_pitch(s)?.toggled().to_string())
}
