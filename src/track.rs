//! Instrument track names.
//!
//! A playable track section is named `<Difficulty><Instrument>`, for example
//! `[ExpertSingle]` or `[HardDoubleBass]`.

use std::fmt;

/// Chart difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Expert => "Expert",
        }
    }
}

/// Instrument part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instrument {
    Single,       // Lead guitar
    DoubleGuitar, // Co-op guitar
    DoubleBass,
    DoubleRhythm,
    Keyboard,
    Drums,
    GHLGuitar, // 6-fret guitar
    GHLBass,   // 6-fret bass
}

impl Instrument {
    pub const ALL: [Instrument; 8] = [
        Instrument::Single,
        Instrument::DoubleGuitar,
        Instrument::DoubleBass,
        Instrument::DoubleRhythm,
        Instrument::Keyboard,
        Instrument::Drums,
        Instrument::GHLGuitar,
        Instrument::GHLBass,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Instrument::Single => "Single",
            Instrument::DoubleGuitar => "DoubleGuitar",
            Instrument::DoubleBass => "DoubleBass",
            Instrument::DoubleRhythm => "DoubleRhythm",
            Instrument::Keyboard => "Keyboard",
            Instrument::Drums => "Drums",
            Instrument::GHLGuitar => "GHLGuitar",
            Instrument::GHLBass => "GHLBass",
        }
    }
}

/// A difficulty/instrument pair naming one track section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackId {
    pub difficulty: Difficulty,
    pub instrument: Instrument,
}

impl TrackId {
    pub fn new(difficulty: Difficulty, instrument: Instrument) -> Self {
        Self {
            difficulty,
            instrument,
        }
    }

    /// Parse a section name such as `ExpertSingle` (case-sensitive)
    pub fn parse(s: &str) -> Option<Self> {
        Difficulty::ALL.iter().find_map(|&difficulty| {
            let rest = s.strip_prefix(difficulty.as_str())?;
            Instrument::ALL
                .iter()
                .find(|i| i.as_str() == rest)
                .map(|&instrument| Self::new(difficulty, instrument))
        })
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.difficulty.as_str(), self.instrument.as_str())
    }
}
