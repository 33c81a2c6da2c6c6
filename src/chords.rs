//! # Chord Aggregation
//!
//! Groups the extracted notes into [`Chord`]s, one per note-bearing tick.
//!
//! Every note sharing a tick was classified together during extraction, so the
//! members of a chord already agree on time, phrase, star power, HOPO and tap.
//! The chord takes those shared attributes from its first note.
//!
//! ## Example
//! ```rust
//! use chartread::{group_chords, Note};
//!
//! let note = |tick: u32, button: u8| Note {
//!     tick,
//!     time_ms: tick as f64,
//!     duration_ticks: 0,
//!     button,
//!     is_tap: false,
//!     is_hopo: false,
//!     is_special: false,
//!     phrase_index: None,
//! };
//! let chords = group_chords(&[note(0, 0), note(0, 2), note(96, 1)]);
//!
//! assert_eq!(chords.len(), 2);
//! assert_eq!(chords[0].notes.len(), 2);
//! assert_eq!(chords[1].tick, 96);
//! ```

use crate::extract::Note;
use serde::Serialize;

/// Notes played together at one tick, with their shared attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chord {
    pub tick: u32,
    pub time_ms: f64,
    pub phrase_index: Option<usize>,
    pub is_special: bool,
    pub is_hopo: bool,
    pub is_tap: bool,
    pub notes: Vec<Note>,
}

impl Chord {
    fn start(note: &Note) -> Self {
        Self {
            tick: note.tick,
            time_ms: note.time_ms,
            phrase_index: note.phrase_index,
            is_special: note.is_special,
            is_hopo: note.is_hopo,
            is_tap: note.is_tap,
            notes: vec![note.clone()],
        }
    }

    /// Buttons of the member notes, in chart order.
    pub fn buttons(&self) -> impl Iterator<Item = u8> + '_ {
        self.notes.iter().map(|n| n.button)
    }
}

/// Group an ascending note sequence into chords by equal tick.
pub fn group_chords(notes: &[Note]) -> Vec<Chord> {
    let mut chords: Vec<Chord> = Vec::new();
    for note in notes {
        match chords.last_mut() {
            Some(chord) if chord.tick == note.tick => chord.notes.push(note.clone()),
            _ => chords.push(Chord::start(note)),
        }
    }
    log::debug!("grouped {} notes into {} chords", notes.len(), chords.len());
    chords
}

/// The chord whose time is closest to `time_ms` (the earlier one on a tie).
///
/// `chords` must be in ascending time order, as [`group_chords`] produces them.
pub fn nearest_chord(chords: &[Chord], time_ms: f64) -> Option<&Chord> {
    let after = chords.partition_point(|c| c.time_ms < time_ms);
    let before = after.checked_sub(1).map(|i| &chords[i]);
    match (before, chords.get(after)) {
        (Some(b), Some(a)) if a.time_ms - time_ms < time_ms - b.time_ms => Some(a),
        (Some(b), _) => Some(b),
        (None, a) => a,
    }
}
