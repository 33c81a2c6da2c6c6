//! # Note & Phrase Extraction
//!
//! Turns one instrument track's tick events into classified [`Note`]s and
//! [`Phrase`]s with absolute times.
//!
//! ## Sub-modules
//! - `types` - Note, Phrase and the parsed TrackEvent
//! - `engine` - The two extraction passes
//!
//! ## Track Events
//! - `N <lane> <duration>` - lanes 0-4 are frets (7 is open); lane 5 inverts the
//!   automatic HOPO decision for its tick and lane 6 makes its tick a tap
//! - `S <type> <duration>` - phrase over `[tick, tick + duration)`; type 2 is star power
//! - anything else (`E solo`, ...) is skipped with a diagnostic
//!
//! ## Pass 1: Tick Domain
//! Events are grouped by tick and each group is classified on its own:
//! - Phrase markers in the group are opened first, so a note on a phrase's first
//!   tick belongs to it
//! - Only the most recently opened phrase is consulted: a note is in it (and
//!   star power when its type is 2) while the phrase covers the note's tick
//! - Lane 5/6 modifiers apply to every note of the group
//! - A group is an automatic HOPO when it holds exactly one note, some earlier
//!   tick held a note, and the gap is under `65/192` of a beat
//! - A group whose tick is below an earlier group's is skipped with a diagnostic
//!
//! ## Pass 2: Time Domain
//! All note ticks, then all phrase ticks, are converted in one call each to
//! [`TempoMap::ticks_to_milliseconds`](crate::TempoMap::ticks_to_milliseconds).
//!
//! ## Example
//! ```rust
//! use chartread::tokenizer::tokenize;
//! use chartread::{extract, TempoMap};
//!
//! let tokens = tokenize(
//!     "[SyncTrack]\n{\n  0 = B 120000\n}\n[ExpertSingle]\n{\n  0 = N 0 0\n  32 = N 1 0\n}\n",
//! );
//! let map = TempoMap::build(tokens.require("SyncTrack").unwrap(), 192, &mut Vec::new()).unwrap();
//! let result = extract(tokens.require("ExpertSingle").unwrap(), &map);
//!
//! assert_eq!(result.notes.len(), 2);
//! assert!(!result.notes[0].is_hopo);
//! assert!(result.notes[1].is_hopo);
//! ```

mod engine;
mod types;

#[cfg(test)]
mod tests;

pub use engine::{extract, Extraction, HOPO_THRESHOLD};
pub use types::{Note, Phrase, TrackEvent, FORCE_HOPO_LANE, STAR_POWER, TAP_LANE};
