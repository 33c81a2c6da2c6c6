pub mod chords;
pub mod decoder;
pub mod error;
pub mod events;
pub mod extract;
pub mod highway;
pub mod song;
pub mod tempo;
pub mod tokenizer;
pub mod track;

pub use chords::{group_chords, nearest_chord, Chord};
pub use decoder::{DecodedChart, Decoder, DecoderState};
pub use error::*;
pub use events::GlobalEvent;
pub use extract::{extract, Note, Phrase};
pub use song::SongInfo;
pub use tempo::{TempoChange, TempoMap, TimeSignature};
pub use track::{Difficulty, Instrument, TrackId};

/// Decode one track of a chart document.
/// This is the main entry point for the library.
pub fn decode(text: &str, track: &str) -> Result<DecodedChart, ChartError> {
    Decoder::load(text, track)?.decode()
}
