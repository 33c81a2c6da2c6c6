//! # Decoder
//!
//! The public entry point: runs the pipeline for one chart document and one
//! instrument track.
//!
//! ## Lifecycle
//! ```text
//! Created ──tokenize──▶ Tokenized ──extract_notes──▶ TimedNotesReady ──aggregate_chords──▶ ChordsReady
//! ```
//!
//! Each stage runs exactly once. Calling a stage out of order, or again, fails
//! with [`ChartError::InvalidStateTransition`] instead of silently re-running.
//! [`Decoder::decode`] runs whatever stages remain and hands the results over as
//! a [`DecodedChart`]. Every document gets its own `Decoder`; nothing is shared
//! between documents.
//!
//! ## Typical Usage
//! ```rust
//! use chartread::Decoder;
//!
//! let text = r#"[Song]
//! {
//!   Resolution = 192
//! }
//! [SyncTrack]
//! {
//!   0 = B 120000
//! }
//! [ExpertSingle]
//! {
//!   0 = N 0 0
//!   96 = N 1 0
//! }
//! "#;
//!
//! let mut decoder = Decoder::load(text, "ExpertSingle")?;
//! let chart = decoder.decode()?;
//!
//! assert_eq!(chart.notes[1].time_ms, 250.0);
//! assert_eq!(chart.chords.len(), 2);
//! assert_eq!(decoder.ticks_to_milliseconds(&[192])?, vec![500.0]);
//! # Ok::<(), chartread::ChartError>(())
//! ```

use crate::chords::{group_chords, Chord};
use crate::error::{ChartError, Diagnostic};
use crate::events::{global_events, GlobalEvent};
use crate::extract::{extract, Note, Phrase};
use crate::song::SongInfo;
use crate::tempo::{TempoChange, TempoMap};
use crate::tokenizer::{tokenize, Tokenized};
use crate::track::TrackId;
use serde::Serialize;
use std::fmt;

const SONG: &str = "Song";
const SYNC_TRACK: &str = "SyncTrack";
const EVENTS: &str = "Events";

/// Where a [`Decoder`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DecoderState {
    Created,
    Tokenized,
    TimedNotesReady,
    ChordsReady,
}

impl DecoderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecoderState::Created => "created",
            DecoderState::Tokenized => "tokenized",
            DecoderState::TimedNotesReady => "timed notes ready",
            DecoderState::ChordsReady => "chords ready",
        }
    }
}

impl fmt::Display for DecoderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything decoded from one chart track.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedChart {
    pub track: String,
    pub song: SongInfo,
    pub tempo_map: TempoMap,
    pub notes: Vec<Note>,
    pub phrases: Vec<Phrase>,
    pub chords: Vec<Chord>,
    pub events: Vec<GlobalEvent>,
    pub diagnostics: Vec<Diagnostic>,
}

impl DecodedChart {
    pub fn tempo_changes(&self) -> &[TempoChange] {
        self.tempo_map.changes()
    }

    /// See [`TempoMap::ticks_to_milliseconds`].
    pub fn ticks_to_milliseconds(&self, ticks: &[u32]) -> Vec<f64> {
        self.tempo_map.ticks_to_milliseconds(ticks)
    }
}

/// Decoder state for one document and one target track.
pub struct Decoder {
    text: String,
    track: String,
    state: DecoderState,
    tokens: Tokenized,
    song: SongInfo,
    tempo_map: Option<TempoMap>,
    notes: Vec<Note>,
    phrases: Vec<Phrase>,
    events: Vec<GlobalEvent>,
    chords: Vec<Chord>,
    diagnostics: Vec<Diagnostic>,
}

impl Decoder {
    /// A decoder in the `Created` state; nothing is parsed yet.
    pub fn new(text: impl Into<String>, track: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            track: track.into(),
            state: DecoderState::Created,
            tokens: Tokenized::default(),
            song: SongInfo::default(),
            tempo_map: None,
            notes: Vec::new(),
            phrases: Vec::new(),
            events: Vec::new(),
            chords: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Create a decoder and tokenize the document.
    ///
    /// # Errors
    /// [`ChartError::TrackNotFound`] if `track` names no section of the document.
    pub fn load(text: &str, track: &str) -> Result<Self, ChartError> {
        let mut decoder = Self::new(text, track);
        decoder.tokenize()?;
        Ok(decoder)
    }

    /// Like [`Decoder::load`] with a typed track name.
    pub fn load_track(text: &str, track: TrackId) -> Result<Self, ChartError> {
        Self::load(text, &track.to_string())
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn track(&self) -> &str {
        &self.track
    }

    pub fn song(&self) -> &SongInfo {
        &self.song
    }

    /// Available once notes are timed.
    pub fn tempo_map(&self) -> Option<&TempoMap> {
        self.tempo_map.as_ref()
    }

    /// Notes produced by [`Decoder::extract_notes`], until [`Decoder::decode`] takes them.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Phrases produced by [`Decoder::extract_notes`], until [`Decoder::decode`] takes them.
    pub fn phrases(&self) -> &[Phrase] {
        &self.phrases
    }

    /// Chords produced by [`Decoder::aggregate_chords`], until [`Decoder::decode`] takes them.
    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Instrument track sections present in the document, in document order.
    pub fn track_names(&self) -> Vec<&str> {
        self.tokens
            .sections
            .iter()
            .map(|s| s.name.as_str())
            .filter(|name| TrackId::parse(name).is_some())
            .collect()
    }

    fn expect_state(
        &self,
        operation: &'static str,
        from: DecoderState,
    ) -> Result<(), ChartError> {
        if self.state == from {
            Ok(())
        } else {
            Err(ChartError::InvalidStateTransition {
                operation,
                state: self.state.as_str(),
            })
        }
    }

    fn advance(&mut self, to: DecoderState) {
        log::debug!("[{}] decoder {} -> {}", self.track, self.state, to);
        self.state = to;
    }

    /// Split the document into sections and read `[Song]`.
    pub fn tokenize(&mut self) -> Result<(), ChartError> {
        self.expect_state("tokenize", DecoderState::Created)?;

        let tokens = tokenize(&self.text);
        if tokens.section(&self.track).is_none() {
            return Err(ChartError::TrackNotFound {
                name: self.track.clone(),
            });
        }
        self.song = match tokens.section(SONG) {
            Some(section) => SongInfo::from_section(section)?,
            None => SongInfo::default(),
        };
        self.diagnostics.extend(tokens.diagnostics.iter().cloned());
        self.tokens = tokens;

        self.advance(DecoderState::Tokenized);
        Ok(())
    }

    /// Build the tempo map, then extract and time the track's notes, phrases and
    /// the global events.
    ///
    /// # Errors
    /// - [`ChartError::MissingResolution`]
    /// - [`ChartError::MissingSyncTrack`]
    /// - [`ChartError::MissingInitialTempo`]
    pub fn extract_notes(&mut self) -> Result<(), ChartError> {
        self.expect_state("extract notes", DecoderState::Tokenized)?;

        let resolution = self.song.require_resolution()?;
        let sync_track = self
            .tokens
            .section(SYNC_TRACK)
            .ok_or(ChartError::MissingSyncTrack)?;
        let tempo_map = TempoMap::build(sync_track, resolution, &mut self.diagnostics)?;

        let track = self.tokens.require(&self.track).map_err(|_| ChartError::TrackNotFound {
            name: self.track.clone(),
        })?;
        let extraction = extract(track, &tempo_map);
        self.diagnostics.extend(extraction.diagnostics);
        self.notes = extraction.notes;
        self.phrases = extraction.phrases;

        if let Some(section) = self.tokens.section(EVENTS) {
            self.events = global_events(section, &tempo_map, &mut self.diagnostics);
        }

        self.tempo_map = Some(tempo_map);
        self.advance(DecoderState::TimedNotesReady);
        Ok(())
    }

    /// Group the timed notes into chords.
    pub fn aggregate_chords(&mut self) -> Result<(), ChartError> {
        self.expect_state("aggregate chords", DecoderState::TimedNotesReady)?;
        self.chords = group_chords(&self.notes);
        self.advance(DecoderState::ChordsReady);
        Ok(())
    }

    /// Run the remaining stages once and hand over the results.
    ///
    /// The tempo map stays with the decoder so [`Decoder::ticks_to_milliseconds`]
    /// keeps working afterwards.
    pub fn decode(&mut self) -> Result<DecodedChart, ChartError> {
        if self.state == DecoderState::ChordsReady {
            return Err(ChartError::InvalidStateTransition {
                operation: "decode",
                state: self.state.as_str(),
            });
        }
        if self.state == DecoderState::Created {
            self.tokenize()?;
        }
        if self.state == DecoderState::Tokenized {
            self.extract_notes()?;
        }
        self.aggregate_chords()?;

        let tempo_map = self
            .tempo_map
            .clone()
            .ok_or(ChartError::MissingSyncTrack)?;
        Ok(DecodedChart {
            track: self.track.clone(),
            song: self.song.clone(),
            tempo_map,
            notes: std::mem::take(&mut self.notes),
            phrases: std::mem::take(&mut self.phrases),
            chords: std::mem::take(&mut self.chords),
            events: std::mem::take(&mut self.events),
            diagnostics: self.diagnostics.clone(),
        })
    }

    /// Convert ticks to milliseconds with this document's tempo map.
    ///
    /// Ascending lists take a single linear scan; out-of-order ticks are still
    /// converted correctly, one lookup each. See [`TempoMap::ticks_to_milliseconds`].
    ///
    /// # Errors
    /// [`ChartError::InvalidStateTransition`] before notes have been timed.
    pub fn ticks_to_milliseconds(&self, ticks: &[u32]) -> Result<Vec<f64>, ChartError> {
        match &self.tempo_map {
            Some(map) => Ok(map.ticks_to_milliseconds(ticks)),
            None => Err(ChartError::InvalidStateTransition {
                operation: "convert ticks",
                state: self.state.as_str(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART: &str = "[Song]\n{\n  Resolution = 192\n}\n[SyncTrack]\n{\n  0 = B 120000\n}\n[ExpertSingle]\n{\n  0 = N 0 0\n  0 = N 1 0\n  32 = N 2 0\n}\n[HardSingle]\n{\n  0 = N 0 0\n}\n";

    #[test]
    fn test_stepwise_lifecycle() {
        let mut decoder = Decoder::new(CHART, "ExpertSingle");
        assert_eq!(decoder.state(), DecoderState::Created);
        decoder.tokenize().unwrap();
        assert_eq!(decoder.state(), DecoderState::Tokenized);
        decoder.extract_notes().unwrap();
        assert_eq!(decoder.state(), DecoderState::TimedNotesReady);
        assert_eq!(decoder.notes().len(), 3);
        decoder.aggregate_chords().unwrap();
        assert_eq!(decoder.state(), DecoderState::ChordsReady);
        assert_eq!(decoder.chords().len(), 2);
    }

    #[test]
    fn test_out_of_order_stage_fails() {
        let mut decoder = Decoder::new(CHART, "ExpertSingle");
        assert_eq!(
            decoder.aggregate_chords(),
            Err(ChartError::InvalidStateTransition {
                operation: "aggregate chords",
                state: "created",
            })
        );
        decoder.tokenize().unwrap();
        assert!(matches!(
            decoder.tokenize(),
            Err(ChartError::InvalidStateTransition { operation: "tokenize", .. })
        ));
    }

    #[test]
    fn test_decode_twice_fails() {
        let mut decoder = Decoder::load(CHART, "ExpertSingle").unwrap();
        let chart = decoder.decode().unwrap();
        assert_eq!(chart.notes.len(), 3);
        assert_eq!(
            decoder.decode().unwrap_err(),
            ChartError::InvalidStateTransition {
                operation: "decode",
                state: "chords ready",
            }
        );
    }

    #[test]
    fn test_decode_from_created() {
        let mut decoder = Decoder::new(CHART, "HardSingle");
        let chart = decoder.decode().unwrap();
        assert_eq!(chart.track, "HardSingle");
        assert_eq!(chart.notes.len(), 1);
    }

    #[test]
    fn test_ticks_to_milliseconds_needs_tempo_map() {
        let mut decoder = Decoder::load(CHART, "ExpertSingle").unwrap();
        assert!(decoder.ticks_to_milliseconds(&[0]).is_err());
        decoder.decode().unwrap();
        assert_eq!(decoder.ticks_to_milliseconds(&[0, 96]).unwrap(), vec![0.0, 250.0]);
    }

    #[test]
    fn test_track_not_found() {
        assert_eq!(
            Decoder::load(CHART, "ExpertDrums").err(),
            Some(ChartError::TrackNotFound { name: "ExpertDrums".to_string() })
        );
    }

    #[test]
    fn test_track_names() {
        let decoder = Decoder::load(CHART, "ExpertSingle").unwrap();
        assert_eq!(decoder.track_names(), vec!["ExpertSingle", "HardSingle"]);
    }
}
