//! Note and phrase type definitions

use crate::error::{Diagnostic, DiagnosticKind};
use crate::tokenizer::TickEvent;
use serde::Serialize;

/// `N 5 0`: invert the automatic HOPO decision for the tick.
pub const FORCE_HOPO_LANE: u8 = 5;
/// `N 6 0`: every note at the tick is a tap note.
pub const TAP_LANE: u8 = 6;
/// Phrase type marking star power.
pub const STAR_POWER: u8 = 2;

/// A playable note.
///
/// # Fields
/// - `button`: 0 green, 1 red, 2 yellow, 3 blue, 4 orange, 7 open
/// - `duration_ticks`: sustain length (0 if not held)
/// - `is_special`: inside the latest phrase, which is star power
/// - `phrase_index`: ordinal of the latest phrase if it still covers the note, else `None`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub tick: u32,
    pub time_ms: f64,
    pub duration_ticks: u32,
    pub button: u8,
    pub is_tap: bool,
    pub is_hopo: bool,
    pub is_special: bool,
    pub phrase_index: Option<usize>,
}

/// A phrase covering the half-open tick interval `[tick, tick + duration_ticks)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Phrase {
    pub tick: u32,
    pub time_ms: f64,
    pub duration_ticks: u32,
    #[serde(rename = "type")]
    pub phrase_type: u8,
}

impl Phrase {
    pub fn end_tick(&self) -> u64 {
        self.tick as u64 + self.duration_ticks as u64
    }

    pub fn contains(&self, tick: u32) -> bool {
        self.tick <= tick && (tick as u64) < self.end_tick()
    }

    pub fn is_star_power(&self) -> bool {
        self.phrase_type == STAR_POWER
    }
}

/// One parsed line of an instrument track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEvent {
    Note { button: u8, duration: u32 },
    ForceHopo,
    ForceTap,
    Phrase { phrase_type: u8, duration: u32 },
}

impl TrackEvent {
    /// Parse a track line, recording a diagnostic for anything unusable.
    pub fn parse(event: &TickEvent, section: &str, diagnostics: &mut Vec<Diagnostic>) -> Option<Self> {
        let kind = event.kind();
        if kind != "N" && kind != "S" {
            diagnostics.push(Diagnostic::new(
                section,
                event.line,
                DiagnosticKind::UnrecognizedEventType,
                format!("unsupported track event '{}'", event.text),
            ));
            return None;
        }

        let mut operands = event.operands();
        let value = operands.next().and_then(|v| v.parse::<u8>().ok());
        let duration = operands.next().and_then(|d| d.parse::<u32>().ok());
        let (Some(value), Some(duration)) = (value, duration) else {
            diagnostics.push(Diagnostic::new(
                section,
                event.line,
                DiagnosticKind::InvalidValue,
                format!("expected '{} <value> <duration>', found '{}'", kind, event.text),
            ));
            return None;
        };

        Some(match (kind, value) {
            ("N", FORCE_HOPO_LANE) => TrackEvent::ForceHopo,
            ("N", TAP_LANE) => TrackEvent::ForceTap,
            ("N", button) => TrackEvent::Note { button, duration },
            (_, phrase_type) => TrackEvent::Phrase { phrase_type, duration },
        })
    }
}
