//! `[Events]` pass-through.
//!
//! Global text events (`E "section Verse 1"`, `E "end"`, lyrics) are not
//! interpreted; they are returned with their text unquoted and their tick
//! resolved to milliseconds.

use crate::error::{Diagnostic, DiagnosticKind};
use crate::tempo::TempoMap;
use crate::tokenizer::Section;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalEvent {
    pub tick: u32,
    pub time_ms: f64,
    pub text: String,
}

impl GlobalEvent {
    /// Practice section name for `section <name>` events.
    pub fn section_name(&self) -> Option<&str> {
        self.text.strip_prefix("section ").map(str::trim)
    }
}

/// Time-resolve every `E` event of an `[Events]` section.
///
/// Events must be in tick order; one below an earlier event's tick is skipped.
pub fn global_events(
    section: &Section,
    tempo_map: &TempoMap,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<GlobalEvent> {
    let mut events: Vec<GlobalEvent> = Vec::new();
    for event in &section.events {
        if let Some(last) = events.last().filter(|last| event.tick < last.tick) {
            diagnostics.push(Diagnostic::new(
                &section.name,
                event.line,
                DiagnosticKind::InvalidValue,
                format!("event at tick {} precedes tick {}", event.tick, last.tick),
            ));
            continue;
        }
        if event.kind() != "E" {
            diagnostics.push(Diagnostic::new(
                &section.name,
                event.line,
                DiagnosticKind::UnrecognizedEventType,
                format!("unsupported global event '{}'", event.text),
            ));
            continue;
        }
        let text = event.operand_text();
        let text = text
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(text);
        events.push(GlobalEvent {
            tick: event.tick,
            time_ms: 0.0,
            text: text.to_string(),
        });
    }

    let ticks: Vec<u32> = events.iter().map(|e| e.tick).collect();
    for (event, ms) in events.iter_mut().zip(tempo_map.ticks_to_milliseconds(&ticks)) {
        event.time_ms = ms;
    }
    events
}
