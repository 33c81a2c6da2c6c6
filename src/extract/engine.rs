//! Extraction engine
//!
//! Classifies an instrument track tick group by tick, then resolves the times of
//! every note and phrase against the tempo map.

use super::types::{Note, Phrase, TrackEvent};
use crate::error::{Diagnostic, DiagnosticKind};
use crate::tempo::TempoMap;
use crate::tokenizer::{Section, TickEvent};

/// Automatic HOPO threshold as a fraction of a beat: `65/192`.
pub const HOPO_THRESHOLD: (u64, u64) = (65, 192);

/// Notes and phrases of one track, both in ascending tick order.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub notes: Vec<Note>,
    pub phrases: Vec<Phrase>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Running state carried from one tick group to the next.
struct Classifier<'a> {
    section: &'a str,
    resolution: u32,
    previous_note_tick: Option<u32>,
    /// Highest tick classified so far.
    last_tick: Option<u32>,
    /// Index of the most recently opened phrase.
    current_phrase: Option<usize>,
    out: Extraction,
}

impl<'a> Classifier<'a> {
    fn new(section: &'a str, resolution: u32) -> Self {
        Self {
            section,
            resolution,
            previous_note_tick: None,
            last_tick: None,
            current_phrase: None,
            out: Extraction::default(),
        }
    }

    fn classify(mut self, tick: u32, group: &[TickEvent]) -> Self {
        match self.last_tick {
            Some(last) if tick < last => {
                if let Some(first) = group.first() {
                    self.out.diagnostics.push(Diagnostic::new(
                        self.section,
                        first.line,
                        DiagnosticKind::InvalidValue,
                        format!("tick {} precedes tick {}, {} events skipped", tick, last, group.len()),
                    ));
                }
                return self;
            }
            _ => self.last_tick = Some(tick),
        }

        let mut buttons: Vec<(u8, u32)> = Vec::new();
        let mut force_hopo = false;
        let mut tap = false;

        for event in group {
            match TrackEvent::parse(event, self.section, &mut self.out.diagnostics) {
                Some(TrackEvent::Note { button, duration }) => buttons.push((button, duration)),
                Some(TrackEvent::ForceHopo) => force_hopo = true,
                Some(TrackEvent::ForceTap) => tap = true,
                Some(TrackEvent::Phrase { phrase_type, duration }) => {
                    self.current_phrase = Some(self.out.phrases.len());
                    self.out.phrases.push(Phrase {
                        tick,
                        time_ms: 0.0,
                        duration_ticks: duration,
                        phrase_type,
                    });
                }
                None => {}
            }
        }

        if buttons.is_empty() {
            return self;
        }

        // Only the latest phrase counts, even if an earlier one still spans the tick.
        let phrase = self
            .current_phrase
            .and_then(|i| self.out.phrases.get(i).map(|p| (i, p)))
            .filter(|(_, p)| p.contains(tick));
        let phrase_index = phrase.map(|(i, _)| i);
        let is_special = phrase.map_or(false, |(_, p)| p.is_star_power());
        let is_hopo = self.auto_hopo(tick, buttons.len()) != force_hopo;

        log::trace!(
            "tick {}: {} notes, hopo={} tap={} special={}",
            tick,
            buttons.len(),
            is_hopo,
            tap,
            is_special
        );

        self.out.notes.extend(buttons.into_iter().map(|(button, duration)| Note {
            tick,
            time_ms: 0.0,
            duration_ticks: duration,
            button,
            is_tap: tap,
            is_hopo,
            is_special,
            phrase_index,
        }));
        self.previous_note_tick = Some(tick);
        self
    }

    /// A lone note closer than `65/192` of a beat to the previous note.
    fn auto_hopo(&self, tick: u32, note_count: usize) -> bool {
        let (num, den) = HOPO_THRESHOLD;
        match self.previous_note_tick {
            Some(previous) if note_count == 1 => tick
                .checked_sub(previous)
                .map_or(false, |gap| gap as u64 * den < num * self.resolution as u64),
            _ => false,
        }
    }
}

/// Extract the classified, timed notes and phrases of an instrument track.
///
/// Track ticks are expected in non-decreasing order, as written by chart editors.
/// A tick group below an earlier tick is skipped with an `InvalidValue` diagnostic.
pub fn extract(track: &Section, tempo_map: &TempoMap) -> Extraction {
    let classifier = track
        .tick_groups()
        .fold(Classifier::new(&track.name, tempo_map.resolution()), |c, (tick, group)| {
            c.classify(tick, group)
        });
    let mut out = classifier.out;

    let note_ticks: Vec<u32> = out.notes.iter().map(|n| n.tick).collect();
    for (note, ms) in out.notes.iter_mut().zip(tempo_map.ticks_to_milliseconds(&note_ticks)) {
        note.time_ms = ms;
    }

    let phrase_ticks: Vec<u32> = out.phrases.iter().map(|p| p.tick).collect();
    for (phrase, ms) in out.phrases.iter_mut().zip(tempo_map.ticks_to_milliseconds(&phrase_ticks)) {
        phrase.time_ms = ms;
    }

    log::debug!(
        "[{}]: extracted {} notes and {} phrases",
        track.name,
        out.notes.len(),
        out.phrases.len()
    );
    out
}
