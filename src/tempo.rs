//! # Tempo Map
//!
//! Builds the tempo map from `[SyncTrack]` and converts ticks to absolute
//! milliseconds.
//!
//! ## SyncTrack Events
//! - `B <bpm×1000>` - tempo change, e.g. `B 120000` is 120 BPM
//! - `TS <numerator> [<denominator exponent>]` - time signature, e.g. `TS 6 3` is 6/8
//! - `A <microseconds>` - audio anchor, accepted and ignored
//!
//! ## Conversion
//! Between two tempo changes time advances linearly:
//!
//! ```text
//! ms = Δticks / resolution / bpm * 60000
//!    = Δticks * 60_000_000 / (resolution * milli_bpm)
//! ```
//!
//! The second form is what is evaluated. Tempo values stay in the integer
//! BPM×1000 unit they are written in, so whole-millisecond results come out exact.
//!
//! [`TempoMap::ticks_to_milliseconds`] converts a whole ascending tick list with a
//! single co-scan of the query ticks and the tempo changes; ticks that arrive out
//! of order are looked up individually.
//! [`TempoMap::tick_to_ms`] converts one tick by binary search over the cached
//! start time of every tempo segment. Both produce identical values.
//!
//! ## Example
//! ```rust
//! use chartread::tokenizer::tokenize;
//! use chartread::TempoMap;
//!
//! let tokens = tokenize("[SyncTrack]\n{\n  0 = B 120000\n  192 = B 60000\n}\n");
//! let sync = tokens.require("SyncTrack").unwrap();
//! let map = TempoMap::build(sync, 192, &mut Vec::new()).unwrap();
//!
//! assert_eq!(map.ticks_to_milliseconds(&[0, 96, 192, 384]), vec![0.0, 250.0, 500.0, 1500.0]);
//! ```

use crate::error::{ChartError, Diagnostic, DiagnosticKind};
use crate::tokenizer::{Section, TickEvent};
use serde::Serialize;

const MS_PER_MINUTE_MILLI: f64 = 60_000_000.0;

/// A tempo change at a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TempoChange {
    pub tick: u32,
    /// Beats per minute × 1000, as written in the chart.
    pub milli_bpm: u32,
}

impl TempoChange {
    pub fn bpm(&self) -> f64 {
        self.milli_bpm as f64 / 1000.0
    }
}

/// A time signature change at a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSignature {
    pub tick: u32,
    pub numerator: u32,
    pub denominator: u32,
}

/// Ascending tempo changes for one chart, starting at tick 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TempoMap {
    resolution: u32,
    changes: Vec<TempoChange>,
    time_signatures: Vec<TimeSignature>,
    /// Start time of each tempo segment, parallel to `changes`.
    #[serde(skip)]
    segment_start_ms: Vec<f64>,
}

impl TempoMap {
    /// Build the tempo map from a `[SyncTrack]` section.
    ///
    /// Unusable lines are skipped and reported through `diagnostics`.
    ///
    /// # Errors
    /// - [`ChartError::MissingResolution`] if `resolution` is 0
    /// - [`ChartError::MissingSyncTrack`] if the section declares no tempo
    /// - [`ChartError::MissingInitialTempo`] if no tempo is declared at tick 0
    pub fn build(
        sync_track: &Section,
        resolution: u32,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Self, ChartError> {
        if resolution == 0 {
            return Err(ChartError::MissingResolution);
        }

        let mut changes: Vec<TempoChange> = Vec::new();
        let mut time_signatures: Vec<TimeSignature> = Vec::new();

        for event in &sync_track.events {
            match event.kind() {
                "B" => {
                    let Some(milli_bpm) = parse_tempo(event, &sync_track.name, diagnostics) else {
                        continue;
                    };
                    match changes.last_mut() {
                        // Duplicate tick: last one wins.
                        Some(last) if last.tick == event.tick => last.milli_bpm = milli_bpm,
                        Some(last) if last.tick > event.tick => {
                            diagnostics.push(Diagnostic::new(
                                &sync_track.name,
                                event.line,
                                DiagnosticKind::InvalidValue,
                                format!(
                                    "tempo change at tick {} precedes tick {}",
                                    event.tick, last.tick
                                ),
                            ));
                        }
                        _ => changes.push(TempoChange {
                            tick: event.tick,
                            milli_bpm,
                        }),
                    }
                }
                "TS" => {
                    if let Some(ts) = parse_time_signature(event, &sync_track.name, diagnostics) {
                        match time_signatures.last_mut() {
                            Some(last) if last.tick == ts.tick => *last = ts,
                            _ => time_signatures.push(ts),
                        }
                    }
                }
                "A" => {}
                other => {
                    diagnostics.push(Diagnostic::new(
                        &sync_track.name,
                        event.line,
                        DiagnosticKind::UnrecognizedEventType,
                        format!("unsupported SyncTrack event type '{}'", other),
                    ));
                }
            }
        }

        let first = changes.first().ok_or(ChartError::MissingSyncTrack)?;
        if first.tick != 0 {
            return Err(ChartError::MissingInitialTempo {
                first_tick: first.tick,
            });
        }

        let mut segment_start_ms = Vec::with_capacity(changes.len());
        let mut elapsed = 0.0;
        let mut previous = changes[0];
        for change in &changes {
            elapsed += segment_ms(change.tick - previous.tick, resolution, previous.milli_bpm);
            segment_start_ms.push(elapsed);
            previous = *change;
        }

        log::debug!(
            "tempo map: {} tempo changes, {} time signatures, resolution {}",
            changes.len(),
            time_signatures.len(),
            resolution
        );

        Ok(Self {
            resolution,
            changes,
            time_signatures,
            segment_start_ms,
        })
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Tempo changes in ascending tick order; the first is at tick 0.
    pub fn changes(&self) -> &[TempoChange] {
        &self.changes
    }

    pub fn time_signatures(&self) -> &[TimeSignature] {
        &self.time_signatures
    }

    /// Convert a list of ticks to milliseconds.
    ///
    /// Walks the query ticks and the tempo changes together once, so a
    /// non-decreasing list gives a non-decreasing output in linear time. A tick
    /// below the segment the scan has reached is looked up with
    /// [`TempoMap::tick_to_ms`] instead.
    pub fn ticks_to_milliseconds(&self, ticks: &[u32]) -> Vec<f64> {
        let mut times = Vec::with_capacity(ticks.len());
        let mut pending = ticks.iter().copied().peekable();

        let mut current_tick = 0;
        let mut current_ms = 0.0;
        let mut tempo = self.changes[0].milli_bpm;

        let time_at = |tick: u32, current_tick: u32, current_ms: f64, tempo: u32| {
            match tick.checked_sub(current_tick) {
                Some(delta) => current_ms + segment_ms(delta, self.resolution, tempo),
                None => self.tick_to_ms(tick),
            }
        };

        for change in &self.changes {
            while let Some(tick) = pending.next_if(|&t| t <= change.tick) {
                times.push(time_at(tick, current_tick, current_ms, tempo));
            }
            current_ms += segment_ms(change.tick - current_tick, self.resolution, tempo);
            current_tick = change.tick;
            tempo = change.milli_bpm;
        }

        for tick in pending {
            times.push(time_at(tick, current_tick, current_ms, tempo));
        }

        times
    }

    /// Convert a single tick to milliseconds, in any order.
    pub fn tick_to_ms(&self, tick: u32) -> f64 {
        let index = self.segment_for_tick(tick);
        let change = &self.changes[index];
        self.segment_start_ms[index] + segment_ms(tick - change.tick, self.resolution, change.milli_bpm)
    }

    /// Convert milliseconds back to a (fractional) tick.
    ///
    /// Times before 0 extrapolate with the initial tempo and give negative ticks.
    pub fn ms_to_tick(&self, ms: f64) -> f64 {
        let index = self
            .segment_start_ms
            .partition_point(|&start| start <= ms)
            .saturating_sub(1);
        let change = &self.changes[index];
        let elapsed = ms - self.segment_start_ms[index];
        change.tick as f64
            + elapsed * self.resolution as f64 * change.milli_bpm as f64 / MS_PER_MINUTE_MILLI
    }

    /// The tempo in effect at `tick`.
    pub fn tempo_at(&self, tick: u32) -> &TempoChange {
        &self.changes[self.segment_for_tick(tick)]
    }

    /// The time signature in effect at `tick` (4/4 before the first one).
    pub fn time_signature_at(&self, tick: u32) -> TimeSignature {
        let index = self.time_signatures.partition_point(|ts| ts.tick <= tick);
        match index.checked_sub(1) {
            Some(i) => self.time_signatures[i],
            None => TimeSignature {
                tick: 0,
                numerator: 4,
                denominator: 4,
            },
        }
    }

    fn segment_for_tick(&self, tick: u32) -> usize {
        // changes[0] is at tick 0, so the partition point is at least 1.
        self.changes
            .partition_point(|c| c.tick <= tick)
            .saturating_sub(1)
    }
}

fn segment_ms(delta_ticks: u32, resolution: u32, milli_bpm: u32) -> f64 {
    delta_ticks as f64 * MS_PER_MINUTE_MILLI / (resolution as f64 * milli_bpm as f64)
}

fn parse_tempo(event: &TickEvent, section: &str, diagnostics: &mut Vec<Diagnostic>) -> Option<u32> {
    match event.operands().next().map(str::parse::<u32>) {
        Some(Ok(milli_bpm)) if milli_bpm > 0 => Some(milli_bpm),
        _ => {
            diagnostics.push(Diagnostic::new(
                section,
                event.line,
                DiagnosticKind::InvalidValue,
                format!("invalid tempo '{}'", event.text),
            ));
            None
        }
    }
}

fn parse_time_signature(
    event: &TickEvent,
    section: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<TimeSignature> {
    let mut operands = event.operands().map(str::parse::<u32>);
    let numerator = operands.next();
    let exponent = operands.next().unwrap_or(Ok(2));

    match (numerator, exponent) {
        (Some(Ok(numerator)), Ok(exponent)) if numerator > 0 && exponent < 32 => Some(TimeSignature {
            tick: event.tick,
            numerator,
            denominator: 1 << exponent,
        }),
        _ => {
            diagnostics.push(Diagnostic::new(
                section,
                event.line,
                DiagnosticKind::InvalidValue,
                format!("invalid time signature '{}'", event.text),
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn build(body: &str, resolution: u32) -> Result<(TempoMap, Vec<Diagnostic>), ChartError> {
        let text = format!("[SyncTrack]\n{{\n{}\n}}\n", body);
        let tokens = tokenize(&text);
        let mut diagnostics = Vec::new();
        let map = TempoMap::build(tokens.require("SyncTrack")?, resolution, &mut diagnostics)?;
        Ok((map, diagnostics))
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{:?} vs {:?}", actual, expected);
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{:?} vs {:?}", actual, expected);
        }
    }

    #[test]
    fn test_half_beat_at_120_bpm() {
        let (map, _) = build("  0 = B 120000", 192).unwrap();
        assert_eq!(map.ticks_to_milliseconds(&[96]), vec![250.0]);
    }

    #[test]
    fn test_tempo_change_points_match_manual_sum() {
        // 120 BPM for 2 beats, 90 BPM for 3 beats, 200 BPM after.
        let (map, _) = build("  0 = B 120000\n  384 = B 90000\n  960 = B 200000", 192).unwrap();
        let at_changes: Vec<u32> = map.changes().iter().map(|c| c.tick).collect();
        let manual = [0.0, 2.0 * 500.0, 2.0 * 500.0 + 3.0 * (60000.0 / 90.0)];
        assert_close(&map.ticks_to_milliseconds(&at_changes), &manual);
        assert_close(&map.ticks_to_milliseconds(&[1152]), &[manual[2] + 300.0]);
    }

    #[test]
    fn test_queries_straddling_changes() {
        let (map, _) = build("  0 = B 120000\n  192 = B 60000", 192).unwrap();
        assert_close(
            &map.ticks_to_milliseconds(&[0, 0, 96, 191, 192, 288, 384]),
            &[0.0, 0.0, 250.0, 500.0 - 500.0 / 192.0, 500.0, 1000.0, 1500.0],
        );
    }

    #[test]
    fn test_output_is_monotonic() {
        let (map, _) = build("  0 = B 95500\n  100 = B 240000\n  350 = B 61234\n  351 = B 300000", 480).unwrap();
        let ticks: Vec<u32> = (0..2000).step_by(7).collect();
        let times = map.ticks_to_milliseconds(&ticks);
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_single_lookup_matches_scan() {
        let (map, _) = build("  0 = B 95500\n  100 = B 240000\n  350 = B 61234", 480).unwrap();
        let ticks = [0, 50, 100, 101, 349, 350, 351, 5000];
        let scanned = map.ticks_to_milliseconds(&ticks);
        for (tick, ms) in ticks.iter().zip(&scanned) {
            assert_eq!(map.tick_to_ms(*tick), *ms);
        }
    }

    #[test]
    fn test_unsorted_ticks_fall_back_to_lookup() {
        let (map, _) = build("  0 = B 120000\n  3 = B 60000", 192).unwrap();
        let ticks = [0, 5, 0, 200, 2, 96];
        let times = map.ticks_to_milliseconds(&ticks);
        let expected: Vec<f64> = ticks.iter().map(|&t| map.tick_to_ms(t)).collect();
        assert_eq!(times, expected);
        assert_eq!(times[2], 0.0);
    }

    #[test]
    fn test_ms_to_tick_inverts() {
        let (map, _) = build("  0 = B 120000\n  192 = B 60000", 192).unwrap();
        assert!((map.ms_to_tick(250.0) - 96.0).abs() < 1e-9);
        assert!((map.ms_to_tick(1000.0) - 288.0).abs() < 1e-9);
        assert!((map.ms_to_tick(-250.0) + 96.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_tick_last_wins() {
        let (map, _) = build("  0 = B 60000\n  0 = B 120000", 192).unwrap();
        assert_eq!(map.changes(), &[TempoChange { tick: 0, milli_bpm: 120000 }]);
        assert_eq!(map.tempo_at(500).bpm(), 120.0);
    }

    #[test]
    fn test_missing_tempo() {
        assert_eq!(build("  0 = TS 4", 192).unwrap_err(), ChartError::MissingSyncTrack);
    }

    #[test]
    fn test_no_tempo_at_zero() {
        assert_eq!(
            build("  768 = B 120000", 192).unwrap_err(),
            ChartError::MissingInitialTempo { first_tick: 768 }
        );
    }

    #[test]
    fn test_zero_resolution() {
        assert_eq!(build("  0 = B 120000", 0).unwrap_err(), ChartError::MissingResolution);
    }

    #[test]
    fn test_invalid_tempo_skipped() {
        let (map, diagnostics) = build("  0 = B 120000\n  96 = B 0\n  100 = B fast", 192).unwrap();
        assert_eq!(map.changes().len(), 1);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d.kind == DiagnosticKind::InvalidValue));
    }

    #[test]
    fn test_time_signatures() {
        let (map, diagnostics) = build("  0 = TS 4\n  0 = B 120000\n  0 = A 0\n  768 = TS 6 3", 192).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(map.time_signature_at(0).denominator, 4);
        let six_eight = map.time_signature_at(800);
        assert_eq!((six_eight.numerator, six_eight.denominator), (6, 8));
    }

    #[test]
    fn test_unknown_sync_event() {
        let (_, diagnostics) = build("  0 = B 120000\n  0 = X 1", 192).unwrap();
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnrecognizedEventType);
    }
}
