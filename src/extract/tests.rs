use super::*;
use crate::error::DiagnosticKind;
use crate::tempo::TempoMap;
use crate::tokenizer::tokenize;

fn run(resolution: u32, track: &str) -> Extraction {
    let source = format!(
        "[SyncTrack]\n{{\n  0 = B 120000\n}}\n[ExpertSingle]\n{{\n{}\n}}\n",
        track
    );
    let tokens = tokenize(&source);
    let map = TempoMap::build(tokens.require("SyncTrack").unwrap(), resolution, &mut Vec::new()).unwrap();
    extract(tokens.require("ExpertSingle").unwrap(), &map)
}

#[test]
fn test_half_beat_gap_is_not_hopo() {
    let result = run(192, "  0 = N 0 0\n  96 = N 1 0");
    assert_eq!(result.notes.len(), 2);
    assert_eq!(result.notes[1].time_ms, 250.0);
    assert!(!result.notes[0].is_hopo);
    assert!(!result.notes[1].is_hopo);
}

#[test]
fn test_short_gap_is_hopo() {
    let result = run(192, "  0 = N 0 0\n  32 = N 1 0");
    assert!(!result.notes[0].is_hopo);
    assert!(result.notes[1].is_hopo);
}

#[test]
fn test_hopo_threshold_boundary() {
    // 65/192 of a beat at resolution 192 is exactly 65 ticks.
    let just_under = run(192, "  0 = N 0 0\n  64 = N 1 0");
    assert!(just_under.notes[1].is_hopo);
    let at = run(192, "  0 = N 0 0\n  65 = N 1 0");
    assert!(!at.notes[1].is_hopo);

    // At resolution 480 the threshold is 162.5 ticks.
    let under = run(480, "  0 = N 0 0\n  162 = N 1 0");
    assert!(under.notes[1].is_hopo);
    let over = run(480, "  0 = N 0 0\n  163 = N 1 0");
    assert!(!over.notes[1].is_hopo);
}

#[test]
fn test_first_note_is_never_auto_hopo() {
    let result = run(192, "  10 = N 0 0");
    assert!(!result.notes[0].is_hopo);
}

#[test]
fn test_force_modifier_inverts() {
    // Would be HOPO, forced to strum.
    let forced_off = run(192, "  0 = N 0 0\n  32 = N 1 0\n  32 = N 5 0");
    assert_eq!(forced_off.notes.len(), 2);
    assert!(!forced_off.notes[1].is_hopo);

    // Would be strum, forced to HOPO.
    let forced_on = run(192, "  0 = N 0 0\n  192 = N 5 0\n  192 = N 1 0");
    assert!(forced_on.notes[1].is_hopo);
}

#[test]
fn test_chord_is_not_auto_hopo_and_modifiers_cover_all_notes() {
    let result = run(192, "  0 = N 0 0\n  16 = N 1 0\n  16 = N 2 0\n  16 = N 6 0");
    let chord: Vec<_> = result.notes.iter().filter(|n| n.tick == 16).collect();
    assert_eq!(chord.len(), 2);
    assert!(chord.iter().all(|n| !n.is_hopo && n.is_tap));
    assert!(!result.notes[0].is_tap);
}

#[test]
fn test_modifiers_do_not_leak_to_next_tick() {
    let result = run(192, "  0 = N 0 0\n  0 = N 6 0\n  500 = N 1 0");
    assert!(result.notes[0].is_tap);
    assert!(!result.notes[1].is_tap);
}

#[test]
fn test_previous_note_is_per_tick() {
    // A chord followed closely by a single note: the gap counts from the chord tick.
    let result = run(192, "  0 = N 0 0\n  0 = N 1 0\n  40 = N 2 0");
    assert!(!result.notes[0].is_hopo);
    assert!(result.notes[2].is_hopo);
}

#[test]
fn test_star_power_membership() {
    let result = run(192, "  0 = S 2 192\n  100 = N 0 0\n  200 = N 1 0");
    assert_eq!(result.phrases.len(), 1);
    assert!(result.notes[0].is_special);
    assert_eq!(result.notes[0].phrase_index, Some(0));
    assert!(!result.notes[1].is_special);
    assert_eq!(result.notes[1].phrase_index, None);
}

#[test]
fn test_phrase_end_is_exclusive() {
    let result = run(192, "  0 = S 2 192\n  191 = N 0 0\n  192 = N 1 0");
    assert!(result.notes[0].is_special);
    assert!(!result.notes[1].is_special);
}

#[test]
fn test_note_on_phrase_start_tick_listed_first() {
    let result = run(192, "  768 = N 0 0\n  768 = S 2 96\n  800 = N 1 0");
    assert!(result.notes[0].is_special);
    assert_eq!(result.notes[0].phrase_index, Some(0));
    assert!(result.notes[1].is_special);
}

#[test]
fn test_non_star_power_phrase() {
    let result = run(192, "  0 = S 0 192\n  96 = N 0 0");
    assert!(!result.notes[0].is_special);
    assert_eq!(result.notes[0].phrase_index, Some(0));
}

#[test]
fn test_phrase_ordinals_and_times() {
    let result = run(192, "  0 = S 2 96\n  10 = N 0 0\n  384 = S 2 96\n  400 = N 0 0");
    assert_eq!(result.notes[0].phrase_index, Some(0));
    assert_eq!(result.notes[1].phrase_index, Some(1));
    assert_eq!(result.phrases[1].time_ms, 1000.0);
    assert_eq!(result.phrases[1].phrase_type, STAR_POWER);
}

#[test]
fn test_sustain_and_open_note() {
    let result = run(192, "  0 = N 7 384");
    assert_eq!(result.notes[0].button, 7);
    assert_eq!(result.notes[0].duration_ticks, 384);
}

#[test]
fn test_last_tick_group_flushed() {
    let result = run(192, "  0 = N 0 0\n  1000 = N 1 0\n  1000 = N 2 0");
    assert_eq!(result.notes.len(), 3);
    assert_eq!(result.notes[2].tick, 1000);
}

#[test]
fn test_unrecognized_events_skipped() {
    let result = run(192, "  0 = E solo\n  0 = N 0 0\n  10 = N x 0\n  20 = E soloend");
    assert_eq!(result.notes.len(), 1);
    let kinds: Vec<_> = result.diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::UnrecognizedEventType,
            DiagnosticKind::InvalidValue,
            DiagnosticKind::UnrecognizedEventType,
        ]
    );
}

#[test]
fn test_output_ticks_ascending() {
    let result = run(192, "  0 = N 0 0\n  0 = S 2 1000\n  5 = N 3 0\n  5 = N 1 0\n  90 = N 2 0\n  600 = S 2 10\n  700 = N 0 0");
    assert!(result.notes.windows(2).all(|w| w[0].tick <= w[1].tick));
    assert!(result.notes.windows(2).all(|w| w[0].time_ms <= w[1].time_ms));
    assert!(result.phrases.windows(2).all(|w| w[0].tick <= w[1].tick));
}

#[test]
fn test_overlapping_phrase_only_latest_counts() {
    // A short face-off phrase inside star power: after it ends the note is in no phrase.
    let ended = run(192, "  0 = S 2 192\n  50 = S 0 10\n  100 = N 0 0");
    assert_eq!(ended.notes[0].phrase_index, None);
    assert!(!ended.notes[0].is_special);

    // While the inner phrase covers the note, its type decides star power.
    let inner = run(192, "  0 = S 2 192\n  90 = S 0 60\n  100 = N 0 0");
    assert_eq!(inner.notes[0].phrase_index, Some(1));
    assert!(!inner.notes[0].is_special);

    let nested_star = run(192, "  0 = S 0 192\n  90 = S 2 60\n  100 = N 0 0\n  160 = N 1 0");
    assert_eq!(nested_star.notes[0].phrase_index, Some(1));
    assert!(nested_star.notes[0].is_special);
    assert_eq!(nested_star.notes[1].phrase_index, None);
    assert!(!nested_star.notes[1].is_special);
}

#[test]
fn test_out_of_order_tick_group_skipped() {
    let result = run(192, "  0 = N 0 0\n  5 = N 1 0\n  0 = N 2 0\n  0 = N 3 0\n  96 = N 4 0");
    let ticks: Vec<u32> = result.notes.iter().map(|n| n.tick).collect();
    assert_eq!(ticks, vec![0, 5, 96]);
    assert_eq!(result.notes[2].time_ms, 250.0);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].kind, DiagnosticKind::InvalidValue);
}
