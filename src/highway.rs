//! Text rendering of a chord sequence, one line per chord.
//!
//! Handy for eyeballing a decoded chart in a terminal:
//!
//! ```text
//! ⬤.⬤...      strum chord
//! .⦿....      HOPO
//! ...◯..      tap
//! .....⬤      open note
//! ★.....      star power strum (✬ HOPO, ☆ tap)
//! ```

use crate::chords::Chord;

/// Buttons drawn per line, left to right: frets 0-4 and open (7).
pub const LANES: [u8; 6] = [0, 1, 2, 3, 4, 7];

fn symbol(chord: &Chord) -> char {
    match (chord.is_special, chord.is_tap, chord.is_hopo) {
        (true, true, _) => '☆',
        (true, false, true) => '✬',
        (true, false, false) => '★',
        (false, true, _) => '◯',
        (false, false, true) => '⦿',
        (false, false, false) => '⬤',
    }
}

/// Draw one line per chord.
pub fn render(chords: &[Chord]) -> String {
    let mut highway = String::new();
    for chord in chords {
        let mut line = ['.'; LANES.len()];
        let mark = symbol(chord);
        for button in chord.buttons() {
            if let Some(column) = LANES.iter().position(|&lane| lane == button) {
                line[column] = mark;
            }
        }
        highway.extend(line);
        highway.push('\n');
    }
    highway
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chords::group_chords;
    use crate::extract::Note;

    fn note(tick: u32, button: u8, is_hopo: bool, is_tap: bool, is_special: bool) -> Note {
        Note {
            tick,
            time_ms: 0.0,
            duration_ticks: 0,
            button,
            is_tap,
            is_hopo,
            is_special,
            phrase_index: None,
        }
    }

    #[test]
    fn test_render() {
        let chords = group_chords(&[
            note(0, 0, false, false, false),
            note(0, 2, false, false, false),
            note(10, 1, true, false, false),
            note(20, 3, true, true, false),
            note(30, 0, false, false, true),
            note(40, 4, true, false, true),
            note(50, 7, false, true, true),
        ]);
        assert_eq!(
            render(&chords),
            "⬤.⬤...\n.⦿....\n...◯..\n★.....\n....✬.\n.....☆\n"
        );
    }
}
