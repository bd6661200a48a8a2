//! Text-to-waypoint mapping: the thin glue between input text and the
//! nozzle path.
//!
//! Letters A-Z live in a fixed 6x5 grid (Z wraps to the bottom-right
//! cell); each letter of a word becomes a waypoint at its cell center.
//! Words become [`WordPath`]s; everything that is not an ASCII letter is
//! dropped.

/// Grid columns.
const COLS: usize = 6;
/// Grid rows.
const ROWS: usize = 5;
/// Margin around the grid as a fraction of each dimension.
const MARGIN: f64 = 0.1;

/// One word mapped to its per-letter waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct WordPath {
    pub word: String,
    pub waypoints: Vec<(char, f64, f64)>,
}

/// Cell index for an uppercase letter. Z sits apart from the alphabet run
/// in the bottom-right corner of the grid.
fn zone_index(letter: char) -> usize {
    match letter {
        'Z' => COLS * ROWS - 1,
        _ => (letter as u8 - b'A') as usize,
    }
}

/// Center of a letter's cell on a surface of the given size.
pub fn letter_center(letter: char, width: usize, height: usize) -> (f64, f64) {
    let index = zone_index(letter);
    let col = index % COLS;
    let row = index / COLS;
    let inner_w = width as f64 * (1.0 - 2.0 * MARGIN);
    let inner_h = height as f64 * (1.0 - 2.0 * MARGIN);
    let cell_w = inner_w / COLS as f64;
    let cell_h = inner_h / ROWS as f64;
    (
        width as f64 * MARGIN + col as f64 * cell_w + cell_w * 0.5,
        height as f64 * MARGIN + row as f64 * cell_h + cell_h * 0.5,
    )
}

/// Splits input text into words and maps each letter to its waypoint.
///
/// Non-letter characters are stripped; words left empty afterwards are
/// skipped.
pub fn word_paths(text: &str, width: usize, height: usize) -> Vec<WordPath> {
    text.split_whitespace()
        .filter_map(|raw| {
            let letters: Vec<char> = raw
                .chars()
                .filter(char::is_ascii_alphabetic)
                .map(|c| c.to_ascii_uppercase())
                .collect();
            if letters.is_empty() {
                return None;
            }
            let waypoints = letters
                .iter()
                .map(|&c| {
                    let (x, y) = letter_center(c, width, height);
                    (c, x, y)
                })
                .collect();
            Some(WordPath {
                word: letters.iter().collect(),
                waypoints,
            })
        })
        .collect()
}
