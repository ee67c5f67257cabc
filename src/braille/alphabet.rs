//! The letter alphabet: dot-pattern tokens for `a`-`z`.

use std::collections::HashMap;
use std::sync::OnceLock;

/// The 26 letter patterns, ordered `a`-`z`.
///
/// Each pattern is a 6-character string of '0'/'1' flags, one per dot
/// position of a 2x3 cell read row by row (left-to-right, top-to-bottom).
/// In standard dot numbering that is the order 1, 4, 2, 5, 3, 6, so `a`
/// (dot 1 only) is `"100000"` and `t` (dots 2, 3, 4, 5) is `"011110"`.
#[rustfmt::skip]
pub const LETTER_PATTERNS: &[(&str, char)] = &[
    ("100000", 'a'), ("101000", 'b'), ("110000", 'c'), ("110100", 'd'),
    ("100100", 'e'), ("111000", 'f'), ("111100", 'g'), ("101100", 'h'),
    ("011000", 'i'), ("011100", 'j'), ("100010", 'k'), ("101010", 'l'),
    ("110010", 'm'), ("110110", 'n'), ("100110", 'o'), ("111010", 'p'),
    ("111110", 'q'), ("101110", 'r'), ("011010", 's'), ("011110", 't'),
    ("100011", 'u'), ("101011", 'v'), ("011101", 'w'), ("110011", 'x'),
    ("110111", 'y'), ("100111", 'z'),
];

/// Lookup map built from [`LETTER_PATTERNS`] on first use, read-only after.
fn pattern_map() -> &'static HashMap<&'static str, char> {
    static MAP: OnceLock<HashMap<&'static str, char>> = OnceLock::new();
    MAP.get_or_init(|| LETTER_PATTERNS.iter().copied().collect())
}

/// Look up the letter for a dot-pattern token.
///
/// Returns `None` for anything that is not exactly one of the 26 letter
/// patterns: wrong length, characters other than '0'/'1', the all-flat
/// pattern `"000000"`, or an empty token.
pub fn letter_for(token: &str) -> Option<char> {
    pattern_map().get(token).copied()
}

/// Look up the dot pattern for a letter.
///
/// The inverse of [`letter_for`]; returns `None` for anything outside
/// lowercase `a`-`z`.
pub fn pattern_for(letter: char) -> Option<&'static str> {
    LETTER_PATTERNS
        .iter()
        .find(|(_, l)| *l == letter)
        .map(|(pattern, _)| *pattern)
}
