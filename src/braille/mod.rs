//! Braille transliteration module for converting dot-pattern tokens to text.
//!
//! This module provides the full path from a recognized token string to
//! readable text:
//!
//! 1. **Alphabet** - The fixed 26-letter pattern table
//! 2. **Cell parsing** - Validation of individual 6-bit tokens
//! 3. **Translation** - Token string to letters, fail-soft or strict
//!
//! # Modes
//!
//! Three translation entry points are available:
//! - [`translate`] - Fail-soft; malformed or unknown tokens become `'?'`
//! - [`translate_strict`] - One `Result` per token with typed errors
//! - [`translate_normalized`] - Whitespace-normalizing variant of [`translate`]

pub mod alphabet;
mod cell;
mod translate;

// Re-export all public items for convenience
pub use alphabet::{letter_for, pattern_for, LETTER_PATTERNS};
pub use cell::{Cell, CellError, BRAILLE_BASE, CELL_DOTS};
pub use translate::{translate, translate_normalized, translate_strict, TokenError, UNKNOWN};
