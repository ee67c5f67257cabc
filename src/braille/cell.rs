//! Single-cell token parsing and display.
//!
//! A cell token is a 6-character string of '0'/'1' flags, one per dot of a
//! 2x3 grid read row by row. [`Cell::parse`] enforces that shape and keeps
//! the error cases distinguishable, which the fail-soft translation path
//! deliberately is not.

use thiserror::Error;

/// Number of dot positions in a cell.
pub const CELL_DOTS: usize = 6;

/// Braille base character (U+2800, empty braille pattern).
pub const BRAILLE_BASE: char = '\u{2800}';

/// Unicode dot bit for each token position.
///
/// Token positions are row-major (dots 1, 4, 2, 5, 3, 6); the Unicode
/// braille block assigns bit `1 << (dot - 1)` to each dot.
const DOT_BITS: [u32; CELL_DOTS] = [0x01, 0x08, 0x02, 0x10, 0x04, 0x20];

/// A validated cell: the raised/flat state of the six dot positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    dots: [bool; CELL_DOTS],
}

/// Ways a token can fail to be a well-formed cell.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellError {
    #[error("empty token")]
    Empty,

    #[error("token has {len} characters, expected 6")]
    WrongLength {
        /// Character count of the offending token
        len: usize,
    },

    #[error("invalid flag '{found}' at position {position}, expected '0' or '1'")]
    InvalidFlag {
        /// Zero-based character position within the token
        position: usize,
        /// The offending character
        found: char,
    },
}

impl Cell {
    /// Parse a token into a validated cell.
    ///
    /// # Errors
    ///
    /// Returns `CellError::Empty` for an empty token,
    /// `CellError::WrongLength` when the character count is not 6, and
    /// `CellError::InvalidFlag` for the first character outside '0'/'1'.
    pub fn parse(token: &str) -> Result<Self, CellError> {
        if token.is_empty() {
            return Err(CellError::Empty);
        }

        let len = token.chars().count();
        if len != CELL_DOTS {
            return Err(CellError::WrongLength { len });
        }

        let mut dots = [false; CELL_DOTS];
        for (position, flag) in token.chars().enumerate() {
            match flag {
                '0' => dots[position] = false,
                '1' => dots[position] = true,
                found => return Err(CellError::InvalidFlag { position, found }),
            }
        }

        Ok(Self { dots })
    }

    /// Whether the dot at the given token position (0-5) is raised.
    pub fn dot(&self, position: usize) -> bool {
        self.dots[position]
    }

    /// The token form of this cell.
    pub fn pattern(&self) -> String {
        self.dots
            .iter()
            .map(|&raised| if raised { '1' } else { '0' })
            .collect()
    }

    /// Render this cell as its Unicode braille character.
    ///
    /// An all-flat cell renders as the blank pattern U+2800.
    pub fn glyph(&self) -> char {
        let mut code = 0u32;
        for (position, &raised) in self.dots.iter().enumerate() {
            if raised {
                code |= DOT_BITS[position];
            }
        }
        char::from_u32(BRAILLE_BASE as u32 + code).unwrap_or(BRAILLE_BASE)
    }
}
