//! Token string to text translation.

use thiserror::Error;

use super::alphabet::letter_for;
use super::cell::{Cell, CellError};

/// Placeholder output character for tokens that do not map to a letter.
pub const UNKNOWN: char = '?';

/// Translate a space-separated token string to text, fail-soft.
///
/// Tokens are produced by splitting on the single space character, so
/// consecutive spaces produce empty tokens and leading/trailing spaces
/// produce empty tokens at the ends. Each token resolves to its letter, or
/// to [`UNKNOWN`] when it is not one of the 26 letter patterns for any
/// reason (wrong length, non-binary characters, empty, or an unmapped
/// pattern). The output always has exactly one character per token.
///
/// Recognized input is noisy optical output, so a partially garbled
/// translation is preferred over failing the whole call: this function
/// never errors.
///
/// # Example
/// ```ignore
/// assert_eq!(translate("100000 101000 110000"), "abc");
/// assert_eq!(translate("100000  101000"), "a?b"); // empty token between spaces
/// ```
pub fn translate(input: &str) -> String {
    input
        .split(' ')
        .map(|token| letter_for(token).unwrap_or(UNKNOWN))
        .collect()
}

/// Translate with whitespace normalization.
///
/// A separate, explicitly chosen mode: tokens are split on runs of
/// whitespace and empty tokens are dropped, so doubled spaces and
/// leading/trailing whitespace produce no `'?'` artifacts. Token
/// resolution is otherwise identical to [`translate`].
pub fn translate_normalized(input: &str) -> String {
    input
        .split_whitespace()
        .map(|token| letter_for(token).unwrap_or(UNKNOWN))
        .collect()
}

/// Why a token failed to resolve in strict mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The token is not a well-formed cell at all.
    #[error(transparent)]
    Malformed(#[from] CellError),

    /// A well-formed cell whose pattern is not one of the 26 letters.
    #[error("no letter for pattern {0}")]
    Unmapped(String),
}

/// Translate with one typed result per token.
///
/// Uses the same splitting rule as [`translate`] and agrees with it
/// position-by-position: an `Ok(letter)` here is that letter there, an
/// `Err` here is a `'?'` there. Unlike the fail-soft path, malformed
/// tokens and well-formed-but-unmapped patterns are distinguishable.
pub fn translate_strict(input: &str) -> Vec<Result<char, TokenError>> {
    input
        .split(' ')
        .map(|token| {
            let cell = Cell::parse(token)?;
            letter_for(token).ok_or_else(|| TokenError::Unmapped(cell.pattern()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_single_letters() {
        assert_eq!(translate("100000"), "a");
        assert_eq!(translate("100111"), "z");
    }

    #[test]
    fn test_translate_multi_token() {
        assert_eq!(translate("100000 101000 110000"), "abc");
    }

    #[test]
    fn test_translate_unknown_pattern() {
        assert_eq!(translate("000000"), "?");
    }

    #[test]
    fn test_translate_malformed_tokens() {
        assert_eq!(translate("1"), "?");
        assert_eq!(translate(""), "?");
        assert_eq!(translate("10100a"), "?");
    }

    #[test]
    fn test_translate_double_space_artifact() {
        // The empty token between doubled spaces maps to '?'
        assert_eq!(translate("100000  101000"), "a?b");
    }

    #[test]
    fn test_translate_leading_trailing_spaces() {
        assert_eq!(translate(" 100000"), "?a");
        assert_eq!(translate("100000 "), "a?");
    }

    #[test]
    fn test_translate_normalized_drops_artifacts() {
        assert_eq!(translate_normalized("100000  101000"), "ab");
        assert_eq!(translate_normalized("  100000\t101000  "), "ab");
        assert_eq!(translate_normalized(""), "");
    }

    #[test]
    fn test_translate_normalized_keeps_unknowns() {
        // Normalization only affects splitting, not resolution
        assert_eq!(translate_normalized("100000 000000"), "a?");
    }

    #[test]
    fn test_strict_matches_fail_soft_positions() {
        let input = "100000 xx 000000 101000";
        let soft = translate(input);
        let strict = translate_strict(input);
        assert_eq!(soft.chars().count(), strict.len());
        for (soft_char, result) in soft.chars().zip(strict.iter()) {
            match result {
                Ok(letter) => assert_eq!(soft_char, *letter),
                Err(_) => assert_eq!(soft_char, UNKNOWN),
            }
        }
    }

    #[test]
    fn test_strict_distinguishes_error_kinds() {
        let results = translate_strict("1 000000");
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[0],
            Err(TokenError::Malformed(CellError::WrongLength { len: 1 }))
        ));
        assert_eq!(
            results[1],
            Err(TokenError::Unmapped("000000".to_string()))
        );
    }

    #[test]
    fn test_strict_empty_input_is_one_empty_token() {
        let results = translate_strict("");
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Err(TokenError::Malformed(CellError::Empty))
        ));
    }
}
