//! Shared value types for alignment arrays.
//!
//! The character-case encoding is the one contract every producer and
//! consumer of alignment text must honor: upper-case letters and `-` denote
//! aligned positions, lower-case letters denote inserted residues.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The gap symbol. Gaps always count as aligned positions.
pub const GAP: char = '-';

/// Amino-acid alphabet plus gap, in the order used for profile matrices.
pub const AMINO_GAP: &str = "ARNDCQEGHILKMFPSTWYV-";

/// Amino-acid alphabet without the gap symbol.
pub const AMINO: &str = "ARNDCQEGHILKMFPSTWYV";

/// A single classified character of an annotated sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Residue {
    /// Upper-case letter or gap: part of an aligned column.
    Position(char),
    /// Lower-case letter: part of an insertion run.
    Insertion(char),
}

impl Residue {
    /// Classify a character under the case encoding.
    ///
    /// Returns `None` for anything that is not an ASCII letter or `-`;
    /// callers decide how to surface the failure (the vectorizer reports
    /// the byte index of the offending character).
    pub fn classify(c: char) -> Option<Residue> {
        if c == GAP || c.is_ascii_uppercase() {
            Some(Residue::Position(c))
        } else if c.is_ascii_lowercase() {
            Some(Residue::Insertion(c))
        } else {
            None
        }
    }

    /// Whether `c` denotes an aligned position (upper-case letter or gap).
    ///
    /// Only meaningful for characters of the alignment alphabet; feed
    /// unvalidated input through [`Residue::classify`] instead.
    pub fn is_position(c: char) -> bool {
        c == GAP || c.is_ascii_uppercase()
    }

    /// Whether `c` denotes an inserted residue (lower-case letter).
    pub fn is_insertion(c: char) -> bool {
        c.is_ascii_lowercase()
    }

    /// The underlying character.
    pub fn as_char(&self) -> char {
        match self {
            Residue::Position(c) | Residue::Insertion(c) => *c,
        }
    }
}

/// The alignment coordinate of one column.
///
/// Position columns are numbered 1, 2, 3, … left to right; an insertion
/// column between positions `k` and `k + 1` carries `Insertion(k)`
/// (`Insertion(0)` before the first position). Derived on demand from the
/// current column structure, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnNumber {
    /// 1-based alignment position.
    Position(u32),
    /// Insertion column sitting after position `k`.
    Insertion(u32),
}

impl ColumnNumber {
    /// The rational coordinate: `k` for positions, `k + 0.5` for insertions.
    pub fn value(&self) -> f64 {
        match self {
            ColumnNumber::Position(k) => *k as f64,
            ColumnNumber::Insertion(k) => *k as f64 + 0.5,
        }
    }

    /// The integer position number, if this is a position column.
    pub fn as_position(&self) -> Option<u32> {
        match self {
            ColumnNumber::Position(k) => Some(*k),
            ColumnNumber::Insertion(_) => None,
        }
    }
}

/// Errors from constructing a [`Background`] distribution.
#[derive(Debug, Error)]
pub enum BackgroundError {
    #[error("alphabet has {symbols} symbols but {frequencies} frequencies")]
    LengthMismatch { symbols: usize, frequencies: usize },
    #[error("frequency for '{0}' must be positive, got {1}")]
    NonPositive(char, f64),
    #[error("frequencies sum to {0}, expected 1")]
    BadSum(f64),
}

/// Tolerance on the frequency sum. The published BLOSUM62 marginals are
/// rounded to three decimals and sum to 1.002.
const SUM_TOLERANCE: f64 = 0.01;

/// A named null model for divergence calculations: an alphabet paired with
/// per-symbol marginal frequencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Background {
    symbols: String,
    frequencies: Vec<f64>,
}

impl Background {
    /// Build a background distribution, validating that every symbol has a
    /// positive frequency and the frequencies sum to 1 within tolerance.
    pub fn new(symbols: impl Into<String>, frequencies: Vec<f64>) -> Result<Self, BackgroundError> {
        let symbols = symbols.into();
        if symbols.chars().count() != frequencies.len() {
            return Err(BackgroundError::LengthMismatch {
                symbols: symbols.chars().count(),
                frequencies: frequencies.len(),
            });
        }
        for (symbol, &frequency) in symbols.chars().zip(&frequencies) {
            if frequency <= 0.0 {
                return Err(BackgroundError::NonPositive(symbol, frequency));
            }
        }
        let sum: f64 = frequencies.iter().sum();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(BackgroundError::BadSum(sum));
        }
        Ok(Self { symbols, frequencies })
    }

    /// The BLOSUM62 marginal amino-acid distribution.
    pub fn blosum62() -> Self {
        Self {
            symbols: AMINO.to_string(),
            frequencies: vec![
                //  A      R      N      D      C      Q      E      G      H      I
                0.078, 0.051, 0.041, 0.052, 0.024, 0.034, 0.059, 0.083, 0.025, 0.062,
                //  L      K      M      F      P      S      T      W      Y      V
                0.092, 0.056, 0.024, 0.044, 0.043, 0.059, 0.055, 0.014, 0.034, 0.072,
            ],
        }
    }

    /// The alphabet, in frequency order.
    pub fn symbols(&self) -> &str {
        &self.symbols
    }

    /// Per-symbol marginal frequencies, parallel to [`Background::symbols`].
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Number of symbols in the alphabet.
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Whether the alphabet is empty. Never true for the built-in models.
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gap_and_upper_are_positions() {
        assert_eq!(Residue::classify('-'), Some(Residue::Position('-')));
        assert_eq!(Residue::classify('A'), Some(Residue::Position('A')));
        assert_eq!(Residue::classify('W'), Some(Residue::Position('W')));
        assert!(Residue::is_position('-'));
        assert!(Residue::is_position('A'));
    }

    #[test]
    fn lower_is_insertion() {
        assert_eq!(Residue::classify('a'), Some(Residue::Insertion('a')));
        assert!(Residue::is_insertion('g'));
        assert!(!Residue::is_position('g'));
    }

    #[test]
    fn non_alphabet_characters_rejected() {
        assert_eq!(Residue::classify('3'), None);
        assert_eq!(Residue::classify('.'), None);
        assert_eq!(Residue::classify(' '), None);
        assert_eq!(Residue::classify('*'), None);
    }

    #[test]
    fn column_number_values() {
        assert_eq!(ColumnNumber::Position(1).value(), 1.0);
        assert_eq!(ColumnNumber::Position(42).value(), 42.0);
        assert_eq!(ColumnNumber::Insertion(0).value(), 0.5);
        assert_eq!(ColumnNumber::Insertion(7).value(), 7.5);
        assert_eq!(ColumnNumber::Position(3).as_position(), Some(3));
        assert_eq!(ColumnNumber::Insertion(3).as_position(), None);
    }

    #[test]
    fn blosum62_background_is_consistent() {
        let bg = Background::blosum62();
        assert_eq!(bg.symbols(), AMINO);
        assert_eq!(bg.len(), 20);
        let sum: f64 = bg.frequencies().iter().sum();
        assert!((sum - 1.0).abs() < 0.01, "sum {}", sum);
    }

    #[test]
    fn background_validates_shape() {
        assert!(Background::new("AC", vec![0.5]).is_err());
        assert!(Background::new("AC", vec![0.5, 0.0]).is_err());
        assert!(Background::new("AC", vec![0.9, 0.3]).is_err());
        assert!(Background::new("AC", vec![0.5, 0.5]).is_ok());
    }
}
