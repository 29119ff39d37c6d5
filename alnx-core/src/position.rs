//! Position arrays and the per-position statistics engine.
//!
//! A [`PositionArray`] is the positions-only, one-character-per-cell matrix
//! derived from an alignment array (gaps included, insertions excluded).
//! Every statistic recomputes from the current cells; nothing is cached, so
//! a stale derived matrix can never outlive an edit of its source.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::array::{AlignmentArray, AlignmentData};
use crate::types::{Background, GAP};

/// Errors from deriving position arrays or computing statistics.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("cell at row {row}, column {column} has {length} characters, expected exactly 1")]
    CellShape {
        row: usize,
        column: usize,
        length: usize,
    },
    #[error("cannot compare arrays with {left} and {right} position columns")]
    ColumnMismatch { left: usize, right: usize },
    #[error("featurized arrays must be reduced to a feature plane first")]
    Featurized,
}

pub type StatsResult<T> = Result<T, StatsError>;

/// A matrix of per-symbol, per-position values (counts, probabilities, or
/// background-normalized weights), with rows in alphabet order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolMatrix {
    /// The alphabet; row `i` of `values` belongs to symbol `i`.
    pub alphabet: String,
    /// `values[symbol][position]`.
    pub values: Vec<Vec<f64>>,
}

impl SymbolMatrix {
    /// Number of positions (columns).
    pub fn n_positions(&self) -> usize {
        self.values.first().map(|row| row.len()).unwrap_or(0)
    }

    /// The per-symbol values of one position, in alphabet order.
    pub fn column(&self, position: usize) -> Vec<f64> {
        self.values.iter().map(|row| row[position]).collect()
    }

    /// Look up the value for `symbol` at `position`.
    pub fn get(&self, symbol: char, position: usize) -> Option<f64> {
        let index = self.alphabet.chars().position(|c| c == symbol)?;
        self.values.get(index)?.get(position).copied()
    }
}

/// Positions-only alignment matrix, one byte per cell, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionArray {
    cells: Vec<u8>,
    n_rows: usize,
    n_columns: usize,
}

impl PositionArray {
    /// Derive from an alignment array by keeping only position columns.
    ///
    /// Accepts both call patterns: an array already collapsed with
    /// [`AlignmentArray::positions_only`], or a full array whose insertion
    /// columns are filtered here.
    ///
    /// # Errors
    ///
    /// Fails if any retained cell is not exactly one character (a malformed
    /// row disagreeing with row 0's column structure), or if the array is
    /// featurized.
    pub fn from_alignment(array: &AlignmentArray) -> StatsResult<Self> {
        let rows = match array.data() {
            AlignmentData::Plain(rows) => rows,
            AlignmentData::Featurized(_) => return Err(StatsError::Featurized),
        };
        let keep: Vec<usize> = array
            .is_position_column()
            .into_iter()
            .enumerate()
            .filter_map(|(column, position)| position.then_some(column))
            .collect();

        let n_rows = rows.len();
        let n_columns = keep.len();
        let mut cells = Vec::with_capacity(n_rows * n_columns);
        for (row, cells_in) in rows.iter().enumerate() {
            for &column in &keep {
                let cell = &cells_in[column];
                if cell.len() != 1 {
                    return Err(StatsError::CellShape {
                        row,
                        column,
                        length: cell.chars().count(),
                    });
                }
                cells.push(cell.as_bytes()[0]);
            }
        }
        Ok(Self {
            cells,
            n_rows,
            n_columns,
        })
    }

    /// Number of sequences.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of alignment positions.
    pub fn n_columns(&self) -> usize {
        self.n_columns
    }

    /// The cell at `(row, column)`.
    pub fn cell(&self, row: usize, column: usize) -> Option<char> {
        if row >= self.n_rows || column >= self.n_columns {
            return None;
        }
        Some(self.cells[row * self.n_columns + column] as char)
    }

    fn count(&self, symbol: u8, column: usize) -> usize {
        (0..self.n_rows)
            .filter(|row| self.cells[row * self.n_columns + column] == symbol)
            .count()
    }

    /// Gap fraction at each position.
    pub fn gaps(&self) -> Vec<f64> {
        if self.n_rows == 0 {
            return vec![0.0; self.n_columns];
        }
        (0..self.n_columns)
            .map(|column| self.count(GAP as u8, column) as f64 / self.n_rows as f64)
            .collect()
    }

    /// Per-symbol counts at each position, plus `pseudocount` everywhere.
    ///
    /// The per-symbol scan is the dominant cost on large alignments and is
    /// data-parallel across symbols.
    pub fn frequency(&self, alphabet: &str, pseudocount: f64) -> SymbolMatrix {
        let symbols: Vec<u8> = alphabet.bytes().collect();
        let values: Vec<Vec<f64>> = symbols
            .par_iter()
            .map(|&symbol| {
                (0..self.n_columns)
                    .map(|column| self.count(symbol, column) as f64 + pseudocount)
                    .collect()
            })
            .collect();
        SymbolMatrix {
            alphabet: alphabet.to_string(),
            values,
        }
    }

    /// Per-position probability distribution over `alphabet`.
    ///
    /// Columns with zero total mass (possible when the alphabet omits the
    /// gap symbol and a column is all gaps) are left all-zero rather than
    /// divided through.
    pub fn probability(&self, alphabet: &str, pseudocount: f64) -> SymbolMatrix {
        let mut matrix = self.frequency(alphabet, pseudocount);
        for position in 0..matrix.n_positions() {
            let total: f64 = matrix.values.iter().map(|row| row[position]).sum();
            if total > 0.0 {
                for row in matrix.values.iter_mut() {
                    row[position] /= total;
                }
            }
        }
        matrix
    }

    /// Probability normalized against a background distribution (position
    /// weight matrix).
    pub fn weight(&self, background: &Background, pseudocount: f64) -> SymbolMatrix {
        let mut matrix = self.probability(background.symbols(), pseudocount);
        for (row, &marginal) in matrix.values.iter_mut().zip(background.frequencies()) {
            for value in row.iter_mut() {
                *value /= marginal;
            }
        }
        matrix
    }

    /// Shannon entropy of each position, in nats. `0 ln 0` contributes 0.
    pub fn entropy(&self, alphabet: &str, pseudocount: f64) -> Vec<f64> {
        let matrix = self.probability(alphabet, pseudocount);
        (0..matrix.n_positions())
            .map(|position| shannon(&matrix.column(position)))
            .collect()
    }

    /// Information content of each position in nats: `ln |alphabet| − H`.
    pub fn nats(&self, alphabet: &str, pseudocount: f64) -> Vec<f64> {
        let max = (alphabet.chars().count() as f64).ln();
        self.entropy(alphabet, pseudocount)
            .into_iter()
            .map(|h| max - h)
            .collect()
    }

    /// Information content of each position in bits.
    pub fn bits(&self, alphabet: &str, pseudocount: f64) -> Vec<f64> {
        self.nats(alphabet, pseudocount)
            .into_iter()
            .map(|nats| nats / std::f64::consts::LN_2)
            .collect()
    }

    /// Kullback-Leibler divergence of each position against `other`'s
    /// matching position, or against the background marginals when no
    /// comparison array is given. Asymmetric: the receiver is the "true"
    /// distribution. A symbol present here but absent in the comparison
    /// contributes `+inf`; a position with zero mass yields 0.
    ///
    /// # Errors
    ///
    /// The compared arrays must have equal position counts.
    pub fn kldivergence(
        &self,
        other: Option<&PositionArray>,
        background: &Background,
    ) -> StatsResult<Vec<f64>> {
        let alphabet = background.symbols();
        let p = self.probability(alphabet, 0.0);
        match other {
            Some(comparison) => {
                if comparison.n_columns != self.n_columns {
                    return Err(StatsError::ColumnMismatch {
                        left: self.n_columns,
                        right: comparison.n_columns,
                    });
                }
                let q = comparison.probability(alphabet, 0.0);
                Ok((0..p.n_positions())
                    .map(|c| kl(&p.column(c), &q.column(c)))
                    .collect())
            }
            None => Ok((0..p.n_positions())
                .map(|c| kl(&p.column(c), background.frequencies()))
                .collect()),
        }
    }

    /// Jensen-Shannon divergence of each position against `other` or the
    /// background, in its metric (square-root) form with natural logs.
    /// Symmetric in its two distributions.
    ///
    /// # Errors
    ///
    /// The compared arrays must have equal position counts.
    pub fn jsdivergence(
        &self,
        other: Option<&PositionArray>,
        background: &Background,
    ) -> StatsResult<Vec<f64>> {
        let alphabet = background.symbols();
        let p = self.probability(alphabet, 0.0);
        match other {
            Some(comparison) => {
                if comparison.n_columns != self.n_columns {
                    return Err(StatsError::ColumnMismatch {
                        left: self.n_columns,
                        right: comparison.n_columns,
                    });
                }
                let q = comparison.probability(alphabet, 0.0);
                Ok((0..p.n_positions())
                    .map(|c| js(&p.column(c), &q.column(c)))
                    .collect())
            }
            None => Ok((0..p.n_positions())
                .map(|c| js(&p.column(c), background.frequencies()))
                .collect()),
        }
    }

    /// Consensus sequence: at each position the alphabet symbol of maximum
    /// probability, or of maximum background-normalized weight when
    /// `normalized`. The earliest symbol in alphabet order wins ties.
    pub fn consensus(&self, normalized: bool, background: &Background) -> String {
        let matrix = if normalized {
            self.weight(background, 0.0)
        } else {
            self.probability(background.symbols(), 0.0)
        };
        let symbols: Vec<char> = matrix.alphabet.chars().collect();
        (0..matrix.n_positions())
            .map(|position| {
                let column = matrix.column(position);
                let mut best = 0;
                for (index, &value) in column.iter().enumerate() {
                    if value > column[best] {
                        best = index;
                    }
                }
                symbols[best]
            })
            .collect()
    }
}

fn shannon(p: &[f64]) -> f64 {
    -p.iter()
        .filter(|&&x| x > 0.0)
        .map(|&x| x * x.ln())
        .sum::<f64>()
}

/// KL divergence with both inputs normalized to unit mass first. Zero-mass
/// inputs yield 0 instead of poisoning downstream sums with NaN.
fn kl(p: &[f64], q: &[f64]) -> f64 {
    let p_sum: f64 = p.iter().sum();
    let q_sum: f64 = q.iter().sum();
    if p_sum <= 0.0 || q_sum <= 0.0 {
        return 0.0;
    }
    p.iter()
        .zip(q)
        .map(|(&pi, &qi)| {
            let pi = pi / p_sum;
            let qi = qi / q_sum;
            if pi > 0.0 {
                if qi > 0.0 {
                    pi * (pi / qi).ln()
                } else {
                    f64::INFINITY
                }
            } else {
                0.0
            }
        })
        .sum()
}

fn js(p: &[f64], q: &[f64]) -> f64 {
    let p_sum: f64 = p.iter().sum();
    let q_sum: f64 = q.iter().sum();
    if p_sum <= 0.0 || q_sum <= 0.0 {
        return 0.0;
    }
    let divergence: f64 = p
        .iter()
        .zip(q)
        .map(|(&pi, &qi)| {
            let pi = pi / p_sum;
            let qi = qi / q_sum;
            let mi = 0.5 * (pi + qi);
            let mut d = 0.0;
            if pi > 0.0 {
                d += 0.5 * pi * (pi / mi).ln();
            }
            if qi > 0.0 {
                d += 0.5 * qi * (qi / mi).ln();
            }
            d
        })
        .sum();
    divergence.max(0.0).sqrt()
}
