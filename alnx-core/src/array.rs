//! Alignment arrays: column-partitioned multiple sequence alignments.
//!
//! An [`AlignmentArray`] stacks vectorized sequences into a rows × columns
//! matrix of string cells. Column classification is read from row 0 alone:
//! a single upper-case letter or gap marks a position column, anything else
//! (empty or lower-case run) marks an insertion column. Construction
//! guarantees all rows share the column structure, so the judgement holds
//! for every row.
//!
//! Editing operations ([`AlignmentArray::make_insertion`],
//! [`AlignmentArray::define_insertions`]) and selections return new arrays;
//! nothing hands out live views into shared storage.

use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::position::{PositionArray, StatsResult};
use crate::types::{ColumnNumber, Residue, GAP};
use crate::vectorize::{vectorize, VectorizeError};

/// Errors from building or editing alignment arrays.
#[derive(Debug, Error)]
pub enum ArrayError {
    #[error("{names} names for {rows} sequence rows")]
    NameCount { names: usize, rows: usize },
    #[error("row {row} has {found} columns, expected {expected}")]
    RowShape {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("row {row}, column {column} has {found} feature cells, expected {expected}")]
    FeatureShape {
        row: usize,
        column: usize,
        expected: usize,
        found: usize,
    },
    #[error("feature {feature} requested from an array with {features} features")]
    FeatureNotFound { feature: usize, features: usize },
    #[error("alignment position {0} not present")]
    PositionNotFound(u32),
    #[error("column span {start}..={end} out of bounds for {columns} columns")]
    ColumnRange {
        start: usize,
        end: usize,
        columns: usize,
    },
    #[error("{operation} is not supported on featurized arrays")]
    UnsupportedDimension { operation: &'static str },
    #[error("row {row}: {source}")]
    RowVectorize {
        row: usize,
        source: VectorizeError,
    },
}

pub type ArrayResult<T> = Result<T, ArrayError>;

/// Cell storage: plain 2-D alignments, or 3-D arrays in which every cell
/// carries one string per feature track (feature 0 is the sequence itself).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlignmentData {
    /// rows × columns of cells.
    Plain(Vec<Vec<String>>),
    /// rows × columns × features; all cell stacks have equal depth.
    Featurized(Vec<Vec<Vec<String>>>),
}

/// A multiple sequence alignment as a uniform matrix of column cells.
///
/// Sequence names are owned alongside the array by the caller, not embedded
/// in it; constructors take them only to validate the row count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentArray {
    data: AlignmentData,
}

impl AlignmentArray {
    /// Build an array by vectorizing raw annotated sequences (flanking
    /// insertion slots kept) and stacking the results.
    ///
    /// # Errors
    ///
    /// Fails if the name and sequence counts differ, if any sequence holds
    /// a character outside the alignment alphabet (the error names the row),
    /// or if the vectorized rows disagree on column count — the usual sign
    /// of a misaligned input file, reported with the offending row index and
    /// both observed lengths.
    pub fn from_rows<N, S>(names: &[N], raws: &[S]) -> ArrayResult<Self>
    where
        N: AsRef<str>,
        S: AsRef<str>,
    {
        if names.len() != raws.len() {
            return Err(ArrayError::NameCount {
                names: names.len(),
                rows: raws.len(),
            });
        }
        let mut rows = Vec::with_capacity(raws.len());
        for (row, raw) in raws.iter().enumerate() {
            let slots = vectorize(raw.as_ref(), true)
                .map_err(|source| ArrayError::RowVectorize { row, source })?;
            rows.push(slots);
        }
        Self::from_cells(rows)
    }

    /// Build an array from pre-partitioned rows.
    ///
    /// Verifies the uniform column count, then prunes dead columns
    /// (insertion columns that are the empty string in every row). Pruning
    /// at construction keeps the position numbering stable and stops empty
    /// columns accumulating across repeated boundary edits.
    pub fn from_cells(rows: Vec<Vec<String>>) -> ArrayResult<Self> {
        let expected = rows.first().map(|row| row.len()).unwrap_or(0);
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != expected {
                return Err(ArrayError::RowShape {
                    row,
                    expected,
                    found: cells.len(),
                });
            }
        }
        let mut array = AlignmentArray {
            data: AlignmentData::Plain(rows),
        };
        array.prune_dead_columns();
        Ok(array)
    }

    /// Build a featurized (3-D) array from per-cell feature stacks.
    ///
    /// Every row must have the same column count and every cell the same
    /// feature depth. Feature 0 is the primary sequence and drives column
    /// classification.
    pub fn from_featurized(rows: Vec<Vec<Vec<String>>>) -> ArrayResult<Self> {
        let expected = rows.first().map(|row| row.len()).unwrap_or(0);
        let features = rows
            .first()
            .and_then(|row| row.first())
            .map(|stack| stack.len())
            .unwrap_or(0);
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != expected {
                return Err(ArrayError::RowShape {
                    row,
                    expected,
                    found: cells.len(),
                });
            }
            for (column, stack) in cells.iter().enumerate() {
                if stack.len() != features {
                    return Err(ArrayError::FeatureShape {
                        row,
                        column,
                        expected: features,
                        found: stack.len(),
                    });
                }
            }
        }
        Ok(AlignmentArray {
            data: AlignmentData::Featurized(rows),
        })
    }

    /// The underlying cell storage.
    pub fn data(&self) -> &AlignmentData {
        &self.data
    }

    /// The rows of a plain array.
    ///
    /// # Errors
    ///
    /// Featurized arrays must be reduced with [`AlignmentArray::feature_plane`]
    /// first.
    pub fn plain_rows(&self) -> ArrayResult<&[Vec<String>]> {
        match &self.data {
            AlignmentData::Plain(rows) => Ok(rows),
            AlignmentData::Featurized(_) => Err(ArrayError::UnsupportedDimension {
                operation: "plain cell access",
            }),
        }
    }

    /// Number of sequences.
    pub fn n_rows(&self) -> usize {
        match &self.data {
            AlignmentData::Plain(rows) => rows.len(),
            AlignmentData::Featurized(rows) => rows.len(),
        }
    }

    /// Number of columns.
    pub fn n_columns(&self) -> usize {
        match &self.data {
            AlignmentData::Plain(rows) => rows.first().map(|row| row.len()).unwrap_or(0),
            AlignmentData::Featurized(rows) => rows.first().map(|row| row.len()).unwrap_or(0),
        }
    }

    /// Number of feature tracks (1 for plain arrays).
    pub fn n_features(&self) -> usize {
        match &self.data {
            AlignmentData::Plain(_) => 1,
            AlignmentData::Featurized(rows) => rows
                .first()
                .and_then(|row| row.first())
                .map(|stack| stack.len())
                .unwrap_or(0),
        }
    }

    /// Whether this array carries feature tracks.
    pub fn is_featurized(&self) -> bool {
        matches!(&self.data, AlignmentData::Featurized(_))
    }

    /// Extract one feature track as a plain array. Feature 0 of a plain
    /// array is the array itself.
    pub fn feature_plane(&self, feature: usize) -> ArrayResult<AlignmentArray> {
        match &self.data {
            AlignmentData::Plain(_) if feature == 0 => Ok(self.clone()),
            AlignmentData::Plain(_) => Err(ArrayError::FeatureNotFound {
                feature,
                features: 1,
            }),
            AlignmentData::Featurized(rows) => {
                let features = self.n_features();
                if feature >= features {
                    return Err(ArrayError::FeatureNotFound { feature, features });
                }
                let plane = rows
                    .iter()
                    .map(|row| row.iter().map(|stack| stack[feature].clone()).collect())
                    .collect();
                Ok(AlignmentArray {
                    data: AlignmentData::Plain(plane),
                })
            }
        }
    }

    /// Per-column position/insertion classification, judged from row 0 only.
    pub fn is_position_column(&self) -> Vec<bool> {
        (0..self.n_columns())
            .map(|column| is_position_cell(self.head_cell(column)))
            .collect()
    }

    /// The alignment coordinate of every column: positions count 1, 2, 3, …
    /// and insertion columns carry the preceding position number.
    /// Recomputed from the current structure on every call.
    pub fn column_numbers(&self) -> Vec<ColumnNumber> {
        let mut counter = 0u32;
        self.is_position_column()
            .into_iter()
            .map(|position| {
                if position {
                    counter += 1;
                    ColumnNumber::Position(counter)
                } else {
                    ColumnNumber::Insertion(counter)
                }
            })
            .collect()
    }

    /// Select the named alignment positions, in request order, dropping all
    /// insertion columns. Returns an independent copy.
    ///
    /// # Errors
    ///
    /// Fails on the first position number not present in the array; columns
    /// may have moved since the numbers were computed, so callers should
    /// re-query [`AlignmentArray::column_numbers`] after an edit.
    pub fn select_positions(&self, positions: &[u32]) -> ArrayResult<AlignmentArray> {
        let index = self.position_index();
        let mut columns = Vec::with_capacity(positions.len());
        for &position in positions {
            columns.push(
                *index
                    .get(&position)
                    .ok_or(ArrayError::PositionNotFound(position))?,
            );
        }
        Ok(self.select_columns(&columns))
    }

    /// Select the inclusive column span from the column holding position
    /// `start` to the column holding position `end`, keeping any insertion
    /// columns interleaved in the span. Returns an independent copy.
    ///
    /// Both endpoints must resolve to integer position numbers present in
    /// the array; insertion (half-integer) coordinates are not addressable.
    pub fn select_range(&self, start: u32, end: u32) -> ArrayResult<AlignmentArray> {
        let index = self.position_index();
        let first = *index
            .get(&start)
            .ok_or(ArrayError::PositionNotFound(start))?;
        let last = *index.get(&end).ok_or(ArrayError::PositionNotFound(end))?;
        let columns: Vec<usize> = (first..=last).collect();
        Ok(self.select_columns(&columns))
    }

    /// Collapse to position columns only, dropping every insertion column.
    /// The usual precursor to deriving a position array.
    pub fn positions_only(&self) -> AlignmentArray {
        let columns: Vec<usize> = self
            .is_position_column()
            .into_iter()
            .enumerate()
            .filter_map(|(column, position)| position.then_some(column))
            .collect();
        self.select_columns(&columns)
    }

    /// Reclassify the inclusive column span `[start, end]` as one insertion
    /// column.
    ///
    /// The span first grows outward over any directly adjacent insertion
    /// columns, so two insertion columns never end up side by side. Each
    /// row's cells in the span are then stripped of gaps, lower-cased, and
    /// concatenated into a single merged cell. No residue is ever lost:
    /// only gaps inside the folded span are dropped, and they carry no
    /// meaning inside an insertion run.
    ///
    /// Returns a new array; the receiver is untouched.
    pub fn make_insertion(&self, start: usize, end: usize) -> ArrayResult<AlignmentArray> {
        let rows = match &self.data {
            AlignmentData::Plain(rows) => rows,
            AlignmentData::Featurized(_) => {
                return Err(ArrayError::UnsupportedDimension {
                    operation: "make_insertion",
                })
            }
        };
        let n_columns = self.n_columns();
        if start > end || end >= n_columns {
            return Err(ArrayError::ColumnRange {
                start,
                end,
                columns: n_columns,
            });
        }

        let mask = self.is_position_column();
        let mut start = start;
        let mut end = end;
        while start > 0 && !mask[start - 1] {
            start -= 1;
        }
        while end + 1 < n_columns && !mask[end + 1] {
            end += 1;
        }

        let merged_rows = rows
            .iter()
            .map(|row| {
                let mut cells = Vec::with_capacity(n_columns - (end - start));
                cells.extend(row[..start].iter().cloned());
                let merged: String = row[start..=end]
                    .iter()
                    .flat_map(|cell| cell.chars())
                    .filter(|&c| c != GAP)
                    .map(|c| c.to_ascii_lowercase())
                    .collect();
                cells.push(merged);
                cells.extend(row[end + 1..].iter().cloned());
                cells
            })
            .collect();
        Ok(AlignmentArray {
            data: AlignmentData::Plain(merged_rows),
        })
    }

    /// Reclassify every high-gap column run as insertion material.
    ///
    /// A column qualifies when its gap fraction (cells equal to `-`)
    /// exceeds `gap_threshold`. Contiguous qualifying runs are folded with
    /// [`AlignmentArray::make_insertion`], processed right to left so the
    /// column shifts caused by earlier merges never invalidate the
    /// remaining run indices.
    pub fn define_insertions(&self, gap_threshold: f64) -> ArrayResult<AlignmentArray> {
        let rows = match &self.data {
            AlignmentData::Plain(rows) => rows,
            AlignmentData::Featurized(_) => {
                return Err(ArrayError::UnsupportedDimension {
                    operation: "define_insertions",
                })
            }
        };
        if rows.is_empty() {
            return Ok(self.clone());
        }

        let n_rows = rows.len() as f64;
        let n_columns = self.n_columns();
        let mask: Vec<bool> = (0..n_columns)
            .map(|column| {
                let gaps = rows.iter().filter(|row| row[column] == "-").count();
                gaps as f64 / n_rows > gap_threshold
            })
            .collect();

        let mut runs: Vec<(usize, usize)> = Vec::new();
        let mut column = 0;
        while column < n_columns {
            if mask[column] {
                let run_start = column;
                while column + 1 < n_columns && mask[column + 1] {
                    column += 1;
                }
                runs.push((run_start, column));
            }
            column += 1;
        }

        let mut edited = self.clone();
        for &(run_start, run_end) in runs.iter().rev() {
            edited = edited.make_insertion(run_start, run_end)?;
        }
        Ok(edited)
    }

    /// Derive the position array: position columns only, one byte per cell.
    /// See [`PositionArray::from_alignment`].
    pub fn to_position_array(&self) -> StatsResult<PositionArray> {
        PositionArray::from_alignment(self)
    }

    fn head_cell(&self, column: usize) -> &str {
        match &self.data {
            AlignmentData::Plain(rows) => {
                rows.first().map(|row| row[column].as_str()).unwrap_or("")
            }
            AlignmentData::Featurized(rows) => rows
                .first()
                .and_then(|row| row[column].first())
                .map(|cell| cell.as_str())
                .unwrap_or(""),
        }
    }

    fn position_index(&self) -> FnvHashMap<u32, usize> {
        self.column_numbers()
            .into_iter()
            .enumerate()
            .filter_map(|(column, number)| number.as_position().map(|p| (p, column)))
            .collect()
    }

    fn select_columns(&self, columns: &[usize]) -> AlignmentArray {
        let data = match &self.data {
            AlignmentData::Plain(rows) => AlignmentData::Plain(
                rows.iter()
                    .map(|row| columns.iter().map(|&c| row[c].clone()).collect())
                    .collect(),
            ),
            AlignmentData::Featurized(rows) => AlignmentData::Featurized(
                rows.iter()
                    .map(|row| columns.iter().map(|&c| row[c].clone()).collect())
                    .collect(),
            ),
        };
        AlignmentArray { data }
    }

    fn prune_dead_columns(&mut self) {
        if let AlignmentData::Plain(rows) = &mut self.data {
            if rows.is_empty() {
                return;
            }
            let n_columns = rows[0].len();
            let keep: Vec<bool> = (0..n_columns)
                .map(|column| rows.iter().any(|row| !row[column].is_empty()))
                .collect();
            if keep.iter().all(|&k| k) {
                return;
            }
            for row in rows.iter_mut() {
                let mut column = 0;
                row.retain(|_| {
                    let kept = keep[column];
                    column += 1;
                    kept
                });
            }
        }
    }
}

/// A cell marks a position column iff it is exactly one aligned character.
/// Empty cells mark insertion columns (a consumed insertion slot).
fn is_position_cell(cell: &str) -> bool {
    let mut chars = cell.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Residue::is_position(c),
        _ => false,
    }
}
