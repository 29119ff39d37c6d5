//! CFA alignment reader
//!
//! CFA is FASTA-shaped text carrying full-length case-encoded sequences,
//! one unbroken line per sequence. A record may carry additional feature
//! lines below the primary sequence; every line of a record must have the
//! same length, and every record the same number of feature lines. Records
//! with features build a featurized (3-D) array whose tracks partition
//! exactly like the primary sequence.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::Result;
use flate2::read::GzDecoder;
use thiserror::Error;

use crate::array::{AlignmentArray, ArrayError};
use crate::vectorize::{partition_like, vectorize};

#[derive(Debug, Error)]
pub enum CfaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("record '{name}': lines have unequal lengths")]
    UnevenRecord { name: String },
    #[error("record '{name}' has {found} feature lines, expected {expected}")]
    FeatureCount {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("sequence data before the first header")]
    MissingHeader,
    #[error("Empty file or no sequences found")]
    EmptyFile,
}

/// CFA reader producing `(names, AlignmentArray)` pairs.
pub struct CfaReader;

impl CfaReader {
    /// Read an alignment from a CFA file, gzipped or not.
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<(Vec<String>, AlignmentArray)> {
        let file = File::open(&path)?;
        let path_str = path.as_ref().to_string_lossy();

        if path_str.ends_with(".gz") {
            Self::read_from(BufReader::new(GzDecoder::new(file)))
        } else {
            Self::read_from(BufReader::new(file))
        }
    }

    /// Read an alignment from any readable source.
    pub fn read_from<R: Read>(reader: R) -> Result<(Vec<String>, AlignmentArray)> {
        let mut records: Vec<(String, Vec<String>)> = Vec::new();
        let mut current: Option<(String, Vec<String>)> = None;

        for line in BufReader::new(reader).lines() {
            let line = line.map_err(CfaError::Io)?;
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            if let Some(name) = line.strip_prefix('>') {
                if let Some(record) = current.take() {
                    records.push(record);
                }
                current = Some((name.trim().to_string(), Vec::new()));
            } else {
                match current.as_mut() {
                    Some((_, lines)) => lines.push(line.to_string()),
                    None => return Err(CfaError::MissingHeader.into()),
                }
            }
        }
        if let Some(record) = current.take() {
            records.push(record);
        }
        // headers without sequence lines are skipped, like the FASTA reader
        records.retain(|(_, lines)| !lines.is_empty());
        if records.is_empty() {
            return Err(CfaError::EmptyFile.into());
        }
        Self::build(records)
    }

    fn build(records: Vec<(String, Vec<String>)>) -> Result<(Vec<String>, AlignmentArray)> {
        let features = records[0].1.len() - 1;
        let mut names = Vec::with_capacity(records.len());
        let mut plain_rows = Vec::new();
        let mut featurized_rows = Vec::new();

        for (row, (name, lines)) in records.iter().enumerate() {
            if lines.iter().any(|line| line.len() != lines[0].len()) {
                return Err(CfaError::UnevenRecord { name: name.clone() }.into());
            }
            if lines.len() - 1 != features {
                return Err(CfaError::FeatureCount {
                    name: name.clone(),
                    expected: features,
                    found: lines.len() - 1,
                }
                .into());
            }

            let primary = vectorize(&lines[0], true)
                .map_err(|source| ArrayError::RowVectorize { row, source })?;
            if features == 0 {
                plain_rows.push(primary);
            } else {
                let mut tracks = Vec::with_capacity(features + 1);
                for feature_line in &lines[1..] {
                    tracks.push(partition_like(&primary, feature_line)?);
                }
                let n_columns = primary.len();
                let mut cells = Vec::with_capacity(n_columns);
                for column in 0..n_columns {
                    let mut stack = Vec::with_capacity(features + 1);
                    stack.push(primary[column].clone());
                    for track in &tracks {
                        stack.push(track[column].clone());
                    }
                    cells.push(stack);
                }
                featurized_rows.push(cells);
            }
            names.push(name.clone());
            if names.len() % 1000 == 0 {
                log::debug!("imported {} rows", names.len());
            }
        }

        let array = if features == 0 {
            AlignmentArray::from_cells(plain_rows)?
        } else {
            AlignmentArray::from_featurized(featurized_rows)?
        };
        Ok((names, array))
    }
}
