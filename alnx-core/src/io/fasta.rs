//! FASTA/A2M alignment reader
//!
//! Reads case-encoded alignment text using the needletail library, with
//! transparent gzip support. Records keep their original character case:
//! the position/insertion encoding is the whole point of the format, so
//! nothing here normalizes or validates residues — the array constructor
//! does that and reports the offending row.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Result;
use flate2::read::GzDecoder;
use needletail::{parse_fastx_file, parse_fastx_reader};
use thiserror::Error;

use crate::array::AlignmentArray;

#[derive(Debug, Error)]
pub enum FastaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Empty file or no sequences found")]
    EmptyFile,
}

/// FASTA/A2M reader producing `(names, AlignmentArray)` pairs.
pub struct FastaReader;

impl FastaReader {
    /// Read an alignment from a FASTA/A2M file, gzipped or not.
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<(Vec<String>, AlignmentArray)> {
        let path_str = path.as_ref().to_string_lossy();

        if path_str.ends_with(".gz") {
            let file = File::open(&path)?;
            let decoder = GzDecoder::new(file);
            Self::read_from(BufReader::new(decoder))
        } else {
            let mut reader =
                parse_fastx_file(&path).map_err(|e| FastaError::Parse(e.to_string()))?;
            let mut names = Vec::new();
            let mut raws = Vec::new();
            while let Some(record) = reader.next() {
                let record = record.map_err(|e| FastaError::Parse(e.to_string()))?;
                names.push(String::from_utf8_lossy(record.id()).to_string());
                raws.push(String::from_utf8_lossy(&record.seq()).to_string());
                if names.len() % 1000 == 0 {
                    log::debug!("imported {} rows", names.len());
                }
            }
            Self::finish(names, raws)
        }
    }

    /// Read an alignment from any readable source.
    pub fn read_from<R: std::io::Read + std::marker::Send + 'static>(
        reader: R,
    ) -> Result<(Vec<String>, AlignmentArray)> {
        let mut fastx_reader =
            parse_fastx_reader(reader).map_err(|e| FastaError::Parse(e.to_string()))?;
        let mut names = Vec::new();
        let mut raws = Vec::new();
        while let Some(record) = fastx_reader.next() {
            let record = record.map_err(|e| FastaError::Parse(e.to_string()))?;
            names.push(String::from_utf8_lossy(record.id()).to_string());
            raws.push(String::from_utf8_lossy(&record.seq()).to_string());
            if names.len() % 1000 == 0 {
                log::debug!("imported {} rows", names.len());
            }
        }
        Self::finish(names, raws)
    }

    fn finish(names: Vec<String>, raws: Vec<String>) -> Result<(Vec<String>, AlignmentArray)> {
        if names.is_empty() {
            return Err(FastaError::EmptyFile.into());
        }
        let array = AlignmentArray::from_rows(&names, &raws)?;
        log::debug!(
            "imported {} rows with {} columns",
            array.n_rows(),
            array.n_columns()
        );
        Ok((names, array))
    }
}
