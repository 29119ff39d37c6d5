//! File format I/O modules
//!
//! Readers for the flat-text alignment formats the array consumes. Both
//! honor the character-case encoding (upper-case and `-` aligned,
//! lower-case inserted) and hand raw strings to the array constructor,
//! which owns all structural validation.

pub mod cfa;
pub mod fasta;

pub use cfa::{CfaError, CfaReader};
pub use fasta::{FastaError, FastaReader};

use std::path::Path;

use anyhow::Result;

use crate::array::AlignmentArray;

/// Pick a reader from the file extension and parse.
///
/// `.cfa` (optionally gzipped) goes through the CFA reader, which also
/// understands feature-linked records; everything else is treated as
/// FASTA/A2M.
pub fn read_alignment_file<P: AsRef<Path>>(path: P) -> Result<(Vec<String>, AlignmentArray)> {
    let path_str = path.as_ref().to_string_lossy().to_lowercase();

    if path_str.ends_with(".cfa") || path_str.ends_with(".cfa.gz") {
        CfaReader::read_file(path)
    } else {
        FastaReader::read_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn dispatches_on_extension() {
        let mut a2m = tempfile::Builder::new().suffix(".a2m").tempfile().unwrap();
        writeln!(a2m, ">s1\nA-gC\n>s2\nATgC").unwrap();
        let (names, array) = read_alignment_file(a2m.path()).unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(array.n_columns(), 4);

        let mut cfa = tempfile::Builder::new().suffix(".cfa").tempfile().unwrap();
        writeln!(cfa, ">s1\nA-gC\n\n>s2\nATgC").unwrap();
        let (_, from_cfa) = read_alignment_file(cfa.path()).unwrap();
        assert_eq!(from_cfa, array);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_alignment_file(dir.path().join("absent.cfa")).is_err());
    }
}
