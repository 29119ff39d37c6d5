//! Flat-text exporters for alignment arrays.
//!
//! All exporters consume a name list and an array without mutating either,
//! and require a plain (2-D) array. FASTA output discards the case
//! encoding; CFA output preserves it verbatim, so a CFA round trip through
//! the reader reproduces the array exactly.

use std::io::Write;

use thiserror::Error;

use crate::array::{AlignmentArray, ArrayError};
use crate::types::GAP;

/// Errors from serializing alignment arrays.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{names} names for {rows} sequence rows")]
    NameCount { names: usize, rows: usize },
    #[error(transparent)]
    Array(#[from] ArrayError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

fn checked_rows<'a, N: AsRef<str>>(
    names: &[N],
    array: &'a AlignmentArray,
) -> ExportResult<&'a [Vec<String>]> {
    let rows = array.plain_rows()?;
    if names.len() != rows.len() {
        return Err(ExportError::NameCount {
            names: names.len(),
            rows: rows.len(),
        });
    }
    Ok(rows)
}

/// Write aligned FASTA: per row, only the position characters (gaps
/// included) in upper case. Insertion runs are omitted entirely, so every
/// emitted sequence has the same length — one character per position
/// column.
pub fn to_fasta<N: AsRef<str>, W: Write>(
    names: &[N],
    array: &AlignmentArray,
    out: &mut W,
) -> ExportResult<()> {
    let rows = checked_rows(names, array)?;
    for (name, row) in names.iter().zip(rows) {
        let sequence: String = row
            .iter()
            .flat_map(|cell| cell.chars())
            .filter(|c| !c.is_ascii_lowercase())
            .collect();
        writeln!(out, ">{}", name.as_ref())?;
        writeln!(out, "{}\n", sequence)?;
    }
    Ok(())
}

/// Write ungapped FASTA: every residue of every row (insertions included)
/// upper-cased, gaps dropped. The case encoding is discarded.
pub fn to_fasta_ungapped<N: AsRef<str>, W: Write>(
    names: &[N],
    array: &AlignmentArray,
    out: &mut W,
) -> ExportResult<()> {
    let rows = checked_rows(names, array)?;
    for (name, row) in names.iter().zip(rows) {
        let sequence: String = row
            .iter()
            .flat_map(|cell| cell.chars())
            .filter(|&c| c != GAP)
            .map(|c| c.to_ascii_uppercase())
            .collect();
        writeln!(out, ">{}", name.as_ref())?;
        writeln!(out, "{}\n", sequence)?;
    }
    Ok(())
}

/// Write CFA: the exact cell concatenation of every row, preserving the
/// position/insertion case encoding.
pub fn to_cfa<N: AsRef<str>, W: Write>(
    names: &[N],
    array: &AlignmentArray,
    out: &mut W,
) -> ExportResult<()> {
    let rows = checked_rows(names, array)?;
    for (name, row) in names.iter().zip(rows) {
        writeln!(out, ">{}", name.as_ref())?;
        writeln!(out, "{}\n", row.concat())?;
    }
    Ok(())
}

/// Write XMA: a block header naming the profile, one `$i=nres(npos)` record
/// per sequence over the span from the first to the last position column,
/// and the closing `_0].` marker.
pub fn to_xma<N: AsRef<str>, W: Write>(
    names: &[N],
    array: &AlignmentArray,
    head: &str,
    out: &mut W,
) -> ExportResult<()> {
    let rows = checked_rows(names, array)?;
    let mask = array.is_position_column();
    let n_positions = mask.iter().filter(|&&p| p).count();

    writeln!(
        out,
        "[0_(1)={}({}){{go=0,gx=0,pn=0.0,lf=0,rf=0}}:",
        head,
        rows.len()
    )?;
    writeln!(out, "({}){}\n", n_positions, "*".repeat(n_positions))?;

    // Trim flanking insertion columns: emit from the first to the last
    // position column.
    let first = mask.iter().position(|&p| p);
    let last = mask.iter().rposition(|&p| p);
    let span = match (first, last) {
        (Some(first), Some(last)) => first..last + 1,
        _ => 0..0,
    };

    for (index, (name, row)) in names.iter().zip(rows).enumerate() {
        let cells = &row[span.clone()];
        let n_residues = cells
            .iter()
            .flat_map(|cell| cell.chars())
            .filter(|&c| c != GAP)
            .count();
        writeln!(out, "${}={}({})", index + 1, n_residues, n_positions)?;
        writeln!(out, ">{}", name.as_ref())?;
        writeln!(out, "{{(){}()}}*\n", cells.concat())?;
    }
    write!(out, "_0].")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array() -> (Vec<String>, AlignmentArray) {
        let names = vec!["alpha".to_string(), "beta".to_string()];
        let array = AlignmentArray::from_rows(&names, &["A-gC", "ATgC"]).unwrap();
        (names, array)
    }

    #[test]
    fn fasta_strips_insertions_keeps_gaps() {
        let (names, array) = array();
        let mut out = Vec::new();
        to_fasta(&names, &array, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, ">alpha\nA-C\n\n>beta\nATC\n\n");
    }

    #[test]
    fn ungapped_fasta_uppercases_and_drops_gaps() {
        let (names, array) = array();
        let mut out = Vec::new();
        to_fasta_ungapped(&names, &array, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, ">alpha\nAGC\n\n>beta\nATGC\n\n");
    }

    #[test]
    fn cfa_preserves_encoding_verbatim() {
        let (names, array) = array();
        let mut out = Vec::new();
        to_cfa(&names, &array, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, ">alpha\nA-gC\n\n>beta\nATgC\n\n");
    }

    #[test]
    fn xma_counts_residues_and_positions() {
        let (names, array) = array();
        let mut out = Vec::new();
        to_xma(&names, &array, "profile", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("[0_(1)=profile(2){go=0,gx=0,pn=0.0,lf=0,rf=0}:\n(3)***\n"));
        // alpha carries A, g, C → 3 residues; beta A, T, g, C → 4
        assert!(text.contains("$1=3(3)\n>alpha\n{()A-gC()}*\n"), "{}", text);
        assert!(text.contains("$2=4(3)\n>beta\n{()ATgC()}*\n"), "{}", text);
        assert!(text.ends_with("_0]."));
    }

    #[test]
    fn exporters_reject_name_mismatch() {
        let (_, array) = array();
        let names = vec!["only-one".to_string()];
        let mut out = Vec::new();
        assert!(matches!(
            to_cfa(&names, &array, &mut out),
            Err(ExportError::NameCount { names: 1, rows: 2 })
        ));
    }

    #[test]
    fn exporters_reject_featurized_arrays() {
        let rows = vec![vec![vec!["A".to_string()], vec!["C".to_string()]]];
        let array = AlignmentArray::from_featurized(rows).unwrap();
        let names = vec!["one".to_string()];
        let mut out = Vec::new();
        assert!(matches!(
            to_fasta(&names, &array, &mut out),
            Err(ExportError::Array(ArrayError::UnsupportedDimension { .. }))
        ));
    }
}
