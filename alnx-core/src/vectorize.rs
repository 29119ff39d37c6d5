//! Sequence vectorizer: partition a case-encoded sequence into column slots.
//!
//! A raw annotated sequence mixes aligned characters (upper-case, `-`) with
//! insertion runs (lower-case). Vectorization splits it into a slot list in
//! which every aligned character occupies its own singleton slot and each
//! insertion run (possibly empty) is merged into a single slot, so the list
//! always alternates insertion, position, insertion, …, insertion. Stacking
//! slot lists of equal length yields the alignment matrix.

use thiserror::Error;

use crate::types::Residue;

/// Errors from partitioning annotated sequence text.
#[derive(Debug, Error)]
pub enum VectorizeError {
    #[error("unsupported character '{character}' at index {index}")]
    UnsupportedCharacter { index: usize, character: char },
    #[error("feature string is {found} characters long, expected {expected}")]
    FeatureLength { expected: usize, found: usize },
}

/// Partition `raw` into column slots.
///
/// With `keep_flanking`, the result starts and ends with an insertion slot
/// (empty when the sequence starts/ends on an aligned character), and
/// concatenating the slots reproduces `raw` exactly. Without it, the first
/// and last slot are dropped, discarding flanking insertion material.
///
/// ```
/// use alnx_core::vectorize::vectorize;
///
/// let slots = vectorize("ACgt-", true).unwrap();
/// assert_eq!(slots, vec!["", "A", "", "C", "gt", "-", ""]);
/// assert_eq!(slots.concat(), "ACgt-");
/// ```
///
/// # Errors
///
/// Fails on any character that is not an ASCII letter or `-`, reporting the
/// character index. Input alphabets are never silently coerced.
pub fn vectorize(raw: &str, keep_flanking: bool) -> Result<Vec<String>, VectorizeError> {
    let mut slots: Vec<String> = Vec::new();
    // The open insertion run; closed (possibly empty) by every aligned char.
    let mut run = String::new();

    for (index, character) in raw.chars().enumerate() {
        match Residue::classify(character)
            .ok_or(VectorizeError::UnsupportedCharacter { index, character })?
        {
            Residue::Insertion(c) => run.push(c),
            Residue::Position(c) => {
                slots.push(std::mem::take(&mut run));
                slots.push(c.to_string());
            }
        }
    }
    slots.push(run);

    if !keep_flanking {
        if slots.len() < 2 {
            return Ok(Vec::new());
        }
        slots.pop();
        slots.remove(0);
    }
    Ok(slots)
}

/// Partition `target` into slots of the same widths as `reference`.
///
/// Used for feature strings riding along a primary sequence in featurized
/// records: each feature character annotates the primary character at the
/// same offset, so the feature string partitions by the primary's slot
/// widths. `target` must be ASCII and exactly as long as the concatenated
/// reference slots.
pub fn partition_like(reference: &[String], target: &str) -> Result<Vec<String>, VectorizeError> {
    let expected: usize = reference.iter().map(|slot| slot.len()).sum();
    if target.len() != expected {
        return Err(VectorizeError::FeatureLength {
            expected,
            found: target.len(),
        });
    }
    let mut slots = Vec::with_capacity(reference.len());
    let bytes = target.as_bytes();
    let mut offset = 0;
    for slot in reference {
        let next = offset + slot.len();
        slots.push(String::from_utf8_lossy(&bytes[offset..next]).into_owned());
        offset = next;
    }
    Ok(slots)
}
