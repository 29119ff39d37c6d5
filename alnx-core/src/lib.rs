//! AlnX Core Library
//!
//! Alignment arrays, position statistics, and flat-text import/export for
//! protein multiple sequence alignments.
//!
//! The central type is [`AlignmentArray`]: a rows × columns matrix of
//! string cells built by partitioning case-encoded sequences (upper-case
//! and `-` aligned, lower-case inserted). The array supports lossless
//! redefinition of the position/insertion boundary, and derives a
//! [`PositionArray`] for per-position frequency, entropy, divergence, and
//! consensus calculations against a [`Background`] distribution.

pub mod array;
pub mod export;
pub mod io;
pub mod position;
pub mod types;
pub mod vectorize;

// Re-export commonly used types and functions
pub use array::{AlignmentArray, AlignmentData, ArrayError, ArrayResult};
pub use export::{to_cfa, to_fasta, to_fasta_ungapped, to_xma, ExportError, ExportResult};
pub use io as formats;
pub use position::{PositionArray, StatsError, StatsResult, SymbolMatrix};
pub use types::{Background, BackgroundError, ColumnNumber, Residue, AMINO, AMINO_GAP, GAP};
pub use vectorize::{partition_like, vectorize, VectorizeError};

/// Version information for the AlnX core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
