#![warn(missing_docs)]
//! Tokbench Parity - Structural Output Comparison
//!
//! Scores two engines' tokenization and sentence segmentation of the same
//! dataset for structural agreement:
//! - exact token-sequence and sentence-boundary match rates
//! - boundary and full-identity precision / recall / F1 over the corpus
//! - tag confusion restricted to spans both engines segment identically
//! - a bounded list of representative mismatch rows

mod dump;
mod error;
mod offsets;
mod score;

pub use dump::{load_structural_file, parse_structural_rows, RawToken, StructuralRow};
pub use error::ParityError;
pub use offsets::{byte_to_char_index, normalize_row_offsets};
pub use score::{
    score, CategoryStats, ConfusionEntry, MismatchExample, ParityResult, PrfMetrics, TokenUnit,
};

/// Default cap on representative mismatch examples.
pub const DEFAULT_EXAMPLE_CAP: usize = 8;
