//! Parity Errors

use thiserror::Error;

/// Errors raised while loading or aligning structural outputs.
#[derive(Debug, Error)]
pub enum ParityError {
    /// The three inputs (dataset, reference dump, candidate dump) must
    /// cover exactly the same rows; a mismatch means a collaborator bug
    /// upstream and cannot be repaired here.
    #[error("row count mismatch: dataset={dataset} reference={reference} candidate={candidate}")]
    RowCountMismatch {
        /// Dataset row count.
        dataset: usize,
        /// Reference dump row count.
        reference: usize,
        /// Candidate dump row count.
        candidate: usize,
    },

    /// A structural dump file could not be read.
    #[error("failed to read structural dump {path}: {source}")]
    DumpIo {
        /// Path as given by the caller.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A structural dump line was not valid JSON of the expected shape.
    #[error("malformed structural dump line {line}: {source}")]
    DumpParse {
        /// 1-based line number in the dump file.
        line: usize,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}
