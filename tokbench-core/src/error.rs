//! Error Taxonomy
//!
//! Malformed collaborator input is fatal: a run sample missing a required
//! signal or a dataset without usable rows cannot be repaired downstream,
//! so the pipeline aborts instead of returning partial data.

use thiserror::Error;

/// Errors raised while turning collaborator input into typed samples.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Engine output did not contain a required field. The raw text is
    /// attached so the failing invocation can be inspected.
    #[error("failed to parse {field} from engine output\n{raw}")]
    MalformedOutput {
        /// Which required signal was missing (`engine`, `init_ms`, or
        /// "no feature lines").
        field: &'static str,
        /// Full raw output of the invocation.
        raw: String,
    },

    /// Dataset file could not be read.
    #[error("failed to read dataset {path}: {source}")]
    DatasetIo {
        /// Path as given by the caller.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A dataset line had a category but an empty text column.
    #[error("dataset line {line} has empty text")]
    EmptyDatasetText {
        /// 1-based line number in the file.
        line: usize,
    },

    /// The dataset contained no rows after stripping comments and blanks.
    #[error("dataset has no usable rows")]
    EmptyDataset,

    /// A category filter matched nothing.
    #[error("dataset category '{category}' produced zero rows")]
    EmptyCategoryFilter {
        /// The requested category.
        category: String,
    },
}
