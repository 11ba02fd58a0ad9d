//! Dataset Loading
//!
//! Datasets are delimited text: one `category<TAB>text` row per line,
//! `#` comments and blank lines skipped. Rows without a tab get the
//! default category. The audit and digest feed report provenance so a
//! benchmark result can be traced back to the exact corpus it ran on.

use crate::error::CoreError;
use crate::DEFAULT_CATEGORY;
use fxhash::FxHashSet;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// One dataset row: a category label and the text both engines process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetRow {
    /// Category label, `default` when the line carried none.
    pub category: String,
    /// Row text, guaranteed non-empty.
    pub text: String,
}

/// Shape summary of the selected rows, rendered into reports.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetAudit {
    /// Number of rows after filtering.
    pub rows: usize,
    /// Distinct texts among them.
    pub unique_texts: usize,
    /// Row counts per category, sorted by category name.
    pub category_counts: BTreeMap<String, usize>,
    /// Shortest text length in characters.
    pub char_len_min: usize,
    /// Median text length in characters.
    pub char_len_median: usize,
    /// Longest text length in characters.
    pub char_len_max: usize,
}

/// Read and parse a dataset file.
pub fn load_dataset_rows(path: &Path) -> Result<Vec<DatasetRow>, CoreError> {
    let content = std::fs::read_to_string(path).map_err(|source| CoreError::DatasetIo {
        path: path.display().to_string(),
        source,
    })?;
    parse_dataset(&content)
}

/// Parse dataset content that has already been read.
pub fn parse_dataset(content: &str) -> Result<Vec<DatasetRow>, CoreError> {
    let mut rows = Vec::new();
    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (category, text) = match line.split_once('\t') {
            Some((category, text)) => {
                let category = category.trim();
                let category = if category.is_empty() {
                    DEFAULT_CATEGORY
                } else {
                    category
                };
                (category, text.trim())
            }
            None => (DEFAULT_CATEGORY, line),
        };
        if text.is_empty() {
            return Err(CoreError::EmptyDatasetText { line: index + 1 });
        }
        rows.push(DatasetRow {
            category: category.to_string(),
            text: text.to_string(),
        });
    }
    if rows.is_empty() {
        return Err(CoreError::EmptyDataset);
    }
    Ok(rows)
}

/// Keep only rows matching `category` (case-insensitive). An empty filter
/// keeps everything; a filter matching nothing is an error because the
/// caller asked for a slice that does not exist.
pub fn filter_rows(rows: &[DatasetRow], category: &str) -> Result<Vec<DatasetRow>, CoreError> {
    if category.is_empty() {
        return Ok(rows.to_vec());
    }
    let wanted = category.trim().to_lowercase();
    let filtered: Vec<DatasetRow> = rows
        .iter()
        .filter(|row| row.category.to_lowercase() == wanted)
        .cloned()
        .collect();
    if filtered.is_empty() {
        return Err(CoreError::EmptyCategoryFilter {
            category: category.to_string(),
        });
    }
    Ok(filtered)
}

/// Summarize the selected rows for report provenance.
pub fn audit_rows(rows: &[DatasetRow]) -> DatasetAudit {
    let mut category_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut unique_texts: FxHashSet<&str> = FxHashSet::default();
    let mut lengths: Vec<usize> = Vec::with_capacity(rows.len());
    for row in rows {
        *category_counts.entry(row.category.clone()).or_insert(0) += 1;
        unique_texts.insert(row.text.as_str());
        lengths.push(row.text.chars().count());
    }
    lengths.sort_unstable();
    let char_len_min = lengths.first().copied().unwrap_or(0);
    let char_len_max = lengths.last().copied().unwrap_or(0);
    let char_len_median = if lengths.is_empty() {
        0
    } else {
        lengths[lengths.len() / 2]
    };
    DatasetAudit {
        rows: rows.len(),
        unique_texts: unique_texts.len(),
        category_counts,
        char_len_min,
        char_len_median,
        char_len_max,
    }
}

/// SHA-256 digest of the dataset file, hex-encoded.
pub fn dataset_digest(path: &Path) -> Result<String, CoreError> {
    let content = std::fs::read(path).map_err(|source| CoreError::DatasetIo {
        path: path.display().to_string(),
        source,
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write as _;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    Ok(hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn parses_rows_and_defaults_category() {
        let content = "# comment\nnews\tSome headline text.\n\nBare line without category\n";
        let rows = parse_dataset(content).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].category, "news");
        assert_eq!(rows[1].category, DEFAULT_CATEGORY);
        assert_eq!(rows[1].text, "Bare line without category");
    }

    #[test]
    fn empty_text_is_rejected_with_line_number() {
        let content = "news\tok\nweb\t   \n";
        match parse_dataset(content) {
            Err(CoreError::EmptyDatasetText { line }) => assert_eq!(line, 2),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn comment_only_file_is_empty() {
        assert!(matches!(
            parse_dataset("# a\n# b\n"),
            Err(CoreError::EmptyDataset)
        ));
    }

    #[test]
    fn filter_is_case_insensitive() {
        let rows = parse_dataset("News\talpha\nweb\tbeta\n").unwrap();
        let filtered = filter_rows(&rows, "news").unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].text, "alpha");

        assert!(matches!(
            filter_rows(&rows, "missing"),
            Err(CoreError::EmptyCategoryFilter { .. })
        ));
    }

    #[test]
    fn audit_counts_categories_and_lengths() {
        let rows = parse_dataset("a\txx\na\tyyyy\nb\tzzzzzz\n").unwrap();
        let audit = audit_rows(&rows);
        assert_eq!(audit.rows, 3);
        assert_eq!(audit.unique_texts, 3);
        assert_eq!(audit.category_counts["a"], 2);
        assert_eq!(audit.category_counts["b"], 1);
        assert_eq!(audit.char_len_min, 2);
        assert_eq!(audit.char_len_median, 4);
        assert_eq!(audit.char_len_max, 6);
    }

    #[test]
    fn digest_is_stable_hex() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "a\tb\n").unwrap();
        let first = dataset_digest(file.path()).unwrap();
        let second = dataset_digest(file.path()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }
}
