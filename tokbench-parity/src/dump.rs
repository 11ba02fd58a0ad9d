//! Structural Dump Loading
//!
//! Engines dump one JSON object per line:
//!
//! ```text
//! {"index":0,"category":"news","text":"...",
//!  "tokens":[{"form":"...","tag":"NNG","start":0,"len":3}],
//!  "sents":[[0,12],[12,30]]}
//! ```
//!
//! Token offsets are `start` + `len`; sentence boundaries are `[begin,
//! end]` pairs. Either may be in byte or character units; normalization
//! happens at scoring time, once the row text is known.

use crate::error::ParityError;
use serde::Deserialize;
use std::path::Path;

/// One token as dumped by an engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawToken {
    /// Surface form.
    pub form: String,
    /// Tag (label) assigned by the engine.
    pub tag: String,
    /// Start offset in the engine's native unit.
    pub start: usize,
    /// Span length in the engine's native unit.
    pub len: usize,
}

/// One row of an engine's structural output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StructuralRow {
    /// Row index within the dataset, as recorded by the dumping engine.
    #[serde(default)]
    pub index: usize,
    /// Category copied through from the dataset.
    #[serde(default)]
    pub category: String,
    /// Row text copied through from the dataset.
    #[serde(default)]
    pub text: String,
    /// Ordered token list.
    pub tokens: Vec<RawToken>,
    /// Ordered sentence `[begin, end)` pairs.
    pub sents: Vec<(usize, usize)>,
}

/// Parse NDJSON structural rows from already-read content.
pub fn parse_structural_rows(content: &str) -> Result<Vec<StructuralRow>, ParityError> {
    let mut rows = Vec::new();
    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let row: StructuralRow =
            serde_json::from_str(line).map_err(|source| ParityError::DumpParse {
                line: index + 1,
                source,
            })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Read and parse one engine's structural dump file.
pub fn load_structural_file(path: &Path) -> Result<Vec<StructuralRow>, ParityError> {
    let content = std::fs::read_to_string(path).map_err(|source| ParityError::DumpIo {
        path: path.display().to_string(),
        source,
    })?;
    parse_structural_rows(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ndjson_rows() {
        let content = concat!(
            r#"{"index":0,"category":"news","text":"abc","tokens":[{"form":"abc","tag":"NNG","start":0,"len":3}],"sents":[[0,3]]}"#,
            "\n\n",
            r#"{"index":1,"category":"web","text":"de","tokens":[],"sents":[]}"#,
            "\n",
        );
        let rows = parse_structural_rows(content).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].tokens[0].form, "abc");
        assert_eq!(rows[0].sents, vec![(0, 3)]);
        assert!(rows[1].tokens.is_empty());
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let content = "{\"tokens\":[],\"sents\":[]}\nnot json\n";
        match parse_structural_rows(content) {
            Err(ParityError::DumpParse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
