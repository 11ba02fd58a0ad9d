//! Parity Scoring
//!
//! Aligns two engines' structural outputs row by row and accumulates
//! corpus-level agreement metrics. Boundary metrics ignore labels; full
//! identity requires span, surface form, and tag to agree; tag agreement
//! is computed only over spans both engines segment identically, which
//! isolates label disagreement from segmentation disagreement.

use crate::dump::StructuralRow;
use crate::error::ParityError;
use crate::offsets::normalize_row_offsets;
use fxhash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::collections::BTreeMap;
use tokbench_core::DatasetRow;

/// One token in half-open character offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenUnit {
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
    /// Surface form.
    pub form: String,
    /// Tag (label).
    pub tag: String,
}

/// Precision / recall / F1 triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrfMetrics {
    /// Intersection over reference totals.
    pub precision: f64,
    /// Intersection over candidate totals.
    pub recall: f64,
    /// Harmonic mean; 0.0 when precision + recall is 0.
    pub f1: f64,
}

impl PrfMetrics {
    fn from_counts(intersection: usize, reference_total: usize, candidate_total: usize) -> Self {
        let precision = safe_ratio(intersection as f64, reference_total as f64);
        let recall = safe_ratio(intersection as f64, candidate_total as f64);
        let f1 = safe_ratio(2.0 * precision * recall, precision + recall);
        PrfMetrics {
            precision,
            recall,
            f1,
        }
    }
}

/// One `(reference_tag, candidate_tag)` disagreement and how often it
/// occurred on boundary-shared spans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfusionEntry {
    /// Tag the reference engine assigned.
    pub reference_tag: String,
    /// Tag the candidate engine assigned.
    pub candidate_tag: String,
    /// Occurrence count.
    pub count: u64,
}

/// Per-category exact-match tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    /// Rows in the category.
    pub rows: usize,
    /// Rows whose token sequences matched exactly.
    pub exact_token_seq_matches: usize,
}

/// One representative mismatch row, bounded in number regardless of
/// dataset size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MismatchExample {
    /// Row index in the dataset.
    pub row_index: usize,
    /// Row category.
    pub category: String,
    /// Row text.
    pub text: String,
    /// Whether sentence boundaries matched exactly.
    pub sentence_match: bool,
    /// Whether boundary span sets matched exactly.
    pub span_match: bool,
    /// Tag agreement rate over this row's shared spans.
    pub tag_agreement_rate: f64,
    /// This row's top tag confusions (at most four).
    pub confusions: Vec<ConfusionEntry>,
}

/// Aggregate parity result over the whole dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParityResult {
    /// Rows scored.
    pub rows: usize,
    /// Rows with exact token-sequence agreement.
    pub exact_token_seq_matches: usize,
    /// Rows with exact sentence-boundary agreement.
    pub exact_sentence_matches: usize,
    /// Rows where sentence boundaries disagreed.
    pub rows_with_sentence_mismatch: usize,
    /// Rows where boundary span sets disagreed.
    pub rows_with_span_mismatch: usize,
    /// Rows with at least one tag confusion on a shared span.
    pub rows_with_tag_mismatch: usize,
    /// Boundary-only metrics over the union of all rows.
    pub boundary: PrfMetrics,
    /// Full-identity metrics over the union of all rows.
    pub full_identity: PrfMetrics,
    /// Boundary-shared spans considered for tag agreement.
    pub shared_span_total: usize,
    /// Shared spans whose tags agreed.
    pub shared_tag_matches: usize,
    /// All tag confusions, sorted by count descending then tag pair.
    pub confusions: Vec<ConfusionEntry>,
    /// Per-category exact-match tallies.
    pub category_stats: BTreeMap<String, CategoryStats>,
    /// Bounded representative mismatch rows, in scan order.
    pub examples: Vec<MismatchExample>,
}

impl ParityResult {
    /// Exact token-sequence match rate.
    pub fn exact_token_seq_rate(&self) -> f64 {
        safe_ratio(self.exact_token_seq_matches as f64, self.rows as f64)
    }

    /// Exact sentence-boundary match rate.
    pub fn exact_sentence_rate(&self) -> f64 {
        safe_ratio(self.exact_sentence_matches as f64, self.rows as f64)
    }

    /// Tag agreement rate over boundary-shared spans.
    pub fn tag_agreement_rate(&self) -> f64 {
        safe_ratio(self.shared_tag_matches as f64, self.shared_span_total as f64)
    }

    /// The `n` most frequent tag confusions.
    pub fn top_confusions(&self, n: usize) -> &[ConfusionEntry] {
        &self.confusions[..self.confusions.len().min(n)]
    }
}

fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn to_token_units(row: &StructuralRow) -> Vec<TokenUnit> {
    row.tokens
        .iter()
        .map(|t| TokenUnit {
            start: t.start,
            end: t.start + t.len,
            form: t.form.clone(),
            tag: t.tag.clone(),
        })
        .collect()
}

fn sorted_confusions(counter: FxHashMap<(String, String), u64>) -> Vec<ConfusionEntry> {
    let mut entries: Vec<ConfusionEntry> = counter
        .into_iter()
        .map(|((reference_tag, candidate_tag), count)| ConfusionEntry {
            reference_tag,
            candidate_tag,
            count,
        })
        .collect();
    entries.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.reference_tag.cmp(&b.reference_tag))
            .then_with(|| a.candidate_tag.cmp(&b.candidate_tag))
    });
    entries
}

/// Score two engines' structural outputs over the same dataset.
///
/// The three inputs must have identical row counts. Spans reported in
/// byte units are normalized to character units per row before any
/// comparison. `example_cap` bounds the representative mismatch list.
pub fn score(
    rows: &[DatasetRow],
    reference: &[StructuralRow],
    candidate: &[StructuralRow],
    example_cap: usize,
) -> Result<ParityResult, ParityError> {
    if rows.len() != reference.len() || rows.len() != candidate.len() {
        return Err(ParityError::RowCountMismatch {
            dataset: rows.len(),
            reference: reference.len(),
            candidate: candidate.len(),
        });
    }

    let mut exact_token_seq_matches = 0usize;
    let mut exact_sentence_matches = 0usize;
    let mut rows_with_sentence_mismatch = 0usize;
    let mut rows_with_span_mismatch = 0usize;
    let mut rows_with_tag_mismatch = 0usize;

    let mut boundary_intersection = 0usize;
    let mut boundary_reference_total = 0usize;
    let mut boundary_candidate_total = 0usize;

    let mut token_intersection = 0usize;
    let mut token_reference_total = 0usize;
    let mut token_candidate_total = 0usize;

    let mut shared_span_total = 0usize;
    let mut shared_tag_matches = 0usize;

    let mut confusion: FxHashMap<(String, String), u64> = FxHashMap::default();
    let mut category_stats: BTreeMap<String, CategoryStats> = BTreeMap::new();
    let mut examples: Vec<MismatchExample> = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let mut reference_tokens = to_token_units(&reference[index]);
        let mut reference_sents = reference[index].sents.clone();
        normalize_row_offsets(&row.text, &mut reference_tokens, &mut reference_sents);

        let mut candidate_tokens = to_token_units(&candidate[index]);
        let mut candidate_sents = candidate[index].sents.clone();
        normalize_row_offsets(&row.text, &mut candidate_tokens, &mut candidate_sents);

        let exact_token_seq = reference_tokens == candidate_tokens;
        let exact_sentence = reference_sents == candidate_sents;
        if exact_token_seq {
            exact_token_seq_matches += 1;
        }
        if exact_sentence {
            exact_sentence_matches += 1;
        } else {
            rows_with_sentence_mismatch += 1;
        }

        let stats = category_stats.entry(row.category.clone()).or_default();
        stats.rows += 1;
        if exact_token_seq {
            stats.exact_token_seq_matches += 1;
        }

        let reference_spans: FxHashSet<(usize, usize)> =
            reference_tokens.iter().map(|t| (t.start, t.end)).collect();
        let candidate_spans: FxHashSet<(usize, usize)> =
            candidate_tokens.iter().map(|t| (t.start, t.end)).collect();
        let mut shared_spans: Vec<(usize, usize)> = reference_spans
            .intersection(&candidate_spans)
            .copied()
            .collect();
        shared_spans.sort_unstable();

        let span_match = reference_spans == candidate_spans;
        if !span_match {
            rows_with_span_mismatch += 1;
        }
        boundary_intersection += shared_spans.len();
        boundary_reference_total += reference_spans.len();
        boundary_candidate_total += candidate_spans.len();

        let reference_identities: FxHashSet<(usize, usize, &str, &str)> = reference_tokens
            .iter()
            .map(|t| (t.start, t.end, t.form.as_str(), t.tag.as_str()))
            .collect();
        let candidate_identities: FxHashSet<(usize, usize, &str, &str)> = candidate_tokens
            .iter()
            .map(|t| (t.start, t.end, t.form.as_str(), t.tag.as_str()))
            .collect();
        token_intersection += reference_identities
            .intersection(&candidate_identities)
            .count();
        token_reference_total += reference_identities.len();
        token_candidate_total += candidate_identities.len();

        let reference_by_span: FxHashMap<(usize, usize), &str> = reference_tokens
            .iter()
            .map(|t| ((t.start, t.end), t.tag.as_str()))
            .collect();
        let candidate_by_span: FxHashMap<(usize, usize), &str> = candidate_tokens
            .iter()
            .map(|t| ((t.start, t.end), t.tag.as_str()))
            .collect();

        let mut row_shared_matches = 0usize;
        let mut row_confusion: FxHashMap<(String, String), u64> = FxHashMap::default();
        for span in &shared_spans {
            let (Some(left), Some(right)) =
                (reference_by_span.get(span), candidate_by_span.get(span))
            else {
                continue;
            };
            shared_span_total += 1;
            if left == right {
                shared_tag_matches += 1;
                row_shared_matches += 1;
            } else {
                *confusion
                    .entry((left.to_string(), right.to_string()))
                    .or_insert(0) += 1;
                *row_confusion
                    .entry((left.to_string(), right.to_string()))
                    .or_insert(0) += 1;
            }
        }
        let row_has_confusion = !row_confusion.is_empty();
        if row_has_confusion {
            rows_with_tag_mismatch += 1;
        }

        if (!exact_token_seq || !exact_sentence || row_has_confusion)
            && examples.len() < example_cap
        {
            let row_entries = sorted_confusions(row_confusion);
            examples.push(MismatchExample {
                row_index: index,
                category: row.category.clone(),
                text: row.text.clone(),
                sentence_match: exact_sentence,
                span_match,
                tag_agreement_rate: safe_ratio(
                    row_shared_matches as f64,
                    shared_spans.len() as f64,
                ),
                confusions: row_entries.into_iter().take(4).collect(),
            });
        }
    }

    Ok(ParityResult {
        rows: rows.len(),
        exact_token_seq_matches,
        exact_sentence_matches,
        rows_with_sentence_mismatch,
        rows_with_span_mismatch,
        rows_with_tag_mismatch,
        boundary: PrfMetrics::from_counts(
            boundary_intersection,
            boundary_reference_total,
            boundary_candidate_total,
        ),
        full_identity: PrfMetrics::from_counts(
            token_intersection,
            token_reference_total,
            token_candidate_total,
        ),
        shared_span_total,
        shared_tag_matches,
        confusions: sorted_confusions(confusion),
        category_stats,
        examples,
    })
}
