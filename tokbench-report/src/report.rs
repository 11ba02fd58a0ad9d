//! Report Data Structures

use serde::Serialize;
use std::collections::BTreeMap;
use tokbench_core::{DatasetAudit, RunSample};
use tokbench_parity::{CategoryStats, ConfusionEntry, MismatchExample, ParityResult, PrfMetrics};
use tokbench_stats::{Decision, EngineDistribution, RatioEstimate};

/// Host and toolchain context the benchmark ran under.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EnvironmentInfo {
    /// Local timestamp with offset.
    pub timestamp_local: String,
    /// OS name and release.
    pub os: String,
    /// CPU model string, best effort.
    pub cpu_model: String,
    /// Physical core count when discoverable.
    pub physical_cores: Option<u32>,
    /// Logical core count.
    pub logical_cores: u32,
    /// Total memory, human-formatted, best effort.
    pub memory: String,
    /// Harness version (this crate's workspace version).
    pub harness_version: String,
    /// Git HEAD commit, when inside a repository.
    pub git_head: Option<String>,
    /// Git branch name.
    pub git_branch: Option<String>,
    /// Whether the working tree had uncommitted changes.
    pub git_dirty: bool,
}

/// Benchmark configuration captured for provenance.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunConfigInfo {
    /// Reference engine command line.
    pub reference_cmd: String,
    /// Candidate engine command line.
    pub candidate_cmd: String,
    /// Full benchmark rounds executed.
    pub repeats: usize,
    /// Interleaving policy name.
    pub engine_order: String,
    /// Sleep between the two engines within a repeat (ms).
    pub sleep_between_engines_ms: u64,
    /// Sleep between repeats (ms).
    pub sleep_between_runs_ms: u64,
    /// Allowed sink ratio deviation from 1.0 before a warning.
    pub sink_warning_threshold: f64,
    /// Bootstrap resample count.
    pub bootstrap_samples: usize,
    /// Practical-equivalence band around 1.0.
    pub equivalence_band: f64,
    /// Dataset provenance, when a dataset drove the workload.
    pub dataset: Option<DatasetProfile>,
}

/// Dataset provenance: where the rows came from and what they look like.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetProfile {
    /// Dataset file path.
    pub path: String,
    /// Category filter applied, `all` when none.
    pub category_filter: String,
    /// SHA-256 of the dataset file.
    pub sha256: String,
    /// Shape summary of the selected rows.
    pub audit: DatasetAudit,
}

/// Which engine ran when, for one repeat.
#[derive(Debug, Clone, Serialize)]
pub struct RepeatSchedule {
    /// 1-based repeat number.
    pub repeat: usize,
    /// Engine ids in execution order.
    pub order: Vec<String>,
}

/// One parsed engine invocation, kept raw for the JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    /// 1-based repeat number.
    pub repeat: usize,
    /// The parsed sample.
    pub sample: RunSample,
}

/// Report metadata block.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    /// Host and toolchain context.
    pub environment: EnvironmentInfo,
    /// Captured configuration.
    pub config: RunConfigInfo,
    /// Execution schedule actually used.
    pub schedule: Vec<RepeatSchedule>,
}

/// Sink (workload checksum) parity for one feature.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SinkParity {
    /// Median reference sink.
    pub reference_median: f64,
    /// Median candidate sink.
    pub candidate_median: f64,
    /// Reference over candidate; infinite when only the candidate is 0.
    pub ratio: f64,
    /// Whether the deviation exceeded the warning threshold.
    pub flagged: bool,
}

/// One common feature's comparative row.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureComparison {
    /// Feature name.
    pub feature: String,
    /// Observed median-over-median throughput ratio.
    pub observed_ratio: f64,
    /// Bootstrap estimate and decision.
    pub estimate: RatioEstimate,
    /// Workload checksum parity.
    pub sink: SinkParity,
}

/// Complete benchmark comparison report.
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    /// Metadata (environment, config, schedule).
    pub meta: ReportMeta,
    /// Every parsed run in execution order.
    pub raw_runs: Vec<RunRecord>,
    /// Aggregated per-engine distributions.
    pub engines: BTreeMap<String, EngineDistribution>,
    /// Reference engine id.
    pub reference_id: String,
    /// Candidate engine id.
    pub candidate_id: String,
    /// Per-feature comparisons over common features, in display order.
    pub comparisons: Vec<FeatureComparison>,
    /// Features only the reference engine reported.
    pub reference_only: Vec<String>,
    /// Features only the candidate engine reported.
    pub candidate_only: Vec<String>,
}

impl BenchReport {
    /// Features whose sink parity was flagged for review.
    pub fn sink_warnings(&self) -> Vec<&str> {
        self.comparisons
            .iter()
            .filter(|c| c.sink.flagged)
            .map(|c| c.feature.as_str())
            .collect()
    }

    /// Distribution for the reference engine, if any run parsed.
    pub fn reference(&self) -> Option<&EngineDistribution> {
        self.engines.get(&self.reference_id)
    }

    /// Distribution for the candidate engine, if any run parsed.
    pub fn candidate(&self) -> Option<&EngineDistribution> {
        self.engines.get(&self.candidate_id)
    }
}

/// Decision rendered with the engines' actual names.
pub fn decision_label(estimate: &RatioEstimate, reference_id: &str, candidate_id: &str) -> String {
    if estimate.is_insufficient() {
        return "insufficient data".to_string();
    }
    match estimate.decision {
        Decision::RobustReferenceFaster => format!("`{reference_id}` faster (robust)"),
        Decision::RobustCandidateFaster => format!("`{candidate_id}` faster (robust)"),
        Decision::PracticallyEquivalent => "practically equivalent".to_string(),
        Decision::LikelyReferenceFaster => format!("`{reference_id}` likely faster"),
        Decision::LikelyCandidateFaster => format!("`{candidate_id}` likely faster"),
        Decision::Inconclusive => "inconclusive".to_string(),
    }
}

/// Structural parity report.
#[derive(Debug, Clone, Serialize)]
pub struct ParityReport {
    /// Reference engine id.
    pub reference_id: String,
    /// Candidate engine id.
    pub candidate_id: String,
    /// Dataset file path.
    pub dataset_path: String,
    /// The scored result.
    pub result: ParityResult,
}

/// Aggregate totals with derived rates, for the JSON payload.
#[derive(Debug, Clone, Serialize)]
pub struct ParityTotals {
    /// Rows scored.
    pub rows: usize,
    /// Rows with exact token-sequence agreement.
    pub exact_token_seq_matches: usize,
    /// Exact token-sequence match rate.
    pub exact_token_seq_rate: f64,
    /// Rows with exact sentence-boundary agreement.
    pub exact_sentence_matches: usize,
    /// Exact sentence-boundary match rate.
    pub exact_sentence_rate: f64,
    /// Rows where sentence boundaries disagreed.
    pub rows_with_sentence_mismatch: usize,
    /// Rows where boundary span sets disagreed.
    pub rows_with_span_mismatch: usize,
    /// Rows with at least one tag confusion on a shared span.
    pub rows_with_tag_mismatch: usize,
    /// Boundary-only metrics.
    pub boundary: PrfMetrics,
    /// Full-identity metrics.
    pub full_identity: PrfMetrics,
    /// Boundary-shared spans considered for tag agreement.
    pub shared_span_total: usize,
    /// Shared spans whose tags agreed.
    pub shared_tag_matches: usize,
    /// Tag agreement rate over shared spans.
    pub tag_agreement_rate: f64,
}

/// Machine-readable parity payload.
#[derive(Debug, Clone, Serialize)]
pub struct ParityJson {
    /// Dataset file path.
    pub dataset: String,
    /// Reference engine id.
    pub reference_id: String,
    /// Candidate engine id.
    pub candidate_id: String,
    /// Aggregate totals with derived rates.
    pub totals: ParityTotals,
    /// Most frequent tag confusions (at most 32).
    pub confusion_top: Vec<ConfusionEntry>,
    /// Per-category tallies.
    pub category_stats: BTreeMap<String, CategoryStats>,
    /// Representative mismatch rows.
    pub examples: Vec<MismatchExample>,
}

impl ParityReport {
    /// Build the machine-readable payload.
    pub fn json_payload(&self) -> ParityJson {
        let result = &self.result;
        ParityJson {
            dataset: self.dataset_path.clone(),
            reference_id: self.reference_id.clone(),
            candidate_id: self.candidate_id.clone(),
            totals: ParityTotals {
                rows: result.rows,
                exact_token_seq_matches: result.exact_token_seq_matches,
                exact_token_seq_rate: result.exact_token_seq_rate(),
                exact_sentence_matches: result.exact_sentence_matches,
                exact_sentence_rate: result.exact_sentence_rate(),
                rows_with_sentence_mismatch: result.rows_with_sentence_mismatch,
                rows_with_span_mismatch: result.rows_with_span_mismatch,
                rows_with_tag_mismatch: result.rows_with_tag_mismatch,
                boundary: result.boundary,
                full_identity: result.full_identity,
                shared_span_total: result.shared_span_total,
                shared_tag_matches: result.shared_tag_matches,
                tag_agreement_rate: result.tag_agreement_rate(),
            },
            confusion_top: result.top_confusions(32).to_vec(),
            category_stats: result.category_stats.clone(),
            examples: result.examples.clone(),
        }
    }
}
