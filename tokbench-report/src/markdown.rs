//! Markdown Rendering
//!
//! Table-oriented markdown for human review. Layout mirrors the reports
//! the comparison harness publishes into benchmark logs: environment and
//! config provenance first, then throughput, stability, workload parity,
//! decisions, and startup latency.

use crate::report::{decision_label, BenchReport, ParityReport};
use tokbench_stats::{compute_percentile, cv_percent, median};

fn md_value(value: &str) -> String {
    let text = value.trim();
    if text.is_empty() {
        return "-".to_string();
    }
    text.replace('|', "\\|").replace('\n', " ")
}

fn md_opt(value: &Option<String>) -> String {
    match value {
        Some(v) => md_value(v),
        None => "-".to_string(),
    }
}

fn fmt_med_range(values: &[f64], digits: usize) -> String {
    if values.is_empty() {
        return "-".to_string();
    }
    let med = median(values);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    format!("{med:.digits$} [{min:.digits$}-{max:.digits$}]")
}

fn fmt_cv(values: &[f64]) -> String {
    format!("{:.2}%", cv_percent(values))
}

fn as_f64(values: &[u64]) -> Vec<f64> {
    values.iter().map(|&v| v as f64).collect()
}

/// Render the benchmark comparison report as markdown.
pub fn render_bench_markdown(report: &BenchReport) -> String {
    let mut lines: Vec<String> = Vec::new();
    let reference_id = &report.reference_id;
    let candidate_id = &report.candidate_id;

    let (Some(reference), Some(candidate)) = (report.reference(), report.candidate()) else {
        return format!(
            "no aggregated data for engines `{reference_id}` and `{candidate_id}`"
        );
    };

    let config = &report.meta.config;
    let environment = &report.meta.environment;

    lines.push(format!(
        "### Feature Benchmark Snapshot (median of {} runs, min-max + p95/CV shown)",
        config.repeats
    ));
    lines.push(String::new());
    lines.push("Benchmark environment:".to_string());
    lines.push(String::new());
    lines.push("| Item | Value |".to_string());
    lines.push("|---|---|".to_string());
    lines.push(format!(
        "| Timestamp (local) | {} |",
        md_value(&environment.timestamp_local)
    ));
    lines.push(format!("| OS | {} |", md_value(&environment.os)));
    lines.push(format!("| CPU | {} |", md_value(&environment.cpu_model)));
    let physical = environment
        .physical_cores
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string());
    lines.push(format!(
        "| Cores (physical/logical) | {}/{} |",
        physical, environment.logical_cores
    ));
    lines.push(format!("| Memory | {} |", md_value(&environment.memory)));
    lines.push(format!(
        "| Harness | tokbench {} |",
        md_value(&environment.harness_version)
    ));
    lines.push(format!(
        "| Git | `{}` ({}, dirty={}) |",
        md_opt(&environment.git_head),
        md_opt(&environment.git_branch),
        environment.git_dirty
    ));

    lines.push(String::new());
    lines.push("Benchmark config:".to_string());
    lines.push(String::new());
    lines.push("| Item | Value |".to_string());
    lines.push("|---|---|".to_string());
    lines.push(format!(
        "| reference_cmd | {} |",
        md_value(&config.reference_cmd)
    ));
    lines.push(format!(
        "| candidate_cmd | {} |",
        md_value(&config.candidate_cmd)
    ));
    lines.push(format!("| repeats | {} |", config.repeats));
    lines.push(format!("| engine_order | {} |", md_value(&config.engine_order)));
    lines.push(format!(
        "| sleep_between_engines_ms | {} |",
        config.sleep_between_engines_ms
    ));
    lines.push(format!(
        "| sleep_between_runs_ms | {} |",
        config.sleep_between_runs_ms
    ));
    lines.push(format!(
        "| sink_warning_threshold_pct | {:.1} |",
        config.sink_warning_threshold * 100.0
    ));
    lines.push(format!("| bootstrap_samples | {} |", config.bootstrap_samples));
    lines.push(format!(
        "| equivalence_band_pct | {:.1} |",
        config.equivalence_band * 100.0
    ));

    if let Some(dataset) = &config.dataset {
        lines.push(String::new());
        lines.push("Dataset profile:".to_string());
        lines.push(String::new());
        lines.push("| Item | Value |".to_string());
        lines.push("|---|---|".to_string());
        lines.push(format!("| path | {} |", md_value(&dataset.path)));
        lines.push(format!(
            "| category filter | {} |",
            md_value(&dataset.category_filter)
        ));
        lines.push(format!("| sha256 | `{}` |", md_value(&dataset.sha256)));
        lines.push(format!("| rows | {} |", dataset.audit.rows));
        lines.push(format!("| unique texts | {} |", dataset.audit.unique_texts));
        lines.push(format!(
            "| categories | {} |",
            dataset.audit.category_counts.len()
        ));
        let counts = dataset
            .audit
            .category_counts
            .iter()
            .map(|(name, count)| format!("{name}:{count}"))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("| category counts | {} |", md_value(&counts)));
        lines.push(format!(
            "| text length (char) | min={}, median={}, max={} |",
            dataset.audit.char_len_min, dataset.audit.char_len_median, dataset.audit.char_len_max
        ));
    }

    lines.push(String::new());
    lines.push("Throughput comparison (`calls_per_sec`, higher is better):".to_string());
    lines.push(String::new());
    lines.push(format!(
        "| Feature | `{reference_id}` | `{candidate_id}` | Relative (`{reference_id} / {candidate_id}`) | 95% CI (bootstrap) | P(`ratio > 1`) | `{reference_id}` CV | `{candidate_id}` CV |"
    ));
    lines.push("|---|---:|---:|---:|---:|---:|---:|---:|".to_string());
    for comparison in &report.comparisons {
        let feature = &comparison.feature;
        let (Some(ref_dist), Some(cand_dist)) = (
            reference.features.get(feature),
            candidate.features.get(feature),
        ) else {
            continue;
        };
        lines.push(format!(
            "| `{}` | {} | {} | {:.2}x | [{:.2}, {:.2}]x | {:.3} | {} | {} |",
            feature,
            fmt_med_range(&ref_dist.throughput_per_sec, 2),
            fmt_med_range(&cand_dist.throughput_per_sec, 2),
            comparison.observed_ratio,
            comparison.estimate.ci_low,
            comparison.estimate.ci_high,
            comparison.estimate.prob_ratio_gt_one,
            fmt_cv(&ref_dist.throughput_per_sec),
            fmt_cv(&cand_dist.throughput_per_sec),
        ));
    }

    lines.push(String::new());
    lines.push("Stability snapshot (`calls_per_sec` p95):".to_string());
    lines.push(String::new());
    lines.push(format!(
        "| Feature | `{reference_id}` p95 | `{candidate_id}` p95 |"
    ));
    lines.push("|---|---:|---:|".to_string());
    for comparison in &report.comparisons {
        let feature = &comparison.feature;
        let (Some(ref_dist), Some(cand_dist)) = (
            reference.features.get(feature),
            candidate.features.get(feature),
        ) else {
            continue;
        };
        lines.push(format!(
            "| `{}` | {:.2} | {:.2} |",
            feature,
            compute_percentile(&ref_dist.throughput_per_sec, 95.0),
            compute_percentile(&cand_dist.throughput_per_sec, 95.0),
        ));
    }

    lines.push(String::new());
    lines.push("Workload parity check (`sink`, should be near 1.0x):".to_string());
    lines.push(String::new());
    lines.push(format!(
        "Warning threshold: ±{:.1}% around 1.0x.",
        config.sink_warning_threshold * 100.0
    ));
    lines.push(String::new());
    lines.push(format!(
        "| Feature | `{reference_id}` sink | `{candidate_id}` sink | Sink ratio (`{reference_id} / {candidate_id}`) | Status |"
    ));
    lines.push("|---|---:|---:|---:|---|".to_string());
    for comparison in &report.comparisons {
        let feature = &comparison.feature;
        let (Some(ref_dist), Some(cand_dist)) = (
            reference.features.get(feature),
            candidate.features.get(feature),
        ) else {
            continue;
        };
        let status = if comparison.sink.flagged { "review" } else { "ok" };
        lines.push(format!(
            "| `{}` | {} | {} | {:.4}x | {} |",
            feature,
            fmt_med_range(&as_f64(&ref_dist.sink), 2),
            fmt_med_range(&as_f64(&cand_dist.sink), 2),
            comparison.sink.ratio,
            status,
        ));
    }
    let sink_warnings = report.sink_warnings();
    if !sink_warnings.is_empty() {
        let warning_list = sink_warnings
            .iter()
            .map(|f| format!("`{f}`"))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(String::new());
        lines.push(format!("Sink warning features: {warning_list}"));
    }

    lines.push(String::new());
    lines.push("Decision table (throughput ratio hypothesis):".to_string());
    lines.push(String::new());
    lines.push(format!(
        "Equivalence band: ±{:.1}% around 1.0x. Bootstrap samples: {}.",
        config.equivalence_band * 100.0,
        config.bootstrap_samples
    ));
    lines.push(String::new());
    lines.push("| Feature | Ratio | 95% CI | P(`ratio > 1`) | Decision |".to_string());
    lines.push("|---|---:|---:|---:|---|".to_string());
    for comparison in &report.comparisons {
        lines.push(format!(
            "| `{}` | {:.2}x | [{:.2}, {:.2}]x | {:.3} | {} |",
            comparison.feature,
            comparison.observed_ratio,
            comparison.estimate.ci_low,
            comparison.estimate.ci_high,
            comparison.estimate.prob_ratio_gt_one,
            decision_label(&comparison.estimate, reference_id, candidate_id),
        ));
    }

    lines.push(String::new());
    lines.push("Defensibility scorecard:".to_string());
    lines.push(String::new());
    lines.push("| Check | Status | Note |".to_string());
    lines.push("|---|---|---|".to_string());
    let status_repeats = if config.repeats >= 5 { "pass" } else { "warn" };
    lines.push(format!(
        "| Run count (`repeats >= 5`) | {} | current={} |",
        status_repeats, config.repeats
    ));
    let status_order = if config.engine_order == "alternate" {
        "pass"
    } else {
        "warn"
    };
    lines.push(format!(
        "| Order bias control (`engine_order=alternate`) | {} | current={} |",
        status_order,
        md_value(&config.engine_order)
    ));
    let status_sink = if sink_warnings.is_empty() { "pass" } else { "warn" };
    lines.push(format!(
        "| Workload parity (`sink`) | {} | warnings={} |",
        status_sink,
        sink_warnings.len()
    ));
    let status_bootstrap = if config.bootstrap_samples >= 1000 {
        "pass"
    } else {
        "warn"
    };
    lines.push(format!(
        "| CI robustness (`bootstrap_samples >= 1000`) | {} | current={} |",
        status_bootstrap, config.bootstrap_samples
    ));
    let status_dirty = if environment.git_dirty { "warn" } else { "pass" };
    lines.push(format!(
        "| Clean git tree | {} | dirty={} |",
        status_dirty, environment.git_dirty
    ));

    lines.push(String::new());
    lines.push("Startup (`init_ms`, lower is better):".to_string());
    lines.push(String::new());
    lines.push(format!(
        "| Init path | `{reference_id}` | `{candidate_id}` | `{reference_id}` CV | `{candidate_id}` CV |"
    ));
    lines.push("|---|---:|---:|---:|---:|".to_string());
    lines.push(format!(
        "| engine init | {} ms | {} ms | {} | {} |",
        fmt_med_range(&reference.init_latency_ms, 3),
        fmt_med_range(&candidate.init_latency_ms, 3),
        fmt_cv(&reference.init_latency_ms),
        fmt_cv(&candidate.init_latency_ms),
    ));

    if !report.reference_only.is_empty() {
        lines.push(String::new());
        lines.push("Reference-only benchmark features:".to_string());
        lines.push(String::new());
        lines.push(format!("| Feature | `{reference_id}` | `{reference_id}` CV |"));
        lines.push("|---|---:|---:|".to_string());
        for feature in &report.reference_only {
            if let Some(dist) = reference.features.get(feature) {
                lines.push(format!(
                    "| `{}` | {} | {} |",
                    feature,
                    fmt_med_range(&dist.throughput_per_sec, 2),
                    fmt_cv(&dist.throughput_per_sec),
                ));
            }
        }
    }

    if !report.candidate_only.is_empty() {
        lines.push(String::new());
        lines.push("Candidate-only benchmark features:".to_string());
        lines.push(String::new());
        lines.push(format!("| Feature | `{candidate_id}` | `{candidate_id}` CV |"));
        lines.push("|---|---:|---:|".to_string());
        for feature in &report.candidate_only {
            if let Some(dist) = candidate.features.get(feature) {
                lines.push(format!(
                    "| `{}` | {} | {} |",
                    feature,
                    fmt_med_range(&dist.throughput_per_sec, 2),
                    fmt_cv(&dist.throughput_per_sec),
                ));
            }
        }
    }

    lines.join("\n")
}

/// Render the structural parity report as markdown.
pub fn render_parity_markdown(report: &ParityReport) -> String {
    let mut lines: Vec<String> = Vec::new();
    let result = &report.result;
    let reference_id = &report.reference_id;
    let candidate_id = &report.candidate_id;

    lines.push(format!(
        "# Structural Parity Report ({reference_id} vs {candidate_id})"
    ));
    lines.push(String::new());
    lines.push(format!("- dataset: `{}`", report.dataset_path));
    lines.push(format!("- rows: {}", result.rows));
    lines.push(String::new());
    lines.push("## Core Metrics".to_string());
    lines.push(String::new());
    lines.push("| Metric | Value |".to_string());
    lines.push("|---|---:|".to_string());
    lines.push(format!(
        "| Exact token-sequence match rate | {}/{} ({:.2}%) |",
        result.exact_token_seq_matches,
        result.rows,
        result.exact_token_seq_rate() * 100.0
    ));
    lines.push(format!(
        "| Exact sentence-boundary match rate | {}/{} ({:.2}%) |",
        result.exact_sentence_matches,
        result.rows,
        result.exact_sentence_rate() * 100.0
    ));
    lines.push(format!(
        "| Token boundary precision | {:.4} |",
        result.boundary.precision
    ));
    lines.push(format!(
        "| Token boundary recall | {:.4} |",
        result.boundary.recall
    ));
    lines.push(format!("| Token boundary F1 | {:.4} |", result.boundary.f1));
    lines.push(format!(
        "| Token (span+form+tag) precision | {:.4} |",
        result.full_identity.precision
    ));
    lines.push(format!(
        "| Token (span+form+tag) recall | {:.4} |",
        result.full_identity.recall
    ));
    lines.push(format!(
        "| Token (span+form+tag) F1 | {:.4} |",
        result.full_identity.f1
    ));
    lines.push(format!(
        "| Tag agreement on shared spans | {}/{} ({:.2}%) |",
        result.shared_tag_matches,
        result.shared_span_total,
        result.tag_agreement_rate() * 100.0
    ));
    lines.push(String::new());
    lines.push("## Error Taxonomy (row-level counts)".to_string());
    lines.push(String::new());
    lines.push("| Type | Rows |".to_string());
    lines.push("|---|---:|".to_string());
    lines.push(format!(
        "| sentence-boundary mismatch | {} |",
        result.rows_with_sentence_mismatch
    ));
    lines.push(format!(
        "| token-boundary mismatch | {} |",
        result.rows_with_span_mismatch
    ));
    lines.push(format!(
        "| tag mismatch on shared span | {} |",
        result.rows_with_tag_mismatch
    ));
    lines.push(String::new());
    lines.push("## Top Tag Confusions (shared spans)".to_string());
    lines.push(String::new());
    lines.push(format!("| {reference_id} tag | {candidate_id} tag | Count |"));
    lines.push("|---|---|---:|".to_string());
    for entry in result.top_confusions(12) {
        lines.push(format!(
            "| `{}` | `{}` | {} |",
            entry.reference_tag, entry.candidate_tag, entry.count
        ));
    }
    if result.confusions.is_empty() {
        lines.push("| - | - | 0 |".to_string());
    }
    lines.push(String::new());
    lines.push("## Category Breakdown (exact token-sequence match)".to_string());
    lines.push(String::new());
    lines.push("| Category | Matches | Total | Rate |".to_string());
    lines.push("|---|---:|---:|---:|".to_string());
    for (category, stats) in &result.category_stats {
        let rate = if stats.rows == 0 {
            0.0
        } else {
            stats.exact_token_seq_matches as f64 / stats.rows as f64
        };
        lines.push(format!(
            "| `{}` | {} | {} | {:.2}% |",
            category,
            stats.exact_token_seq_matches,
            stats.rows,
            rate * 100.0
        ));
    }
    lines.push(String::new());
    lines.push("## Representative Mismatch Examples".to_string());
    lines.push(String::new());
    if result.examples.is_empty() {
        lines.push("- No mismatches detected.".to_string());
    }
    for (index, example) in result.examples.iter().enumerate() {
        lines.push(format!(
            "{}. category=`{}`, row={}",
            index + 1,
            example.category,
            example.row_index
        ));
        lines.push(format!("   - text: {}", example.text));
        lines.push(format!("   - sentence_match: {}", example.sentence_match));
        lines.push(format!("   - span_match: {}", example.span_match));
        lines.push(format!(
            "   - tag_agreement_rate: {:.2}%",
            example.tag_agreement_rate * 100.0
        ));
        if !example.confusions.is_empty() {
            let confusion_list = example
                .confusions
                .iter()
                .map(|c| format!("{}->{} x{}", c.reference_tag, c.candidate_tag, c.count))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!("   - tag_confusions: {confusion_list}"));
        }
    }
    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{
        EnvironmentInfo, FeatureComparison, ReportMeta, RunConfigInfo, SinkParity,
    };
    use std::collections::BTreeMap;
    use tokbench_core::{parse_run_output, DatasetRow};
    use tokbench_parity::{score, RawToken, StructuralRow};
    use tokbench_stats::{aggregate, estimate_ratio, median};

    fn sample_output(engine: &str, throughput: f64) -> String {
        format!(
            "engine={engine}\ninit_ms=10.0\nfeature=tokenize avg_ms=0.5 calls_per_sec={throughput} sink=100 iters=50\n"
        )
    }

    fn bench_report() -> BenchReport {
        let runs = vec![
            parse_run_output(&sample_output("ref", 100.0)).unwrap(),
            parse_run_output(&sample_output("cand", 50.0)).unwrap(),
            parse_run_output(&sample_output("ref", 102.0)).unwrap(),
            parse_run_output(&sample_output("cand", 51.0)).unwrap(),
            parse_run_output(&sample_output("ref", 98.0)).unwrap(),
            parse_run_output(&sample_output("cand", 49.0)).unwrap(),
        ];
        let engines = aggregate(&runs);
        let ref_values = &engines["ref"].features["tokenize"].throughput_per_sec;
        let cand_values = &engines["cand"].features["tokenize"].throughput_per_sec;
        let estimate = estimate_ratio(ref_values, cand_values, 500, 0.05);
        let observed_ratio = median(ref_values) / median(cand_values);

        BenchReport {
            meta: ReportMeta {
                environment: EnvironmentInfo {
                    timestamp_local: "2026-01-01T00:00:00+00:00".to_string(),
                    os: "linux 6.1".to_string(),
                    cpu_model: "test-cpu".to_string(),
                    physical_cores: Some(4),
                    logical_cores: 8,
                    memory: "16.00 GiB".to_string(),
                    harness_version: "0.1.0".to_string(),
                    git_head: None,
                    git_branch: None,
                    git_dirty: false,
                },
                config: RunConfigInfo {
                    reference_cmd: "ref-engine --bench".to_string(),
                    candidate_cmd: "cand-engine --bench".to_string(),
                    repeats: 3,
                    engine_order: "alternate".to_string(),
                    sink_warning_threshold: 0.05,
                    bootstrap_samples: 500,
                    equivalence_band: 0.05,
                    ..Default::default()
                },
                schedule: Vec::new(),
            },
            raw_runs: Vec::new(),
            engines,
            reference_id: "ref".to_string(),
            candidate_id: "cand".to_string(),
            comparisons: vec![FeatureComparison {
                feature: "tokenize".to_string(),
                observed_ratio,
                estimate,
                sink: SinkParity {
                    reference_median: 100.0,
                    candidate_median: 100.0,
                    ratio: 1.0,
                    flagged: false,
                },
            }],
            reference_only: Vec::new(),
            candidate_only: Vec::new(),
        }
    }

    #[test]
    fn bench_markdown_contains_core_tables() {
        let markdown = render_bench_markdown(&bench_report());
        assert!(markdown.contains("Throughput comparison"));
        assert!(markdown.contains("| `tokenize` |"));
        assert!(markdown.contains("`ref` faster (robust)"));
        assert!(markdown.contains("Workload parity check"));
        assert!(markdown.contains("Defensibility scorecard"));
        assert!(markdown.contains("Startup (`init_ms`, lower is better):"));
        // No sink warnings, so the warning list is absent.
        assert!(!markdown.contains("Sink warning features"));
    }

    #[test]
    fn parity_markdown_reports_perfect_agreement() {
        let rows = vec![DatasetRow {
            category: "default".to_string(),
            text: "abc".to_string(),
        }];
        let out = StructuralRow {
            index: 0,
            category: String::new(),
            text: String::new(),
            tokens: vec![RawToken {
                form: "abc".to_string(),
                tag: "NNG".to_string(),
                start: 0,
                len: 3,
            }],
            sents: vec![(0, 3)],
        };
        let result = score(&rows, std::slice::from_ref(&out), std::slice::from_ref(&out), 8)
            .unwrap();
        let report = ParityReport {
            reference_id: "ref".to_string(),
            candidate_id: "cand".to_string(),
            dataset_path: "data.tsv".to_string(),
            result,
        };
        let markdown = render_parity_markdown(&report);
        assert!(markdown.contains("# Structural Parity Report (ref vs cand)"));
        assert!(markdown.contains("| Exact token-sequence match rate | 1/1 (100.00%) |"));
        assert!(markdown.contains("| Token boundary F1 | 1.0000 |"));
        assert!(markdown.contains("| - | - | 0 |"));
        assert!(markdown.contains("- No mismatches detected."));
    }
}
