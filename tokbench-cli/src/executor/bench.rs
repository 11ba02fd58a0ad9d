//! Bench Pipeline
//!
//! Runs the full throughput comparison: engine invocations, sample
//! aggregation, per-feature bootstrap estimation (parallel across
//! features; the seeded estimator makes that safe), and report output.

use super::run::{collect_runs, EngineCommand};
use crate::config::TokbenchConfig;
use crate::metadata::collect_environment;
use crate::{BenchArgs, EngineOrder};
use anyhow::{bail, Context};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tokbench_core::{audit_rows, dataset_digest, filter_rows, load_dataset_rows};
use tokbench_report::{
    generate_json_report, render_bench_markdown, BenchReport, DatasetProfile, FeatureComparison,
    ReportMeta, RunConfigInfo, SinkParity,
};
use tokbench_stats::{aggregate, common_features, estimate_ratio, median, EngineDistribution};

/// Fully resolved settings for one bench invocation.
#[derive(Debug)]
pub struct BenchSettings {
    /// Reference engine.
    pub reference: EngineCommand,
    /// Candidate engine.
    pub candidate: EngineCommand,
    /// Full rounds to execute.
    pub repeats: usize,
    /// Interleaving policy.
    pub engine_order: EngineOrder,
    /// Sleep between engines within a repeat (ms).
    pub sleep_between_engines_ms: u64,
    /// Sleep between repeats (ms).
    pub sleep_between_runs_ms: u64,
    /// Sink ratio deviation before a warning.
    pub sink_warning_threshold: f64,
    /// Bootstrap resample count.
    pub bootstrap_samples: usize,
    /// Practical-equivalence band.
    pub equivalence_band: f64,
    /// Exit non-zero on sink warnings.
    pub strict_sink_check: bool,
    /// Dataset to profile into the report.
    pub dataset_tsv: Option<PathBuf>,
    /// Category filter for the dataset profile.
    pub dataset_category: String,
    /// Markdown output path.
    pub md_out: Option<PathBuf>,
    /// JSON output path.
    pub json_out: Option<PathBuf>,
}

impl BenchSettings {
    /// Merge CLI flags over config-file defaults and validate.
    pub fn resolve(args: BenchArgs, config: &TokbenchConfig) -> anyhow::Result<Self> {
        let reference_id = args
            .reference_id
            .unwrap_or_else(|| config.engines.reference_id.clone());
        let candidate_id = args
            .candidate_id
            .unwrap_or_else(|| config.engines.candidate_id.clone());
        let reference_cmd = args
            .reference_cmd
            .or_else(|| config.engines.reference_cmd.clone())
            .context("missing --reference-cmd (no [engines].reference_cmd in tokbench.toml)")?;
        let candidate_cmd = args
            .candidate_cmd
            .or_else(|| config.engines.candidate_cmd.clone())
            .context("missing --candidate-cmd (no [engines].candidate_cmd in tokbench.toml)")?;

        let engine_order = match args.engine_order {
            Some(order) => order,
            None => parse_engine_order(&config.bench.engine_order)?,
        };

        let settings = BenchSettings {
            reference: EngineCommand::new(&reference_id, &reference_cmd)?,
            candidate: EngineCommand::new(&candidate_id, &candidate_cmd)?,
            repeats: args.repeats.unwrap_or(config.bench.repeats),
            engine_order,
            sleep_between_engines_ms: args.sleep_between_engines_ms,
            sleep_between_runs_ms: args.sleep_between_runs_ms,
            sink_warning_threshold: args
                .sink_warning_threshold
                .unwrap_or(config.bench.sink_warning_threshold),
            bootstrap_samples: args
                .bootstrap_samples
                .unwrap_or(config.bench.bootstrap_samples),
            equivalence_band: args
                .equivalence_band
                .unwrap_or(config.bench.equivalence_band),
            strict_sink_check: args.strict_sink_check,
            dataset_tsv: args.dataset_tsv,
            dataset_category: args.dataset_category.unwrap_or_default(),
            md_out: args.md_out,
            json_out: args.json_out,
        };

        if settings.repeats == 0 {
            bail!("--repeats must be >= 1");
        }
        if settings.bootstrap_samples == 0 {
            bail!("--bootstrap-samples must be >= 1");
        }
        if settings.equivalence_band < 0.0 {
            bail!("--equivalence-band must be >= 0");
        }
        if settings.sink_warning_threshold < 0.0 {
            bail!("--sink-warning-threshold must be >= 0");
        }
        if settings.reference.id == settings.candidate.id {
            bail!(
                "reference and candidate must have distinct engine ids (both are '{}')",
                settings.reference.id
            );
        }
        Ok(settings)
    }
}

fn parse_engine_order(name: &str) -> anyhow::Result<EngineOrder> {
    match name {
        "alternate" => Ok(EngineOrder::Alternate),
        "reference-first" => Ok(EngineOrder::ReferenceFirst),
        "candidate-first" => Ok(EngineOrder::CandidateFirst),
        other => bail!("unknown engine_order '{other}' in tokbench.toml"),
    }
}

fn dataset_profile(settings: &BenchSettings) -> anyhow::Result<Option<DatasetProfile>> {
    let Some(path) = &settings.dataset_tsv else {
        return Ok(None);
    };
    let rows = load_dataset_rows(path)?;
    let selected = filter_rows(&rows, &settings.dataset_category)?;
    Ok(Some(DatasetProfile {
        path: path.display().to_string(),
        category_filter: if settings.dataset_category.is_empty() {
            "all".to_string()
        } else {
            settings.dataset_category.clone()
        },
        sha256: dataset_digest(path)?,
        audit: audit_rows(&selected),
    }))
}

fn as_f64(values: &[u64]) -> Vec<f64> {
    values.iter().map(|&v| v as f64).collect()
}

fn sink_parity(reference: &[u64], candidate: &[u64], threshold: f64) -> SinkParity {
    let reference_median = median(&as_f64(reference));
    let candidate_median = median(&as_f64(candidate));
    let ratio = if candidate_median == 0.0 {
        if reference_median == 0.0 {
            1.0
        } else {
            f64::INFINITY
        }
    } else {
        reference_median / candidate_median
    };
    let flagged = !ratio.is_finite() || (ratio - 1.0).abs() > threshold;
    SinkParity {
        reference_median,
        candidate_median,
        ratio,
        flagged,
    }
}

fn build_comparisons(
    reference: &EngineDistribution,
    candidate: &EngineDistribution,
    settings: &BenchSettings,
) -> Vec<FeatureComparison> {
    let features = common_features(reference, candidate);
    features
        .par_iter()
        .filter_map(|feature| {
            let ref_dist = reference.features.get(feature)?;
            let cand_dist = candidate.features.get(feature)?;
            let estimate = estimate_ratio(
                &ref_dist.throughput_per_sec,
                &cand_dist.throughput_per_sec,
                settings.bootstrap_samples,
                settings.equivalence_band,
            );
            let reference_median = median(&ref_dist.throughput_per_sec);
            let candidate_median = median(&cand_dist.throughput_per_sec);
            let observed_ratio = if candidate_median > 0.0 {
                reference_median / candidate_median
            } else {
                0.0
            };
            Some(FeatureComparison {
                feature: feature.clone(),
                observed_ratio,
                estimate,
                sink: sink_parity(
                    &ref_dist.sink,
                    &cand_dist.sink,
                    settings.sink_warning_threshold,
                ),
            })
        })
        .collect()
}

fn write_output(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
    println!("[written] {}", path.display());
    Ok(())
}

/// Execute the bench track end to end. Returns the process exit code.
pub fn run_bench(settings: BenchSettings) -> anyhow::Result<i32> {
    let dataset = dataset_profile(&settings)?;
    let collection = collect_runs(
        &settings.reference,
        &settings.candidate,
        settings.repeats,
        settings.engine_order,
        settings.sleep_between_engines_ms,
        settings.sleep_between_runs_ms,
    )?;

    let engines = aggregate(&collection.samples);
    let Some(reference_dist) = engines.get(&settings.reference.id) else {
        bail!("no runs aggregated for engine '{}'", settings.reference.id);
    };
    let Some(candidate_dist) = engines.get(&settings.candidate.id) else {
        bail!("no runs aggregated for engine '{}'", settings.candidate.id);
    };

    let comparisons = build_comparisons(reference_dist, candidate_dist, &settings);
    let reference_only: Vec<String> = reference_dist
        .feature_order
        .iter()
        .filter(|f| !candidate_dist.features.contains_key(*f))
        .cloned()
        .collect();
    let candidate_only: Vec<String> = candidate_dist
        .feature_order
        .iter()
        .filter(|f| !reference_dist.features.contains_key(*f))
        .cloned()
        .collect();

    let report = BenchReport {
        meta: ReportMeta {
            environment: collect_environment(),
            config: RunConfigInfo {
                reference_cmd: settings.reference.display(),
                candidate_cmd: settings.candidate.display(),
                repeats: settings.repeats,
                engine_order: settings.engine_order.to_string(),
                sleep_between_engines_ms: settings.sleep_between_engines_ms,
                sleep_between_runs_ms: settings.sleep_between_runs_ms,
                sink_warning_threshold: settings.sink_warning_threshold,
                bootstrap_samples: settings.bootstrap_samples,
                equivalence_band: settings.equivalence_band,
                dataset,
            },
            schedule: collection.schedule,
        },
        raw_runs: collection.records,
        engines,
        reference_id: settings.reference.id.clone(),
        candidate_id: settings.candidate.id.clone(),
        comparisons,
        reference_only,
        candidate_only,
    };

    let markdown = render_bench_markdown(&report);
    println!();
    println!("{markdown}");

    if let Some(md_out) = &settings.md_out {
        write_output(md_out, &format!("{markdown}\n"))?;
    }
    if let Some(json_out) = &settings.json_out {
        let json = generate_json_report(&report)?;
        write_output(json_out, &format!("{json}\n"))?;
    }

    let sink_warnings = report.sink_warnings();
    if settings.strict_sink_check && !sink_warnings.is_empty() {
        eprintln!(
            "strict sink check failed: {} exceeded threshold {:.1}%",
            sink_warnings.join(", "),
            settings.sink_warning_threshold * 100.0
        );
        return Ok(2);
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_parity_flags_deviation() {
        let ok = sink_parity(&[100, 100, 100], &[100, 100, 100], 0.05);
        assert!(!ok.flagged);
        assert!((ok.ratio - 1.0).abs() < f64::EPSILON);

        let off = sink_parity(&[110, 110, 110], &[100, 100, 100], 0.05);
        assert!(off.flagged);

        let zero_candidate = sink_parity(&[100], &[0], 0.05);
        assert!(zero_candidate.flagged);
        assert!(zero_candidate.ratio.is_infinite());

        let both_zero = sink_parity(&[0], &[0], 0.05);
        assert!(!both_zero.flagged);
        assert!((both_zero.ratio - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_engine_order_names() {
        assert_eq!(
            parse_engine_order("alternate").unwrap(),
            EngineOrder::Alternate
        );
        assert_eq!(
            parse_engine_order("candidate-first").unwrap(),
            EngineOrder::CandidateFirst
        );
        assert!(parse_engine_order("random").is_err());
    }
}
