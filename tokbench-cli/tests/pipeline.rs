//! Integration tests for the tokbench pipeline
//!
//! These exercise the end-to-end flow the CLI drives: raw engine output
//! through parsing, aggregation, and bootstrap estimation on the
//! throughput track, and dataset + structural dumps through scoring on
//! the parity track.

use clap::Parser;
use std::io::Write as _;
use tokbench_cli::{BenchSettings, Cli, Commands, TokbenchConfig};
use tokbench_core::{parse_dataset, parse_run_output};
use tokbench_parity::{parse_structural_rows, score};
use tokbench_report::{
    render_parity_markdown, ParityReport,
};
use tokbench_stats::{aggregate, common_features, estimate_ratio, Decision};

fn engine_output(engine: &str, tokenize: f64, split: f64) -> String {
    format!(
        "engine={engine}\n\
         init_ms=15.0\n\
         feature=tokenize avg_ms=0.2 calls_per_sec={tokenize} sink=4242 iters=5000\n\
         feature=split_sents avg_ms=0.1 calls_per_sec={split} sink=1111 iters=5000\n"
    )
}

/// Parse repeated interleaved runs, aggregate, and estimate: the clear
/// 2:1 case must come out robust with a ratio near 2.0.
#[test]
fn test_throughput_track_end_to_end() {
    let outputs = [
        engine_output("ref", 100.0, 1000.0),
        engine_output("cand", 50.0, 1000.0),
        engine_output("cand", 51.0, 1010.0),
        engine_output("ref", 102.0, 990.0),
        engine_output("ref", 98.0, 1005.0),
        engine_output("cand", 49.0, 995.0),
    ];
    let samples: Vec<_> = outputs
        .iter()
        .map(|o| parse_run_output(o).unwrap())
        .collect();

    let engines = aggregate(&samples);
    assert_eq!(engines.len(), 2);

    let reference = &engines["ref"];
    let candidate = &engines["cand"];
    let common = common_features(reference, candidate);
    assert_eq!(common, vec!["tokenize", "split_sents"]);

    let estimate = estimate_ratio(
        &reference.features["tokenize"].throughput_per_sec,
        &candidate.features["tokenize"].throughput_per_sec,
        500,
        0.05,
    );
    assert!((estimate.ratio - 2.0).abs() < 0.1);
    assert_eq!(estimate.decision, Decision::RobustReferenceFaster);

    let close = estimate_ratio(
        &reference.features["split_sents"].throughput_per_sec,
        &candidate.features["split_sents"].throughput_per_sec,
        500,
        0.05,
    );
    assert_eq!(close.decision, Decision::PracticallyEquivalent);
}

/// Aggregation must not care how the external scheduler interleaved the
/// engines.
#[test]
fn test_aggregate_interleaving_invariance() {
    let a = parse_run_output(&engine_output("ref", 100.0, 1000.0)).unwrap();
    let b = parse_run_output(&engine_output("ref", 102.0, 990.0)).unwrap();
    let c = parse_run_output(&engine_output("cand", 50.0, 500.0)).unwrap();
    let d = parse_run_output(&engine_output("cand", 51.0, 505.0)).unwrap();

    let alternating = aggregate(&[a.clone(), c.clone(), b.clone(), d.clone()]);
    let blocked = aggregate(&[a.clone(), b.clone(), c.clone(), d.clone()]);
    let reversed = aggregate(&[c, d, a, b]);

    assert_eq!(alternating, blocked);
    assert_eq!(alternating, reversed);
}

/// The estimator must be bit-identical across calls (fixed seed).
#[test]
fn test_estimator_determinism() {
    let reference = vec![100.0, 102.0, 98.0, 101.0, 99.0];
    let candidate = vec![97.0, 99.0, 103.0, 100.0, 101.0];
    let first = estimate_ratio(&reference, &candidate, 2000, 0.05);
    let second = estimate_ratio(&reference, &candidate, 2000, 0.05);
    assert_eq!(first, second);
}

/// Parity track: dataset TSV plus two NDJSON dumps through the scorer.
#[test]
fn test_parity_track_end_to_end() {
    let rows = parse_dataset("news\t아버지가 방에 들어가신다.\ndefault\tabc\n").unwrap();

    // The reference dumps byte offsets for row 0; the candidate uses
    // character offsets. Both segment row 1 identically.
    let reference_ndjson = concat!(
        r#"{"index":0,"category":"news","text":"","tokens":[{"form":"아버지가","tag":"NNG","start":0,"len":12}],"sents":[[0,36]]}"#,
        "\n",
        r#"{"index":1,"category":"default","text":"","tokens":[{"form":"abc","tag":"NNG","start":0,"len":3}],"sents":[[0,3]]}"#,
        "\n",
    );
    let candidate_ndjson = concat!(
        r#"{"index":0,"category":"news","text":"","tokens":[{"form":"아버지가","tag":"NNG","start":0,"len":4}],"sents":[[0,14]]}"#,
        "\n",
        r#"{"index":1,"category":"default","text":"","tokens":[{"form":"abc","tag":"NNG","start":0,"len":3}],"sents":[[0,3]]}"#,
        "\n",
    );

    let reference = parse_structural_rows(reference_ndjson).unwrap();
    let candidate = parse_structural_rows(candidate_ndjson).unwrap();
    let result = score(&rows, &reference, &candidate, 8).unwrap();

    // Byte offsets normalize to character offsets, so both rows agree.
    assert_eq!(result.rows, 2);
    assert_eq!(result.exact_token_seq_matches, 2);
    assert_eq!(result.exact_sentence_matches, 2);
    assert!((result.boundary.f1 - 1.0).abs() < f64::EPSILON);
    assert!((result.full_identity.f1 - 1.0).abs() < f64::EPSILON);
    assert!(result.confusions.is_empty());

    let report = ParityReport {
        reference_id: "ref".to_string(),
        candidate_id: "cand".to_string(),
        dataset_path: "inline".to_string(),
        result,
    };
    let markdown = render_parity_markdown(&report);
    assert!(markdown.contains("Exact token-sequence match rate | 2/2"));
    assert!(markdown.contains("- No mismatches detected."));
}

/// Metric ranges hold even under total disagreement.
#[test]
fn test_parity_metric_ranges() {
    let rows = parse_dataset("default\tabcd\n").unwrap();
    let reference = parse_structural_rows(
        r#"{"tokens":[{"form":"abcd","tag":"NNG","start":0,"len":4}],"sents":[[0,4]]}"#,
    )
    .unwrap();
    let candidate = parse_structural_rows(
        r#"{"tokens":[{"form":"ab","tag":"VV","start":0,"len":2},{"form":"cd","tag":"VV","start":2,"len":2}],"sents":[[0,2],[2,4]]}"#,
    )
    .unwrap();
    let result = score(&rows, &reference, &candidate, 8).unwrap();

    for metrics in [result.boundary, result.full_identity] {
        assert!((0.0..=1.0).contains(&metrics.precision));
        assert!((0.0..=1.0).contains(&metrics.recall));
        assert!((0.0..=1.0).contains(&metrics.f1));
    }
    // Zero precision and recall must yield F1 = 0, not NaN.
    assert!((result.boundary.f1 - 0.0).abs() < f64::EPSILON);
    assert!(result.boundary.f1.is_finite());
    assert_eq!(result.examples.len(), 1);
}

/// CLI parsing resolves flags over config defaults.
#[test]
fn test_bench_settings_resolution() {
    let cli = Cli::try_parse_from([
        "tokbench",
        "bench",
        "--reference-cmd",
        "./ref --bench",
        "--candidate-cmd",
        "./cand --bench",
        "--repeats",
        "5",
        "--engine-order",
        "candidate-first",
    ])
    .unwrap();
    let Commands::Bench(args) = cli.command else {
        panic!("expected bench subcommand");
    };
    let settings = BenchSettings::resolve(args, &TokbenchConfig::default()).unwrap();
    assert_eq!(settings.reference.id, "reference");
    assert_eq!(settings.candidate.id, "candidate");
    assert_eq!(settings.repeats, 5);
    assert_eq!(settings.engine_order.as_str(), "candidate-first");
    assert_eq!(settings.bootstrap_samples, 2000);
    assert_eq!(settings.reference.argv, vec!["./ref", "--bench"]);
}

/// Missing engine commands fail resolution instead of running.
#[test]
fn test_bench_settings_require_commands() {
    let cli = Cli::try_parse_from(["tokbench", "bench", "--repeats", "2"]).unwrap();
    let Commands::Bench(args) = cli.command else {
        panic!("expected bench subcommand");
    };
    assert!(BenchSettings::resolve(args, &TokbenchConfig::default()).is_err());
}

/// Dataset files on disk feed the parity loader.
#[test]
fn test_dataset_file_roundtrip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "# corpus\nnews\tfirst row\nweb\tsecond row\n").unwrap();
    let rows = tokbench_core::load_dataset_rows(file.path()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].category, "news");

    let digest = tokbench_core::dataset_digest(file.path()).unwrap();
    assert_eq!(digest.len(), 64);
}
