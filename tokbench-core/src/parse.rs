//! Engine Output Parsing
//!
//! Engines report results as line-oriented text with three recognized
//! shapes:
//!
//! ```text
//! engine=<id>
//! init_ms=<float>
//! feature=<name> avg_ms=<float> calls_per_sec=<float> sink=<int> iters=<int>
//! ```
//!
//! Anything else (build noise, warm-up diagnostics, blank lines) is
//! ignored, which keeps the protocol forward-compatible with engines that
//! print extra output.

use crate::error::CoreError;
use crate::sample::{FeatureSample, RunSample};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static ENGINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^engine=(\S+)$").expect("engine pattern"));
static INIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^init_ms=([0-9.]+)$").expect("init pattern"));
static FEATURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^feature=(\S+)\s+avg_ms=([0-9.]+)\s+calls_per_sec=([0-9.]+)\s+sink=([0-9]+)\s+iters=([0-9]+)$",
    )
    .expect("feature pattern")
});

/// Parse one engine invocation's raw output into a [`RunSample`].
///
/// Line order does not matter, except that feature lines establish
/// `feature_order` in encounter order. A feature line repeating an
/// already-seen name overwrites the earlier measurement but keeps the
/// original position: engines may emit warm-up rows in the same format,
/// and the last measurement wins while first-seen order stays
/// authoritative for display.
///
/// Fails with [`CoreError::MalformedOutput`] when the engine identity,
/// initialization latency, or every feature line is missing. A partial
/// sample is never returned.
pub fn parse_run_output(output: &str) -> Result<RunSample, CoreError> {
    let mut engine_id: Option<String> = None;
    let mut init_latency_ms: Option<f64> = None;
    let mut features: BTreeMap<String, FeatureSample> = BTreeMap::new();
    let mut feature_order: Vec<String> = Vec::new();

    for raw_line in output.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = ENGINE_RE.captures(line) {
            engine_id = Some(caps[1].to_string());
            continue;
        }

        if let Some(caps) = INIT_RE.captures(line) {
            if let Ok(value) = caps[1].parse::<f64>() {
                init_latency_ms = Some(value);
            }
            continue;
        }

        if let Some(caps) = FEATURE_RE.captures(line) {
            let (Ok(avg_latency_ms), Ok(throughput_per_sec), Ok(sink), Ok(iterations)) = (
                caps[2].parse::<f64>(),
                caps[3].parse::<f64>(),
                caps[4].parse::<u64>(),
                caps[5].parse::<u64>(),
            ) else {
                // Numeric field overflowed or repeated dots; treat as an
                // unrecognized diagnostic line.
                continue;
            };
            let name = caps[1].to_string();
            if features
                .insert(
                    name.clone(),
                    FeatureSample {
                        avg_latency_ms,
                        throughput_per_sec,
                        sink,
                        iterations,
                    },
                )
                .is_none()
            {
                feature_order.push(name);
            }
        }
    }

    let engine_id = engine_id.ok_or_else(|| CoreError::MalformedOutput {
        field: "engine",
        raw: output.to_string(),
    })?;
    let init_latency_ms = init_latency_ms.ok_or_else(|| CoreError::MalformedOutput {
        field: "init_ms",
        raw: output.to_string(),
    })?;
    if features.is_empty() {
        return Err(CoreError::MalformedOutput {
            field: "no feature lines",
            raw: output.to_string(),
        });
    }

    Ok(RunSample {
        engine_id,
        init_latency_ms,
        features,
        feature_order,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_OUTPUT: &str = "\
engine=ref-engine
init_ms=12.5
feature=tokenize avg_ms=0.20 calls_per_sec=5000.0 sink=123456 iters=5000
feature=split_sents avg_ms=0.10 calls_per_sec=10000.0 sink=654321 iters=5000
";

    #[test]
    fn parses_complete_output() {
        let sample = parse_run_output(GOOD_OUTPUT).unwrap();
        assert_eq!(sample.engine_id, "ref-engine");
        assert!((sample.init_latency_ms - 12.5).abs() < f64::EPSILON);
        assert_eq!(sample.feature_order, vec!["tokenize", "split_sents"]);

        let tokenize = sample.feature("tokenize").unwrap();
        assert!((tokenize.throughput_per_sec - 5000.0).abs() < f64::EPSILON);
        assert_eq!(tokenize.sink, 123456);
        assert_eq!(tokenize.iterations, 5000);
    }

    #[test]
    fn ignores_unrecognized_lines() {
        let noisy = format!("Compiling engine v1.2\n{}\nwarning: slow build\n", GOOD_OUTPUT);
        let sample = parse_run_output(&noisy).unwrap();
        assert_eq!(sample.features.len(), 2);
    }

    #[test]
    fn duplicate_feature_overwrites_but_keeps_position() {
        let output = "\
engine=ref-engine
init_ms=1.0
feature=tokenize avg_ms=9.0 calls_per_sec=100.0 sink=1 iters=10
feature=split_sents avg_ms=0.5 calls_per_sec=2000.0 sink=2 iters=10
feature=tokenize avg_ms=0.2 calls_per_sec=5000.0 sink=3 iters=10
";
        let sample = parse_run_output(output).unwrap();
        // First-seen order is authoritative.
        assert_eq!(sample.feature_order, vec!["tokenize", "split_sents"]);
        // Last measurement wins.
        let tokenize = sample.feature("tokenize").unwrap();
        assert!((tokenize.throughput_per_sec - 5000.0).abs() < f64::EPSILON);
        assert_eq!(tokenize.sink, 3);
    }

    #[test]
    fn missing_engine_is_fatal() {
        let output = "init_ms=1.0\nfeature=t avg_ms=1.0 calls_per_sec=1.0 sink=1 iters=1\n";
        let err = parse_run_output(output).unwrap_err();
        match err {
            CoreError::MalformedOutput { field, raw } => {
                assert_eq!(field, "engine");
                assert!(raw.contains("init_ms=1.0"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_init_is_fatal() {
        let output = "engine=e\nfeature=t avg_ms=1.0 calls_per_sec=1.0 sink=1 iters=1\n";
        assert!(matches!(
            parse_run_output(output),
            Err(CoreError::MalformedOutput {
                field: "init_ms",
                ..
            })
        ));
    }

    #[test]
    fn missing_features_is_fatal() {
        let output = "engine=e\ninit_ms=2.0\n";
        assert!(matches!(
            parse_run_output(output),
            Err(CoreError::MalformedOutput {
                field: "no feature lines",
                ..
            })
        ));
    }
}
