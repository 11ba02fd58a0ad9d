//! Sample Aggregation
//!
//! Merges repeated run samples, possibly interleaved across engines, into
//! per-engine distributions. Grouping is by engine id alone: whatever
//! order the external scheduler ran the engines in (alternating, blocked,
//! randomized), the aggregate is the same, which is what makes varying
//! that schedule safe.

use serde::Serialize;
use std::collections::BTreeMap;
use tokbench_core::RunSample;

/// Parallel observation sequences for one engine/feature pairing, one
/// entry per run that reported the feature, in observation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureDistribution {
    /// Average per-call latency observations (ms).
    pub avg_latency_ms: Vec<f64>,
    /// Throughput observations (calls per second).
    pub throughput_per_sec: Vec<f64>,
    /// Workload checksums, one per run.
    pub sink: Vec<u64>,
    /// Iteration counts, one per run.
    pub iterations: Vec<u64>,
}

impl FeatureDistribution {
    fn push(&mut self, sample: &tokbench_core::FeatureSample) {
        self.avg_latency_ms.push(sample.avg_latency_ms);
        self.throughput_per_sec.push(sample.throughput_per_sec);
        self.sink.push(sample.sink);
        self.iterations.push(sample.iterations);
    }

    /// Number of runs that observed this feature.
    pub fn observations(&self) -> usize {
        self.throughput_per_sec.len()
    }
}

/// All observations for one engine across repeated runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineDistribution {
    /// Initialization latency per run (ms).
    pub init_latency_ms: Vec<f64>,
    /// Per-feature observation sequences.
    pub features: BTreeMap<String, FeatureDistribution>,
    /// Display order: the first run's feature order, with features that
    /// only appear in later runs appended in their first-seen order.
    pub feature_order: Vec<String>,
}

/// Group run samples by engine id into per-engine distributions.
pub fn aggregate(samples: &[RunSample]) -> BTreeMap<String, EngineDistribution> {
    let mut by_engine: BTreeMap<String, EngineDistribution> = BTreeMap::new();
    for run in samples {
        let engine = by_engine.entry(run.engine_id.clone()).or_default();
        engine.init_latency_ms.push(run.init_latency_ms);
        for name in &run.feature_order {
            let Some(sample) = run.features.get(name) else {
                continue;
            };
            if !engine.features.contains_key(name) {
                engine.feature_order.push(name.clone());
            }
            engine.features.entry(name.clone()).or_default().push(sample);
        }
    }
    by_engine
}

/// Features observed at least once by both engines, in the reference
/// engine's display order. Features missing on either side are excluded
/// from comparison rather than zero-filled, so missing data cannot
/// distort a ratio.
pub fn common_features(
    reference: &EngineDistribution,
    candidate: &EngineDistribution,
) -> Vec<String> {
    reference
        .feature_order
        .iter()
        .filter(|name| {
            reference
                .features
                .get(*name)
                .is_some_and(|dist| dist.observations() > 0)
                && candidate
                    .features
                    .get(*name)
                    .is_some_and(|dist| dist.observations() > 0)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tokbench_core::FeatureSample;

    fn run(engine: &str, init: f64, features: &[(&str, f64)]) -> RunSample {
        let mut map = BTreeMap::new();
        let mut order = Vec::new();
        for (name, throughput) in features {
            map.insert(
                name.to_string(),
                FeatureSample {
                    avg_latency_ms: 1000.0 / throughput,
                    throughput_per_sec: *throughput,
                    sink: 7,
                    iterations: 100,
                },
            );
            order.push(name.to_string());
        }
        RunSample {
            engine_id: engine.to_string(),
            init_latency_ms: init,
            features: map,
            feature_order: order,
        }
    }

    #[test]
    fn groups_by_engine_only() {
        let samples = vec![
            run("ref", 10.0, &[("tokenize", 100.0)]),
            run("cand", 20.0, &[("tokenize", 50.0)]),
            run("ref", 11.0, &[("tokenize", 102.0)]),
            run("cand", 21.0, &[("tokenize", 51.0)]),
        ];
        let agg = aggregate(&samples);
        assert_eq!(agg.len(), 2);
        assert_eq!(agg["ref"].init_latency_ms, vec![10.0, 11.0]);
        assert_eq!(
            agg["ref"].features["tokenize"].throughput_per_sec,
            vec![100.0, 102.0]
        );
        assert_eq!(
            agg["cand"].features["tokenize"].throughput_per_sec,
            vec![50.0, 51.0]
        );
    }

    #[test]
    fn interleaving_does_not_change_aggregate() {
        let a = run("ref", 10.0, &[("tokenize", 100.0), ("split", 10.0)]);
        let b = run("ref", 11.0, &[("tokenize", 102.0), ("split", 11.0)]);
        let c = run("cand", 20.0, &[("tokenize", 50.0), ("split", 5.0)]);
        let d = run("cand", 21.0, &[("tokenize", 51.0), ("split", 6.0)]);

        // Alternating vs blocked vs candidate-first: per-engine relative
        // order is the same, so the aggregates must be identical.
        let alternating = aggregate(&[a.clone(), c.clone(), b.clone(), d.clone()]);
        let blocked = aggregate(&[a.clone(), b.clone(), c.clone(), d.clone()]);
        let candidate_first = aggregate(&[c, d, a, b]);
        assert_eq!(alternating, blocked);
        assert_eq!(alternating, candidate_first);
    }

    #[test]
    fn later_features_append_to_display_order() {
        let samples = vec![
            run("ref", 1.0, &[("tokenize", 100.0)]),
            run("ref", 1.0, &[("tokenize", 101.0), ("analyze", 30.0)]),
        ];
        let agg = aggregate(&samples);
        assert_eq!(agg["ref"].feature_order, vec!["tokenize", "analyze"]);
        assert_eq!(agg["ref"].features["analyze"].observations(), 1);
    }

    #[test]
    fn common_features_excludes_one_sided() {
        let reference = aggregate(&[run("ref", 1.0, &[("tokenize", 100.0), ("only_ref", 1.0)])]);
        let candidate = aggregate(&[run("cand", 1.0, &[("tokenize", 50.0), ("only_cand", 1.0)])]);
        let common = common_features(&reference["ref"], &candidate["cand"]);
        assert_eq!(common, vec!["tokenize"]);
    }
}
