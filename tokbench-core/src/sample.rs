//! Run Sample Model
//!
//! One `RunSample` per engine invocation. Samples are immutable once
//! parsed; the aggregation stage consumes them read-only.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One measured feature's result within a single engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSample {
    /// Average latency per call in milliseconds.
    pub avg_latency_ms: f64,
    /// Calls per second over the measured window.
    pub throughput_per_sec: f64,
    /// Workload checksum proving both engines processed equivalent input.
    pub sink: u64,
    /// Iterations executed for this feature.
    pub iterations: u64,
}

/// One full engine invocation: identity, startup latency, and the
/// per-feature measurements in the order the engine printed them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSample {
    /// Engine identity as printed by the invocation.
    pub engine_id: String,
    /// Initialization latency in milliseconds.
    pub init_latency_ms: f64,
    /// Feature name to measurement. Non-empty; every key appears in
    /// `feature_order`.
    pub features: BTreeMap<String, FeatureSample>,
    /// First-seen feature order, preserved for report stability.
    pub feature_order: Vec<String>,
}

impl RunSample {
    /// Look up one feature's sample.
    pub fn feature(&self, name: &str) -> Option<&FeatureSample> {
        self.features.get(name)
    }
}
