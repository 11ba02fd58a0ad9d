#![warn(missing_docs)]
//! Tokbench Statistical Engine
//!
//! Provides the throughput-comparison track:
//! - Percentile calculation with linear interpolation
//! - Aggregation of repeated run samples into per-engine distributions
//! - Seeded bootstrap confidence intervals for the throughput ratio with a
//!   practical-equivalence decision

mod aggregate;
mod bootstrap;
mod percentiles;

pub use aggregate::{aggregate, common_features, EngineDistribution, FeatureDistribution};
pub use bootstrap::{estimate_ratio, Decision, RatioEstimate};
pub use percentiles::{compute_percentile, cv_percent, median};

/// Fixed seed for the ratio bootstrap. Identical inputs must always yield
/// identical confidence bounds, so ambient randomness is off the table.
pub const RATIO_BOOTSTRAP_SEED: u64 = 42;

/// Default number of bootstrap resamples.
pub const DEFAULT_BOOTSTRAP_SAMPLES: usize = 2_000;

/// Default practical-equivalence band around a 1.0 ratio (±5%).
pub const DEFAULT_EQUIVALENCE_BAND: f64 = 0.05;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(RATIO_BOOTSTRAP_SEED, 42);
        assert_eq!(DEFAULT_BOOTSTRAP_SAMPLES, 2_000);
        assert!((DEFAULT_EQUIVALENCE_BAND - 0.05).abs() < f64::EPSILON);
    }
}
