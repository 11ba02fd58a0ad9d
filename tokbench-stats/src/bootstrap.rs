//! Bootstrap Ratio Estimation
//!
//! Estimates a confidence interval for `reference / candidate` throughput
//! by resampling both distributions and taking the ratio of resampled
//! medians. The RNG is seeded with a fixed constant: identical inputs
//! always produce bit-identical bounds, so reruns and cross-feature
//! parallelism cannot change a published decision.

use crate::percentiles::compute_percentile;
use crate::RATIO_BOOTSTRAP_SEED;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Verdict for one feature's throughput ratio against the equivalence
/// band. Ratios above 1.0 mean the reference engine is faster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Entire CI above the equivalence band.
    RobustReferenceFaster,
    /// Entire CI below the equivalence band.
    RobustCandidateFaster,
    /// Entire CI inside the band.
    PracticallyEquivalent,
    /// CI above 1.0 but touching the band.
    LikelyReferenceFaster,
    /// CI below 1.0 but touching the band.
    LikelyCandidateFaster,
    /// CI straddles 1.0 and leaves the band.
    Inconclusive,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Decision::RobustReferenceFaster => "reference faster (robust)",
            Decision::RobustCandidateFaster => "candidate faster (robust)",
            Decision::PracticallyEquivalent => "practically equivalent",
            Decision::LikelyReferenceFaster => "reference likely faster",
            Decision::LikelyCandidateFaster => "candidate likely faster",
            Decision::Inconclusive => "inconclusive",
        };
        write!(f, "{label}")
    }
}

/// One feature's comparative result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatioEstimate {
    /// Point estimate: 50th percentile of the surviving resample ratios.
    pub ratio: f64,
    /// 2.5th percentile of the resample ratios.
    pub ci_low: f64,
    /// 97.5th percentile of the resample ratios.
    pub ci_high: f64,
    /// Fraction of resample ratios above 1.0.
    pub prob_ratio_gt_one: f64,
    /// Classification against the equivalence band.
    pub decision: Decision,
}

impl RatioEstimate {
    /// True when the bootstrap had no usable resamples and every field is
    /// zeroed. Reporting flags this instead of trusting the bounds. An
    /// all-zero CI from a genuinely zero reference distribution still
    /// classifies normally, so the decision disambiguates.
    pub fn is_insufficient(&self) -> bool {
        self.ratio == 0.0
            && self.ci_low == 0.0
            && self.ci_high == 0.0
            && self.decision == Decision::Inconclusive
    }

    fn insufficient() -> Self {
        RatioEstimate {
            ratio: 0.0,
            ci_low: 0.0,
            ci_high: 0.0,
            prob_ratio_gt_one: 0.0,
            decision: Decision::Inconclusive,
        }
    }
}

/// Estimate the throughput ratio CI for one feature.
///
/// Each of `samples` rounds independently resamples both sequences with
/// replacement at their original sizes and takes the ratio of resampled
/// medians. Rounds where the candidate median is not positive are
/// discarded; if every round is discarded (or either input is empty) the
/// zeroed "insufficient data" estimate is returned.
pub fn estimate_ratio(
    reference: &[f64],
    candidate: &[f64],
    samples: usize,
    equivalence_band: f64,
) -> RatioEstimate {
    if reference.is_empty() || candidate.is_empty() || samples == 0 {
        return RatioEstimate::insufficient();
    }

    let mut rng = StdRng::seed_from_u64(RATIO_BOOTSTRAP_SEED);
    let mut reference_resample = vec![0.0; reference.len()];
    let mut candidate_resample = vec![0.0; candidate.len()];
    let mut ratios = Vec::with_capacity(samples);

    for _ in 0..samples {
        for slot in reference_resample.iter_mut() {
            *slot = reference[rng.gen_range(0..reference.len())];
        }
        for slot in candidate_resample.iter_mut() {
            *slot = candidate[rng.gen_range(0..candidate.len())];
        }
        let reference_median = compute_percentile(&reference_resample, 50.0);
        let candidate_median = compute_percentile(&candidate_resample, 50.0);
        if candidate_median <= 0.0 {
            continue;
        }
        ratios.push(reference_median / candidate_median);
    }

    if ratios.is_empty() {
        return RatioEstimate::insufficient();
    }

    let ci_low = compute_percentile(&ratios, 2.5);
    let ratio = compute_percentile(&ratios, 50.0);
    let ci_high = compute_percentile(&ratios, 97.5);
    let prob_ratio_gt_one =
        ratios.iter().filter(|&&r| r > 1.0).count() as f64 / ratios.len() as f64;

    RatioEstimate {
        ratio,
        ci_low,
        ci_high,
        prob_ratio_gt_one,
        decision: classify(ci_low, ci_high, equivalence_band),
    }
}

/// Classify a ratio CI against the equivalence band.
///
/// Equivalence is checked before directional significance: a CI that
/// straddles 1.0 while lying mostly outside the band must not be reported
/// equivalent merely because it also straddles 1.0.
pub fn classify(ci_low: f64, ci_high: f64, equivalence_band: f64) -> Decision {
    let lower = 1.0 - equivalence_band;
    let upper = 1.0 + equivalence_band;
    if ci_low > upper {
        Decision::RobustReferenceFaster
    } else if ci_high < lower {
        Decision::RobustCandidateFaster
    } else if ci_low >= lower && ci_high <= upper {
        Decision::PracticallyEquivalent
    } else if ci_low > 1.0 {
        Decision::LikelyReferenceFaster
    } else if ci_high < 1.0 {
        Decision::LikelyCandidateFaster
    } else {
        Decision::Inconclusive
    }
}
