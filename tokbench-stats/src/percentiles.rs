//! Percentile Computation
//!
//! Linear interpolation between nearest order statistics. The median and
//! coefficient of variation live here too; both engines' throughput
//! distributions are summarized with the same formulas so the ratio is
//! comparing like with like.

/// Compute a single percentile (0.0–100.0) from samples.
///
/// Uses linear interpolation between nearest ranks. Empty input yields
/// 0.0: an absent distribution is a legitimate "no signal" outcome here,
/// not a defect.
pub fn compute_percentile(samples: &[f64], percentile: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    if samples.len() == 1 {
        return samples[0];
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    let p = percentile / 100.0;

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = (lower_idx + 1).min(n - 1);
    let fraction = rank - lower_idx as f64;

    sorted[lower_idx] + fraction * (sorted[upper_idx] - sorted[lower_idx])
}

/// Median shorthand.
pub fn median(samples: &[f64]) -> f64 {
    compute_percentile(samples, 50.0)
}

/// Coefficient of variation as a percentage (sample standard deviation
/// over mean). Zero for fewer than two samples or a zero mean.
pub fn cv_percent(samples: &[f64]) -> f64 {
    if samples.len() <= 1 {
        return 0.0;
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>()
        / (samples.len() - 1) as f64;
    variance.sqrt() / mean * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd() {
        let samples = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((median(&samples) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_median_even_interpolates() {
        let samples = vec![1.0, 2.0, 3.0, 4.0];
        assert!((median(&samples) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_tail_percentiles() {
        let samples: Vec<f64> = (1..=1000).map(|x| x as f64).collect();
        let p975 = compute_percentile(&samples, 97.5);
        assert!(p975 > 970.0 && p975 < 980.0);
        let p25 = compute_percentile(&samples, 2.5);
        assert!(p25 > 20.0 && p25 < 30.0);
    }

    #[test]
    fn test_single_and_empty() {
        assert!((compute_percentile(&[42.0], 95.0) - 42.0).abs() < f64::EPSILON);
        assert!((compute_percentile(&[], 50.0) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cv_percent() {
        // Identical values have zero spread.
        assert!((cv_percent(&[5.0, 5.0, 5.0]) - 0.0).abs() < f64::EPSILON);
        // One sample carries no spread information.
        assert!((cv_percent(&[5.0]) - 0.0).abs() < f64::EPSILON);
        // Sample stddev of [90, 100, 110] is 10, mean 100 -> 10%.
        assert!((cv_percent(&[90.0, 100.0, 110.0]) - 10.0).abs() < 1e-9);
    }
}
