//! Absolute Deviation
//!
//! Dispersion measures built from `|x - center|`:
//! - mean absolute deviation: mean of deviations from the mean
//! - median absolute deviation: median of deviations from the median
//!
//! The median variant never re-sorts. For ascending input the deviations left
//! of the center shrink towards it and the ones right of it grow away from it,
//! so both sides are already sorted runs; a two-pointer merge walking outward
//! from the center reaches the middle order statistic in O(n).

/// Mean of `|x - mean|` over all samples. `NaN` for an empty slice.
pub fn mean_absolute_deviation(samples: &[f64], mean: f64) -> f64 {
    if samples.is_empty() {
        return f64::NAN;
    }
    samples.iter().map(|x| (x - mean).abs()).sum::<f64>() / samples.len() as f64
}

/// Median of `|x - median|` over ascending samples. `NaN` for an empty slice.
///
/// Uses the same interpolation rule as [`crate::percentile_sorted`] at
/// quantile 0.5, so the result equals sorting the deviations and taking their
/// median.
pub fn median_absolute_deviation(sorted: &[f64], median: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }

    let rank = (n - 1) as f64 * 0.5;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    // left walks down from the split, right walks up from it
    let split = sorted.partition_point(|&x| x < median);
    let mut left = split;
    let mut right = split;
    let mut lower = 0.0;
    let mut upper = 0.0;

    for k in 0..=upper_idx {
        let take_left = match (left > 0, right < n) {
            (true, true) => median - sorted[left - 1] <= sorted[right] - median,
            (true, false) => true,
            (false, _) => false,
        };

        let deviation = if take_left {
            left -= 1;
            median - sorted[left]
        } else {
            let d = sorted[right] - median;
            right += 1;
            d
        };

        if k == lower_idx {
            lower = deviation;
        }
        if k == upper_idx {
            upper = deviation;
        }
    }

    if lower_idx == upper_idx {
        lower
    } else {
        lower + (rank - lower_idx as f64) * (upper - lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::percentiles::{median_sorted, percentile_sorted};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Straightforward version: materialise deviations, sort, take the median.
    fn reference_mad(sorted: &[f64]) -> f64 {
        let center = median_sorted(sorted);
        let mut deviations: Vec<f64> = sorted.iter().map(|x| (x - center).abs()).collect();
        deviations.sort_by(f64::total_cmp);
        percentile_sorted(&deviations, 0.5)
    }

    #[test]
    fn test_mean_absolute_deviation() {
        let samples = [1.0, 2.0, 3.0, 4.0, 5.0];
        // |1-3| + |2-3| + 0 + |4-3| + |5-3| = 6, / 5
        assert!((mean_absolute_deviation(&samples, 3.0) - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_median_absolute_deviation_known_value() {
        let samples = [1.0, 1.0, 2.0, 2.0, 4.0, 6.0, 9.0];
        // median 2, deviations [1, 1, 0, 0, 2, 4, 7] -> sorted median 1
        assert_eq!(median_absolute_deviation(&samples, 2.0), 1.0);
    }

    #[test]
    fn test_single_element() {
        let samples = [7.5];
        assert_eq!(median_absolute_deviation(&samples, 7.5), 0.0);
        assert_eq!(mean_absolute_deviation(&samples, 7.5), 0.0);
    }

    #[test]
    fn test_all_duplicates() {
        let samples = [3.0; 16];
        assert_eq!(median_absolute_deviation(&samples, 3.0), 0.0);
        assert_eq!(reference_mad(&samples), 0.0);
    }

    #[test]
    fn test_matches_reference_on_random_inputs() {
        let mut rng = StdRng::seed_from_u64(0x5eed_cafe);

        for trial in 0..2000 {
            let len = rng.gen_range(2..200);
            let mut samples: Vec<f64> = if trial % 4 == 0 {
                // heavy duplication
                (0..len).map(|_| rng.gen_range(0..5) as f64).collect()
            } else {
                (0..len).map(|_| rng.gen_range(0.0..1_000.0)).collect()
            };
            samples.sort_by(f64::total_cmp);

            let expected = reference_mad(&samples);
            let actual = median_absolute_deviation(&samples, median_sorted(&samples));
            assert!(
                (expected - actual).abs() <= 1e-9,
                "trial {trial}: expected {expected}, got {actual} for {samples:?}"
            );
        }
    }

    #[test]
    fn test_empty() {
        assert!(median_absolute_deviation(&[], 0.0).is_nan());
        assert!(mean_absolute_deviation(&[], 0.0).is_nan());
    }
}
