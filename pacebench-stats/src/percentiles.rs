//! Percentile Computation
//!
//! All functions here take samples that are already sorted ascending.
//! Sorting is hoisted to the caller so a phase sorts its samples exactly once,
//! no matter how many quantiles are read from them.

/// Standard percentiles reported for every phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Percentiles {
    /// 50th percentile (median)
    pub p50: f64,
    /// 75th percentile
    pub p75: f64,
    /// 99th percentile
    pub p99: f64,
    /// 99.5th percentile
    pub p995: f64,
    /// 99.9th percentile
    pub p999: f64,
}

/// Read the quantile `q` (in `[0, 1]`) from ascending samples.
///
/// The fractional index is `(n - 1) * q`. An integral index returns that order
/// statistic directly; otherwise the two bracketing order statistics are
/// linearly interpolated.
///
/// Returns `NaN` for an empty slice.
///
/// # Examples
///
/// ```
/// # use pacebench_stats::percentile_sorted;
/// let samples = [1.0, 2.0, 3.0, 4.0];
/// assert_eq!(percentile_sorted(&samples, 0.0), 1.0);
/// assert_eq!(percentile_sorted(&samples, 0.5), 2.5);
/// assert_eq!(percentile_sorted(&samples, 1.0), 4.0);
/// ```
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }

    let rank = (n - 1) as f64 * q.clamp(0.0, 1.0);
    let lower_idx = rank.floor() as usize;

    if rank == lower_idx as f64 {
        return sorted[lower_idx];
    }

    let upper_idx = (lower_idx + 1).min(n - 1);
    let fraction = rank - lower_idx as f64;
    sorted[lower_idx] + fraction * (sorted[upper_idx] - sorted[lower_idx])
}

/// Median of ascending samples (quantile 0.5)
pub fn median_sorted(sorted: &[f64]) -> f64 {
    percentile_sorted(sorted, 0.5)
}

/// Arithmetic mean; `NaN` for an empty slice
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return f64::NAN;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Compute all standard percentiles from ascending samples
pub fn compute_percentiles(sorted: &[f64]) -> Percentiles {
    Percentiles {
        p50: percentile_sorted(sorted, 0.5),
        p75: percentile_sorted(sorted, 0.75),
        p99: percentile_sorted(sorted, 0.99),
        p995: percentile_sorted(sorted, 0.995),
        p999: percentile_sorted(sorted, 0.999),
    }
}
