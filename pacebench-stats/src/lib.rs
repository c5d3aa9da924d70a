#![warn(missing_docs)]
//! PaceBench Statistical Engine
//!
//! Pure functions over an ascending, non-empty sample slice:
//! - Mean, Bessel-corrected variance, standard deviation and standard error
//! - Margin of error from a Student's t lookup (z fallback for large samples)
//! - Percentiles by linear interpolation between order statistics
//! - Mean and median absolute deviation (the median variant in O(n))
//!
//! Callers sort once per phase; nothing in this crate sorts its input except
//! [`throughput_samples`], which builds a new distribution.

mod critical;
mod deviation;
mod percentiles;
mod summary;

pub use critical::{Z_CRITICAL, critical_value};
pub use deviation::{mean_absolute_deviation, median_absolute_deviation};
pub use percentiles::{Percentiles, compute_percentiles, mean, median_sorted, percentile_sorted};
pub use summary::{Statistics, StatsError, compute_statistics, throughput_samples};

/// Confidence level the critical value table corresponds to (two-tailed)
pub const CONFIDENCE_LEVEL: f64 = 0.95;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert!((CONFIDENCE_LEVEL - 0.95).abs() < f64::EPSILON);
        assert!((Z_CRITICAL - 1.96).abs() < f64::EPSILON);
    }
}
