//! Summary Statistics
//!
//! One [`Statistics`] block is derived per phase from the phase's ascending
//! samples. Every field is computed from the full sample set; nothing is
//! trimmed, so min/max/percentiles keep the tail signal.

use crate::critical::critical_value;
use crate::deviation::{mean_absolute_deviation, median_absolute_deviation};
use crate::percentiles::{compute_percentiles, mean};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the statistics engine
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatsError {
    /// Statistics need at least one sample
    #[error("cannot compute statistics over an empty sample set")]
    EmptySamples,
}

/// Aggregates over one phase's samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Number of samples
    pub samples_count: usize,
    /// Smallest sample
    pub min: f64,
    /// Largest sample
    pub max: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Sample variance (Bessel-corrected, n - 1 denominator)
    pub variance: f64,
    /// Standard deviation
    pub sd: f64,
    /// Standard error of the mean
    pub sem: f64,
    /// Degrees of freedom (n - 1)
    pub df: usize,
    /// Critical value used for the margin of error
    pub critical: f64,
    /// Margin of error (`sem * critical`)
    pub moe: f64,
    /// Relative margin of error, percent of the mean
    pub rme: f64,
    /// Mean absolute deviation
    pub aad: f64,
    /// Median absolute deviation
    pub mad: f64,
    /// 50th percentile
    pub p50: f64,
    /// 75th percentile
    pub p75: f64,
    /// 99th percentile
    pub p99: f64,
    /// 99.5th percentile
    pub p995: f64,
    /// 99.9th percentile
    pub p999: f64,
    /// Raw samples, only kept when sample retention is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<Vec<f64>>,
}

impl Statistics {
    /// Attach the raw samples these statistics were computed from
    pub fn with_samples(mut self, samples: Vec<f64>) -> Self {
        self.samples = Some(samples);
        self
    }

    /// Confidence interval bounds `(mean - moe, mean + moe)`
    pub fn confidence_interval(&self) -> (f64, f64) {
        (self.mean - self.moe, self.mean + self.moe)
    }
}

/// Compute statistics over samples sorted ascending.
///
/// The slice is not sorted here; passing unsorted data yields wrong
/// percentiles and deviations.
///
/// # Examples
///
/// ```
/// # use pacebench_stats::compute_statistics;
/// let stats = compute_statistics(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
/// assert_eq!(stats.mean, 3.0);
/// assert_eq!(stats.variance, 2.5);
/// assert_eq!(stats.critical, 2.776);
/// ```
pub fn compute_statistics(sorted: &[f64]) -> Result<Statistics, StatsError> {
    let n = sorted.len();
    if n == 0 {
        return Err(StatsError::EmptySamples);
    }

    let mean = mean(sorted);
    let df = n - 1;

    let variance = if df == 0 {
        0.0
    } else {
        sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / df as f64
    };
    let sd = variance.sqrt();
    let sem = sd / (n as f64).sqrt();
    let critical = critical_value(df as f64);
    let moe = sem * critical;
    let rme = if mean == 0.0 {
        0.0
    } else {
        moe / mean.abs() * 100.0
    };

    let percentiles = compute_percentiles(sorted);

    Ok(Statistics {
        samples_count: n,
        min: sorted[0],
        max: sorted[df],
        mean,
        variance,
        sd,
        sem,
        df,
        critical,
        moe,
        rme,
        aad: mean_absolute_deviation(sorted, mean),
        mad: median_absolute_deviation(sorted, percentiles.p50),
        p50: percentiles.p50,
        p75: percentiles.p75,
        p99: percentiles.p99,
        p995: percentiles.p995,
        p999: percentiles.p999,
        samples: None,
    })
}

/// Turn latency samples (milliseconds) into throughput samples (operations
/// per second), sorted ascending.
///
/// A zero-latency sample falls back to the latency mean; if that is zero as
/// well the sample contributes zero throughput.
pub fn throughput_samples(latency_ms: &[f64], latency_mean_ms: f64) -> Vec<f64> {
    let mut throughput: Vec<f64> = latency_ms
        .iter()
        .map(|&ms| {
            if ms > 0.0 {
                1000.0 / ms
            } else if latency_mean_ms > 0.0 {
                1000.0 / latency_mean_ms
            } else {
                0.0
            }
        })
        .collect();
    throughput.sort_by(f64::total_cmp);
    throughput
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_summary() {
        let stats = compute_statistics(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        assert_eq!(stats.samples_count, 5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.variance, 2.5);
        assert_eq!(stats.df, 4);
        assert_eq!(stats.p50, 3.0);
        assert!((stats.sd - 2.5_f64.sqrt()).abs() < 1e-12);
        assert!((stats.sem - stats.sd / 5_f64.sqrt()).abs() < 1e-12);
        assert!((stats.moe - stats.sem * 2.776).abs() < 1e-12);
        assert!((stats.rme - stats.moe / 3.0 * 100.0).abs() < 1e-9);
        assert!((stats.aad - 1.2).abs() < 1e-12);
        assert_eq!(stats.mad, 1.0);
        assert!(stats.samples.is_none());
    }

    #[test]
    fn test_single_sample_is_degenerate() {
        let stats = compute_statistics(&[4.2]).unwrap();

        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.sd, 0.0);
        assert_eq!(stats.sem, 0.0);
        assert_eq!(stats.moe, 0.0);
        assert_eq!(stats.rme, 0.0);
        assert_eq!(stats.df, 0);
        assert_eq!(stats.critical, 12.706);
        assert_eq!(stats.min, 4.2);
        assert_eq!(stats.max, 4.2);
        assert_eq!(stats.p999, 4.2);
    }

    #[test]
    fn test_zero_mean_rme_is_zero() {
        let stats = compute_statistics(&[0.0, 0.0, 0.0]).unwrap();
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.rme, 0.0);
    }

    #[test]
    fn test_zero_mean_with_spread() {
        let stats = compute_statistics(&[-1.0, 0.0, 1.0]).unwrap();
        assert_eq!(stats.mean, 0.0);
        assert!(stats.moe > 0.0);
        assert_eq!(stats.rme, 0.0);
    }

    #[test]
    fn test_variance_and_sd_relationship() {
        let samples = [0.25, 0.5, 0.5, 1.75, 3.0, 9.5];
        let stats = compute_statistics(&samples).unwrap();
        assert!(stats.variance >= 0.0);
        assert_eq!(stats.sd, stats.variance.sqrt());
    }

    #[test]
    fn test_empty_is_contract_violation() {
        assert_eq!(compute_statistics(&[]), Err(StatsError::EmptySamples));
    }

    #[test]
    fn test_large_sample_critical_value() {
        // df 99 uses the df 80 row
        let samples: Vec<f64> = (0..100).map(|x| x as f64).collect();
        let stats = compute_statistics(&samples).unwrap();
        assert_eq!(stats.critical, 1.99);
        assert_eq!(stats.moe, stats.sem * 1.99);

        let samples: Vec<f64> = (0..2000).map(|x| x as f64).collect();
        assert_eq!(compute_statistics(&samples).unwrap().critical, 1.96);
    }

    #[test]
    fn test_confidence_interval() {
        let stats = compute_statistics(&[1.0, 2.0, 3.0]).unwrap();
        let (lo, hi) = stats.confidence_interval();
        assert!(lo < stats.mean && stats.mean < hi);
        assert!((hi - lo - 2.0 * stats.moe).abs() < 1e-12);
    }

    #[test]
    fn test_throughput_samples() {
        let throughput = throughput_samples(&[1.0, 2.0, 4.0], 7.0 / 3.0);
        assert_eq!(throughput, vec![250.0, 500.0, 1000.0]);
    }

    #[test]
    fn test_throughput_zero_latency() {
        assert_eq!(throughput_samples(&[0.0, 0.5], 0.25), vec![2000.0, 4000.0]);
        assert_eq!(throughput_samples(&[0.0], 0.0), vec![0.0]);
    }
}
