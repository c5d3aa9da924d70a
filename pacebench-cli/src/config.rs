//! Configuration loading from pace.toml
//!
//! PaceBench configuration can be specified in a `pace.toml` file in the project root.
//! The configuration is automatically discovered by walking up from the current directory.

use pacebench_core::{ConcurrencyMode, SuiteConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// PaceBench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PaceConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Runner configuration for suite execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Run-phase time budget per task (e.g., "1s")
    #[serde(default = "default_time")]
    pub time: String,
    /// Run-phase iteration cap per task
    #[serde(default = "default_iterations")]
    pub iterations: u64,
    /// Run a warmup phase before measuring
    #[serde(default = "default_warmup")]
    pub warmup: bool,
    /// Warmup time budget (e.g., "250ms")
    #[serde(default = "default_warmup_time")]
    pub warmup_time: String,
    /// Warmup iteration cap
    #[serde(default = "default_warmup_iterations")]
    pub warmup_iterations: u64,
    /// Concurrency mode: "none", "task" or "bench"
    #[serde(default)]
    pub concurrency: ConcurrencyMode,
    /// Concurrency limit (unbounded if not set)
    #[serde(default)]
    pub threshold: Option<usize>,
    /// Keep raw samples in the report
    #[serde(default)]
    pub retain_samples: bool,
    /// Stop at the first failing task
    #[serde(default)]
    pub throws: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            time: default_time(),
            iterations: default_iterations(),
            warmup: default_warmup(),
            warmup_time: default_warmup_time(),
            warmup_iterations: default_warmup_iterations(),
            concurrency: ConcurrencyMode::default(),
            threshold: None,
            retain_samples: false,
            throws: false,
        }
    }
}

fn default_time() -> String {
    "1s".to_string()
}
fn default_iterations() -> u64 {
    64
}
fn default_warmup() -> bool {
    true
}
fn default_warmup_time() -> String {
    "250ms".to_string()
}
fn default_warmup_iterations() -> u64 {
    16
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format: "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}

impl PaceConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("pace.toml");
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        tracing::warn!(path = %config_path.display(), error = %e, "ignoring invalid config");
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Suite settings described by this file
    pub fn suite_config(&self) -> anyhow::Result<SuiteConfig> {
        Ok(SuiteConfig {
            time: Self::parse_duration(&self.runner.time)?,
            iterations: self.runner.iterations,
            warmup: self.runner.warmup,
            warmup_time: Self::parse_duration(&self.runner.warmup_time)?,
            warmup_iterations: self.runner.warmup_iterations,
            concurrency: self.runner.concurrency,
            threshold: self.runner.threshold.unwrap_or(usize::MAX),
            retain_samples: self.runner.retain_samples,
            throws: self.runner.throws,
        })
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# PaceBench Configuration

[runner]
# Minimum time spent measuring each task
time = "1s"
# Minimum number of measured iterations per task
iterations = 64
# Run untimed warmup iterations first
warmup = true
warmup_time = "250ms"
warmup_iterations = 16
# Concurrency mode: "none", "task" or "bench"
concurrency = "none"
# Concurrency limit for "task"/"bench" (uncomment to bound)
# threshold = 4
# Keep raw samples in the report
retain_samples = false
# Stop at the first failing task
throws = false

[output]
# Default output format: human or json
format = "human"
"#
        .to_string()
    }

    /// Parse duration string (e.g., "1s", "250ms", "500us")
    pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow::anyhow!("Invalid duration: {}", s));
        }

        let nanos_per_unit: f64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" | "" => 1e9,
            "m" | "min" => 60e9,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok(Duration::from_nanos((value * nanos_per_unit).round() as u64))
    }
}
