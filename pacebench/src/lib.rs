#![warn(missing_docs)]
//! # PaceBench
//!
//! Micro-benchmarking for Rust: time a function over many iterations and
//! report latency and throughput statistics.
//!
//! PaceBench provides:
//! - **Time and iteration thresholds**: a phase ends once both are met
//! - **Lifecycle hooks**: `before_all`, `after_all`, `before_each`, `after_each`
//! - **Sync and async bodies**: awaited in the async run mode, rejected in the sync one
//! - **Bounded concurrency**: iterations (`task`) or whole tasks (`bench`) in flight at once
//! - **Cancellation**: suite- and task-level abort signals with partial statistics
//! - **Statistics**: t-distribution margin of error, percentiles, absolute deviations
//!
//! ## Quick Start
//!
//! ```ignore
//! use pacebench::prelude::*;
//! use std::hint::black_box;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut suite = Suite::new(SuiteConfig::default());
//!     suite.add(Task::from_sync("vec_sum", || {
//!         black_box((0..1000u64).sum::<u64>());
//!         Ok(())
//!     }))?;
//!     pacebench::run(suite)
//! }
//! ```
//!
//! ## Async Tasks
//!
//! ```ignore
//! suite.add(Task::from_async("sleep", || async {
//!     tokio::time::sleep(Duration::from_millis(1)).await;
//!     Ok(())
//! }))?;
//! ```
//!
//! ## Hooks
//!
//! ```ignore
//! let task = Task::from_sync("parse", || Ok(()))
//!     .with_hooks(Hooks::new().before_all(|task, phase| {
//!         println!("{task}: starting {phase}");
//!     }));
//! ```

// Re-export core types
pub use pacebench_core::{
    AbortSignal, AggregateError, BenchError, Clock, ConcurrencyMode, Event, EventKind, HookKind,
    Hooks, HostInfo, HostInfoCache, HostSnapshot, InstantClock, Invocation, Limiter,
    MAX_IN_FLIGHT, ManualClock, Measurement, Phase, PhaseConfig, RunMode, Suite, SuiteConfig,
    Task, TaskOptions, TaskResult, TaskState,
};

// Re-export stats
pub use pacebench_stats::{Statistics, StatsError, compute_statistics};

// Re-export reporting
pub use pacebench_cli::{PaceConfig, Report, build_report, format_human_output, generate_json_report};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AbortSignal, ConcurrencyMode, Hooks, Invocation, Phase, Suite, SuiteConfig, Task,
        TaskResult, TaskState,
    };
}

/// Run the PaceBench CLI harness over a suite.
///
/// Call this from your benchmark binary's `main()`:
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     let suite = Suite::new(SuiteConfig::default());
///     pacebench::run(suite)
/// }
/// ```
pub use pacebench_cli::run;
