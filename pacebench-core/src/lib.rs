#![warn(missing_docs)]
//! PaceBench Core - Execution Runtime
//!
//! This crate runs benchmark tasks and turns their timings into statistics:
//! - [`Clock`] abstraction with an `Instant`-backed and a manual clock
//! - [`Limiter`], a FIFO bounded-parallelism gate
//! - Hook lifecycle around every iteration, sync or async per call
//! - Phase engine with time/iteration thresholds and cooperative abort
//! - [`Suite`] orchestration with warmup, concurrency modes and events
//!
//! All concurrency is cooperative: futures are interleaved on the caller's
//! task and nothing here spawns threads or requires `Send`.

mod abort;
mod clock;
mod engine;
mod error;
mod events;
mod hooks;
mod host;
mod limiter;
mod suite;
mod task;

pub use abort::AbortSignal;
pub use clock::{Clock, InstantClock, ManualClock};
pub use engine::{ConcurrencyMode, MAX_IN_FLIGHT, PhaseConfig};
pub use error::{AggregateError, BenchError};
pub use events::{Event, EventKind, Listeners};
pub use hooks::{HookKind, Hooks, Invocation, Phase, RunMode};
pub use host::{HostInfo, HostInfoCache};
pub use limiter::Limiter;
pub use suite::{Suite, SuiteConfig};
pub use task::{HostSnapshot, Measurement, Task, TaskOptions, TaskResult, TaskState};
