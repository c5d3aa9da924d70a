//! Tasks and their results

use crate::abort::{AbortSignal, EffectiveAbort};
use crate::clock::Clock;
use crate::engine::{self, PhaseConfig, PhaseEnv, PhaseReport};
use crate::error::BenchError;
use crate::events::{Event, EventKind, Listeners};
use crate::hooks::{Hooks, Invocation, Phase, Routine, RunMode};
use crate::host::HostInfo;
use chrono::{DateTime, Utc};
use pacebench_stats::{Statistics, StatsError, compute_statistics, throughput_samples};
use rayon::slice::ParallelSliceMut;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Where and when a measurement was taken, copied at phase start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSnapshot {
    /// Runtime family
    pub runtime: String,
    /// Runtime version
    pub runtime_version: String,
    /// Name of the clock that produced the samples
    pub timestamp_provider: String,
    /// Wall-clock time the phase started
    pub started_at: DateTime<Utc>,
}

impl HostSnapshot {
    fn capture(host: &HostInfo, clock: &dyn Clock, started_at: DateTime<Utc>) -> Self {
        Self {
            runtime: host.runtime.clone(),
            runtime_version: host.runtime_version.clone(),
            timestamp_provider: clock.name().to_string(),
            started_at,
        }
    }
}

/// Statistics of a finished (or partially finished) run phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Wall time of the run phase in ms
    pub total_time: f64,
    /// `total_time / samples`, in ms per operation
    pub period: f64,
    /// Per-iteration latency in ms
    pub latency: Statistics,
    /// Per-iteration throughput in operations per second
    pub throughput: Statistics,
    /// Host the measurement was taken on
    pub host: HostSnapshot,
}

impl Measurement {
    /// Derive a measurement from raw latency samples (any order).
    pub fn from_samples(
        mut samples: Vec<f64>,
        total_time: f64,
        host: HostSnapshot,
        retain_samples: bool,
    ) -> Result<Self, StatsError> {
        samples.par_sort_unstable_by(f64::total_cmp);

        let latency = compute_statistics(&samples)?;
        let throughput_sorted = throughput_samples(&samples, latency.mean);
        let throughput = compute_statistics(&throughput_sorted)?;
        let period = total_time / latency.samples_count as f64;

        let (latency, throughput) = if retain_samples {
            (
                latency.with_samples(samples),
                throughput.with_samples(throughput_sorted),
            )
        } else {
            (latency, throughput)
        };

        Ok(Self {
            total_time,
            period,
            latency,
            throughput,
            host,
        })
    }
}

/// Discriminant of a [`TaskResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    /// Never run, or reset
    NotStarted,
    /// Currently running
    Started,
    /// Ran to completion
    Completed,
    /// A hook or the body failed
    Errored,
    /// Aborted before any sample was taken
    Aborted,
    /// Aborted after at least one sample
    AbortedWithStatistics,
}

impl TaskState {
    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::NotStarted => "not-started",
            TaskState::Started => "started",
            TaskState::Completed => "completed",
            TaskState::Errored => "errored",
            TaskState::Aborted => "aborted",
            TaskState::AbortedWithStatistics => "aborted-with-statistics",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a task; exactly one state at a time
#[derive(Debug, Clone, Default)]
pub enum TaskResult {
    /// Never run, or reset
    #[default]
    NotStarted,
    /// Currently running
    Started,
    /// Ran to completion
    Completed(Measurement),
    /// A hook or the body failed
    Errored {
        /// The causal error
        error: Arc<anyhow::Error>,
    },
    /// Aborted before any sample was taken
    Aborted,
    /// Aborted after at least one sample; statistics cover the partial set
    AbortedWithStatistics(Measurement),
}

impl TaskResult {
    /// Which state this is
    pub fn state(&self) -> TaskState {
        match self {
            TaskResult::NotStarted => TaskState::NotStarted,
            TaskResult::Started => TaskState::Started,
            TaskResult::Completed(_) => TaskState::Completed,
            TaskResult::Errored { .. } => TaskState::Errored,
            TaskResult::Aborted => TaskState::Aborted,
            TaskResult::AbortedWithStatistics(_) => TaskState::AbortedWithStatistics,
        }
    }

    /// Statistics, for the two states that carry them
    pub fn measurement(&self) -> Option<&Measurement> {
        match self {
            TaskResult::Completed(m) | TaskResult::AbortedWithStatistics(m) => Some(m),
            _ => None,
        }
    }

    /// The causal error of an errored task
    pub fn error(&self) -> Option<&Arc<anyhow::Error>> {
        match self {
            TaskResult::Errored { error } => Some(error),
            _ => None,
        }
    }

    fn errored(error: anyhow::Error) -> Self {
        TaskResult::Errored {
            error: Arc::new(error),
        }
    }

    fn from_report(report: PhaseReport, host: HostSnapshot, retain_samples: bool) -> Self {
        if let Some(error) = report.error {
            return TaskResult::errored(error);
        }
        if report.samples.is_empty() {
            return if report.aborted {
                TaskResult::Aborted
            } else {
                TaskResult::errored(StatsError::EmptySamples.into())
            };
        }

        match Measurement::from_samples(report.samples, report.total_ms, host, retain_samples) {
            Ok(m) if report.aborted => TaskResult::AbortedWithStatistics(m),
            Ok(m) => TaskResult::Completed(m),
            Err(e) => TaskResult::errored(e.into()),
        }
    }
}

/// Per-task overrides of suite settings
#[derive(Debug, Clone, Default)]
pub struct TaskOptions {
    /// Run-phase time budget
    pub time: Option<Duration>,
    /// Run-phase iteration cap
    pub iterations: Option<u64>,
    /// Keep raw samples in the statistics
    pub retain_samples: Option<bool>,
    /// Abort signal combined with the suite's
    pub signal: Option<AbortSignal>,
}

impl TaskOptions {
    /// Apply the overrides to the suite's run-phase configuration
    pub fn resolve(&self, base: &PhaseConfig) -> PhaseConfig {
        PhaseConfig {
            time: self.time.unwrap_or(base.time),
            iterations: self.iterations.unwrap_or(base.iterations),
            ..*base
        }
    }
}

/// Everything a task needs from its suite for one run
pub(crate) struct RunContext<'a> {
    pub clock: &'a dyn Clock,
    pub host: &'a HostInfo,
    pub signal: Option<&'a AbortSignal>,
    pub warmup: Option<PhaseConfig>,
    pub run: PhaseConfig,
    pub retain_samples: bool,
    pub mode: RunMode,
}

/// A named benchmark: body, hooks, overrides and last result
pub struct Task {
    name: String,
    routine: Routine,
    options: TaskOptions,
    runs: u64,
    result: TaskResult,
    listeners: Listeners,
}

impl Task {
    /// Task whose body decides per call whether it completes synchronously
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: FnMut() -> Invocation + 'static,
    {
        Self {
            name: name.into(),
            routine: Routine::new(Box::new(body), Hooks::new()),
            options: TaskOptions::default(),
            runs: 0,
            result: TaskResult::NotStarted,
            listeners: Listeners::default(),
        }
    }

    /// Task with a synchronous body
    pub fn from_sync<F>(name: impl Into<String>, mut body: F) -> Self
    where
        F: FnMut() -> anyhow::Result<()> + 'static,
    {
        Self::new(name, move || Invocation::Ready(body()))
    }

    /// Task with an asynchronous body
    pub fn from_async<F, Fut>(name: impl Into<String>, mut body: F) -> Self
    where
        F: FnMut() -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        Self::new(name, move || Invocation::pending(body()))
    }

    /// Attach lifecycle hooks
    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.routine.set_hooks(hooks);
        self
    }

    /// Attach a task-level abort signal
    pub fn with_signal(mut self, signal: AbortSignal) -> Self {
        self.options.signal = Some(signal);
        self
    }

    /// Override the run-phase time budget
    pub fn with_time(mut self, time: Duration) -> Self {
        self.options.time = Some(time);
        self
    }

    /// Override the run-phase iteration cap
    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.options.iterations = Some(iterations);
        self
    }

    /// Override sample retention
    pub fn with_retain_samples(mut self, retain: bool) -> Self {
        self.options.retain_samples = Some(retain);
        self
    }

    /// Unique name within the suite
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run-phase iterations completed since construction or the last reset
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// Latest result
    pub fn result(&self) -> &TaskResult {
        &self.result
    }

    /// Per-task overrides
    pub fn options(&self) -> &TaskOptions {
        &self.options
    }

    /// Register a listener on this task
    pub fn on<F>(&mut self, kind: EventKind, listener: F)
    where
        F: FnMut(&Event<'_>) + 'static,
    {
        self.listeners.on(kind, listener);
    }

    /// Forget the last result
    pub fn reset(&mut self) {
        self.runs = 0;
        self.result = TaskResult::NotStarted;
        self.listeners.emit(EventKind::Reset, Some(&self.name));
    }

    /// The error to raise when the suite runs with `throws`
    pub(crate) fn failure(&self) -> Option<BenchError> {
        self.result.error().map(|error| BenchError::TaskFailed {
            task: self.name.clone(),
            error: error.clone(),
        })
    }

    /// Warmup (if configured), then the run phase.
    pub(crate) async fn run(&mut self, ctx: &RunContext<'_>) {
        let Task {
            name,
            routine,
            options,
            runs,
            result,
            listeners,
        } = self;
        let name = name.as_str();

        let env = PhaseEnv {
            clock: ctx.clock,
            abort: EffectiveAbort::new(ctx.signal, options.signal.as_ref()),
            mode: ctx.mode,
        };

        *result = TaskResult::Started;
        listeners.emit(EventKind::Start, Some(name));

        let warmup_failure = match &ctx.warmup {
            Some(warmup) => {
                listeners.emit(EventKind::Warmup, Some(name));
                engine::run_phase(routine, name, Phase::Warmup, warmup, &env)
                    .await
                    .error
            }
            None => None,
        };

        *result = match warmup_failure {
            Some(error) => TaskResult::errored(error),
            None => {
                let config = options.resolve(&ctx.run);
                let started_at = Utc::now();
                let report = engine::run_phase(routine, name, Phase::Run, &config, &env).await;
                *runs += report.samples.len() as u64;

                let host = HostSnapshot::capture(ctx.host, ctx.clock, started_at);
                let retain = options.retain_samples.unwrap_or(ctx.retain_samples);
                TaskResult::from_report(report, host, retain)
            }
        };

        match result {
            TaskResult::Errored { error } => {
                tracing::warn!(task = %name, error = %error, "task errored");
                listeners.emit(EventKind::Error, Some(name));
            }
            TaskResult::Aborted | TaskResult::AbortedWithStatistics(_) => {
                tracing::warn!(task = %name, runs = *runs, "task aborted");
                listeners.emit(EventKind::Abort, Some(name));
            }
            _ => {}
        }
        listeners.emit(EventKind::Cycle, Some(name));
        listeners.emit(EventKind::Complete, Some(name));
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("runs", &self.runs)
            .field("state", &self.result.state())
            .finish_non_exhaustive()
    }
}
