//! Execution Engine
//!
//! Runs one phase (warmup or run) of one task: `before_all`, then hooked
//! iterations until both thresholds are met or an abort is observed, then
//! `after_all`. Only the body is inside the timed region.
//!
//! Stopping rule: the phase ends once elapsed time ≥ budget **and**
//! iterations ≥ cap. A zero threshold is already satisfied, so at least one
//! iteration always runs unless the phase is aborted first.

use crate::abort::EffectiveAbort;
use crate::clock::Clock;
use crate::error::{AggregateError, BenchError};
use crate::hooks::{HookKind, Phase, Routine, RunMode};
use crate::limiter::Limiter;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound on iterations of one task kept in flight at once in
/// [`ConcurrencyMode::Task`], whatever the configured limit.
pub const MAX_IN_FLIGHT: usize = 1024;

/// How work is overlapped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcurrencyMode {
    /// Iterations and tasks run one after another
    #[default]
    None,
    /// Iterations of the same task overlap
    Task,
    /// Whole tasks overlap; each task is sequential internally
    Bench,
}

impl fmt::Display for ConcurrencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConcurrencyMode::None => "none",
            ConcurrencyMode::Task => "task",
            ConcurrencyMode::Bench => "bench",
        })
    }
}

impl FromStr for ConcurrencyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(ConcurrencyMode::None),
            "task" => Ok(ConcurrencyMode::Task),
            "bench" => Ok(ConcurrencyMode::Bench),
            other => Err(format!(
                "unknown concurrency mode `{other}` (expected none, task or bench)"
            )),
        }
    }
}

/// Thresholds and concurrency for one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseConfig {
    /// Minimum wall time to keep iterating
    pub time: Duration,
    /// Minimum iteration count; also a hard ceiling in task mode
    pub iterations: u64,
    /// Concurrency mode
    pub concurrency: ConcurrencyMode,
    /// Concurrency limit for the task and bench modes
    pub limit: usize,
}

impl PhaseConfig {
    /// Reject combinations that can never run.
    pub fn validate(&self, mode: RunMode) -> Result<(), BenchError> {
        if self.concurrency == ConcurrencyMode::None {
            return Ok(());
        }
        if mode == RunMode::Sync {
            return Err(BenchError::ConcurrencyRequiresAsync(self.concurrency));
        }
        if self.limit == 0 {
            return Err(BenchError::InvalidConcurrencyLimit(self.concurrency));
        }
        Ok(())
    }
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            time: Duration::from_secs(1),
            iterations: 64,
            concurrency: ConcurrencyMode::None,
            limit: usize::MAX,
        }
    }
}

/// Ambient inputs of a phase
#[derive(Clone, Copy)]
pub(crate) struct PhaseEnv<'a> {
    pub clock: &'a dyn Clock,
    pub abort: EffectiveAbort<'a>,
    pub mode: RunMode,
}

/// What one phase produced
#[derive(Debug)]
pub(crate) struct PhaseReport {
    /// Per-iteration latencies in ms, in completion order
    pub samples: Vec<f64>,
    /// Wall time of the iteration loop in ms
    pub total_ms: f64,
    pub aborted: bool,
    pub error: Option<anyhow::Error>,
}

impl PhaseReport {
    fn failed(error: anyhow::Error) -> Self {
        Self {
            samples: Vec::new(),
            total_ms: 0.0,
            aborted: false,
            error: Some(error),
        }
    }
}

// ─── Sampling ────────────────────────────────────────────────────────────────

/// Collects samples and decides when the thresholds are met
struct Sampler<'a> {
    clock: &'a dyn Clock,
    origin: u64,
    budget_ticks: u64,
    cap: u64,
    samples: Vec<f64>,
}

impl<'a> Sampler<'a> {
    fn start(clock: &'a dyn Clock, config: &PhaseConfig) -> Self {
        let budget_ticks = clock.from_ms(config.time.as_secs_f64() * 1000.0);
        Self {
            clock,
            origin: clock.now(),
            budget_ticks,
            cap: config.iterations,
            samples: Vec::with_capacity(config.iterations.min(1 << 16) as usize),
        }
    }

    #[inline]
    fn record(&mut self, ms: f64) {
        self.samples.push(ms);
    }

    #[inline]
    fn count(&self) -> u64 {
        self.samples.len() as u64
    }

    fn thresholds_met(&self, iterations: u64) -> bool {
        iterations >= self.cap && self.clock.now().saturating_sub(self.origin) >= self.budget_ticks
    }

    fn elapsed_ms(&self) -> f64 {
        self.clock.elapsed_ms(self.origin)
    }
}

// ─── Phase ───────────────────────────────────────────────────────────────────

type Shared<'r> = RefCell<&'r mut Routine>;

/// Call one callback and settle it. The borrow ends before the await.
async fn invoke(
    routine: &Shared<'_>,
    kind: HookKind,
    task: &str,
    phase: Phase,
    mode: RunMode,
) -> anyhow::Result<()> {
    let invocation = routine.borrow_mut().invoke(kind, task, phase);
    match invocation {
        Some(invocation) => invocation.settle(mode, kind).await,
        None => Ok(()),
    }
}

/// One hooked iteration. `Ok(None)` means the abort was observed at admission.
async fn iterate(
    routine: &Shared<'_>,
    task: &str,
    phase: Phase,
    env: &PhaseEnv<'_>,
) -> anyhow::Result<Option<f64>> {
    if env.abort.is_aborted() {
        return Ok(None);
    }

    invoke(routine, HookKind::BeforeEach, task, phase, env.mode).await?;

    let start = env.clock.now();
    let outcome = invoke(routine, HookKind::Body, task, phase, env.mode).await;
    let ticks = env.clock.now().saturating_sub(start);

    // after_each still runs for a failed body
    let after = invoke(routine, HookKind::AfterEach, task, phase, env.mode).await;
    outcome?;
    after?;

    Ok(Some(env.clock.to_ms(ticks)))
}

async fn run_sequential(
    routine: &Shared<'_>,
    task: &str,
    phase: Phase,
    env: &PhaseEnv<'_>,
    sampler: &mut Sampler<'_>,
) -> (bool, Option<anyhow::Error>) {
    loop {
        if env.abort.is_aborted() {
            return (true, None);
        }

        match iterate(routine, task, phase, env).await {
            Ok(Some(ms)) => sampler.record(ms),
            Ok(None) => return (true, None),
            Err(e) => return (false, Some(e)),
        }

        if env.abort.is_aborted() {
            return (true, None);
        }
        if sampler.thresholds_met(sampler.count()) {
            return (false, None);
        }
    }
}

async fn run_concurrent(
    routine: &Shared<'_>,
    task: &str,
    phase: Phase,
    config: &PhaseConfig,
    env: &PhaseEnv<'_>,
    sampler: &mut Sampler<'_>,
) -> (bool, Option<anyhow::Error>) {
    let limiter = Limiter::new(config.limit);
    let window = config.limit.min(MAX_IN_FLIGHT);
    let mut in_flight = FuturesUnordered::new();
    let mut claimed = 0u64;
    let mut errors = Vec::new();

    loop {
        let halted = !errors.is_empty() || env.abort.is_aborted();
        // Slots are counted when claimed, so the cap is a hard ceiling.
        let satisfied = claimed > 0 && sampler.thresholds_met(claimed);

        if !halted && !satisfied && in_flight.len() < window {
            claimed += 1;
            in_flight.push(limiter.submit(iterate(routine, task, phase, env)));
            continue;
        }

        match in_flight.next().await {
            Some(Ok(Some(ms))) => sampler.record(ms),
            Some(Ok(None)) => {}
            Some(Err(e)) => errors.push(e),
            None => break,
        }
    }

    let error = AggregateError::collapse(errors);
    let aborted = error.is_none() && env.abort.is_aborted();
    (aborted, error)
}

/// Run one phase of `routine` to completion.
///
/// Hook and body failures end up in [`PhaseReport::error`]; samples gathered
/// before the failure are kept in the report.
pub(crate) async fn run_phase(
    routine: &mut Routine,
    task: &str,
    phase: Phase,
    config: &PhaseConfig,
    env: &PhaseEnv<'_>,
) -> PhaseReport {
    tracing::debug!(
        task,
        %phase,
        time_ms = config.time.as_millis() as u64,
        iterations = config.iterations,
        concurrency = %config.concurrency,
        "phase started"
    );

    let routine = RefCell::new(routine);

    if let Err(error) = invoke(&routine, HookKind::BeforeAll, task, phase, env.mode).await {
        return PhaseReport::failed(error);
    }

    let mut sampler = Sampler::start(env.clock, config);
    let (aborted, error) = match config.concurrency {
        ConcurrencyMode::Task => {
            run_concurrent(&routine, task, phase, config, env, &mut sampler).await
        }
        ConcurrencyMode::None | ConcurrencyMode::Bench => {
            run_sequential(&routine, task, phase, env, &mut sampler).await
        }
    };
    let total_ms = sampler.elapsed_ms();

    let error = match error {
        Some(e) => Some(e),
        None => invoke(&routine, HookKind::AfterAll, task, phase, env.mode)
            .await
            .err(),
    };

    tracing::debug!(
        task,
        %phase,
        samples = sampler.samples.len(),
        total_ms,
        aborted,
        failed = error.is_some(),
        "phase finished"
    );

    PhaseReport {
        samples: sampler.samples,
        total_ms,
        aborted,
        error,
    }
}
