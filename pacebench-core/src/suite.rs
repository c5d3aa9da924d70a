//! Suite Orchestrator
//!
//! A [`Suite`] owns uniquely named tasks and runs each one's warmup and run
//! phases, either one task after another or (in [`ConcurrencyMode::Bench`])
//! several tasks at once through a [`Limiter`].

use crate::abort::AbortSignal;
use crate::clock::{Clock, InstantClock};
use crate::engine::{ConcurrencyMode, PhaseConfig};
use crate::error::BenchError;
use crate::events::{Event, EventKind, Listeners};
use crate::hooks::RunMode;
use crate::host::HostInfoCache;
use crate::limiter::Limiter;
use crate::task::{RunContext, Task, TaskResult};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

/// Suite-wide settings; tasks may override time, iterations and retention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Run-phase time budget
    pub time: Duration,
    /// Run-phase iteration cap
    pub iterations: u64,
    /// Whether tasks get a warmup phase
    pub warmup: bool,
    /// Warmup time budget
    pub warmup_time: Duration,
    /// Warmup iteration cap
    pub warmup_iterations: u64,
    /// Concurrency mode
    pub concurrency: ConcurrencyMode,
    /// Concurrency limit for the task and bench modes
    pub threshold: usize,
    /// Keep raw samples in task statistics
    pub retain_samples: bool,
    /// Return the first task error from `run` instead of only recording it
    pub throws: bool,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            time: Duration::from_secs(1),
            iterations: 64,
            warmup: true,
            warmup_time: Duration::from_millis(250),
            warmup_iterations: 16,
            concurrency: ConcurrencyMode::None,
            threshold: usize::MAX,
            retain_samples: false,
            throws: false,
        }
    }
}

impl SuiteConfig {
    /// Run-phase configuration before per-task overrides
    pub fn run_phase(&self) -> PhaseConfig {
        PhaseConfig {
            time: self.time,
            iterations: self.iterations,
            concurrency: self.concurrency,
            limit: self.threshold,
        }
    }

    /// Warmup configuration, if warmup is enabled
    pub fn warmup_phase(&self) -> Option<PhaseConfig> {
        self.warmup.then(|| PhaseConfig {
            time: self.warmup_time,
            iterations: self.warmup_iterations,
            ..self.run_phase()
        })
    }
}

/// A collection of uniquely named tasks run under one configuration
pub struct Suite {
    config: SuiteConfig,
    tasks: Vec<Task>,
    clock: Arc<dyn Clock>,
    host: Arc<HostInfoCache>,
    signal: Option<AbortSignal>,
    listeners: Listeners,
}

impl Suite {
    /// Empty suite timed by an [`InstantClock`]
    pub fn new(config: SuiteConfig) -> Self {
        Self {
            config,
            tasks: Vec::new(),
            clock: Arc::new(InstantClock::new()),
            host: Arc::new(HostInfoCache::default()),
            signal: None,
            listeners: Listeners::default(),
        }
    }

    /// Replace the timestamp provider
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Attach a suite-level abort signal
    pub fn with_signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Share a host info cache with other suites
    pub fn with_host_cache(mut self, host: Arc<HostInfoCache>) -> Self {
        self.host = host;
        self
    }

    /// Suite settings
    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Mutable suite settings
    pub fn config_mut(&mut self) -> &mut SuiteConfig {
        &mut self.config
    }

    /// Suite-level abort signal, if any
    pub fn signal(&self) -> Option<&AbortSignal> {
        self.signal.as_ref()
    }

    /// Host info cache used for measurements
    pub fn host_cache(&self) -> &Arc<HostInfoCache> {
        &self.host
    }

    /// Register a task; names must be unique.
    pub fn add(&mut self, task: Task) -> Result<&mut Task, BenchError> {
        if self.get(task.name()).is_some() {
            return Err(BenchError::DuplicateTask(task.name().to_string()));
        }
        self.listeners.emit(EventKind::Add, Some(task.name()));
        self.tasks.push(task);
        let index = self.tasks.len() - 1;
        Ok(&mut self.tasks[index])
    }

    /// Remove a task by name
    pub fn remove(&mut self, name: &str) -> Option<Task> {
        let index = self.tasks.iter().position(|t| t.name() == name)?;
        let task = self.tasks.remove(index);
        self.listeners.emit(EventKind::Remove, Some(task.name()));
        Some(task)
    }

    /// Look up a task by name
    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name() == name)
    }

    /// Look up a task by name, mutably
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.name() == name)
    }

    /// Tasks in registration order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Task names paired with their latest results, in registration order
    pub fn results(&self) -> impl Iterator<Item = (&str, &TaskResult)> {
        self.tasks.iter().map(|t| (t.name(), t.result()))
    }

    /// Register a suite-level listener
    pub fn on<F>(&mut self, kind: EventKind, listener: F)
    where
        F: FnMut(&Event<'_>) + 'static,
    {
        self.listeners.on(kind, listener);
    }

    /// Put every task back to `NotStarted`
    pub fn reset(&mut self) {
        for task in &mut self.tasks {
            task.reset();
        }
        self.listeners.emit(EventKind::Reset, None);
    }

    /// Run every task, awaiting asynchronous bodies and hooks.
    pub async fn run(&mut self) -> Result<&[Task], BenchError> {
        self.execute(RunMode::Async).await?;
        Ok(&self.tasks)
    }

    /// Run every task on the calling thread. Bodies and hooks must return
    /// settled invocations; concurrency modes are rejected.
    pub fn run_sync(&mut self) -> Result<&[Task], BenchError> {
        futures::executor::block_on(self.execute(RunMode::Sync))?;
        Ok(&self.tasks)
    }

    async fn execute(&mut self, mode: RunMode) -> Result<(), BenchError> {
        let run = self.config.run_phase();
        run.validate(mode)?;

        let Suite {
            config,
            tasks,
            clock,
            host,
            signal,
            listeners,
        } = self;

        let host = host.get();
        let ctx = RunContext {
            clock: clock.as_ref(),
            host: &host,
            signal: signal.as_ref(),
            warmup: config.warmup_phase(),
            run,
            retain_samples: config.retain_samples,
            mode,
        };

        tracing::info!(
            tasks = tasks.len(),
            concurrency = %config.concurrency,
            ?mode,
            "running suite"
        );
        listeners.emit(EventKind::Start, None);

        if config.concurrency == ConcurrencyMode::Bench {
            run_tasks_concurrently(tasks, listeners, &ctx, config).await?;
        } else {
            for task in tasks.iter_mut() {
                task.run(&ctx).await;
                announce(listeners, task);
                if let Some(err) = config.throws.then(|| task.failure()).flatten() {
                    return Err(err);
                }
            }
        }

        listeners.emit(EventKind::Complete, None);
        Ok(())
    }
}

async fn run_tasks_concurrently(
    tasks: &mut [Task],
    listeners: &mut Listeners,
    ctx: &RunContext<'_>,
    config: &SuiteConfig,
) -> Result<(), BenchError> {
    let limiter = Limiter::new(config.threshold);
    let throws = config.throws;
    // Each task announces itself as soon as it finishes.
    let listeners = &RefCell::new(listeners);

    let units = tasks.iter_mut().map(move |task| async move {
        task.run(ctx).await;
        announce(&mut **listeners.borrow_mut(), task);
        match task.failure() {
            Some(err) if throws => Err(anyhow::Error::new(err)),
            _ => Ok(()),
        }
    });
    let outcome = limiter.run_all(units).await;

    outcome.map(drop).map_err(BenchError::from_anyhow)
}

/// Forward a finished task's outcome to suite listeners
fn announce(listeners: &mut Listeners, task: &Task) {
    let name = Some(task.name());
    match task.result() {
        TaskResult::Errored { .. } => listeners.emit(EventKind::Error, name),
        TaskResult::Aborted | TaskResult::AbortedWithStatistics(_) => {
            listeners.emit(EventKind::Abort, name)
        }
        _ => {}
    }
    listeners.emit(EventKind::Cycle, name);
}

impl std::fmt::Debug for Suite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Suite")
            .field("config", &self.config)
            .field("tasks", &self.tasks)
            .field("clock", &self.clock.name())
            .field("signal", &self.signal)
            .field("listeners", &self.listeners)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::hooks::{Hooks, Invocation};
    use crate::task::TaskState;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn quick_config() -> SuiteConfig {
        SuiteConfig {
            time: Duration::ZERO,
            iterations: 5,
            warmup: false,
            ..SuiteConfig::default()
        }
    }

    fn manual_suite(config: SuiteConfig) -> Suite {
        Suite::new(config).with_clock(Arc::new(ManualClock::new()))
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut suite = manual_suite(quick_config());
        suite.add(Task::from_sync("a", || Ok(()))).unwrap();

        let err = suite.add(Task::from_sync("a", || Ok(()))).unwrap_err();
        assert!(matches!(err, BenchError::DuplicateTask(ref name) if name == "a"));
        assert_eq!(suite.tasks().len(), 1);
    }

    #[test]
    fn test_add_remove_get() {
        let mut suite = manual_suite(quick_config());
        suite.add(Task::from_sync("a", || Ok(()))).unwrap();
        suite.add(Task::from_sync("b", || Ok(()))).unwrap();

        assert!(suite.get("b").is_some());
        assert_eq!(suite.remove("a").unwrap().name(), "a");
        assert!(suite.remove("a").is_none());
        assert!(suite.get_mut("b").is_some());
        assert_eq!(suite.tasks().len(), 1);
    }

    #[test]
    fn test_run_sync_records_results() {
        let mut suite = manual_suite(quick_config());
        suite.add(Task::from_sync("ok", || Ok(()))).unwrap();
        suite
            .add(Task::from_sync("bad", || anyhow::bail!("broken")))
            .unwrap();

        suite.run_sync().unwrap();

        let states: Vec<_> = suite.results().map(|(n, r)| (n, r.state())).collect();
        assert_eq!(
            states,
            vec![("ok", TaskState::Completed), ("bad", TaskState::Errored)]
        );
        assert_eq!(suite.get("ok").unwrap().runs(), 5);
    }

    #[test]
    fn test_throws_stops_at_first_error() {
        let mut suite = manual_suite(SuiteConfig {
            throws: true,
            ..quick_config()
        });
        suite
            .add(Task::from_sync("bad", || anyhow::bail!("broken")))
            .unwrap();
        suite.add(Task::from_sync("later", || Ok(()))).unwrap();

        let err = suite.run_sync().unwrap_err();
        assert_eq!(err.to_string(), "task `bad` failed: broken");
        assert_eq!(suite.get("bad").unwrap().result().state(), TaskState::Errored);
        assert_eq!(suite.get("later").unwrap().result().state(), TaskState::NotStarted);
    }

    #[test]
    fn test_sync_mode_rejects_concurrency() {
        let mut suite = manual_suite(SuiteConfig {
            concurrency: ConcurrencyMode::Task,
            ..quick_config()
        });
        suite.add(Task::from_sync("a", || Ok(()))).unwrap();

        assert!(matches!(
            suite.run_sync(),
            Err(BenchError::ConcurrencyRequiresAsync(ConcurrencyMode::Task))
        ));
        assert_eq!(suite.get("a").unwrap().runs(), 0);
    }

    #[tokio::test]
    async fn test_zero_threshold_rejected() {
        let mut suite = manual_suite(SuiteConfig {
            concurrency: ConcurrencyMode::Bench,
            threshold: 0,
            ..quick_config()
        });
        suite.add(Task::from_sync("a", || Ok(()))).unwrap();

        assert!(matches!(
            suite.run().await,
            Err(BenchError::InvalidConcurrencyLimit(ConcurrencyMode::Bench))
        ));
    }

    #[tokio::test]
    async fn test_bench_mode_overlaps_tasks_up_to_threshold() {
        for (threshold, expected_peak) in [(1, 1), (2, 2)] {
            let active = Rc::new(Cell::new(0usize));
            let peak = Rc::new(Cell::new(0usize));

            let mut suite = Suite::new(SuiteConfig {
                concurrency: ConcurrencyMode::Bench,
                threshold,
                ..quick_config()
            });
            for name in ["x", "y", "z"] {
                let (a, p) = (active.clone(), peak.clone());
                suite
                    .add(Task::new(name, move || {
                        let (a, p) = (a.clone(), p.clone());
                        Invocation::pending(async move {
                            a.set(a.get() + 1);
                            p.set(p.get().max(a.get()));
                            tokio::time::sleep(Duration::from_millis(1)).await;
                            a.set(a.get() - 1);
                            Ok(())
                        })
                    }))
                    .unwrap();
            }

            suite.run().await.unwrap();
            assert_eq!(peak.get(), expected_peak);
            assert!(suite.results().all(|(_, r)| r.state() == TaskState::Completed));
        }
    }

    #[tokio::test]
    async fn test_bench_mode_announces_each_task_on_completion() {
        let mut suite = Suite::new(SuiteConfig {
            concurrency: ConcurrencyMode::Bench,
            threshold: 2,
            ..quick_config()
        });
        let slow_done = Rc::new(Cell::new(false));
        let done = slow_done.clone();
        suite
            .add(Task::from_async("slow", move || {
                let done = done.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    done.set(true);
                    Ok(())
                }
            }))
            .unwrap();
        suite.add(Task::from_sync("fast", || Ok(()))).unwrap();

        let cycles = Rc::new(RefCell::new(Vec::new()));
        let (log, slow) = (cycles.clone(), slow_done.clone());
        suite.on(EventKind::Cycle, move |event| {
            log.borrow_mut()
                .push((event.task.unwrap_or_default().to_string(), slow.get()));
        });

        suite.run().await.unwrap();

        // "fast" is announced while "slow" is still running
        assert_eq!(
            *cycles.borrow(),
            vec![("fast".to_string(), false), ("slow".to_string(), true)]
        );
    }

    #[tokio::test]
    async fn test_bench_mode_throws_aggregates() {
        let mut suite = manual_suite(SuiteConfig {
            concurrency: ConcurrencyMode::Bench,
            throws: true,
            ..quick_config()
        });
        suite.add(Task::from_sync("a", || anyhow::bail!("a broke"))).unwrap();
        suite.add(Task::from_sync("b", || Ok(()))).unwrap();
        suite.add(Task::from_sync("c", || anyhow::bail!("c broke"))).unwrap();

        let err = suite.run().await.unwrap_err();
        let BenchError::Aggregate(aggregate) = err else {
            panic!("expected aggregate error, got {err:?}");
        };
        assert_eq!(aggregate.errors().len(), 2);
        assert_eq!(suite.get("b").unwrap().result().state(), TaskState::Completed);
    }

    #[test]
    fn test_suite_events() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut suite = manual_suite(quick_config());
        for kind in [
            EventKind::Add,
            EventKind::Start,
            EventKind::Cycle,
            EventKind::Error,
            EventKind::Complete,
            EventKind::Reset,
        ] {
            let log = events.clone();
            suite.on(kind, move |e| {
                log.borrow_mut()
                    .push(format!("{}:{}", e.kind, e.task.unwrap_or("-")))
            });
        }

        suite.add(Task::from_sync("a", || Ok(()))).unwrap();
        suite.add(Task::from_sync("b", || anyhow::bail!("no"))).unwrap();
        suite.run_sync().unwrap();
        suite.reset();

        assert_eq!(
            *events.borrow(),
            vec![
                "add:a", "add:b", "start:-", "cycle:a", "error:b", "cycle:b", "complete:-",
                "reset:-",
            ]
        );
        assert!(suite.results().all(|(_, r)| r.state() == TaskState::NotStarted));
    }

    #[test]
    fn test_async_before_all_in_sync_mode() {
        let mut suite = manual_suite(quick_config());
        let hooks = Hooks::new().before_all(|_: &str, _| Invocation::pending(async { Ok(()) }));
        suite
            .add(Task::from_sync("hooked", || Ok(())).with_hooks(hooks))
            .unwrap();
        suite.add(Task::from_sync("plain", || Ok(()))).unwrap();

        suite.run_sync().unwrap();

        let hooked = suite.get("hooked").unwrap().result();
        assert_eq!(
            hooked.error().unwrap().to_string(),
            "`beforeAll` function must be sync when using the synchronous run mode"
        );
        assert_eq!(
            suite.get("plain").unwrap().result().state(),
            TaskState::Completed
        );
    }

    #[test]
    fn test_warmup_phase_config() {
        let config = SuiteConfig::default();
        let warmup = config.warmup_phase().unwrap();
        assert_eq!(warmup.time, Duration::from_millis(250));
        assert_eq!(warmup.iterations, 16);
        assert_eq!(warmup.limit, usize::MAX);

        let disabled = SuiteConfig {
            warmup: false,
            ..config
        };
        assert!(disabled.warmup_phase().is_none());
    }
}
