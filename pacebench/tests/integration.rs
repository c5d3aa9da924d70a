//! Integration tests for PaceBench
//!
//! These tests exercise whole suites end to end through the public API.

use pacebench::prelude::*;
use pacebench::{BenchError, Limiter, ManualClock, compute_statistics};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

fn config(time: Duration, iterations: u64) -> SuiteConfig {
    SuiteConfig {
        time,
        iterations,
        warmup: false,
        ..SuiteConfig::default()
    }
}

/// Both thresholds must be met before a phase ends
#[test]
fn test_time_and_iteration_thresholds() {
    let mut suite = Suite::new(config(Duration::from_millis(100), 10));
    suite
        .add(Task::from_sync("sleep_5ms", || {
            std::thread::sleep(Duration::from_millis(5));
            Ok(())
        }))
        .unwrap();

    suite.run_sync().unwrap();

    let task = suite.get("sleep_5ms").unwrap();
    let m = task.result().measurement().unwrap();
    assert_eq!(task.result().state(), TaskState::Completed);
    assert!(task.runs() >= 10);
    assert!(m.total_time >= 100.0, "total_time = {}", m.total_time);
    assert!(m.latency.mean >= 5.0);
    assert_eq!(m.latency.samples_count as u64, task.runs());
    assert_eq!(m.host.timestamp_provider, "instant");
}

/// A signal triggered before the run aborts without any sample
#[test]
fn test_pre_aborted_suite() {
    let signal = AbortSignal::new();
    signal.abort();

    let mut suite = Suite::new(config(Duration::ZERO, 10)).with_signal(signal);
    suite.add(Task::from_sync("never", || Ok(()))).unwrap();

    suite.run_sync().unwrap();

    let task = suite.get("never").unwrap();
    assert_eq!(task.result().state(), TaskState::Aborted);
    assert_eq!(task.runs(), 0);
    assert!(task.result().measurement().is_none());
}

/// Aborting mid-run keeps statistics over the samples taken so far
#[test]
fn test_mid_run_abort_keeps_statistics() {
    let signal = AbortSignal::new();
    let calls = Rc::new(Cell::new(0u32));

    let mut suite = Suite::new(config(Duration::ZERO, 1_000)).with_signal(signal.clone());
    let counter = Rc::clone(&calls);
    suite
        .add(Task::from_sync("interrupted", move || {
            counter.set(counter.get() + 1);
            if counter.get() == 3 {
                signal.abort();
            }
            Ok(())
        }))
        .unwrap();

    suite.run_sync().unwrap();

    let task = suite.get("interrupted").unwrap();
    assert_eq!(task.result().state(), TaskState::AbortedWithStatistics);
    let m = task.result().measurement().unwrap();
    assert!(m.latency.samples_count >= 1);
    assert_eq!(calls.get(), 3);
}

/// A task-level signal only aborts its own task
#[test]
fn test_task_signal_is_scoped() {
    let signal = AbortSignal::new();
    signal.abort();

    let mut suite = Suite::new(config(Duration::ZERO, 5));
    suite
        .add(Task::from_sync("cancelled", || Ok(())).with_signal(signal))
        .unwrap();
    suite.add(Task::from_sync("unaffected", || Ok(()))).unwrap();

    suite.run_sync().unwrap();

    let states: Vec<_> = suite.results().map(|(name, r)| (name, r.state())).collect();
    assert_eq!(
        states,
        vec![
            ("cancelled", TaskState::Aborted),
            ("unaffected", TaskState::Completed)
        ]
    );
}

/// A slower task reports higher latency and lower throughput
#[test]
fn test_fast_vs_slow_ordering() {
    let mut suite = Suite::new(config(Duration::ZERO, 20));
    suite.add(Task::from_sync("fast", || Ok(()))).unwrap();
    suite
        .add(Task::from_sync("slow", || {
            std::thread::sleep(Duration::from_millis(1));
            Ok(())
        }))
        .unwrap();

    suite.run_sync().unwrap();

    let fast = suite.get("fast").unwrap().result().measurement().unwrap();
    let slow = suite.get("slow").unwrap().result().measurement().unwrap();
    assert!(fast.latency.mean < slow.latency.mean);
    assert!(fast.throughput.mean > slow.throughput.mean);
}

/// Async hooks are rejected by the synchronous run mode
#[test]
fn test_async_before_all_in_sync_mode() {
    let mut suite = Suite::new(config(Duration::ZERO, 5));
    let hooks = Hooks::new().before_all(|_, _| Invocation::pending(async { Ok(()) }));
    suite
        .add(Task::from_sync("hooked", || Ok(())).with_hooks(hooks))
        .unwrap();

    suite.run_sync().unwrap();

    let task = suite.get("hooked").unwrap();
    assert_eq!(task.result().state(), TaskState::Errored);
    assert_eq!(task.runs(), 0);
    assert_eq!(
        task.result().error().unwrap().to_string(),
        "`beforeAll` function must be sync when using the synchronous run mode"
    );
}

/// Async bodies are awaited in the async run mode
#[tokio::test]
async fn test_async_suite() {
    let mut suite = Suite::new(config(Duration::from_millis(20), 5));
    suite
        .add(Task::from_async("sleep_2ms", || async {
            tokio::time::sleep(Duration::from_millis(2)).await;
            Ok(())
        }))
        .unwrap();

    let tasks = suite.run().await.unwrap();

    let m = tasks[0].result().measurement().unwrap();
    assert!(tasks[0].runs() >= 5);
    assert!(m.latency.min >= 2.0);
}

/// Task-mode concurrency keeps at most `threshold` iterations in flight
#[tokio::test]
async fn test_task_concurrency_respects_threshold() {
    let active = Rc::new(Cell::new(0usize));
    let peak = Rc::new(Cell::new(0usize));

    let mut suite = Suite::new(SuiteConfig {
        concurrency: ConcurrencyMode::Task,
        threshold: 3,
        ..config(Duration::ZERO, 12)
    });
    let (a, p) = (Rc::clone(&active), Rc::clone(&peak));
    suite
        .add(Task::from_async("overlapping", move || {
            let (a, p) = (Rc::clone(&a), Rc::clone(&p));
            async move {
                a.set(a.get() + 1);
                p.set(p.get().max(a.get()));
                tokio::time::sleep(Duration::from_millis(1)).await;
                a.set(a.get() - 1);
                Ok(())
            }
        }))
        .unwrap();

    suite.run().await.unwrap();

    assert_eq!(suite.get("overlapping").unwrap().runs(), 12);
    assert_eq!(peak.get(), 3);
    assert_eq!(active.get(), 0);
}

/// Sync mode refuses concurrency before running anything
#[test]
fn test_sync_mode_rejects_concurrency() {
    let mut suite = Suite::new(SuiteConfig {
        concurrency: ConcurrencyMode::Bench,
        ..config(Duration::ZERO, 1)
    });
    suite.add(Task::from_sync("t", || Ok(()))).unwrap();

    let err = suite.run_sync().unwrap_err();
    assert!(matches!(err, BenchError::ConcurrencyRequiresAsync(ConcurrencyMode::Bench)));
    assert_eq!(suite.get("t").unwrap().result().state(), TaskState::NotStarted);
}

/// Reset puts every task back to its initial state
#[test]
fn test_reset_after_run() {
    let mut suite = Suite::new(config(Duration::ZERO, 4))
        .with_clock(Arc::new(ManualClock::new()));
    suite.add(Task::from_sync("a", || Ok(()))).unwrap();

    suite.run_sync().unwrap();
    assert_eq!(suite.get("a").unwrap().runs(), 4);

    suite.reset();
    let task = suite.get("a").unwrap();
    assert_eq!(task.runs(), 0);
    assert_eq!(task.result().state(), TaskState::NotStarted);
}

/// The limiter admits in submission order and never exceeds its limit
#[tokio::test]
async fn test_limiter_fifo_and_bound() {
    let limiter = Limiter::new(2);
    let order = RefCell::new(Vec::new());
    let active = Cell::new(0usize);
    let peak = Cell::new(0usize);

    let units = (0..6).map(|i| {
        let (order, active, peak) = (&order, &active, &peak);
        async move {
            order.borrow_mut().push(i);
            active.set(active.get() + 1);
            peak.set(peak.get().max(active.get()));
            tokio::time::sleep(Duration::from_millis(1)).await;
            active.set(active.get() - 1);
            anyhow::Ok(i)
        }
    });

    let outputs = limiter.run_all(units).await.unwrap();

    assert_eq!(outputs, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(*order.borrow(), vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(peak.get(), 2);
    assert_eq!(limiter.active_count(), 0);
}

/// Single-sample and zero-mean statistics are defined
#[test]
fn test_statistics_edge_cases() {
    let single = compute_statistics(&[4.0]).unwrap();
    assert_eq!(single.variance, 0.0);
    assert_eq!(single.p50, 4.0);

    let zeros = compute_statistics(&[0.0, 0.0, 0.0]).unwrap();
    assert_eq!(zeros.rme, 0.0);
    assert!(compute_statistics(&[]).is_err());
}
