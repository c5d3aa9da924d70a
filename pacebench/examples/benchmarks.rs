//! PaceBench Example Benchmarks
//!
//! This example demonstrates PaceBench features and serves as a template for
//! creating your own benchmark suite.
//!
//! Run with:
//!   cargo run --example benchmarks                            # Run all tasks
//!   cargo run --example benchmarks -- --help                  # Show all options
//!   cargo run --example benchmarks -- list                    # List tasks
//!   cargo run --example benchmarks -- '^sort_' --time 200ms   # Run only sorting tasks
//!   cargo run --example benchmarks -- --format json -o out.json

use pacebench::prelude::*;
use rand::prelude::*;
use std::cell::RefCell;
use std::collections::HashMap;
use std::hint::black_box;
use std::rc::Rc;
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    let mut suite = Suite::new(SuiteConfig {
        time: Duration::from_millis(500),
        ..SuiteConfig::default()
    });

    // ========================================================================
    // Basic tasks
    // ========================================================================

    suite.add(Task::from_sync("addition", || {
        black_box(black_box(42u64) + black_box(17u64));
        Ok(())
    }))?;

    let data: Vec<i64> = (0..1000).collect();
    suite.add(Task::from_sync("vector_sum", move || {
        black_box(data.iter().sum::<i64>());
        Ok(())
    }))?;

    // ========================================================================
    // Hooks: fresh input per iteration, built outside the timed region
    // ========================================================================

    let input: Rc<RefCell<Vec<i32>>> = Rc::default();
    let fill = Rc::clone(&input);
    let hooks = Hooks::new()
        .before_all(|task, phase| {
            log_phase(task, phase);
        })
        .before_each(move |_, _| {
            let mut rng = StdRng::seed_from_u64(7);
            *fill.borrow_mut() = (0..10_000).map(|_| rng.r#gen()).collect();
        });
    let sort_input = Rc::clone(&input);
    suite.add(
        Task::from_sync("sort_unstable_10k", move || {
            sort_input.borrow_mut().sort_unstable();
            Ok(())
        })
        .with_hooks(hooks),
    )?;

    suite.add(
        Task::from_sync("sort_stable_1k", || {
            let mut rng = StdRng::seed_from_u64(7);
            let mut data: Vec<i32> = (0..1000).map(|_| rng.r#gen()).collect();
            data.sort();
            black_box(data);
            Ok(())
        })
        .with_iterations(200),
    )?;

    // ========================================================================
    // HashMap tasks
    // ========================================================================

    suite.add(Task::from_sync("hashmap_insert", || {
        let mut map = HashMap::new();
        for i in 0..100 {
            map.insert(i, i * 2);
        }
        black_box(map);
        Ok(())
    }))?;

    let map: HashMap<i32, i32> = (0..1000).map(|i| (i, i * 2)).collect();
    suite.add(Task::from_sync("hashmap_lookup", move || {
        let sum: i32 = (0..100).filter_map(|i| map.get(&i)).sum();
        black_box(sum);
        Ok(())
    }))?;

    // ========================================================================
    // Async tasks
    // ========================================================================

    suite.add(
        Task::from_async("async_sleep_1ms", || async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            Ok(())
        })
        .with_time(Duration::from_millis(100)),
    )?;

    // ========================================================================
    // Failure handling: recorded as errored, other tasks still run
    // ========================================================================

    let mut remaining = 5u32;
    suite.add(Task::from_sync("fails_after_five", move || {
        remaining = remaining.checked_sub(1).ok_or_else(|| anyhow::anyhow!("out of budget"))?;
        Ok(())
    }))?;

    pacebench::run(suite)
}

fn log_phase(task: &str, phase: Phase) {
    if std::env::var_os("PACEBENCH_EXAMPLE_TRACE").is_some() {
        eprintln!("{task}: {phase}");
    }
}
