#![warn(missing_docs)]
//! PaceBench CLI Library
//!
//! This module provides the command-line front end for benchmark binaries.
//! Build a [`Suite`] in your main function and hand it to
//! `pacebench::run()` (or `pacebench_cli::run()`) to get task filtering,
//! `pace.toml` configuration, a progress bar and human or JSON reports.
//!
//! # Example
//!
//! ```ignore
//! use pacebench::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut suite = Suite::new(SuiteConfig::default());
//!     suite.add(Task::from_sync("sum", || {
//!         std::hint::black_box((0..1000u64).sum::<u64>());
//!         Ok(())
//!     }))?;
//!     pacebench_cli::run(suite)
//! }
//! ```

mod config;
mod output;
mod planner;

pub use config::*;
pub use output::{
    COLUMNS, OutputFormat, Report, ReportMeta, ReportSummary, TaskReport, attach_progress,
    build_report, build_report_meta, format_human_output, format_task_row, generate_json_report,
};
pub use planner::{ExecutionPlan, apply_plan, build_plan};

use clap::{Parser, Subcommand};
use pacebench_core::{AbortSignal, BenchError, ConcurrencyMode, Suite, SuiteConfig, Task};
use regex::Regex;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

/// PaceBench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "pacebench")]
#[command(author, version, about = "PaceBench - task benchmarking for Rust")]
pub struct Cli {
    /// Optional subcommand (List, Run); defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Filter tasks by regex pattern
    #[arg(default_value = ".*")]
    pub filter: String,

    /// Run-phase time budget per task (e.g. "1s", "100ms")
    #[arg(long, value_parser = parse_duration_arg)]
    pub time: Option<Duration>,

    /// Run-phase iteration cap per task
    #[arg(long)]
    pub iterations: Option<u64>,

    /// Warmup time budget per task
    #[arg(long, value_parser = parse_duration_arg)]
    pub warmup_time: Option<Duration>,

    /// Warmup iteration cap per task
    #[arg(long)]
    pub warmup_iterations: Option<u64>,

    /// Skip the warmup phase
    #[arg(long)]
    pub no_warmup: bool,

    /// Concurrency mode: none, task or bench
    #[arg(long)]
    pub concurrency: Option<ConcurrencyMode>,

    /// Maximum number of in-flight units in a concurrent mode
    #[arg(long)]
    pub threshold: Option<usize>,

    /// Use the synchronous run mode (async hooks and bodies become errors)
    #[arg(long)]
    pub sync: bool,

    /// Stop at the first failing task
    #[arg(long)]
    pub throws: bool,

    /// Keep raw samples in the report
    #[arg(long)]
    pub retain_samples: bool,

    /// Output format: human or json (defaults to pace.toml, then human)
    #[arg(long)]
    pub format: Option<String>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Internal: Absorb cargo bench's --bench flag
    #[arg(long, hide = true)]
    pub bench: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// List the tasks selected by the filter
    List,
    /// Run tasks (default)
    Run,
}

fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    PaceConfig::parse_duration(s).map_err(|e| e.to_string())
}

/// Run the PaceBench CLI against `suite`.
/// This is the main entry point for benchmark binaries.
///
/// Exits the process with status 1 when any task errored.
pub fn run(suite: Suite) -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Some(report) = run_with_cli(cli, suite)? {
        if report.summary.errored > 0 {
            eprintln!("\n{} task(s) errored", report.summary.errored);
            std::process::exit(1);
        }
    }
    Ok(())
}

/// Run the PaceBench CLI with pre-parsed arguments.
///
/// Returns the run report, or `None` when nothing ran (`list`, or a filter
/// that matched no task).
pub fn run_with_cli(cli: Cli, mut suite: Suite) -> anyhow::Result<Option<Report>> {
    let filter = if cli.verbose {
        "pacebench=debug"
    } else {
        "pacebench=info"
    };
    // A subscriber may already be installed by an embedding application.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    // Discover pace.toml configuration (CLI flags override)
    let file = PaceConfig::discover();
    let base = match &file {
        Some(config) => config.suite_config()?,
        None => suite.config().clone(),
    };
    *suite.config_mut() = build_suite_config(&cli, base);

    let format: OutputFormat = cli
        .format
        .as_deref()
        .or(file.as_ref().map(|c| c.output.format.as_str()))
        .unwrap_or("human")
        .parse()
        .map_err(anyhow::Error::msg)?;

    let filter_re =
        Regex::new(&cli.filter).map_err(|e| anyhow::anyhow!("Invalid filter regex: {}", e))?;
    let plan = build_plan(suite.tasks().iter().map(Task::name), Some(&filter_re));

    match cli.command {
        Some(Commands::List) => {
            list_tasks(&plan);
            Ok(None)
        }
        Some(Commands::Run) | None => run_tasks(&cli, suite, &plan, format),
    }
}

/// Layer CLI overrides on top of `base`.
pub fn build_suite_config(cli: &Cli, base: SuiteConfig) -> SuiteConfig {
    SuiteConfig {
        time: cli.time.unwrap_or(base.time),
        iterations: cli.iterations.unwrap_or(base.iterations),
        warmup: base.warmup && !cli.no_warmup,
        warmup_time: cli.warmup_time.unwrap_or(base.warmup_time),
        warmup_iterations: cli.warmup_iterations.unwrap_or(base.warmup_iterations),
        concurrency: cli.concurrency.unwrap_or(base.concurrency),
        threshold: cli.threshold.unwrap_or(base.threshold),
        retain_samples: base.retain_samples || cli.retain_samples,
        throws: base.throws || cli.throws,
    }
}

fn list_tasks(plan: &ExecutionPlan) {
    println!("PaceBench Plan:");
    for name in &plan.tasks {
        println!("├── {}", name);
    }
    println!("{} tasks found.", plan.tasks.len());
}

fn run_tasks(
    cli: &Cli,
    mut suite: Suite,
    plan: &ExecutionPlan,
    format: OutputFormat,
) -> anyhow::Result<Option<Report>> {
    if plan.is_empty() {
        println!("No tasks found.");
        return Ok(None);
    }
    apply_plan(&mut suite, plan);

    let existing = suite.signal().cloned();
    let signal = match existing {
        Some(signal) => signal,
        None => {
            let signal = AbortSignal::new();
            suite = suite.with_signal(signal.clone());
            signal
        }
    };
    let _ctrl_c = watch_ctrl_c(signal);

    let config = suite.config();
    let mode_str = match config.concurrency {
        ConcurrencyMode::None => "sequential".to_string(),
        mode => format!("concurrency: {}", mode),
    };
    eprintln!(
        "Running {} tasks ({}, {})...\n",
        plan.tasks.len(),
        mode_str,
        if cli.sync { "sync" } else { "async" }
    );

    let pb = attach_progress(&mut suite, cli.verbose);
    let start_time = Instant::now();

    let outcome = if cli.sync {
        suite.run_sync().map(|_| ())
    } else {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        rt.block_on(suite.run()).map(|_| ())
    };

    let total_duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;
    pb.finish_and_clear();

    match outcome {
        Ok(()) => {}
        // Task failures surface through `throws`; the report still covers every task.
        Err(e @ (BenchError::TaskFailed { .. } | BenchError::Aggregate(_))) => {
            eprintln!("Run stopped: {}", e);
        }
        Err(e) => return Err(e.into()),
    }

    let report = build_report(&suite, total_duration_ms);

    // Generate output
    let output = match format {
        OutputFormat::Json => generate_json_report(&report)?,
        OutputFormat::Human => format_human_output(&report),
    };

    // Write output
    if let Some(ref path) = cli.output {
        let mut file = std::fs::File::create(path)?;
        file.write_all(output.as_bytes())?;
        println!("Report written to: {}", path.display());
    } else {
        print!("{}", output);
    }

    Ok(Some(report))
}

/// The signal a Ctrl-C aborts; `None` between runs.
type CtrlCTarget = Mutex<Option<AbortSignal>>;

static CTRL_C_TARGET: OnceLock<CtrlCTarget> = OnceLock::new();

/// Disarms the Ctrl-C watcher when the run ends.
struct CtrlCGuard {
    target: &'static CtrlCTarget,
}

impl Drop for CtrlCGuard {
    fn drop(&mut self) {
        if let Ok(mut current) = self.target.lock() {
            current.take();
        }
    }
}

/// Abort `signal` on Ctrl-C until the returned guard drops.
///
/// One watcher thread serves the whole process; each run only swaps the
/// target. The thread has its own runtime so it also fires while a
/// synchronous body is running.
fn watch_ctrl_c(signal: AbortSignal) -> CtrlCGuard {
    let target = CTRL_C_TARGET.get_or_init(|| {
        spawn_ctrl_c_watcher();
        Mutex::new(None)
    });
    arm(target, signal)
}

fn arm(target: &'static CtrlCTarget, signal: AbortSignal) -> CtrlCGuard {
    if let Ok(mut current) = target.lock() {
        *current = Some(signal);
    }
    CtrlCGuard { target }
}

fn spawn_ctrl_c_watcher() {
    let spawned = std::thread::Builder::new()
        .name("pacebench-ctrl-c".to_string())
        .spawn(|| {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::warn!(error = %e, "ctrl-c watcher unavailable");
                    return;
                }
            };
            rt.block_on(async {
                while tokio::signal::ctrl_c().await.is_ok() {
                    let interrupted = CTRL_C_TARGET.get().is_some_and(abort_target);
                    if !interrupted {
                        // nothing running, behave like the default handler
                        std::process::exit(130);
                    }
                }
            });
        });
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "ctrl-c watcher unavailable");
    }
}

/// Abort the armed signal, if any. Returns whether a run was interrupted.
fn abort_target(target: &CtrlCTarget) -> bool {
    let armed = target.lock().ok().and_then(|current| current.clone());
    match armed {
        Some(signal) => {
            tracing::warn!("interrupted, aborting remaining work");
            signal.abort();
            true
        }
        None => false,
    }
}
