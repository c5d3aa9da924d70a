//! Progress reporting
//!
//! A bar that advances each time the suite reports a finished task.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use pacebench_core::{EventKind, Suite};

/// Attach a progress bar to `suite`; the caller finishes it after the run.
pub fn attach_progress(suite: &mut Suite, hidden: bool) -> ProgressBar {
    let len = suite.tasks().len() as u64;
    let pb = if hidden {
        ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::hidden())
    } else {
        ProgressBar::new(len)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message("warming up...");

    let bar = pb.clone();
    suite.on(EventKind::Cycle, move |event| {
        bar.inc(1);
        if let Some(task) = event.task {
            bar.set_message(task.to_string());
        }
    });
    let bar = pb.clone();
    suite.on(EventKind::Error, move |event| {
        if let Some(task) = event.task {
            bar.println(format!("✗ {task} errored"));
        }
    });

    pb
}
