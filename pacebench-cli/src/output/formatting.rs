//! Output Formatting
//!
//! Human-readable output for run reports: one row per task, rendered as an
//! aligned table followed by a short summary. Latency is shown in
//! nanoseconds and throughput in operations per second, each average
//! annotated with its relative margin of error.

use super::report::{Report, TaskReport};
use std::collections::BTreeMap;

/// Column names, in display order
pub const COLUMNS: [&str; 6] = [
    "Task name",
    "Latency avg (ns)",
    "Latency med (ns)",
    "Throughput avg (ops/s)",
    "Throughput med (ops/s)",
    "Samples",
];

const NS_PER_MS: f64 = 1e6;

/// Map a task's result to column name → display string.
///
/// Tasks without statistics show their state under the latency average and
/// `N/A` everywhere else.
pub fn format_task_row(task: &TaskReport) -> BTreeMap<&'static str, String> {
    let mut row = BTreeMap::new();
    row.insert(COLUMNS[0], task.name.clone());

    match &task.measurement {
        Some(m) => {
            let latency = &m.latency;
            let throughput = &m.throughput;
            row.insert(
                COLUMNS[1],
                format!("{:.2} ± {:.2}%", latency.mean * NS_PER_MS, latency.rme),
            );
            row.insert(COLUMNS[2], format!("{:.2}", latency.p50 * NS_PER_MS));
            row.insert(
                COLUMNS[3],
                format!("{:.0} ± {:.2}%", throughput.mean, throughput.rme),
            );
            row.insert(COLUMNS[4], format!("{:.0}", throughput.p50));
            row.insert(COLUMNS[5], latency.samples_count.to_string());
        }
        None => {
            row.insert(COLUMNS[1], task.state.to_string());
            for column in &COLUMNS[2..] {
                row.insert(*column, "N/A".to_string());
            }
        }
    }

    row
}

/// Format a report for terminal display
pub fn format_human_output(report: &Report) -> String {
    let rows: Vec<_> = report.results.iter().map(format_task_row).collect();

    let widths: Vec<usize> = COLUMNS
        .iter()
        .map(|column| {
            rows.iter()
                .filter_map(|row| row.get(column))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut output = String::new();
    output.push('\n');
    output.push_str("PaceBench Results\n");
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    let header: Vec<String> = COLUMNS
        .iter()
        .zip(&widths)
        .map(|(column, width)| pad(column, *width, 0))
        .collect();
    output.push_str(&format!("  {}\n", header.join(" │ ")));
    let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    output.push_str(&format!("  {}\n", rule.join("─┼─")));

    for row in &rows {
        let cells: Vec<String> = COLUMNS
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (column, width))| {
                let cell = row.get(column).map(String::as_str).unwrap_or("");
                pad(cell, *width, i)
            })
            .collect();
        output.push_str(&format!("  {}\n", cells.join(" │ ")));
    }

    let errors: Vec<_> = report
        .results
        .iter()
        .filter_map(|r| r.error.as_ref().map(|e| (&r.name, e)))
        .collect();
    if !errors.is_empty() {
        output.push('\n');
        for (name, error) in errors {
            output.push_str(&format!("  ✗ {}: {}\n", name, error));
        }
    }

    let s = &report.summary;
    output.push('\n');
    output.push_str(&format!(
        "Summary: {} completed, {} errored, {} aborted, {} not run ({} total) in {:.2} ms\n",
        s.completed, s.errored, s.aborted, s.not_started, s.total_tasks, s.total_duration_ms
    ));

    output
}

// Name column left-aligned, numbers right-aligned.
fn pad(cell: &str, width: usize, column: usize) -> String {
    let fill = width.saturating_sub(cell.chars().count());
    if column == 0 {
        format!("{}{}", cell, " ".repeat(fill))
    } else {
        format!("{}{}", " ".repeat(fill), cell)
    }
}
