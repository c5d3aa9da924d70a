//! Report Data Structures

use super::metadata::build_report_meta;
use chrono::{DateTime, Utc};
use pacebench_core::{HostInfo, Measurement, Suite, SuiteConfig, Task, TaskState};
use serde::{Deserialize, Serialize};

/// Complete run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Where and when the run happened
    pub meta: ReportMeta,
    /// Effective suite settings
    pub config: SuiteConfig,
    /// One entry per task, in registration order
    pub results: Vec<TaskReport>,
    /// Counts per outcome
    pub summary: ReportSummary,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// PaceBench version
    pub version: String,
    /// Report generation time
    pub timestamp: DateTime<Utc>,
    /// Host the suite ran on
    pub host: HostInfo,
    /// CPU model, if known
    pub cpu: String,
    /// Available parallelism
    pub cpu_cores: u32,
}

/// Individual task result in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
    /// Task name
    pub name: String,
    /// Final state
    pub state: TaskState,
    /// Run-phase iterations
    pub runs: u64,
    /// Statistics, when the task produced any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement: Option<Measurement>,
    /// Error message of an errored task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Task> for TaskReport {
    fn from(task: &Task) -> Self {
        let result = task.result();
        Self {
            name: task.name().to_string(),
            state: result.state(),
            runs: task.runs(),
            measurement: result.measurement().cloned(),
            error: result.error().map(|e| format!("{e:#}")),
        }
    }
}

/// Outcome counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Tasks in the report
    pub total_tasks: usize,
    /// Tasks that completed
    pub completed: usize,
    /// Tasks that errored
    pub errored: usize,
    /// Tasks that observed an abort (with or without statistics)
    pub aborted: usize,
    /// Tasks that never ran
    pub not_started: usize,
    /// Wall time of the whole run
    pub total_duration_ms: f64,
}

/// Snapshot a suite after it ran
pub fn build_report(suite: &Suite, total_duration_ms: f64) -> Report {
    let results: Vec<TaskReport> = suite.tasks().iter().map(TaskReport::from).collect();

    let mut summary = ReportSummary {
        total_tasks: results.len(),
        total_duration_ms,
        ..ReportSummary::default()
    };
    for result in &results {
        match result.state {
            TaskState::Completed => summary.completed += 1,
            TaskState::Errored => summary.errored += 1,
            TaskState::Aborted | TaskState::AbortedWithStatistics => summary.aborted += 1,
            TaskState::NotStarted | TaskState::Started => summary.not_started += 1,
        }
    }

    Report {
        meta: build_report_meta(&suite.host_cache().get()),
        config: suite.config().clone(),
        results,
        summary,
    }
}

/// Generate a prettified JSON report.
pub fn generate_json_report(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
