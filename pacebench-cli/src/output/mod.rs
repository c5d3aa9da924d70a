//! Result Output
//!
//! Turns a finished suite into something a person or a tool can read.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Suite (after run)
//!       │
//!       ▼
//! ┌─────────────┐
//! │   report    │  Snapshot tasks, results and host metadata
//! └──────┬──────┘
//!        │
//!        ├──────────────────┐
//!        ▼                  ▼
//! ┌─────────────┐    ┌─────────────┐
//! │ formatting  │    │    json     │
//! └─────────────┘    └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`report`] - Report data structures and construction
//! - [`formatting`] - Column map per task and the aligned terminal table
//! - [`metadata`] - Host and CPU details for the report header
//! - [`progress`] - Progress bar driven by suite events

mod formatting;
mod metadata;
mod progress;
mod report;

pub use formatting::{COLUMNS, format_human_output, format_task_row};
pub use metadata::build_report_meta;
pub use progress::attach_progress;
pub use report::{Report, ReportMeta, ReportSummary, TaskReport, build_report, generate_json_report};

/// Output format for run results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Aligned terminal table
    #[default]
    Human,
    /// Pretty-printed JSON report
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" | "text" | "table" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}
