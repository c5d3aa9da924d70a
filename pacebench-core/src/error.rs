//! Error types for benchmark execution

use crate::engine::ConcurrencyMode;
use crate::hooks::HookKind;
use pacebench_stats::StatsError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by suites, tasks and the engine
#[derive(Debug, Error)]
pub enum BenchError {
    /// A callback returned a pending invocation under the synchronous run mode
    #[error("`{0}` function must be sync when using the synchronous run mode")]
    MustBeSync(HookKind),

    /// Concurrent modes need the asynchronous runner
    #[error("concurrency mode `{0}` is not supported by the synchronous run mode")]
    ConcurrencyRequiresAsync(ConcurrencyMode),

    /// A concurrent mode was configured with a limit that admits nothing
    #[error("concurrency mode `{0}` requires a concurrency limit of at least 1")]
    InvalidConcurrencyLimit(ConcurrencyMode),

    /// Task names are unique within a suite
    #[error("a task named `{0}` is already registered")]
    DuplicateTask(String),

    /// A task errored while the suite runs with `throws` enabled
    #[error("task `{task}` failed: {error}")]
    TaskFailed {
        /// Name of the failing task
        task: String,
        /// The error recorded on the task
        error: Arc<anyhow::Error>,
    },

    /// Several concurrently running units failed
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// Statistics could not be derived from the collected samples
    #[error(transparent)]
    Stats(#[from] StatsError),
}

impl BenchError {
    /// Recover a `BenchError` that travelled through an `anyhow::Error`.
    pub(crate) fn from_anyhow(err: anyhow::Error) -> Self {
        match err.downcast::<BenchError>() {
            Ok(err) => err,
            Err(err) => match err.downcast::<AggregateError>() {
                Ok(aggregate) => BenchError::Aggregate(aggregate),
                Err(other) => BenchError::Aggregate(AggregateError::new(vec![other])),
            },
        }
    }
}

/// Every failure from a batch of concurrently executed units
#[derive(Debug, Error)]
pub struct AggregateError {
    errors: Vec<anyhow::Error>,
}

impl AggregateError {
    /// Wrap a list of failures
    pub fn new(errors: Vec<anyhow::Error>) -> Self {
        Self { errors }
    }

    /// The individual failures, in submission order
    pub fn errors(&self) -> &[anyhow::Error] {
        &self.errors
    }

    /// Consume into the individual failures
    pub fn into_errors(self) -> Vec<anyhow::Error> {
        self.errors
    }

    /// No failures → `None`, one → that error, several → an aggregate.
    pub(crate) fn collapse(mut errors: Vec<anyhow::Error>) -> Option<anyhow::Error> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(anyhow::Error::new(AggregateError::new(errors))),
        }
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} units failed", self.errors.len())?;
        for (i, err) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{err}")?;
        }
        Ok(())
    }
}
