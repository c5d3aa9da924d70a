//! Cancellation
//!
//! An [`AbortSignal`] is a clonable one-way flag: once aborted it stays
//! aborted. The engine polls it between iterations; async callers can also
//! await the transition.

use tokio_util::sync::CancellationToken;

/// Externally triggered, sticky abort flag
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    token: CancellationToken,
}

impl AbortSignal {
    /// Create a signal that has not fired
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal. Idempotent.
    pub fn abort(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!("abort signal fired");
        }
        self.token.cancel();
    }

    /// Whether the signal has fired
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the signal fires (immediately if it already has)
    pub async fn aborted(&self) {
        self.token.cancelled().await
    }

    /// A signal that fires with this one but can also be fired on its own
    pub fn child(&self) -> AbortSignal {
        AbortSignal {
            token: self.token.child_token(),
        }
    }
}

/// The suite signal and the task signal combined: aborted if either is.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct EffectiveAbort<'a> {
    suite: Option<&'a AbortSignal>,
    task: Option<&'a AbortSignal>,
}

impl<'a> EffectiveAbort<'a> {
    pub(crate) fn new(suite: Option<&'a AbortSignal>, task: Option<&'a AbortSignal>) -> Self {
        Self { suite, task }
    }

    pub(crate) fn is_aborted(&self) -> bool {
        self.suite.is_some_and(AbortSignal::is_aborted)
            || self.task.is_some_and(AbortSignal::is_aborted)
    }
}
