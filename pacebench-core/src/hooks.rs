//! Hook Lifecycle
//!
//! User callbacks (the benchmark body and the four lifecycle hooks) may be
//! synchronous or asynchronous, decided per call: each call returns an
//! [`Invocation`] that is either already settled or still pending.

use crate::error::BenchError;
use futures::future::LocalBoxFuture;
use std::fmt;
use std::future::Future;

/// Which callback an error or contract violation refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Once before a phase's iterations
    BeforeAll,
    /// Once after a phase's iterations
    AfterAll,
    /// Before every iteration, untimed
    BeforeEach,
    /// After every iteration, untimed
    AfterEach,
    /// The measured benchmark body
    Body,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HookKind::BeforeAll => "beforeAll",
            HookKind::AfterAll => "afterAll",
            HookKind::BeforeEach => "beforeEach",
            HookKind::AfterEach => "afterEach",
            HookKind::Body => "fn",
        })
    }
}

/// The phase a hook is being invoked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Untimed warmup iterations
    Warmup,
    /// Measured iterations
    Run,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Warmup => "warmup",
            Phase::Run => "run",
        })
    }
}

/// Whether the caller awaits pending invocations or rejects them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Await pending invocations
    Async,
    /// Every invocation must already be settled
    Sync,
}

/// Outcome of calling a user callback
pub enum Invocation {
    /// The callback completed synchronously
    Ready(anyhow::Result<()>),
    /// The callback returned work that completes later
    Pending(LocalBoxFuture<'static, anyhow::Result<()>>),
}

impl Invocation {
    /// Wrap a future as a pending invocation
    pub fn pending<F>(fut: F) -> Self
    where
        F: Future<Output = anyhow::Result<()>> + 'static,
    {
        Invocation::Pending(Box::pin(fut))
    }

    /// Whether this invocation still has to be awaited
    pub fn is_pending(&self) -> bool {
        matches!(self, Invocation::Pending(_))
    }

    /// Drive the invocation to completion.
    ///
    /// Under [`RunMode::Sync`] a pending invocation is dropped unpolled and
    /// reported as a contract violation for `kind`.
    pub(crate) async fn settle(self, mode: RunMode, kind: HookKind) -> anyhow::Result<()> {
        match self {
            Invocation::Ready(result) => result,
            Invocation::Pending(_) if mode == RunMode::Sync => {
                Err(BenchError::MustBeSync(kind).into())
            }
            Invocation::Pending(fut) => fut.await,
        }
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invocation::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            Invocation::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

impl From<()> for Invocation {
    fn from((): ()) -> Self {
        Invocation::Ready(Ok(()))
    }
}

impl From<anyhow::Result<()>> for Invocation {
    fn from(result: anyhow::Result<()>) -> Self {
        Invocation::Ready(result)
    }
}

type HookFn = Box<dyn FnMut(&str, Phase) -> Invocation>;
pub(crate) type BodyFn = Box<dyn FnMut() -> Invocation>;

fn boxed_hook<F, R>(mut hook: F) -> HookFn
where
    F: FnMut(&str, Phase) -> R + 'static,
    R: Into<Invocation>,
{
    Box::new(move |task, phase| hook(task, phase).into())
}

/// Optional lifecycle hooks around a task's iterations.
///
/// Hooks receive the task name and the phase they run in. Errors from a hook
/// end the phase and are recorded on the task.
#[derive(Default)]
pub struct Hooks {
    before_all: Option<HookFn>,
    after_all: Option<HookFn>,
    before_each: Option<HookFn>,
    after_each: Option<HookFn>,
}

impl Hooks {
    /// No hooks
    pub fn new() -> Self {
        Self::default()
    }

    /// Run once before each phase
    pub fn before_all<F, R>(mut self, hook: F) -> Self
    where
        F: FnMut(&str, Phase) -> R + 'static,
        R: Into<Invocation>,
    {
        self.before_all = Some(boxed_hook(hook));
        self
    }

    /// Run once after each phase that did not fail
    pub fn after_all<F, R>(mut self, hook: F) -> Self
    where
        F: FnMut(&str, Phase) -> R + 'static,
        R: Into<Invocation>,
    {
        self.after_all = Some(boxed_hook(hook));
        self
    }

    /// Run before every iteration, outside the timed region
    pub fn before_each<F, R>(mut self, hook: F) -> Self
    where
        F: FnMut(&str, Phase) -> R + 'static,
        R: Into<Invocation>,
    {
        self.before_each = Some(boxed_hook(hook));
        self
    }

    /// Run after every iteration, outside the timed region
    pub fn after_each<F, R>(mut self, hook: F) -> Self
    where
        F: FnMut(&str, Phase) -> R + 'static,
        R: Into<Invocation>,
    {
        self.after_each = Some(boxed_hook(hook));
        self
    }

    fn slot(&mut self, kind: HookKind) -> Option<&mut HookFn> {
        match kind {
            HookKind::BeforeAll => self.before_all.as_mut(),
            HookKind::AfterAll => self.after_all.as_mut(),
            HookKind::BeforeEach => self.before_each.as_mut(),
            HookKind::AfterEach => self.after_each.as_mut(),
            HookKind::Body => None,
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before_all", &self.before_all.is_some())
            .field("after_all", &self.after_all.is_some())
            .field("before_each", &self.before_each.is_some())
            .field("after_each", &self.after_each.is_some())
            .finish()
    }
}

/// A task's body together with its hooks
pub(crate) struct Routine {
    body: BodyFn,
    hooks: Hooks,
}

impl Routine {
    pub(crate) fn new(body: BodyFn, hooks: Hooks) -> Self {
        Self { body, hooks }
    }

    pub(crate) fn set_hooks(&mut self, hooks: Hooks) {
        self.hooks = hooks;
    }

    /// Call the callback for `kind`, if one is registered.
    pub(crate) fn invoke(&mut self, kind: HookKind, task: &str, phase: Phase) -> Option<Invocation> {
        match kind {
            HookKind::Body => Some((self.body)()),
            _ => self.hooks.slot(kind).map(|hook| hook(task, phase)),
        }
    }
}
