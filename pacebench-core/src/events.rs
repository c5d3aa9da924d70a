//! Lifecycle events emitted by suites and tasks

use std::fmt;

/// Event vocabulary shared by suites and tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A task was added to the suite
    Add,
    /// A task was removed from the suite
    Remove,
    /// Results were cleared
    Reset,
    /// A run (suite) or task run started
    Start,
    /// A task entered its warmup phase
    Warmup,
    /// A task finished, whatever its outcome
    Cycle,
    /// A task errored
    Error,
    /// A task observed an abort
    Abort,
    /// A run (suite) or task run completed
    Complete,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Add => "add",
            EventKind::Remove => "remove",
            EventKind::Reset => "reset",
            EventKind::Start => "start",
            EventKind::Warmup => "warmup",
            EventKind::Cycle => "cycle",
            EventKind::Error => "error",
            EventKind::Abort => "abort",
            EventKind::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// A single notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event<'a> {
    /// What happened
    pub kind: EventKind,
    /// The task it happened to, if any
    pub task: Option<&'a str>,
}

type Listener = Box<dyn FnMut(&Event<'_>)>;

/// Registered event listeners, invoked in registration order
#[derive(Default)]
pub struct Listeners {
    entries: Vec<(EventKind, Listener)>,
}

impl Listeners {
    /// Register a listener for one kind of event
    pub fn on<F>(&mut self, kind: EventKind, listener: F)
    where
        F: FnMut(&Event<'_>) + 'static,
    {
        self.entries.push((kind, Box::new(listener)));
    }

    /// Drop every listener for `kind`
    pub fn off(&mut self, kind: EventKind) {
        self.entries.retain(|(k, _)| *k != kind);
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no listener is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn emit(&mut self, kind: EventKind, task: Option<&str>) {
        let event = Event { kind, task };
        tracing::trace!(event = %kind, task = task.unwrap_or_default(), "emit");
        for (k, listener) in &mut self.entries {
            if *k == kind {
                listener(&event);
            }
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}
