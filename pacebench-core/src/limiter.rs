//! Concurrency Limiter
//!
//! A bounded-parallelism gate: at most `limit` submitted futures run at once,
//! the rest wait in a FIFO queue. Everything runs on the caller's task, so the
//! counters live in a `RefCell` whose borrows never span an `.await`.
//!
//! When a running unit finishes, its slot is handed straight to the oldest
//! queued unit before the finishing `submit` resolves, so the active count
//! never dips below what the backlog can fill.

use crate::error::AggregateError;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use tokio::sync::oneshot;

#[derive(Debug, Default)]
struct LimiterState {
    active: usize,
    pending: usize,
    next_ticket: u64,
    queue: VecDeque<(u64, oneshot::Sender<()>)>,
}

/// FIFO bounded-parallelism scheduler
#[derive(Debug)]
pub struct Limiter {
    limit: usize,
    state: RefCell<LimiterState>,
}

impl Limiter {
    /// Create a limiter admitting at most `limit` concurrent units.
    ///
    /// A limit of zero never admits anything; pair it with a deadline.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            state: RefCell::new(LimiterState::default()),
        }
    }

    /// Configured concurrency bound
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Units currently running
    pub fn active_count(&self) -> usize {
        self.state.borrow().active
    }

    /// Units waiting for admission
    pub fn pending_count(&self) -> usize {
        self.state.borrow().pending
    }

    /// Run `unit` once a slot is free and return its output.
    pub async fn submit<F>(&self, unit: F) -> F::Output
    where
        F: Future,
    {
        let _permit = self.acquire().await;
        unit.await
    }

    /// Submit every unit, wait for all of them, and return their outputs in
    /// submission order.
    ///
    /// A failing unit does not cancel the others. One failure is returned as
    /// is; several are wrapped in an [`AggregateError`].
    pub async fn run_all<I, F, T>(&self, units: I) -> anyhow::Result<Vec<T>>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = anyhow::Result<T>>,
    {
        let outcomes = futures::future::join_all(units.into_iter().map(|u| self.submit(u))).await;

        let mut values = Vec::with_capacity(outcomes.len());
        let mut errors = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(value) => values.push(value),
                Err(e) => errors.push(e),
            }
        }

        match AggregateError::collapse(errors) {
            Some(err) => Err(err),
            None => Ok(values),
        }
    }

    async fn acquire(&self) -> Permit<'_> {
        let (ticket, rx) = {
            let mut state = self.state.borrow_mut();
            if state.active < self.limit {
                state.active += 1;
                tracing::trace!(active = state.active, "limiter admitted unit");
                return Permit { limiter: self };
            }
            let (tx, rx) = oneshot::channel();
            let ticket = state.next_ticket;
            state.next_ticket += 1;
            state.pending += 1;
            state.queue.push_back((ticket, tx));
            (ticket, rx)
        };

        let mut waiter = Waiter {
            limiter: self,
            ticket,
            rx,
            admitted: false,
        };
        // The sender lives in our own queue, so it is only dropped unsent when
        // the limiter itself goes away.
        let _ = (&mut waiter.rx).await;
        waiter.admitted = true;
        Permit { limiter: self }
    }

    /// Give a slot back: hand it to the oldest live waiter, or free it.
    fn release(&self) {
        let mut state = self.state.borrow_mut();
        while let Some((_, tx)) = state.queue.pop_front() {
            state.pending -= 1;
            if tx.send(()).is_ok() {
                tracing::trace!(pending = state.pending, "limiter handed slot to queued unit");
                return;
            }
        }
        state.active -= 1;
    }

    /// Withdraw a queued entry that was never handed a slot.
    fn withdraw(&self, ticket: u64) {
        let mut state = self.state.borrow_mut();
        if let Some(pos) = state.queue.iter().position(|(t, _)| *t == ticket) {
            state.queue.remove(pos);
            state.pending -= 1;
        }
    }
}

/// A held slot; releases on drop.
struct Permit<'a> {
    limiter: &'a Limiter,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.limiter.release();
    }
}

/// A queued admission. If the submitting future is dropped while queued, it
/// leaves the queue; a slot that was already handed over is passed on.
struct Waiter<'a> {
    limiter: &'a Limiter,
    ticket: u64,
    rx: oneshot::Receiver<()>,
    admitted: bool,
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        if self.admitted {
            return;
        }
        self.rx.close();
        if self.rx.try_recv().is_ok() {
            self.limiter.release();
        } else {
            self.limiter.withdraw(self.ticket);
        }
    }
}
