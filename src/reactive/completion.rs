//! Generation tokens and completion delivery for asynchronous steps.
//!
//! Every async step (source load, playback start) captures a [`Ticket`] when
//! it is issued. The backend resolves it through a [`Completer`], possibly
//! from another thread; the engine drains the results on its own thread and
//! compares the ticket against its current generations before mutating state.

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::trace;

use crate::error::ReactiveError;

/// Monotonically increasing version counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// Advance to the next generation, invalidating every ticket issued so far
    pub fn bump(&mut self) -> Self {
        self.0 += 1;
        *self
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Generations captured when an async step is issued
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ticket {
    /// Bind generation (bumped on rebind and teardown)
    pub bind: Generation,
    /// Activation generation (bumped on every activation toggle)
    pub activation: Generation,
}

/// Result of an async step, tagged with the ticket it was issued under
#[derive(Debug)]
pub(crate) struct Completed<T> {
    pub ticket: Ticket,
    pub result: Result<T, ReactiveError>,
}

/// One-shot handle a backend uses to report the outcome of an async step
#[must_use = "an unresolved completer leaves the step pending forever"]
pub struct Completer<T> {
    ticket: Ticket,
    tx: Sender<Completed<T>>,
}

impl<T> Completer<T> {
    /// Deliver the outcome; a dropped engine simply never sees it
    pub fn complete(self, result: Result<T, ReactiveError>) {
        let ticket = self.ticket;
        if self.tx.send(Completed { ticket, result }).is_err() {
            trace!(?ticket, "completion dropped, engine gone");
        }
    }
}

/// Engine-side end of a completion channel
pub(crate) struct Inbox<T> {
    tx: Sender<Completed<T>>,
    rx: Receiver<Completed<T>>,
}

impl<T> Inbox<T> {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn completer(&self, ticket: Ticket) -> Completer<T> {
        Completer {
            ticket,
            tx: self.tx.clone(),
        }
    }

    /// Take everything delivered so far without blocking
    pub fn drain(&self) -> Vec<Completed<T>> {
        self.rx.try_iter().collect()
    }
}
