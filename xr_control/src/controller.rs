//! Mode/event controller.
//!
//! Every subsystem instance lives behind one exclusive lock. Mode changes
//! reach it two ways:
//!
//! - [`SubsystemHandle::apply_event`] blocks on the lock and applies the
//!   event immediately, between two control cycles.
//! - [`SubsystemHandle::post`] enqueues the event without blocking. The
//!   scheduler drains the queue under the lock at a fixed point at the start
//!   of each cycle, in FIFO order.
//!
//! Either way a control cycle never observes a half-applied mode change.
//! Raw event-bus ids are mapped to subsystem events through an
//! [`EventTable`]; ids the table does not know are ignored.

use std::fmt::Debug;
use std::sync::Arc;

use heapless::{Deque, Vec};
use parking_lot::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{trace, warn};

use xr_common::consts::EVENT_QUEUE_CAPACITY;
use xr_common::control::event::EventId;

/// Maximum number of bindings in one event table.
pub const EVENT_TABLE_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EventError {
    /// The per-subsystem queue is full; the event was not enqueued.
    #[error("event queue of `{0}` is full")]
    QueueFull(&'static str),
    /// Too many bindings for one event table.
    #[error("event table exceeds {EVENT_TABLE_CAPACITY} bindings")]
    TableFull,
}

// ─── Subsystem ──────────────────────────────────────────────────────

/// An actuated subsystem driven by the control loop.
///
/// All methods run with the subsystem's exclusive lock held.
pub trait Subsystem: Send + 'static {
    /// Mode-change event understood by this subsystem.
    type Event: Copy + Debug + Send + 'static;
    /// External inputs copied from topics once per tick.
    type Feed: Default + Send;
    /// Record published after every cycle.
    type Status: Clone + Default + Send + Sync + 'static;

    fn name(&self) -> &'static str;

    /// Apply one event. Must be a total function of `(mode, event)`;
    /// an event that selects the current mode is a no-op.
    fn apply_event(&mut self, event: Self::Event);

    /// Take the latest external inputs and read motor feedback.
    fn update_feedback(&mut self, feed: &Self::Feed);

    /// Run the active mode's control law and issue motor commands.
    fn control(&mut self, now_ms: u32, dt: f32);

    fn status(&self) -> Self::Status;
}

// ─── Handle ─────────────────────────────────────────────────────────

type EventQueue<E> = Deque<E, EVENT_QUEUE_CAPACITY>;

/// Shared handle to a subsystem and its event queue. Cheap to clone.
pub struct SubsystemHandle<S: Subsystem> {
    name: &'static str,
    inner: Arc<Mutex<S>>,
    queue: Arc<Mutex<EventQueue<S::Event>>>,
}

impl<S: Subsystem> Clone for SubsystemHandle<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            inner: Arc::clone(&self.inner),
            queue: Arc::clone(&self.queue),
        }
    }
}

impl<S: Subsystem> SubsystemHandle<S> {
    pub fn new(subsystem: S) -> Self {
        Self {
            name: subsystem.name(),
            inner: Arc::new(Mutex::new(subsystem)),
            queue: Arc::new(Mutex::new(Deque::new())),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Apply `event` now, blocking until no control cycle is in progress.
    ///
    /// The lock is released when the guard drops, including on unwind.
    pub fn apply_event(&self, event: S::Event) {
        let mut subsystem = self.inner.lock();
        trace!(subsystem = self.name, ?event, "apply event");
        subsystem.apply_event(event);
    }

    /// Enqueue `event` for the next control cycle without blocking on the
    /// subsystem lock.
    pub fn post(&self, event: S::Event) -> Result<(), EventError> {
        let mut queue = self.queue.lock();
        queue.push_back(event).map_err(|event| {
            warn!(subsystem = self.name, ?event, "event queue full, event rejected");
            EventError::QueueFull(self.name)
        })
    }

    /// Number of events waiting for the next cycle.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Exclusive access to the subsystem. Holding the guard stalls the
    /// control loop; keep it short.
    pub fn lock(&self) -> MutexGuard<'_, S> {
        self.inner.lock()
    }

    /// Run `f` with the subsystem locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Apply every queued event to an already locked subsystem, oldest first.
    pub(crate) fn drain_into(&self, subsystem: &mut S) -> usize {
        let mut applied = 0;
        loop {
            let next = self.queue.lock().pop_front();
            let Some(event) = next else {
                break applied;
            };
            subsystem.apply_event(event);
            applied += 1;
        }
    }
}

// ─── Event Table ────────────────────────────────────────────────────

/// Static map from raw event-bus ids to subsystem events.
#[derive(Debug, Clone)]
pub struct EventTable<E> {
    bindings: Vec<(EventId, E), EVENT_TABLE_CAPACITY>,
}

impl<E: Copy> EventTable<E> {
    pub fn new(bindings: &[(EventId, E)]) -> Result<Self, EventError> {
        let bindings = Vec::from_slice(bindings).map_err(|_| EventError::TableFull)?;
        Ok(Self { bindings })
    }

    /// First event bound to `id`, if any.
    pub fn lookup(&self, id: EventId) -> Option<E> {
        self.bindings
            .iter()
            .find(|(bound, _)| *bound == id)
            .map(|(_, event)| *event)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Post the event bound to `id` on `handle`.
    ///
    /// Returns `Ok(false)` for ids not in the table; they are not an error.
    pub fn dispatch<S>(&self, id: EventId, handle: &SubsystemHandle<S>) -> Result<bool, EventError>
    where
        S: Subsystem<Event = E>,
    {
        match self.lookup(id) {
            Some(event) => handle.post(event).map(|()| true),
            None => Ok(false),
        }
    }
}
