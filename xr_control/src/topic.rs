//! Last-value topics.
//!
//! A topic holds the most recent value published by one collaborator and a
//! sequence number. Subscribers copy the value out once per tick; a read
//! never blocks the control task. If the writer holds the slot at that
//! instant, or nothing new was published, the destination keeps its
//! previous (stale but valid) value.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

#[derive(Debug)]
struct Slot<T> {
    value: RwLock<T>,
    seq: AtomicU64,
}

/// Publishing side of a last-value topic. Cheap to clone.
#[derive(Debug)]
pub struct Topic<T> {
    name: &'static str,
    slot: Arc<Slot<T>>,
}

impl<T> Clone for Topic<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T: Clone + Default> Topic<T> {
    pub fn new(name: &'static str) -> Self {
        Self::with_initial(name, T::default())
    }
}

impl<T: Clone> Topic<T> {
    pub fn with_initial(name: &'static str, initial: T) -> Self {
        Self {
            name,
            slot: Arc::new(Slot {
                value: RwLock::new(initial),
                seq: AtomicU64::new(0),
            }),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Replace the stored value and bump the sequence number.
    pub fn publish(&self, value: T) {
        *self.slot.value.write() = value;
        self.slot.seq.fetch_add(1, Ordering::Release);
    }

    /// Number of values published so far.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.slot.seq.load(Ordering::Acquire)
    }

    /// Clone of the latest value. Blocks briefly if a publish is in progress;
    /// not for use inside a control cycle.
    pub fn latest(&self) -> T {
        self.slot.value.read().clone()
    }

    pub fn subscribe(&self) -> Subscriber<T> {
        Subscriber {
            slot: Arc::clone(&self.slot),
            seen: 0,
        }
    }
}

/// Reading side of a last-value topic.
#[derive(Debug)]
pub struct Subscriber<T> {
    slot: Arc<Slot<T>>,
    seen: u64,
}

impl<T: Clone> Subscriber<T> {
    /// Copy the latest value into `dst` if a newer one is available.
    ///
    /// Returns `true` when `dst` was updated. Never blocks.
    pub fn dump(&mut self, dst: &mut T) -> bool {
        let seq = self.slot.seq.load(Ordering::Acquire);
        if seq == self.seen {
            return false;
        }
        let Some(value) = self.slot.value.try_read() else {
            return false;
        };
        // Re-read under the lock so the recorded sequence matches the value copied.
        let seq = self.slot.seq.load(Ordering::Acquire);
        dst.clone_from(&*value);
        self.seen = seq;
        true
    }

    /// Whether a value newer than the last dumped one exists.
    #[inline]
    pub fn has_update(&self) -> bool {
        self.slot.seq.load(Ordering::Acquire) != self.seen
    }
}
