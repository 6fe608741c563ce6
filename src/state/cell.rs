//! ValueCell - a last-value cell with replay on subscribe.
//!
//! Subscribers receive the current value as soon as they subscribe and then
//! every subsequent write, in write order. Handlers run without the lock held,
//! so a handler may read (or write) the cell.
//!
//! Writes queue their notification under the lock. The first writer to find
//! nobody delivering drains the queue; a writer that finds a delivery already
//! running on another thread leaves its notification to that thread. A write
//! made from inside a handler is delivered after the current fan-out.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registered<T> {
    id: u64,
    /// Version replayed on subscribe; only later writes are delivered.
    since: u64,
    handler: Handler<T>,
}

struct Delivery<T> {
    version: u64,
    value: T,
    /// `Some` for a replay meant for one subscriber only.
    only: Option<u64>,
}

impl<T> Registered<T> {
    fn accepts(&self, delivery: &Delivery<T>) -> bool {
        match delivery.only {
            Some(id) => id == self.id,
            None => delivery.version > self.since,
        }
    }
}

struct Slot<T> {
    value: T,
    version: u64,
    handlers: Vec<Registered<T>>,
    pending: VecDeque<Delivery<T>>,
    delivering: bool,
    next_id: u64,
    closed: bool,
}

/// A shared, observable value.
///
/// Clone-friendly via Arc: clones observe and write the same slot.
pub struct ValueCell<T> {
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T> Clone for ValueCell<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T: Clone + Send + 'static> ValueCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                value,
                version: 0,
                handlers: Vec::new(),
                pending: VecDeque::new(),
                delivering: false,
                next_id: 0,
                closed: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        lock_slot(&*self.slot)
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.lock().value.clone()
    }

    /// Read the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.lock().value)
    }

    /// Replace the value and notify. Returns false if the cell is closed.
    pub fn set(&self, value: T) -> bool {
        self.update(move |current| *current = value).is_some()
    }

    /// Mutate the value in place and notify.
    ///
    /// Returns `None` without running `f` if the cell is closed.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.try_update(|value| Ok::<R, std::convert::Infallible>(f(value)))
            .map(|result| match result {
                Ok(r) => r,
                Err(never) => match never {},
            })
    }

    /// Mutate the value in place; subscribers are notified only on `Ok`.
    ///
    /// `f` must leave the value untouched when it returns `Err`.
    pub fn try_update<R, E>(&self, f: impl FnOnce(&mut T) -> Result<R, E>) -> Option<Result<R, E>> {
        let mut slot = self.lock();
        if slot.closed {
            return None;
        }

        let result = f(&mut slot.value);
        if result.is_err() {
            return Some(result);
        }

        slot.version += 1;
        let delivery = Delivery {
            version: slot.version,
            value: slot.value.clone(),
            only: None,
        };
        slot.pending.push_back(delivery);
        self.drain(slot);
        Some(result)
    }

    /// Register a handler. It is called with the current value before any
    /// later write.
    ///
    /// Subscribing to a closed cell registers nothing and replays nothing.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut slot = self.lock();
        if slot.closed {
            return Subscription::inert();
        }
        let id = slot.next_id;
        slot.next_id += 1;
        let since = slot.version;
        slot.handlers.push(Registered {
            id,
            since,
            handler: Arc::new(handler),
        });
        let replay = Delivery {
            version: since,
            value: slot.value.clone(),
            only: Some(id),
        };
        slot.pending.push_back(replay);
        self.drain(slot);

        let weak: Weak<Mutex<Slot<T>>> = Arc::downgrade(&self.slot);
        Subscription::new(move || {
            if let Some(slot) = weak.upgrade() {
                lock_slot(&*slot).handlers.retain(|registered| registered.id != id);
            }
        })
    }

    /// Deliver queued notifications in order, unless another call is already
    /// doing so.
    fn drain<'a>(&'a self, mut slot: MutexGuard<'a, Slot<T>>) {
        if slot.delivering {
            return;
        }
        slot.delivering = true;
        let mut reset = DeliveryReset {
            slot: &*self.slot,
            armed: true,
        };

        loop {
            let Some(delivery) = slot.pending.pop_front() else {
                slot.delivering = false;
                reset.armed = false;
                return;
            };
            let handlers: Vec<Handler<T>> = slot
                .handlers
                .iter()
                .filter(|registered| registered.accepts(&delivery))
                .map(|registered| Arc::clone(&registered.handler))
                .collect();
            drop(slot);

            for handler in handlers {
                handler(&delivery.value);
            }
            slot = self.lock();
        }
    }

    /// Close the cell: drop all handlers and ignore further writes. Idempotent.
    pub fn close(&self) {
        let mut slot = self.lock();
        slot.closed = true;
        slot.handlers.clear();
        slot.pending.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of registered handlers.
    pub fn subscriber_count(&self) -> usize {
        self.lock().handlers.len()
    }
}

fn lock_slot<T>(slot: &Mutex<Slot<T>>) -> MutexGuard<'_, Slot<T>> {
    // Handlers never run under the lock, so a poisoned slot is still consistent.
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Clears the delivering flag when a handler panics mid-drain.
struct DeliveryReset<'a, T> {
    slot: &'a Mutex<Slot<T>>,
    armed: bool,
}

impl<T> Drop for DeliveryReset<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            let mut slot = lock_slot(self.slot);
            slot.delivering = false;
            slot.pending.clear();
        }
    }
}

/// Handle returned by `subscribe`. Dropping it keeps the handler registered.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    fn inert() -> Self {
        Self { cancel: None }
    }

    /// Stop receiving notifications.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
