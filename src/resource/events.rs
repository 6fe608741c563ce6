//! Lifecycle events fired after the server confirms an operation.
//!
//! Listening requires the `emitter` feature (on by default). Listeners
//! receive the confirmed JSON rendered as a string. Delivery goes through
//! `event_emitter_rs`, which runs each listener on its own thread, so
//! listeners must not assume they run before the operation returns.

#[cfg(feature = "emitter")]
use std::sync::Mutex;

#[cfg(feature = "emitter")]
use event_emitter_rs::EventEmitter;
#[cfg(feature = "emitter")]
use serde_json::Value;

/// Emitted after a successful fetch with the new data.
pub const FETCHED: &str = "fetched";
/// Emitted once per confirmed item after a successful create.
pub const CREATED: &str = "created";
/// Emitted after a successful update with the reconciled item.
pub const UPDATED: &str = "updated";
/// Emitted after a successful delete with `{ "id": ... }`.
pub const DELETED: &str = "deleted";

#[cfg(feature = "emitter")]
pub(crate) struct ModelEvents {
    emitter: Mutex<EventEmitter>,
}

#[cfg(feature = "emitter")]
impl ModelEvents {
    pub fn new() -> Self {
        Self {
            emitter: Mutex::new(EventEmitter::new()),
        }
    }

    pub fn on<F>(&self, event: &str, listener: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let mut emitter = self
            .emitter
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        emitter.on(event, listener);
    }

    pub fn emit(&self, event: &str, payload: &Value) {
        let mut emitter = self
            .emitter
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        emitter.emit(event, payload.to_string());
    }
}
