//! Integration tests for the optimistic resource model.

mod support;

mod delete;
#[cfg(feature = "emitter")]
mod events;
mod lifecycle;
