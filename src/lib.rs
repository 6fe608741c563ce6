//! Reactive client-side resource models with optimistic updates.
//!
//! A [`ResourceModel`] keeps a local copy of a server-owned resource in a
//! [`StateContainer`] (data, loading, error cells) and mutates it
//! optimistically: local state changes first, the request follows, and the
//! state is then reconciled with the server or rolled back exactly.

mod error;
mod resource;
mod schema;
mod state;

pub use error::{ConfigError, ModelError, Result, TransportError};
pub use resource::{
    events, executor_fn, Endpoint, ExecutorResponse, FetchTarget, FnExecutor, ModelConfig,
    Payload, RequestExecutor, RequestOptions, ResourceModel, ResourceModelBuilder, TempId,
};
pub use schema::{
    FnSchema, PathSegment, Schema, SchemaValidationError, SequenceSchema, TypedSchema,
    ValidationIssue,
};
pub use state::{
    item_id, shallow_merge, ManagedData, StateContainer, Subscription, ValueCell, ID_FIELD,
};

// Re-export so implementors of RequestExecutor don't need their own dependency.
pub use async_trait::async_trait;
pub use http;
