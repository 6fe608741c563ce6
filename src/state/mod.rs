//! State container - the single source of truth for data, loading and error.
//!
//! Three independent [`ValueCell`]s back the container. Every write notifies
//! the cell's subscribers in write order; new subscribers get the last value
//! replayed before any later write.
//!
//! ## Example
//!
//! ```ignore
//! use optimistic_resource::{ManagedData, StateContainer};
//!
//! let state = StateContainer::new(ManagedData::Empty, None);
//! let sub = state.subscribe_loading(|loading| println!("loading: {}", loading));
//!
//! state.set_loading(true);
//! state.set_loading(false);
//! sub.unsubscribe();
//! ```

mod cell;
mod data;

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::error::ModelError;
use crate::schema::{Schema, SchemaValidationError, SequenceSchema};

pub use cell::{Subscription, ValueCell};
pub use data::{item_id, shallow_merge, ManagedData, ID_FIELD};
pub(crate) use data::set_id;

/// Holds the data, loading and error cells plus the optional item schema.
pub struct StateContainer {
    data: ValueCell<ManagedData>,
    loading: ValueCell<bool>,
    error: ValueCell<Option<ModelError>>,
    schema: Option<Arc<dyn Schema>>,
}

impl StateContainer {
    pub fn new(initial: ManagedData, schema: Option<Arc<dyn Schema>>) -> Self {
        Self {
            data: ValueCell::new(initial),
            loading: ValueCell::new(false),
            error: ValueCell::new(None),
            schema,
        }
    }

    pub fn data(&self) -> ManagedData {
        self.data.get()
    }

    pub fn loading(&self) -> bool {
        self.loading.get()
    }

    pub fn error(&self) -> Option<ModelError> {
        self.error.get()
    }

    /// Run `f` against the current data without cloning it.
    pub fn with_data<R>(&self, f: impl FnOnce(&ManagedData) -> R) -> R {
        self.data.with(f)
    }

    pub fn schema(&self) -> Option<&Arc<dyn Schema>> {
        self.schema.as_ref()
    }

    pub fn set_data(&self, value: impl Into<ManagedData>) {
        self.data.set(value.into());
    }

    pub fn set_loading(&self, loading: bool) {
        self.loading.set(loading);
    }

    pub fn set_error(&self, error: ModelError) {
        self.error.set(Some(error));
    }

    pub fn clear_error(&self) {
        self.error.set(None);
    }

    /// Mutate the data in place and notify once.
    ///
    /// Returns `None` if the container has been disposed.
    pub fn update_data<R>(&self, f: impl FnOnce(&mut ManagedData) -> R) -> Option<R> {
        self.data.update(f)
    }

    /// Mutate the data in place; subscribers are notified only on `Ok`.
    pub fn try_update_data<R, E>(
        &self,
        f: impl FnOnce(&mut ManagedData) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.try_update(f)
    }

    pub fn subscribe_data<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ManagedData) + Send + Sync + 'static,
    {
        self.data.subscribe(handler)
    }

    pub fn subscribe_loading<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.loading.subscribe(handler)
    }

    pub fn subscribe_error<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Option<ModelError>) + Send + Sync + 'static,
    {
        self.error.subscribe(handler)
    }

    /// Validate `candidate` against the item schema.
    ///
    /// Without a schema the candidate is returned unchanged.
    pub fn validate(&self, candidate: Value) -> Result<Value, SchemaValidationError> {
        match &self.schema {
            Some(schema) => schema.parse(candidate),
            None => {
                warn!("no schema configured, skipping validation");
                Ok(candidate)
            }
        }
    }

    /// Validate `candidate` as a collection of items.
    ///
    /// An item schema is applied per element; a sequence schema is applied as-is.
    pub fn validate_collection(&self, candidate: Value) -> Result<Value, SchemaValidationError> {
        match &self.schema {
            Some(schema) if schema.is_sequence() => schema.parse(candidate),
            Some(schema) => SequenceSchema::from_shared(Arc::clone(schema)).parse(candidate),
            None => {
                warn!("no schema configured, skipping validation");
                Ok(candidate)
            }
        }
    }

    /// Close all three cells. Idempotent.
    pub fn dispose(&self) {
        self.data.close();
        self.loading.close();
        self.error.close();
    }

    pub fn is_disposed(&self) -> bool {
        self.data.is_closed()
    }
}

impl Default for StateContainer {
    fn default() -> Self {
        Self::new(ManagedData::Empty, None)
    }
}
