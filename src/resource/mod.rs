//! Optimistic resource model - fetch/create/update/delete against a REST
//! collection with optimistic local state.
//!
//! Every mutating operation follows the same protocol:
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌──────────────┐
//! │ snapshot     │──▶│ optimistic apply │──▶│ request      │
//! └──────────────┘   └──────────────────┘   └──────┬───────┘
//!                                                  │
//!                               ┌──────────────────┴───────────────┐
//!                               ▼                                  ▼
//!                      ┌─────────────────┐              ┌─────────────────────┐
//!                      │ ok: reconcile   │              │ err: restore        │
//!                      │ with server     │              │ snapshot, set error │
//!                      └─────────────────┘              └─────────────────────┘
//! ```
//!
//! Snapshot, apply, reconcile and restore each happen under the data cell's
//! lock and notify subscribers once. The only suspension point is the
//! request itself.
//!
//! Operations on the same identity are not serialized: an `update("1")`
//! still in flight when `delete("1")` starts may reconcile onto data the
//! delete already changed, or restore an item the delete removed.
//!
//! ## Example
//!
//! ```ignore
//! use optimistic_resource::{ResourceModel, TypedSchema, FetchTarget};
//!
//! let users = ResourceModel::builder()
//!     .base_url("https://api.example.com")
//!     .resource("users")
//!     .executor(my_executor)
//!     .schema(TypedSchema::<User>::new())
//!     .initial_data(json!([]))
//!     .build()?;
//!
//! users.fetch(FetchTarget::All).await?;
//! let carol = users.create(json!({ "name": "Carol" })).await?;
//! users.update(carol["id"].as_str().unwrap(), json!({ "name": "Caroline" })).await?;
//! ```

mod config;
mod create;
mod delete;
mod endpoint;
pub mod events;
mod executor;
mod fetch;
mod identity;
mod response;
mod update;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{ModelError, Result};
use crate::schema::Schema;
use crate::state::{ManagedData, StateContainer, Subscription};

pub use config::{ModelConfig, ResourceModelBuilder};
pub use create::Payload;
pub use endpoint::Endpoint;
pub use executor::{executor_fn, ExecutorResponse, FnExecutor, RequestExecutor, RequestOptions};
pub use fetch::FetchTarget;
pub use identity::TempId;

/// A local, observable copy of a server-owned resource collection.
pub struct ResourceModel {
    state: StateContainer,
    endpoint: Endpoint,
    executor: Arc<dyn RequestExecutor>,
    headers: HeaderMap,
    validate_responses: bool,
    /// Temporary ids currently present in the data because of an unsettled create.
    temporary: Mutex<HashSet<String>>,
    #[cfg(feature = "emitter")]
    events: events::ModelEvents,
}

impl ResourceModel {
    pub fn builder() -> ResourceModelBuilder {
        ResourceModelBuilder::new()
    }

    pub(crate) fn assemble(
        endpoint: Endpoint,
        executor: Arc<dyn RequestExecutor>,
        schema: Option<Arc<dyn Schema>>,
        initial: ManagedData,
        validate_responses: bool,
        headers: HeaderMap,
    ) -> Self {
        Self {
            state: StateContainer::new(initial, schema),
            endpoint,
            executor,
            headers,
            validate_responses,
            temporary: Mutex::new(HashSet::new()),
            #[cfg(feature = "emitter")]
            events: events::ModelEvents::new(),
        }
    }

    pub fn data(&self) -> ManagedData {
        self.state.data()
    }

    /// Items held, cloned. Empty for `ManagedData::Empty`.
    pub fn items(&self) -> Vec<Value> {
        self.state.with_data(|data| data.items().to_vec())
    }

    /// The item whose identity is `id`.
    pub fn find(&self, id: &str) -> Option<Value> {
        self.state.with_data(|data| data.find(id).cloned())
    }

    /// Deserialize the current data into `T` (a struct, `Vec<_>` or `Option<_>`).
    pub fn data_as<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.state.data().into_value())
    }

    pub fn loading(&self) -> bool {
        self.state.loading()
    }

    pub fn error(&self) -> Option<ModelError> {
        self.state.error()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The underlying state container, for observers that want all three cells.
    pub fn state(&self) -> &StateContainer {
        &self.state
    }

    /// Whether `id` is a temporary identity issued by an unsettled create.
    pub fn is_temporary(&self, id: &str) -> bool {
        self.temporary_ids().contains(id)
    }

    pub fn subscribe_data<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ManagedData) + Send + Sync + 'static,
    {
        self.state.subscribe_data(handler)
    }

    pub fn subscribe_loading<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.state.subscribe_loading(handler)
    }

    pub fn subscribe_error<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Option<ModelError>) + Send + Sync + 'static,
    {
        self.state.subscribe_error(handler)
    }

    /// Register a listener for a lifecycle event (see [`events`]).
    #[cfg(feature = "emitter")]
    pub fn on_event<F>(&self, event: &str, listener: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.events.on(event, listener);
    }

    /// Release all subscribers and stop emitting. Idempotent.
    ///
    /// Requests already in flight are not cancelled; their results are dropped.
    pub fn dispose(&self) {
        self.state.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.state.is_disposed()
    }

    fn ensure_active(&self) -> Result<()> {
        if self.state.is_disposed() {
            Err(ModelError::Disposed)
        } else {
            Ok(())
        }
    }

    /// Raise the loading flag and clear stale errors. Loading drops back to
    /// false when the guard goes out of scope, on every path.
    fn begin(&self) -> LoadingGuard<'_> {
        self.state.set_loading(true);
        self.state.clear_error();
        LoadingGuard { state: &self.state }
    }

    /// Record `err` in the error cell and hand it back for returning.
    fn fail(&self, err: ModelError) -> ModelError {
        self.state.set_error(err.clone());
        err
    }

    async fn send(&self, method: Method, url: String, body: Option<Value>) -> Result<Option<Value>> {
        debug!(%method, %url, "dispatching request");
        let options = RequestOptions {
            method: method.clone(),
            headers: self.headers.clone(),
            body,
        };
        let response = self.executor.execute(&url, options).await?;
        Ok(response::decode(&method, &url, response)?)
    }

    fn should_validate(&self) -> bool {
        self.validate_responses && self.state.schema().is_some()
    }

    fn validate_item(&self, value: Value) -> Result<Value> {
        if self.should_validate() {
            Ok(self.state.validate(value)?)
        } else {
            Ok(value)
        }
    }

    fn validate_collection(&self, value: Value) -> Result<Value> {
        if self.should_validate() {
            Ok(self.state.validate_collection(value)?)
        } else {
            Ok(value)
        }
    }

    fn temporary_ids(&self) -> MutexGuard<'_, HashSet<String>> {
        self.temporary
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(feature = "emitter")]
    fn emit(&self, event: &str, payload: &Value) {
        if !self.state.is_disposed() {
            self.events.emit(event, payload);
        }
    }

    #[cfg(not(feature = "emitter"))]
    fn emit(&self, _event: &str, _payload: &Value) {}
}

struct LoadingGuard<'a> {
    state: &'a StateContainer,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.set_loading(false);
    }
}
