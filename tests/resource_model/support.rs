//! Test support: a scripted executor that records every request.

use std::sync::{Arc, Mutex};

use optimistic_resource::http::{HeaderMap, Method};
use optimistic_resource::{
    async_trait, ExecutorResponse, ManagedData, RequestExecutor, RequestOptions, ResourceModel,
    Subscription, TransportError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Notify;

pub const BASE_URL: &str = "https://api.test/v1";

/// A request as the executor saw it.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

type Responder = dyn Fn(&Call) -> Result<ExecutorResponse, TransportError> + Send + Sync;

/// Executor whose answers come from a closure. Clones share the call log.
#[derive(Clone)]
pub struct MockExecutor {
    calls: Arc<Mutex<Vec<Call>>>,
    responder: Arc<Responder>,
    gate: Option<Arc<Notify>>,
}

impl MockExecutor {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&Call) -> Result<ExecutorResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            responder: Arc::new(responder),
            gate: None,
        }
    }

    /// Always answers with `value`, already parsed.
    pub fn ok(value: Value) -> Self {
        Self::new(move |_| Ok(ExecutorResponse::Parsed(value.clone())))
    }

    /// Always fails at the transport level.
    pub fn failing(message: &'static str) -> Self {
        Self::new(move |_| Err(TransportError::failed(message)))
    }

    /// Hold every request until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RequestExecutor for MockExecutor {
    async fn execute(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<ExecutorResponse, TransportError> {
        let call = Call {
            method: options.method,
            url: url.to_string(),
            headers: options.headers,
            body: options.body,
        };
        self.calls.lock().unwrap().push(call.clone());

        match &self.gate {
            Some(gate) => gate.notified().await,
            None => tokio::task::yield_now().await,
        }

        (self.responder)(&call)
    }
}

/// A users model over `executor`, seeded with `initial`.
pub fn users_model(executor: &MockExecutor, initial: Value) -> ResourceModel {
    ResourceModel::builder()
        .base_url(BASE_URL)
        .resource("users")
        .executor(executor.clone())
        .initial_data(initial)
        .build()
        .expect("valid model config")
}

/// Records every value the data cell emits, starting with the replayed one.
pub fn record_data(model: &ResourceModel) -> (Arc<Mutex<Vec<ManagedData>>>, Subscription) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = model.subscribe_data(move |data| sink.lock().unwrap().push(data.clone()));
    (seen, subscription)
}

/// Records every value the loading cell emits.
pub fn record_loading(model: &ResourceModel) -> (Arc<Mutex<Vec<bool>>>, Subscription) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = model.subscribe_loading(move |flag| sink.lock().unwrap().push(*flag));
    (seen, subscription)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}
