//! RequestExecutor - the caller-supplied transport seam.
//!
//! The model never talks HTTP itself. It hands an address and a
//! [`RequestOptions`] to the executor and receives either a raw response
//! (status, headers, body bytes) or a value the executor already parsed.

use std::future::Future;

use async_trait::async_trait;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, StatusCode};
use serde_json::Value;

use crate::error::TransportError;

/// Method, headers and JSON body for one request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// The body rendered as JSON bytes, ready to put on the wire.
    pub fn body_bytes(&self) -> Option<Vec<u8>> {
        self.body.as_ref().map(|body| body.to_string().into_bytes())
    }
}

/// What an executor resolves to.
#[derive(Debug)]
pub enum ExecutorResponse {
    /// A response the model still has to interpret.
    Raw(http::Response<Vec<u8>>),
    /// Data the executor already parsed (`Null` means no content).
    Parsed(Value),
}

impl ExecutorResponse {
    /// A raw JSON response with the given status.
    pub fn json(status: u16, body: &Value) -> Self {
        let mut response = Self::raw(status, body.to_string().into_bytes());
        if let ExecutorResponse::Raw(inner) = &mut response {
            inner
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        response
    }

    /// A raw plain-text response with the given status.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let mut response = Self::raw(status, body.into().into_bytes());
        if let ExecutorResponse::Raw(inner) = &mut response {
            inner
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        }
        response
    }

    /// A raw 204 response.
    pub fn no_content() -> Self {
        Self::raw(204, Vec::new())
    }

    fn raw(status: u16, body: Vec<u8>) -> Self {
        let mut response = http::Response::new(body);
        *response.status_mut() =
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        ExecutorResponse::Raw(response)
    }
}

impl From<Value> for ExecutorResponse {
    fn from(value: Value) -> Self {
        ExecutorResponse::Parsed(value)
    }
}

impl From<http::Response<Vec<u8>>> for ExecutorResponse {
    fn from(response: http::Response<Vec<u8>>) -> Self {
        ExecutorResponse::Raw(response)
    }
}

/// Trait for transports that execute resource requests.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<ExecutorResponse, TransportError>;
}

/// Executor backed by an async closure. Build one with [`executor_fn`].
pub struct FnExecutor<F> {
    f: F,
}

/// Wrap an async closure `(url, options) -> Result<ExecutorResponse, TransportError>`.
pub fn executor_fn<F, Fut>(f: F) -> FnExecutor<F>
where
    F: Fn(String, RequestOptions) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ExecutorResponse, TransportError>> + Send,
{
    FnExecutor { f }
}

#[async_trait]
impl<F, Fut> RequestExecutor for FnExecutor<F>
where
    F: Fn(String, RequestOptions) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ExecutorResponse, TransportError>> + Send,
{
    async fn execute(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<ExecutorResponse, TransportError> {
        (self.f)(url.to_string(), options).await
    }
}
