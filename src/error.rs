//! Error types for the resource model.
//!
//! Every failure an operation can produce is a [`ModelError`]. The model keeps
//! a clone in the error cell for passive observers and returns the original to
//! the direct caller, so the type is `Clone`.

use thiserror::Error;

use crate::schema::SchemaValidationError;

/// Result alias used throughout the crate.
pub type Result<T, E = ModelError> = std::result::Result<T, E>;

/// Construction-time failures. No model instance is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("a base url is required")]
    MissingBaseUrl,

    #[error("a resource path is required")]
    MissingResource,

    #[error("a request executor is required")]
    MissingExecutor,

    #[error("invalid default header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
}

/// Failures raised by, or while interpreting the result of, the request executor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The executor itself failed (connection refused, aborted, ...).
    #[error("request failed: {0}")]
    Failed(String),

    /// The server answered with a non-success status.
    #[error("{method} {url} returned status {status}: {body}")]
    Status {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// The response could not be turned into a resource value.
    #[error("unusable response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },
}

impl TransportError {
    /// Convenience constructor for executors.
    pub fn failed(message: impl Into<String>) -> Self {
        TransportError::Failed(message.into())
    }
}

/// Error type for model operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A batch payload was sent to a model holding a single item.
    #[error("cannot create a batch of items in a model holding a single resource")]
    BatchIntoSingle,

    /// A payload item was not a JSON object.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// A payload carried an identity already present in the model.
    #[error("an item with id {0} already exists")]
    DuplicateIdentity(String),

    /// The item targeted by an update is not held by the model.
    #[error("resource not found: {id}")]
    NotFound { id: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Validation(#[from] SchemaValidationError),

    /// The model was disposed before the operation started.
    #[error("model has been disposed")]
    Disposed,
}

impl ModelError {
    /// True for failures detected before any optimistic mutation or request.
    pub fn is_shape_violation(&self) -> bool {
        matches!(
            self,
            ModelError::BatchIntoSingle
                | ModelError::InvalidPayload(_)
                | ModelError::DuplicateIdentity(_)
                | ModelError::NotFound { .. }
        )
    }
}
