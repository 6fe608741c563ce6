//! Schemas - caller-supplied validators for resource payloads.
//!
//! A schema accepts an arbitrary JSON value and either returns the normalized
//! value or a [`SchemaValidationError`] listing every violation it found.
//!
//! ## Example
//!
//! ```ignore
//! use optimistic_resource::{Schema, TypedSchema, SequenceSchema};
//!
//! #[derive(Serialize, Deserialize)]
//! struct User {
//!     id: String,
//!     name: String,
//! }
//!
//! let schema = TypedSchema::<User>::new();
//! let user = schema.parse(json!({ "id": "1", "name": "Alice" }))?;
//!
//! // Collections are validated element by element.
//! let users = SequenceSchema::new(schema).parse(json!([user]))?;
//! ```

mod sequence;
mod typed;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

pub(crate) use sequence::kind_of;
pub use sequence::SequenceSchema;
pub use typed::{FnSchema, TypedSchema};

/// Trait for validators that check and normalize a value's structure.
pub trait Schema: Send + Sync {
    /// Validate `value`, returning its normalized form.
    fn parse(&self, value: Value) -> Result<Value, SchemaValidationError>;

    /// Whether this schema already describes a sequence of items.
    ///
    /// The model wraps item schemas in a [`SequenceSchema`] when validating
    /// collection responses unless this returns true.
    fn is_sequence(&self) -> bool {
        false
    }
}

impl<S: Schema + ?Sized> Schema for Arc<S> {
    fn parse(&self, value: Value) -> Result<Value, SchemaValidationError> {
        (**self).parse(value)
    }

    fn is_sequence(&self) -> bool {
        (**self).is_sequence()
    }
}

impl<S: Schema + ?Sized> Schema for Box<S> {
    fn parse(&self, value: Value) -> Result<Value, SchemaValidationError> {
        (**self).parse(value)
    }

    fn is_sequence(&self) -> bool {
        (**self).is_sequence()
    }
}

/// One step in the path to an offending field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// A single violation: where it happened and what was wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl ValidationIssue {
    /// An issue at the root of the validated value.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            message: message.into(),
        }
    }

    /// An issue at the given path.
    pub fn at<I, P>(path: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathSegment>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }

    /// Prefix the path with `segment` (used when nesting schemas).
    pub fn within(mut self, segment: impl Into<PathSegment>) -> Self {
        self.path.insert(0, segment.into());
        self
    }

    /// Dotted rendering of the path, e.g. `0.address.city`.
    pub fn path_string(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path_string(), self.message)
        }
    }
}

/// Structured validation failure carrying every violation found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("schema validation failed: {}", join_issues(.issues))]
pub struct SchemaValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl SchemaValidationError {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// Shorthand for a failure with one root-level issue.
    pub fn single(message: impl Into<String>) -> Self {
        Self::new(vec![ValidationIssue::new(message)])
    }

    /// Prefix every issue path with `segment`.
    pub fn within(self, segment: impl Into<PathSegment> + Clone) -> Self {
        Self {
            issues: self
                .issues
                .into_iter()
                .map(|issue| issue.within(segment.clone()))
                .collect(),
        }
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
