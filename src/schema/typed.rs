//! Schemas backed by serde types and plain closures.

use std::fmt;
use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::{Schema, SchemaValidationError, ValidationIssue};

/// Validates a value by deserializing it into `T` and serializing it back.
///
/// The round trip normalizes the value: unknown fields are dropped unless `T`
/// keeps them, defaults are filled in, and renames are applied.
pub struct TypedSchema<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedSchema<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for TypedSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for TypedSchema<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TypedSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedSchema")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Schema for TypedSchema<T>
where
    T: Serialize + DeserializeOwned,
{
    fn parse(&self, value: Value) -> Result<Value, SchemaValidationError> {
        let typed: T = serde_json::from_value(value)
            .map_err(|e| SchemaValidationError::new(vec![issue_from_serde(&e)]))?;
        serde_json::to_value(&typed).map_err(|e| SchemaValidationError::single(e.to_string()))
    }
}

/// serde_json reports missing/unknown fields by name; lift the name into the path.
fn issue_from_serde(err: &serde_json::Error) -> ValidationIssue {
    let message = err.to_string();
    for prefix in ["missing field `", "unknown field `"] {
        if let Some(rest) = message.strip_prefix(prefix) {
            if let Some(end) = rest.find('`') {
                return ValidationIssue::at([&rest[..end]], message.clone());
            }
        }
    }
    ValidationIssue::new(message)
}

/// A schema defined by a closure.
pub struct FnSchema<F> {
    parse: F,
    sequence: bool,
}

impl<F> FnSchema<F>
where
    F: Fn(Value) -> Result<Value, SchemaValidationError> + Send + Sync,
{
    pub fn new(parse: F) -> Self {
        Self {
            parse,
            sequence: false,
        }
    }

    /// Mark the closure as validating whole collections.
    pub fn sequence(parse: F) -> Self {
        Self {
            parse,
            sequence: true,
        }
    }
}

impl<F> Schema for FnSchema<F>
where
    F: Fn(Value) -> Result<Value, SchemaValidationError> + Send + Sync,
{
    fn parse(&self, value: Value) -> Result<Value, SchemaValidationError> {
        (self.parse)(value)
    }

    fn is_sequence(&self) -> bool {
        self.sequence
    }
}
