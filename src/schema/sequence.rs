//! SequenceSchema - validates a JSON array element by element.

use std::sync::Arc;

use serde_json::Value;

use super::{Schema, SchemaValidationError, ValidationIssue};

/// Wraps an item schema so it validates an array of items.
///
/// Issues from each element are collected (not short-circuited) and their
/// paths are prefixed with the element index.
#[derive(Clone)]
pub struct SequenceSchema {
    item: Arc<dyn Schema>,
}

impl SequenceSchema {
    pub fn new(item: impl Schema + 'static) -> Self {
        Self {
            item: Arc::new(item),
        }
    }

    pub fn from_shared(item: Arc<dyn Schema>) -> Self {
        Self { item }
    }

    /// The schema applied to each element.
    pub fn item(&self) -> &Arc<dyn Schema> {
        &self.item
    }
}

impl Schema for SequenceSchema {
    fn parse(&self, value: Value) -> Result<Value, SchemaValidationError> {
        let elements = match value {
            Value::Array(elements) => elements,
            other => {
                return Err(SchemaValidationError::single(format!(
                    "expected an array, found {}",
                    kind_of(&other)
                )))
            }
        };

        let mut parsed = Vec::with_capacity(elements.len());
        let mut issues: Vec<ValidationIssue> = Vec::new();

        for (index, element) in elements.into_iter().enumerate() {
            match self.item.parse(element) {
                Ok(value) => parsed.push(value),
                Err(err) => issues.extend(err.within(index).issues),
            }
        }

        if issues.is_empty() {
            Ok(Value::Array(parsed))
        } else {
            Err(SchemaValidationError::new(issues))
        }
    }

    fn is_sequence(&self) -> bool {
        true
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
