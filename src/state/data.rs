//! ManagedData - the value held by the data cell.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Name of the identity field on every resource item.
pub const ID_FIELD: &str = "id";

/// The data a model holds: nothing, one resource, or an ordered collection.
///
/// Serializes as `null`, an object, or an array respectively.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ManagedData {
    #[default]
    Empty,
    Single(Value),
    Many(Vec<Value>),
}

impl ManagedData {
    /// Classify a raw JSON value by shape.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => ManagedData::Empty,
            Value::Array(items) => ManagedData::Many(items),
            item => ManagedData::Single(item),
        }
    }

    pub fn to_value(&self) -> Value {
        self.clone().into_value()
    }

    pub fn into_value(self) -> Value {
        match self {
            ManagedData::Empty => Value::Null,
            ManagedData::Single(item) => item,
            ManagedData::Many(items) => Value::Array(items),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ManagedData::Empty)
    }

    pub fn is_single(&self) -> bool {
        matches!(self, ManagedData::Single(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, ManagedData::Many(_))
    }

    /// Items held, in order. `Empty` yields none, `Single` yields one.
    pub fn items(&self) -> &[Value] {
        match self {
            ManagedData::Empty => &[],
            ManagedData::Single(item) => std::slice::from_ref(item),
            ManagedData::Many(items) => items,
        }
    }

    /// Number of items held.
    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// The item whose identity is `id`.
    pub fn find(&self, id: &str) -> Option<&Value> {
        self.items().iter().find(|item| has_id(item, id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Value> {
        match self {
            ManagedData::Empty => None,
            ManagedData::Single(item) => has_id(item, id).then_some(item),
            ManagedData::Many(items) => items.iter_mut().find(|item| has_id(item, id)),
        }
    }

    /// Replace the item whose identity is `id`. Returns false if absent.
    pub fn replace_item(&mut self, id: &str, replacement: Value) -> bool {
        match self.find_mut(id) {
            Some(item) => {
                *item = replacement;
                true
            }
            None => false,
        }
    }

    /// Remove the item whose identity is `id`.
    ///
    /// A collection stays a collection (possibly empty); a matching single
    /// item becomes `Empty`. Returns false if nothing was removed.
    pub fn remove_item(&mut self, id: &str) -> bool {
        match self {
            ManagedData::Empty => false,
            ManagedData::Single(item) => {
                if has_id(item, id) {
                    *self = ManagedData::Empty;
                    true
                } else {
                    false
                }
            }
            ManagedData::Many(items) => {
                let before = items.len();
                items.retain(|item| !has_id(item, id));
                items.len() != before
            }
        }
    }
}

impl From<Value> for ManagedData {
    fn from(value: Value) -> Self {
        ManagedData::from_value(value)
    }
}

impl From<Vec<Value>> for ManagedData {
    fn from(items: Vec<Value>) -> Self {
        ManagedData::Many(items)
    }
}

impl From<Option<Value>> for ManagedData {
    fn from(value: Option<Value>) -> Self {
        value.map(ManagedData::from_value).unwrap_or_default()
    }
}

impl Serialize for ManagedData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ManagedData::Empty => serializer.serialize_none(),
            ManagedData::Single(item) => item.serialize(serializer),
            ManagedData::Many(items) => items.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ManagedData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(ManagedData::from_value)
    }
}

/// The identity of an item, if it has one.
///
/// String ids are used as-is; numeric ids are rendered to strings. Missing,
/// null and empty-string ids count as "no identity".
pub fn item_id(item: &Value) -> Option<String> {
    match item.get(ID_FIELD)? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn has_id(item: &Value, id: &str) -> bool {
    match item.get(ID_FIELD) {
        Some(Value::String(own)) => own == id,
        Some(Value::Number(own)) => own.to_string() == id,
        _ => false,
    }
}

/// Set the identity field of an object item.
pub(crate) fn set_id(item: &mut Value, id: &str) {
    if let Value::Object(fields) = item {
        fields.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    }
}

/// Copy every top-level field of `patch` onto `target`.
///
/// A non-object target is replaced by the patch; a non-object patch leaves the
/// target untouched.
pub fn shallow_merge(target: &mut Value, patch: &Value) {
    let Value::Object(patch_fields) = patch else {
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(fields) = target {
        for (key, value) in patch_fields {
            fields.insert(key.clone(), value.clone());
        }
    }
}
