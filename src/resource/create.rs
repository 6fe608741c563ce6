//! create - optimistic insert with temporary-identity reconciliation.

use futures::future::try_join_all;
use http::Method;
use serde_json::Value;
use tracing::{debug, warn};

use super::events::CREATED;
use super::identity::{PendingCreates, TempId};
use super::ResourceModel;
use crate::error::{ModelError, Result, TransportError};
use crate::schema::kind_of;
use crate::state::{item_id, set_id, ManagedData};

/// One item or a batch of items to create.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    One(Value),
    Many(Vec<Value>),
}

impl Payload {
    pub fn is_batch(&self) -> bool {
        matches!(self, Payload::Many(_))
    }

    fn into_items(self) -> Vec<Value> {
        match self {
            Payload::One(item) => vec![item],
            Payload::Many(items) => items,
        }
    }
}

/// A JSON array is a batch; anything else is a single item.
impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Payload::Many(items),
            item => Payload::One(item),
        }
    }
}

impl From<Vec<Value>> for Payload {
    fn from(items: Vec<Value>) -> Self {
        Payload::Many(items)
    }
}

/// What the optimistic apply step hands to the settle step.
struct Applied {
    snapshot: ManagedData,
    pending: PendingCreates,
}

impl ResourceModel {
    /// Create one item, or a batch.
    ///
    /// Items are added locally first (with a temporary id when they have none),
    /// then one `POST` per item is issued concurrently. When every request
    /// succeeds the temporary items are replaced by the server's; when any
    /// fails the data is restored to exactly what it was before the call.
    ///
    /// Returns the created item, or an array of created items for a batch.
    pub async fn create(&self, payload: impl Into<Payload>) -> Result<Value> {
        self.ensure_active()?;
        let payload = payload.into();
        let batch = payload.is_batch();
        let items = payload.into_items();

        if items.is_empty() {
            return Ok(Value::Array(Vec::new()));
        }
        if let Some(bad) = items.iter().find(|item| !item.is_object()) {
            return Err(self.fail(ModelError::InvalidPayload(format!(
                "expected an object, found {}",
                kind_of(bad)
            ))));
        }

        let applied = match self
            .state
            .try_update_data(|data| apply_optimistic(data, &items, batch))
        {
            Some(Ok(applied)) => applied,
            Some(Err(err)) => return Err(self.fail(err)),
            None => return Err(ModelError::Disposed),
        };

        {
            let mut temporary = self.temporary_ids();
            for temp_id in applied.pending.temp_ids() {
                temporary.insert(temp_id.as_str().to_string());
            }
        }

        let _loading = self.begin();
        debug!(count = items.len(), batch, "creating items");

        let url = self.endpoint.collection();
        let requests = items
            .into_iter()
            .map(|body| self.create_one(url.clone(), body));

        match try_join_all(requests).await {
            Ok(created) => {
                self.reconcile(&applied.pending, &created);
                for item in &created {
                    self.emit(CREATED, item);
                }
                if batch {
                    Ok(Value::Array(created))
                } else {
                    Ok(created.into_iter().next().unwrap_or(Value::Null))
                }
            }
            Err(err) => {
                warn!(error = %err, "create failed, rolling back");
                self.state.set_data(applied.snapshot);
                self.release_temporaries(&applied.pending);
                Err(self.fail(err))
            }
        }
    }

    async fn create_one(&self, url: String, body: Value) -> Result<Value> {
        let created = self
            .send(Method::POST, url.clone(), Some(body))
            .await?
            .ok_or_else(|| TransportError::InvalidResponse {
                url,
                reason: "create returned no content".into(),
            })?;
        self.validate_item(created)
    }

    /// Swap each optimistic item for its confirmed counterpart, matched by the
    /// identity recorded for its payload position.
    fn reconcile(&self, pending: &PendingCreates, created: &[Value]) {
        self.state.update_data(|data| {
            for (index, confirmed) in created.iter().enumerate() {
                if let Some(entry) = pending.for_index(index) {
                    if !data.replace_item(&entry.identity, confirmed.clone()) {
                        debug!(identity = %entry.identity, "optimistic item gone before reconcile");
                    }
                }
            }
        });
        self.release_temporaries(pending);
    }

    fn release_temporaries(&self, pending: &PendingCreates) {
        let mut temporary = self.temporary_ids();
        for temp_id in pending.temp_ids() {
            temporary.remove(temp_id.as_str());
        }
    }
}

/// Check shape and identities, then write the optimistic items.
///
/// Leaves `data` untouched when it returns an error.
fn apply_optimistic(data: &mut ManagedData, items: &[Value], batch: bool) -> Result<Applied> {
    if batch && data.is_single() {
        return Err(ModelError::BatchIntoSingle);
    }

    let snapshot = data.clone();
    let mut pending = PendingCreates::default();
    let mut optimistic = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let mut item = item.clone();
        match item_id(&item) {
            Some(id) => {
                // A single item is replaced, so only a collection can clash.
                let held = data.is_collection() && data.contains(&id);
                if held || pending.contains(&id) {
                    return Err(ModelError::DuplicateIdentity(id));
                }
                pending.push_original(index, id);
            }
            None => {
                let temp_id = TempId::generate();
                set_id(&mut item, temp_id.as_str());
                pending.push_temporary(index, temp_id);
            }
        }
        optimistic.push(item);
    }

    *data = match std::mem::take(data) {
        ManagedData::Many(mut existing) => {
            existing.extend(optimistic);
            ManagedData::Many(existing)
        }
        _ if batch => ManagedData::Many(optimistic),
        _ => ManagedData::from_value(optimistic.into_iter().next().unwrap_or(Value::Null)),
    };

    Ok(Applied { snapshot, pending })
}
