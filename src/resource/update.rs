//! update - optimistic shallow merge with per-item rollback.

use http::Method;
use serde_json::Value;
use tracing::{debug, warn};

use super::events::UPDATED;
use super::ResourceModel;
use crate::error::{ModelError, Result};
use crate::schema::kind_of;
use crate::state::{item_id, shallow_merge, ID_FIELD};

impl ResourceModel {
    /// Merge `payload` into the item identified by `id`.
    ///
    /// The merge is applied locally first; the request carries only the
    /// payload. On success the server's item is merged over the local one
    /// (server fields win). On failure only this item is put back the way it
    /// was, so concurrent edits to sibling items survive.
    ///
    /// The identity is fixed: a payload carrying an `id` other than `id` is
    /// rejected before anything changes.
    ///
    /// Returns the reconciled item.
    pub async fn update(&self, id: &str, payload: Value) -> Result<Value> {
        self.ensure_active()?;
        if !payload.is_object() {
            return Err(self.fail(ModelError::InvalidPayload(format!(
                "expected an object, found {}",
                kind_of(&payload)
            ))));
        }
        if payload.get(ID_FIELD).is_some() && item_id(&payload).as_deref() != Some(id) {
            return Err(self.fail(ModelError::InvalidPayload(format!(
                "update of {} cannot change its id",
                id
            ))));
        }

        let applied = self.state.try_update_data(|data| {
            let item = data
                .find_mut(id)
                .ok_or_else(|| ModelError::NotFound { id: id.to_string() })?;
            let original = item.clone();
            shallow_merge(item, &payload);
            let merged = item.clone();
            Ok((original, merged))
        });
        let (original, optimistic) = match applied {
            Some(Ok(applied)) => applied,
            Some(Err(err)) => return Err(self.fail(err)),
            None => return Err(ModelError::Disposed),
        };

        let _loading = self.begin();

        match self.confirm_update(id, payload).await {
            Ok(confirmed) => {
                let reconciled = self
                    .state
                    .update_data(|data| match data.find_mut(id) {
                        Some(item) => {
                            if let Some(server) = &confirmed {
                                shallow_merge(item, server);
                            }
                            Some(item.clone())
                        }
                        None => {
                            debug!(id, "updated item gone before reconcile");
                            None
                        }
                    })
                    .flatten()
                    .or(confirmed)
                    .unwrap_or(optimistic);
                self.emit(UPDATED, &reconciled);
                Ok(reconciled)
            }
            Err(err) => {
                warn!(id, error = %err, "update failed, restoring item");
                let restored = self.state.try_update_data(|data| {
                    if data.replace_item(id, original) {
                        Ok(())
                    } else {
                        Err(())
                    }
                });
                if let Some(Err(())) = restored {
                    warn!(id, "updated item gone before rollback, nothing restored");
                }
                Err(self.fail(err))
            }
        }
    }

    async fn confirm_update(&self, id: &str, payload: Value) -> Result<Option<Value>> {
        let url = self.endpoint.item(id);
        match self.send(Method::PUT, url, Some(payload)).await? {
            Some(server) => Ok(Some(self.validate_item(server)?)),
            None => Ok(None),
        }
    }
}
