//! delete - optimistic removal with full rollback.

use http::Method;
use serde_json::json;
use tracing::{debug, warn};

use super::events::DELETED;
use super::ResourceModel;
use crate::error::{ModelError, Result};

/// Marker error for "nothing matched", never surfaced to callers.
struct NoMatch;

impl ResourceModel {
    /// Remove the item identified by `id`.
    ///
    /// A collection loses the item (and stays a collection, possibly empty); a
    /// model holding that single item becomes empty. Deleting an id the model
    /// does not hold succeeds without issuing a request. On failure the data
    /// is restored to exactly what it was before the call.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.ensure_active()?;

        let removed = self.state.try_update_data(|data| {
            let snapshot = data.clone();
            if data.remove_item(id) {
                Ok(snapshot)
            } else {
                Err(NoMatch)
            }
        });
        let snapshot = match removed {
            Some(Ok(snapshot)) => snapshot,
            Some(Err(NoMatch)) => {
                debug!(id, "nothing to delete");
                return Ok(());
            }
            None => return Err(ModelError::Disposed),
        };

        let _loading = self.begin();
        let url = self.endpoint.item(id);

        match self.send(Method::DELETE, url, None).await {
            Ok(_) => {
                self.emit(DELETED, &json!({ "id": id }));
                Ok(())
            }
            Err(err) => {
                warn!(id, error = %err, "delete failed, restoring data");
                self.state.set_data(snapshot);
                Err(self.fail(err))
            }
        }
    }
}
