//! fetch - replace the model's data with what the server holds.

use http::Method;
use serde_json::Value;

use super::events::FETCHED;
use super::ResourceModel;
use crate::error::{Result, TransportError};
use crate::schema::kind_of;
use crate::state::ManagedData;

/// What to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchTarget {
    /// `GET {base}/{resource}`
    #[default]
    All,
    /// `GET {base}/{resource}/{id}`
    One(String),
    /// `GET {base}/{resource}?ids=a,b,c`. An empty list fetches everything.
    Many(Vec<String>),
}

impl From<&str> for FetchTarget {
    fn from(id: &str) -> Self {
        FetchTarget::One(id.to_string())
    }
}

impl From<String> for FetchTarget {
    fn from(id: String) -> Self {
        FetchTarget::One(id)
    }
}

impl From<Vec<String>> for FetchTarget {
    fn from(ids: Vec<String>) -> Self {
        FetchTarget::Many(ids)
    }
}

impl From<&[&str]> for FetchTarget {
    fn from(ids: &[&str]) -> Self {
        FetchTarget::Many(ids.iter().map(|id| id.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FetchTarget {
    fn from(ids: [&str; N]) -> Self {
        FetchTarget::Many(ids.iter().map(|id| id.to_string()).collect())
    }
}

impl<T: Into<FetchTarget>> From<Option<T>> for FetchTarget {
    fn from(target: Option<T>) -> Self {
        target.map(Into::into).unwrap_or_default()
    }
}

impl ResourceModel {
    /// Load data from the server, replacing the local data wholesale.
    ///
    /// On failure the data is left untouched, the error cell is set and the
    /// error is returned. Validation failures never let raw data through.
    pub async fn fetch(&self, target: impl Into<FetchTarget>) -> Result<ManagedData> {
        self.ensure_active()?;
        let target = target.into();
        let _loading = self.begin();

        match self.request_data(&target).await {
            Ok(data) => {
                self.state.set_data(data.clone());
                self.emit(FETCHED, &data.to_value());
                Ok(data)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Shorthand for `fetch(FetchTarget::All)`.
    pub async fn fetch_all(&self) -> Result<ManagedData> {
        self.fetch(FetchTarget::All).await
    }

    async fn request_data(&self, target: &FetchTarget) -> Result<ManagedData> {
        match target {
            FetchTarget::All => self.request_collection(self.endpoint.collection()).await,
            FetchTarget::Many(ids) if ids.is_empty() => {
                self.request_collection(self.endpoint.collection()).await
            }
            FetchTarget::Many(ids) => self.request_collection(self.endpoint.filtered(ids)).await,
            FetchTarget::One(id) => self.request_single(self.endpoint.item(id)).await,
        }
    }

    async fn request_collection(&self, url: String) -> Result<ManagedData> {
        let body = self
            .send(Method::GET, url.clone(), None)
            .await?
            .unwrap_or_else(|| Value::Array(Vec::new()));

        match self.validate_collection(body)? {
            Value::Array(items) => Ok(ManagedData::Many(items)),
            other => Err(TransportError::InvalidResponse {
                url,
                reason: format!("expected a collection, found {}", kind_of(&other)),
            }
            .into()),
        }
    }

    async fn request_single(&self, url: String) -> Result<ManagedData> {
        let Some(body) = self.send(Method::GET, url.clone(), None).await? else {
            return Ok(ManagedData::Empty);
        };

        if body.is_array() {
            return Err(TransportError::InvalidResponse {
                url,
                reason: "expected a single resource, found an array".into(),
            }
            .into());
        }

        Ok(ManagedData::from_value(self.validate_item(body)?))
    }
}
