//! Model configuration and builder.

use std::collections::BTreeMap;
use std::sync::Arc;

use http::header::{HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use http::HeaderMap;
use serde::{Deserialize, Serialize};

use super::endpoint::Endpoint;
use super::executor::RequestExecutor;
use super::ResourceModel;
use crate::error::ConfigError;
use crate::schema::Schema;
use crate::state::ManagedData;

/// Declarative settings for a [`ResourceModel`].
///
/// Deserializable so applications can keep it next to the rest of their
/// configuration:
///
/// ```ignore
/// let config: ModelConfig = serde_json::from_str(r#"{
///     "base_url": "https://api.example.com",
///     "resource": "users",
///     "headers": { "Authorization": "Bearer abc" }
/// }"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub base_url: String,
    pub resource: String,
    /// Validate server responses against the schema (when one is set).
    #[serde(default = "default_validate")]
    pub validate_responses: bool,
    /// Headers sent with every request, on top of the JSON defaults.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_validate() -> bool {
    true
}

impl ModelConfig {
    pub fn new(base_url: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            resource: resource.into(),
            validate_responses: true,
            headers: BTreeMap::new(),
        }
    }

    /// JSON content negotiation headers merged with the configured ones.
    /// Configured values win.
    pub(crate) fn header_map(&self) -> Result<HeaderMap, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ConfigError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                }
            })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }
}

/// Builder for [`ResourceModel`].
///
/// Base url, resource path and executor are required; `build` fails with a
/// [`ConfigError`] naming the first one missing.
#[derive(Default)]
pub struct ResourceModelBuilder {
    base_url: Option<String>,
    resource: Option<String>,
    executor: Option<Arc<dyn RequestExecutor>>,
    schema: Option<Arc<dyn Schema>>,
    initial: ManagedData,
    validate_responses: Option<bool>,
    headers: BTreeMap<String, String>,
}

impl ResourceModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a [`ModelConfig`].
    pub fn from_config(config: ModelConfig) -> Self {
        Self {
            base_url: Some(config.base_url),
            resource: Some(config.resource),
            validate_responses: Some(config.validate_responses),
            headers: config.headers,
            ..Self::default()
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn executor(mut self, executor: impl RequestExecutor + 'static) -> Self {
        self.executor = Some(Arc::new(executor));
        self
    }

    /// Use an executor shared with other models.
    pub fn shared_executor(mut self, executor: Arc<dyn RequestExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn schema(mut self, schema: impl Schema + 'static) -> Self {
        self.schema = Some(Arc::new(schema));
        self
    }

    pub fn shared_schema(mut self, schema: Arc<dyn Schema>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn initial_data(mut self, data: impl Into<ManagedData>) -> Self {
        self.initial = data.into();
        self
    }

    pub fn validate_responses(mut self, validate: bool) -> Self {
        self.validate_responses = Some(validate);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn build(self) -> Result<ResourceModel, ConfigError> {
        let base_url = self.base_url.ok_or(ConfigError::MissingBaseUrl)?;
        let resource = self.resource.ok_or(ConfigError::MissingResource)?;
        let endpoint = Endpoint::new(&base_url, &resource)?;
        let executor = self.executor.ok_or(ConfigError::MissingExecutor)?;

        let config = ModelConfig {
            base_url,
            resource,
            validate_responses: self.validate_responses.unwrap_or(true),
            headers: self.headers,
        };
        let headers = config.header_map()?;

        Ok(ResourceModel::assemble(
            endpoint,
            executor,
            self.schema,
            self.initial,
            config.validate_responses,
            headers,
        ))
    }
}
