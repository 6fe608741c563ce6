//! Endpoint - addresses for a resource collection.

use crate::error::ConfigError;

/// Base address plus resource path, normalized once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: String,
    resource: String,
}

impl Endpoint {
    /// Trailing slashes on `base` and leading slashes on `resource` are dropped.
    pub fn new(base: &str, resource: &str) -> Result<Self, ConfigError> {
        if base.trim().is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        if resource.trim().is_empty() {
            return Err(ConfigError::MissingResource);
        }
        Ok(Self {
            base: base.trim().trim_end_matches('/').to_string(),
            resource: resource.trim().trim_start_matches('/').to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// `{base}/{resource}`
    pub fn collection(&self) -> String {
        format!("{}/{}", self.base, self.resource)
    }

    /// `{base}/{resource}/{id}`
    pub fn item(&self, id: &str) -> String {
        format!("{}/{}/{}", self.base, self.resource, id)
    }

    /// `{base}/{resource}?ids=a,b,c`
    pub fn filtered<S: AsRef<str>>(&self, ids: &[S]) -> String {
        let joined = ids.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",");
        format!("{}?ids={}", self.collection(), joined)
    }
}
