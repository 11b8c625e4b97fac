use serde::{Deserialize, Serialize};

use crate::errors::AttributionError;

/// Coordinators this install knows about, and how to reach their key
/// endpoints. Origins and path are opaque strings, provided by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Recognized coordinator origins, e.g. `https://publickeyservice.test`.
    pub origins: Vec<String>,

    /// Path appended to an origin to build its key fetch URI.
    pub key_fetch_path: String,

    /// Coordinator used when the caller does not name one.
    pub default_origin: String,

    /// Local coordinator for development. Its keys are never persisted.
    #[serde(default)]
    pub local_origin: Option<String>,
}

impl CoordinatorConfig {
    /// Builds a configuration from a comma-separated origin list. The default
    /// origin must be one of the listed origins.
    pub fn from_delimited(
        origins: &str,
        key_fetch_path: &str,
        default_origin: &str,
    ) -> Result<Self, AttributionError> {
        let origins: Vec<String> = origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();
        if origins.is_empty() {
            return Err(AttributionError::InvalidConfig(
                "no coordinator origins".to_string(),
            ));
        }
        let default_origin = default_origin.trim().to_string();
        if !origins.contains(&default_origin) {
            return Err(AttributionError::InvalidConfig(format!(
                "default origin `{default_origin}` is not a recognized origin"
            )));
        }
        Ok(Self {
            origins,
            key_fetch_path: key_fetch_path.to_string(),
            default_origin,
            local_origin: None,
        })
    }

    /// Parses a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, AttributionError> {
        serde_json::from_str(json)
            .map_err(|err| AttributionError::InvalidConfig(err.to_string()))
    }

    pub fn with_local_origin(mut self, local_origin: impl Into<String>) -> Self {
        self.local_origin = Some(local_origin.into());
        self
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        self.origins.iter().any(|known| known == origin) || self.is_local(origin)
    }

    pub fn is_local(&self, origin: &str) -> bool {
        self.local_origin.as_deref() == Some(origin)
    }

    /// Key fetch URI of `origin`, joined with exactly one `/`.
    pub fn key_fetch_uri(&self, origin: &str) -> String {
        let path = self.key_fetch_path.trim_start_matches('/');
        if path.is_empty() {
            return origin.to_string();
        }
        format!("{}/{}", origin.trim_end_matches('/'), path)
    }
}
