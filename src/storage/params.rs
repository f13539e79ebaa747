use crate::error::{InvalidConfigurationSnafu, Result};
use crate::storage::BackendType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named constructor parameters handed to the backend factory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendParams(BTreeMap<String, String>);

impl BackendParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Value for `key`; blank values count as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn require(&self, key: &str, backend: BackendType) -> Result<&str> {
        match self.get(key) {
            Some(value) => Ok(value),
            None => InvalidConfigurationSnafu {
                backend,
                reason: format!("missing required parameter '{key}'"),
            }
            .fail(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}
