use crate::error::{ConfigParseSnafu, LocalIoSnafu, MissingEnvVarSnafu, Result};
use crate::logging::LogSink;
use crate::storage::constants::{
    PARAM_ACCOUNT_NAME, PARAM_ACCOUNT_URL, PARAM_BASE_PATH, PARAM_CREDENTIAL, STAGING_DIR_ENV,
};
use crate::storage::{Backend, BackendParams, create_backend_with_sink};
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt};
use std::env;
use std::path::{Path, PathBuf};

/// Which end of a transfer a backend serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendRole {
    Source,
    Destination,
}

impl BackendRole {
    fn env_prefix(&self) -> &'static str {
        match self {
            BackendRole::Source => "SOURCE",
            BackendRole::Destination => "DEST",
        }
    }
}

/// A backend type tag plus the parameters forwarded to its constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(rename = "type")]
    pub storage_type: String,
    #[serde(default)]
    pub params: BackendParams,
}

impl BackendConfig {
    pub async fn build(&self, sink: LogSink) -> Result<Backend> {
        create_backend_with_sink(&self.storage_type, &self.params, sink).await
    }
}

/// Contents of a JSON transfer configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransferConfig {
    pub source: BackendConfig,
    pub destination: BackendConfig,
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,
}

impl TransferConfig {
    pub fn backend(&self, role: BackendRole) -> &BackendConfig {
        match role {
            BackendRole::Source => &self.source,
            BackendRole::Destination => &self.destination,
        }
    }
}

// Parameter name, role-scoped variable suffix, and the shared fallback variable.
const ENV_PARAMS: &[(&str, &str, Option<&str>)] = &[
    (PARAM_ACCOUNT_URL, "ACCOUNT_URL", Some("AZURE_STORAGE_ACCOUNT_URL")),
    (PARAM_ACCOUNT_NAME, "ACCOUNT_NAME", Some("AZURE_STORAGE_ACCOUNT")),
    (PARAM_CREDENTIAL, "CREDENTIAL", Some("AZURE_STORAGE_KEY")),
    (PARAM_BASE_PATH, "BASE_PATH", None),
];

/// Load one backend's configuration from environment variables.
pub fn load_backend_config(role: BackendRole) -> Result<BackendConfig> {
    load_backend_config_from(role, |key| env::var(key).ok())
}

/// Same as [`load_backend_config`], reading variables through `lookup`.
pub fn load_backend_config_from(
    role: BackendRole,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<BackendConfig> {
    let prefix = role.env_prefix();
    let type_key = format!("{prefix}_STORAGE_TYPE");
    let storage_type = lookup(&type_key).context(MissingEnvVarSnafu { key: type_key })?;

    let mut params = BackendParams::new();
    for (param, suffix, fallback) in ENV_PARAMS {
        let value = lookup(&format!("{prefix}_{suffix}"))
            .or_else(|| fallback.and_then(|key| lookup(key)));
        if let Some(value) = value {
            params.insert(*param, value);
        }
    }

    Ok(BackendConfig {
        storage_type,
        params,
    })
}

/// Load a transfer configuration from a JSON file.
pub fn load_transfer_config_file(path: impl AsRef<Path>) -> Result<TransferConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).context(LocalIoSnafu { path })?;
    serde_json::from_str(&contents).context(ConfigParseSnafu { path })
}

/// Staging directory override from `FILETRANSFER_STAGING_DIR`, if set.
pub fn staging_dir_from_env() -> Option<PathBuf> {
    env::var_os(STAGING_DIR_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
