use crate::error::{Error, Result};
use crate::logging::LogSink;
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub mod backends;
pub mod constants;
pub mod contract;
pub mod params;
pub(crate) mod utils;

pub use self::backends::azure_datalake::AzureDataLakeBackend;
pub use self::backends::network_folder::NetworkFolderBackend;
pub use self::contract::StorageBackend;
pub use self::params::BackendParams;

/// Storage backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendType {
    AzureDataLake,
    WindowsNetwork,
}

impl BackendType {
    /// Canonical type tag, as accepted by [`create_backend`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AzureDataLake => "azure_datalake",
            Self::WindowsNetwork => "windows_network",
        }
    }
}

impl FromStr for BackendType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "azure_datalake" => Ok(Self::AzureDataLake),
            "windows_network" => Ok(Self::WindowsNetwork),
            _ => Err(Error::UnsupportedBackendType {
                storage_type: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A backend built by [`create_backend`]. Variants are fixed; each one
/// forwards the contract to its adapter.
#[derive(Debug, Clone)]
pub enum Backend {
    AzureDataLake(AzureDataLakeBackend),
    NetworkFolder(NetworkFolderBackend),
}

impl StorageBackend for Backend {
    fn backend_type(&self) -> BackendType {
        match self {
            Backend::AzureDataLake(backend) => backend.backend_type(),
            Backend::NetworkFolder(backend) => backend.backend_type(),
        }
    }

    async fn list_files(&self, path: &str) -> Result<Vec<String>> {
        match self {
            Backend::AzureDataLake(backend) => backend.list_files(path).await,
            Backend::NetworkFolder(backend) => backend.list_files(path).await,
        }
    }

    async fn download_file(&self, source_path: &str, local_path: &Path) -> Result<()> {
        match self {
            Backend::AzureDataLake(backend) => backend.download_file(source_path, local_path).await,
            Backend::NetworkFolder(backend) => backend.download_file(source_path, local_path).await,
        }
    }

    async fn upload_file(&self, local_path: &Path, dest_path: &str) -> Result<()> {
        match self {
            Backend::AzureDataLake(backend) => backend.upload_file(local_path, dest_path).await,
            Backend::NetworkFolder(backend) => backend.upload_file(local_path, dest_path).await,
        }
    }

    fn listing_base<'a>(&self, dir: &'a str) -> Cow<'a, str> {
        match self {
            Backend::AzureDataLake(backend) => backend.listing_base(dir),
            Backend::NetworkFolder(backend) => backend.listing_base(dir),
        }
    }
}

/// Build a backend from a case-insensitive type tag and its named parameters.
///
/// Diagnostics go to the process-wide logger; see [`create_backend_with_sink`]
/// to inject another one.
pub async fn create_backend(storage_type: &str, params: &BackendParams) -> Result<Backend> {
    create_backend_with_sink(storage_type, params, LogSink::global()).await
}

pub async fn create_backend_with_sink(
    storage_type: &str,
    params: &BackendParams,
    sink: LogSink,
) -> Result<Backend> {
    let backend_type = BackendType::from_str(storage_type)?;
    sink.debug(format_args!(
        "create_backend type={backend_type} params={:?}",
        params.keys().collect::<Vec<_>>()
    ));

    match backend_type {
        BackendType::AzureDataLake => {
            AzureDataLakeBackend::from_params(params, sink).map(Backend::AzureDataLake)
        }
        BackendType::WindowsNetwork => NetworkFolderBackend::from_params(params, sink)
            .await
            .map(Backend::NetworkFolder),
    }
}
