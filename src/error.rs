use crate::storage::BackendType;
use snafu::Snafu;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], for callers that branch on kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    BackendUnavailable,
    LocalIo,
    InvalidConfiguration,
    UnsupportedBackendType,
    InvalidPath,
}

/// Failure reported by the remote side of a backend.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RemoteError {
    #[snafu(display("{source}"))]
    Service { source: opendal::Error },

    #[snafu(display("{source}"))]
    Share { source: std::io::Error },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("[{backend}] path not found: {path}"))]
    NotFound { backend: BackendType, path: String },

    #[snafu(display("[{backend}] backend unavailable while accessing '{path}': {source}"))]
    BackendUnavailable {
        backend: BackendType,
        path: String,
        source: RemoteError,
    },

    #[snafu(display("Local I/O error at '{}': {source}", path.display()))]
    LocalIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("[{backend}] invalid configuration: {reason}"))]
    InvalidConfiguration { backend: BackendType, reason: String },

    #[snafu(display("Unsupported backend type: {storage_type}"))]
    UnsupportedBackendType { storage_type: String },

    #[snafu(display("[{backend}] invalid path '{path}': {reason}"))]
    InvalidPath {
        backend: BackendType,
        path: String,
        reason: String,
    },

    #[snafu(display("Environment variable '{key}' is required but not found"))]
    MissingEnvVar { key: String },

    #[snafu(display("Failed to parse config file '{}': {source}", path.display()))]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::BackendUnavailable { .. } => ErrorKind::BackendUnavailable,
            Error::LocalIo { .. } => ErrorKind::LocalIo,
            Error::InvalidConfiguration { .. }
            | Error::MissingEnvVar { .. }
            | Error::ConfigParse { .. } => ErrorKind::InvalidConfiguration,
            Error::UnsupportedBackendType { .. } => ErrorKind::UnsupportedBackendType,
            Error::InvalidPath { .. } => ErrorKind::InvalidPath,
        }
    }
}
