// Classification of backend failures into crate errors, plus failure logging
use crate::error::{Error, RemoteError, Result};
use crate::logging::LogSink;
use crate::storage::BackendType;

/// Convert a backend-reported failure into our unified Error type, given the
/// backend and address it concerns.
pub trait IntoBackendError {
    fn into_backend_error(self, backend: BackendType, path: &str) -> Error;
}

impl IntoBackendError for opendal::Error {
    fn into_backend_error(self, backend: BackendType, path: &str) -> Error {
        match self.kind() {
            opendal::ErrorKind::NotFound => Error::NotFound {
                backend,
                path: path.to_string(),
            },
            _ => Error::BackendUnavailable {
                backend,
                path: path.to_string(),
                source: RemoteError::Service { source: self },
            },
        }
    }
}

impl IntoBackendError for std::io::Error {
    fn into_backend_error(self, backend: BackendType, path: &str) -> Error {
        match self.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound {
                backend,
                path: path.to_string(),
            },
            _ => Error::BackendUnavailable {
                backend,
                path: path.to_string(),
                source: RemoteError::Share { source: self },
            },
        }
    }
}

pub trait BackendResultExt<T> {
    /// Classify the error side of a backend call made for `path`.
    fn for_path(self, backend: BackendType, path: &str) -> Result<T>;
}

impl<T, E: IntoBackendError> BackendResultExt<T> for std::result::Result<T, E> {
    fn for_path(self, backend: BackendType, path: &str) -> Result<T> {
        self.map_err(|e| e.into_backend_error(backend, path))
    }
}

/// Log `result`'s error, if any, at the point it surfaces from `operation`
/// on `backend`.
pub fn log_failure<T>(
    sink: &LogSink,
    backend: BackendType,
    operation: &str,
    result: Result<T>,
) -> Result<T> {
    if let Err(err) = &result {
        sink.error(format_args!("{operation} failed on {backend}: {err}"));
    }
    result
}
