use crate::error::Result;
use crate::storage::BackendType;
use std::borrow::Cow;
use std::future::Future;
use std::path::Path;

/// Capability contract every storage backend satisfies.
///
/// Addresses are backend-specific strings: a path is only meaningful to the
/// backend that produced or will consume it.
pub trait StorageBackend: Send + Sync {
    fn backend_type(&self) -> BackendType;

    /// List every leaf file reachable under `path`, recursively.
    ///
    /// Entries are expressed in the backend's own namespace (see
    /// [`StorageBackend::listing_base`]); directories are never included.
    fn list_files(&self, path: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Materialize the file at `source_path` as `local_path`, creating missing
    /// parent directories and overwriting any existing file.
    fn download_file(
        &self,
        source_path: &str,
        local_path: &Path,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Write the contents of `local_path` to `dest_path`, creating missing
    /// intermediate directories and overwriting unconditionally.
    fn upload_file(
        &self,
        local_path: &Path,
        dest_path: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Prefix carried by the entries `list_files(dir)` returns.
    ///
    /// Stripping it from a listed entry yields the entry's path relative to
    /// `dir`. Backends that normalize addresses must return the normalized form.
    fn listing_base<'a>(&self, dir: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(dir.trim_matches('/'))
    }
}
