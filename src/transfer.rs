//! Backend-agnostic transfer of single files and directory trees.
//!
//! Every file moves in two legs through a private staging directory on local
//! disk: download from the source backend, then upload to the destination.
//! The staging directory is removed when the transfer returns, whether it
//! succeeded or not.

use crate::error::{Error, InvalidPathSnafu, LocalIoSnafu, Result};
use crate::logging::LogSink;
use crate::storage::StorageBackend;
use crate::storage::constants::{STAGING_DIR_PREFIX, STAGING_FALLBACK_NAME, TRANSFER_LOG_TARGET};
use crate::storage::utils::path::{basename, join_path, strip_listing_base};
use crate::storage::utils::size::format_size;
use snafu::{OptionExt, ResultExt};
use std::fmt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;

/// Outcome of one completed file transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub source_path: String,
    pub dest_path: String,
    pub bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransferPhase {
    Downloading,
    Uploading,
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferPhase::Downloading => f.write_str("download"),
            TransferPhase::Uploading => f.write_str("upload"),
        }
    }
}

/// Scratch directory owning one staged file; removed on drop.
struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    fn create(parent: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(STAGING_DIR_PREFIX)
            .tempdir_in(parent)
            .context(LocalIoSnafu { path: parent })?;
        Ok(Self { dir })
    }

    fn file_for(&self, source_path: &str) -> PathBuf {
        let name = basename(source_path);
        if name.is_empty() {
            self.dir.path().join(STAGING_FALLBACK_NAME)
        } else {
            self.dir.path().join(name)
        }
    }
}

/// Moves files from a source backend to a destination backend.
///
/// Both backends are fixed for the manager's lifetime. Transfers are strictly
/// sequential and nothing is retried here; errors reach the caller exactly as
/// the backend reported them.
pub struct TransferManager<S, D> {
    source: S,
    destination: D,
    staging_root: PathBuf,
    sink: LogSink,
}

impl<S: StorageBackend, D: StorageBackend> TransferManager<S, D> {
    pub fn new(source: S, destination: D) -> Self {
        Self::with_sink(source, destination, LogSink::global())
    }

    pub fn with_sink(source: S, destination: D, sink: LogSink) -> Self {
        let sink = sink.with_target(TRANSFER_LOG_TARGET);
        sink.debug(format_args!(
            "TransferManager initialized with source {} and destination {}",
            source.backend_type(),
            destination.backend_type()
        ));
        Self {
            source,
            destination,
            staging_root: std::env::temp_dir(),
            sink,
        }
    }

    /// Parent directory for per-transfer staging areas (defaults to the OS temp dir).
    pub fn staging_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_root = dir.into();
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn destination(&self) -> &D {
        &self.destination
    }

    /// Copy one file: download `source_path` into a fresh staging area, then
    /// upload it as `dest_path`. The upload never starts if the download failed.
    pub async fn transfer_file(&self, source_path: &str, dest_path: &str) -> Result<TransferReport> {
        let staging = StagingArea::create(&self.staging_root)?;
        let local_path = staging.file_for(source_path);

        self.sink.info(format_args!(
            "Starting transfer of {source_path} to {dest_path}"
        ));

        let result = self
            .staged_copy(source_path, dest_path, &local_path)
            .await;
        match result {
            Ok(bytes) => {
                self.sink.info(format_args!(
                    "Completed transfer of {source_path} to {dest_path} ({})",
                    format_size(bytes)
                ));
                Ok(TransferReport {
                    source_path: source_path.to_string(),
                    dest_path: dest_path.to_string(),
                    bytes,
                })
            }
            Err((phase, err)) => {
                self.sink.error(format_args!(
                    "Transfer of {source_path} to {dest_path} failed during {phase}: {err}"
                ));
                Err(err)
            }
        }
    }

    async fn staged_copy(
        &self,
        source_path: &str,
        dest_path: &str,
        local_path: &Path,
    ) -> std::result::Result<u64, (TransferPhase, Error)> {
        self.source
            .download_file(source_path, local_path)
            .await
            .map_err(|e| (TransferPhase::Downloading, e))?;

        let bytes = fs::metadata(local_path)
            .await
            .context(LocalIoSnafu { path: local_path })
            .map_err(|e| (TransferPhase::Downloading, e))?
            .len();

        self.destination
            .upload_file(local_path, dest_path)
            .await
            .map_err(|e| (TransferPhase::Uploading, e))?;
        Ok(bytes)
    }

    /// Copy every file under `source_dir` to the same relative location under
    /// `dest_dir`, one at a time in listing order.
    ///
    /// The first failure aborts the batch; files already copied stay in place.
    pub async fn transfer_files(
        &self,
        source_dir: &str,
        dest_dir: &str,
    ) -> Result<Vec<TransferReport>> {
        let files = self.source.list_files(source_dir).await?;
        self.sink.info(format_args!(
            "Found {} files to transfer from {source_dir} to {dest_dir}",
            files.len()
        ));

        let base = self.source.listing_base(source_dir);
        let mut reports = Vec::with_capacity(files.len());
        for listed in &files {
            let relative = strip_listing_base(listed, &base).context(InvalidPathSnafu {
                backend: self.source.backend_type(),
                path: listed.as_str(),
                reason: format!("listed entry lies outside '{base}'"),
            })?;
            let source_path = join_path(source_dir, relative);
            let dest_path = join_path(dest_dir, relative);
            reports.push(self.transfer_file(&source_path, &dest_path).await?);
        }
        Ok(reports)
    }
}
