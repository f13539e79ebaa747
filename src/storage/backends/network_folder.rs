use crate::error::{
    Error, InvalidConfigurationSnafu, InvalidPathSnafu, LocalIoSnafu, RemoteError, Result,
};
use crate::logging::LogSink;
use crate::storage::constants::{
    COPY_BUFFER_SIZE, NETWORK_FOLDER_LOG_TARGET, PARAM_BASE_PATH,
};
use crate::storage::utils::error::{BackendResultExt, IntoBackendError, log_failure};
use crate::storage::utils::path::{listing_dir, to_slash_relative};
use crate::storage::utils::size::format_size;
use crate::storage::{BackendParams, BackendType, StorageBackend};
use filetime::FileTime;
use futures::stream::TryStreamExt;
use opendal::{EntryMode, Operator};
use snafu::ResultExt;
use std::borrow::Cow;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const BACKEND: BackendType = BackendType::WindowsNetwork;

/// Backend over a mounted directory tree: a UNC share, a mapped drive, or
/// any local directory.
///
/// Addresses are relative to the root given at construction and use `/`
/// separators in listings.
#[derive(Clone)]
pub struct NetworkFolderBackend {
    root: PathBuf,
    operator: Operator,
    sink: LogSink,
}

impl NetworkFolderBackend {
    /// Fails with `InvalidConfiguration` unless `base_path` is an accessible directory.
    pub async fn new(base_path: impl AsRef<Path>) -> Result<Self> {
        Self::with_sink(base_path, LogSink::global()).await
    }

    pub async fn with_sink(base_path: impl AsRef<Path>, sink: LogSink) -> Result<Self> {
        let base_path = base_path.as_ref();
        let sink = sink.with_target(NETWORK_FOLDER_LOG_TARGET);

        let root = match fs::canonicalize(base_path).await {
            Ok(root) => root,
            Err(e) => {
                return InvalidConfigurationSnafu {
                    backend: BACKEND,
                    reason: format!(
                        "base path {} does not exist or is not accessible: {e}",
                        base_path.display()
                    ),
                }
                .fail();
            }
        };
        let is_dir = fs::metadata(&root)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return InvalidConfigurationSnafu {
                backend: BACKEND,
                reason: format!("base path {} is not a directory", base_path.display()),
            }
            .fail();
        }

        let builder = opendal::services::Fs::default().root(&root.to_string_lossy());
        let operator = match Operator::new(builder) {
            Ok(builder) => builder.finish(),
            Err(e) => {
                return InvalidConfigurationSnafu {
                    backend: BACKEND,
                    reason: format!("cannot open {}: {e}", root.display()),
                }
                .fail();
            }
        };

        sink.debug(format_args!(
            "NetworkFolderBackend initialized with base_path: {}",
            root.display()
        ));
        Ok(Self {
            root,
            operator,
            sink,
        })
    }

    pub async fn from_params(params: &BackendParams, sink: LogSink) -> Result<Self> {
        let base_path = params.require(PARAM_BASE_PATH, BACKEND)?;
        Self::with_sink(base_path, sink).await
    }

    /// Canonical root directory every address is resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `path` under the root, returning the absolute location and the
    /// normalized `/`-separated relative address.
    fn resolve(&self, path: &str) -> Result<(PathBuf, String)> {
        match normalize_address(path) {
            Some(relative) => Ok((self.root.join(&relative), relative)),
            None => InvalidPathSnafu {
                backend: BACKEND,
                path,
                reason: "address escapes the backend root",
            }
            .fail(),
        }
    }

    fn resolve_file(&self, path: &str) -> Result<PathBuf> {
        let (full_path, relative) = self.resolve(path)?;
        if relative.is_empty() {
            return InvalidPathSnafu {
                backend: BACKEND,
                path,
                reason: "address names no file",
            }
            .fail();
        }
        Ok(full_path)
    }

    async fn list_inner(&self, path: &str) -> Result<Vec<String>> {
        let (full_path, relative) = self.resolve(path)?;
        let meta = fs::metadata(&full_path).await.for_path(BACKEND, path)?;
        if !meta.is_dir() {
            // A regular file has no descendants.
            return Ok(Vec::new());
        }

        let mut lister = self
            .operator
            .lister_with(&listing_dir(&relative))
            .recursive(true)
            .await
            .for_path(BACKEND, path)?;
        let mut files = Vec::new();
        while let Some(entry) = lister.try_next().await.for_path(BACKEND, path)? {
            if entry.metadata().mode() == EntryMode::FILE {
                files.push(entry.path().trim_start_matches('/').to_string());
            }
        }
        files.sort();

        self.sink.debug(format_args!(
            "Listed {} files in {}",
            files.len(),
            full_path.display()
        ));
        Ok(files)
    }

    async fn download_inner(&self, source_path: &str, local_path: &Path) -> Result<()> {
        let full_source_path = self.resolve_file(source_path)?;
        let meta = fs::metadata(&full_source_path)
            .await
            .for_path(BACKEND, source_path)?;
        if !meta.is_file() {
            return InvalidPathSnafu {
                backend: BACKEND,
                path: source_path,
                reason: "address is not a regular file",
            }
            .fail();
        }

        if let Some(parent) = local_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context(LocalIoSnafu { path: parent })?;
        }
        let bytes = copy_with_metadata(&full_source_path, local_path, &meta, &self.sink)
            .await
            .map_err(|(side, source)| match side {
                CopySide::Read => source.into_backend_error(BACKEND, source_path),
                CopySide::Write => Error::LocalIo {
                    path: local_path.to_path_buf(),
                    source,
                },
            })?;

        self.sink.debug(format_args!(
            "Copied file from {} to {} ({})",
            full_source_path.display(),
            local_path.display(),
            format_size(bytes)
        ));
        Ok(())
    }

    async fn upload_inner(&self, local_path: &Path, dest_path: &str) -> Result<()> {
        let full_dest_path = self.resolve_file(dest_path)?;
        let meta = fs::metadata(local_path)
            .await
            .context(LocalIoSnafu { path: local_path })?;
        if !meta.is_file() {
            return Err(Error::LocalIo {
                path: local_path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            });
        }

        if let Some(parent) = full_dest_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| self.share_error(dest_path, source))?;
        }
        let bytes = copy_with_metadata(local_path, &full_dest_path, &meta, &self.sink)
            .await
            .map_err(|(side, source)| match side {
                CopySide::Read => Error::LocalIo {
                    path: local_path.to_path_buf(),
                    source,
                },
                CopySide::Write => self.share_error(dest_path, source),
            })?;

        self.sink.debug(format_args!(
            "Copied file from {} to {} ({})",
            local_path.display(),
            full_dest_path.display(),
            format_size(bytes)
        ));
        Ok(())
    }

    /// Failures writing into the share are the backend's, whatever their io kind.
    fn share_error(&self, path: &str, source: io::Error) -> Error {
        Error::BackendUnavailable {
            backend: BACKEND,
            path: path.to_string(),
            source: RemoteError::Share { source },
        }
    }
}

impl StorageBackend for NetworkFolderBackend {
    fn backend_type(&self) -> BackendType {
        BACKEND
    }

    async fn list_files(&self, path: &str) -> Result<Vec<String>> {
        self.sink
            .debug(format_args!("list_files backend={BACKEND} path={path}"));
        log_failure(&self.sink, BACKEND, "list_files", self.list_inner(path).await)
    }

    async fn download_file(&self, source_path: &str, local_path: &Path) -> Result<()> {
        self.sink.debug(format_args!(
            "download_file backend={BACKEND} source_path={source_path} local_path={}",
            local_path.display()
        ));
        log_failure(
            &self.sink,
            BACKEND,
            "download_file",
            self.download_inner(source_path, local_path).await,
        )
    }

    async fn upload_file(&self, local_path: &Path, dest_path: &str) -> Result<()> {
        self.sink.debug(format_args!(
            "upload_file backend={BACKEND} local_path={} dest_path={dest_path}",
            local_path.display()
        ));
        log_failure(
            &self.sink,
            BACKEND,
            "upload_file",
            self.upload_inner(local_path, dest_path).await,
        )
    }

    /// Listings are root-relative, so the base is the address in the same
    /// normalized form `list_files` resolves it to.
    fn listing_base<'a>(&self, dir: &'a str) -> Cow<'a, str> {
        match normalize_address(dir) {
            Some(relative) => Cow::Owned(relative),
            None => Cow::Borrowed(dir.trim_matches('/')),
        }
    }
}

/// Root-relative, `/`-separated form of an address, or `None` if it would
/// leave the root.
fn normalize_address(path: &str) -> Option<String> {
    to_slash_relative(Path::new(path.trim_start_matches(['/', '\\'])))
}

impl fmt::Debug for NetworkFolderBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkFolderBackend")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// End of a copy an I/O error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CopySide {
    Read,
    Write,
}

type CopyResult<T> = std::result::Result<T, (CopySide, io::Error)>;

/// Copy content and permission bits, then carry over access and modification
/// times. Permission and timestamp failures are logged, not raised.
async fn copy_with_metadata(
    from: &Path,
    to: &Path,
    meta: &std::fs::Metadata,
    sink: &LogSink,
) -> CopyResult<u64> {
    let mut reader = fs::File::open(from)
        .await
        .map_err(|e| (CopySide::Read, e))?;
    let mut writer = fs::File::create(to)
        .await
        .map_err(|e| (CopySide::Write, e))?;
    let bytes = pump(&mut reader, &mut writer).await?;
    drop(writer);

    if let Err(e) = fs::set_permissions(to, meta.permissions()).await {
        sink.debug(format_args!(
            "could not preserve permissions on {}: {e}",
            to.display()
        ));
    }
    let accessed = FileTime::from_last_access_time(meta);
    let modified = FileTime::from_last_modification_time(meta);
    if let Err(e) = filetime::set_file_times(to, accessed, modified) {
        sink.debug(format_args!(
            "could not preserve timestamps on {}: {e}",
            to.display()
        ));
    }
    Ok(bytes)
}

/// Stream `from` into `to`, tagging any error with the side that raised it.
async fn pump<R, W>(from: &mut R, to: &mut W) -> CopyResult<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = from.read(&mut buf).await.map_err(|e| (CopySide::Read, e))?;
        if n == 0 {
            break;
        }
        to.write_all(&buf[..n])
            .await
            .map_err(|e| (CopySide::Write, e))?;
        total += n as u64;
    }
    to.flush().await.map_err(|e| (CopySide::Write, e))?;
    Ok(total)
}
