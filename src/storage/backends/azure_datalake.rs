use crate::error::{InvalidConfigurationSnafu, InvalidPathSnafu, LocalIoSnafu, Result};
use crate::logging::LogSink;
use crate::storage::constants::{
    AZURE_DATALAKE_LOG_TARGET, PARAM_ACCOUNT_NAME, PARAM_ACCOUNT_URL, PARAM_CREDENTIAL,
};
use crate::storage::utils::error::{BackendResultExt, log_failure};
use crate::storage::utils::path::{listing_dir, split_container};
use crate::storage::utils::size::format_size;
use crate::storage::{BackendParams, BackendType, StorageBackend};
use futures::stream::TryStreamExt;
use opendal::services::Azdls;
use opendal::{EntryMode, Operator};
use snafu::{ResultExt, ensure};
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use tokio::fs;

const BACKEND: BackendType = BackendType::AzureDataLake;

/// Azure Data Lake Storage Gen2 backend.
///
/// Addresses take the form `<filesystem>/<item path>`: the first segment
/// selects the filesystem (container), the rest names the item inside it.
#[derive(Clone)]
pub struct AzureDataLakeBackend {
    account_url: String,
    account_name: Option<String>,
    credential: Option<String>,
    sink: LogSink,
}

impl AzureDataLakeBackend {
    /// Create a backend for the account at `account_url`
    /// (e.g. `https://<account>.dfs.core.windows.net`).
    ///
    /// No request is made here; connectivity problems surface on first use.
    pub fn new(account_url: impl Into<String>, credential: Option<String>) -> Result<Self> {
        Self::with_sink(account_url, None, credential, LogSink::global())
    }

    pub fn with_sink(
        account_url: impl Into<String>,
        account_name: Option<String>,
        credential: Option<String>,
        sink: LogSink,
    ) -> Result<Self> {
        let account_url = account_url.into().trim_end_matches('/').to_string();
        ensure!(
            account_url.starts_with("https://") || account_url.starts_with("http://"),
            InvalidConfigurationSnafu {
                backend: BACKEND,
                reason: format!("account_url '{account_url}' is not an http(s) URL"),
            }
        );

        let account_name = account_name.or_else(|| account_name_from_url(&account_url));
        ensure!(
            credential.is_none() || account_name.is_some(),
            InvalidConfigurationSnafu {
                backend: BACKEND,
                reason: format!("cannot derive an account name from '{account_url}'"),
            }
        );

        let sink = sink.with_target(AZURE_DATALAKE_LOG_TARGET);
        sink.debug(format_args!(
            "AzureDataLakeBackend initialized with account_url: {account_url}"
        ));
        Ok(Self {
            account_url,
            account_name,
            credential,
            sink,
        })
    }

    pub fn from_params(params: &BackendParams, sink: LogSink) -> Result<Self> {
        let account_url = params.require(PARAM_ACCOUNT_URL, BACKEND)?;
        Self::with_sink(
            account_url,
            params.get(PARAM_ACCOUNT_NAME).map(str::to_string),
            params.get(PARAM_CREDENTIAL).map(str::to_string),
            sink,
        )
    }

    pub fn account_url(&self) -> &str {
        &self.account_url
    }

    fn filesystem_operator(&self, filesystem: &str) -> Result<Operator> {
        let mut builder = Azdls::default()
            .filesystem(filesystem)
            .endpoint(&self.account_url);
        if let Some(account_name) = &self.account_name {
            builder = builder.account_name(account_name);
        }
        if let Some(credential) = &self.credential {
            builder = builder.account_key(credential);
        }

        match Operator::new(builder) {
            Ok(builder) => Ok(builder.finish()),
            Err(e) => InvalidConfigurationSnafu {
                backend: BACKEND,
                reason: format!("cannot open filesystem '{filesystem}': {e}"),
            }
            .fail(),
        }
    }

    /// Split `path` into filesystem and item; `require_item` rejects
    /// container-only addresses.
    fn split_address<'a>(&self, path: &'a str, require_item: bool) -> Result<(&'a str, &'a str)> {
        let (filesystem, item) = split_container(path);
        ensure!(
            !filesystem.is_empty(),
            InvalidPathSnafu {
                backend: BACKEND,
                path,
                reason: "address names no filesystem",
            }
        );
        ensure!(
            !require_item || !item.is_empty(),
            InvalidPathSnafu {
                backend: BACKEND,
                path,
                reason: "address names a filesystem but no item",
            }
        );
        Ok((filesystem, item))
    }

    async fn list_inner(&self, path: &str) -> Result<Vec<String>> {
        let (filesystem, directory) = self.split_address(path, false)?;
        let operator = self.filesystem_operator(filesystem)?;
        let listing_path = listing_dir(directory);

        let mut lister = operator
            .lister_with(&listing_path)
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

        // An empty listing does not distinguish an empty directory from a missing one.
        if files.is_empty() && !directory.is_empty() {
            operator.stat(&listing_path).await.for_path(BACKEND, path)?;
        }

        self.sink
            .debug(format_args!("Listed {} files in {path}", files.len()));
        Ok(files)
    }

    async fn download_inner(&self, source_path: &str, local_path: &Path) -> Result<()> {
        let (filesystem, item) = self.split_address(source_path, true)?;
        let operator = self.filesystem_operator(filesystem)?;

        let data = operator.read(item).await.for_path(BACKEND, source_path)?;

        if let Some(parent) = local_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context(LocalIoSnafu { path: parent })?;
        }
        let bytes = data.to_vec();
        fs::write(local_path, &bytes)
            .await
            .context(LocalIoSnafu { path: local_path })?;

        self.sink.debug(format_args!(
            "Downloaded file from {source_path} to {} ({})",
            local_path.display(),
            format_size(bytes.len() as u64)
        ));
        Ok(())
    }

    async fn upload_inner(&self, local_path: &Path, dest_path: &str) -> Result<()> {
        let (filesystem, item) = self.split_address(dest_path, true)?;
        let contents = fs::read(local_path)
            .await
            .context(LocalIoSnafu { path: local_path })?;
        let size = contents.len() as u64;

        let operator = self.filesystem_operator(filesystem)?;
        operator
            .write(item, contents)
            .await
            .for_path(BACKEND, dest_path)?;

        self.sink.debug(format_args!(
            "Uploaded file from {} to {dest_path} ({})",
            local_path.display(),
            format_size(size)
        ));
        Ok(())
    }
}

impl StorageBackend for AzureDataLakeBackend {
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

    /// Listings carry item paths inside the filesystem, so the base is the
    /// address without its filesystem segment.
    fn listing_base<'a>(&self, dir: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(split_container(dir).1)
    }
}

impl fmt::Debug for AzureDataLakeBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureDataLakeBackend")
            .field("account_url", &self.account_url)
            .field("account_name", &self.account_name)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

/// `https://myaccount.dfs.core.windows.net` -> `myaccount`
fn account_name_from_url(account_url: &str) -> Option<String> {
    let host = account_url.split_once("://")?.1.split(['/', ':']).next()?;
    let name = host.split('.').next()?;
    (!name.is_empty()).then(|| name.to_string())
}
