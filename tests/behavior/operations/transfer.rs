use crate::*;
use filetransfer::error::{Error, ErrorKind, Result};
use filetransfer::storage::{BackendType, NetworkFolderBackend, StorageBackend};
use filetransfer::transfer::TransferManager;
use std::path::Path;
use std::sync::Mutex;
use tokio::fs;

pub fn tests(client: &NetworkFolderBackend, tests: &mut Vec<Trial>) {
    tests.extend(async_trials!(
        client,
        test_transfer_file_end_to_end,
        test_transfer_file_missing_source,
        test_transfer_files_batch,
        test_transfer_files_dot_relative_source_dir,
        test_transfer_files_aborts_on_first_failure,
        test_transfer_files_missing_source_dir,
        test_transfer_file_overwrites_destination
    ));
}

/// Source backend that fails downloads of one file name with a local I/O
/// error and records every download attempt.
struct FailingBackend {
    inner: NetworkFolderBackend,
    fail_on: &'static str,
    attempts: Mutex<Vec<String>>,
}

impl FailingBackend {
    fn new(inner: NetworkFolderBackend, fail_on: &'static str) -> Self {
        Self {
            inner,
            fail_on,
            attempts: Mutex::new(Vec::new()),
        }
    }

    fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

impl StorageBackend for FailingBackend {
    fn backend_type(&self) -> BackendType {
        self.inner.backend_type()
    }

    async fn list_files(&self, path: &str) -> Result<Vec<String>> {
        self.inner.list_files(path).await
    }

    async fn download_file(&self, source_path: &str, local_path: &Path) -> Result<()> {
        self.attempts.lock().unwrap().push(source_path.to_string());
        if source_path.ends_with(self.fail_on) {
            return Err(Error::LocalIo {
                path: local_path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }
        self.inner.download_file(source_path, local_path).await
    }

    async fn upload_file(&self, local_path: &Path, dest_path: &str) -> Result<()> {
        self.inner.upload_file(local_path, dest_path).await
    }
}

async fn network_pair() -> Result<(NetworkFolderBackend, NetworkFolderBackend, std::path::PathBuf)> {
    let source = NetworkFolderBackend::new(TEST_FIXTURE.new_root()).await?;
    let dest = NetworkFolderBackend::new(TEST_FIXTURE.new_root()).await?;
    Ok((source, dest, TEST_FIXTURE.new_root()))
}

async fn test_transfer_file_end_to_end(_client: NetworkFolderBackend) -> TestResult {
    let (source, dest, staging) = network_pair().await?;
    write_file(source.root(), "a/b.txt", b"hello");
    let dest_root = dest.root().to_path_buf();
    let manager = TransferManager::new(source, dest).staging_root(&staging);

    let report = manager.transfer_file("a/b.txt", "c/b.txt").await?;

    assert_eq!(report.bytes, 5);
    assert_eq!(fs::read(dest_root.join("c/b.txt")).await?, b"hello");
    assert!(is_empty_dir(&staging));
    Ok(())
}

async fn test_transfer_file_missing_source(_client: NetworkFolderBackend) -> TestResult {
    let (source, dest, staging) = network_pair().await?;
    let dest_root = dest.root().to_path_buf();
    let manager = TransferManager::new(source, dest).staging_root(&staging);

    let err = manager
        .transfer_file("nope/missing.txt", "c/missing.txt")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(is_empty_dir(&staging));
    assert!(is_empty_dir(&dest_root));
    Ok(())
}

async fn test_transfer_files_batch(_client: NetworkFolderBackend) -> TestResult {
    let (source, dest, staging) = network_pair().await?;
    let x = TEST_FIXTURE.new_content(1..4096);
    let y = TEST_FIXTURE.new_content(1..4096);
    write_file(source.root(), "dir/x.txt", &x);
    write_file(source.root(), "dir/y.txt", &y);
    write_file(source.root(), "other/ignored.txt", b"not part of dir");
    let dest_root = dest.root().to_path_buf();
    let manager = TransferManager::new(source, dest).staging_root(&staging);

    let reports = manager.transfer_files("dir", "out").await?;

    assert_eq!(reports.len(), 2);
    assert_eq!(fs::read(dest_root.join("out/x.txt")).await?, x);
    assert_eq!(fs::read(dest_root.join("out/y.txt")).await?, y);
    assert!(!dest_root.join("out/ignored.txt").exists());
    assert!(!dest_root.join("out/dir").exists());
    assert!(is_empty_dir(&staging));
    Ok(())
}

async fn test_transfer_files_dot_relative_source_dir(_client: NetworkFolderBackend) -> TestResult {
    let (source, dest, staging) = network_pair().await?;
    write_file(source.root(), "dir/x.txt", b"x");
    write_file(source.root(), "dir/nested/w.txt", b"w");
    let dest_root = dest.root().to_path_buf();
    let manager = TransferManager::new(source, dest).staging_root(&staging);

    let reports = manager.transfer_files("./dir", "out").await?;

    assert_eq!(reports.len(), 2);
    assert_eq!(fs::read(dest_root.join("out/x.txt")).await?, b"x");
    assert_eq!(fs::read(dest_root.join("out/nested/w.txt")).await?, b"w");
    assert!(!dest_root.join("out/dir").exists());
    Ok(())
}

async fn test_transfer_files_aborts_on_first_failure(_client: NetworkFolderBackend) -> TestResult {
    let (source, dest, staging) = network_pair().await?;
    write_file(source.root(), "dir/x.txt", b"x");
    write_file(source.root(), "dir/y.txt", b"y");
    write_file(source.root(), "dir/z.txt", b"z");
    let dest_root = dest.root().to_path_buf();
    let manager =
        TransferManager::new(FailingBackend::new(source, "y.txt"), dest).staging_root(&staging);

    let err = manager.transfer_files("dir", "out").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::LocalIo);
    assert_eq!(fs::read(dest_root.join("out/x.txt")).await?, b"x");
    assert!(!dest_root.join("out/y.txt").exists());
    assert!(!dest_root.join("out/z.txt").exists());
    assert_eq!(
        manager.source().attempts(),
        vec!["dir/x.txt".to_string(), "dir/y.txt".to_string()]
    );
    assert!(is_empty_dir(&staging));
    Ok(())
}

async fn test_transfer_files_missing_source_dir(_client: NetworkFolderBackend) -> TestResult {
    let (source, dest, staging) = network_pair().await?;
    let dest_root = dest.root().to_path_buf();
    let manager = TransferManager::new(source, dest).staging_root(&staging);

    let err = manager.transfer_files("absent", "out").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(is_empty_dir(&dest_root));
    Ok(())
}

async fn test_transfer_file_overwrites_destination(_client: NetworkFolderBackend) -> TestResult {
    let (source, dest, staging) = network_pair().await?;
    write_file(source.root(), "report.csv", b"v2");
    write_file(dest.root(), "archive/report.csv", b"version one");
    let dest_root = dest.root().to_path_buf();
    let manager = TransferManager::new(source, dest).staging_root(&staging);

    manager.transfer_file("report.csv", "archive/report.csv").await?;

    assert_eq!(fs::read(dest_root.join("archive/report.csv")).await?, b"v2");
    Ok(())
}
