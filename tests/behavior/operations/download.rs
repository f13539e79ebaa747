use crate::*;
use filetransfer::error::ErrorKind;
use filetransfer::storage::{NetworkFolderBackend, StorageBackend};
use tokio::fs;

pub fn tests(client: &NetworkFolderBackend, tests: &mut Vec<Trial>) {
    tests.extend(async_trials!(
        client,
        test_download_existing_file_to_new_directory,
        test_download_overwrites_existing_local_file,
        test_download_non_existent_file,
        test_download_large_file,
        test_download_with_special_chars
    ));
}

async fn test_download_existing_file_to_new_directory(client: NetworkFolderBackend) -> TestResult {
    let dir = TEST_FIXTURE.new_dir_name();
    let content = TEST_FIXTURE.new_content(1..64 * 1024);
    write_file(client.root(), &format!("{dir}/data.bin"), &content);
    let local_dir = TEST_FIXTURE.new_root();
    let local_path = local_dir.join("missing/parents/data.bin");

    client
        .download_file(&format!("{dir}/data.bin"), &local_path)
        .await?;

    assert_eq!(fs::read(&local_path).await?, content);
    Ok(())
}

async fn test_download_overwrites_existing_local_file(client: NetworkFolderBackend) -> TestResult {
    let dir = TEST_FIXTURE.new_dir_name();
    write_file(client.root(), &format!("{dir}/fresh.txt"), b"fresh");
    let local_dir = TEST_FIXTURE.new_root();
    let local_path = local_dir.join("fresh.txt");
    fs::write(&local_path, b"stale content that is longer").await?;

    client
        .download_file(&format!("{dir}/fresh.txt"), &local_path)
        .await?;

    assert_eq!(fs::read(&local_path).await?, b"fresh");
    Ok(())
}

async fn test_download_non_existent_file(client: NetworkFolderBackend) -> TestResult {
    let remote_path = format!("{}/absent.txt", TEST_FIXTURE.new_dir_name());
    let local_dir = TEST_FIXTURE.new_root();
    let local_path = local_dir.join("sub/absent.txt");

    let err = client
        .download_file(&remote_path, &local_path)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(is_empty_dir(&local_dir));
    Ok(())
}

async fn test_download_large_file(client: NetworkFolderBackend) -> TestResult {
    let dir = TEST_FIXTURE.new_dir_name();
    let content = vec![0x42; 1024 * 1024 * 16];
    write_file(client.root(), &format!("{dir}/large_file.bin"), &content);
    let local_path = TEST_FIXTURE.new_root().join("large_file.bin");

    client
        .download_file(&format!("{dir}/large_file.bin"), &local_path)
        .await?;

    let actual = fs::read(&local_path).await?;
    assert_eq!(content.len(), actual.len());
    assert_eq!(content, actual);
    Ok(())
}

async fn test_download_with_special_chars(client: NetworkFolderBackend) -> TestResult {
    let dir = TEST_FIXTURE.new_dir_name();
    let name = "special!@#$%^&()_+-=;'file.txt";
    write_file(client.root(), &format!("{dir}/{name}"), b"special");
    let local_path = TEST_FIXTURE.new_root().join(name);

    client
        .download_file(&format!("{dir}/{name}"), &local_path)
        .await?;

    assert_eq!(fs::read(&local_path).await?, b"special");
    Ok(())
}
