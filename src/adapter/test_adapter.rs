use bytes::Bytes;
use futures::StreamExt;
use serde_json::json;
use tokio::io::AsyncReadExt;

use super::{ListingPolicy, RemoteFilesystemAdapter};
use crate::{
    attributes::{StorageAttributes, Visibility},
    client::{
        error::Error as ClientError,
        memory::{Faults, MemoryDisk},
    },
    config::{Config, OPTION_CHECKSUM_ALGO, OPTION_RETAIN_VISIBILITY, OPTION_VISIBILITY},
    error::{Error, MetadataKind},
    filesystem::{ChecksumProvider, FilesystemAdapter, ListContents, PublicUrlGenerator},
};

type TestResult = anyhow::Result<()>;

fn adapter() -> RemoteFilesystemAdapter<MemoryDisk> {
    adapter_with(MemoryDisk::new(), "/", &Config::new())
}

fn adapter_with(disk: MemoryDisk, prefix: &str, config: &Config) -> RemoteFilesystemAdapter<MemoryDisk> {
    let _ = env_logger::builder().is_test(true).try_init();
    RemoteFilesystemAdapter::new(disk, prefix, config).unwrap()
}

fn public() -> Config {
    Config::new().with(OPTION_VISIBILITY, "public")
}

async fn put(adapter: &RemoteFilesystemAdapter<MemoryDisk>, path: &str, data: &'static [u8]) {
    adapter
        .write(path, Bytes::from_static(data), &Config::new())
        .await
        .unwrap();
}

async fn visibility_of(adapter: &RemoteFilesystemAdapter<MemoryDisk>, path: &str) -> Visibility {
    adapter
        .visibility(path)
        .await
        .unwrap()
        .visibility()
        .unwrap()
}

async fn mkdir_calls(adapter: &RemoteFilesystemAdapter<MemoryDisk>) -> Vec<String> {
    adapter
        .client()
        .calls()
        .await
        .into_iter()
        .filter(|c| c.starts_with("mkdir"))
        .collect()
}

async fn paths(listing: ListContents<'_>) -> Vec<String> {
    listing
        .map(|entry| entry.unwrap().path().to_owned())
        .collect()
        .await
}

#[tokio::test]
async fn test_write_then_read() -> TestResult {
    let adapter = adapter();

    adapter
        .write("test_write/file.txt", Bytes::from_static(b"test content"), &Config::new())
        .await?;
    assert!(adapter.file_exists("test_write/file.txt").await?);
    assert_eq!(adapter.read("test_write/file.txt").await?, &b"test content"[..]);

    adapter.write("empty.txt", Bytes::new(), &Config::new()).await?;
    assert!(adapter.read("empty.txt").await?.is_empty());
    assert_eq!(adapter.file_size("empty.txt").await?.file_size(), Some(0));

    Ok(())
}

#[tokio::test]
async fn test_write_then_read_large_payload() -> TestResult {
    let adapter = adapter();
    let payload: Bytes = (0..4 * 1024 * 1024).map(|i| (i % 253) as u8).collect();

    adapter
        .write("test_write/big.bin", payload.clone(), &Config::new())
        .await?;

    assert_eq!(adapter.read("test_write/big.bin").await?, payload);
    assert_eq!(
        adapter.file_size("test_write/big.bin").await?.file_size(),
        Some(4 * 1024 * 1024)
    );
    Ok(())
}

#[tokio::test]
async fn test_write_stream_then_read_stream_large_payload() -> TestResult {
    let adapter = adapter();
    let payload: Vec<u8> = (0..3 * 1024 * 1024).map(|i| (i % 251) as u8).collect();

    let mut source: &[u8] = &payload;
    adapter
        .write_stream("test_writeStream/big.bin", &mut source, &Config::new())
        .await?;

    let mut stream = adapter.read_stream("test_writeStream/big.bin").await?;
    let mut streamed = Vec::new();
    let _ = stream.read_to_end(&mut streamed).await?;
    assert_eq!(streamed, payload);

    assert_eq!(adapter.read("test_writeStream/big.bin").await?, payload);
    Ok(())
}

#[tokio::test]
async fn test_write_creates_ancestors_root_to_leaf() -> TestResult {
    let adapter = adapter();

    put(&adapter, "a/b/c/file.txt", b"x").await;
    assert_eq!(
        mkdir_calls(&adapter).await,
        vec!["mkdir /a", "mkdir /a/b", "mkdir /a/b/c"]
    );

    adapter.client().clear_calls().await;
    put(&adapter, "a/b/c/other.txt", b"y").await;
    assert!(mkdir_calls(&adapter).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_write_failure_keeps_created_prefix() -> TestResult {
    let adapter = adapter();
    adapter.create_directory("a", &Config::new()).await?;
    adapter.client().set_faults(Faults::CREATE_DIR).await;

    let result = adapter
        .write("a/b/c/file.txt", Bytes::from_static(b"x"), &Config::new())
        .await;
    assert!(matches!(
        result,
        Err(Error::WriteFailed { ref path, source: ClientError::UnexpectedStatus(503) })
            if path == "a/b/c/file.txt"
    ));

    adapter.client().set_faults(Faults::empty()).await;
    assert!(adapter.directory_exists("a").await?);
    assert!(!adapter.directory_exists("a/b").await?);

    adapter.client().set_faults(Faults::UPLOAD).await;
    let result = adapter
        .write("d/e/file.txt", Bytes::from_static(b"x"), &Config::new())
        .await;
    assert!(matches!(result, Err(Error::WriteFailed { .. })));
    assert!(adapter.client().exists("/d/e").await);
    Ok(())
}

#[tokio::test]
async fn test_visibility_default_and_override() -> TestResult {
    let adapter = adapter();

    put(&adapter, "test_visibility/file.txt", b"x").await;
    assert_eq!(visibility_of(&adapter, "test_visibility/file.txt").await, Visibility::Private);

    adapter
        .set_visibility("test_visibility/file.txt", Visibility::Public)
        .await?;
    assert_eq!(visibility_of(&adapter, "test_visibility/file.txt").await, Visibility::Public);

    adapter
        .set_visibility("test_visibility/file.txt", Visibility::Private)
        .await?;
    assert_eq!(visibility_of(&adapter, "test_visibility/file.txt").await, Visibility::Private);

    adapter.write("public.txt", Bytes::from_static(b"x"), &public()).await?;
    assert_eq!(visibility_of(&adapter, "public.txt").await, Visibility::Public);

    let public_by_default = adapter_with(MemoryDisk::new(), "/", &public());
    put(&public_by_default, "file.txt", b"x").await;
    assert_eq!(visibility_of(&public_by_default, "file.txt").await, Visibility::Public);

    let private = Config::new().with(OPTION_VISIBILITY, "private");
    public_by_default
        .write("private.txt", Bytes::from_static(b"x"), &private)
        .await?;
    assert_eq!(visibility_of(&public_by_default, "private.txt").await, Visibility::Private);
    Ok(())
}

#[tokio::test]
async fn test_write_rejects_invalid_visibility_before_remote_calls() {
    let adapter = adapter();
    let config = Config::new().with(OPTION_VISIBILITY, "shared");

    let result = adapter
        .write("dir/file.txt", Bytes::from_static(b"x"), &config)
        .await;

    assert!(matches!(result, Err(Error::InvalidVisibility { value }) if value == "shared"));
    assert!(adapter.client().calls().await.is_empty());
}

#[tokio::test]
async fn test_upload_then_publish_is_not_atomic() -> TestResult {
    let adapter = adapter();
    adapter.client().set_faults(Faults::PUBLISH).await;

    let result = adapter
        .write("file.txt", Bytes::from_static(b"x"), &public())
        .await;
    assert!(matches!(result, Err(Error::VisibilityUnavailable { .. })));

    adapter.client().set_faults(Faults::empty()).await;
    assert!(adapter.file_exists("file.txt").await?);
    assert_eq!(visibility_of(&adapter, "file.txt").await, Visibility::Private);
    Ok(())
}

#[tokio::test]
async fn test_discarded_upload_skips_publish() -> TestResult {
    let adapter = adapter();
    adapter.client().set_faults(Faults::DISCARD_UPLOAD).await;

    adapter
        .write("file.txt", Bytes::from_static(b"x"), &public())
        .await?;

    let calls = adapter.client().calls().await;
    assert!(!calls.iter().any(|c| c.starts_with("publish")));
    assert!(!adapter.client().exists("/file.txt").await);
    Ok(())
}

#[tokio::test]
async fn test_read_failures() -> TestResult {
    let adapter = adapter();

    assert!(matches!(
        adapter.read("missing.txt").await,
        Err(Error::ReadFailed { source: ClientError::NotFound(_), .. })
    ));

    put(&adapter, "file.txt", b"x").await;
    adapter.client().set_faults(Faults::DOWNLOAD).await;
    assert!(matches!(
        adapter.read("file.txt").await,
        Err(Error::ReadFailed { source: ClientError::UnexpectedStatus(503), .. })
    ));
    assert!(matches!(
        adapter.read_stream("file.txt").await,
        Err(Error::ReadFailed { source: ClientError::UnexpectedStatus(503), .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_exists() -> TestResult {
    let adapter = adapter();
    put(&adapter, "dir/file.txt", b"x").await;

    assert!(adapter.file_exists("dir/file.txt").await?);
    assert!(!adapter.directory_exists("dir/file.txt").await?);
    assert!(adapter.directory_exists("dir").await?);
    assert!(!adapter.file_exists("dir").await?);
    assert!(!adapter.file_exists("nothing").await?);
    assert!(!adapter.directory_exists("nothing").await?);

    adapter.client().set_faults(Faults::STAT).await;
    assert!(matches!(
        adapter.file_exists("dir/file.txt").await,
        Err(Error::MetadataUnavailable { kind: MetadataKind::Existence, .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_delete_is_idempotent() -> TestResult {
    let adapter = adapter();
    put(&adapter, "test_delete/delete.zip", b"x").await;
    adapter.client().clear_calls().await;

    adapter.delete("missing.txt").await?;
    adapter.delete("test_delete").await?;
    adapter.delete_directory("test_delete/delete.zip").await?;
    adapter.delete_directory("missing").await?;

    let calls = adapter.client().calls().await;
    assert!(!calls.iter().any(|c| c.starts_with("remove")));
    assert!(adapter.file_exists("test_delete/delete.zip").await?);

    adapter.delete("test_delete/delete.zip").await?;
    assert!(!adapter.file_exists("test_delete/delete.zip").await?);
    assert!(adapter.directory_exists("test_delete").await?);
    Ok(())
}

#[tokio::test]
async fn test_delete_directory_is_recursive() -> TestResult {
    let adapter = adapter();
    adapter
        .create_directory("test_directories/subDirectory", &Config::new())
        .await?;
    put(&adapter, "test_directories/subDirectory/file.txt", b"x").await;

    adapter.delete_directory("test_directories").await?;
    assert!(!adapter.directory_exists("test_directories").await?);
    assert!(!adapter.client().exists("/test_directories/subDirectory/file.txt").await);

    put(&adapter, "other/file.txt", b"x").await;
    adapter.client().set_faults(Faults::REMOVE).await;
    assert!(matches!(
        adapter.delete_directory("other").await,
        Err(Error::DeleteFailed { ref path, .. }) if path == "other"
    ));
    assert!(matches!(
        adapter.delete("other/file.txt").await,
        Err(Error::DeleteFailed { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_create_directory_is_idempotent() -> TestResult {
    let adapter = adapter();

    adapter.create_directory("a/b", &Config::new()).await?;
    adapter.client().clear_calls().await;
    adapter.create_directory("./a//b/", &Config::new()).await?;

    assert!(mkdir_calls(&adapter).await.is_empty());
    assert!(adapter.directory_exists("a/b").await?);

    adapter.client().set_faults(Faults::CREATE_DIR).await;
    assert!(matches!(
        adapter.create_directory("a/b/c", &Config::new()).await,
        Err(Error::DirectoryCreateFailed { ref path, .. }) if path == "a/b/c"
    ));
    Ok(())
}

#[tokio::test]
async fn test_metadata() -> TestResult {
    let adapter = adapter();
    put(&adapter, "test_metadata/file.txt", b"12345").await;

    let file = adapter.mime_type("test_metadata/file.txt").await?;
    assert_eq!(file.path(), "test_metadata/file.txt");
    assert_eq!(file.mime_type(), Some("text/plain"));
    assert_eq!(file.file_size(), Some(5));
    assert_eq!(file.visibility(), Some(Visibility::Private));
    assert!(file.last_modified().is_some_and(|t| t > 1_600_000_000));

    let resource_id = file.extra_metadata()["resource_id"].clone();
    for other in [
        adapter.last_modified("test_metadata/file.txt").await?,
        adapter.file_size("test_metadata/file.txt").await?,
        adapter.visibility("test_metadata/file.txt").await?,
    ] {
        assert_eq!(other.extra_metadata()["resource_id"], resource_id);
    }

    let dir = adapter.metadata("test_metadata").await?;
    assert!(dir.is_dir());
    assert_eq!(dir.extra_metadata()["type"], json!("dir"));
    Ok(())
}

#[tokio::test]
async fn test_metadata_failures() {
    let adapter = adapter();
    adapter
        .create_directory("dir", &Config::new())
        .await
        .unwrap();
    put(&adapter, "README", b"no extension").await;

    assert!(matches!(
        adapter.metadata("missing").await,
        Err(Error::MetadataUnavailable { kind: MetadataKind::Metadata, source: None, .. })
    ));
    assert!(matches!(
        adapter.file_size("dir").await,
        Err(Error::MetadataUnavailable { kind: MetadataKind::FileSize, ref reason, .. })
            if reason == "Is not a file"
    ));
    assert!(matches!(
        adapter.last_modified("dir").await,
        Err(Error::MetadataUnavailable { kind: MetadataKind::LastModified, .. })
    ));
    assert!(matches!(
        adapter.visibility("dir").await,
        Err(Error::MetadataUnavailable { kind: MetadataKind::Visibility, .. })
    ));
    assert!(matches!(
        adapter.mime_type("README").await,
        Err(Error::MetadataUnavailable { kind: MetadataKind::MimeType, ref reason, .. })
            if reason == "Unknown MIME type"
    ));

    adapter.client().set_faults(Faults::STAT).await;
    assert!(matches!(
        adapter.metadata("dir").await,
        Err(Error::MetadataUnavailable { source: Some(ClientError::UnexpectedStatus(503)), .. })
    ));
}

#[tokio::test]
async fn test_set_visibility_requires_existing_resource() -> TestResult {
    let adapter = adapter();

    assert!(matches!(
        adapter.set_visibility("missing.txt", Visibility::Public).await,
        Err(Error::VisibilityUnavailable { source: None, .. })
    ));

    adapter.create_directory("dir", &Config::new()).await?;
    adapter.set_visibility("dir", Visibility::Public).await?;
    assert_eq!(
        adapter.metadata("dir").await?.visibility(),
        Some(Visibility::Public)
    );
    Ok(())
}

#[tokio::test]
async fn test_public_url_publishes_private_file() -> TestResult {
    let adapter = adapter();
    put(&adapter, "test_publicUrl/file_1.txt", b"1").await;
    put(&adapter, "test_publicUrl/file_2.txt", b"2").await;

    let url = adapter
        .public_url("test_publicUrl/file_1.txt", &Config::new())
        .await?;
    assert!(url.starts_with("https://"));
    assert_eq!(visibility_of(&adapter, "test_publicUrl/file_1.txt").await, Visibility::Public);

    adapter
        .set_visibility("test_publicUrl/file_2.txt", Visibility::Public)
        .await?;
    adapter.client().clear_calls().await;
    let url = adapter
        .public_url("test_publicUrl/file_2.txt", &Config::new())
        .await?;
    assert!(url.starts_with("https://"));
    assert!(!adapter
        .client()
        .calls()
        .await
        .iter()
        .any(|c| c.starts_with("publish")));

    assert!(matches!(
        adapter.public_url("missing.txt", &Config::new()).await,
        Err(Error::PublicUrlUnavailable { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_direct_url() -> TestResult {
    let adapter = adapter();
    put(&adapter, "test_getUrl/file.txt", b"x").await;

    let link = adapter.direct_url("test_getUrl/file.txt").await?;
    assert!(link.starts_with("memory://"));

    assert!(matches!(
        adapter.direct_url("test_getUrl").await,
        Err(Error::ReadFailed { source: ClientError::NotFound(_), .. })
    ));
    assert!(matches!(
        adapter.direct_url("file-not-found.foo").await,
        Err(Error::ReadFailed { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_checksum() -> TestResult {
    let adapter = adapter();
    put(&adapter, "hello.txt", b"hello world").await;

    assert_eq!(
        adapter.checksum("hello.txt", &Config::new()).await?,
        "5eb63bbbe01eeed093cb22bb8f5acdc3"
    );
    assert_eq!(
        adapter
            .checksum("hello.txt", &Config::new().with(OPTION_CHECKSUM_ALGO, "sha256"))
            .await?,
        "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
    );

    let sha_by_default = adapter_with(
        MemoryDisk::new(),
        "/",
        &Config::new().with(OPTION_CHECKSUM_ALGO, "sha256"),
    );
    put(&sha_by_default, "hello.txt", b"hello world").await;
    assert_eq!(
        sha_by_default.checksum("hello.txt", &Config::new()).await?.len(),
        64
    );
    Ok(())
}

#[tokio::test]
async fn test_checksum_unsupported_algorithm_makes_no_remote_call() {
    let adapter = adapter();
    put(&adapter, "hello.txt", b"hello world").await;
    adapter.client().clear_calls().await;

    let result = adapter
        .checksum("hello.txt", &Config::new().with(OPTION_CHECKSUM_ALGO, "crc32"))
        .await;

    assert!(matches!(
        result,
        Err(Error::UnsupportedChecksumAlgorithm { algorithm }) if algorithm == "crc32"
    ));
    assert!(adapter.client().calls().await.is_empty());
}

#[tokio::test]
async fn test_checksum_unavailable() {
    let adapter = adapter_with(MemoryDisk::new().without_digests(), "/", &Config::new());
    put(&adapter, "hello.txt", b"hello world").await;

    assert!(matches!(
        adapter.checksum("hello.txt", &Config::new()).await,
        Err(Error::ChecksumUnavailable { source: None, .. })
    ));
    assert!(matches!(
        adapter.checksum("missing.txt", &Config::new()).await,
        Err(Error::ChecksumUnavailable { .. })
    ));
}

#[tokio::test]
async fn test_list_contents_depth() -> TestResult {
    let adapter = adapter();
    adapter
        .create_directory("test_listContent/subDirectory", &Config::new())
        .await?;
    put(&adapter, "test_listContent/file.txt", b"x").await;

    let entries: Vec<StorageAttributes> = adapter
        .list_contents("/test_listContent", true)
        .map(|entry| entry.unwrap())
        .collect()
        .await;

    assert_eq!(entries.len(), 2);
    let file = entries.iter().find(|e| e.is_file()).unwrap();
    let dir = entries.iter().find(|e| e.is_dir()).unwrap();
    assert_eq!(file.path(), "test_listContent/file.txt");
    assert_eq!(dir.path(), "test_listContent/subDirectory");
    Ok(())
}

#[tokio::test]
async fn test_list_contents_is_depth_first() -> TestResult {
    let adapter = adapter();
    put(&adapter, "d/a/x.txt", b"x").await;
    put(&adapter, "d/a/y/z.txt", b"z").await;
    put(&adapter, "d/b.txt", b"b").await;

    assert_eq!(
        paths(adapter.list_contents("d", true)).await,
        vec!["d/a", "d/a/x.txt", "d/a/y", "d/a/y/z.txt", "d/b.txt"]
    );
    assert_eq!(paths(adapter.list_contents("d", false)).await, vec!["d/a", "d/b.txt"]);
    assert_eq!(
        paths(adapter.list_contents("", false)).await,
        vec!["d"]
    );

    // Every call starts a fresh walk
    assert_eq!(paths(adapter.list_contents("d", true)).await.len(), 5);
    Ok(())
}

#[tokio::test]
async fn test_list_contents_of_drive_root_is_finite() -> TestResult {
    let adapter = adapter();
    put(&adapter, "f.txt", b"f").await;
    put(&adapter, "d/inner.txt", b"inner").await;
    adapter.create_directory("d/empty", &Config::new()).await?;

    let entries: Vec<StorageAttributes> = adapter
        .list_contents("", true)
        .take(10)
        .map(|entry| entry.unwrap())
        .collect()
        .await;

    let listed: Vec<(&str, bool)> = entries.iter().map(|e| (e.path(), e.is_dir())).collect();
    assert_eq!(
        listed,
        vec![
            ("d", true),
            ("d/empty", true),
            ("d/inner.txt", false),
            ("f.txt", false),
        ]
    );

    assert_eq!(paths(adapter.list_contents("/", false)).await, vec!["d", "f.txt"]);
    Ok(())
}

#[tokio::test]
async fn test_list_contents_of_missing_root_is_empty() {
    let adapter = adapter();
    put(&adapter, "file.txt", b"x").await;

    assert!(paths(adapter.list_contents("missing", true)).await.is_empty());
    assert!(paths(adapter.list_contents("file.txt", true)).await.is_empty());

    adapter.client().set_faults(Faults::STAT).await;
    assert!(paths(adapter.list_contents("", true)).await.is_empty());

    let strict: Vec<_> = adapter
        .list_contents_with("", true, ListingPolicy::Strict)
        .collect()
        .await;
    assert_eq!(strict.len(), 1);
    assert!(matches!(strict[0], Err(Error::MetadataUnavailable { .. })));
}

#[tokio::test]
async fn test_list_contents_stops_at_error() -> TestResult {
    for policy in [ListingPolicy::BestEffort, ListingPolicy::Strict] {
        let adapter = adapter();
        put(&adapter, "d/a.txt", b"a").await;
        put(&adapter, "d/b/inner.txt", b"inner").await;
        put(&adapter, "d/c.txt", b"c").await;

        let mut listing = adapter.list_contents_with("d", true, policy);
        assert_eq!(listing.next().await.unwrap()?.path(), "d/a.txt");

        adapter.client().set_faults(Faults::STAT).await;
        assert_eq!(listing.next().await.unwrap()?.path(), "d/b");

        let rest: Vec<_> = listing.collect().await;
        match policy {
            ListingPolicy::BestEffort => assert!(rest.is_empty()),
            ListingPolicy::Strict => {
                assert_eq!(rest.len(), 1);
                assert!(matches!(
                    rest[0],
                    Err(Error::MetadataUnavailable { ref path, .. }) if path == "d/b"
                ));
            }
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_move_preserves_content() -> TestResult {
    let adapter = adapter();
    put(&adapter, "test_move/source.txt", b"moved content").await;

    adapter
        .move_file("test_move/source.txt", "elsewhere/deep/destination.txt", &Config::new())
        .await?;

    assert!(!adapter.file_exists("test_move/source.txt").await?);
    assert_eq!(
        adapter.read("elsewhere/deep/destination.txt").await?,
        &b"moved content"[..]
    );
    Ok(())
}

#[tokio::test]
async fn test_copy_preserves_content() -> TestResult {
    let adapter = adapter();
    put(&adapter, "test_copy/source.txt", b"copied content").await;

    adapter
        .copy_file("test_copy/source.txt", "test_copy/destination.txt", &Config::new())
        .await?;

    assert!(adapter.file_exists("test_copy/source.txt").await?);
    assert_eq!(
        adapter.read("test_copy/destination.txt").await?,
        &b"copied content"[..]
    );
    Ok(())
}

#[tokio::test]
async fn test_move_missing_source_creates_nothing() -> TestResult {
    let adapter = adapter();

    let result = adapter
        .move_file("missing.txt", "new/dir/destination.txt", &Config::new())
        .await;
    assert!(matches!(
        result,
        Err(Error::SourceNotFound { ref from, ref to })
            if from == "missing.txt" && to == "new/dir/destination.txt"
    ));
    assert!(mkdir_calls(&adapter).await.is_empty());
    assert!(!adapter.directory_exists("new").await?);

    assert!(matches!(
        adapter.copy_file("missing.txt", "x.txt", &Config::new()).await,
        Err(Error::SourceNotFound { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_transfer_failures_carry_both_paths() {
    let adapter = adapter();
    put(&adapter, "a.txt", b"a").await;
    adapter.client().set_faults(Faults::MOVE | Faults::COPY).await;

    assert!(matches!(
        adapter.move_file("a.txt", "b.txt", &Config::new()).await,
        Err(Error::MoveFailed { ref from, ref to, .. }) if from == "a.txt" && to == "b.txt"
    ));
    assert!(matches!(
        adapter.copy_file("a.txt", "c.txt", &Config::new()).await,
        Err(Error::CopyFailed { ref from, ref to, .. }) if from == "a.txt" && to == "c.txt"
    ));
}

#[tokio::test]
async fn test_copy_retains_public_visibility() -> TestResult {
    let adapter = adapter();
    adapter.write("public.txt", Bytes::from_static(b"p"), &public()).await?;
    put(&adapter, "private.txt", b"p").await;

    adapter.copy_file("public.txt", "kept.txt", &Config::new()).await?;
    assert_eq!(visibility_of(&adapter, "kept.txt").await, Visibility::Public);

    adapter.copy_file("private.txt", "still.txt", &Config::new()).await?;
    assert_eq!(visibility_of(&adapter, "still.txt").await, Visibility::Private);

    let no_retain = Config::new().with(OPTION_RETAIN_VISIBILITY, false);
    adapter.copy_file("public.txt", "dropped.txt", &no_retain).await?;
    assert_eq!(visibility_of(&adapter, "dropped.txt").await, Visibility::Private);

    adapter.copy_file("private.txt", "forced.txt", &public()).await?;
    assert_eq!(visibility_of(&adapter, "forced.txt").await, Visibility::Public);
    Ok(())
}

#[tokio::test]
async fn test_private_destination_is_not_reasserted() -> TestResult {
    let adapter = adapter();
    adapter.write("public.txt", Bytes::from_static(b"p"), &public()).await?;
    adapter.client().clear_calls().await;

    let private = Config::new().with(OPTION_VISIBILITY, "private");
    adapter.move_file("public.txt", "moved.txt", &private).await?;

    let calls = adapter.client().calls().await;
    assert!(!calls.iter().any(|c| c.starts_with("unpublish")));
    assert_eq!(visibility_of(&adapter, "moved.txt").await, Visibility::Public);
    Ok(())
}

#[tokio::test]
async fn test_prefix_is_applied_and_stripped() -> TestResult {
    let adapter = adapter_with(MemoryDisk::new(), "/app/storage", &Config::new());
    put(&adapter, "dir/file.txt", b"x").await;

    assert!(adapter.client().exists("/app/storage/dir/file.txt").await);
    assert!(!adapter.client().exists("/dir").await);
    assert_eq!(
        paths(adapter.list_contents("", true)).await,
        vec!["dir", "dir/file.txt"]
    );
    assert_eq!(adapter.metadata("dir/file.txt").await?.path(), "dir/file.txt");
    Ok(())
}

#[tokio::test]
async fn test_from_config() -> TestResult {
    let config: Config = serde_json::from_value(json!({
        "driver": "cloud-drive",
        "token": "secret",
        "prefix": "/site",
        "visibility": "public",
        "checksum_algo": "sha256",
    }))?;

    let adapter = RemoteFilesystemAdapter::from_config(MemoryDisk::new(), &config)?;
    assert_eq!(adapter.prefixer().prefix(), "/site/");
    assert_eq!(adapter.options().visibility, Visibility::Public);

    put(&adapter, "file.txt", b"x").await;
    assert!(adapter.client().exists("/site/file.txt").await);
    assert_eq!(visibility_of(&adapter, "file.txt").await, Visibility::Public);

    let bad = Config::new().with(OPTION_CHECKSUM_ALGO, "crc32");
    assert!(matches!(
        RemoteFilesystemAdapter::from_config(MemoryDisk::new(), &bad),
        Err(Error::UnsupportedChecksumAlgorithm { .. })
    ));
    Ok(())
}
