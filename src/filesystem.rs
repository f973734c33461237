//! Uniform storage contract.
//!
//! Any storage backend can implement these traits; callers depend on them rather
//! than on a concrete adapter.

use bytes::Bytes;
use futures::stream::BoxStream;
use tokio::io::AsyncRead;

use crate::{
    attributes::{FileAttributes, StorageAttributes, Visibility},
    client::Body,
    config::Config,
    error::Result,
};

/// Lazy listing of records, fresh for every call
pub type ListContents<'a> = BoxStream<'a, Result<StorageAttributes>>;

/// Lazy byte source returned by [`FilesystemAdapter::read_stream`]
pub type ReadStream = Body;

/// Filesystem operations over adapter-relative paths. This is `async_trait`
#[async_trait]
pub trait FilesystemAdapter: Send + Sync {
    /// `false` when nothing exists at the path or it is not a file.
    async fn file_exists(&self, path: &str) -> Result<bool>;

    /// `false` when nothing exists at the path or it is not a directory.
    async fn directory_exists(&self, path: &str) -> Result<bool>;

    async fn write(&self, path: &str, contents: Bytes, config: &Config) -> Result<()>;

    /// Writes everything the source yields. The source is only read, never closed.
    async fn write_stream(
        &self,
        path: &str,
        contents: &mut (dyn AsyncRead + Send + Unpin),
        config: &Config,
    ) -> Result<()>;

    async fn read(&self, path: &str) -> Result<Bytes>;

    async fn read_stream(&self, path: &str) -> Result<ReadStream>;

    /// Deletes a file. Missing paths and directories are left alone.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Deletes a directory recursively. Missing paths and files are left alone.
    async fn delete_directory(&self, path: &str) -> Result<()>;

    /// Creates the directory and any missing ancestors.
    async fn create_directory(&self, path: &str, config: &Config) -> Result<()>;

    async fn set_visibility(&self, path: &str, visibility: Visibility) -> Result<()>;

    async fn visibility(&self, path: &str) -> Result<FileAttributes>;

    async fn mime_type(&self, path: &str) -> Result<FileAttributes>;

    async fn last_modified(&self, path: &str) -> Result<FileAttributes>;

    async fn file_size(&self, path: &str) -> Result<FileAttributes>;

    /// Lists the entries under `path`, descending into subdirectories when `deep`.
    fn list_contents<'a>(&'a self, path: &str, deep: bool) -> ListContents<'a>;

    async fn move_file(&self, source: &str, destination: &str, config: &Config) -> Result<()>;

    async fn copy_file(&self, source: &str, destination: &str, config: &Config) -> Result<()>;
}

/// Storage able to hand out public URLs. This is `async_trait`
#[async_trait]
pub trait PublicUrlGenerator: Send + Sync {
    async fn public_url(&self, path: &str, config: &Config) -> Result<String>;
}

/// Storage able to report content digests. This is `async_trait`
#[async_trait]
pub trait ChecksumProvider: Send + Sync {
    async fn checksum(&self, path: &str, config: &Config) -> Result<String>;
}
