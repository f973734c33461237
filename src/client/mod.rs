//! Remote storage capability.
//!
//! The adapter talks to the remote store only through [`RemoteClient`]. A backend
//! implements the raw calls, and [`RemoteClient::resource`] wraps a path into a
//! [`Resource`] handle that lazily fetches its attributes.

pub mod error;
pub mod memory;
mod resource;

pub use resource::{Embedded, Resource, ResourceInfo, ResourceKind};

use std::fmt;
use tokio::io::AsyncRead;

use self::error::Error;

pub type ClientResult<T> = Result<T, Error>;

/// Lazy response body
pub type Body = Box<dyn AsyncRead + Send + Unpin>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
        }
    }
}

/// HTTP request descriptor handed to [`RemoteClient::send`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
}

impl Request {
    pub fn get<T: Into<String>>(url: T) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
        }
    }
}

pub struct Response {
    pub status: u16,
    pub body: Body,
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Raw calls against a hierarchical remote object store. This is `async_trait`
///
/// All paths are absolute remote paths (`/root/dir/file.txt`).
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Fetches the resource document, `None` when nothing exists at the path.
    /// For directories, up to `limit` children are embedded.
    async fn stat(&self, path: &str, limit: Option<usize>) -> ClientResult<Option<ResourceInfo>>;

    /// Creates one directory. The parent must already exist.
    async fn create_dir(&self, path: &str) -> ClientResult<()>;

    /// Removes a file or a directory with all of its contents.
    async fn remove(&self, path: &str, permanently: bool) -> ClientResult<()>;

    /// Uploads the whole source to the path. Returns `false` when the remote
    /// accepted the request but stored nothing.
    async fn upload(
        &self,
        path: &str,
        source: &mut (dyn AsyncRead + Send + Unpin),
        overwrite: bool,
    ) -> ClientResult<bool>;

    /// Resolves a time-limited download link for a file.
    async fn download_link(&self, path: &str) -> ClientResult<String>;

    async fn move_resource(&self, from: &str, to: &str, overwrite: bool) -> ClientResult<()>;

    async fn copy_resource(&self, from: &str, to: &str, overwrite: bool) -> ClientResult<()>;

    /// Publishes or unpublishes a resource.
    async fn set_publish(&self, path: &str, publish: bool) -> ClientResult<()>;

    /// Executes an HTTP request and returns the status and the unread body.
    async fn send(&self, request: Request) -> ClientResult<Response>;

    /// Returns a handle for the path
    fn resource<P: Into<String>>(&self, path: P) -> Resource<'_, Self>
    where
        Self: Sized,
    {
        Resource::new(self, path)
    }
}
