//! Filesystem adapter over a [`RemoteClient`].
//!
//! Every operation prefixes the path, builds a fresh [`Resource`] handle, issues
//! a few sequential remote calls and maps the outcome onto the storage contract.
//! Nothing is cached between calls and nothing is retried.
//!
//! # Intermediate states
//!
//! The remote offers no compound operations, so an upload followed by a publish,
//! and a move or copy followed by a publish, are independent round trips. If the
//! second call fails (or the process stops in between) the object exists but is
//! still private. Callers needing a stronger guarantee should verify the
//! visibility afterwards.

mod list;
#[cfg(test)]
mod test_adapter;

pub use list::ListingPolicy;

use bytes::Bytes;
use std::io::Cursor;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{
    attributes::{DirectoryAttributes, FileAttributes, StorageAttributes, Visibility},
    client::{
        error::Error as ClientError, ClientResult, RemoteClient, Request, Resource, ResourceInfo,
    },
    config::{ChecksumAlgorithm, Config, Options, OPTION_DRIVER, OPTION_PREFIX, OPTION_TOKEN},
    error::{Error, MetadataKind, Result},
    filesystem::{
        ChecksumProvider, FilesystemAdapter, ListContents, PublicUrlGenerator, ReadStream,
    },
    path::{self, PathPrefixer},
    utils,
};

/// Page size used when fetching the children of a directory. Listings never
/// paginate past it.
pub const LIST_PAGE_LIMIT: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transfer {
    Move,
    Copy,
}

/// Exposes a remote hierarchical store through the [`FilesystemAdapter`] contract.
pub struct RemoteFilesystemAdapter<C> {
    client: C,
    prefixer: PathPrefixer,
    options: Options,
}

impl<C> RemoteFilesystemAdapter<C>
where
    C: RemoteClient,
{
    /// Creates an adapter rooted at `prefix`, reading its defaults from `config`.
    pub fn new(client: C, prefix: &str, config: &Config) -> Result<Self> {
        Ok(Self::with_options(
            client,
            prefix,
            Options::from_config(config)?,
        ))
    }

    pub fn with_options(client: C, prefix: &str, options: Options) -> Self {
        Self {
            client,
            prefixer: PathPrefixer::new(prefix),
            options,
        }
    }

    /// Builds an adapter from a disk configuration map such as
    /// `{"driver": .., "token": .., "prefix": "/app", "visibility": "public"}`.
    /// The hosting keys are ignored, everything else becomes the adapter defaults.
    pub fn from_config(client: C, config: &Config) -> Result<Self> {
        let prefix = config.prefix()?.unwrap_or("/");
        let options = config.without_settings(&[OPTION_DRIVER, OPTION_TOKEN, OPTION_PREFIX]);
        Self::new(client, prefix, &options)
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn prefixer(&self) -> &PathPrefixer {
        &self.prefixer
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    fn resource(&self, path: &str) -> Resource<'_, C> {
        self.client.resource(self.prefixer.prefix_path(path))
    }

    /// Creates every missing directory of an absolute path, root to leaf.
    /// A failure leaves the already created ancestors in place.
    async fn create_path_recursive(&self, absolute: &str) -> ClientResult<()> {
        let mut current = String::new();

        for segment in absolute.split('/').filter(|s| !s.is_empty() && *s != ".") {
            current.push('/');
            current.push_str(segment);

            let dir = self.client.resource(current.as_str());
            if !dir.has().await? {
                debug!("creating directory {}", current);
                dir.create().await?;
            }
        }

        Ok(())
    }

    async fn create_parent_directories(&self, path: &str) -> ClientResult<()> {
        self.create_path_recursive(&self.prefixer.prefix_path(&path::dirname(path)))
            .await
    }

    async fn upload(
        &self,
        path: &str,
        contents: &mut (dyn AsyncRead + Send + Unpin),
        config: &Config,
    ) -> Result<()> {
        let visibility = self.options.visibility(config)?;

        let uploaded = async {
            self.create_parent_directories(path).await?;
            debug!("uploading {}", path);
            self.resource(path).upload(contents, true).await
        }
        .await
        .map_err(|source| Error::WriteFailed {
            path: path.to_owned(),
            source,
        })?;

        if !uploaded {
            warn!("remote stored nothing for {}", path);
            return Ok(());
        }

        // Separate round trip: the file stays private if this fails.
        if visibility == Visibility::Public {
            self.set_visibility(path, Visibility::Public).await?;
        }

        Ok(())
    }

    async fn download(&self, path: &str) -> ClientResult<ReadStream> {
        let link = self.resource(path).link().await?;
        debug!("downloading {}", path);

        let response = self.client.send(Request::get(link)).await?;
        if response.status != 200 {
            return Err(ClientError::UnexpectedStatus(response.status));
        }

        Ok(response.body)
    }

    async fn metadata_as(&self, path: &str, kind: MetadataKind) -> Result<StorageAttributes> {
        let info = self
            .resource(path)
            .into_info()
            .await
            .map_err(|e| Error::metadata(path, kind, e))?
            .ok_or_else(|| Error::metadata_reason(path, kind, "Resource does not exist"))?;

        attributes(path::normalize(path), info).map_err(|e| Error::metadata(path, kind, e))
    }

    async fn file_metadata(&self, path: &str, kind: MetadataKind) -> Result<FileAttributes> {
        self.metadata_as(path, kind)
            .await?
            .into_file()
            .ok_or_else(|| Error::metadata_reason(path, kind, "Is not a file"))
    }

    /// Fetches the attributes of whatever exists at the path.
    pub async fn metadata(&self, path: &str) -> Result<StorageAttributes> {
        self.metadata_as(path, MetadataKind::Metadata).await
    }

    /// Returns an authenticated, possibly short-lived download link for a file.
    pub async fn direct_url(&self, path: &str) -> Result<String> {
        let resource = self.resource(path);

        async {
            if !resource.is_file().await? {
                return Err(ClientError::NotFound(resource.path().to_owned()));
            }
            resource.link().await
        }
        .await
        .map_err(|source| Error::ReadFailed {
            path: path.to_owned(),
            source,
        })
    }

    /// Lists like [`FilesystemAdapter::list_contents`] with an explicit error policy.
    pub fn list_contents_with(
        &self,
        path: &str,
        deep: bool,
        policy: ListingPolicy,
    ) -> ListContents<'_> {
        list::walk(self, path, deep, policy)
    }

    async fn transfer(
        &self,
        transfer: Transfer,
        from: &str,
        to: &str,
        config: &Config,
    ) -> Result<()> {
        let requested = config.visibility()?;
        let retain = self.options.retain_visibility(config)?;

        let wrap = |source| match transfer {
            Transfer::Move => Error::MoveFailed {
                from: from.to_owned(),
                to: to.to_owned(),
                source,
            },
            Transfer::Copy => Error::CopyFailed {
                from: from.to_owned(),
                to: to.to_owned(),
                source,
            },
        };

        let resource = self.resource(from);
        if !resource.has().await.map_err(wrap)? {
            return Err(Error::SourceNotFound {
                from: from.to_owned(),
                to: to.to_owned(),
            });
        }

        let visibility = match requested {
            Some(visibility) => Some(visibility),
            None if retain => {
                let info = resource.info().await.map_err(wrap)?;
                Some(Visibility::from_published(info.is_published()))
            }
            None => None,
        };

        self.create_parent_directories(to).await.map_err(wrap)?;

        let destination = self.prefixer.prefix_path(to);
        debug!("{:?} {} to {}", transfer, from, to);
        let result = match transfer {
            Transfer::Move => resource.move_to(&destination, true).await,
            Transfer::Copy => resource.copy_to(&destination, true).await,
        };
        result.map_err(wrap)?;

        // Only public is re-applied, a private destination is left as the remote made it.
        if visibility == Some(Visibility::Public) {
            self.set_visibility(to, Visibility::Public).await?;
        }

        Ok(())
    }
}

/// Maps a remote resource document onto the attribute records.
pub(crate) fn attributes(path: String, info: ResourceInfo) -> ClientResult<StorageAttributes> {
    let last_modified = utils::unix(&info.modified)?;
    let visibility = Visibility::from_published(info.is_published());

    if info.is_dir() {
        return Ok(DirectoryAttributes {
            path,
            visibility: Some(visibility),
            last_modified: Some(last_modified),
            extra_metadata: info.raw,
        }
        .into());
    }

    Ok(FileAttributes {
        path,
        file_size: info.size,
        visibility: Some(visibility),
        last_modified: Some(last_modified),
        mime_type: info.mime_type,
        extra_metadata: info.raw,
    }
    .into())
}

#[async_trait]
impl<C> FilesystemAdapter for RemoteFilesystemAdapter<C>
where
    C: RemoteClient,
{
    async fn file_exists(&self, path: &str) -> Result<bool> {
        self.resource(path)
            .is_file()
            .await
            .map_err(|e| Error::metadata(path, MetadataKind::Existence, e))
    }

    async fn directory_exists(&self, path: &str) -> Result<bool> {
        self.resource(path)
            .is_dir()
            .await
            .map_err(|e| Error::metadata(path, MetadataKind::Existence, e))
    }

    /// Uploads the buffer, then publishes it when the effective visibility is public.
    async fn write(&self, path: &str, contents: Bytes, config: &Config) -> Result<()> {
        let mut source = Cursor::new(contents);
        self.upload(path, &mut source, config).await
    }

    async fn write_stream(
        &self,
        path: &str,
        contents: &mut (dyn AsyncRead + Send + Unpin),
        config: &Config,
    ) -> Result<()> {
        self.upload(path, contents, config).await
    }

    async fn read(&self, path: &str) -> Result<Bytes> {
        async {
            let mut body = self.download(path).await?;
            let mut buffer = Vec::new();
            let _ = body.read_to_end(&mut buffer).await?;
            Ok::<_, ClientError>(Bytes::from(buffer))
        }
        .await
        .map_err(|source| Error::ReadFailed {
            path: path.to_owned(),
            source,
        })
    }

    async fn read_stream(&self, path: &str) -> Result<ReadStream> {
        self.download(path)
            .await
            .map_err(|source| Error::ReadFailed {
                path: path.to_owned(),
                source,
            })
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let resource = self.resource(path);

        async {
            if !resource.is_file().await? {
                return Ok(());
            }
            debug!("deleting file {}", path);
            resource.delete(true).await
        }
        .await
        .map_err(|source| Error::DeleteFailed {
            path: path.to_owned(),
            source,
        })
    }

    async fn delete_directory(&self, path: &str) -> Result<()> {
        let resource = self.resource(path);

        async {
            if !resource.is_dir().await? {
                return Ok(());
            }
            debug!("deleting directory {}", path);
            resource.delete(true).await
        }
        .await
        .map_err(|source| Error::DeleteFailed {
            path: path.to_owned(),
            source,
        })
    }

    async fn create_directory(&self, path: &str, _config: &Config) -> Result<()> {
        self.create_path_recursive(&self.prefixer.prefix_path(path))
            .await
            .map_err(|source| Error::DirectoryCreateFailed {
                path: path.to_owned(),
                source,
            })
    }

    async fn set_visibility(&self, path: &str, visibility: Visibility) -> Result<()> {
        let resource = self.resource(path);

        if !resource
            .has()
            .await
            .map_err(|e| Error::visibility(path, e))?
        {
            return Err(Error::VisibilityUnavailable {
                path: path.to_owned(),
                reason: "Resource does not exist".to_owned(),
                source: None,
            });
        }

        debug!("setting visibility of {} to {}", path, visibility);
        resource
            .set_publish(visibility == Visibility::Public)
            .await
            .map_err(|e| Error::visibility(path, e))
    }

    async fn visibility(&self, path: &str) -> Result<FileAttributes> {
        self.file_metadata(path, MetadataKind::Visibility).await
    }

    async fn mime_type(&self, path: &str) -> Result<FileAttributes> {
        let file = self.file_metadata(path, MetadataKind::MimeType).await?;
        if file.mime_type.is_none() {
            return Err(Error::metadata_reason(
                path,
                MetadataKind::MimeType,
                "Unknown MIME type",
            ));
        }
        Ok(file)
    }

    async fn last_modified(&self, path: &str) -> Result<FileAttributes> {
        self.file_metadata(path, MetadataKind::LastModified).await
    }

    async fn file_size(&self, path: &str) -> Result<FileAttributes> {
        self.file_metadata(path, MetadataKind::FileSize).await
    }

    /// Best-effort listing: a missing root, a root that is not a directory and
    /// any remote failure all end the sequence quietly.
    fn list_contents<'a>(&'a self, path: &str, deep: bool) -> ListContents<'a> {
        self.list_contents_with(path, deep, ListingPolicy::BestEffort)
    }

    async fn move_file(&self, source: &str, destination: &str, config: &Config) -> Result<()> {
        self.transfer(Transfer::Move, source, destination, config)
            .await
    }

    async fn copy_file(&self, source: &str, destination: &str, config: &Config) -> Result<()> {
        self.transfer(Transfer::Copy, source, destination, config)
            .await
    }
}

#[async_trait]
impl<C> PublicUrlGenerator for RemoteFilesystemAdapter<C>
where
    C: RemoteClient,
{
    /// Returns the public URL, publishing the resource first when it is private.
    ///
    /// Publishing is permanent: after this call the resource reports
    /// [`Visibility::Public`].
    async fn public_url(&self, path: &str, _config: &Config) -> Result<String> {
        let resource = self.resource(path);
        let info = resource
            .info()
            .await
            .map_err(|e| Error::public_url(path, e))?;

        if let Some(url) = &info.public_url {
            return Ok(url.clone());
        }

        info!("publishing {} to generate a public url", path);
        resource
            .set_publish(true)
            .await
            .map_err(|e| Error::public_url(path, e))?;

        self.resource(path)
            .into_info()
            .await
            .map_err(|e| Error::public_url(path, e))?
            .and_then(|info| info.public_url)
            .ok_or_else(|| Error::PublicUrlUnavailable {
                path: path.to_owned(),
                reason: "Remote did not provide a public url".to_owned(),
                source: None,
            })
    }
}

#[async_trait]
impl<C> ChecksumProvider for RemoteFilesystemAdapter<C>
where
    C: RemoteClient,
{
    /// Returns the digest the remote precomputed. Nothing is downloaded.
    async fn checksum(&self, path: &str, config: &Config) -> Result<String> {
        let algorithm = self.options.checksum_algorithm(config)?;

        let info = self
            .resource(path)
            .into_info()
            .await
            .map_err(|e| Error::checksum(path, e))?
            .ok_or_else(|| Error::ChecksumUnavailable {
                path: path.to_owned(),
                reason: "File not found".to_owned(),
                source: None,
            })?;

        let digest = match algorithm {
            ChecksumAlgorithm::Md5 => info.md5,
            ChecksumAlgorithm::Sha256 => info.sha256,
        };

        digest.ok_or_else(|| Error::ChecksumUnavailable {
            path: path.to_owned(),
            reason: format!("Remote does not provide a {algorithm} digest"),
            source: None,
        })
    }
}
