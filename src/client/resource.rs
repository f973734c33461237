use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::{io::AsyncRead, sync::OnceCell};

use super::{error::Error, ClientResult, RemoteClient};

/// Kind of a remote resource as reported in the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    #[serde(rename = "dir")]
    Directory,
    File,
}

/// Children of a directory embedded into its resource document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Embedded {
    #[serde(default)]
    pub items: Vec<ResourceInfo>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub total: Option<usize>,
}

/// Metadata of one remote resource, decoded from the provider's JSON document.
///
/// The `raw` map keeps every field the provider sent (except `_embedded`) so it
/// can be passed on untouched as extra metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    #[serde(default)]
    pub size: Option<u64>,
    pub modified: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub md5: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(rename = "_embedded", default, skip_serializing_if = "Option::is_none")]
    pub embedded: Option<Embedded>,
    #[serde(skip)]
    pub raw: Map<String, Value>,
}

impl ResourceInfo {
    /// Decodes a resource document, keeping the raw fields of it and of every
    /// embedded child.
    pub fn from_value(value: Value) -> ClientResult<Self> {
        let mut info: Self = serde_json::from_value(value.clone())?;

        let Value::Object(mut raw) = value else {
            return Err(Error::Decode("resource document is not an object".to_owned()));
        };

        if let (Some(embedded), Some(Value::Object(mut raw_embedded))) =
            (info.embedded.as_mut(), raw.remove("_embedded"))
        {
            if let Some(Value::Array(raw_items)) = raw_embedded.remove("items") {
                for (item, raw_item) in embedded.items.iter_mut().zip(raw_items) {
                    if let Value::Object(raw_item) = raw_item {
                        item.raw = raw_item;
                    }
                }
            }
        }

        info.raw = raw;
        Ok(info)
    }

    pub fn is_dir(&self) -> bool {
        self.kind == ResourceKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == ResourceKind::File
    }

    /// A resource is published when the provider exposes a public URL for it
    pub fn is_published(&self) -> bool {
        self.public_url.is_some()
    }

    /// Embedded children, empty when the document carries none
    pub fn items(&self) -> &[ResourceInfo] {
        self.embedded.as_ref().map_or(&[], |e| e.items.as_slice())
    }

    pub fn into_items(self) -> Vec<ResourceInfo> {
        self.embedded.map(|e| e.items).unwrap_or_default()
    }
}

/// Handle to one remote path.
///
/// Attributes are fetched on first use and memoised for the lifetime of the
/// handle only. A handle is meant to live for a single operation: mutating
/// calls do not refresh the memoised attributes.
pub struct Resource<'a, C: ?Sized> {
    client: &'a C,
    path: String,
    limit: Option<usize>,
    info: OnceCell<Option<ResourceInfo>>,
}

impl<'a, C> Resource<'a, C>
where
    C: RemoteClient + ?Sized,
{
    pub fn new<P: Into<String>>(client: &'a C, path: P) -> Self {
        Self {
            client,
            path: path.into(),
            limit: None,
            info: OnceCell::new(),
        }
    }

    /// Requests up to `limit` embedded children when the attributes are fetched.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    async fn fetch(&self) -> ClientResult<Option<&ResourceInfo>> {
        self.info
            .get_or_try_init(|| self.client.stat(&self.path, self.limit))
            .await
            .map(Option::as_ref)
    }

    /// Checks whether anything exists at the path
    pub async fn has(&self) -> ClientResult<bool> {
        Ok(self.fetch().await?.is_some())
    }

    pub async fn is_file(&self) -> ClientResult<bool> {
        Ok(self.fetch().await?.is_some_and(ResourceInfo::is_file))
    }

    pub async fn is_dir(&self) -> ClientResult<bool> {
        Ok(self.fetch().await?.is_some_and(ResourceInfo::is_dir))
    }

    /// Returns the attributes, failing with [`Error::NotFound`] when absent.
    pub async fn info(&self) -> ClientResult<&ResourceInfo> {
        self.fetch()
            .await?
            .ok_or_else(|| Error::NotFound(self.path.clone()))
    }

    /// Takes the fetched attributes out of the handle.
    pub async fn into_info(self) -> ClientResult<Option<ResourceInfo>> {
        let _ = self.fetch().await?;
        Ok(self.info.into_inner().flatten())
    }

    pub async fn create(&self) -> ClientResult<()> {
        self.client.create_dir(&self.path).await
    }

    pub async fn delete(&self, permanently: bool) -> ClientResult<()> {
        self.client.remove(&self.path, permanently).await
    }

    pub async fn upload(
        &self,
        source: &mut (dyn AsyncRead + Send + Unpin),
        overwrite: bool,
    ) -> ClientResult<bool> {
        self.client.upload(&self.path, source, overwrite).await
    }

    /// Resolves a time-limited download link
    pub async fn link(&self) -> ClientResult<String> {
        self.client.download_link(&self.path).await
    }

    pub async fn move_to(&self, destination: &str, overwrite: bool) -> ClientResult<()> {
        self.client
            .move_resource(&self.path, destination, overwrite)
            .await
    }

    pub async fn copy_to(&self, destination: &str, overwrite: bool) -> ClientResult<()> {
        self.client
            .copy_resource(&self.path, destination, overwrite)
            .await
    }

    pub async fn set_publish(&self, publish: bool) -> ClientResult<()> {
        self.client.set_publish(&self.path, publish).await
    }
}
