use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};

use crate::error::Error;

/// Publish state of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub const PUBLIC: &'static str = "public";
    pub const PRIVATE: &'static str = "private";

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => Self::PUBLIC,
            Self::Private => Self::PRIVATE,
        }
    }

    pub(crate) fn from_published(published: bool) -> Self {
        if published {
            Self::Public
        } else {
            Self::Private
        }
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::Private
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::PUBLIC => Ok(Self::Public),
            Self::PRIVATE => Ok(Self::Private),
            other => Err(Error::InvalidVisibility {
                value: other.to_owned(),
            }),
        }
    }
}

/// Attributes of a remote file.
///
/// Every field except the path is optional so that a record can describe
/// exactly what the remote reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAttributes {
    pub path: String,
    pub file_size: Option<u64>,
    pub visibility: Option<Visibility>,
    /// Seconds since the unix epoch
    pub last_modified: Option<i64>,
    pub mime_type: Option<String>,
    #[serde(default)]
    pub extra_metadata: Map<String, Value>,
}

impl FileAttributes {
    pub fn new<P: Into<String>>(path: P) -> Self {
        Self {
            path: path.into(),
            file_size: None,
            visibility: None,
            last_modified: None,
            mime_type: None,
            extra_metadata: Map::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn file_size(&self) -> Option<u64> {
        self.file_size
    }

    pub fn visibility(&self) -> Option<Visibility> {
        self.visibility
    }

    pub fn last_modified(&self) -> Option<i64> {
        self.last_modified
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn extra_metadata(&self) -> &Map<String, Value> {
        &self.extra_metadata
    }
}

/// Attributes of a remote directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryAttributes {
    pub path: String,
    pub visibility: Option<Visibility>,
    pub last_modified: Option<i64>,
    #[serde(default)]
    pub extra_metadata: Map<String, Value>,
}

impl DirectoryAttributes {
    pub fn new<P: Into<String>>(path: P) -> Self {
        Self {
            path: path.into(),
            visibility: None,
            last_modified: None,
            extra_metadata: Map::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn visibility(&self) -> Option<Visibility> {
        self.visibility
    }

    pub fn last_modified(&self) -> Option<i64> {
        self.last_modified
    }

    pub fn extra_metadata(&self) -> &Map<String, Value> {
        &self.extra_metadata
    }
}

/// Either kind of record produced by metadata lookups and listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageAttributes {
    File(FileAttributes),
    #[serde(rename = "dir")]
    Directory(DirectoryAttributes),
}

impl StorageAttributes {
    pub fn path(&self) -> &str {
        match self {
            Self::File(file) => file.path(),
            Self::Directory(dir) => dir.path(),
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory(_))
    }

    pub fn visibility(&self) -> Option<Visibility> {
        match self {
            Self::File(file) => file.visibility,
            Self::Directory(dir) => dir.visibility,
        }
    }

    pub fn last_modified(&self) -> Option<i64> {
        match self {
            Self::File(file) => file.last_modified,
            Self::Directory(dir) => dir.last_modified,
        }
    }

    pub fn extra_metadata(&self) -> &Map<String, Value> {
        match self {
            Self::File(file) => file.extra_metadata(),
            Self::Directory(dir) => dir.extra_metadata(),
        }
    }

    pub fn into_file(self) -> Option<FileAttributes> {
        match self {
            Self::File(file) => Some(file),
            Self::Directory(_) => None,
        }
    }
}

impl From<FileAttributes> for StorageAttributes {
    fn from(file: FileAttributes) -> Self {
        Self::File(file)
    }
}

impl From<DirectoryAttributes> for StorageAttributes {
    fn from(dir: DirectoryAttributes) -> Self {
        Self::Directory(dir)
    }
}
