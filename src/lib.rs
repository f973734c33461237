#[macro_use]
extern crate log;
#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate async_trait;

/// Filesystem adapter over a remote client
pub mod adapter;
pub mod attributes;
/// Remote client capability and backends
pub mod client;
pub mod config;
mod error;
pub mod filesystem;
pub mod path;
mod utils;

pub use adapter::{ListingPolicy, RemoteFilesystemAdapter};
pub use attributes::{DirectoryAttributes, FileAttributes, StorageAttributes, Visibility};
pub use config::{ChecksumAlgorithm, Config, Options};
pub use error::{Error, MetadataKind, Result};
pub use filesystem::{ChecksumProvider, FilesystemAdapter, PublicUrlGenerator};
