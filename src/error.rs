use std::fmt;
use thiserror::Error;

use crate::client::error::Error as ClientError;

pub type Result<T> = std::result::Result<T, Error>;

/// Attribute requested from a metadata lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    Metadata,
    Existence,
    Visibility,
    MimeType,
    LastModified,
    FileSize,
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Metadata => "metadata",
            Self::Existence => "existence",
            Self::Visibility => "visibility",
            Self::MimeType => "mime_type",
            Self::LastModified => "last_modified",
            Self::FileSize => "file_size",
        })
    }
}

/// Errors returned by the filesystem adapter.
///
/// Remote failures are wrapped together with the path(s) of the operation and
/// kept as the error source. Validation failures are returned before any remote
/// call is made.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to write file at location: {path}. {source}")]
    WriteFailed { path: String, source: ClientError },

    #[error("Unable to read file from location: {path}. {source}")]
    ReadFailed { path: String, source: ClientError },

    #[error("Unable to delete {path}. {source}")]
    DeleteFailed { path: String, source: ClientError },

    #[error("Unable to create directory at location: {path}. {source}")]
    DirectoryCreateFailed { path: String, source: ClientError },

    #[error("Unable to move file from {from} to {to}. {source}")]
    MoveFailed {
        from: String,
        to: String,
        source: ClientError,
    },

    #[error("Unable to copy file from {from} to {to}. {source}")]
    CopyFailed {
        from: String,
        to: String,
        source: ClientError,
    },

    #[error("Unable to retrieve the {kind} for file at location: {path}. {reason}")]
    MetadataUnavailable {
        path: String,
        kind: MetadataKind,
        reason: String,
        source: Option<ClientError>,
    },

    #[error("Unable to set visibility for file {path}. {reason}")]
    VisibilityUnavailable {
        path: String,
        reason: String,
        source: Option<ClientError>,
    },

    #[error("Invalid visibility provided. Expected either public or private, received \"{value}\"")]
    InvalidVisibility { value: String },

    #[error("Unsupported checksum algorithm \"{algorithm}\". Supported algorithms: md5, sha256")]
    UnsupportedChecksumAlgorithm { algorithm: String },

    #[error("Unable to get checksum for {path}. {reason}")]
    ChecksumUnavailable {
        path: String,
        reason: String,
        source: Option<ClientError>,
    },

    #[error("Unable to generate public url for {path}. {reason}")]
    PublicUrlUnavailable {
        path: String,
        reason: String,
        source: Option<ClientError>,
    },

    #[error("Unable to move or copy from {from} to {to}. Source file does not exist")]
    SourceNotFound { from: String, to: String },

    #[error("Invalid value for option \"{key}\": {value}")]
    InvalidOption { key: String, value: String },
}

impl Error {
    pub(crate) fn metadata<P: Into<String>>(path: P, kind: MetadataKind, source: ClientError) -> Self {
        Self::MetadataUnavailable {
            path: path.into(),
            kind,
            reason: source.to_string(),
            source: Some(source),
        }
    }

    pub(crate) fn metadata_reason<P: Into<String>>(
        path: P,
        kind: MetadataKind,
        reason: &str,
    ) -> Self {
        Self::MetadataUnavailable {
            path: path.into(),
            kind,
            reason: reason.to_owned(),
            source: None,
        }
    }

    pub(crate) fn visibility<P: Into<String>>(path: P, source: ClientError) -> Self {
        Self::VisibilityUnavailable {
            path: path.into(),
            reason: source.to_string(),
            source: Some(source),
        }
    }

    pub(crate) fn checksum<P: Into<String>>(path: P, source: ClientError) -> Self {
        Self::ChecksumUnavailable {
            path: path.into(),
            reason: source.to_string(),
            source: Some(source),
        }
    }

    pub(crate) fn public_url<P: Into<String>>(path: P, source: ClientError) -> Self {
        Self::PublicUrlUnavailable {
            path: path.into(),
            reason: source.to_string(),
            source: Some(source),
        }
    }

    /// The client error this error wraps, if any
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            Self::WriteFailed { source, .. }
            | Self::ReadFailed { source, .. }
            | Self::DeleteFailed { source, .. }
            | Self::DirectoryCreateFailed { source, .. }
            | Self::MoveFailed { source, .. }
            | Self::CopyFailed { source, .. } => Some(source),
            Self::MetadataUnavailable { source, .. }
            | Self::VisibilityUnavailable { source, .. }
            | Self::ChecksumUnavailable { source, .. }
            | Self::PublicUrlUnavailable { source, .. } => source.as_ref(),
            Self::InvalidVisibility { .. }
            | Self::UnsupportedChecksumAlgorithm { .. }
            | Self::SourceNotFound { .. }
            | Self::InvalidOption { .. } => None,
        }
    }
}
