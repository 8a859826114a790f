//! Error types for kifulog-store operations.

use crate::collection::Collection;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or reading the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Collection file could not be read.
    #[error("{collection} collection: failed to read {path}: {source}")]
    Io {
        collection: Collection,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Collection file is not a mapping of string ids to strings.
    #[error("{collection} collection: malformed {path}: {source}")]
    Malformed {
        collection: Collection,
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Store root is missing or not a directory.
    #[error("store root {0} is not a directory")]
    InvalidRoot(PathBuf),

    /// Id is absent from the addressed collection.
    #[error("key not found: {collection}/{id}")]
    NotFound { collection: Collection, id: String },

    /// Value is present but cannot be decoded.
    #[error("{collection}/{id}: {source}")]
    Decode {
        collection: Collection,
        id: String,
        #[source]
        source: DecodeError,
    },
}

impl StoreError {
    /// True if the error means the id does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Failure to turn an encoded value back into a message.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Text stage: value is not valid base64.
    #[error("invalid base64: {0}")]
    Text(#[from] base64::DecodeError),

    /// Structure stage: bytes are not a valid message of the target type.
    #[error("invalid message: {0}")]
    Message(#[from] prost::DecodeError),
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
