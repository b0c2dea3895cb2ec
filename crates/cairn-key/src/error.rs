//! Error types for key and storage operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by typed key accessors.
///
/// Absent keys never produce an error; they fall back to the caller's
/// default. Only stored data that cannot be coerced to the requested type
/// ends up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// A non-empty stored value could not be parsed as the requested number.
    #[error("cannot parse {value:?} at {path:?} as {target}")]
    Parse {
        path: String,
        value: String,
        target: &'static str,
    },
}

/// Errors from loading or saving a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error while reading, writing, or replacing the backing file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The document text could not be parsed or rendered.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backing file is larger than the configured document limit.
    #[error("document {path:?} is {size} bytes, limit is {limit}")]
    DocumentTooLarge { path: PathBuf, size: u64, limit: u64 },

    /// The document root is a scalar or sequence rather than a mapping.
    #[error("document {path:?} does not contain a top-level mapping")]
    NotAMapping { path: PathBuf },
}

/// Result alias for typed key reads.
pub type KeyResult<T> = std::result::Result<T, KeyError>;

/// Result alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
