//! Error taxonomy for the store, learner, tokenizer, query surface and
//! exchange modules.

use thiserror::Error;

/// Closed set of failure modes a handle can report.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required argument was missing, empty, or otherwise malformed.
    #[error("{0}")]
    Args(String),

    /// The underlying storage engine failed.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A lookup by word text or word id found nothing.
    #[error("word not found: {0}")]
    NotFound(String),

    /// An import file's first line did not match a known metadata marker.
    #[error("unknown file type: {0}")]
    UnknownFileType(String),

    /// Filesystem error during export/import.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
