//! Staging error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while publishing files to the object store
#[derive(Debug, Error)]
pub enum StagingError {
    /// The source directory could not be read
    #[error("Cannot read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A local file could not be opened for upload
    #[error("Cannot read {path}: {message}")]
    ReadFile { path: PathBuf, message: String },

    /// The object store rejected the upload
    #[error("Upload to {uri} failed: {message}")]
    Upload { uri: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for staging operations
pub type StagingResult<T> = Result<T, StagingError>;
