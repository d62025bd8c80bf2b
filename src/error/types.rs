//! Error types
//!
//! Defines the error types for the storage core and for server startup.

use std::io;

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage core errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Path traversal attempt: {0}")]
    PathTraversal(String),

    #[error("File must have a valid extension: {0}")]
    InvalidExtension(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// The cause is logged where it happens and never leaves the core.
    #[error("internal server error")]
    Internal,
}

impl StorageError {
    /// Whether the error originated from caller input rather than the filesystem
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StorageError::PathTraversal(_) | StorageError::InvalidExtension(_)
        )
    }
}

/// Errors that stop the server from starting or keep it from serving
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Storage root unavailable: {0}")]
    StorageRoot(io::Error),

    #[error("Server error: {0}")]
    Serve(io::Error),
}
