//! Error handlers
//!
//! Maps storage errors onto HTTP status codes and public detail strings.

use axum::http::StatusCode;
use log::{error, warn};

use crate::error::types::StorageError;

/// Log a storage error at a level matching its origin
pub fn handle_error(err: &StorageError) {
    if err.is_client_error() {
        warn!("Rejected storage request: {}", err);
    } else {
        error!("Storage failure: {}", err);
    }
}

/// Convert error to HTTP status code
pub fn error_to_status(err: &StorageError) -> StatusCode {
    match err {
        StorageError::PathTraversal(_) => StatusCode::FORBIDDEN,
        StorageError::InvalidExtension(_) => StatusCode::BAD_REQUEST,
        StorageError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        StorageError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Detail string safe to hand back to the caller
///
/// Filesystem errors carry host paths, so only client errors are echoed.
pub fn public_detail(err: &StorageError) -> String {
    match err {
        StorageError::PathTraversal(_) => "access denied".to_string(),
        StorageError::InvalidExtension(_) => "file must have a valid extension".to_string(),
        StorageError::IoError(_) | StorageError::Internal => {
            StorageError::Internal.to_string()
        }
    }
}
