//! HTTP response bodies
//!
//! Every JSON response carries an `ok` flag; failures add a detail string.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::StorageError;
use crate::error::handlers::{error_to_status, handle_error, public_detail};
use crate::storage::{PathOutcome, StoredFile};

#[derive(Debug, Serialize)]
pub struct BasicResponse {
    pub ok: bool,
    pub details: String,
}

impl BasicResponse {
    pub fn success() -> Self {
        Self {
            ok: true,
            details: String::new(),
        }
    }

    pub fn failure(details: impl Into<String>) -> Self {
        Self {
            ok: false,
            details: details.into(),
        }
    }

    pub fn respond(self, code: StatusCode) -> Response {
        (code, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub ok: bool,
    pub url: String,
    pub file_size: u64,
    pub path: String,
}

impl From<StoredFile> for UploadResponse {
    fn from(stored: StoredFile) -> Self {
        Self {
            ok: true,
            url: stored.url,
            file_size: stored.size,
            path: stored.path.to_slash_path(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub ok: bool,
    pub details: String,
    pub results: Vec<PathOutcome>,
}

/// Log a storage error and turn it into a JSON failure response
pub fn storage_error_response(err: &StorageError) -> Response {
    handle_error(err);
    BasicResponse::failure(public_detail(err)).respond(error_to_status(err))
}
