//! Request handlers
//!
//! Decode requests, run the storage operation on the blocking pool and
//! encode the result. No path handling happens here.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use log::error;
use serde::Deserialize;
use std::io;
use tokio::task::JoinHandle;

use crate::error::{StorageError, StorageResult};
use crate::server::AppState;
use crate::server::body::ChunkReader;
use crate::server::responses::{
    BasicResponse, DeleteResponse, UploadResponse, storage_error_response,
};

#[derive(Debug, Deserialize)]
pub struct FolderRequest {
    #[serde(default)]
    pub path: String,
}

/// Chunks queued between the request body and the disk writer
const UPLOAD_CHANNEL_DEPTH: usize = 8;

/// Await a blocking storage task, mapping a panicked task to an internal error
async fn join_storage<T>(task: JoinHandle<StorageResult<T>>) -> StorageResult<T> {
    task.await.unwrap_or_else(|e| {
        error!("Storage task failed: {}", e);
        Err(StorageError::Internal)
    })
}

/// Run a blocking storage call off the async runtime
async fn blocking<T, F>(f: F) -> StorageResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> StorageResult<T> + Send + 'static,
{
    join_storage(tokio::task::spawn_blocking(f)).await
}

/// `POST /files`: multipart with an optional `path` part and a `file` part
///
/// The file part is streamed to disk as it arrives, so `path` must come
/// before it. Parts after the file are not read.
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut logical_dir = String::new();

    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return BasicResponse::failure(e.body_text()).respond(e.status()),
        };

        match field.name().map(str::to_owned).as_deref() {
            Some("path") => match field.text().await {
                Ok(text) => logical_dir = text,
                Err(e) => return BasicResponse::failure(e.body_text()).respond(e.status()),
            },
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let (tx, reader) = ChunkReader::channel(UPLOAD_CHANNEL_DEPTH);
                let storage = state.storage.clone();
                let task = tokio::task::spawn_blocking(move || {
                    storage.store(&logical_dir, reader, &filename)
                });

                let mut aborted = None;
                loop {
                    match field.chunk().await {
                        Ok(Some(chunk)) => {
                            // A closed channel means the store already gave up
                            if tx.send(Ok(chunk)).await.is_err() {
                                break;
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            let detail = e.body_text();
                            let _ = tx.send(Err(io::Error::other(detail.clone()))).await;
                            aborted = Some(BasicResponse::failure(detail).respond(e.status()));
                            break;
                        }
                    }
                }
                drop(tx);

                let result = join_storage(task).await;
                if let Some(response) = aborted {
                    return response;
                }
                return match result {
                    Ok(stored) => {
                        (StatusCode::OK, Json(UploadResponse::from(stored))).into_response()
                    }
                    Err(e) => storage_error_response(&e),
                };
            }
            _ => {}
        }
    }

    BasicResponse::failure("no file provided").respond(StatusCode::BAD_REQUEST)
}

/// `DELETE /files`: JSON array of logical paths
pub async fn delete_files(
    State(state): State<AppState>,
    body: Result<Json<Vec<String>>, JsonRejection>,
) -> Response {
    let paths = match body {
        Ok(Json(paths)) => paths,
        Err(e) => return BasicResponse::failure(e.body_text()).respond(StatusCode::BAD_REQUEST),
    };

    let storage = state.storage.clone();
    let report = match blocking(move || Ok(storage.delete(&paths))).await {
        Ok(report) => report,
        Err(e) => return storage_error_response(&e),
    };

    let response = DeleteResponse {
        ok: report.is_complete(),
        details: format!(
            "removed {} of {} paths",
            report.removed_count(),
            report.outcomes.len()
        ),
        results: report.outcomes,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// `POST /folders`: JSON `{"path": ...}`
pub async fn create_folder(
    State(state): State<AppState>,
    body: Result<Json<FolderRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(e) => return BasicResponse::failure(e.body_text()).respond(StatusCode::BAD_REQUEST),
    };

    let storage = state.storage.clone();
    match blocking(move || storage.create_folder(&request.path)).await {
        Ok(()) => BasicResponse::success().respond(StatusCode::OK),
        Err(e) => storage_error_response(&e),
    }
}

/// `POST /archive`: JSON `{"path": ...}`, answers with the zipped folder
pub async fn archive_folder(
    State(state): State<AppState>,
    body: Result<Json<FolderRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(e) => return BasicResponse::failure(e.body_text()).respond(StatusCode::BAD_REQUEST),
    };

    let folder_name = match state.storage.file_store().resolver().resolve(&request.path) {
        Ok(resolved) => resolved
            .relative()
            .file_name()
            .map(|name| name.to_string_lossy().replace('"', ""))
            .unwrap_or_else(|| "root".to_string()),
        Err(e) => return storage_error_response(&e),
    };

    let storage = state.storage.clone();
    match blocking(move || storage.archive(&request.path)).await {
        Ok(buffer) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/zip".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{folder_name}.zip\""),
                ),
            ],
            buffer.into_inner(),
        )
            .into_response(),
        Err(e) => storage_error_response(&e),
    }
}
