//! Upload and download endpoints.
//!
//! Both handlers hand the blocking store call to tokio's blocking pool. Uploads are streamed
//! from the multipart body into the store through [`SyncIoBridge`]; downloads are streamed
//! from the opened file through [`ReaderStream`]. Neither side buffers a whole file.

use axum::{
    body::Body,
    extract::{Multipart, Path as AxumPath, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Json, Response},
};
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use stash_core::{FILES_ROUTE_PREFIX, UPLOAD_FIELD_NAME};
use stash_files::{BlobStore, StoredName, OCTET_STREAM};
use std::io;
use tokio::runtime::Handle;
use tokio_util::io::{ReaderStream, StreamReader, SyncIoBridge};
use utoipa::ToSchema;

use crate::error::ErrorRes;
use crate::{ApiError, AppState};

/// Response body for a successful upload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadRes {
    /// Server-generated name the file is retrievable under
    pub stored_name: String,
    /// Path of the download endpoint for this file
    pub download_path: String,
}

impl UploadRes {
    fn new(name: StoredName) -> Self {
        Self {
            download_path: format!("{}/download/{}", FILES_ROUTE_PREFIX, name),
            stored_name: name.into_string(),
        }
    }
}

/// Multipart form accepted by the upload endpoint (documentation only)
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

#[utoipa::path(
    post,
    path = "/api/files/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored", body = UploadRes),
        (status = 400, description = "Missing or empty file", body = ErrorRes),
        (status = 413, description = "Upload exceeds the configured limit", body = ErrorRes),
        (status = 500, description = "Storage failure", body = ErrorRes)
    )
)]
/// Upload a file
///
/// Stores the content of the multipart field `file` under a newly generated name that keeps
/// the original file's extension.
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - the `file` field is missing, or
/// - the uploaded file is empty.
///
/// Returns `500 Internal Server Error` if the file cannot be written.
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadRes>, ApiError> {
    let store = state.store.clone();
    let handle = Handle::current();

    let name = tokio::task::spawn_blocking(move || store_upload(&handle, &store, multipart))
        .await
        .map_err(|e| ApiError::Internal(format!("upload task failed: {e}")))??;

    tracing::info!("Stored upload as {}", name);
    Ok(Json(UploadRes::new(name)))
}

/// Streams the first `file` field into the store. Runs on the blocking pool.
fn store_upload(
    handle: &Handle,
    store: &BlobStore,
    mut multipart: Multipart,
) -> Result<StoredName, ApiError> {
    while let Some(field) = handle.block_on(multipart.next_field())? {
        if field.name() != Some(UPLOAD_FIELD_NAME) {
            continue;
        }

        let original_name = field
            .file_name()
            .map(client_basename)
            .filter(|name| !name.is_empty())
            .map(str::to_owned);

        let body = field.map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        let reader =
            SyncIoBridge::new_with_handle(StreamReader::new(Box::pin(body)), handle.clone());

        return Ok(store.put(reader, original_name.as_deref())?);
    }

    Err(ApiError::MissingFile)
}

/// Strips any directory part a client left in its filename (`C:\fakepath\x.pdf` → `x.pdf`).
fn client_basename(name: &str) -> &str {
    name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name)
}

#[utoipa::path(
    get,
    path = "/api/files/download/{filename}",
    params(("filename" = String, Path, description = "Stored name returned by upload")),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 400, description = "Name escapes the storage directory", body = ErrorRes),
        (status = 404, description = "No file stored under this name", body = ErrorRes)
    )
)]
/// Download a stored file
///
/// Streams the file back with its detected content type and an attachment disposition.
///
/// # Errors
/// Returns `400 Bad Request` if the name resolves outside the storage directory, and
/// `404 Not Found` if nothing is stored under it.
pub async fn download_file(
    State(state): State<AppState>,
    AxumPath(filename): AxumPath<String>,
) -> Result<Response, ApiError> {
    let store = state.store.clone();

    let blob = tokio::task::spawn_blocking(move || store.get(&filename))
        .await
        .map_err(|e| ApiError::Internal(format!("download task failed: {e}")))??;

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_str(blob.content_type())
            .unwrap_or_else(|_| HeaderValue::from_static(OCTET_STREAM)),
    );
    headers.insert(CONTENT_LENGTH, HeaderValue::from(blob.len()));
    headers.insert(CONTENT_DISPOSITION, attachment_disposition(blob.stored_name()));

    tracing::info!("Serving {} ({} bytes)", blob.stored_name(), blob.len());

    let file = tokio::fs::File::from_std(blob.into_file());
    Ok((StatusCode::OK, headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

fn attachment_disposition(filename: &str) -> HeaderValue {
    let escaped = filename.replace('\\', "\\\\").replace('"', "\\\"");
    HeaderValue::from_str(&format!("attachment; filename=\"{escaped}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
