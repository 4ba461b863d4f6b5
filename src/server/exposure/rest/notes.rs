//! Note handlers
//!
//! Notes are either links or uploaded files. File notes keep the blob's
//! storage path so deleting the note can remove the file too.

use super::records::{delete_failure, fetch, present, save_failure};
use crate::config::collections::NOTES;
use crate::core::error::{PortalError, PortalResult};
use crate::core::validation::{ModalMode, NoteEditForm, NoteFileForm, NoteLinkForm, parse_form};
use crate::server::host::ServerHost;
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// POST /api/notes/links
pub async fn create_link(
    State(host): State<Arc<ServerHost>>,
    Json(body): Json<Value>,
) -> PortalResult<(StatusCode, Json<Value>)> {
    let fields = parse_form::<NoteLinkForm>(body, ModalMode::Link)?;

    let record = host
        .store
        .create(NOTES, fields)
        .await
        .map_err(|e| PortalError::storage(&save_failure(NOTES), e))?;

    tracing::info!(record_id = %record.id, "Link note created");
    Ok((StatusCode::CREATED, Json(present(NOTES, &record))))
}

/// POST /api/notes/files?title=&fileName=
///
/// The request body is the file content, capped at `server.max_upload_bytes`.
pub async fn upload_file(
    State(host): State<Arc<ServerHost>>,
    Query(form): Query<NoteFileForm>,
    body: Result<Bytes, BytesRejection>,
) -> PortalResult<(StatusCode, Json<Value>)> {
    let body = body.map_err(|rejection| {
        upload_rejection(rejection, host.config.server.max_upload_bytes)
    })?;
    let size = body.len();
    let file_name = form.validate(size)?;
    let storage_path = NoteFileForm::storage_path(&file_name, Utc::now().timestamp_millis());

    let mut task = host
        .blobs
        .upload(&storage_path, body.to_vec())
        .await
        .map_err(|e| PortalError::storage("Upload failed.", e))?;

    while let Some(progress) = task.next_progress().await {
        tracing::debug!(
            path = %storage_path,
            bytes = progress.bytes_transferred,
            percent = progress.percent(),
            "Upload progress"
        );
    }
    let url = task
        .finish()
        .await
        .map_err(|e| PortalError::storage("Upload failed.", e))?;

    let fields = form.into_fields(&file_name, &url, &storage_path, size);
    let record = host
        .store
        .create(NOTES, fields)
        .await
        .map_err(|e| PortalError::storage(&save_failure(NOTES), e))?;

    tracing::info!(record_id = %record.id, path = %storage_path, size, "File note created");
    Ok((StatusCode::CREATED, Json(present(NOTES, &record))))
}

fn upload_rejection(rejection: BytesRejection, limit: usize) -> PortalError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!(limit, "File note upload over the size limit");
        return PortalError::invalid(
            "file",
            format!("File is too large. The maximum size is {}.", display_size(limit)),
        );
    }
    PortalError::invalid("file", rejection.body_text())
}

fn display_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;
    if bytes >= MB && bytes % MB == 0 {
        format!("{} MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{} KB", bytes / KB)
    } else {
        format!("{} bytes", bytes)
    }
}

/// GET /api/notes/{id}
pub async fn get_note(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<Uuid>,
) -> PortalResult<Json<Value>> {
    let record = fetch(&host, NOTES, id).await?;
    Ok(Json(present(NOTES, &record)))
}

/// PUT /api/notes/{id}
pub async fn update_note(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> PortalResult<Json<Value>> {
    let existing = fetch(&host, NOTES, id).await?;
    let form: NoteEditForm = serde_json::from_value(body)
        .map_err(|e| PortalError::invalid("body", format!("Invalid form data: {}", e)))?;
    let fields = form.into_fields(&existing)?;

    let record = host
        .store
        .update(NOTES, &id, fields)
        .await
        .map_err(|e| PortalError::storage(&save_failure(NOTES), e))?;

    tracing::info!(record_id = %id, "Note updated");
    Ok(Json(present(NOTES, &record)))
}

/// DELETE /api/notes/{id}
///
/// The stored file is removed first; a failure there is only logged so the
/// note itself can always be deleted.
pub async fn delete_note(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<Uuid>,
) -> PortalResult<StatusCode> {
    let existing = host
        .store
        .get(NOTES, &id)
        .await
        .map_err(|e| PortalError::storage(&delete_failure(NOTES), e))?;

    if let Some(note) = &existing {
        let path = note.text("storagePath");
        if !path.is_empty()
            && let Err(e) = host.blobs.delete_by_path(&path).await
        {
            tracing::warn!(record_id = %id, path = %path, error = %e, "Failed to delete note file");
        }
    }

    host.store
        .delete(NOTES, &id)
        .await
        .map_err(|e| PortalError::storage(&delete_failure(NOTES), e))?;

    tracing::info!(record_id = %id, "Note deleted");
    Ok(StatusCode::NO_CONTENT)
}
