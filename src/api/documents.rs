use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::models::{StoredDocument, UploadResponse};
use crate::state::AppState;

/// POST /api/fileupload - Store a multipart `file` field as a new blob.
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    let mut upload: Option<(Vec<u8>, String, String)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Malformed multipart body: {e}"),
        )
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("file").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read upload: {e}"),
            )
        })?;
        upload = Some((bytes.to_vec(), filename, content_type));
        break;
    }

    let Some((bytes, filename, content_type)) = upload else {
        return Err((StatusCode::BAD_REQUEST, "File is empty.".to_string()));
    };

    if bytes.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "File is empty.".to_string()));
    }

    // Reject oversized payloads before touching the storage backend. The
    // router body limit already caps the inbound stream; this guards the
    // configured ceiling when it is set below that limit.
    if bytes.len() > state.config.max_upload_bytes {
        return Err((
            StatusCode::PAYLOAD_TOO_LARGE,
            format!(
                "File exceeds the {} MB upload limit.",
                state.config.max_upload_bytes / (1024 * 1024)
            ),
        ));
    }

    let (blob_name, blob_uri) = state
        .storage
        .upload(bytes, &filename, &content_type)
        .await
        .map_err(|e| {
            tracing::error!("Upload failed for {filename}: {e}");
            e.into_response_parts()
        })?;

    Ok(Json(UploadResponse {
        blob_name,
        blob_uri,
    }))
}

/// GET /api/fileupload - List stored documents. Always 200; an absent
/// container is an empty list.
pub async fn list_documents(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredDocument>>, (StatusCode, String)> {
    let documents = state.storage.list().await.map_err(|e| {
        tracing::error!("Listing documents failed: {e}");
        e.into_response_parts()
    })?;
    Ok(Json(documents))
}

/// DELETE /api/fileupload/:blob_name - Remove a document and its snapshots.
pub async fn delete_document(
    State(state): State<AppState>,
    Path(blob_name): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let blob_name = blob_name.trim();
    if blob_name.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Blob name is required.".to_string(),
        ));
    }

    let deleted = state.storage.delete(blob_name).await.map_err(|e| {
        tracing::error!("Delete failed for {blob_name}: {e}");
        e.into_response_parts()
    })?;

    if !deleted {
        return Err((StatusCode::NOT_FOUND, "Document not found.".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
