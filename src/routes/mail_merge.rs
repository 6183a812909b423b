//! Mail Merge Routes
//!
//! Endpoints:
//! - POST /mail-merge - Merge a Word template with spreadsheet rows
//! - GET /mail-merge/preview/:session_id - HTML preview of every document
//! - GET /mail-merge/download/:session_id/:index - Download one document
//! - GET /mail-merge/download-zip/:session_id - Download all documents (ends the session)
//! - GET /mail-merge/image/:session_id/:document_index/:image_id - Preview image

use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::merge::{self, DownloadedFile};
use crate::state::AppState;

/// Multipart field carrying the `.docx` template
const TEMPLATE_FIELD: &str = "wordTemplate";
/// Multipart field carrying the spreadsheet
const TABLE_FIELD: &str = "excelData";

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResponse {
    pub session_id: String,
}

// ============================================================================
// Router
// ============================================================================

/// Create the mail merge router
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", post(merge_documents))
        .route("/preview/:session_id", get(preview))
        .route("/download/:session_id/:index", get(download_document))
        .route("/download-zip/:session_id", get(download_zip))
        .route("/image/:session_id/:document_index/:image_id", get(get_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /mail-merge
async fn merge_documents(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<MergeResponse>> {
    let mut template: Option<Bytes> = None;
    let mut table: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        tracing::debug!(field = %name, file_name = ?field.file_name(), "Received multipart field");

        let slot = match name.as_str() {
            TEMPLATE_FIELD => &mut template,
            TABLE_FIELD => &mut table,
            _ => continue,
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read field '{}': {}", name, e)))?;
        *slot = Some(data);
    }

    let template = template.ok_or_else(|| AppError::BadRequest(format!("Missing file field '{}'", TEMPLATE_FIELD)))?;
    let table = table.ok_or_else(|| AppError::BadRequest(format!("Missing file field '{}'", TABLE_FIELD)))?;

    tracing::info!(
        template_size = template.len(),
        table_size = table.len(),
        "Starting mail merge"
    );

    let service = state.merge_service().clone();
    let session_id = run_blocking(move || service.merge(&template, &table)).await?;

    Ok(Json(MergeResponse {
        session_id: session_id.to_string(),
    }))
}

/// GET /mail-merge/preview/:session_id
async fn preview(State(state): State<AppState>, Path(session_id): Path<String>) -> Result<Json<Vec<String>>> {
    let service = state.merge_service().clone();
    let fragments = run_blocking(move || service.preview(&session_id)).await?;
    Ok(Json(fragments))
}

/// GET /mail-merge/download/:session_id/:index
async fn download_document(
    State(state): State<AppState>,
    Path((session_id, index)): Path<(String, i64)>,
) -> Result<Response> {
    let file = state.merge_service().download_one(&session_id, index)?;
    tracing::info!(session_id = %session_id, document = index + 1, size = file.data.len(), "Downloading document");
    attachment(file)
}

/// GET /mail-merge/download-zip/:session_id
async fn download_zip(State(state): State<AppState>, Path(session_id): Path<String>) -> Result<Response> {
    let service = state.merge_service().clone();
    let file = run_blocking(move || service.download_all(&session_id)).await?;
    attachment(file)
}

/// GET /mail-merge/image/:session_id/:document_index/:image_id
async fn get_image(
    State(state): State<AppState>,
    Path((session_id, document_index, image_id)): Path<(String, usize, String)>,
) -> Result<Response> {
    let image = state
        .merge_service()
        .fetch_image(&session_id, document_index, &image_id)?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, image.content_type)
        .header(header::CONTENT_LENGTH, image.data.len())
        .body(Body::from(image.data))
        .map_err(|e| AppError::Internal(e.to_string()))
}

// ============================================================================
// Helpers
// ============================================================================

/// Run a merge operation on the blocking thread pool
async fn run_blocking<T, F>(operation: F) -> Result<T>
where
    F: FnOnce() -> merge::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(operation)
        .await
        .map_err(|e| AppError::Internal(format!("Merge task failed: {}", e)))?
        .map_err(AppError::from)
}

fn attachment(file: DownloadedFile) -> Result<Response> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, file.content_type)
        .header(header::CONTENT_LENGTH, file.data.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", file.file_name),
        )
        .body(Body::from(file.data))
        .map_err(|e| AppError::Internal(e.to_string()))
}

// ============================================================================
// Tests
// ============================================================================
