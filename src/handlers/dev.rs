// handlers/dev.rs - File-backed dev endpoints (x-admin-token gated)
//
// These write straight into the data directory and the uploads tree. The
// router only mounts them when dev endpoints are enabled.

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::multipart::read_file_field;
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::records_from_value;
use crate::uploads::Category;

#[derive(Debug, Deserialize)]
pub struct SaveJsonRequest {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub content: Value,
    /// Version the client last read; omitted means last write wins
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteUploadRequest {
    #[serde(default)]
    pub path: Option<String>,
}

/// POST /dev/save-json - Replace one collection file
///
/// ```json
/// { "file": "members.json", "content": [ { ... } ], "version": "optional" }
/// ```
/// Responds `{ "ok": true, "count": n, "version": "..." }`.
pub async fn save_json(
    State(state): State<AppState>,
    Json(payload): Json<SaveJsonRequest>,
) -> Result<Json<Value>, ApiError> {
    let file = payload
        .file
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::bad_request("invalid file"))?;
    let records = records_from_value(payload.content)?;

    let outcome = state
        .content
        .store()
        .save(&file, records, payload.version.as_deref())
        .await?;

    Ok(Json(json!({
        "ok": true,
        "count": outcome.count,
        "version": outcome.version
    })))
}

/// POST /dev/upload?category=<cat> - Store one image from the `file` field
pub async fn upload(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let (file, data) = read_file_field(&mut multipart, state.uploads.max_bytes())
        .await?
        .ok_or_else(|| ApiError::bad_request("no file"))?;

    let category = Category::parse(query.category.as_deref());
    let public_path = state.uploads.save(category, &file, &data).await?;

    Ok(Json(json!({ "ok": true, "publicPath": public_path })))
}

/// DELETE /dev/upload - Remove a file given its public path
pub async fn delete_upload(
    State(state): State<AppState>,
    Json(payload): Json<DeleteUploadRequest>,
) -> Result<Json<Value>, ApiError> {
    let path = payload
        .path
        .ok_or_else(|| ApiError::bad_request("invalid file path"))?;
    state.uploads.delete(&path).await?;
    Ok(Json(json!({ "ok": true })))
}
