// handlers/protected/uploads.rs - Image uploads from the admin screens

use axum::{
    extract::{Multipart, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::handlers::multipart::read_file_field;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::uploads::Category;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveUploadRequest {
    pub path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub public_path: String,
    pub category: &'static str,
    pub size: usize,
}

/// POST /api/admin/upload?category=<cat>
pub async fn upload_post(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> ApiResult<UploadedFile> {
    let (file, data) = read_file_field(&mut multipart, state.uploads.max_bytes())
        .await?
        .ok_or_else(|| ApiError::bad_request("no file"))?;

    let category = Category::parse(query.category.as_deref());
    let public_path = state.uploads.save(category, &file, &data).await?;

    Ok(ApiResponse::created(UploadedFile {
        public_path,
        category: category.as_str(),
        size: data.len(),
    }))
}

/// DELETE /api/admin/upload - Body `{ "path": "/uploads/..." }`
pub async fn upload_delete(
    State(state): State<AppState>,
    Json(payload): Json<RemoveUploadRequest>,
) -> ApiResult<String> {
    state.uploads.delete(&payload.path).await?;
    Ok(ApiResponse::success(payload.path))
}
