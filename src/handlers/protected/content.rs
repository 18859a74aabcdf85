// handlers/protected/content.rs - Admin CRUD over the content collections

use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::content::{CollectionKind, RecordMap};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, SessionUser};
use crate::services::CollectionSnapshot;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<String>,
    /// Version returned by the last list or reorder
    #[serde(default)]
    pub version: Option<String>,
}

fn collection(slug: &str) -> Result<CollectionKind, ApiError> {
    CollectionKind::from_slug(slug)
        .ok_or_else(|| ApiError::not_found(format!("Unknown collection '{}'", slug)))
}

/// GET /api/admin/:collection - Every record, drafts and inactive included,
/// with the collection version
pub async fn collection_get(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<CollectionSnapshot> {
    let kind = collection(&slug)?;
    Ok(ApiResponse::success(state.content.snapshot(kind).await?))
}

/// POST /api/admin/:collection - Create one record
pub async fn collection_post(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(slug): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<RecordMap> {
    let kind = collection(&slug)?;
    tracing::debug!("{} creating record in {}", user.username, kind);
    let created = state.content.create(kind, payload).await?;
    Ok(ApiResponse::created(created))
}

/// PATCH /api/admin/:collection/:id - Merge fields into one record
pub async fn record_patch(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
    Json(patch): Json<Value>,
) -> ApiResult<RecordMap> {
    let kind = collection(&slug)?;
    Ok(ApiResponse::success(state.content.update(kind, &id, patch).await?))
}

/// DELETE /api/admin/:collection/:id - Returns the removed record
pub async fn record_delete(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
) -> ApiResult<RecordMap> {
    let kind = collection(&slug)?;
    Ok(ApiResponse::success(state.content.delete(kind, &id).await?))
}

/// POST /api/admin/:collection/reorder
///
/// ```json
/// { "ids": ["id-b", "id-a", "id-c"], "version": "optional" }
/// ```
/// Responds with the persisted order and the new version so the client can
/// replace its optimistic copy.
pub async fn collection_reorder(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<ReorderRequest>,
) -> ApiResult<CollectionSnapshot> {
    let kind = collection(&slug)?;
    let snapshot = state
        .content
        .reorder(kind, &payload.ids, payload.version.as_deref())
        .await?;
    Ok(ApiResponse::success(snapshot))
}
