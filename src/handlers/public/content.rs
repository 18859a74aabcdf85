// handlers/public/content.rs - Read-only content for the site pages

use axum::extract::State;
use serde_json::Value;

use crate::content::{CollectionKind, RecordMap};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Missing flags count as set; only an explicit `false` hides a record
fn flag_or_default(record: &RecordMap, key: &str) -> bool {
    record.get(key).and_then(Value::as_bool).unwrap_or(true)
}

/// GET /api/members - Active members with their class name resolved
pub async fn members(State(state): State<AppState>) -> ApiResult<Vec<RecordMap>> {
    let members = state.content.members_with_classes().await?;
    Ok(ApiResponse::success(
        members
            .into_iter()
            .filter(|m| flag_or_default(m, "isActive"))
            .collect(),
    ))
}

/// GET /api/member-classes
pub async fn member_classes(State(state): State<AppState>) -> ApiResult<Vec<RecordMap>> {
    let classes = state.content.list(CollectionKind::MemberClasses).await?;
    Ok(ApiResponse::success(classes))
}

/// GET /api/programs
pub async fn programs(State(state): State<AppState>) -> ApiResult<Vec<RecordMap>> {
    let programs = state.content.list(CollectionKind::Programs).await?;
    Ok(ApiResponse::success(programs))
}

/// GET /api/news - Published posts, newest first. Drafts must be marked
/// published explicitly before they show up.
pub async fn news(State(state): State<AppState>) -> ApiResult<Vec<RecordMap>> {
    let posts = state.content.list(CollectionKind::News).await?;
    Ok(ApiResponse::success(
        posts
            .into_iter()
            .filter(|p| p.get("isPublished").and_then(Value::as_bool) == Some(true))
            .collect(),
    ))
}

/// GET /api/hero-images - Active carousel images
pub async fn hero_images(State(state): State<AppState>) -> ApiResult<Vec<RecordMap>> {
    let images = state.content.list(CollectionKind::HeroImages).await?;
    Ok(ApiResponse::success(
        images
            .into_iter()
            .filter(|i| flag_or_default(i, "isActive"))
            .collect(),
    ))
}
