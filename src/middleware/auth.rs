use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::session::session_cookie;
use crate::auth::AuthError;
use crate::error::ApiError;
use crate::state::AppState;

/// Logged-in user context injected by the session gates
#[derive(Clone, Debug, Serialize)]
pub struct SessionUser {
    pub username: String,
    pub is_admin: bool,
    pub expires_at: DateTime<Utc>,
}

async fn resolve_session(state: &AppState, headers: &HeaderMap) -> Result<SessionUser, AuthError> {
    let cookie = session_cookie(headers).ok_or(AuthError::NotAuthenticated)?;
    let session = state
        .sessions
        .lookup(cookie)
        .await
        .ok_or(AuthError::NotAuthenticated)?;

    Ok(SessionUser {
        username: session.username,
        is_admin: session.is_admin,
        expires_at: session.expires_at,
    })
}

/// Any live session passes
pub async fn require_authenticated(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_session(&state, request.headers()).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Live session carrying the admin flag
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match resolve_session(&state, request.headers()).await {
        Ok(user) => user,
        Err(e) => return ApiError::from(e).into_response(),
    };

    if !user.is_admin {
        tracing::warn!("Admin route refused for non-admin session '{}'", user.username);
        return ApiError::from(AuthError::NotAdmin).into_response();
    }

    tracing::debug!("Admin session validated for '{}'", user.username);
    request.extensions_mut().insert(user);
    next.run(request).await
}
