// handlers/public/auth.rs - Session login, logout and introspection

use axum::{
    extract::{Extension, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::session::{clear_cookie, session_cookie, set_cookie};
use crate::auth::AuthError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, SessionUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/login - Check credentials and start a session
///
/// ```json
/// { "username": "admin", "password": "..." }
/// ```
/// Sets the `sid` cookie and returns the session's user.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("username and password are required"));
    }

    let principal = match state
        .credentials
        .verify(&payload.username, &payload.password)
        .await
    {
        Some(principal) => principal,
        None => {
            tracing::warn!("Failed login attempt for '{}'", payload.username);
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    let (session, cookie_value) = state.sessions.create(&principal).await;
    let cookie = set_cookie(
        &cookie_value,
        state.sessions.ttl(),
        state.config.security.secure_cookies,
    );

    tracing::info!("Session started for '{}'", session.username);
    Ok((
        [(header::SET_COOKIE, cookie)],
        ApiResponse::success(SessionUser {
            username: session.username,
            is_admin: session.is_admin,
            expires_at: session.expires_at,
        }),
    ))
}

/// POST /api/logout - Drop the session and clear the cookie. Succeeds even
/// without a session so the client can always reset its state.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let destroyed = match session_cookie(&headers) {
        Some(cookie) => state.sessions.destroy(cookie).await,
        None => false,
    };

    if destroyed {
        tracing::info!("Session ended");
    }

    (
        [(
            header::SET_COOKIE,
            clear_cookie(state.config.security.secure_cookies),
        )],
        ApiResponse::success(json!({ "logged_out": destroyed })),
    )
}

/// GET /api/auth/user - Current session (401 without one)
pub async fn current_user(Extension(user): Extension<SessionUser>) -> ApiResult<SessionUser> {
    Ok(ApiResponse::success(user))
}

/// GET /api/auth/admin - Current session when it carries the admin flag
pub async fn current_admin(Extension(user): Extension<SessionUser>) -> ApiResult<SessionUser> {
    Ok(ApiResponse::success(user))
}
