use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::AuthError;
use crate::error::ApiError;
use crate::state::AppState;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

fn token_matches(headers: &HeaderMap, expected: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return false;
    };
    headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|given| given.as_bytes() == expected.as_bytes())
}

/// Static token gate for the `/dev/*` file endpoints. Without a configured
/// `LOCAL_ADMIN_TOKEN` nothing gets through.
pub async fn require_dev_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let expected = state.config.security.local_admin_token.as_deref();
    if !token_matches(request.headers(), expected) {
        tracing::warn!("Rejected dev request to {} without a valid admin token", request.uri().path());
        return ApiError::from(AuthError::InvalidToken).into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_token_matches() {
        let mut headers = HeaderMap::new();
        assert!(!token_matches(&headers, Some("s3cret")));

        headers.insert(ADMIN_TOKEN_HEADER, HeaderValue::from_static("s3cret"));
        assert!(token_matches(&headers, Some("s3cret")));
        assert!(!token_matches(&headers, Some("other")));
        assert!(!token_matches(&headers, None));
    }
}
