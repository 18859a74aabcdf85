pub mod auth;
pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;
pub mod storage;
pub mod uploads;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{get, patch, post},
    Router,
};
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::{AppConfig, Environment};
use crate::content::CollectionKind;
use crate::handlers::{dev, protected, public};
use crate::middleware::{require_admin, require_authenticated, require_dev_token};
use crate::middleware::dev_token::ADMIN_TOKEN_HEADER;
pub use crate::state::AppState;

/// Full router: public reads and login, the admin tier, the dev tier when
/// enabled, and the static `/data` and `/uploads` trees.
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        .merge(session_routes(&state))
        .merge(admin_routes(&state));

    if config.api.enable_dev_endpoints {
        tracing::warn!("Dev file endpoints are mounted under /dev");
        router = router.merge(dev_routes(&state));
    }

    let mut router = router
        .nest_service("/data", ServeDir::new(&config.storage.data_dir))
        .nest_service("/uploads", ServeDir::new(&config.storage.upload_dir))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .with_state(state);

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/members", get(public::members))
        .route("/api/member-classes", get(public::member_classes))
        .route("/api/programs", get(public::programs))
        .route("/api/news", get(public::news))
        .route("/api/hero-images", get(public::hero_images))
        .route("/api/login", post(public::login))
        .route("/api/logout", post(public::logout))
}

fn session_routes(state: &AppState) -> Router<AppState> {
    let user = Router::new()
        .route("/api/auth/user", get(public::current_user))
        .route_layer(from_fn_with_state(state.clone(), require_authenticated));

    let admin = Router::new()
        .route("/api/auth/admin", get(public::current_admin))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    user.merge(admin)
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/admin/upload",
            post(protected::upload_post)
                .delete(protected::upload_delete)
                .layer(upload_body_limit(state)),
        )
        .route(
            "/api/admin/:collection",
            get(protected::collection_get).post(protected::collection_post),
        )
        .route(
            "/api/admin/:collection/reorder",
            post(protected::collection_reorder),
        )
        .route(
            "/api/admin/:collection/:id",
            patch(protected::record_patch).delete(protected::record_delete),
        )
        .route_layer(from_fn_with_state(state.clone(), require_admin))
}

fn dev_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/dev/save-json", post(dev::save_json))
        .route(
            "/dev/upload",
            post(dev::upload)
                .delete(dev::delete_upload)
                .layer(upload_body_limit(state)),
        )
        .route_layer(from_fn_with_state(state.clone(), require_dev_token))
}

/// Transport ceiling for multipart bodies. The exact per-file limit is
/// enforced while the field streams in, so this only needs headroom for the
/// multipart framing.
fn upload_body_limit(state: &AppState) -> DefaultBodyLimit {
    DefaultBodyLimit::max(state.uploads.max_bytes().saturating_mul(2))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.environment == Environment::Development {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(ADMIN_TOKEN_HEADER)])
        .allow_credentials(true)
}

async fn root(State(state): State<AppState>) -> Json<serde_json::Value> {
    let collections: Vec<&str> = CollectionKind::ALL.iter().map(|k| k.slug()).collect();

    Json(json!({
        "success": true,
        "data": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Content API for the club website",
            "environment": state.config.environment,
            "endpoints": {
                "public": "/api/{members,member-classes,programs,news,hero-images}",
                "session": "/api/login, /api/logout, /api/auth/user, /api/auth/admin",
                "admin": "/api/admin/:collection[/:id] (admin session)",
                "upload": "/api/admin/upload (admin session)",
                "dev": "/dev/save-json, /dev/upload (x-admin-token, development only)",
                "static": "/data/<collection>.json, /uploads/<category>/<file>",
            },
            "collections": collections,
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let data_dir_present = tokio::fs::metadata(&state.config.storage.data_dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);

    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": now,
            "storage": if data_dir_present { "ok" } else { "empty" },
        }
    }))
}
