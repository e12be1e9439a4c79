use std::path::Path;

use axum::{middleware, routing::get, Router};
use tower_http::{services::ServeDir, trace::TraceLayer};

use super::accounts;
use super::admin;
use super::auth;
use super::health;
use super::middleware::{logging_middleware, metrics_middleware, security_headers_middleware};
use super::state::AppState;

/// Create the full router with application state
///
/// Uploaded media is served from `media_root` under `/media`.
pub fn create_router_with_state(state: AppState, media_root: impl AsRef<Path>) -> Router {
    let max_avatar_bytes = state.avatar_store.max_bytes();

    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Registration and tokens (no auth required)
        .nest("/auth", auth::create_auth_router())
        // Self-service for the token holder
        .nest("/accounts", accounts::create_accounts_router(max_avatar_bytes))
        // Staff-only account administration
        .nest("/admin", admin::create_admin_router())
        .nest_service("/media", ServeDir::new(media_root.as_ref()))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}
