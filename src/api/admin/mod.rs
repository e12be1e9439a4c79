//! Admin API endpoints for managing accounts

pub mod accounts;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create admin API router
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route(
            "/accounts",
            get(accounts::list_accounts).post(accounts::create_account),
        )
        .route(
            "/accounts/{account_id}",
            get(accounts::get_account).put(accounts::update_account),
        )
        .route(
            "/accounts/{account_id}/deactivate",
            post(accounts::deactivate_account),
        )
        .route(
            "/accounts/{account_id}/activate",
            post(accounts::activate_account),
        )
}
