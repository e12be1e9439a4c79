//! Authentication API endpoints
//!
//! Self-registration and the JWT token pair / refresh flow.

use axum::{extract::State, http::StatusCode, routing::post, Router};
use tracing::{debug, info};

use crate::api::middleware::user_auth::load_active_account;
use crate::api::state::AppState;
use crate::api::types::{
    AccessTokenResponse, AccountResponse, ApiError, Json, RefreshRequest, RegisterBody,
    TokenRequest, TokenResponse,
};
use crate::domain::DomainError;
use crate::infrastructure::auth::TokenType;
use crate::infrastructure::observability::{
    record_account_registered, record_login, record_token_refreshed, LoginResult,
};

const NO_ACTIVE_ACCOUNT: &str = "No active account found with the given credentials";

/// Create the authentication router
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/token", post(obtain_token_pair))
        .route("/token/refresh", post(refresh_token))
}

/// Register a new account
///
/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    debug!(username = %body.username, "Registration requested");

    let account = state.account_service.register(body.into_request()?).await?;

    record_account_registered();
    info!(user_id = %account.id(), username = %account.username(), "Account registered");

    Ok((StatusCode::CREATED, Json(AccountResponse::from(&account))))
}

/// Exchange credentials for an access/refresh token pair
///
/// POST /auth/token
///
/// The response embeds the account alongside the tokens.
pub async fn obtain_token_pair(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    require_field("username", &request.username)?;
    require_field("password", &request.password)?;

    let account = match state
        .account_service
        .authenticate(&request.username, &request.password)
        .await?
    {
        Some(account) => account,
        None => {
            record_login(LoginResult::InvalidCredentials);
            debug!(username = %request.username, "Token request rejected");
            return Err(ApiError::unauthorized(NO_ACTIVE_ACCOUNT).with_code("no_active_account"));
        }
    };

    let pair = state.token_service.issue_pair(&account)?;

    record_login(LoginResult::Success);
    info!(user_id = %account.id(), "Token pair issued");

    Ok(Json(TokenResponse {
        access: pair.access,
        refresh: pair.refresh,
        user: AccountResponse::from(&account),
    }))
}

/// Exchange a refresh token for a new access token
///
/// POST /auth/token/refresh
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    require_field("refresh", &request.refresh)?;

    let claims = state
        .token_service
        .validate(&request.refresh, TokenType::Refresh)
        .map_err(|e| {
            debug!(error = %e, "Rejected refresh token");
            ApiError::unauthorized("Token is invalid or expired").with_code("token_not_valid")
        })?;

    let account = load_active_account(&state, &claims.user_id).await?;
    let access = state.token_service.issue_access(&account)?;

    record_token_refreshed();
    debug!(user_id = %account.id(), "Access token refreshed");

    Ok(Json(AccessTokenResponse { access }))
}

fn require_field(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(DomainError::field(field, "This field may not be blank.").into());
    }
    Ok(())
}
