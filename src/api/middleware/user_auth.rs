//! Account authentication using JWT access tokens

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::{debug, warn};

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::account::Account;
use crate::domain::DomainError;
use crate::infrastructure::auth::TokenType;

const TOKEN_NOT_VALID: &str = "Given token not valid for any token type";

/// Extractor that requires a valid access token for an active account
///
/// Extracts the JWT token from:
/// - Authorization header: `Bearer <jwt_token>`
///
/// Every successful extraction stamps `last_activity` on the account.
#[derive(Debug, Clone)]
pub struct RequireUser(pub Account);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_jwt_token(&parts.headers)?;

        debug!("Validating access token");

        let claims = state
            .token_service
            .validate(&token, TokenType::Access)
            .map_err(|e| {
                debug!(error = %e, "Rejected access token");
                token_not_valid()
            })?;

        let account = load_active_account(state, &claims.user_id).await?;

        if let Err(e) = state
            .account_service
            .record_activity(&claims.user_id)
            .await
        {
            warn!(user_id = %claims.user_id, error = %e, "Failed to record account activity");
        }

        Ok(RequireUser(account))
    }
}

/// Load the account a token was issued for, rejecting missing and inactive accounts
pub async fn load_active_account(state: &AppState, user_id: &str) -> Result<Account, ApiError> {
    let account = state
        .account_service
        .get(user_id)
        .await
        .map_err(|e| match e {
            DomainError::InvalidId { .. } => token_not_valid(),
            other => ApiError::from(other),
        })?
        .ok_or_else(|| ApiError::unauthorized("User not found").with_code("user_not_found"))?;

    if !account.is_active() {
        return Err(ApiError::unauthorized("User is inactive").with_code("user_inactive"));
    }

    Ok(account)
}

/// Extract JWT token from Authorization header
pub fn extract_jwt_token(headers: &HeaderMap) -> Result<String, ApiError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid Authorization header encoding"))?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.trim().to_string());
        }
    }

    Err(ApiError::unauthorized(
        "Authentication credentials were not provided.",
    )
    .with_code("not_authenticated"))
}

fn token_not_valid() -> ApiError {
    ApiError::unauthorized(TOKEN_NOT_VALID).with_code("token_not_valid")
}
