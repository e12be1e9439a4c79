//! Staff authorization for the admin console

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::account::Account;

use super::user_auth::RequireUser;

/// Extractor that requires an authenticated account with `is_staff`
#[derive(Debug, Clone)]
pub struct RequireStaff(pub Account);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(account) = RequireUser::from_request_parts(parts, state).await?;

        ensure_staff(&account)?;

        debug!(user_id = %account.id(), "Admin access granted");
        Ok(RequireStaff(account))
    }
}

fn ensure_staff(account: &Account) -> Result<(), ApiError> {
    if account.is_staff() {
        Ok(())
    } else {
        Err(
            ApiError::forbidden("You do not have permission to perform this action.")
                .with_code("permission_denied"),
        )
    }
}
