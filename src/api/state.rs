//! Application state for shared services

use std::sync::Arc;

use sqlx::PgPool;

use crate::domain::account::{Account, AccountQuery, AccountRepository};
use crate::domain::DomainError;
use crate::infrastructure::account::{
    parse_account_id, AccountService, AdminCreateRequest, AdminUpdateRequest,
    ChangePasswordRequest, CreateAccountRequest, PasswordHasher, ProfileUpdate, RegisterRequest,
};
use crate::infrastructure::auth::TokenGenerator;
use crate::infrastructure::media::AvatarStore;

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<dyn AccountServiceTrait>,
    pub token_service: Arc<dyn TokenGenerator>,
    pub avatar_store: Arc<dyn AvatarStore>,
    /// Present when accounts live in PostgreSQL; probed by the readiness check
    pub database: Option<PgPool>,
}

// Required by `Result::unwrap_err` in tests; trait-object fields are not `Debug`.
#[cfg(test)]
impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

/// Trait for account service operations
#[async_trait::async_trait]
pub trait AccountServiceTrait: Send + Sync {
    async fn create_superuser(&self, request: CreateAccountRequest)
        -> Result<Account, DomainError>;
    async fn register(&self, request: RegisterRequest) -> Result<Account, DomainError>;
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Account>, DomainError>;
    async fn get(&self, id: &str) -> Result<Option<Account>, DomainError>;
    async fn list(&self, query: &AccountQuery) -> Result<Vec<Account>, DomainError>;
    async fn count(&self, query: &AccountQuery) -> Result<usize, DomainError>;
    async fn admin_create(&self, request: AdminCreateRequest) -> Result<Account, DomainError>;
    async fn admin_update(
        &self,
        id: &str,
        request: AdminUpdateRequest,
    ) -> Result<Account, DomainError>;
    async fn update_profile(&self, id: &str, update: ProfileUpdate)
        -> Result<Account, DomainError>;
    async fn change_password(
        &self,
        id: &str,
        request: ChangePasswordRequest,
    ) -> Result<Account, DomainError>;
    async fn set_avatar(&self, id: &str, avatar: Option<String>) -> Result<Account, DomainError>;
    async fn deactivate(&self, id: &str) -> Result<Account, DomainError>;
    async fn activate(&self, id: &str) -> Result<Account, DomainError>;
    async fn record_activity(&self, id: &str) -> Result<(), DomainError>;
}

#[async_trait::async_trait]
impl<R, H> AccountServiceTrait for AccountService<R, H>
where
    R: AccountRepository + 'static,
    H: PasswordHasher + 'static,
{
    async fn create_superuser(
        &self,
        request: CreateAccountRequest,
    ) -> Result<Account, DomainError> {
        AccountService::create_superuser(self, request).await
    }

    async fn register(&self, request: RegisterRequest) -> Result<Account, DomainError> {
        AccountService::register(self, request).await
    }

    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Account>, DomainError> {
        AccountService::authenticate(self, username, password).await
    }

    async fn get(&self, id: &str) -> Result<Option<Account>, DomainError> {
        let id = parse_account_id(id)?;
        AccountService::get(self, &id).await
    }

    async fn list(&self, query: &AccountQuery) -> Result<Vec<Account>, DomainError> {
        AccountService::list(self, query).await
    }

    async fn count(&self, query: &AccountQuery) -> Result<usize, DomainError> {
        AccountService::count(self, query).await
    }

    async fn admin_create(&self, request: AdminCreateRequest) -> Result<Account, DomainError> {
        AccountService::admin_create(self, request).await
    }

    async fn admin_update(
        &self,
        id: &str,
        request: AdminUpdateRequest,
    ) -> Result<Account, DomainError> {
        let id = parse_account_id(id)?;
        AccountService::admin_update(self, &id, request).await
    }

    async fn update_profile(
        &self,
        id: &str,
        update: ProfileUpdate,
    ) -> Result<Account, DomainError> {
        let id = parse_account_id(id)?;
        AccountService::update_profile(self, &id, update).await
    }

    async fn change_password(
        &self,
        id: &str,
        request: ChangePasswordRequest,
    ) -> Result<Account, DomainError> {
        let id = parse_account_id(id)?;
        AccountService::change_password(self, &id, request).await
    }

    async fn set_avatar(&self, id: &str, avatar: Option<String>) -> Result<Account, DomainError> {
        let id = parse_account_id(id)?;
        AccountService::set_avatar(self, &id, avatar).await
    }

    async fn deactivate(&self, id: &str) -> Result<Account, DomainError> {
        let id = parse_account_id(id)?;
        AccountService::deactivate(self, &id).await
    }

    async fn activate(&self, id: &str) -> Result<Account, DomainError> {
        let id = parse_account_id(id)?;
        AccountService::activate(self, &id).await
    }

    async fn record_activity(&self, id: &str) -> Result<(), DomainError> {
        let id = parse_account_id(id)?;
        AccountService::record_activity(self, &id).await
    }
}
