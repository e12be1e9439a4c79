//! Account Service
//!
//! User identity service with:
//! - Account registration with normalization and password policy checks
//! - JWT access/refresh tokens carrying username and role claims
//! - Self-service profile, password and avatar management
//! - A staff-only administration surface
//! - In-memory or PostgreSQL account storage

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::{AccountServiceTrait, AppState};
use config::StorageBackend;
use domain::account::DefaultPasswordPolicy;
use infrastructure::{
    account::{AccountService, Argon2Hasher, InMemoryAccountRepository, PostgresAccountRepository},
    auth::{JwtTokenService, TokenConfig},
    media::LocalAvatarStore,
};
use rand::Rng;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

/// Create the application state with all services initialized
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    info!("Storage backend: {:?}", config.storage.backend);

    let (account_service, database): (Arc<dyn AccountServiceTrait>, _) =
        match config.storage.backend {
            StorageBackend::Memory => {
                info!("Using in-memory account storage; accounts are lost on restart");
                (
                    Arc::new(AccountService::new(
                        Arc::new(InMemoryAccountRepository::new()),
                        Arc::new(Argon2Hasher::new()),
                        Arc::new(DefaultPasswordPolicy::new()),
                    )),
                    None,
                )
            }
            StorageBackend::Postgres => {
                let pool = connect_database(config).await?;
                (
                    Arc::new(AccountService::new(
                        Arc::new(PostgresAccountRepository::new(pool.clone())),
                        Arc::new(Argon2Hasher::new()),
                        Arc::new(DefaultPasswordPolicy::new()),
                    )),
                    Some(pool),
                )
            }
        };

    let token_config = TokenConfig::new(jwt_secret(config)).with_lifetimes(
        config.auth.access_token_minutes,
        config.auth.refresh_token_days,
    );
    token_config.validate()?;
    let token_service = Arc::new(JwtTokenService::new(token_config));

    let avatar_store = Arc::new(
        LocalAvatarStore::new(&config.media.root).with_max_bytes(config.media.max_avatar_bytes),
    );

    Ok(AppState {
        account_service,
        token_service,
        avatar_store,
        database,
    })
}

/// Open the PostgreSQL pool described by the configuration
pub async fn connect_database(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let database_url = config.database.url.as_deref().ok_or_else(|| {
        anyhow::anyhow!("database.url (or DATABASE_URL) is required for PostgreSQL storage")
    })?;

    info!("Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(database_url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to PostgreSQL: {}", e))?;
    info!("PostgreSQL connection established");

    Ok(pool)
}

/// JWT signing secret from configuration, or a random one
fn jwt_secret(config: &AppConfig) -> String {
    match config.auth.jwt_secret.clone().filter(|s| !s.is_empty()) {
        Some(secret) => secret,
        None => {
            warn!(
                "No JWT_SECRET configured. Generating random secret. \
                Tokens will NOT survive a restart."
            );
            generate_random_secret()
        }
    }
}

/// Generate a random JWT secret
fn generate_random_secret() -> String {
    use rand::distributions::Alphanumeric;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}
