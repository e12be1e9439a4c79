use serde::Deserialize;

use crate::infrastructure::auth::{DEFAULT_ACCESS_TOKEN_MINUTES, DEFAULT_REFRESH_TOKEN_DAYS};
use crate::infrastructure::media::DEFAULT_MAX_AVATAR_BYTES;
use crate::infrastructure::observability::ObservabilityConfig;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; falls back to `DATABASE_URL`
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Where accounts are persisted
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret; falls back to `JWT_SECRET`, random when unset
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default = "default_access_token_minutes")]
    pub access_token_minutes: u64,
    #[serde(default = "default_refresh_token_days")]
    pub refresh_token_days: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Directory uploaded media is stored under
    #[serde(default = "default_media_root")]
    pub root: String,
    #[serde(default = "default_max_avatar_bytes")]
    pub max_avatar_bytes: usize,
}

fn default_max_connections() -> u32 {
    5
}

fn default_access_token_minutes() -> u64 {
    DEFAULT_ACCESS_TOKEN_MINUTES
}

fn default_refresh_token_days() -> u64 {
    DEFAULT_REFRESH_TOKEN_DAYS
}

fn default_media_root() -> String {
    "media".to_string()
}

fn default_max_avatar_bytes() -> usize {
    DEFAULT_MAX_AVATAR_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            access_token_minutes: default_access_token_minutes(),
            refresh_token_days: default_refresh_token_days(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: default_media_root(),
            max_avatar_bytes: default_max_avatar_bytes(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `config/default`, `config/local` and `APP__*` env vars
    ///
    /// A `.env` file is read first when present.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: Self = config.try_deserialize()?;
        app_config.apply_env_fallbacks(|key| std::env::var(key).ok());

        Ok(app_config)
    }

    /// Like `load`, but falls back to defaults and hands the load error back to the caller
    ///
    /// `DATABASE_URL` and `JWT_SECRET` still apply to the fallback.
    pub fn load_or_default() -> (Self, Option<config::ConfigError>) {
        Self::recover(Self::load(), |key| std::env::var(key).ok())
    }

    fn recover(
        result: Result<Self, config::ConfigError>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> (Self, Option<config::ConfigError>) {
        match result {
            Ok(config) => (config, None),
            Err(e) => {
                let mut config = Self::default();
                config.apply_env_fallbacks(lookup);
                (config, Some(e))
            }
        }
    }

    /// Fill unset secrets from their conventional environment variables
    fn apply_env_fallbacks(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.database.url.is_none() {
            self.database.url = lookup("DATABASE_URL").filter(|v| !v.is_empty());
        }

        if self.auth.jwt_secret.is_none() {
            self.auth.jwt_secret = lookup("JWT_SECRET").filter(|v| !v.is_empty());
        }
    }
}
