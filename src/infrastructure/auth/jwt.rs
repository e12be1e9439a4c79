//! JWT access/refresh token issuance and validation

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use uuid::Uuid;

use crate::domain::account::{Account, Role};
use crate::domain::DomainError;

pub const DEFAULT_ACCESS_TOKEN_MINUTES: u64 = 5;
pub const DEFAULT_REFRESH_TOKEN_DAYS: u64 = 1;
/// Upper bound for either token lifetime
pub const MAX_TOKEN_LIFETIME_DAYS: u64 = 3650;
const MAX_TOKEN_LIFETIME_MINUTES: u64 = MAX_TOKEN_LIFETIME_DAYS * 24 * 60;

/// Kind of token, carried in the `token_type` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access => f.write_str("access"),
            Self::Refresh => f.write_str("refresh"),
        }
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub token_type: TokenType,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Unique token identifier
    pub jti: String,
    pub user_id: String,
    pub username: String,
    pub role: Role,
}

impl TokenClaims {
    /// Create new claims for an account
    pub fn new(account: &Account, token_type: TokenType, lifetime: Duration) -> Self {
        let now = Utc::now();

        Self {
            token_type,
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
            user_id: account.id().to_string(),
            username: account.username().to_string(),
            role: account.role(),
        }
    }

    /// Check if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// An access token together with the refresh token that renews it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Configuration for the token service
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Secret key for HS256 signing
    pub secret: String,
    pub access_token_minutes: u64,
    pub refresh_token_days: u64,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_token_minutes: DEFAULT_ACCESS_TOKEN_MINUTES,
            refresh_token_days: DEFAULT_REFRESH_TOKEN_DAYS,
        }
    }

    pub fn with_lifetimes(mut self, access_token_minutes: u64, refresh_token_days: u64) -> Self {
        self.access_token_minutes = access_token_minutes;
        self.refresh_token_days = refresh_token_days;
        self
    }

    /// Reject lifetimes that are zero or beyond `MAX_TOKEN_LIFETIME_DAYS`
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(1..=MAX_TOKEN_LIFETIME_MINUTES).contains(&self.access_token_minutes) {
            return Err(DomainError::configuration(format!(
                "auth.access_token_minutes must be between 1 and {}, got {}",
                MAX_TOKEN_LIFETIME_MINUTES, self.access_token_minutes
            )));
        }

        if !(1..=MAX_TOKEN_LIFETIME_DAYS).contains(&self.refresh_token_days) {
            return Err(DomainError::configuration(format!(
                "auth.refresh_token_days must be between 1 and {}, got {}",
                MAX_TOKEN_LIFETIME_DAYS, self.refresh_token_days
            )));
        }

        Ok(())
    }

    pub fn access_lifetime(&self) -> Duration {
        Duration::minutes(bounded(self.access_token_minutes, MAX_TOKEN_LIFETIME_MINUTES))
    }

    pub fn refresh_lifetime(&self) -> Duration {
        Duration::days(bounded(self.refresh_token_days, MAX_TOKEN_LIFETIME_DAYS))
    }
}

fn bounded(value: u64, max: u64) -> i64 {
    i64::try_from(value.min(max)).unwrap_or(i64::MAX)
}

/// Trait for token operations
pub trait TokenGenerator: Send + Sync + Debug {
    /// Issue a fresh access/refresh pair for an account
    fn issue_pair(&self, account: &Account) -> Result<TokenPair, DomainError>;

    /// Issue an access token only
    fn issue_access(&self, account: &Account) -> Result<String, DomainError>;

    /// Validate a token's signature, expiry and type, returning its claims
    fn validate(&self, token: &str, expected: TokenType) -> Result<TokenClaims, DomainError>;

    /// Access token lifetime in seconds
    fn access_lifetime_secs(&self) -> i64;
}

/// HS256 token service
#[derive(Clone)]
pub struct JwtTokenService {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Debug for JwtTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenService")
            .field("access_token_minutes", &self.config.access_token_minutes)
            .field("refresh_token_days", &self.config.refresh_token_days)
            .field("secret", &"[hidden]")
            .finish()
    }
}

impl JwtTokenService {
    pub fn new(config: TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    fn sign(&self, claims: &TokenClaims) -> Result<String, DomainError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| DomainError::internal(format!("Failed to generate JWT: {}", e)))
    }
}

impl TokenGenerator for JwtTokenService {
    fn issue_pair(&self, account: &Account) -> Result<TokenPair, DomainError> {
        let access = TokenClaims::new(account, TokenType::Access, self.config.access_lifetime());
        let refresh = TokenClaims::new(account, TokenType::Refresh, self.config.refresh_lifetime());

        Ok(TokenPair {
            access: self.sign(&access)?,
            refresh: self.sign(&refresh)?,
        })
    }

    fn issue_access(&self, account: &Account) -> Result<String, DomainError> {
        let claims = TokenClaims::new(account, TokenType::Access, self.config.access_lifetime());
        self.sign(&claims)
    }

    fn validate(&self, token: &str, expected: TokenType) -> Result<TokenClaims, DomainError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| DomainError::credential(format!("Token is invalid or expired: {}", e)))?;

        if token_data.claims.token_type != expected {
            return Err(DomainError::credential(format!(
                "Token has wrong type: expected {}, got {}",
                expected, token_data.claims.token_type
            )));
        }

        Ok(token_data.claims)
    }

    fn access_lifetime_secs(&self) -> i64 {
        self.config.access_lifetime().num_seconds()
    }
}
