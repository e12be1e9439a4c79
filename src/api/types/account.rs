//! Account request and response bodies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::account::{Account, Role};
use crate::domain::DomainError;
use crate::infrastructure::account::{ChangePasswordRequest, ProfileUpdate, RegisterRequest};

/// URL prefix under which stored media is served
pub const MEDIA_URL: &str = "/media/";

/// Public read shape of an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: String,
    pub role: Role,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_email_verified: bool,
    pub date_joined: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id().to_string(),
            username: account.username().to_string(),
            email: account.email().map(String::from),
            first_name: account.first_name().map(String::from),
            last_name: account.last_name().map(String::from),
            full_name: account.full_name(),
            role: account.role(),
            phone_number: account.phone_number().map(String::from),
            bio: account.bio().map(String::from),
            avatar: account.avatar().map(media_url),
            is_active: account.is_active(),
            is_staff: account.is_staff(),
            is_email_verified: account.is_email_verified(),
            date_joined: account.date_joined(),
            updated_at: account.updated_at(),
            last_login: account.last_login(),
            last_activity: account.last_activity(),
        }
    }
}

/// Public URL of a stored media path
pub fn media_url(path: &str) -> String {
    format!("{}{}", MEDIA_URL, path.trim_start_matches('/'))
}

/// Parse an optional role from the wire, reporting failures on `role`
pub fn parse_role(role: Option<&str>) -> Result<Option<Role>, DomainError> {
    match role.map(str::trim).filter(|r| !r.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<Role>()
            .map(Some)
            .map_err(|e| DomainError::field(e.field(), e.to_string())),
    }
}

/// Self-registration body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterBody {
    pub username: String,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password2: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
}

impl RegisterBody {
    pub fn into_request(self) -> Result<RegisterRequest, DomainError> {
        Ok(RegisterRequest {
            role: parse_role(self.role.as_deref())?,
            username: self.username,
            email: self.email,
            password: self.password,
            password2: self.password2,
            first_name: self.first_name,
            last_name: self.last_name,
            phone_number: self.phone_number,
            bio: self.bio,
        })
    }
}

/// Credentials exchanged for a token pair
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

/// Refresh token exchanged for a new access token
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Token pair plus the authenticated account
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access: String,
    pub refresh: String,
    pub user: AccountResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessTokenResponse {
    pub access: String,
}

/// Owner profile edit; `role` and status fields are not accepted here
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdateBody {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
}

impl From<ProfileUpdateBody> for ProfileUpdate {
    fn from(body: ProfileUpdateBody) -> Self {
        Self {
            email: body.email,
            first_name: body.first_name,
            last_name: body.last_name,
            phone_number: body.phone_number,
            bio: body.bio,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChangePasswordBody {
    pub current_password: String,
    pub new_password: String,
    pub new_password2: String,
}

impl From<ChangePasswordBody> for ChangePasswordRequest {
    fn from(body: ChangePasswordBody) -> Self {
        Self {
            current_password: body.current_password,
            new_password: body.new_password,
            new_password2: body.new_password2,
        }
    }
}

/// Plain acknowledgement body
#[derive(Debug, Clone, Serialize)]
pub struct DetailResponse {
    pub detail: String,
}

impl DetailResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{AccountFlags, AccountId, AccountProfile};

    fn account() -> Account {
        let mut account = Account::new(
            AccountId::generate(),
            "alice",
            "$argon2id$stub",
            AccountProfile {
                first_name: Some("Alice".to_string()),
                last_name: Some("Liddell".to_string()),
                email: Some("alice@example.com".to_string()),
                ..Default::default()
            },
            AccountFlags::default(),
        );
        account.set_avatar(Some("avatars/user_1/avatar_1.png".to_string()));
        account
    }

    #[test]
    fn test_account_response_shape() {
        let json = serde_json::to_value(AccountResponse::from(&account())).unwrap();

        assert_eq!(json["username"], "alice");
        assert_eq!(json["full_name"], "Alice Liddell");
        assert_eq!(json["role"], "software_engineer");
        assert_eq!(json["avatar"], "/media/avatars/user_1/avatar_1.png");
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
        assert!(json.get("is_superuser").is_none());
    }

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role(None).unwrap(), None);
        assert_eq!(parse_role(Some("  ")).unwrap(), None);
        assert_eq!(
            parse_role(Some("data_engineer")).unwrap(),
            Some(Role::DataEngineer)
        );

        let err = parse_role(Some("wizard")).unwrap_err();
        assert_eq!(err.field_name(), Some("role"));
    }

    #[test]
    fn test_register_body_ignores_unknown_fields() {
        let body: RegisterBody = serde_json::from_str(
            r#"{"username":"bob","password":"x","password2":"x","is_staff":true}"#,
        )
        .unwrap();

        let request = body.into_request().unwrap();
        assert_eq!(request.username, "bob");
        assert_eq!(request.role, None);
    }

    #[test]
    fn test_media_url() {
        assert_eq!(media_url("avatars/a.png"), "/media/avatars/a.png");
        assert_eq!(media_url("/avatars/a.png"), "/media/avatars/a.png");
    }
}
