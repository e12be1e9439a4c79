//! Account entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;
use super::validation::normalize_email;

/// Account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::str::FromStr for AccountId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Optional profile data supplied when an account is created
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountProfile {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
}

/// Status flags supplied when an account is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountFlags {
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_email_verified: bool,
}

impl Default for AccountFlags {
    fn default() -> Self {
        Self {
            is_active: true,
            is_staff: false,
            is_superuser: false,
            is_email_verified: false,
        }
    }
}

/// User identity record
///
/// Construction goes through the account factory, which normalizes the
/// username and email and hashes the password before calling [`Account::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    username: String,
    /// Argon2 password hash - never exposed in serialization
    #[serde(skip_serializing, default)]
    password_hash: String,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    role: Role,
    phone_number: Option<String>,
    bio: Option<String>,
    /// Storage path of the avatar image
    avatar: Option<String>,
    is_active: bool,
    is_staff: bool,
    is_superuser: bool,
    is_email_verified: bool,
    date_joined: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
    last_activity: Option<DateTime<Utc>>,
}

impl Account {
    /// Create a new account from normalized input
    pub fn new(
        id: AccountId,
        username: impl Into<String>,
        password_hash: impl Into<String>,
        profile: AccountProfile,
        flags: AccountFlags,
    ) -> Self {
        let now = Utc::now();

        Self {
            id,
            username: username.into(),
            password_hash: password_hash.into(),
            email: profile.email.as_deref().and_then(normalize_email),
            first_name: profile.first_name,
            last_name: profile.last_name,
            role: profile.role,
            phone_number: profile.phone_number,
            bio: profile.bio,
            avatar: None,
            is_active: flags.is_active,
            is_staff: flags.is_staff,
            is_superuser: flags.is_superuser,
            is_email_verified: flags.is_email_verified,
            date_joined: now,
            updated_at: now,
            last_login: None,
            last_activity: None,
        }
    }

    /// Rebuild an account from persisted state without touching timestamps
    pub fn restore(record: AccountRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            password_hash: record.password_hash,
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            role: record.role,
            phone_number: record.phone_number,
            bio: record.bio,
            avatar: record.avatar,
            is_active: record.is_active,
            is_staff: record.is_staff,
            is_superuser: record.is_superuser,
            is_email_verified: record.is_email_verified,
            date_joined: record.date_joined,
            updated_at: record.updated_at,
            last_login: record.last_login,
            last_activity: record.last_activity,
        }
    }

    // Getters

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    pub fn bio(&self) -> Option<&str> {
        self.bio.as_deref()
    }

    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_staff(&self) -> bool {
        self.is_staff
    }

    pub fn is_superuser(&self) -> bool {
        self.is_superuser
    }

    pub fn is_email_verified(&self) -> bool {
        self.is_email_verified
    }

    pub fn date_joined(&self) -> DateTime<Utc> {
        self.date_joined
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn last_login(&self) -> Option<DateTime<Utc>> {
        self.last_login
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_activity
    }

    /// First and last name joined by a space, trimmed
    pub fn full_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("");
        let last = self.last_name.as_deref().unwrap_or("");
        format!("{} {}", first, last).trim().to_string()
    }

    // Mutators

    /// Update the username (caller is responsible for normalization)
    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
        self.touch();
    }

    pub fn set_password_hash(&mut self, password_hash: impl Into<String>) {
        self.password_hash = password_hash.into();
        self.touch();
    }

    /// Update the email; the stored value is always normalized
    pub fn set_email(&mut self, email: Option<&str>) {
        self.email = email.and_then(normalize_email);
        self.touch();
    }

    pub fn set_first_name(&mut self, first_name: Option<String>) {
        self.first_name = first_name;
        self.touch();
    }

    pub fn set_last_name(&mut self, last_name: Option<String>) {
        self.last_name = last_name;
        self.touch();
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
        self.touch();
    }

    pub fn set_phone_number(&mut self, phone_number: Option<String>) {
        self.phone_number = phone_number;
        self.touch();
    }

    pub fn set_bio(&mut self, bio: Option<String>) {
        self.bio = bio;
        self.touch();
    }

    pub fn set_avatar(&mut self, avatar: Option<String>) {
        self.avatar = avatar;
        self.touch();
    }

    pub fn set_staff(&mut self, is_staff: bool) {
        self.is_staff = is_staff;
        self.touch();
    }

    pub fn set_superuser(&mut self, is_superuser: bool) {
        self.is_superuser = is_superuser;
        self.touch();
    }

    pub fn set_email_verified(&mut self, verified: bool) {
        self.is_email_verified = verified;
        self.touch();
    }

    /// Deactivate the account; accounts are never hard-deleted
    pub fn deactivate(&mut self) {
        if self.is_active {
            self.is_active = false;
            self.touch();
        }
    }

    pub fn activate(&mut self) {
        if !self.is_active {
            self.is_active = true;
            self.touch();
        }
    }

    /// Record a successful login
    pub fn record_login(&mut self) {
        self.last_login = Some(Utc::now());
    }

    /// Record request activity
    pub fn record_activity(&mut self) {
        self.last_activity = Some(Utc::now());
    }

    /// Re-apply email normalization before persisting
    pub fn normalize(&mut self) {
        self.email = self.email.as_deref().and_then(normalize_email);
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.username)
    }
}

/// Flat persisted representation of an account
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub id: AccountId,
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_email_verified: bool,
    pub date_joined: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
}
