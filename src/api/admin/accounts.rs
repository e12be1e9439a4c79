//! Account administration endpoints
//!
//! Staff-only listing, search, add/change forms and (de)activation.
//! Accounts are never deleted; deactivation is the supported removal.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::middleware::RequireStaff;
use crate::api::state::AppState;
use crate::api::types::{parse_role, ApiError, Json};
use crate::domain::account::{Account, AccountQuery, Role, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::domain::DomainError;
use crate::infrastructure::account::{AdminCreateRequest, AdminUpdateRequest};

/// Row of the admin account list
#[derive(Debug, Clone, Serialize)]
pub struct AdminAccountRow {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub full_name: String,
    pub role: Role,
    pub is_staff: bool,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub date_joined: DateTime<Utc>,
}

impl From<&Account> for AdminAccountRow {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id().to_string(),
            username: account.username().to_string(),
            email: account.email().map(String::from),
            full_name: account.full_name(),
            role: account.role(),
            is_staff: account.is_staff(),
            is_active: account.is_active(),
            is_email_verified: account.is_email_verified(),
            date_joined: account.date_joined(),
        }
    }
}

/// Paginated admin account list
#[derive(Debug, Clone, Serialize)]
pub struct AdminAccountList {
    pub count: usize,
    pub page: usize,
    pub page_size: usize,
    pub results: Vec<AdminAccountRow>,
}

/// Admin change view, grouped the way the edit form is laid out
#[derive(Debug, Clone, Serialize)]
pub struct AdminAccountDetail {
    pub id: String,
    pub account: AccountFieldset,
    pub personal_info: PersonalInfoFieldset,
    pub permissions: PermissionsFieldset,
    pub important_dates: ImportantDatesFieldset,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountFieldset {
    pub username: String,
    /// The password itself is never shown, only whether one is set
    pub has_password: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonalInfoFieldset {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub role: Role,
    pub role_label: &'static str,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PermissionsFieldset {
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_email_verified: bool,
}

/// Read-only in the change form
#[derive(Debug, Clone, Serialize)]
pub struct ImportantDatesFieldset {
    pub date_joined: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl From<&Account> for AdminAccountDetail {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id().to_string(),
            account: AccountFieldset {
                username: account.username().to_string(),
                has_password: !account.password_hash().is_empty(),
            },
            personal_info: PersonalInfoFieldset {
                first_name: account.first_name().map(String::from),
                last_name: account.last_name().map(String::from),
                full_name: account.full_name(),
                email: account.email().map(String::from),
                phone_number: account.phone_number().map(String::from),
                role: account.role(),
                role_label: account.role().label(),
                bio: account.bio().map(String::from),
                avatar: account.avatar().map(String::from),
            },
            permissions: PermissionsFieldset {
                is_active: account.is_active(),
                is_staff: account.is_staff(),
                is_superuser: account.is_superuser(),
                is_email_verified: account.is_email_verified(),
            },
            important_dates: ImportantDatesFieldset {
                date_joined: account.date_joined(),
                updated_at: account.updated_at(),
                last_login: account.last_login(),
                last_activity: account.last_activity(),
            },
        }
    }
}

/// Admin add form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdminCreateBody {
    pub username: String,
    pub email: Option<String>,
    pub password1: Option<String>,
    pub password2: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
}

impl AdminCreateBody {
    pub fn into_request(self) -> Result<AdminCreateRequest, DomainError> {
        Ok(AdminCreateRequest {
            role: parse_role(self.role.as_deref())?,
            username: self.username,
            email: self.email,
            password1: self.password1,
            password2: self.password2,
            first_name: self.first_name,
            last_name: self.last_name,
        })
    }
}

/// Admin change form
///
/// Omitted fields keep their current value; an empty string clears an
/// optional text field. Read-only dates sent by clients are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdminUpdateBody {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_email_verified: Option<bool>,
}

/// Query string of the admin account list
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdminListParams {
    #[serde(alias = "q")]
    pub search: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_email_verified: Option<bool>,
    pub joined_since: Option<DateTime<Utc>>,
    pub joined_until: Option<DateTime<Utc>>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl AdminListParams {
    /// Build the repository query; returns it with the effective page and page size
    pub fn into_query(self) -> Result<(AccountQuery, usize, usize), DomainError> {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        let query = AccountQuery {
            search: self.search,
            role: parse_role(self.role.as_deref())?,
            is_active: self.is_active,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
            is_email_verified: self.is_email_verified,
            joined_since: self.joined_since,
            joined_until: self.joined_until,
            ..Default::default()
        };

        Ok((query, page, page_size))
    }
}

impl AdminUpdateBody {
    /// Overlay the submitted fields on the current form state
    pub fn apply(self, mut form: AdminUpdateRequest) -> Result<AdminUpdateRequest, DomainError> {
        if let Some(role) = parse_role(self.role.as_deref())? {
            form.role = role;
        }
        if let Some(username) = self.username {
            form.username = username;
        }
        if self.password.is_some() {
            form.password = self.password;
        }
        if self.email.is_some() {
            form.email = self.email;
        }
        if self.first_name.is_some() {
            form.first_name = self.first_name;
        }
        if self.last_name.is_some() {
            form.last_name = self.last_name;
        }
        if self.phone_number.is_some() {
            form.phone_number = self.phone_number;
        }
        if self.bio.is_some() {
            form.bio = self.bio;
        }
        if self.avatar.is_some() {
            form.avatar = self.avatar;
        }
        form.is_active = self.is_active.unwrap_or(form.is_active);
        form.is_staff = self.is_staff.unwrap_or(form.is_staff);
        form.is_superuser = self.is_superuser.unwrap_or(form.is_superuser);
        form.is_email_verified = self.is_email_verified.unwrap_or(form.is_email_verified);

        Ok(form)
    }
}

/// GET /admin/accounts
///
/// Newest accounts first.
pub async fn list_accounts(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    Query(params): Query<AdminListParams>,
) -> Result<Json<AdminAccountList>, ApiError> {
    let (query, page, page_size) = params.into_query()?;

    debug!(?query, page, page_size, "Admin listing accounts");

    let count = state.account_service.count(&query).await?;
    let accounts = state
        .account_service
        .list(&query.paginate(page, page_size))
        .await?;

    Ok(Json(AdminAccountList {
        count,
        page,
        page_size,
        results: accounts.iter().map(AdminAccountRow::from).collect(),
    }))
}

/// POST /admin/accounts
pub async fn create_account(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Json(body): Json<AdminCreateBody>,
) -> Result<(StatusCode, Json<AdminAccountDetail>), ApiError> {
    debug!(username = %body.username, "Admin creating account");

    let account = state
        .account_service
        .admin_create(body.into_request()?)
        .await?;

    info!(user_id = %account.id(), by = %staff.id(), "Account created from admin");
    Ok((StatusCode::CREATED, Json(AdminAccountDetail::from(&account))))
}

/// GET /admin/accounts/{account_id}
pub async fn get_account(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    Path(account_id): Path<String>,
) -> Result<Json<AdminAccountDetail>, ApiError> {
    debug!(account_id = %account_id, "Admin getting account");

    let account = require_account(&state, &account_id).await?;
    Ok(Json(AdminAccountDetail::from(&account)))
}

/// PUT /admin/accounts/{account_id}
///
/// Omitted fields keep their value; read-only dates are ignored.
/// Only superusers may change `is_superuser`.
pub async fn update_account(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(account_id): Path<String>,
    Json(body): Json<AdminUpdateBody>,
) -> Result<Json<AdminAccountDetail>, ApiError> {
    debug!(account_id = %account_id, "Admin updating account");

    let current = require_account(&state, &account_id).await?;

    if body.is_superuser.is_some_and(|flag| flag != current.is_superuser()) && !staff.is_superuser()
    {
        return Err(
            ApiError::forbidden("Only superusers can change superuser status.")
                .with_param("is_superuser")
                .with_code("permission_denied"),
        );
    }

    let form = body.apply(AdminUpdateRequest::from_account(&current))?;

    let account = state
        .account_service
        .admin_update(&account_id, form)
        .await?;

    info!(user_id = %account.id(), by = %staff.id(), "Account changed from admin");
    Ok(Json(AdminAccountDetail::from(&account)))
}

/// POST /admin/accounts/{account_id}/deactivate
pub async fn deactivate_account(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(account_id): Path<String>,
) -> Result<Json<AdminAccountDetail>, ApiError> {
    let account = state.account_service.deactivate(&account_id).await?;

    info!(user_id = %account.id(), by = %staff.id(), "Account deactivated");
    Ok(Json(AdminAccountDetail::from(&account)))
}

/// POST /admin/accounts/{account_id}/activate
pub async fn activate_account(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(account_id): Path<String>,
) -> Result<Json<AdminAccountDetail>, ApiError> {
    let account = state.account_service.activate(&account_id).await?;

    info!(user_id = %account.id(), by = %staff.id(), "Account activated");
    Ok(Json(AdminAccountDetail::from(&account)))
}

async fn require_account(state: &AppState, account_id: &str) -> Result<Account, ApiError> {
    state
        .account_service
        .get(account_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Account '{}' not found", account_id)))
}
