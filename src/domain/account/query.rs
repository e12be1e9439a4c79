//! Account listing filters used by the admin console

use chrono::{DateTime, Utc};

use super::entity::Account;
use super::role::Role;

pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const MAX_PAGE_SIZE: usize = 1000;

/// Filter, search and pagination parameters for listing accounts
///
/// Results are always ordered newest first by `date_joined`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountQuery {
    /// Case-insensitive substring matched against username, email,
    /// first name, last name and phone number
    pub search: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_email_verified: Option<bool>,
    pub joined_since: Option<DateTime<Utc>>,
    pub joined_until: Option<DateTime<Utc>>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl AccountQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn with_staff(mut self, is_staff: bool) -> Self {
        self.is_staff = Some(is_staff);
        self
    }

    /// Page numbering starts at 1; page size is clamped to `1..=MAX_PAGE_SIZE`
    pub fn paginate(mut self, page: usize, page_size: usize) -> Self {
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self.offset = page.saturating_sub(1).saturating_mul(page_size);
        self.limit = Some(page_size);
        self
    }

    /// Trimmed, lowercased search term, `None` when blank
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
    }

    /// Whether an account passes every filter (pagination excluded)
    pub fn matches(&self, account: &Account) -> bool {
        if let Some(role) = self.role {
            if account.role() != role {
                return false;
            }
        }

        let flags = [
            (self.is_active, account.is_active()),
            (self.is_staff, account.is_staff()),
            (self.is_superuser, account.is_superuser()),
            (self.is_email_verified, account.is_email_verified()),
        ];

        if flags
            .iter()
            .any(|(wanted, actual)| wanted.is_some_and(|w| w != *actual))
        {
            return false;
        }

        if self.joined_since.is_some_and(|since| account.date_joined() < since) {
            return false;
        }

        if self.joined_until.is_some_and(|until| account.date_joined() > until) {
            return false;
        }

        match self.search_term() {
            Some(term) => search_fields(account)
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&term)),
            None => true,
        }
    }

    /// Sort newest first and apply offset/limit
    pub fn apply(&self, mut accounts: Vec<Account>) -> Vec<Account> {
        accounts.retain(|a| self.matches(a));
        accounts.sort_by(|a, b| b.date_joined().cmp(&a.date_joined()));

        let limit = self.limit.unwrap_or(usize::MAX);
        accounts.into_iter().skip(self.offset).take(limit).collect()
    }
}

fn search_fields(account: &Account) -> [Option<&str>; 5] {
    [
        Some(account.username()),
        account.email(),
        account.first_name(),
        account.last_name(),
        account.phone_number(),
    ]
}
