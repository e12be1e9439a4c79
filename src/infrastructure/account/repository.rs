//! In-memory account repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::account::{
    email_taken, username_taken, Account, AccountId, AccountQuery, AccountRepository,
};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<AccountId, Account>,
    by_username: HashMap<String, AccountId>,
    by_email: HashMap<String, AccountId>,
}

impl Tables {
    fn check_unique(&self, account: &Account) -> Result<(), DomainError> {
        if let Some(owner) = self.by_username.get(account.username()) {
            if owner != account.id() {
                return Err(username_taken(account.username()));
            }
        }

        if let Some(email) = account.email() {
            if let Some(owner) = self.by_email.get(email) {
                if owner != account.id() {
                    return Err(email_taken(email));
                }
            }
        }

        Ok(())
    }

    fn unindex(&mut self, account: &Account) {
        self.by_username.remove(account.username());

        if let Some(email) = account.email() {
            self.by_email.remove(email);
        }
    }

    fn index(&mut self, account: &Account) {
        self.by_username
            .insert(account.username().to_string(), *account.id());

        if let Some(email) = account.email() {
            self.by_email.insert(email.to_string(), *account.id());
        }
    }
}

/// In-memory implementation of AccountRepository
///
/// A single lock guards the records and both unique indexes, so uniqueness
/// checks and writes are atomic with respect to each other.
#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn get(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.get(id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<Account>, DomainError> {
        let tables = self.tables.read().await;

        Ok(tables
            .by_username
            .get(username)
            .and_then(|id| tables.accounts.get(id))
            .cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, DomainError> {
        let tables = self.tables.read().await;

        Ok(tables
            .by_email
            .get(email)
            .and_then(|id| tables.accounts.get(id))
            .cloned())
    }

    async fn create(&self, mut account: Account) -> Result<Account, DomainError> {
        account.normalize();
        let mut tables = self.tables.write().await;

        if tables.accounts.contains_key(account.id()) {
            return Err(DomainError::conflict(format!(
                "Account with ID '{}' already exists",
                account.id()
            )));
        }

        tables.check_unique(&account)?;
        tables.index(&account);
        tables.accounts.insert(*account.id(), account.clone());

        Ok(account)
    }

    async fn update(&self, account: &Account) -> Result<Account, DomainError> {
        let mut account = account.clone();
        account.normalize();
        let mut tables = self.tables.write().await;

        let Some(previous) = tables.accounts.get(account.id()).cloned() else {
            return Err(DomainError::not_found(format!(
                "Account '{}' not found",
                account.id()
            )));
        };

        tables.check_unique(&account)?;
        tables.unindex(&previous);
        tables.index(&account);
        tables.accounts.insert(*account.id(), account.clone());

        Ok(account)
    }

    async fn list(&self, query: &AccountQuery) -> Result<Vec<Account>, DomainError> {
        let tables = self.tables.read().await;
        Ok(query.apply(tables.accounts.values().cloned().collect()))
    }

    async fn count(&self, query: &AccountQuery) -> Result<usize, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.values().filter(|a| query.matches(a)).count())
    }

    async fn record_login(&self, id: &AccountId) -> Result<(), DomainError> {
        let mut tables = self.tables.write().await;

        let account = tables
            .accounts
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found(format!("Account '{}' not found", id)))?;

        account.record_login();
        Ok(())
    }

    async fn record_activity(&self, id: &AccountId) -> Result<(), DomainError> {
        let mut tables = self.tables.write().await;

        let account = tables
            .accounts
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found(format!("Account '{}' not found", id)))?;

        account.record_activity();
        Ok(())
    }
}
