//! Account repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{Account, AccountId};
use super::query::AccountQuery;
use crate::domain::DomainError;

/// Repository trait for account storage
///
/// Implementations enforce uniqueness of `username` and of `email` when
/// present, reporting violations as field-scoped conflicts. There is no
/// delete operation: accounts are deactivated instead.
#[async_trait]
pub trait AccountRepository: Send + Sync + Debug {
    /// Get an account by its ID
    async fn get(&self, id: &AccountId) -> Result<Option<Account>, DomainError>;

    /// Get an account by its normalized username
    async fn get_by_username(&self, username: &str) -> Result<Option<Account>, DomainError>;

    /// Get an account by its normalized email
    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, DomainError>;

    /// Persist a new account
    async fn create(&self, account: Account) -> Result<Account, DomainError>;

    /// Persist changes to an existing account
    async fn update(&self, account: &Account) -> Result<Account, DomainError>;

    /// List accounts matching the query, newest first
    async fn list(&self, query: &AccountQuery) -> Result<Vec<Account>, DomainError>;

    /// Count accounts matching the query (pagination ignored)
    async fn count(&self, query: &AccountQuery) -> Result<usize, DomainError>;

    /// Set `last_login` to now
    async fn record_login(&self, id: &AccountId) -> Result<(), DomainError>;

    /// Set `last_activity` to now
    async fn record_activity(&self, id: &AccountId) -> Result<(), DomainError>;

    /// Check if a username is taken
    async fn username_exists(&self, username: &str) -> Result<bool, DomainError> {
        Ok(self.get_by_username(username).await?.is_some())
    }

    /// Check if an email is taken
    async fn email_exists(&self, email: &str) -> Result<bool, DomainError> {
        Ok(self.get_by_email(email).await?.is_some())
    }
}

/// Conflict error for a taken username
pub fn username_taken(username: &str) -> DomainError {
    DomainError::field_conflict(
        "username",
        format!("An account with username '{}' already exists.", username),
    )
}

/// Conflict error for a taken email
pub fn email_taken(email: &str) -> DomainError {
    DomainError::field_conflict(
        "email",
        format!("An account with email '{}' already exists.", email),
    )
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Mock account repository for testing
    #[derive(Debug, Default)]
    pub struct MockAccountRepository {
        accounts: Arc<RwLock<HashMap<AccountId, Account>>>,
        should_fail: Arc<RwLock<bool>>,
    }

    impl MockAccountRepository {
        /// Create a new mock repository
        pub fn new() -> Self {
            Self::default()
        }

        /// Set whether operations should fail
        pub async fn set_should_fail(&self, fail: bool) {
            *self.should_fail.write().await = fail;
        }

        async fn check_should_fail(&self) -> Result<(), DomainError> {
            if *self.should_fail.read().await {
                return Err(DomainError::storage("Mock repository configured to fail"));
            }
            Ok(())
        }

        fn check_unique(
            accounts: &HashMap<AccountId, Account>,
            account: &Account,
        ) -> Result<(), DomainError> {
            let others = accounts.values().filter(|a| a.id() != account.id());

            for other in others {
                if other.username() == account.username() {
                    return Err(username_taken(account.username()));
                }

                if let (Some(a), Some(b)) = (other.email(), account.email()) {
                    if a == b {
                        return Err(email_taken(b));
                    }
                }
            }

            Ok(())
        }
    }

    #[async_trait]
    impl AccountRepository for MockAccountRepository {
        async fn get(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
            self.check_should_fail().await?;
            Ok(self.accounts.read().await.get(id).cloned())
        }

        async fn get_by_username(&self, username: &str) -> Result<Option<Account>, DomainError> {
            self.check_should_fail().await?;
            let accounts = self.accounts.read().await;
            Ok(accounts.values().find(|a| a.username() == username).cloned())
        }

        async fn get_by_email(&self, email: &str) -> Result<Option<Account>, DomainError> {
            self.check_should_fail().await?;
            let accounts = self.accounts.read().await;
            Ok(accounts.values().find(|a| a.email() == Some(email)).cloned())
        }

        async fn create(&self, account: Account) -> Result<Account, DomainError> {
            self.check_should_fail().await?;
            let mut accounts = self.accounts.write().await;

            if accounts.contains_key(account.id()) {
                return Err(DomainError::conflict(format!(
                    "Account with ID '{}' already exists",
                    account.id()
                )));
            }

            Self::check_unique(&accounts, &account)?;

            accounts.insert(*account.id(), account.clone());
            Ok(account)
        }

        async fn update(&self, account: &Account) -> Result<Account, DomainError> {
            self.check_should_fail().await?;
            let mut accounts = self.accounts.write().await;

            if !accounts.contains_key(account.id()) {
                return Err(DomainError::not_found(format!(
                    "Account '{}' not found",
                    account.id()
                )));
            }

            Self::check_unique(&accounts, account)?;

            accounts.insert(*account.id(), account.clone());
            Ok(account.clone())
        }

        async fn list(&self, query: &AccountQuery) -> Result<Vec<Account>, DomainError> {
            self.check_should_fail().await?;
            let accounts = self.accounts.read().await;
            Ok(query.apply(accounts.values().cloned().collect()))
        }

        async fn count(&self, query: &AccountQuery) -> Result<usize, DomainError> {
            self.check_should_fail().await?;
            let accounts = self.accounts.read().await;
            Ok(accounts.values().filter(|a| query.matches(a)).count())
        }

        async fn record_login(&self, id: &AccountId) -> Result<(), DomainError> {
            self.check_should_fail().await?;
            let mut accounts = self.accounts.write().await;

            match accounts.get_mut(id) {
                Some(account) => {
                    account.record_login();
                    Ok(())
                }
                None => Err(DomainError::not_found(format!("Account '{}' not found", id))),
            }
        }

        async fn record_activity(&self, id: &AccountId) -> Result<(), DomainError> {
            self.check_should_fail().await?;
            let mut accounts = self.accounts.write().await;

            match accounts.get_mut(id) {
                Some(account) => {
                    account.record_activity();
                    Ok(())
                }
                None => Err(DomainError::not_found(format!("Account '{}' not found", id))),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::domain::account::{AccountFlags, AccountProfile};

        fn create_test_account(username: &str, email: Option<&str>) -> Account {
            let profile = AccountProfile {
                email: email.map(String::from),
                ..Default::default()
            };
            Account::new(
                AccountId::generate(),
                username,
                "hashed_password",
                profile,
                AccountFlags::default(),
            )
        }

        #[tokio::test]
        async fn test_create_and_get() {
            let repo = MockAccountRepository::new();
            let account = create_test_account("alice", None);

            repo.create(account.clone()).await.unwrap();

            let retrieved = repo.get(account.id()).await.unwrap().unwrap();
            assert_eq!(retrieved.username(), "alice");
        }

        #[tokio::test]
        async fn test_username_uniqueness() {
            let repo = MockAccountRepository::new();

            repo.create(create_test_account("alice", None)).await.unwrap();

            let err = repo
                .create(create_test_account("alice", None))
                .await
                .unwrap_err();
            assert_eq!(err.field_name(), Some("username"));
        }

        #[tokio::test]
        async fn test_email_uniqueness_only_when_present() {
            let repo = MockAccountRepository::new();

            repo.create(create_test_account("alice", None)).await.unwrap();
            repo.create(create_test_account("bob", None)).await.unwrap();
            repo.create(create_test_account("carol", Some("c@example.com")))
                .await
                .unwrap();

            let err = repo
                .create(create_test_account("dave", Some("c@EXAMPLE.com")))
                .await
                .unwrap_err();
            assert_eq!(err.field_name(), Some("email"));
        }

        #[tokio::test]
        async fn test_get_by_email() {
            let repo = MockAccountRepository::new();
            repo.create(create_test_account("alice", Some("alice@example.com")))
                .await
                .unwrap();

            assert!(repo.email_exists("alice@example.com").await.unwrap());
            assert!(!repo.email_exists("bob@example.com").await.unwrap());
        }

        #[tokio::test]
        async fn test_should_fail() {
            let repo = MockAccountRepository::new();
            repo.set_should_fail(true).await;

            let result = repo.create(create_test_account("alice", None)).await;
            assert!(matches!(result, Err(DomainError::Storage { .. })));
        }

        #[tokio::test]
        async fn test_record_login_and_activity() {
            let repo = MockAccountRepository::new();
            let account = create_test_account("alice", None);
            repo.create(account.clone()).await.unwrap();

            repo.record_login(account.id()).await.unwrap();
            repo.record_activity(account.id()).await.unwrap();

            let retrieved = repo.get(account.id()).await.unwrap().unwrap();
            assert!(retrieved.last_login().is_some());
            assert!(retrieved.last_activity().is_some());

            let missing = repo.record_login(&AccountId::generate()).await;
            assert!(matches!(missing, Err(DomainError::NotFound { .. })));
        }
    }
}
