//! Account service: factory, registration, authentication and administration

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::account::{
    email_taken, normalize_email, normalize_username, optional_text, username_taken,
    validate_email, validate_max_length, validate_username, Account, AccountFlags, AccountId,
    AccountProfile, AccountQuery, AccountRepository, AccountValidationError, PasswordContext,
    PasswordPolicy, PasswordPolicyViolation, Role, MAX_BIO_LENGTH, MAX_NAME_LENGTH,
    MAX_PHONE_NUMBER_LENGTH,
};
use crate::domain::DomainError;

use super::password::PasswordHasher;

const REQUIRED_FIELD: &str = "This field is required.";
const PASSWORD_MISMATCH: &str = "Password fields didn't match.";
const FORM_PASSWORD_MISMATCH: &str = "The two password fields didn't match.";
const WRONG_CURRENT_PASSWORD: &str =
    "Your old password was entered incorrectly. Please enter it again.";

/// Input for the account factory
///
/// Status flags left as `None` take the account defaults.
#[derive(Debug, Clone, Default)]
pub struct CreateAccountRequest {
    pub username: String,
    pub password: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_email_verified: Option<bool>,
}

impl CreateAccountRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Some(password.into()),
            ..Default::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Self-registration input, including the password confirmation
#[derive(Debug, Clone, Default)]
pub struct RegisterRequest {
    pub username: String,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password2: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
}

/// Admin add form
#[derive(Debug, Clone, Default)]
pub struct AdminCreateRequest {
    pub username: String,
    pub email: Option<String>,
    pub password1: Option<String>,
    pub password2: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
}

/// Admin change form
///
/// Carries every editable field. Dates are not part of the form and are
/// never changed by it. A non-empty `password` replaces the current one.
#[derive(Debug, Clone)]
pub struct AdminUpdateRequest {
    pub username: String,
    pub password: Option<String>,
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
}

impl AdminUpdateRequest {
    /// Prefill the form from the current state of an account
    pub fn from_account(account: &Account) -> Self {
        Self {
            username: account.username().to_string(),
            password: None,
            email: account.email().map(String::from),
            first_name: account.first_name().map(String::from),
            last_name: account.last_name().map(String::from),
            role: account.role(),
            phone_number: account.phone_number().map(String::from),
            bio: account.bio().map(String::from),
            avatar: account.avatar().map(String::from),
            is_active: account.is_active(),
            is_staff: account.is_staff(),
            is_superuser: account.is_superuser(),
            is_email_verified: account.is_email_verified(),
        }
    }
}

/// Partial profile update made by the account owner
///
/// `None` leaves a field unchanged; an empty string clears it.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
}

/// Password change made by the account owner
#[derive(Debug, Clone)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub new_password2: String,
}

/// Account service over a repository, a password hasher and a password policy
#[derive(Debug)]
pub struct AccountService<R: AccountRepository, H: PasswordHasher> {
    repository: Arc<R>,
    hasher: Arc<H>,
    policy: Arc<dyn PasswordPolicy>,
}

impl<R: AccountRepository, H: PasswordHasher> AccountService<R, H> {
    pub fn new(repository: Arc<R>, hasher: Arc<H>, policy: Arc<dyn PasswordPolicy>) -> Self {
        Self {
            repository,
            hasher,
            policy,
        }
    }

    /// Account factory
    ///
    /// Normalizes username and email, requires a non-empty password and
    /// stores only its hash. The password policy is not applied here.
    pub async fn create_account(
        &self,
        request: CreateAccountRequest,
    ) -> Result<Account, DomainError> {
        let username = normalize_username(&request.username);

        if username.is_empty() {
            return Err(DomainError::field("username", "The given username must be set"));
        }

        let password = request
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| DomainError::field("password", "The password must be set"))?;

        let profile = AccountProfile {
            email: request.email.as_deref().and_then(normalize_email),
            first_name: optional_text(request.first_name),
            last_name: optional_text(request.last_name),
            role: request.role.unwrap_or_default(),
            phone_number: optional_text(request.phone_number),
            bio: optional_text(request.bio),
        };

        let defaults = AccountFlags::default();
        let flags = AccountFlags {
            is_active: request.is_active.unwrap_or(defaults.is_active),
            is_staff: request.is_staff.unwrap_or(defaults.is_staff),
            is_superuser: request.is_superuser.unwrap_or(defaults.is_superuser),
            is_email_verified: request
                .is_email_verified
                .unwrap_or(defaults.is_email_verified),
        };

        // Validate before hashing; hashing is the expensive step
        let draft = Account::new(AccountId::generate(), username, "", profile, flags);
        validate_account(&draft)?;
        self.ensure_available(&draft).await?;

        let mut account = draft;
        account.set_password_hash(self.hasher.hash(password)?);

        let account = self.repository.create(account).await?;

        info!(
            account_id = %account.id(),
            username = %account.username(),
            role = %account.role(),
            "Created account"
        );

        Ok(account)
    }

    /// Factory variant for privileged accounts
    ///
    /// Forces staff, superuser and active status and the admin role. Any of
    /// those flags explicitly requested as false is an error.
    pub async fn create_superuser(
        &self,
        mut request: CreateAccountRequest,
    ) -> Result<Account, DomainError> {
        let flags = [
            ("is_staff", request.is_staff),
            ("is_superuser", request.is_superuser),
            ("is_active", request.is_active),
        ];

        for (flag, value) in flags {
            if value == Some(false) {
                return Err(DomainError::field(
                    flag,
                    format!("Superuser must have {}=True.", flag),
                ));
            }
        }

        request.is_staff = Some(true);
        request.is_superuser = Some(true);
        request.is_active = Some(true);
        request.role = Some(Role::Admin);

        self.create_account(request).await
    }

    /// Self-registration
    ///
    /// Checks required fields, then the confirmation, then the password
    /// policy, then hands over to the factory.
    pub async fn register(&self, request: RegisterRequest) -> Result<Account, DomainError> {
        let username = normalize_username(&request.username);
        if username.is_empty() {
            return Err(DomainError::field("username", REQUIRED_FIELD));
        }

        let password = required("password", request.password.as_deref())?;
        let password2 = required("password2", request.password2.as_deref())?;

        if password != password2 {
            return Err(DomainError::field("password", PASSWORD_MISMATCH));
        }

        let email = request.email.as_deref().and_then(normalize_email);
        let first_name = optional_text(request.first_name);
        let last_name = optional_text(request.last_name);

        let context = PasswordContext {
            username: Some(&username),
            email: email.as_deref(),
            first_name: first_name.as_deref(),
            last_name: last_name.as_deref(),
        };
        self.check_password("password", password, &context)?;

        self.create_account(CreateAccountRequest {
            username,
            password: Some(password.to_string()),
            email,
            first_name,
            last_name,
            role: request.role,
            phone_number: request.phone_number,
            bio: request.bio,
            ..Default::default()
        })
        .await
    }

    /// Check credentials against the normalized username
    ///
    /// Returns `None` for unknown, inactive or wrong-password accounts alike.
    /// A successful check records the login.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Account>, DomainError> {
        let username = normalize_username(username);

        let Some(account) = self.repository.get_by_username(&username).await? else {
            debug!(username = %username, "Login for unknown username");
            return Ok(None);
        };

        if !account.is_active() {
            debug!(account_id = %account.id(), "Login for inactive account");
            return Ok(None);
        }

        if !self.hasher.verify(password, account.password_hash()) {
            debug!(account_id = %account.id(), "Login with wrong password");
            return Ok(None);
        }

        self.repository.record_login(account.id()).await?;
        info!(account_id = %account.id(), username = %account.username(), "Account logged in");

        self.repository.get(account.id()).await
    }

    pub async fn get(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        self.repository.get(id).await
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<Account>, DomainError> {
        self.repository
            .get_by_username(&normalize_username(username))
            .await
    }

    pub async fn list(&self, query: &AccountQuery) -> Result<Vec<Account>, DomainError> {
        self.repository.list(query).await
    }

    pub async fn count(&self, query: &AccountQuery) -> Result<usize, DomainError> {
        self.repository.count(query).await
    }

    /// Admin add form: password1 and password2 must match and pass the policy
    pub async fn admin_create(&self, request: AdminCreateRequest) -> Result<Account, DomainError> {
        let username = normalize_username(&request.username);
        if username.is_empty() {
            return Err(DomainError::field("username", REQUIRED_FIELD));
        }

        let password1 = required("password1", request.password1.as_deref())?;
        let password2 = required("password2", request.password2.as_deref())?;

        if password1 != password2 {
            return Err(DomainError::field("password2", FORM_PASSWORD_MISMATCH));
        }

        let email = request.email.as_deref().and_then(normalize_email);
        let first_name = optional_text(request.first_name);
        let last_name = optional_text(request.last_name);

        let context = PasswordContext {
            username: Some(&username),
            email: email.as_deref(),
            first_name: first_name.as_deref(),
            last_name: last_name.as_deref(),
        };
        self.check_password("password2", password2, &context)?;

        self.create_account(CreateAccountRequest {
            username,
            password: Some(password1.to_string()),
            email,
            first_name,
            last_name,
            role: request.role,
            ..Default::default()
        })
        .await
    }

    /// Admin change form; username and email are re-normalized on save
    pub async fn admin_update(
        &self,
        id: &AccountId,
        request: AdminUpdateRequest,
    ) -> Result<Account, DomainError> {
        let mut account = self.require(id).await?;

        account.set_username(normalize_username(&request.username));
        account.set_email(request.email.as_deref());
        account.set_first_name(optional_text(request.first_name));
        account.set_last_name(optional_text(request.last_name));
        account.set_role(request.role);
        account.set_phone_number(optional_text(request.phone_number));
        account.set_bio(optional_text(request.bio));
        account.set_avatar(optional_text(request.avatar));
        account.set_staff(request.is_staff);
        account.set_superuser(request.is_superuser);
        account.set_email_verified(request.is_email_verified);

        if request.is_active {
            account.activate();
        } else {
            account.deactivate();
        }

        validate_account(&account)?;

        if let Some(password) = request.password.as_deref().filter(|p| !p.is_empty()) {
            self.check_password("password", password, &password_context(&account))?;
            account.set_password_hash(self.hasher.hash(password)?);
        }

        self.ensure_available(&account).await?;
        let account = self.repository.update(&account).await?;

        info!(account_id = %account.id(), username = %account.username(), "Account updated by admin");
        Ok(account)
    }

    /// Owner profile update; role and status flags are not editable here
    pub async fn update_profile(
        &self,
        id: &AccountId,
        update: ProfileUpdate,
    ) -> Result<Account, DomainError> {
        let mut account = self.require(id).await?;

        if let Some(email) = update.email.as_deref() {
            let email = normalize_email(email);

            if email.as_deref() != account.email() {
                account.set_email(email.as_deref());
                account.set_email_verified(false);
            }
        }

        if let Some(first_name) = update.first_name {
            account.set_first_name(optional_text(Some(first_name)));
        }

        if let Some(last_name) = update.last_name {
            account.set_last_name(optional_text(Some(last_name)));
        }

        if let Some(phone_number) = update.phone_number {
            account.set_phone_number(optional_text(Some(phone_number)));
        }

        if let Some(bio) = update.bio {
            account.set_bio(optional_text(Some(bio)));
        }

        validate_account(&account)?;
        self.ensure_available(&account).await?;

        self.repository.update(&account).await
    }

    /// Owner password change
    pub async fn change_password(
        &self,
        id: &AccountId,
        request: ChangePasswordRequest,
    ) -> Result<Account, DomainError> {
        let mut account = self.require(id).await?;

        if !self
            .hasher
            .verify(&request.current_password, account.password_hash())
        {
            return Err(DomainError::field("current_password", WRONG_CURRENT_PASSWORD));
        }

        if request.new_password != request.new_password2 {
            return Err(DomainError::field("new_password2", FORM_PASSWORD_MISMATCH));
        }

        self.check_password(
            "new_password",
            &request.new_password,
            &password_context(&account),
        )?;

        account.set_password_hash(self.hasher.hash(&request.new_password)?);
        let account = self.repository.update(&account).await?;

        info!(account_id = %account.id(), "Password changed");
        Ok(account)
    }

    /// Set or clear the stored avatar reference
    pub async fn set_avatar(
        &self,
        id: &AccountId,
        avatar: Option<String>,
    ) -> Result<Account, DomainError> {
        let mut account = self.require(id).await?;
        account.set_avatar(avatar);
        self.repository.update(&account).await
    }

    pub async fn deactivate(&self, id: &AccountId) -> Result<Account, DomainError> {
        let mut account = self.require(id).await?;
        account.deactivate();

        let account = self.repository.update(&account).await?;
        info!(account_id = %account.id(), "Account deactivated");
        Ok(account)
    }

    pub async fn activate(&self, id: &AccountId) -> Result<Account, DomainError> {
        let mut account = self.require(id).await?;
        account.activate();

        let account = self.repository.update(&account).await?;
        info!(account_id = %account.id(), "Account activated");
        Ok(account)
    }

    /// Stamp `last_activity` for an authenticated request
    pub async fn record_activity(&self, id: &AccountId) -> Result<(), DomainError> {
        self.repository.record_activity(id).await
    }

    async fn require(&self, id: &AccountId) -> Result<Account, DomainError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Account '{}' not found", id)))
    }

    /// Report a taken username or email before the write reaches storage
    async fn ensure_available(&self, account: &Account) -> Result<(), DomainError> {
        if let Some(owner) = self.repository.get_by_username(account.username()).await? {
            if owner.id() != account.id() {
                return Err(username_taken(account.username()));
            }
        }

        if let Some(email) = account.email() {
            if let Some(owner) = self.repository.get_by_email(email).await? {
                if owner.id() != account.id() {
                    return Err(email_taken(email));
                }
            }
        }

        Ok(())
    }

    fn check_password(
        &self,
        field: &str,
        password: &str,
        context: &PasswordContext<'_>,
    ) -> Result<(), DomainError> {
        self.policy
            .validate(password, context)
            .map_err(|violations| policy_error(field, &violations))
    }
}

/// Parse an account ID from a path or token value
pub fn parse_account_id(id: &str) -> Result<AccountId, DomainError> {
    id.parse()
        .map_err(|e| DomainError::invalid_id(format!("'{}' is not a valid account ID: {}", id, e)))
}

fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, DomainError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DomainError::field(field, REQUIRED_FIELD))
}

fn invalid_field(error: AccountValidationError) -> DomainError {
    DomainError::field(error.field(), error.to_string())
}

fn policy_error(field: &str, violations: &[PasswordPolicyViolation]) -> DomainError {
    let message = violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");

    DomainError::field(field, message)
}

fn password_context(account: &Account) -> PasswordContext<'_> {
    PasswordContext {
        username: Some(account.username()),
        email: account.email(),
        first_name: account.first_name(),
        last_name: account.last_name(),
    }
}

fn validate_account(account: &Account) -> Result<(), DomainError> {
    validate_username(account.username()).map_err(invalid_field)?;

    if let Some(email) = account.email() {
        validate_email(email).map_err(invalid_field)?;
    }

    let lengths = [
        ("first_name", account.first_name(), MAX_NAME_LENGTH),
        ("last_name", account.last_name(), MAX_NAME_LENGTH),
        ("phone_number", account.phone_number(), MAX_PHONE_NUMBER_LENGTH),
        ("bio", account.bio(), MAX_BIO_LENGTH),
    ];

    for (field, value, max) in lengths {
        validate_max_length(field, value, max).map_err(invalid_field)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{DefaultPasswordPolicy, MockAccountRepository};
    use crate::infrastructure::account::password::Argon2Hasher;
    use crate::infrastructure::account::repository::InMemoryAccountRepository;

    const STRONG: &str = "Str0ng!pass";

    fn create_service() -> AccountService<InMemoryAccountRepository, Argon2Hasher> {
        AccountService::new(
            Arc::new(InMemoryAccountRepository::new()),
            Arc::new(Argon2Hasher::new()),
            Arc::new(DefaultPasswordPolicy::new()),
        )
    }

    fn register_request(username: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: Some(STRONG.to_string()),
            password2: Some(STRONG.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_account_normalizes_username() {
        let service = create_service();

        for (input, stored) in [("  Alice ", "alice"), ("BOB", "bob"), ("Zoë.K", "zoë.k")] {
            let account = service
                .create_account(CreateAccountRequest::new(input, "secret"))
                .await
                .unwrap();
            assert_eq!(account.username(), stored);
        }
    }

    #[tokio::test]
    async fn test_create_account_hashes_password() {
        let service = create_service();

        let account = service
            .create_account(CreateAccountRequest::new("alice", "secret"))
            .await
            .unwrap();

        assert_ne!(account.password_hash(), "secret");
        assert!(account.password_hash().starts_with("$argon2"));
        assert!(account.is_active());
        assert_eq!(account.role(), Role::SoftwareEngineer);
    }

    #[tokio::test]
    async fn test_create_account_requires_password() {
        let service = create_service();

        let missing = CreateAccountRequest {
            username: "alice".to_string(),
            ..Default::default()
        };
        let err = service.create_account(missing).await.unwrap_err();
        assert_eq!(err.field_name(), Some("password"));

        let empty = CreateAccountRequest::new("alice", "");
        let err = service.create_account(empty).await.unwrap_err();
        assert_eq!(err.field_name(), Some("password"));
    }

    #[tokio::test]
    async fn test_create_account_requires_username() {
        let service = create_service();

        let err = service
            .create_account(CreateAccountRequest::new("   ", "secret"))
            .await
            .unwrap_err();

        assert_eq!(err.field_name(), Some("username"));
    }

    #[tokio::test]
    async fn test_create_account_rejects_invalid_username_and_email() {
        let service = create_service();

        let err = service
            .create_account(CreateAccountRequest::new("bad name!", "secret"))
            .await
            .unwrap_err();
        assert_eq!(err.field_name(), Some("username"));

        let err = service
            .create_account(CreateAccountRequest::new("alice", "secret").with_email("not-an-email"))
            .await
            .unwrap_err();
        assert_eq!(err.field_name(), Some("email"));
    }

    #[tokio::test]
    async fn test_create_account_normalizes_email() {
        let service = create_service();

        let account = service
            .create_account(
                CreateAccountRequest::new("alice", "secret").with_email(" Alice@EXAMPLE.COM "),
            )
            .await
            .unwrap();

        assert_eq!(account.email(), Some("Alice@example.com"));
    }

    #[tokio::test]
    async fn test_duplicate_email_after_normalization() {
        let service = create_service();

        service
            .create_account(CreateAccountRequest::new("alice", "secret").with_email("a@example.com"))
            .await
            .unwrap();

        let err = service
            .create_account(CreateAccountRequest::new("bob", "secret").with_email("a@EXAMPLE.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Conflict { .. }));
        assert_eq!(err.field_name(), Some("email"));
    }

    #[tokio::test]
    async fn test_duplicate_username_case_insensitive() {
        let service = create_service();

        service
            .create_account(CreateAccountRequest::new("alice", "secret"))
            .await
            .unwrap();

        let err = service
            .create_account(CreateAccountRequest::new("ALICE", "secret"))
            .await
            .unwrap_err();

        assert_eq!(err.field_name(), Some("username"));
    }

    #[tokio::test]
    async fn test_create_superuser_forces_flags() {
        let service = create_service();

        let account = service
            .create_superuser(CreateAccountRequest::new("root", "secret"))
            .await
            .unwrap();

        assert!(account.is_superuser());
        assert!(account.is_staff());
        assert!(account.is_active());
        assert_eq!(account.role(), Role::Admin);
    }

    #[tokio::test]
    async fn test_create_superuser_rejects_explicit_false() {
        let service = create_service();

        let request = CreateAccountRequest {
            is_superuser: Some(false),
            ..CreateAccountRequest::new("root", "secret")
        };
        let err = service.create_superuser(request).await.unwrap_err();
        assert_eq!(err.to_string(), "is_superuser: Superuser must have is_superuser=True.");

        let request = CreateAccountRequest {
            is_staff: Some(false),
            ..CreateAccountRequest::new("root", "secret")
        };
        let err = service.create_superuser(request).await.unwrap_err();
        assert_eq!(err.field_name(), Some("is_staff"));
    }

    #[tokio::test]
    async fn test_create_superuser_requires_password() {
        let service = create_service();

        let request = CreateAccountRequest {
            username: "root".to_string(),
            ..Default::default()
        };

        let err = service.create_superuser(request).await.unwrap_err();
        assert_eq!(err.field_name(), Some("password"));
    }

    #[tokio::test]
    async fn test_register_normalizes_username() {
        let service = create_service();

        let account = service.register(register_request("  Alice ")).await.unwrap();

        assert_eq!(account.username(), "alice");
        assert_eq!(account.role(), Role::SoftwareEngineer);
    }

    #[tokio::test]
    async fn test_register_password_mismatch() {
        let service = create_service();

        let request = RegisterRequest {
            password2: Some("Different!pass1".to_string()),
            ..register_request("alice")
        };

        let err = service.register(request).await.unwrap_err();
        assert_eq!(err.field_name(), Some("password"));
        assert!(err.to_string().contains("didn't match"));
    }

    #[tokio::test]
    async fn test_register_applies_password_policy() {
        let service = create_service();

        let request = RegisterRequest {
            password: Some("12345".to_string()),
            password2: Some("12345".to_string()),
            ..register_request("alice")
        };

        let err = service.register(request).await.unwrap_err();
        assert_eq!(err.field_name(), Some("password"));
        assert!(err.to_string().contains("too short"));
        assert!(err.to_string().contains("entirely numeric"));
    }

    #[tokio::test]
    async fn test_register_rejects_password_similar_to_username() {
        let service = create_service();

        let request = RegisterRequest {
            password: Some("margaretha1".to_string()),
            password2: Some("margaretha1".to_string()),
            ..register_request("margaretha")
        };

        let err = service.register(request).await.unwrap_err();
        assert_eq!(err.field_name(), Some("password"));
    }

    #[tokio::test]
    async fn test_register_coerces_empty_optionals() {
        let service = create_service();

        let request = RegisterRequest {
            email: Some(String::new()),
            first_name: Some(String::new()),
            last_name: Some("  ".to_string()),
            phone_number: Some(String::new()),
            bio: Some(String::new()),
            role: Some(Role::DataEngineer),
            ..register_request("alice")
        };

        let account = service.register(request).await.unwrap();

        assert!(account.email().is_none());
        assert!(account.first_name().is_none());
        assert!(account.last_name().is_none());
        assert!(account.phone_number().is_none());
        assert!(account.bio().is_none());
        assert_eq!(account.role(), Role::DataEngineer);
    }

    #[tokio::test]
    async fn test_register_requires_fields() {
        let service = create_service();

        let request = RegisterRequest {
            password2: None,
            ..register_request("alice")
        };

        let err = service.register(request).await.unwrap_err();
        assert_eq!(err.field_name(), Some("password2"));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let service = create_service();
        service.register(register_request("alice")).await.unwrap();

        let account = service.authenticate(" ALICE ", STRONG).await.unwrap().unwrap();
        assert_eq!(account.username(), "alice");
        assert!(account.last_login().is_some());

        assert!(service.authenticate("alice", "wrong").await.unwrap().is_none());
        assert!(service.authenticate("nobody", STRONG).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_authenticate_inactive_account() {
        let service = create_service();
        let account = service.register(register_request("alice")).await.unwrap();

        service.deactivate(account.id()).await.unwrap();

        assert!(service.authenticate("alice", STRONG).await.unwrap().is_none());

        service.activate(account.id()).await.unwrap();
        assert!(service.authenticate("alice", STRONG).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_admin_create_password_mismatch() {
        let service = create_service();

        let request = AdminCreateRequest {
            username: "alice".to_string(),
            password1: Some(STRONG.to_string()),
            password2: Some("other".to_string()),
            ..Default::default()
        };

        let err = service.admin_create(request).await.unwrap_err();
        assert_eq!(err.field_name(), Some("password2"));
    }

    #[tokio::test]
    async fn test_admin_create() {
        let service = create_service();

        let request = AdminCreateRequest {
            username: "Alice".to_string(),
            email: Some("alice@Example.com".to_string()),
            password1: Some(STRONG.to_string()),
            password2: Some(STRONG.to_string()),
            role: Some(Role::ProductManager),
            ..Default::default()
        };

        let account = service.admin_create(request).await.unwrap();
        assert_eq!(account.username(), "alice");
        assert_eq!(account.email(), Some("alice@example.com"));
        assert_eq!(account.role(), Role::ProductManager);
    }

    #[tokio::test]
    async fn test_admin_update_renormalizes() {
        let service = create_service();
        let account = service.register(register_request("alice")).await.unwrap();

        let mut form = AdminUpdateRequest::from_account(&account);
        form.username = "  ALICIA ".to_string();
        form.email = Some("Alicia@EXAMPLE.com".to_string());
        form.is_staff = true;
        form.first_name = Some(String::new());

        let updated = service.admin_update(account.id(), form).await.unwrap();

        assert_eq!(updated.username(), "alicia");
        assert_eq!(updated.email(), Some("Alicia@example.com"));
        assert!(updated.is_staff());
        assert!(updated.first_name().is_none());
        assert_eq!(updated.date_joined(), account.date_joined());
    }

    #[tokio::test]
    async fn test_admin_update_sets_password() {
        let service = create_service();
        let account = service.register(register_request("alice")).await.unwrap();

        let mut form = AdminUpdateRequest::from_account(&account);
        form.password = Some("An0ther!secret".to_string());
        service.admin_update(account.id(), form).await.unwrap();

        assert!(service.authenticate("alice", STRONG).await.unwrap().is_none());
        assert!(service
            .authenticate("alice", "An0ther!secret")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_admin_update_missing_account() {
        let service = create_service();
        let account = service.register(register_request("alice")).await.unwrap();
        let form = AdminUpdateRequest::from_account(&account);

        let err = service
            .admin_update(&AccountId::generate(), form)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_profile_resets_email_verification() {
        let service = create_service();
        let account = service.register(register_request("alice")).await.unwrap();

        let mut form = AdminUpdateRequest::from_account(&account);
        form.email = Some("alice@example.com".to_string());
        form.is_email_verified = true;
        service.admin_update(account.id(), form).await.unwrap();

        // Same address after normalization keeps the verification
        let update = ProfileUpdate {
            email: Some("alice@EXAMPLE.com".to_string()),
            bio: Some("Hello".to_string()),
            ..Default::default()
        };
        let updated = service.update_profile(account.id(), update).await.unwrap();
        assert!(updated.is_email_verified());
        assert_eq!(updated.bio(), Some("Hello"));

        let update = ProfileUpdate {
            email: Some("new@example.com".to_string()),
            ..Default::default()
        };
        let updated = service.update_profile(account.id(), update).await.unwrap();
        assert_eq!(updated.email(), Some("new@example.com"));
        assert!(!updated.is_email_verified());
    }

    #[tokio::test]
    async fn test_update_profile_validates_lengths() {
        let service = create_service();
        let account = service.register(register_request("alice")).await.unwrap();

        let update = ProfileUpdate {
            phone_number: Some("1".repeat(21)),
            ..Default::default()
        };

        let err = service.update_profile(account.id(), update).await.unwrap_err();
        assert_eq!(err.field_name(), Some("phone_number"));
    }

    #[tokio::test]
    async fn test_change_password() {
        let service = create_service();
        let account = service.register(register_request("alice")).await.unwrap();

        let wrong_current = ChangePasswordRequest {
            current_password: "nope".to_string(),
            new_password: "N3w!password".to_string(),
            new_password2: "N3w!password".to_string(),
        };
        let err = service
            .change_password(account.id(), wrong_current)
            .await
            .unwrap_err();
        assert_eq!(err.field_name(), Some("current_password"));

        let weak = ChangePasswordRequest {
            current_password: STRONG.to_string(),
            new_password: "password".to_string(),
            new_password2: "password".to_string(),
        };
        let err = service.change_password(account.id(), weak).await.unwrap_err();
        assert_eq!(err.field_name(), Some("new_password"));

        let ok = ChangePasswordRequest {
            current_password: STRONG.to_string(),
            new_password: "N3w!password".to_string(),
            new_password2: "N3w!password".to_string(),
        };
        service.change_password(account.id(), ok).await.unwrap();

        assert!(service
            .authenticate("alice", "N3w!password")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_set_avatar_and_activity() {
        let service = create_service();
        let account = service.register(register_request("alice")).await.unwrap();

        let path = format!("avatars/user_{0}/avatar_{0}.png", account.id());
        let updated = service
            .set_avatar(account.id(), Some(path.clone()))
            .await
            .unwrap();
        assert_eq!(updated.avatar(), Some(path.as_str()));

        service.record_activity(account.id()).await.unwrap();
        let fetched = service.get(account.id()).await.unwrap().unwrap();
        assert!(fetched.last_activity().is_some());
    }

    #[tokio::test]
    async fn test_list_with_query() {
        let service = create_service();
        service.register(register_request("alice")).await.unwrap();
        service.register(register_request("bob")).await.unwrap();
        service
            .create_superuser(CreateAccountRequest::new("root", "secret"))
            .await
            .unwrap();

        let all = service.list(&AccountQuery::new()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].username(), "root");

        let admins = AccountQuery::new().with_role(Role::Admin);
        assert_eq!(service.count(&admins).await.unwrap(), 1);

        let search = AccountQuery::new().with_search("BO");
        let found = service.list(&search).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username(), "bob");
    }

    #[tokio::test]
    async fn test_repository_failure_propagates() {
        let repository = Arc::new(MockAccountRepository::new());
        let service = AccountService::new(
            repository.clone(),
            Arc::new(Argon2Hasher::new()),
            Arc::new(DefaultPasswordPolicy::new()),
        );

        repository.set_should_fail(true).await;

        let err = service
            .create_account(CreateAccountRequest::new("alice", "secret"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Storage { .. }));
    }

    #[test]
    fn test_parse_account_id() {
        let id = AccountId::generate();
        assert_eq!(parse_account_id(&id.to_string()).unwrap(), id);

        let err = parse_account_id("nope").unwrap_err();
        assert!(matches!(err, DomainError::InvalidId { .. }));
    }
}
