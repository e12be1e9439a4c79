//! Account domain
//!
//! Domain types and traits for the user identity model: the account entity,
//! its role, normalization and validation rules, the password policy and
//! the repository trait.

mod entity;
mod password_policy;
mod query;
mod repository;
mod role;
mod validation;

pub use entity::{Account, AccountFlags, AccountId, AccountProfile, AccountRecord};
pub use password_policy::{
    DefaultPasswordPolicy, PasswordContext, PasswordPolicy, PasswordPolicyViolation,
};
pub use query::{AccountQuery, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use repository::{email_taken, username_taken, AccountRepository};
pub use role::Role;
pub use validation::{
    normalize_email, normalize_username, optional_text, validate_email, validate_max_length,
    validate_username, AccountValidationError, MAX_BIO_LENGTH, MAX_NAME_LENGTH,
    MAX_PHONE_NUMBER_LENGTH, MAX_USERNAME_LENGTH,
};

#[cfg(test)]
pub use repository::mock::MockAccountRepository;
