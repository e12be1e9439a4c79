//! Account normalization and validation rules

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use validator::ValidateEmail;

/// Errors that can occur during account validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AccountValidationError {
    #[error("The username must be set")]
    EmptyUsername,

    #[error("Ensure the username has at most {0} characters")]
    UsernameTooLong(usize),

    #[error("Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.")]
    InvalidUsername,

    #[error("Enter a valid email address.")]
    InvalidEmail,

    #[error("Ensure {field} has at most {max} characters")]
    FieldTooLong { field: &'static str, max: usize },

    #[error("\"{0}\" is not a valid role")]
    InvalidRole(String),
}

impl AccountValidationError {
    /// Input field the error refers to
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyUsername | Self::UsernameTooLong(_) | Self::InvalidUsername => "username",
            Self::InvalidEmail => "email",
            Self::FieldTooLong { field, .. } => field,
            Self::InvalidRole(_) => "role",
        }
    }
}

pub const MAX_USERNAME_LENGTH: usize = 30;
pub const MAX_NAME_LENGTH: usize = 30;
pub const MAX_PHONE_NUMBER_LENGTH: usize = 20;
pub const MAX_BIO_LENGTH: usize = 500;
pub const MAX_EMAIL_LENGTH: usize = 254;

static USERNAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern is valid"));

/// Trim and lowercase a username
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Validate an already-normalized username
///
/// Rules:
/// - Cannot be empty
/// - At most 30 characters
/// - Only Unicode letters, digits and `@ . + - _`
pub fn validate_username(username: &str) -> Result<(), AccountValidationError> {
    if username.is_empty() {
        return Err(AccountValidationError::EmptyUsername);
    }

    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AccountValidationError::UsernameTooLong(MAX_USERNAME_LENGTH));
    }

    if !USERNAME_PATTERN.is_match(username) {
        return Err(AccountValidationError::InvalidUsername);
    }

    Ok(())
}

/// Normalize an email address
///
/// Surrounding whitespace is removed and the domain part is lowercased. The
/// local part is kept as given. Blank input yields `None`.
pub fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim();

    if email.is_empty() {
        return None;
    }

    match email.rsplit_once('@') {
        Some((local, domain)) => Some(format!("{}@{}", local, domain.to_lowercase())),
        None => Some(email.to_string()),
    }
}

/// Validate an already-normalized email address
pub fn validate_email(email: &str) -> Result<(), AccountValidationError> {
    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(AccountValidationError::FieldTooLong {
            field: "email",
            max: MAX_EMAIL_LENGTH,
        });
    }

    if !email.validate_email() {
        return Err(AccountValidationError::InvalidEmail);
    }

    Ok(())
}

/// Coerce blank optional text to `None`, trimming surrounding whitespace
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Enforce a maximum character length on an optional field
pub fn validate_max_length(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), AccountValidationError> {
    match value {
        Some(v) if v.chars().count() > max => {
            Err(AccountValidationError::FieldTooLong { field, max })
        }
        _ => Ok(()),
    }
}
