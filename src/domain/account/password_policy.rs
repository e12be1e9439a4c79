//! Password strength policy applied at registration and password change

use std::fmt::Debug;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// A single password policy violation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PasswordPolicyViolation {
    #[error("This password is too short. It must contain at least {0} characters.")]
    TooShort(usize),

    #[error("This password is too long. It must contain at most {0} characters.")]
    TooLong(usize),

    #[error("This password is entirely numeric.")]
    EntirelyNumeric,

    #[error("This password is too common.")]
    TooCommon,

    #[error("The password is too similar to the {0}.")]
    TooSimilar(&'static str),
}

/// Attributes of the account the password belongs to, used for similarity checks
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordContext<'a> {
    pub username: Option<&'a str>,
    pub email: Option<&'a str>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
}

/// Checks candidate passwords against a strength policy
pub trait PasswordPolicy: Send + Sync + Debug {
    /// Return every violation; an empty list means the password is accepted
    fn check(&self, password: &str, context: &PasswordContext<'_>) -> Vec<PasswordPolicyViolation>;

    /// Convenience wrapper returning the violations as an error
    fn validate(
        &self,
        password: &str,
        context: &PasswordContext<'_>,
    ) -> Result<(), Vec<PasswordPolicyViolation>> {
        let violations = self.check(password, context);

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_SIMILARITY: f64 = 0.7;

const COMMON_PASSWORDS: &[&str] = &[
    "123456", "123456789", "12345678", "1234567890", "password", "password1",
    "password123", "qwerty", "qwerty123", "qwertyuiop", "abc123", "111111",
    "123123", "iloveyou", "admin", "admin123", "welcome", "welcome1", "letmein",
    "monkey", "dragon", "football", "baseball", "sunshine", "princess",
    "trustno1", "master", "shadow", "superman", "batman", "michael", "jennifer",
    "starwars", "whatever", "freedom", "passw0rd", "p@ssw0rd", "p@ssword",
    "changeme", "secret", "default", "login", "1q2w3e4r", "1qaz2wsx",
    "zaq12wsx", "asdfghjkl", "asdfasdf", "computer", "internet", "hello123",
];

static ATTRIBUTE_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\W+").expect("split pattern is valid"));

/// Default policy: length bounds, not numeric, not common, not similar to account attributes
#[derive(Debug, Clone)]
pub struct DefaultPasswordPolicy {
    min_length: usize,
    max_length: usize,
}

impl DefaultPasswordPolicy {
    pub fn new() -> Self {
        Self {
            min_length: MIN_PASSWORD_LENGTH,
            max_length: MAX_PASSWORD_LENGTH,
        }
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }
}

impl Default for DefaultPasswordPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordPolicy for DefaultPasswordPolicy {
    fn check(&self, password: &str, context: &PasswordContext<'_>) -> Vec<PasswordPolicyViolation> {
        let mut violations = Vec::new();
        let length = password.chars().count();

        if length < self.min_length {
            violations.push(PasswordPolicyViolation::TooShort(self.min_length));
        }

        if length > self.max_length {
            violations.push(PasswordPolicyViolation::TooLong(self.max_length));
        }

        if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
            violations.push(PasswordPolicyViolation::EntirelyNumeric);
        }

        let lowered = password.to_lowercase();

        if COMMON_PASSWORDS.contains(&lowered.trim()) {
            violations.push(PasswordPolicyViolation::TooCommon);
        }

        if let Some(attribute) = similar_attribute(&lowered, context) {
            violations.push(PasswordPolicyViolation::TooSimilar(attribute));
        }

        violations
    }
}

fn similar_attribute(password: &str, context: &PasswordContext<'_>) -> Option<&'static str> {
    let attributes = [
        ("username", context.username),
        ("email address", context.email),
        ("first name", context.first_name),
        ("last name", context.last_name),
    ];

    for (name, value) in attributes {
        let Some(value) = value else { continue };
        let value = value.to_lowercase();

        let mut parts: Vec<&str> = ATTRIBUTE_SPLIT.split(&value).collect();
        parts.push(&value);

        let similar = parts
            .into_iter()
            .filter(|part| part.chars().count() >= 3)
            .any(|part| similarity_ratio(password, part) >= MAX_SIMILARITY);

        if similar {
            return Some(name);
        }
    }

    None
}

/// Similarity in `[0, 1]`: twice the longest common subsequence over the total length
fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();

    if total == 0 {
        return 1.0;
    }

    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];

    for ca in &a {
        for (j, cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                current[j].max(previous[j + 1])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    2.0 * previous[b.len()] as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> DefaultPasswordPolicy {
        DefaultPasswordPolicy::new()
    }

    #[test]
    fn test_strong_password_accepted() {
        let context = PasswordContext {
            username: Some("alice"),
            ..Default::default()
        };
        assert!(policy().validate("Str0ng!pass", &context).is_ok());
    }

    #[test]
    fn test_too_short() {
        let violations = policy().check("Ab1!", &PasswordContext::default());
        assert!(violations.contains(&PasswordPolicyViolation::TooShort(8)));
    }

    #[test]
    fn test_too_long() {
        let violations = policy().check(&"x9!".repeat(50), &PasswordContext::default());
        assert!(violations.contains(&PasswordPolicyViolation::TooLong(128)));
    }

    #[test]
    fn test_entirely_numeric() {
        let violations = policy().check("9081726354", &PasswordContext::default());
        assert_eq!(violations, vec![PasswordPolicyViolation::EntirelyNumeric]);
    }

    #[test]
    fn test_common_password() {
        let violations = policy().check("Password123", &PasswordContext::default());
        assert!(violations.contains(&PasswordPolicyViolation::TooCommon));
    }

    #[test]
    fn test_similar_to_username() {
        let context = PasswordContext {
            username: Some("jonathan"),
            ..Default::default()
        };
        let violations = policy().check("jonathan1", &context);
        assert_eq!(
            violations,
            vec![PasswordPolicyViolation::TooSimilar("username")]
        );
    }

    #[test]
    fn test_similar_to_email_local_part() {
        let context = PasswordContext {
            email: Some("margaret@example.com"),
            ..Default::default()
        };
        let violations = policy().check("Margaret!", &context);
        assert_eq!(
            violations,
            vec![PasswordPolicyViolation::TooSimilar("email address")]
        );
    }

    #[test]
    fn test_custom_min_length() {
        let policy = DefaultPasswordPolicy::new().with_min_length(12);
        let violations = policy.check("Str0ng!pass", &PasswordContext::default());
        assert_eq!(violations, vec![PasswordPolicyViolation::TooShort(12)]);
    }

    #[test]
    fn test_similarity_ratio() {
        assert_eq!(similarity_ratio("abc", "abc"), 1.0);
        assert_eq!(similarity_ratio("abc", "xyz"), 0.0);
        assert!(similarity_ratio("alice", "alice99") > 0.8);
    }
}
