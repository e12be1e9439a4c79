//! Account infrastructure module
//!
//! Argon2 password hashing, in-memory and PostgreSQL repositories, and the
//! account service that ties them to the password policy.

mod password;
mod postgres_repository;
mod repository;
mod service;

pub use password::{Argon2Hasher, PasswordHasher};
pub use postgres_repository::PostgresAccountRepository;
pub use repository::InMemoryAccountRepository;
pub use service::{
    parse_account_id, AccountService, AdminCreateRequest, AdminUpdateRequest,
    ChangePasswordRequest, CreateAccountRequest, ProfileUpdate, RegisterRequest,
};
