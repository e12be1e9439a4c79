//! API request, response and error types

pub mod account;
pub mod error;
pub mod json;

pub use account::{
    media_url, parse_role, AccessTokenResponse, AccountResponse, ChangePasswordBody,
    DetailResponse, ProfileUpdateBody, RefreshRequest, RegisterBody, TokenRequest, TokenResponse,
};
pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
