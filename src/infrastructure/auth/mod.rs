//! Authentication infrastructure module
//!
//! This module provides the JWT access/refresh token service.

mod jwt;

pub use jwt::{
    JwtTokenService, TokenClaims, TokenConfig, TokenGenerator, TokenPair, TokenType,
    DEFAULT_ACCESS_TOKEN_MINUTES, DEFAULT_REFRESH_TOKEN_DAYS,
};
