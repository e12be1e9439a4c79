//! Infrastructure layer - Storage, crypto, media and observability implementations

pub mod account;
pub mod auth;
pub mod logging;
pub mod media;
pub mod migrations;
pub mod observability;
