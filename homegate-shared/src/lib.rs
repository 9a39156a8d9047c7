//! # Homegate Shared Library
//!
//! This crate contains the domain core of the Homegate registration and
//! moderation backend, shared between the API server and the admin
//! bootstrap binary.
//!
//! ## Module Organization
//!
//! - `models`: Database models for accounts, profiles, and tokens
//! - `auth`: Password hashing, JWT issuance, and opaque token generation
//! - `store`: The account persistence contract and its Postgres implementation
//! - `notify`: The notification sender contract and the SMTP mailer
//! - `service`: Account lifecycle and moderation business rules
//! - `db`: Connection pool and migration helpers

pub mod auth;
pub mod db;
pub mod models;
pub mod notify;
pub mod service;
pub mod store;

/// Current version of the Homegate shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
