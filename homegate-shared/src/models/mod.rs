//! Database models
//!
//! Row types and CRUD operations for the Homegate schema:
//!
//! - `account`: registered user identities and their lifecycle status
//! - `profile`: the 1:1 applicant profile attached to an account
//! - `refresh_token`: long-lived opaque login credentials
//! - `reset_token`: single-use password-reset tokens
//! - `rejection`: append-only audit records for rejected applications

pub mod account;
pub mod profile;
pub mod refresh_token;
pub mod rejection;
pub mod reset_token;
