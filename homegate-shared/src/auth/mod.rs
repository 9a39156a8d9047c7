//! Authentication primitives: password hashing, signed access credentials,
//! and opaque random tokens.

pub mod jwt;
pub mod password;
pub mod token;
