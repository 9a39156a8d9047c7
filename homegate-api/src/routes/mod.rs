/// API route handlers
///
/// - `auth`: registration, login, confirmation, profile, password reset
/// - `admin`: moderation endpoints over pending applications
/// - `health`: health check
pub mod admin;
pub mod auth;
pub mod health;
