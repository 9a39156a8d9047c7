/// Middleware modules for the API server
///
/// - `admin`: admin-role guard for moderation endpoints
/// - `rate_limit`: Redis-backed attempt counters for sensitive endpoints
pub mod admin;
pub mod rate_limit;
