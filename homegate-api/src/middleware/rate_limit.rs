/// Redis-backed rate limiting for sensitive endpoints
///
/// Two limiters:
///
/// - a per-IP fixed-window counter shared by login and register
///   (5 attempts per 15 minutes)
/// - a per-email limiter for password-reset requests (5 attempts in a
///   1-minute window, then a 1-hour block)
///
/// Counters use plain INCR with a TTL set on first increment; Redis expiry
/// handles cleanup.
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use redis::aio::ConnectionManager;
use std::net::SocketAddr;
use tracing::{info, warn};

use crate::{app::AppState, error::ApiError};

/// Per-IP attempts allowed on login/register
const IP_MAX_ATTEMPTS: i64 = 5;

/// Per-IP window in seconds (15 minutes)
const IP_WINDOW_SECS: i64 = 900;

/// Per-email reset attempts allowed inside the short window
const RESET_MAX_ATTEMPTS: i64 = 5;

/// Per-email reset window in seconds (1 minute)
const RESET_WINDOW_SECS: i64 = 60;

/// Block duration once the reset window is exceeded (1 hour)
const RESET_BLOCK_SECS: i64 = 3600;

/// Per-IP fixed-window limiter for credential endpoints
///
/// # Errors
///
/// - 429 Too Many Requests: limit exceeded
/// - 500 Internal Server Error: Redis failure
pub async fn ip_rate_limit_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let key = format!("rl:{}", ip);
    let mut conn = state.redis.clone();

    let attempts: i64 = redis::cmd("GET")
        .arg(&key)
        .query_async::<_, Option<i64>>(&mut conn)
        .await?
        .unwrap_or(0);

    if attempts >= IP_MAX_ATTEMPTS {
        warn!(key, attempts, "rate limit exceeded");
        return Err(ApiError::RateLimitExceeded {
            retry_after: IP_WINDOW_SECS as u64,
            message: "Too many attempts. Please try again later.".to_string(),
        });
    }

    // counter and TTL in one round trip; TTL refresh on every attempt keeps
    // the window sliding from the last attempt, matching the lockout intent
    redis::pipe()
        .atomic()
        .cmd("INCR")
        .arg(&key)
        .ignore()
        .cmd("EXPIRE")
        .arg(&key)
        .arg(IP_WINDOW_SECS)
        .ignore()
        .query_async::<_, ()>(&mut conn)
        .await?;

    Ok(next.run(request).await)
}

/// Per-email limiter for password-reset requests
///
/// Called from the reset-request handler because the key is the email in
/// the request body. Exceeding [`RESET_MAX_ATTEMPTS`] inside the short
/// window installs a block key that rejects further attempts for an hour.
pub async fn check_reset_rate_limit(
    redis: &ConnectionManager,
    email: &str,
) -> Result<(), ApiError> {
    let key_attempts = format!("rl:reset:{}:count", email);
    let key_block = format!("rl:reset:{}:block", email);
    let mut conn = redis.clone();

    let blocked: i64 = redis::cmd("EXISTS")
        .arg(&key_block)
        .query_async(&mut conn)
        .await?;
    if blocked > 0 {
        info!(email, "password reset blocked due to rate limiting");
        return Err(ApiError::RateLimitExceeded {
            retry_after: RESET_BLOCK_SECS as u64,
            message: "Too many attempts, try again later.".to_string(),
        });
    }

    let attempts: i64 = redis::cmd("INCR")
        .arg(&key_attempts)
        .query_async(&mut conn)
        .await?;

    if attempts == 1 {
        redis::cmd("EXPIRE")
            .arg(&key_attempts)
            .arg(RESET_WINDOW_SECS)
            .query_async::<_, ()>(&mut conn)
            .await?;
    }

    if attempts > RESET_MAX_ATTEMPTS {
        redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&key_block)
            .arg(1)
            .arg("EX")
            .arg(RESET_BLOCK_SECS)
            .ignore()
            .cmd("DEL")
            .arg(&key_attempts)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;

        info!(email, attempts, "password reset rate limit exceeded");
        return Err(ApiError::RateLimitExceeded {
            retry_after: RESET_BLOCK_SECS as u64,
            message: "Too many attempts, try again in 1 hour.".to_string(),
        });
    }

    Ok(())
}
