/// Application state and router builder
///
/// Defines the shared application state and builds the Axum router with all
/// routes and middleware.
use crate::{config::Config, error::ApiError, middleware as api_middleware, routes};
use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use homegate_shared::auth::jwt;
use homegate_shared::service::{AccountLifecycleService, ModerationService};
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uuid::Uuid;

/// Authenticated caller, injected into request extensions by
/// [`jwt_auth_layer`]
#[derive(Debug, Clone, Copy)]
pub struct AuthAccount {
    /// Account ID from the token's subject claim
    pub id: Uuid,
}

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; everything
/// inside is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Redis connection for transport-level rate limiting
    pub redis: ConnectionManager,

    /// Applicant-facing lifecycle service
    pub accounts: AccountLifecycleService,

    /// Admin moderation service
    pub moderation: ModerationService,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        redis: ConnectionManager,
        accounts: AccountLifecycleService,
        moderation: ModerationService,
        config: Config,
    ) -> Self {
        Self {
            db,
            redis,
            accounts,
            moderation,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                # Health check (public)
/// └── /api/v1/
///     ├── /auth/                             # Public endpoints
///     │   ├── POST /register                 # (per-IP rate limit)
///     │   ├── POST /login                    # (per-IP rate limit)
///     │   ├── GET  /confirm
///     │   ├── POST /reset-password-request   # (per-email rate limit)
///     │   ├── GET  /reset-password-check-token
///     │   └── POST /reset-password
///     ├── /auth/                             # Authenticated endpoints
///     │   ├── POST /resend-confirmation
///     │   └── POST /create-profile
///     └── /admin/                            # Admin-only endpoints
///         ├── POST /approve-user
///         ├── POST /reject-user
///         ├── GET  /pending-users
///         └── GET  /user-profile/:id
/// ```
pub fn build_router(state: AppState) -> Router {
    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Login and register share a per-IP limiter
    let credential_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            api_middleware::rate_limit::ip_rate_limit_layer,
        ));

    // Remaining public auth endpoints; the reset-request limiter is keyed by
    // the email in the body and applied inside the handler
    let public_auth_routes = Router::new()
        .merge(credential_routes)
        .route("/confirm", get(routes::auth::confirm_email))
        .route(
            "/reset-password-request",
            post(routes::auth::request_password_reset),
        )
        .route(
            "/reset-password-check-token",
            get(routes::auth::check_reset_token),
        )
        .route("/reset-password", post(routes::auth::reset_password));

    // Authenticated applicant endpoints
    let protected_auth_routes = Router::new()
        .route(
            "/resend-confirmation",
            post(routes::auth::resend_confirmation),
        )
        .route("/create-profile", post(routes::auth::create_profile))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Admin endpoints (JWT + admin role)
    let admin_routes = Router::new()
        .route("/approve-user", post(routes::admin::approve_user))
        .route("/reject-user", post(routes::admin::reject_user))
        .route("/pending-users", get(routes::admin::list_pending_users))
        .route("/user-profile/:id", get(routes::admin::get_user_profile))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            api_middleware::admin::require_admin,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", public_auth_routes.merge(protected_auth_routes))
        .nest("/admin", admin_routes);

    Router::new()
        .merge(health_routes)
        .nest("/api/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the bearer token from the Authorization header,
/// then injects [`AuthAccount`] into request extensions.
pub async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_token(token, state.jwt_secret())?;

    req.extensions_mut().insert(AuthAccount { id: claims.sub });

    Ok(next.run(req).await)
}
