/// Applicant-facing authentication endpoints
///
/// # Endpoints
///
/// Public:
/// - `POST /api/v1/auth/register` - Register a new account
/// - `POST /api/v1/auth/login` - Login and get tokens
/// - `GET  /api/v1/auth/confirm?token=` - Confirm email
/// - `POST /api/v1/auth/reset-password-request` - Request a reset link
/// - `GET  /api/v1/auth/reset-password-check-token?token=` - Probe a token
/// - `POST /api/v1/auth/reset-password` - Reset the password
///
/// Authenticated:
/// - `POST /api/v1/auth/resend-confirmation` - Re-send the confirmation mail
/// - `POST /api/v1/auth/create-profile` - Submit the applicant profile
use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use homegate_shared::models::account::AccountRole;
use homegate_shared::models::profile::Profile;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use validator::Validate;

use crate::{
    app::{AppState, AuthAccount},
    error::{validate_request, ApiError, ApiResult},
    middleware::rate_limit::check_reset_rate_limit,
};

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    /// Requested role; admin registration is rejected here
    pub role: AccountRole,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: String,
    pub email: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,

    pub email_confirmed: bool,
    pub role: AccountRole,
    pub status: homegate_shared::models::account::AccountStatus,
}

/// Token query parameter for the confirm and check-token endpoints
#[derive(Debug, Deserialize)]
pub struct TokenParams {
    pub token: Option<String>,
}

/// Profile submission request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    #[validate(length(min = 1, message = "Salutation is required"))]
    pub salutation: String,

    pub title: Option<String>,

    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,

    #[validate(length(min = 1, message = "Street is required"))]
    pub street: String,

    #[validate(length(min = 1, message = "House number is required"))]
    pub house_number: String,

    #[validate(length(min = 1, message = "Postal code is required"))]
    pub postal_code: String,

    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
}

/// Reset-link request
#[derive(Debug, Deserialize, Validate)]
pub struct ResetRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Password reset payload
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordPayload {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

/// `POST /api/v1/auth/register`
///
/// # Errors
///
/// - `400 Bad Request`: disallowed role or weak password
/// - `409 Conflict`: email already registered
/// - `422 Unprocessable Entity`: request validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    validate_request(&req)?;

    let account = state
        .accounts
        .register(&req.email, &req.password, req.role, false)
        .await?;

    info!(account_id = %account.id, email = account.email, "account registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: account.id.to_string(),
            email: account.email,
        }),
    ))
}

/// `POST /api/v1/auth/login`
///
/// Returns a fresh access/refresh token pair. All credential failures map
/// to the same 401 response.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    validate_request(&req)?;

    let (account, access_token, refresh_token) =
        state.accounts.login(&req.email, &req.password).await?;

    info!(account_id = %account.id, "account logged in");

    Ok(Json(LoginResponse {
        access_token,
        refresh_token,
        email_confirmed: account.email_confirmed,
        role: account.role,
        status: account.status,
    }))
}

/// `GET /api/v1/auth/confirm?token=`
pub async fn confirm_email(
    State(state): State<AppState>,
    Query(params): Query<TokenParams>,
) -> ApiResult<Json<Value>> {
    let token = params
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing token".to_string()))?;

    let account = state.accounts.confirm_email(&token).await?;

    info!(account_id = %account.id, "email confirmed");

    Ok(Json(json!({ "message": "email confirmed successfully" })))
}

/// `POST /api/v1/auth/resend-confirmation`
///
/// Subject to the per-account cooldown; exceeding it returns 429.
pub async fn resend_confirmation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
) -> ApiResult<StatusCode> {
    state.accounts.resend_confirmation(auth.id).await?;

    info!(account_id = %auth.id, "confirmation email re-sent");

    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/v1/auth/create-profile`
///
/// Submits the applicant profile; on success the account moves to the
/// pending moderation queue.
pub async fn create_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
    Json(req): Json<CreateProfileRequest>,
) -> ApiResult<StatusCode> {
    validate_request(&req)?;

    let profile = Profile {
        account_id: auth.id,
        salutation: req.salutation,
        title: req.title.filter(|t| !t.is_empty()),
        first_name: req.first_name,
        last_name: req.last_name,
        street: req.street,
        house_number: req.house_number,
        postal_code: req.postal_code,
        city: req.city,
        verified: false,
        updated_at: Utc::now(),
    };

    state.accounts.add_profile(profile).await?;

    info!(account_id = %auth.id, "profile created");

    Ok(StatusCode::CREATED)
}

/// `POST /api/v1/auth/reset-password-request`
///
/// Always answers 204 so the response never signals whether the email is
/// registered; failures are logged only. Rate limited per email.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(req): Json<ResetRequest>,
) -> ApiResult<StatusCode> {
    validate_request(&req)?;

    check_reset_rate_limit(&state.redis, &req.email).await?;

    if let Err(e) = state.accounts.request_password_reset(&req.email).await {
        info!(email = req.email, error = %e, "password reset requested");
    } else {
        info!(email = req.email, "password reset email sent");
    }

    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/v1/auth/reset-password-check-token?token=`
pub async fn check_reset_token(
    State(state): State<AppState>,
    Query(params): Query<TokenParams>,
) -> ApiResult<Json<Value>> {
    let token = params
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing token".to_string()))?;

    if !state.accounts.is_reset_token_valid(&token).await {
        return Err(ApiError::BadRequest("invalid or expired token".to_string()));
    }

    Ok(Json(json!({ "message": "Token is valid" })))
}

/// `POST /api/v1/auth/reset-password`
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordPayload>,
) -> ApiResult<Json<Value>> {
    validate_request(&req)?;

    state
        .accounts
        .reset_password(&req.token, &req.new_password)
        .await?;

    info!("password reset successful");

    Ok(Json(json!({ "message": "password has been reset" })))
}
