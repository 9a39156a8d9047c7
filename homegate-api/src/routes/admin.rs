/// Admin moderation endpoints
///
/// All routes require a valid JWT plus the admin role, enforced by the
/// router's middleware stack.
///
/// # Endpoints
///
/// - `POST /api/v1/admin/approve-user` - Approve a pending application
/// - `POST /api/v1/admin/reject-user` - Reject with field-level reasons
/// - `GET  /api/v1/admin/pending-users` - Paginated pending queue
/// - `GET  /api/v1/admin/user-profile/:id` - Applicant profile
use axum::{
    extract::{Path, Query, State},
    Json,
};
use homegate_shared::models::account::PendingAccount;
use homegate_shared::models::profile::Profile;
use homegate_shared::models::rejection::RejectionReasons;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Pending-queue page size
const PAGE_SIZE: i64 = 25;

/// Approve request
#[derive(Debug, Deserialize)]
pub struct ApproveUserRequest {
    pub user_id: Uuid,
}

/// Reject request with field-level reasons
#[derive(Debug, Deserialize)]
pub struct RejectUserRequest {
    pub user_id: Uuid,
    pub errors: RejectionReasons,
}

/// Pending-queue query parameters
#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    #[serde(default)]
    pub search: String,

    pub page: Option<i64>,
}

/// Pending-queue response page
#[derive(Debug, Serialize)]
pub struct PendingUsersResponse {
    pub page: i64,
    pub limit: i64,
    pub total: usize,
    pub users: Vec<PendingAccount>,
}

/// `POST /api/v1/admin/approve-user`
pub async fn approve_user(
    State(state): State<AppState>,
    Json(req): Json<ApproveUserRequest>,
) -> ApiResult<Json<Value>> {
    state.moderation.approve(req.user_id).await?;

    info!(target_account_id = %req.user_id, "user approval completed successfully");

    Ok(Json(json!({
        "user_id": req.user_id,
        "status": "approved",
    })))
}

/// `POST /api/v1/admin/reject-user`
///
/// The reasons map is persisted as an audit record before the status flips.
pub async fn reject_user(
    State(state): State<AppState>,
    Json(req): Json<RejectUserRequest>,
) -> ApiResult<Json<Value>> {
    if req.errors.is_empty() {
        return Err(ApiError::BadRequest(
            "rejection requires at least one reason".to_string(),
        ));
    }

    state
        .moderation
        .reject(req.user_id, req.errors.clone())
        .await?;

    info!(
        target_account_id = %req.user_id,
        reasons = ?req.errors,
        "user reject completed successfully"
    );

    Ok(Json(json!({
        "user_id": req.user_id,
        "status": "rejected",
    })))
}

/// `GET /api/v1/admin/pending-users?search=&page=`
///
/// Search filters by case-insensitive substring on first or last name.
pub async fn list_pending_users(
    State(state): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> ApiResult<Json<PendingUsersResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * PAGE_SIZE;

    let users = state
        .moderation
        .list_pending(&query.search, PAGE_SIZE, offset)
        .await?;

    info!(count = users.len(), search = query.search, page, "pending users fetched");

    Ok(Json(PendingUsersResponse {
        page,
        limit: PAGE_SIZE,
        total: users.len(),
        users,
    }))
}

/// `GET /api/v1/admin/user-profile/:id`
pub async fn get_user_profile(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> ApiResult<Json<Profile>> {
    let profile = state
        .moderation
        .profile(account_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user profile not found".to_string()))?;

    Ok(Json(profile))
}
