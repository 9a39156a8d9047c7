/// Admin-role guard
///
/// Expects [`jwt_auth_layer`](crate::app::jwt_auth_layer) to have injected
/// the authenticated account already; loads the account and rejects callers
/// without the admin role.
use axum::{
    extract::{Extension, Request, State},
    middleware::Next,
    response::Response,
};
use homegate_shared::models::account::Account;
use tracing::warn;

use crate::{
    app::{AppState, AuthAccount},
    error::ApiError,
};

pub async fn require_admin(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let account = Account::find_by_id(&state.db, auth.id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    if !account.role.is_admin() {
        warn!(account_id = %auth.id, role = ?account.role, "non-admin attempted admin endpoint");
        return Err(ApiError::Forbidden(
            "only admin can perform this action".to_string(),
        ));
    }

    Ok(next.run(req).await)
}
