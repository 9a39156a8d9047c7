/// Health check endpoint
use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiResult;

/// `GET /health`
///
/// Verifies database connectivity and reports the server version.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    homegate_shared::db::pool::health_check(&state.db).await?;

    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}
