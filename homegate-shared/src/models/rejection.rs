/// Rejection audit records
///
/// When an admin rejects a pending application, the field-level reasons are
/// persisted as a JSONB map *before* the status flips to `rejected`. Records
/// are append-only and never mutated.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Field name -> rejection reason
pub type RejectionReasons = BTreeMap<String, String>;

/// Rejection audit row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RejectionRecord {
    pub id: Uuid,
    pub account_id: Uuid,

    /// Field name -> reason, stored as JSONB
    pub reasons: sqlx::types::Json<RejectionReasons>,

    pub created_at: DateTime<Utc>,
}

impl RejectionRecord {
    /// Appends a rejection record for an account
    pub async fn insert(
        pool: &PgPool,
        account_id: Uuid,
        reasons: &RejectionReasons,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO rejections (id, account_id, reasons, created_at)
            VALUES ($1, $2, $3, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(sqlx::types::Json(reasons))
        .execute(pool)
        .await?;

        Ok(())
    }
}
