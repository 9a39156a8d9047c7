/// Refresh token model
///
/// Refresh tokens are opaque 64-character hex values with a 30-day expiry.
/// Each login deletes every existing token for the account before storing a
/// new one, so old tokens are invalidated rather than superseded.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Refresh-token lifetime in days
pub const REFRESH_TOKEN_DAYS: i64 = 30;

/// Refresh-token row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub account_id: Uuid,

    /// Opaque token value, unique across all rows
    pub token: String,

    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Builds a fresh token row for an account with the default expiry
    pub fn issue(account_id: Uuid, token: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            account_id,
            token,
            expires_at: now + Duration::days(REFRESH_TOKEN_DAYS),
            created_at: now,
        }
    }

    /// Inserts the token row
    pub async fn create(pool: &PgPool, token: &RefreshToken) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, account_id, token, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(token.id)
        .bind(token.account_id)
        .bind(&token.token)
        .bind(token.expires_at)
        .bind(token.created_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Looks up a token by its opaque value
    pub async fn find_by_token(pool: &PgPool, token: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, RefreshToken>("SELECT * FROM refresh_tokens WHERE token = $1")
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Deletes all tokens for an account (bulk invalidation on login)
    pub async fn delete_for_account(pool: &PgPool, account_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM refresh_tokens WHERE account_id = $1")
            .bind(account_id)
            .execute(pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_sets_expiry() {
        let account_id = Uuid::new_v4();
        let token = RefreshToken::issue(account_id, "abc".to_string());

        assert_eq!(token.account_id, account_id);
        let lifetime = token.expires_at - token.created_at;
        assert_eq!(lifetime.num_days(), REFRESH_TOKEN_DAYS);
    }
}
