/// Password-reset token model
///
/// Reset tokens are opaque values valid for 30 minutes and usable exactly
/// once: `used_at` is set when the password is reset, and the mark-used
/// update runs in the same transaction as the password change.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Reset-token lifetime in minutes
pub const RESET_TOKEN_MINUTES: i64 = 30;

/// Password-reset token row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PasswordResetToken {
    pub id: Uuid,
    pub account_id: Uuid,

    /// Opaque token value, unique across all rows
    pub token: String,

    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,

    /// Set when the token is consumed; a non-null value means spent
    pub used_at: Option<DateTime<Utc>>,
}

impl PasswordResetToken {
    /// Builds a fresh reset token for an account with the default expiry
    pub fn issue(account_id: Uuid, token: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            account_id,
            token,
            created_at: now,
            expires_at: now + Duration::minutes(RESET_TOKEN_MINUTES),
            used_at: None,
        }
    }

    /// Whether the token can still be spent
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && now <= self.expires_at
    }

    /// Inserts the token row
    pub async fn create(pool: &PgPool, token: &PasswordResetToken) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (id, account_id, token, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(token.id)
        .bind(token.account_id)
        .bind(&token.token)
        .bind(token.created_at)
        .bind(token.expires_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Looks up a token by its opaque value
    pub async fn find_by_token(pool: &PgPool, token: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PasswordResetToken>(
            "SELECT * FROM password_reset_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(pool)
        .await
    }

    /// Marks the token spent
    ///
    /// Takes any executor so it can run inside the consume transaction.
    pub async fn mark_used<'e, E>(executor: E, token: &str) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("UPDATE password_reset_tokens SET used_at = NOW() WHERE token = $1")
            .bind(token)
            .execute(executor)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_is_usable() {
        let token = PasswordResetToken::issue(Uuid::new_v4(), "abc".to_string());
        assert!(token.is_usable(Utc::now()));
    }

    #[test]
    fn test_used_token_not_usable() {
        let mut token = PasswordResetToken::issue(Uuid::new_v4(), "abc".to_string());
        token.used_at = Some(Utc::now());
        assert!(!token.is_usable(Utc::now()));
    }

    #[test]
    fn test_expired_token_not_usable() {
        let token = PasswordResetToken::issue(Uuid::new_v4(), "abc".to_string());
        let later = Utc::now() + Duration::minutes(RESET_TOKEN_MINUTES + 1);
        assert!(!token.is_usable(later));
    }
}
