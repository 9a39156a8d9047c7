/// Postgres-backed [`AccountStore`]
///
/// Thin delegation to the model-level queries, plus the two multi-step
/// writes that need a transaction: profile submission and reset-token
/// consumption.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::account::{Account, AccountStatus, PendingAccount};
use crate::models::profile::Profile;
use crate::models::refresh_token::RefreshToken;
use crate::models::rejection::{RejectionReasons, RejectionRecord};
use crate::models::reset_token::PasswordResetToken;

use super::{AccountStore, StoreError};

/// Account store backed by a Postgres connection pool
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn create_account(&self, account: &Account) -> Result<(), StoreError> {
        Account::create(&self.pool, account)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn account_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(Account::find_by_id(&self.pool, id).await?)
    }

    async fn account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(Account::find_by_email(&self.pool, email).await?)
    }

    async fn account_by_confirmation_token(
        &self,
        token: &str,
    ) -> Result<Option<Account>, StoreError> {
        Ok(Account::find_by_confirmation_token(&self.pool, token).await?)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(Account::email_exists(&self.pool, email).await?)
    }

    async fn set_email_confirmed(&self, id: Uuid) -> Result<(), StoreError> {
        Ok(Account::set_email_confirmed(&self.pool, id).await?)
    }

    async fn refresh_confirmation(
        &self,
        id: Uuid,
        token: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        Ok(Account::refresh_confirmation(&self.pool, id, token, sent_at).await?)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        Ok(Account::update_password(&self.pool, id, password_hash).await?)
    }

    async fn set_status(&self, id: Uuid, status: AccountStatus) -> Result<(), StoreError> {
        Ok(Account::set_status(&self.pool, id, status).await?)
    }

    async fn create_profile_pending(&self, profile: &Profile) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        Profile::create(&mut *tx, profile)
            .await
            .map_err(StoreError::from_sqlx)?;

        sqlx::query("UPDATE accounts SET status = $1 WHERE id = $2")
            .bind(AccountStatus::Pending)
            .bind(profile.account_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn profile_by_account(&self, account_id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(Profile::find_by_account(&self.pool, account_id).await?)
    }

    async fn store_refresh_token(&self, token: &RefreshToken) -> Result<(), StoreError> {
        RefreshToken::create(&self.pool, token)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn delete_refresh_tokens(&self, account_id: Uuid) -> Result<(), StoreError> {
        Ok(RefreshToken::delete_for_account(&self.pool, account_id).await?)
    }

    async fn refresh_token_by_value(
        &self,
        token: &str,
    ) -> Result<Option<RefreshToken>, StoreError> {
        Ok(RefreshToken::find_by_token(&self.pool, token).await?)
    }

    async fn create_reset_token(&self, token: &PasswordResetToken) -> Result<(), StoreError> {
        PasswordResetToken::create(&self.pool, token)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn reset_token_by_value(
        &self,
        token: &str,
    ) -> Result<Option<PasswordResetToken>, StoreError> {
        Ok(PasswordResetToken::find_by_token(&self.pool, token).await?)
    }

    async fn consume_reset_token(
        &self,
        account_id: Uuid,
        token: &str,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE accounts SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

        PasswordResetToken::mark_used(&mut *tx, token).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn insert_rejection(
        &self,
        account_id: Uuid,
        reasons: &RejectionReasons,
    ) -> Result<(), StoreError> {
        Ok(RejectionRecord::insert(&self.pool, account_id, reasons).await?)
    }

    async fn list_pending(
        &self,
        search: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PendingAccount>, StoreError> {
        Ok(Account::list_pending(&self.pool, search, limit, offset).await?)
    }
}
