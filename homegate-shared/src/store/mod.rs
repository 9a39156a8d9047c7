/// Persistence seam for the account lifecycle
///
/// Services talk to storage through the [`AccountStore`] trait so that unit
/// tests can swap in [`memory::MemoryStore`] without a database. The
/// production implementation is [`PgAccountStore`].
pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgAccountStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::account::{Account, AccountStatus, PendingAccount};
use crate::models::profile::Profile;
use crate::models::refresh_token::RefreshToken;
use crate::models::rejection::RejectionReasons;
use crate::models::reset_token::PasswordResetToken;

/// Storage errors
///
/// `Conflict` surfaces unique-constraint violations so callers can map a
/// duplicate email or profile to a client error instead of a 500. The
/// database constraint is the authoritative duplicate guard; any
/// service-level existence check is an early exit only.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Classifies an sqlx error, pulling unique violations out as conflicts
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return StoreError::Conflict(db_err.message().to_string());
            }
        }
        StoreError::Database(err)
    }
}

/// Storage operations for accounts, profiles, tokens, and rejections
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn create_account(&self, account: &Account) -> Result<(), StoreError>;
    async fn account_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;
    async fn account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
    async fn account_by_confirmation_token(
        &self,
        token: &str,
    ) -> Result<Option<Account>, StoreError>;
    async fn email_exists(&self, email: &str) -> Result<bool, StoreError>;
    async fn set_email_confirmed(&self, id: Uuid) -> Result<(), StoreError>;
    async fn refresh_confirmation(
        &self,
        id: Uuid,
        token: &str,
        sent_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), StoreError>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError>;
    async fn set_status(&self, id: Uuid, status: AccountStatus) -> Result<(), StoreError>;

    /// Creates the profile and moves the account to `pending` atomically
    async fn create_profile_pending(&self, profile: &Profile) -> Result<(), StoreError>;
    async fn profile_by_account(&self, account_id: Uuid) -> Result<Option<Profile>, StoreError>;

    async fn store_refresh_token(&self, token: &RefreshToken) -> Result<(), StoreError>;
    async fn delete_refresh_tokens(&self, account_id: Uuid) -> Result<(), StoreError>;
    async fn refresh_token_by_value(
        &self,
        token: &str,
    ) -> Result<Option<RefreshToken>, StoreError>;

    async fn create_reset_token(&self, token: &PasswordResetToken) -> Result<(), StoreError>;
    async fn reset_token_by_value(
        &self,
        token: &str,
    ) -> Result<Option<PasswordResetToken>, StoreError>;

    /// Updates the password and marks the reset token spent atomically
    async fn consume_reset_token(
        &self,
        account_id: Uuid,
        token: &str,
        password_hash: &str,
    ) -> Result<(), StoreError>;

    /// Appends a rejection record for an account
    async fn insert_rejection(
        &self,
        account_id: Uuid,
        reasons: &RejectionReasons,
    ) -> Result<(), StoreError>;

    async fn list_pending(
        &self,
        search: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PendingAccount>, StoreError>;
}
