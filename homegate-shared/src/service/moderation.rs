/// Admin moderation service
///
/// A small state machine over pending applications: approve or reject, list
/// the queue, inspect a profile. Both decisions require the account to be in
/// the `pending` state.
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::models::account::{Account, AccountStatus, PendingAccount};
use crate::models::profile::Profile;
use crate::models::rejection::RejectionReasons;
use crate::notify::NotificationSender;
use crate::store::{AccountStore, StoreError};

/// Moderation errors
#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    #[error("account not found")]
    NotFound,

    #[error("account cannot be moderated in status {0:?}")]
    InvalidStatus(AccountStatus),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Stateless moderation service
#[derive(Clone)]
pub struct ModerationService {
    store: Arc<dyn AccountStore>,
    sender: Arc<dyn NotificationSender>,
}

impl ModerationService {
    pub fn new(store: Arc<dyn AccountStore>, sender: Arc<dyn NotificationSender>) -> Self {
        Self { store, sender }
    }

    /// Approves a pending application
    ///
    /// The approval email is fire-and-forget; a send failure is logged and
    /// does not undo the decision.
    pub async fn approve(&self, account_id: Uuid) -> Result<(), ModerationError> {
        let account = self.pending_account(account_id).await?;

        self.store
            .set_status(account.id, AccountStatus::Approved)
            .await?;

        let sender = Arc::clone(&self.sender);
        tokio::spawn(async move {
            if let Err(e) = sender.send_approval(&account.email).await {
                warn!(email = account.email, error = %e, "failed to send approval email");
            }
        });

        Ok(())
    }

    /// Rejects a pending application with field-level reasons
    ///
    /// The rejection record is written before the status flips: if the
    /// record cannot be saved, the account stays pending rather than ending
    /// up rejected without a recorded reason.
    pub async fn reject(
        &self,
        account_id: Uuid,
        reasons: RejectionReasons,
    ) -> Result<(), ModerationError> {
        let account = self.pending_account(account_id).await?;

        if let Err(e) = self.store.insert_rejection(account.id, &reasons).await {
            error!(account_id = %account.id, error = %e, "failed to save rejection reasons");
            return Err(e.into());
        }

        self.store
            .set_status(account.id, AccountStatus::Rejected)
            .await?;

        let sender = Arc::clone(&self.sender);
        tokio::spawn(async move {
            if let Err(e) = sender.send_rejection(&account.email, &reasons).await {
                warn!(email = account.email, error = %e, "failed to send rejection email");
            }
        });

        Ok(())
    }

    /// Lists the pending queue, newest first
    ///
    /// `search` filters by case-insensitive substring on the applicant's
    /// first or last name; empty matches everything.
    pub async fn list_pending(
        &self,
        search: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PendingAccount>, ModerationError> {
        Ok(self.store.list_pending(search, limit, offset).await?)
    }

    /// Fetches an applicant's profile, `None` when not yet submitted
    pub async fn profile(&self, account_id: Uuid) -> Result<Option<Profile>, ModerationError> {
        Ok(self.store.profile_by_account(account_id).await?)
    }

    async fn pending_account(&self, account_id: Uuid) -> Result<Account, ModerationError> {
        let account = self
            .store
            .account_by_id(account_id)
            .await?
            .ok_or(ModerationError::NotFound)?;

        if account.status != AccountStatus::Pending {
            return Err(ModerationError::InvalidStatus(account.status));
        }

        Ok(account)
    }
}
