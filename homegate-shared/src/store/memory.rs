/// In-memory [`AccountStore`] for testing and demos
///
/// Backed by mutex-guarded maps, with a couple of failure switches so tests
/// can exercise the error paths without a real database. Not intended for
/// production use.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::account::{Account, AccountStatus, PendingAccount};
use crate::models::profile::Profile;
use crate::models::refresh_token::RefreshToken;
use crate::models::rejection::RejectionReasons;
use crate::models::reset_token::PasswordResetToken;

use super::{AccountStore, StoreError};

/// In-memory store state
#[derive(Default)]
struct State {
    accounts: HashMap<Uuid, Account>,
    profiles: HashMap<Uuid, Profile>,
    refresh_tokens: Vec<RefreshToken>,
    reset_tokens: Vec<PasswordResetToken>,
    rejections: Vec<(Uuid, RejectionReasons, DateTime<Utc>)>,
}

/// Mutex-guarded in-memory store
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,

    /// When set, reset-token lookups fail with a database error
    pub fail_reset_lookup: AtomicBool,

    /// When set, refresh-token inserts fail with a database error
    pub fail_refresh_insert: AtomicBool,

    /// When set, rejection-record inserts fail with a database error
    pub fail_rejection_insert: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn db_error() -> StoreError {
        StoreError::Database(sqlx::Error::PoolClosed)
    }

    /// Number of stored reset tokens (for asserting no-mutation paths)
    pub fn reset_token_count(&self) -> usize {
        self.state.lock().unwrap().reset_tokens.len()
    }

    /// Refresh tokens currently stored for an account
    pub fn refresh_tokens_for(&self, account_id: Uuid) -> Vec<RefreshToken> {
        self.state
            .lock()
            .unwrap()
            .refresh_tokens
            .iter()
            .filter(|t| t.account_id == account_id)
            .cloned()
            .collect()
    }

    /// Rejection records stored for an account, in insertion order
    pub fn rejections_for(&self, account_id: Uuid) -> Vec<RejectionReasons> {
        self.state
            .lock()
            .unwrap()
            .rejections
            .iter()
            .filter(|(id, _, _)| *id == account_id)
            .map(|(_, reasons, _)| reasons.clone())
            .collect()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.accounts.values().any(|a| a.email == account.email) {
            return Err(StoreError::Conflict("accounts_email_key".to_string()));
        }
        state.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn account_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.state.lock().unwrap().accounts.get(&id).cloned())
    }

    async fn account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .accounts
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn account_by_confirmation_token(
        &self,
        token: &str,
    ) -> Result<Option<Account>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .accounts
            .values()
            .find(|a| a.confirmation_token.as_deref() == Some(token))
            .cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .accounts
            .values()
            .any(|a| a.email == email))
    }

    async fn set_email_confirmed(&self, id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(account) = state.accounts.get_mut(&id) {
            account.email_confirmed = true;
            account.status = AccountStatus::EmailConfirmed;
            account.confirmation_token = None;
        }
        Ok(())
    }

    async fn refresh_confirmation(
        &self,
        id: Uuid,
        token: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(account) = state.accounts.get_mut(&id) {
            account.confirmation_token = Some(token.to_string());
            account.confirmation_sent_at = Some(sent_at);
        }
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(account) = state.accounts.get_mut(&id) {
            account.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn set_status(&self, id: Uuid, status: AccountStatus) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(account) = state.accounts.get_mut(&id) {
            account.status = status;
        }
        Ok(())
    }

    async fn create_profile_pending(&self, profile: &Profile) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.profiles.contains_key(&profile.account_id) {
            return Err(StoreError::Conflict("profiles_pkey".to_string()));
        }
        state.profiles.insert(profile.account_id, profile.clone());
        if let Some(account) = state.accounts.get_mut(&profile.account_id) {
            account.status = AccountStatus::Pending;
        }
        Ok(())
    }

    async fn profile_by_account(&self, account_id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(self.state.lock().unwrap().profiles.get(&account_id).cloned())
    }

    async fn store_refresh_token(&self, token: &RefreshToken) -> Result<(), StoreError> {
        if self.fail_refresh_insert.load(Ordering::SeqCst) {
            return Err(Self::db_error());
        }
        self.state
            .lock()
            .unwrap()
            .refresh_tokens
            .push(token.clone());
        Ok(())
    }

    async fn delete_refresh_tokens(&self, account_id: Uuid) -> Result<(), StoreError> {
        self.state
            .lock()
            .unwrap()
            .refresh_tokens
            .retain(|t| t.account_id != account_id);
        Ok(())
    }

    async fn refresh_token_by_value(
        &self,
        token: &str,
    ) -> Result<Option<RefreshToken>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .refresh_tokens
            .iter()
            .find(|t| t.token == token)
            .cloned())
    }

    async fn create_reset_token(&self, token: &PasswordResetToken) -> Result<(), StoreError> {
        self.state.lock().unwrap().reset_tokens.push(token.clone());
        Ok(())
    }

    async fn reset_token_by_value(
        &self,
        token: &str,
    ) -> Result<Option<PasswordResetToken>, StoreError> {
        if self.fail_reset_lookup.load(Ordering::SeqCst) {
            return Err(Self::db_error());
        }
        Ok(self
            .state
            .lock()
            .unwrap()
            .reset_tokens
            .iter()
            .find(|t| t.token == token)
            .cloned())
    }

    async fn consume_reset_token(
        &self,
        account_id: Uuid,
        token: &str,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(account) = state.accounts.get_mut(&account_id) {
            account.password_hash = password_hash.to_string();
        }
        if let Some(stored) = state.reset_tokens.iter_mut().find(|t| t.token == token) {
            stored.used_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn insert_rejection(
        &self,
        account_id: Uuid,
        reasons: &RejectionReasons,
    ) -> Result<(), StoreError> {
        if self.fail_rejection_insert.load(Ordering::SeqCst) {
            return Err(Self::db_error());
        }
        self.state
            .lock()
            .unwrap()
            .rejections
            .push((account_id, reasons.clone(), Utc::now()));
        Ok(())
    }

    async fn list_pending(
        &self,
        search: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PendingAccount>, StoreError> {
        let state = self.state.lock().unwrap();
        let needle = search.to_lowercase();
        let mut pending: Vec<PendingAccount> = state
            .accounts
            .values()
            .filter(|a| a.status == AccountStatus::Pending)
            .filter_map(|a| {
                let profile = state.profiles.get(&a.id)?;
                let matches = profile.first_name.to_lowercase().contains(&needle)
                    || profile.last_name.to_lowercase().contains(&needle);
                matches.then(|| PendingAccount {
                    id: a.id,
                    email: a.email.clone(),
                    status: a.status,
                    first_name: profile.first_name.clone(),
                    last_name: profile.last_name.clone(),
                    created_at: a.created_at,
                })
            })
            .collect();

        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pending
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}
