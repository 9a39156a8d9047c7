/// Account lifecycle service
///
/// Orchestrates the applicant-facing flow over the storage and notification
/// seams: registration with email confirmation, login with refresh-token
/// rotation, profile submission, and password reset.
///
/// # Notification policy
///
/// Confirmation mail (on register and resend) is fire-and-forget: the send
/// runs on a detached task and a failure is logged, never surfaced. The
/// reset-link send is the one exception and propagates its error to the
/// caller.
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::auth::jwt::{self, Claims, JwtError};
use crate::auth::password::{self, PasswordError, MIN_PASSWORD_LEN};
use crate::auth::token;
use crate::models::account::{Account, AccountRole, AccountStatus};
use crate::models::profile::Profile;
use crate::models::refresh_token::RefreshToken;
use crate::models::reset_token::PasswordResetToken;
use crate::notify::{NotificationSender, NotifyError};
use crate::store::{AccountStore, StoreError};

/// Minimum wait between confirmation resends for one account
pub const RESEND_COOLDOWN_SECS: i64 = 60;

/// Account lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("registration with this role is not allowed")]
    RoleNotAllowed,

    #[error("password too weak")]
    WeakPassword,

    #[error("email already registered")]
    EmailExists,

    /// Returned for missing account, wrong password, and empty credentials
    /// alike so the response never leaks which check failed
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("email already confirmed")]
    AlreadyConfirmed,

    #[error("please wait before requesting another email")]
    ResendCooldown,

    #[error("account not found")]
    AccountNotFound,

    #[error("profile already exists")]
    ProfileExists,

    #[error("invalid or expired token")]
    InvalidOrExpiredToken,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Jwt(#[from] JwtError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Notify(#[from] NotifyError),
}

/// Stateless service over the storage and notification seams
#[derive(Clone)]
pub struct AccountLifecycleService {
    store: Arc<dyn AccountStore>,
    sender: Arc<dyn NotificationSender>,
    jwt_secret: String,
}

impl AccountLifecycleService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        sender: Arc<dyn NotificationSender>,
        jwt_secret: String,
    ) -> Self {
        Self {
            store,
            sender,
            jwt_secret,
        }
    }

    /// Registers a new account
    ///
    /// Trims the email, enforces the self-registration role whitelist unless
    /// `bypass_role_check` is set (the privileged bootstrap path), and
    /// rejects passwords shorter than [`MIN_PASSWORD_LEN`]. The existence
    /// check is an early exit only; the unique constraint on `email` is the
    /// authoritative guard and a conflict from the insert maps to
    /// [`AuthError::EmailExists`] as well.
    ///
    /// The confirmation email is dispatched on a detached task.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        role: AccountRole,
        bypass_role_check: bool,
    ) -> Result<Account, AuthError> {
        let email = email.trim();

        if !bypass_role_check && !role.self_registrable() {
            return Err(AuthError::RoleNotAllowed);
        }

        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        if self.store.email_exists(email).await? {
            return Err(AuthError::EmailExists);
        }

        let password_hash = password::hash_password(password)?;
        let confirmation_token = token::generate();
        let now = Utc::now();

        let account = Account {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash,
            role,
            email_confirmed: false,
            confirmation_token: Some(confirmation_token.clone()),
            confirmation_sent_at: Some(now),
            status: AccountStatus::Created,
            created_at: now,
        };

        match self.store.create_account(&account).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => return Err(AuthError::EmailExists),
            Err(e) => return Err(e.into()),
        }

        self.dispatch_confirmation(account.email.clone(), confirmation_token);

        Ok(account)
    }

    /// Authenticates an account and issues a fresh token pair
    ///
    /// Returns the account, a signed access token (24h, subject = account
    /// id), and an opaque refresh token (30 days). All refresh tokens the
    /// account held before this login are deleted first.
    ///
    /// # Errors
    ///
    /// Empty credentials, an unknown email, and a wrong password all fail
    /// with the same [`AuthError::InvalidCredentials`].
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(Account, String, String), AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let account = self
            .store
            .account_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password::verify_password(password, &account.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        self.store.delete_refresh_tokens(account.id).await?;

        let access_token = jwt::create_token(&Claims::new(account.id), &self.jwt_secret)?;
        let refresh = RefreshToken::issue(account.id, token::generate());
        self.store.store_refresh_token(&refresh).await?;

        Ok((account, access_token, refresh.token))
    }

    /// Confirms an email address via its confirmation token
    ///
    /// The token is single-use: confirming clears it, so a second attempt
    /// with the same token fails the lookup.
    pub async fn confirm_email(&self, confirmation_token: &str) -> Result<Account, AuthError> {
        let account = self
            .store
            .account_by_confirmation_token(confirmation_token)
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        self.store.set_email_confirmed(account.id).await?;
        Ok(account)
    }

    /// Re-sends the confirmation email for an account
    ///
    /// A missing account is a silent no-op. Subject to a per-account
    /// cooldown of [`RESEND_COOLDOWN_SECS`] since the last send, which is
    /// independent of any transport-level rate limit.
    pub async fn resend_confirmation(&self, account_id: Uuid) -> Result<(), AuthError> {
        let Some(account) = self.store.account_by_id(account_id).await? else {
            return Ok(());
        };

        if account.email_confirmed {
            return Err(AuthError::AlreadyConfirmed);
        }

        let now = Utc::now();
        if let Some(sent_at) = account.confirmation_sent_at {
            if now - sent_at < Duration::seconds(RESEND_COOLDOWN_SECS) {
                return Err(AuthError::ResendCooldown);
            }
        }

        let confirmation_token = token::generate();
        self.store
            .refresh_confirmation(account.id, &confirmation_token, now)
            .await?;

        self.dispatch_confirmation(account.email, confirmation_token);

        Ok(())
    }

    /// Submits the applicant profile and moves the account to `pending`
    ///
    /// Profile insert and status change run in one transaction; the account
    /// can never end up with a profile but without the pending status.
    pub async fn add_profile(&self, profile: Profile) -> Result<(), AuthError> {
        let account = self
            .store
            .account_by_id(profile.account_id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        if self.store.profile_by_account(account.id).await?.is_some() {
            return Err(AuthError::ProfileExists);
        }

        match self.store.create_profile_pending(&profile).await {
            Ok(()) => Ok(()),
            Err(StoreError::Conflict(_)) => Err(AuthError::ProfileExists),
            Err(e) => Err(e.into()),
        }
    }

    /// Requests a password reset for an email address
    ///
    /// Silently succeeds when the email is unknown (or the lookup fails) so
    /// the endpoint never signals whether an account exists. On a known
    /// account, stores a 30-minute reset token and sends the reset link;
    /// unlike the confirmation mail, a send failure here propagates.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let account = match self.store.account_by_email(email).await {
            Ok(Some(account)) => account,
            Ok(None) | Err(_) => return Ok(()),
        };

        let reset = PasswordResetToken::issue(account.id, token::generate());
        self.store.create_reset_token(&reset).await?;

        self.sender.send_reset_link(email, &reset.token).await?;
        Ok(())
    }

    /// Checks whether a reset token can still be spent
    ///
    /// A failed or empty lookup reports `true`; only a token that is found
    /// and known to be spent or expired reports `false`.
    pub async fn is_reset_token_valid(&self, reset_token: &str) -> bool {
        match self.store.reset_token_by_value(reset_token).await {
            Ok(Some(stored)) => stored.is_usable(Utc::now()),
            Ok(None) => true,
            Err(e) => {
                warn!(error = %e, "reset token lookup failed");
                true
            }
        }
    }

    /// Resets the password using a reset token
    ///
    /// The password update and the token's used-at mark are one atomic
    /// write, so a token can never be spent without the password changing.
    pub async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let stored = self
            .store
            .reset_token_by_value(reset_token)
            .await
            .map_err(|_| AuthError::InvalidOrExpiredToken)?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        if !stored.is_usable(Utc::now()) {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        let password_hash = password::hash_password(new_password)?;
        self.store
            .consume_reset_token(stored.account_id, reset_token, &password_hash)
            .await?;

        Ok(())
    }

    /// Spawns a detached confirmation send; failures are logged only
    fn dispatch_confirmation(&self, email: String, confirmation_token: String) {
        let sender = Arc::clone(&self.sender);
        tokio::spawn(async move {
            if let Err(e) = sender.send_confirmation(&email, &confirmation_token).await {
                warn!(email, error = %e, "failed to send confirmation email");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{RecordingSender, SentMail};
    use crate::store::MemoryStore;
    use std::sync::atomic::Ordering;

    fn service() -> (
        AccountLifecycleService,
        Arc<MemoryStore>,
        Arc<RecordingSender>,
    ) {
        let store = Arc::new(MemoryStore::new());
        let sender = Arc::new(RecordingSender::new());
        let service = AccountLifecycleService::new(
            store.clone(),
            sender.clone(),
            "test-secret".to_string(),
        );
        (service, store, sender)
    }

    /// Lets detached notification tasks run to completion
    async fn drain_spawned() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_register_creates_account_and_sends_confirmation() {
        let (service, store, sender) = service();

        let account = service
            .register("new@example.com", "password123", AccountRole::Homeowner, false)
            .await
            .unwrap();

        assert_eq!(account.status, AccountStatus::Created);
        assert!(!account.email_confirmed);
        let token = account.confirmation_token.clone().unwrap();
        assert_eq!(token.len(), 64);

        let stored = store.account_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(stored.email, "new@example.com");

        drain_spawned().await;
        assert_eq!(
            sender.sent(),
            vec![SentMail::Confirmation {
                email: "new@example.com".to_string(),
                token,
            }]
        );
    }

    #[tokio::test]
    async fn test_register_trims_email() {
        let (service, _, _) = service();

        let account = service
            .register("  padded@example.com  ", "password123", AccountRole::Manager, false)
            .await
            .unwrap();

        assert_eq!(account.email, "padded@example.com");
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let (service, _, _) = service();

        let err = service
            .register("a@example.com", "12345", AccountRole::Homeowner, false)
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::WeakPassword));
    }

    #[tokio::test]
    async fn test_register_rejects_admin_role_without_bypass() {
        let (service, _, _) = service();

        let err = service
            .register("a@example.com", "password123", AccountRole::Admin, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::RoleNotAllowed));

        // the bootstrap path may create admins
        let account = service
            .register("a@example.com", "password123", AccountRole::Admin, true)
            .await
            .unwrap();
        assert!(account.role.is_admin());
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let (service, _, _) = service();

        service
            .register("dup@example.com", "password123", AccountRole::Homeowner, false)
            .await
            .unwrap();

        let err = service
            .register("dup@example.com", "password456", AccountRole::Homeowner, false)
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::EmailExists));
    }

    #[tokio::test]
    async fn test_register_succeeds_when_confirmation_send_fails() {
        let (service, _, sender) = service();
        sender.fail.store(true, Ordering::SeqCst);

        let result = service
            .register("a@example.com", "password123", AccountRole::Homeowner, false)
            .await;

        assert!(result.is_ok());
        drain_spawned().await;
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn test_login_uniform_invalid_credentials() {
        let (service, _, _) = service();

        service
            .register("a@example.com", "password123", AccountRole::Homeowner, false)
            .await
            .unwrap();

        for (email, password) in [
            ("", "password123"),
            ("a@example.com", ""),
            ("missing@example.com", "password123"),
            ("a@example.com", "wrong-password"),
        ] {
            let err = service.login(email, password).await.unwrap_err();
            assert!(
                matches!(err, AuthError::InvalidCredentials),
                "expected InvalidCredentials for ({email:?}, {password:?})"
            );
        }
    }

    #[tokio::test]
    async fn test_login_issues_valid_access_token() {
        let (service, _, _) = service();

        let account = service
            .register("a@example.com", "password123", AccountRole::Homeowner, false)
            .await
            .unwrap();

        let (logged_in, access_token, refresh_token) =
            service.login("a@example.com", "password123").await.unwrap();

        assert_eq!(logged_in.id, account.id);
        assert_eq!(refresh_token.len(), 64);

        let claims = jwt::validate_token(&access_token, "test-secret").unwrap();
        assert_eq!(claims.sub, account.id);
    }

    #[tokio::test]
    async fn test_login_invalidates_previous_refresh_tokens() {
        let (service, store, _) = service();

        let account = service
            .register("a@example.com", "password123", AccountRole::Homeowner, false)
            .await
            .unwrap();

        let (_, _, first_refresh) =
            service.login("a@example.com", "password123").await.unwrap();
        let (_, _, second_refresh) =
            service.login("a@example.com", "password123").await.unwrap();

        assert!(store
            .refresh_token_by_value(&first_refresh)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .refresh_token_by_value(&second_refresh)
            .await
            .unwrap()
            .is_some());
        assert_eq!(store.refresh_tokens_for(account.id).len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_email_clears_token() {
        let (service, store, _) = service();

        let account = service
            .register("a@example.com", "password123", AccountRole::Homeowner, false)
            .await
            .unwrap();
        let token = account.confirmation_token.clone().unwrap();

        service.confirm_email(&token).await.unwrap();

        let confirmed = store.account_by_id(account.id).await.unwrap().unwrap();
        assert!(confirmed.email_confirmed);
        assert_eq!(confirmed.status, AccountStatus::EmailConfirmed);
        assert!(confirmed.confirmation_token.is_none());

        // token is single-use; the second attempt no longer resolves
        let err = service.confirm_email(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidOrExpiredToken));
    }

    #[tokio::test]
    async fn test_resend_is_noop_for_missing_account() {
        let (service, _, sender) = service();

        service.resend_confirmation(Uuid::new_v4()).await.unwrap();

        drain_spawned().await;
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn test_resend_rejects_confirmed_account() {
        let (service, _, _) = service();

        let account = service
            .register("a@example.com", "password123", AccountRole::Homeowner, false)
            .await
            .unwrap();
        let token = account.confirmation_token.clone().unwrap();
        service.confirm_email(&token).await.unwrap();

        let err = service.resend_confirmation(account.id).await.unwrap_err();
        assert!(matches!(err, AuthError::AlreadyConfirmed));
    }

    #[tokio::test]
    async fn test_resend_cooldown() {
        let (service, store, sender) = service();

        let account = service
            .register("a@example.com", "password123", AccountRole::Homeowner, false)
            .await
            .unwrap();

        // registration just sent one, so the cooldown is active
        let err = service.resend_confirmation(account.id).await.unwrap_err();
        assert!(matches!(err, AuthError::ResendCooldown));

        // age the last send past the cooldown window
        let past = Utc::now() - Duration::seconds(RESEND_COOLDOWN_SECS + 1);
        store
            .refresh_confirmation(account.id, "stale-token", past)
            .await
            .unwrap();

        service.resend_confirmation(account.id).await.unwrap();

        let refreshed = store.account_by_id(account.id).await.unwrap().unwrap();
        let new_token = refreshed.confirmation_token.clone().unwrap();
        assert_ne!(new_token, "stale-token");

        drain_spawned().await;
        assert!(sender.sent().contains(&SentMail::Confirmation {
            email: "a@example.com".to_string(),
            token: new_token,
        }));
    }

    fn profile_for(account_id: Uuid) -> Profile {
        Profile {
            account_id,
            salutation: "Mr".to_string(),
            title: None,
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            street: "Main St".to_string(),
            house_number: "1".to_string(),
            postal_code: "12345".to_string(),
            city: "Springfield".to_string(),
            verified: false,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_add_profile_moves_account_to_pending() {
        let (service, store, _) = service();

        let account = service
            .register("a@example.com", "password123", AccountRole::Homeowner, false)
            .await
            .unwrap();

        service.add_profile(profile_for(account.id)).await.unwrap();

        let updated = store.account_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(updated.status, AccountStatus::Pending);
        assert!(store
            .profile_by_account(account.id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_add_profile_guards() {
        let (service, _, _) = service();

        let err = service
            .add_profile(profile_for(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountNotFound));

        let account = service
            .register("a@example.com", "password123", AccountRole::Homeowner, false)
            .await
            .unwrap();
        service.add_profile(profile_for(account.id)).await.unwrap();

        let err = service
            .add_profile(profile_for(account.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ProfileExists));
    }

    #[tokio::test]
    async fn test_reset_request_unknown_email_is_silent_and_mutates_nothing() {
        let (service, store, sender) = service();

        service
            .request_password_reset("nobody@example.com")
            .await
            .unwrap();

        assert_eq!(store.reset_token_count(), 0);
        drain_spawned().await;
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn test_reset_request_stores_token_and_sends_link() {
        let (service, store, sender) = service();

        service
            .register("a@example.com", "password123", AccountRole::Homeowner, false)
            .await
            .unwrap();
        drain_spawned().await;

        service
            .request_password_reset("a@example.com")
            .await
            .unwrap();

        assert_eq!(store.reset_token_count(), 1);
        let sent = sender.sent();
        assert!(matches!(
            sent.last(),
            Some(SentMail::ResetLink { email, .. }) if email == "a@example.com"
        ));
    }

    #[tokio::test]
    async fn test_reset_link_send_failure_propagates() {
        let (service, _, sender) = service();

        service
            .register("a@example.com", "password123", AccountRole::Homeowner, false)
            .await
            .unwrap();
        drain_spawned().await;
        sender.fail.store(true, Ordering::SeqCst);

        let err = service
            .request_password_reset("a@example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::Notify(_)));
    }

    #[tokio::test]
    async fn test_reset_token_validity_reports_true_on_lookup_miss() {
        // longstanding behavior: an unknown token, or a failed lookup,
        // reports valid rather than invalid
        let (service, store, _) = service();

        assert!(service.is_reset_token_valid("no-such-token").await);

        store.fail_reset_lookup.store(true, Ordering::SeqCst);
        assert!(service.is_reset_token_valid("any-token").await);
    }

    #[tokio::test]
    async fn test_reset_token_validity_for_stored_tokens() {
        let (service, store, _) = service();
        let account_id = Uuid::new_v4();

        let fresh = PasswordResetToken::issue(account_id, "fresh".to_string());
        store.create_reset_token(&fresh).await.unwrap();
        assert!(service.is_reset_token_valid("fresh").await);

        let mut used = PasswordResetToken::issue(account_id, "used".to_string());
        used.used_at = Some(Utc::now());
        store.create_reset_token(&used).await.unwrap();
        assert!(!service.is_reset_token_valid("used").await);

        let mut expired = PasswordResetToken::issue(account_id, "expired".to_string());
        expired.expires_at = Utc::now() - Duration::minutes(1);
        store.create_reset_token(&expired).await.unwrap();
        assert!(!service.is_reset_token_valid("expired").await);
    }

    #[tokio::test]
    async fn test_reset_password_changes_hash_and_spends_token() {
        let (service, store, sender) = service();

        let account = service
            .register("a@example.com", "old-password", AccountRole::Homeowner, false)
            .await
            .unwrap();
        drain_spawned().await;

        service
            .request_password_reset("a@example.com")
            .await
            .unwrap();
        let Some(SentMail::ResetLink { token, .. }) = sender.sent().pop() else {
            panic!("expected a reset link to be sent");
        };

        service
            .reset_password(&token, "new-password")
            .await
            .unwrap();

        let updated = store.account_by_id(account.id).await.unwrap().unwrap();
        assert!(password::verify_password("new-password", &updated.password_hash).unwrap());
        assert!(!password::verify_password("old-password", &updated.password_hash).unwrap());

        // spent token cannot be reused, even before expiry
        let err = service
            .reset_password(&token, "another-password")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidOrExpiredToken));
    }

    #[tokio::test]
    async fn test_reset_password_rejects_unknown_and_expired_tokens() {
        let (service, store, _) = service();

        let err = service
            .reset_password("no-such-token", "new-password")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidOrExpiredToken));

        let mut expired = PasswordResetToken::issue(Uuid::new_v4(), "expired".to_string());
        expired.expires_at = Utc::now() - Duration::minutes(1);
        store.create_reset_token(&expired).await.unwrap();

        let err = service
            .reset_password("expired", "new-password")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidOrExpiredToken));
    }
}
