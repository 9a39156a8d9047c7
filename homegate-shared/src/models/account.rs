/// Account model and database operations
///
/// An account is a registered user identity with credentials and a lifecycle
/// status. The status only ever moves forward:
///
/// ```text
/// created -> email_confirmed -> pending -> approved | rejected
/// ```
///
/// The confirmation token is non-null only while the email is unconfirmed;
/// confirming clears it. The unique constraint on `email` is the
/// authoritative guard against duplicate registration; the service-level
/// existence check is an early exit only.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE accounts (
///     id UUID PRIMARY KEY,
///     email TEXT NOT NULL UNIQUE,
///     password_hash TEXT NOT NULL,
///     role account_role NOT NULL,
///     email_confirmed BOOLEAN NOT NULL DEFAULT FALSE,
///     confirmation_token TEXT,
///     confirmation_sent_at TIMESTAMPTZ,
///     status account_status NOT NULL DEFAULT 'created',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Account role
///
/// Self-registration is restricted to `Homeowner` and `Manager`; `Admin`
/// accounts are created only through the privileged bootstrap path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_role", rename_all = "snake_case")]
pub enum AccountRole {
    #[serde(rename = "ROLE_HOMEOWNER")]
    Homeowner,

    #[serde(rename = "ROLE_MANAGER")]
    Manager,

    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl AccountRole {
    /// Whether this role may self-register without the bypass flag
    pub fn self_registrable(&self) -> bool {
        matches!(self, AccountRole::Homeowner | AccountRole::Manager)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, AccountRole::Admin)
    }
}

/// Account lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Registered, email not yet confirmed
    Created,

    /// Email ownership proven
    EmailConfirmed,

    /// Profile submitted, awaiting admin decision
    Pending,

    /// Admin approved the application
    Approved,

    /// Admin rejected the application
    Rejected,
}

/// Account row
///
/// The password is stored as an Argon2id hash, never in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    /// Unique account ID (UUID v4)
    pub id: Uuid,

    /// Email address, unique and case-sensitive as stored
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Account role
    pub role: AccountRole,

    /// Whether the email address has been confirmed
    pub email_confirmed: bool,

    /// Single active email-confirmation token, null once confirmed
    pub confirmation_token: Option<String>,

    /// When the last confirmation email was sent
    pub confirmation_sent_at: Option<DateTime<Utc>>,

    /// Lifecycle status
    pub status: AccountStatus,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Pending-queue entry returned by the moderation listing
///
/// Joins the account with the profile name fields the admin UI searches on.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PendingAccount {
    pub id: Uuid,
    pub email: String,
    pub status: AccountStatus,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Inserts a new account row
    ///
    /// # Errors
    ///
    /// Fails with a unique-constraint violation if the email is already
    /// registered.
    pub async fn create(pool: &PgPool, account: &Account) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, email, password_hash, role, email_confirmed,
                confirmation_token, confirmation_sent_at, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role)
        .bind(account.email_confirmed)
        .bind(&account.confirmation_token)
        .bind(account.confirmation_sent_at)
        .bind(account.status)
        .bind(account.created_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Finds an account by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds an account by email (exact match)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Finds an account by its active confirmation token
    ///
    /// Returns `None` for absent or already-consumed tokens (the token
    /// column is cleared on confirmation).
    pub async fn find_by_confirmation_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE confirmation_token = $1")
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Checks whether an email is already registered
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM accounts WHERE email = $1)")
                .bind(email)
                .fetch_one(pool)
                .await?;
        Ok(exists)
    }

    /// Marks the email confirmed: sets the flag, moves the status to
    /// `email_confirmed`, and clears the confirmation token
    pub async fn set_email_confirmed(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET email_confirmed = TRUE, status = $1, confirmation_token = NULL
            WHERE id = $2
            "#,
        )
        .bind(AccountStatus::EmailConfirmed)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Installs a new confirmation token and sent-at timestamp
    pub async fn refresh_confirmation(
        pool: &PgPool,
        id: Uuid,
        token: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET confirmation_token = $1, confirmation_sent_at = $2
            WHERE id = $3
            "#,
        )
        .bind(token)
        .bind(sent_at)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Updates the stored password hash
    pub async fn update_password(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE accounts SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Sets the lifecycle status
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: AccountStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE accounts SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Lists pending accounts, newest first
    ///
    /// `search` filters by case-insensitive substring match on the profile's
    /// first or last name; the empty string matches all pending accounts.
    pub async fn list_pending(
        pool: &PgPool,
        search: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PendingAccount>, sqlx::Error> {
        sqlx::query_as::<_, PendingAccount>(
            r#"
            SELECT
                a.id,
                a.email,
                a.status,
                COALESCE(p.first_name, '') AS first_name,
                COALESCE(p.last_name, '') AS last_name,
                a.created_at
            FROM accounts a
            LEFT JOIN profiles p ON a.id = p.account_id
            WHERE a.status = 'pending'
              AND (p.first_name ILIKE '%' || $1 || '%' OR p.last_name ILIKE '%' || $1 || '%')
            ORDER BY a.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_self_registrable() {
        assert!(AccountRole::Homeowner.self_registrable());
        assert!(AccountRole::Manager.self_registrable());
        assert!(!AccountRole::Admin.self_registrable());
    }

    #[test]
    fn test_role_wire_format() {
        let json = serde_json::to_string(&AccountRole::Homeowner).unwrap();
        assert_eq!(json, "\"ROLE_HOMEOWNER\"");

        let parsed: AccountRole = serde_json::from_str("\"ROLE_ADMIN\"").unwrap();
        assert!(parsed.is_admin());
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&AccountStatus::EmailConfirmed).unwrap();
        assert_eq!(json, "\"email_confirmed\"");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let account = Account {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            password_hash: "secret-hash".to_string(),
            role: AccountRole::Homeowner,
            email_confirmed: false,
            confirmation_token: Some("tok".to_string()),
            confirmation_sent_at: None,
            status: AccountStatus::Created,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("secret-hash"));
    }
}
