/// Applicant profile model
///
/// Each account has at most one profile, created exactly once when the
/// applicant submits their details. The insert and the account's transition
/// to `pending` happen in a single transaction (see
/// [`crate::store::PgAccountStore`]).
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Profile row, 1:1 with an account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    /// Owning account (primary key)
    pub account_id: Uuid,

    /// Salutation ("Mr", "Mrs", ...)
    pub salutation: String,

    /// Optional academic or professional title
    pub title: Option<String>,

    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub house_number: String,
    pub postal_code: String,
    pub city: String,

    /// Whether the profile data has been verified by an admin
    pub verified: bool,

    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Inserts the profile row
    ///
    /// Takes any executor so it can run inside the profile+pending
    /// transaction. Fails with a unique-constraint violation if a profile
    /// already exists for the account.
    pub async fn create<'e, E>(executor: E, profile: &Profile) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r#"
            INSERT INTO profiles (
                account_id, salutation, title, first_name, last_name,
                street, house_number, postal_code, city, verified, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(profile.account_id)
        .bind(&profile.salutation)
        .bind(&profile.title)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.street)
        .bind(&profile.house_number)
        .bind(&profile.postal_code)
        .bind(&profile.city)
        .bind(profile.verified)
        .bind(profile.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Fetches the profile for an account
    ///
    /// Returns `Ok(None)` when no profile exists yet, which is a normal
    /// state for accounts that have not finished onboarding.
    pub async fn find_by_account(
        pool: &PgPool,
        account_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE account_id = $1")
            .bind(account_id)
            .fetch_optional(pool)
            .await
    }
}
