/// End-to-end lifecycle tests over the public crate API
///
/// These run against the in-memory store and recording sender, so they
/// need no external services. Database-backed coverage for the same flows
/// lives with the API server's integration tests.
use std::sync::Arc;

use chrono::Utc;
use homegate_shared::auth::jwt;
use homegate_shared::models::account::{AccountRole, AccountStatus};
use homegate_shared::models::profile::Profile;
use homegate_shared::models::rejection::RejectionReasons;
use homegate_shared::notify::{RecordingSender, SentMail};
use homegate_shared::service::{AccountLifecycleService, ModerationService};
use homegate_shared::store::{AccountStore, MemoryStore};

const JWT_SECRET: &str = "integration-test-secret";

struct Harness {
    accounts: AccountLifecycleService,
    moderation: ModerationService,
    store: Arc<MemoryStore>,
    sender: Arc<RecordingSender>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let sender = Arc::new(RecordingSender::new());
    Harness {
        accounts: AccountLifecycleService::new(
            store.clone(),
            sender.clone(),
            JWT_SECRET.to_string(),
        ),
        moderation: ModerationService::new(store.clone(), sender.clone()),
        store,
        sender,
    }
}

async fn drain_spawned() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

fn profile_for(account_id: uuid::Uuid) -> Profile {
    Profile {
        account_id,
        salutation: "Mrs".to_string(),
        title: Some("Dr".to_string()),
        first_name: "Erika".to_string(),
        last_name: "Mustermann".to_string(),
        street: "Heidestrasse".to_string(),
        house_number: "17".to_string(),
        postal_code: "51147".to_string(),
        city: "Cologne".to_string(),
        verified: false,
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_full_onboarding_to_approval() {
    let h = harness();

    // register
    let account = h
        .accounts
        .register("erika@example.com", "s3cret-pw", AccountRole::Homeowner, false)
        .await
        .unwrap();
    assert_eq!(account.status, AccountStatus::Created);

    // the confirmation email went out in the background
    drain_spawned().await;
    let token = match h.sender.sent().first() {
        Some(SentMail::Confirmation { token, .. }) => token.clone(),
        other => panic!("expected a confirmation email, got {other:?}"),
    };

    // confirm via the emailed token
    h.accounts.confirm_email(&token).await.unwrap();
    let confirmed = h.store.account_by_id(account.id).await.unwrap().unwrap();
    assert_eq!(confirmed.status, AccountStatus::EmailConfirmed);

    // submit the profile, landing in the moderation queue
    h.accounts.add_profile(profile_for(account.id)).await.unwrap();
    let queue = h.moderation.list_pending("", 25, 0).await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].first_name, "Erika");

    // approve and verify the terminal state
    h.moderation.approve(account.id).await.unwrap();
    let approved = h.store.account_by_id(account.id).await.unwrap().unwrap();
    assert_eq!(approved.status, AccountStatus::Approved);

    drain_spawned().await;
    assert!(h.sender.sent().contains(&SentMail::Approval {
        email: "erika@example.com".to_string(),
    }));

    // login still works after the whole flow and issues a valid token
    let (_, access_token, _) = h
        .accounts
        .login("erika@example.com", "s3cret-pw")
        .await
        .unwrap();
    let claims = jwt::validate_token(&access_token, JWT_SECRET).unwrap();
    assert_eq!(claims.sub, account.id);
}

#[tokio::test]
async fn test_rejection_leaves_audit_trail() {
    let h = harness();

    let account = h
        .accounts
        .register("max@example.com", "s3cret-pw", AccountRole::Manager, false)
        .await
        .unwrap();
    let token = account.confirmation_token.clone().unwrap();
    h.accounts.confirm_email(&token).await.unwrap();
    h.accounts.add_profile(profile_for(account.id)).await.unwrap();

    let mut reasons = RejectionReasons::new();
    reasons.insert(
        "postalCode".to_string(),
        "postal code does not match the city".to_string(),
    );

    h.moderation.reject(account.id, reasons.clone()).await.unwrap();

    let rejected = h.store.account_by_id(account.id).await.unwrap().unwrap();
    assert_eq!(rejected.status, AccountStatus::Rejected);
    assert_eq!(h.store.rejections_for(account.id), vec![reasons.clone()]);

    drain_spawned().await;
    assert!(h.sender.sent().contains(&SentMail::Rejection {
        email: "max@example.com".to_string(),
        reasons,
    }));

    // the queue is empty again
    let queue = h.moderation.list_pending("", 25, 0).await.unwrap();
    assert!(queue.is_empty());
}
