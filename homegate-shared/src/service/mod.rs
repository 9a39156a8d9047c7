/// Core business services
///
/// [`account::AccountLifecycleService`] drives the applicant-facing flow
/// (registration, login, confirmation, profile submission, password reset).
/// [`moderation::ModerationService`] drives the admin decision flow over
/// pending applications. Both are stateless and safe to share across
/// request handlers behind an `Arc`.
pub mod account;
pub mod moderation;

pub use account::{AccountLifecycleService, AuthError};
pub use moderation::{ModerationError, ModerationService};
