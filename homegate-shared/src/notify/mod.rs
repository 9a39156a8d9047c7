/// Outbound notification seam
///
/// Services send email through the [`NotificationSender`] trait. The
/// production implementation is [`SmtpMailer`]; tests use
/// [`RecordingSender`], which captures every send in memory and can be told
/// to fail.
pub mod mailer;

pub use mailer::{MailerConfig, SmtpMailer};

use async_trait::async_trait;

use crate::models::rejection::RejectionReasons;

/// Notification errors
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("failed to build message: {0}")]
    Message(String),

    #[error("failed to send message: {0}")]
    Transport(String),
}

/// Sends account-lifecycle emails
///
/// Confirmation, approval, and rejection mail is fire-and-forget: the
/// service spawns the send and logs failures without surfacing them. The
/// reset-link send is the exception; its error propagates to the caller.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Sends the email-confirmation link
    async fn send_confirmation(&self, email: &str, token: &str) -> Result<(), NotifyError>;

    /// Sends the password-reset link
    async fn send_reset_link(&self, email: &str, token: &str) -> Result<(), NotifyError>;

    /// Tells the applicant their account was approved
    async fn send_approval(&self, email: &str) -> Result<(), NotifyError>;

    /// Tells the applicant their application was rejected, with the
    /// field-level reasons
    async fn send_rejection(
        &self,
        email: &str,
        reasons: &RejectionReasons,
    ) -> Result<(), NotifyError>;
}

/// A sent message captured by [`RecordingSender`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentMail {
    Confirmation { email: String, token: String },
    ResetLink { email: String, token: String },
    Approval { email: String },
    Rejection { email: String, reasons: RejectionReasons },
}

/// Test sender that records every message instead of delivering it
#[derive(Default)]
pub struct RecordingSender {
    sent: std::sync::Mutex<Vec<SentMail>>,

    /// When set, every send fails with a transport error
    pub fail: std::sync::atomic::AtomicBool,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, mail: SentMail) -> Result<(), NotifyError> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(NotifyError::Transport("recording sender set to fail".into()));
        }
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send_confirmation(&self, email: &str, token: &str) -> Result<(), NotifyError> {
        self.record(SentMail::Confirmation {
            email: email.to_string(),
            token: token.to_string(),
        })
    }

    async fn send_reset_link(&self, email: &str, token: &str) -> Result<(), NotifyError> {
        self.record(SentMail::ResetLink {
            email: email.to_string(),
            token: token.to_string(),
        })
    }

    async fn send_approval(&self, email: &str) -> Result<(), NotifyError> {
        self.record(SentMail::Approval {
            email: email.to_string(),
        })
    }

    async fn send_rejection(
        &self,
        email: &str,
        reasons: &RejectionReasons,
    ) -> Result<(), NotifyError> {
        self.record(SentMail::Rejection {
            email: email.to_string(),
            reasons: reasons.clone(),
        })
    }
}
