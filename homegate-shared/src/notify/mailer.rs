/// SMTP implementation of [`NotificationSender`]
///
/// Uses lettre's async transport over the tokio runtime. Authentication is
/// optional so the mailer also works against an unauthenticated relay in
/// development.
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info};

use crate::models::rejection::RejectionReasons;

use super::{NotificationSender, NotifyError};

/// SMTP connection and addressing settings
#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub host: String,
    pub port: u16,

    /// SMTP credentials; auth is skipped when either part is empty
    pub user: String,
    pub password: String,

    /// From address for all outbound mail
    pub from: String,

    /// Public base URL used to build confirmation and reset links
    pub project_url: String,
}

/// SMTP mailer
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    project_url: String,
}

impl SmtpMailer {
    /// Builds the mailer and its pooled SMTP transport
    pub fn new(config: &MailerConfig) -> Result<Self, NotifyError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .port(config.port);

        if !config.user.is_empty() && !config.password.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.user.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from: config.from.clone(),
            project_url: config.project_url.clone(),
        })
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| NotifyError::Message(format!("bad from address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| NotifyError::Message(format!("bad recipient address: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| NotifyError::Message(e.to_string()))?;

        info!(to, subject, "sending email");

        match self.transport.send(message).await {
            Ok(_) => {
                info!(to, "email sent");
                Ok(())
            }
            Err(e) => {
                error!(to, error = %e, "failed to send email");
                Err(NotifyError::Transport(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl NotificationSender for SmtpMailer {
    async fn send_confirmation(&self, email: &str, token: &str) -> Result<(), NotifyError> {
        let link = format!("{}/api/v1/auth/confirm?token={}", self.project_url, token);
        let body = format!("Click the link to confirm your email: {link}");
        self.send(email, "Email Confirmation", body).await
    }

    async fn send_reset_link(&self, email: &str, token: &str) -> Result<(), NotifyError> {
        let link = format!("{}/reset-password?token={}", self.project_url, token);
        let body = format!(
            "To reset your password, click the link below:\n\n{link}\n\n\
             If you did not request a password reset, please ignore this email."
        );
        self.send(email, "Password Reset Request", body).await
    }

    async fn send_approval(&self, email: &str) -> Result<(), NotifyError> {
        self.send(
            email,
            "Account approved",
            "Your account has been approved".to_string(),
        )
        .await
    }

    async fn send_rejection(
        &self,
        email: &str,
        reasons: &RejectionReasons,
    ) -> Result<(), NotifyError> {
        let mut body =
            String::from("Unfortunately, your registration was rejected due to the following issues:\n\n");
        for (field, reason) in reasons {
            body.push_str(&format!("- {field}: {reason}\n"));
        }
        body.push_str("\nPlease correct these issues and try again.");

        self.send(email, "Registration Rejected", body).await
    }
}
