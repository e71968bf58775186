//! Outgoing email: verification and password-reset links.

use async_trait::async_trait;
use resend_rs::{types::CreateEmailBaseOptions, Resend};
use tracing::info;

use crate::config::MailConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()>;
}

/// Link sent after registration or an email change.
pub fn verification_email(frontend_url: &str, to: &str, token: &str) -> OutgoingMail {
    let link = format!("{frontend_url}/verify?token={token}");
    OutgoingMail {
        to: to.to_string(),
        subject: "Verify your email".into(),
        text: format!(
            "Click the link below to verify your email:\n{link}\n\n\
             This link will expire in 24 hours.\n\n\
             Thanks,\nTraceMyData Team"
        ),
    }
}

/// Link sent by forgot-password.
pub fn password_reset_email(frontend_url: &str, to: &str, token: &str) -> OutgoingMail {
    let link = format!("{frontend_url}/reset-password?token={token}");
    OutgoingMail {
        to: to.to_string(),
        subject: "Reset your password".into(),
        text: format!(
            "Hi,\n\nWe received a request to reset your password. \
             Click the link below to set a new password. This link will expire in 30 minutes.\n\n\
             {link}\n\n\
             If you didn't request a password reset, please ignore this email.\n\n\
             Thanks,\nTraceMyData Team"
        ),
    }
}

pub struct ResendMailer {
    client: Resend,
    from: String,
}

impl ResendMailer {
    pub fn new(api_key: &str, from: &str) -> Self {
        Self {
            client: Resend::new(api_key),
            from: from.to_string(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        let to = [mail.to.as_str()];
        let email = CreateEmailBaseOptions::new(&self.from, to, &mail.subject).with_text(&mail.text);
        self.client
            .emails
            .send(email)
            .await
            .map_err(|e| anyhow::anyhow!("resend: {e}"))?;
        info!(to = %mail.to, subject = %mail.subject, "email sent");
        Ok(())
    }
}

/// Used when no delivery provider is configured; the link ends up in the log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        info!(to = %mail.to, subject = %mail.subject, body = %mail.text, "email not sent (no provider)");
        Ok(())
    }
}

pub fn mailer_from_config(cfg: &MailConfig) -> Box<dyn Mailer> {
    match &cfg.resend_api_key {
        Some(key) => Box::new(ResendMailer::new(key, &cfg.from)),
        None => Box::new(LogMailer),
    }
}
