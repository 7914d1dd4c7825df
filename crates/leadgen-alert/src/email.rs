use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::AsyncSmtpTransport;
use lettre::{AsyncTransport, Tokio1Executor};
use leadgen_core::SmtpConfig;

use crate::dispatch::{AlertEmail, Notifier};
use crate::error::AlertError;

/// Sends alerts through an SMTP relay using STARTTLS.
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    /// Build the transport and parse both mailboxes. No connection is opened.
    ///
    /// # Errors
    ///
    /// Returns [`AlertError::Address`] for an unparsable mailbox, or
    /// [`AlertError::Smtp`] if the relay host is invalid.
    pub fn from_config(config: &SmtpConfig) -> Result<Self, AlertError> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            mailer,
            from: config.from.parse()?,
            to: config.to.parse()?,
        })
    }
}

impl Notifier for SmtpNotifier {
    async fn send(&self, email: &AlertEmail) -> Result<(), AlertError> {
        let msg = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(email.subject.clone())
            .header(header::ContentType::TEXT_PLAIN)
            .body(email.body.clone())?;

        self.mailer.send(msg).await?;
        tracing::debug!(to = %self.to, "alert email delivered");
        Ok(())
    }
}
