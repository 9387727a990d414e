//! SMTP mail transport on lettre

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::error::MailError;
use crate::mailer::{MailTransport, SentMessage};

/// Production transport delivering through an SMTP relay
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let mut builder = match config.tls.as_str() {
            "none" => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
            "tls" => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| MailError::Transport(e.to_string()))?,
            _ => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| MailError::Transport(e.to_string()))?,
        };

        builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_seconds)));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }

    fn assemble(message: &SentMessage) -> Result<Message, MailError> {
        let from: Mailbox = message
            .from
            .parse()
            .map_err(|_| MailError::Address(message.from.clone()))?;

        let mut builder = Message::builder().from(from);

        if let Some(reply_to) = &message.reply_to {
            let mailbox: Mailbox = reply_to
                .parse()
                .map_err(|_| MailError::Address(reply_to.clone()))?;
            builder = builder.reply_to(mailbox);
        }

        for to in &message.to {
            let mailbox: Mailbox = to
                .parse()
                .map_err(|_| MailError::Address(to.clone()))?;
            builder = builder.to(mailbox);
        }

        builder
            .subject(&message.subject)
            .body(message.body.clone())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, message: &SentMessage) -> Result<(), MailError> {
        let assembled = Self::assemble(message)?;

        tracing::debug!(
            "Sending '{}' to {} recipient(s)",
            message.subject,
            message.to.len()
        );

        self.transport
            .send(assembled)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(())
    }
}
