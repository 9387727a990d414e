//! Mail sending collaborator
//!
//! [`Mailer`] turns a notification into an outgoing message and hands it to
//! the [`MailTransport`] seam; the production transport lives in
//! [`crate::smtp`]. Address-list validation for configuration surfaces lives
//! here too, next to the parsing it mirrors.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::Mailboxes;

use crate::config::{normalize_root_url, Config};
use crate::config_history::ConfigHistory;
use crate::error::MailError;
use crate::notification::Notification;

/// An assembled outgoing message as handed to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub from: String,
    pub reply_to: Option<String>,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Abstraction over the mail transport for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait MailTransport: Send + Sync {
    /// Deliver one assembled message
    async fn send(&self, message: &SentMessage) -> Result<(), MailError>;
}

/// Assembles and delivers notifications
pub struct Mailer {
    transport: Arc<dyn MailTransport>,
    from: String,
    reply_to: Option<String>,
    instance_root_url: String,
    config_history: ConfigHistory,
}

impl Mailer {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        config: &Config,
        config_history: ConfigHistory,
    ) -> Self {
        Self {
            transport,
            from: config.smtp.admin_address.clone(),
            reply_to: config.smtp.reply_to.clone(),
            instance_root_url: normalize_root_url(&config.instance_root_url),
            config_history,
        }
    }

    pub fn instance_root_url(&self) -> &str {
        &self.instance_root_url
    }

    /// Prefix a relative resource path with the instance root URL
    pub fn absolute_url(&self, url: &str) -> String {
        format!("{}{}", self.instance_root_url, url)
    }

    pub fn config_history(&self) -> &ConfigHistory {
        &self.config_history
    }

    /// Deliver the notification
    ///
    /// Returns `Ok(None)` without touching the transport when the
    /// notification has nobody to notify or its recipient list parses to
    /// zero mailboxes.
    pub async fn send(&self, notification: &Notification) -> Result<Option<SentMessage>, MailError> {
        if !notification.should_notify() {
            return Ok(None);
        }

        let recipients = parse_address_list(notification.recipients().unwrap_or_default())?;
        if recipients.is_empty() {
            return Ok(None);
        }

        let message = SentMessage {
            from: self.from.clone(),
            reply_to: self.reply_to.clone(),
            to: recipients,
            subject: notification.mail_subject(),
            body: notification.mail_body(),
        };

        self.transport.send(&message).await?;
        Ok(Some(message))
    }
}

/// Split a raw address list into individual mailbox strings
fn parse_address_list(raw: &str) -> Result<Vec<String>, MailError> {
    let mailboxes: Mailboxes = raw
        .parse()
        .map_err(|e| MailError::Address(format!("{e}")))?;
    Ok(mailboxes.into_iter().map(|mailbox| mailbox.to_string()).collect())
}

/// Outcome of validating a configured address list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressValidation {
    Ok,
    Warning(String),
    Error(String),
}

/// Validate a configured list of email addresses
///
/// Used by configuration surfaces to flag mistakes early; the dispatch path
/// never consults it.
pub fn validate_addresses(candidate: &str) -> AddressValidation {
    let entries: Vec<&str> = candidate
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect();

    if entries.is_empty() {
        return AddressValidation::Warning("Empty address list provided".to_string());
    }

    for entry in entries {
        let addr_spec = entry
            .rfind('<')
            .map(|start| entry[start + 1..].trim_end_matches('>'))
            .unwrap_or(entry);
        if addr_spec.find('@').is_none_or(|at| at == 0) {
            return AddressValidation::Error(format!(
                "{entry} does not look like an email address"
            ));
        }
        if let Err(err) = entry.parse::<lettre::message::Mailbox>() {
            return AddressValidation::Error(format!("Invalid address provided: {err}"));
        }
    }

    AddressValidation::Ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationBuilder;

    fn mailer(transport: MockMailTransport) -> Mailer {
        let config = Config {
            instance_root_url: "http://example.com/my-jenkins/".to_string(),
            smtp: crate::config::SmtpConfig {
                admin_address: "admin@example.com".to_string(),
                reply_to: Some("reply-to@example.com".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        Mailer::new(Arc::new(transport), &config, ConfigHistory::new(false))
    }

    #[tokio::test]
    async fn sends_assembled_message_through_the_transport() {
        let mut transport = MockMailTransport::new();
        transport
            .expect_send()
            .withf(|message: &SentMessage| {
                message.from == "admin@example.com"
                    && message.reply_to.as_deref() == Some("reply-to@example.com")
                    && message.to == vec!["notification@example.org".to_string()]
                    && message.subject == "mail-watcher-plugin: Message subject"
            })
            .returning(|_| Box::pin(async { Ok(()) }));

        let notification = NotificationBuilder::new("http://example.com/my-jenkins/")
            .subject("Message subject")
            .recipients("notification@example.org")
            .build();

        let sent = mailer(transport).send(&notification).await.unwrap();
        let sent = sent.expect("message should have been sent");
        assert_eq!(sent.subject, "mail-watcher-plugin: Message subject");
        assert!(sent.body.contains("Url: http://example.com/my-jenkins/\n"));
    }

    #[tokio::test]
    async fn absent_recipients_skip_the_transport() {
        let mut transport = MockMailTransport::new();
        transport.expect_send().never();

        let notification = NotificationBuilder::new("/").subject("Message subject").build();
        let sent = mailer(transport).send(&notification).await.unwrap();
        assert!(sent.is_none());
    }

    #[tokio::test]
    async fn blank_recipients_skip_the_transport() {
        let mut transport = MockMailTransport::new();
        transport.expect_send().never();

        let notification = NotificationBuilder::new("/")
            .subject("Message subject")
            .recipients("   ")
            .build();
        let sent = mailer(transport).send(&notification).await.unwrap();
        assert!(sent.is_none());
    }

    #[tokio::test]
    async fn display_name_addresses_parse() {
        let mut transport = MockMailTransport::new();
        transport
            .expect_send()
            .withf(|message: &SentMessage| message.to.len() == 2)
            .returning(|_| Box::pin(async { Ok(()) }));

        let notification = NotificationBuilder::new("/")
            .subject("Message subject")
            .recipients("fake <recipient@list.com>, second@example.com")
            .build();
        let sent = mailer(transport).send(&notification).await.unwrap();
        assert!(sent.is_some());
    }

    #[tokio::test]
    async fn malformed_recipients_are_an_address_error() {
        let mut transport = MockMailTransport::new();
        transport.expect_send().never();

        let notification = NotificationBuilder::new("/")
            .subject("Message subject")
            .recipients("not an address")
            .build();
        let err = mailer(transport).send(&notification).await.unwrap_err();
        assert!(matches!(err, MailError::Address(_)));
    }

    #[tokio::test]
    async fn transport_failures_surface_as_errors() {
        let mut transport = MockMailTransport::new();
        transport.expect_send().returning(|_| {
            Box::pin(async { Err(MailError::Transport("connection refused".to_string())) })
        });

        let notification = NotificationBuilder::new("/")
            .subject("Message subject")
            .recipients("notification@example.org")
            .build();
        let err = mailer(transport).send(&notification).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn validate_empty_list_warns() {
        assert_eq!(
            validate_addresses(""),
            AddressValidation::Warning("Empty address list provided".to_string())
        );
        assert_eq!(
            validate_addresses("  , "),
            AddressValidation::Warning("Empty address list provided".to_string())
        );
    }

    #[test]
    fn validate_rejects_entries_without_at_sign() {
        assert_eq!(
            validate_addresses("not.an.address"),
            AddressValidation::Error(
                "not.an.address does not look like an email address".to_string()
            )
        );
        assert_eq!(
            validate_addresses("ok@example.com, @example.com"),
            AddressValidation::Error(
                "@example.com does not look like an email address".to_string()
            )
        );
    }

    #[test]
    fn validate_reports_parser_failures() {
        let validation = validate_addresses("broken <spaced out@example.com>");
        match validation {
            AddressValidation::Error(message) => {
                assert!(message.starts_with("Invalid address provided: "), "{message}");
            }
            other => panic!("expected an error, got {other:?}"),
        }
    }

    #[test]
    fn validate_accepts_address_lists() {
        assert_eq!(
            validate_addresses("fake <recipient@list.com>, second@example.com"),
            AddressValidation::Ok
        );
    }
}
