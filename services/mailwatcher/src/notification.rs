//! The notification value model
//!
//! One [`NotificationBuilder`] is created per event occurrence, filled in by
//! the event policy, and consumed exactly once by [`NotificationBuilder::build`].
//! The resulting [`Notification`] is immutable; [`Notification::send`] routes
//! it through the [`Mailer`] and reduces every failure to a log line so a
//! broken mail setup can never break event handling.

use crate::config::normalize_root_url;
use crate::error::MailError;
use crate::event::UserRef;
use crate::mailer::Mailer;

/// Fixed prefix of every mail subject
pub const SUBJECT_PREFIX: &str = "mail-watcher-plugin: ";

/// An immutable notification bound to a single event occurrence
#[derive(Debug, Clone)]
pub struct Notification {
    subject: String,
    body: String,
    recipients: Option<String>,
    url: String,
    name: String,
    initiator: UserRef,
    pairs: Vec<(String, String)>,
}

impl Notification {
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Raw recipient address list; unparsed at this layer
    pub fn recipients(&self) -> Option<&str> {
        self.recipients.as_deref()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initiator(&self) -> &UserRef {
        &self.initiator
    }

    /// Ordered `Key: Value` metadata lines rendered before the body text
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Whether there is anyone to notify
    pub fn should_notify(&self) -> bool {
        self.recipients
            .as_deref()
            .is_some_and(|recipients| !recipients.trim().is_empty())
    }

    pub fn mail_subject(&self) -> String {
        format!("{}{}", SUBJECT_PREFIX, self.subject)
    }

    pub fn mail_body(&self) -> String {
        let mut body = String::new();
        for (key, value) in &self.pairs {
            body.push_str(key);
            body.push_str(": ");
            body.push_str(value);
            body.push('\n');
        }
        body.push_str("\n\n");
        body.push_str(&self.body);
        body
    }

    /// Hand the notification to the mailer, logging the outcome
    ///
    /// Failures are swallowed here: the triggering event must complete no
    /// matter what the mail stack does.
    pub async fn send(&self, mailer: &Mailer) {
        match mailer.send(self).await {
            Ok(Some(_)) => {
                tracing::info!("{}notified: {}", SUBJECT_PREFIX, self.subject);
            }
            Ok(None) => {}
            Err(MailError::Address(err)) => {
                tracing::warn!("{}unable to parse address: {}", SUBJECT_PREFIX, err);
            }
            Err(err) => {
                tracing::warn!("{}unable to notify: {}", SUBJECT_PREFIX, err);
            }
        }
    }
}

/// Accumulates the fields of one notification
///
/// Plain value with fluent setters; no validation happens here.
#[derive(Debug, Clone)]
pub struct NotificationBuilder {
    instance_root_url: String,
    subject: String,
    body: String,
    recipients: Option<String>,
    url: String,
    name: String,
    initiator: UserRef,
    extra_pairs: Vec<(String, String)>,
}

impl NotificationBuilder {
    pub fn new(instance_root_url: &str) -> Self {
        Self {
            instance_root_url: normalize_root_url(instance_root_url),
            subject: String::new(),
            body: String::new(),
            recipients: None,
            url: String::new(),
            name: String::new(),
            initiator: UserRef::unknown(),
            extra_pairs: Vec::new(),
        }
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn recipients(mut self, recipients: impl Into<String>) -> Self {
        self.recipients = Some(recipients.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn initiator(mut self, initiator: UserRef) -> Self {
        self.initiator = initiator;
        self
    }

    /// Append a metadata pair after the base `Url`/`Initiator` lines
    pub fn pair(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_pairs.push((key.into(), value.into()));
        self
    }

    /// Consume the builder into an immutable notification
    pub fn build(self) -> Notification {
        let mut pairs = vec![
            (
                "Url".to_string(),
                format!("{}{}", self.instance_root_url, self.url),
            ),
            ("Initiator".to_string(), self.initiator.id.clone()),
        ];
        pairs.extend(self.extra_pairs);

        Notification {
            subject: self.subject,
            body: self.body,
            recipients: self.recipients,
            url: self.url,
            name: self.name,
            initiator: self.initiator,
            pairs,
        }
    }
}
