//! Mailwatcher - lifecycle mail notification service
//!
//! Consumes job and computer lifecycle events from a build controller and
//! emails the configured watchers when something changes.

pub mod config;
pub mod config_history;
pub mod error;
pub mod event;
pub mod listener;
pub mod mailer;
pub mod notification;
pub mod smtp;

pub use config::{load_config, Config};
pub use error::{MailError, Result, WatcherError};

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::config_history::ConfigHistory;
use crate::event::LifecycleEvent;
use crate::mailer::{validate_addresses, AddressValidation, MailTransport, Mailer};
use crate::smtp::SmtpMailTransport;

/// Run the mailwatcher service with the given configuration
///
/// Reads newline-delimited JSON events from stdin until EOF or ctrl-c.
pub async fn run(config: Config) -> Result<()> {
    let transport: Arc<dyn MailTransport> = Arc::new(SmtpMailTransport::new(&config.smtp)?);
    let config_history = ConfigHistory::new(config.config_history.installed);
    let mailer = Mailer::new(transport, &config, config_history);

    let cancel = CancellationToken::new();
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for ctrl-c");
        tracing::info!("Shutdown signal received");
        cancel_for_signal.cancel();
    });

    tracing::info!("Event intake started");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => match line? {
                Some(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    handle_event_line(&mailer, &line).await;
                }
                None => break,
            },
        }
    }

    tracing::info!("Event intake stopped");
    Ok(())
}

/// Parse and dispatch one intake line
///
/// Malformed lines are logged and skipped; a bad event must not stop the
/// intake loop.
async fn handle_event_line(mailer: &Mailer, line: &str) {
    let event: LifecycleEvent = match serde_json::from_str(line) {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!("Skipping malformed event: {}", err);
            return;
        }
    };

    for addresses in event.configured_address_lists() {
        match validate_addresses(addresses) {
            AddressValidation::Ok => {}
            AddressValidation::Warning(message) | AddressValidation::Error(message) => {
                tracing::warn!("Configured address list '{}': {}", addresses, message);
            }
        }
    }

    listener::dispatch(mailer, &event).await;
}
