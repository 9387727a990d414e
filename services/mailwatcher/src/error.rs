//! Error types for the mailwatcher service

/// Errors raised while assembling or delivering a mail notification
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("unable to parse address: {0}")]
    Address(String),

    #[error("message assembly failed: {0}")]
    Build(String),

    #[error("mail transport failed: {0}")]
    Transport(String),
}

/// Errors that can occur in the mailwatcher service
#[derive(Debug, thiserror::Error)]
pub enum WatcherError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),
}

/// Result type alias for mailwatcher operations
pub type Result<T> = std::result::Result<T, WatcherError>;
