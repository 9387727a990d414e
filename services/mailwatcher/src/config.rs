//! Configuration for the mailwatcher service

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root URL of the watched instance, used to absolutize resource links
    #[serde(default = "default_instance_root_url")]
    pub instance_root_url: String,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub config_history: ConfigHistoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instance_root_url: default_instance_root_url(),
            smtp: SmtpConfig::default(),
            config_history: ConfigHistoryConfig::default(),
        }
    }
}

/// SMTP relay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// TLS mode: "starttls" (default), "tls", or "none"
    #[serde(default = "default_smtp_tls")]
    pub tls: String,
    #[serde(default = "default_smtp_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Sender address of every notification
    #[serde(default = "default_admin_address")]
    pub admin_address: String,
    #[serde(default)]
    pub reply_to: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            tls: default_smtp_tls(),
            timeout_seconds: default_smtp_timeout(),
            username: None,
            password: None,
            admin_address: default_admin_address(),
            reply_to: None,
        }
    }
}

/// Whether the configuration-history companion is deployed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigHistoryConfig {
    #[serde(default)]
    pub installed: bool,
}

fn default_instance_root_url() -> String {
    "/".to_string()
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_tls() -> String {
    "starttls".to_string()
}

fn default_smtp_timeout() -> u64 {
    10
}

fn default_admin_address() -> String {
    "mailwatcher@localhost".to_string()
}

/// Normalize a root URL so relative paths can be appended directly
pub(crate) fn normalize_root_url(url: &str) -> String {
    if url.is_empty() {
        return "/".to_string();
    }
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::WatcherError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let mut config: Config = serde_json::from_str(&content)?;
    config.instance_root_url = normalize_root_url(&config.instance_root_url);
    Ok(config)
}
