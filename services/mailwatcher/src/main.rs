//! Mailwatcher CLI
//!
//! Command-line interface for the lifecycle mail notification service.

use std::path::PathBuf;

use clap::Parser;
use mailwatcher::{load_config, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "mailwatcher")]
#[command(about = "Build and node lifecycle mail notification service")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    let config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    tracing::info!("Starting mailwatcher");
    tracing::debug!(
        "Instance root: {}, SMTP relay: {}:{}",
        config.instance_root_url,
        config.smtp.host,
        config.smtp.port
    );

    mailwatcher::run(config).await?;

    Ok(())
}
