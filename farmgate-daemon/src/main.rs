//! # Farmgate
//!
//! Watches Jellyfin for active video playback and gates a Tdarr transcode
//! farm on it: pause and cancel in-flight work while anyone is watching,
//! resume and requeue the cancelled work once playback ends.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use farmgate_core::Controller;
use farmgate_core::farm::tdarr::TdarrClient;
use farmgate_core::playback::jellyfin::JellyfinClient;
use farmgate_core::playback::probe::ActivityProbe;

use crate::config::{Config, EnvConfig, Overrides};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "farmgate")]
#[command(
    about = "Pauses a Tdarr transcode farm while Jellyfin playback is active"
)]
struct Cli {
    /// Explicit .env file to load before reading the environment
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Seconds between activity polls (overrides POLL_SEC)
    #[arg(long, value_name = "SECONDS")]
    poll_secs: Option<u64>,

    /// Jellyfin base URL (overrides JELLYFIN_URL)
    #[arg(long, value_name = "URL")]
    jellyfin_url: Option<String>,

    /// Tdarr base URL (overrides TDARR_URL)
    #[arg(long, value_name = "URL")]
    tdarr_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path).with_context(|| {
                format!("could not load env file {}", path.display())
            })?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let overrides = Overrides {
        jellyfin_url: cli.jellyfin_url,
        tdarr_url: cli.tdarr_url,
        poll_secs: cli.poll_secs,
    };
    let config = Config::compose(EnvConfig::gather(), &overrides)?;

    info!(
        "starting farmgate, polling {} every {}s, controlling {}",
        config.jellyfin_url,
        config.poll_interval.as_secs(),
        config.tdarr_url
    );
    if config.jellyfin_api_key.is_none() {
        warn!(
            "JELLYFIN_API_KEY is not set; session queries may fail if Jellyfin requires authentication"
        );
    }

    let sessions = Arc::new(JellyfinClient::new(
        &config.jellyfin_url,
        config.jellyfin_api_key.clone(),
    ));
    let farm = Arc::new(TdarrClient::new(&config.tdarr_url));
    let mut controller = Controller::new(ActivityProbe::new(sessions), farm);

    tokio::select! {
        _ = controller.run(config.poll_interval) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("could not listen for shutdown signal")?;
            info!("shutdown requested, exiting");
        }
    }

    Ok(())
}
