//! Runtime configuration: environment first, CLI flags on top.
//!
//! All values have working defaults so the daemon starts with nothing but
//! the environment a typical compose stack provides.

use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEFAULT_JELLYFIN_URL: &str = "http://jellyfin:8096";
pub const DEFAULT_TDARR_URL: &str = "http://tdarr-server:8266";
pub const DEFAULT_POLL_SECS: u64 = 10;

/// A configuration value that failed validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name} {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(name: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            name,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Raw values gathered from the process environment. Blank values are
/// treated as unset.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub jellyfin_url: Option<String>,
    pub jellyfin_api_key: Option<String>,
    pub tdarr_url: Option<String>,
    pub poll_secs: Option<String>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self {
            jellyfin_url: env_var("JELLYFIN_URL"),
            jellyfin_api_key: env_var("JELLYFIN_API_KEY"),
            tdarr_url: env_var("TDARR_URL"),
            poll_secs: env_var("POLL_SEC"),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// CLI values layered over the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub jellyfin_url: Option<String>,
    pub tdarr_url: Option<String>,
    pub poll_secs: Option<u64>,
}

/// Validated runtime configuration, constructed once at startup and handed
/// into the control loop; nothing reads the environment after this point.
#[derive(Debug, Clone)]
pub struct Config {
    pub jellyfin_url: String,
    pub jellyfin_api_key: Option<String>,
    pub tdarr_url: String,
    pub poll_interval: Duration,
}

impl Config {
    /// Composes CLI > environment > defaults, validating as it goes.
    pub fn compose(
        env: EnvConfig,
        overrides: &Overrides,
    ) -> Result<Self, ConfigError> {
        let jellyfin_url = validate_url(
            "Jellyfin URL",
            overrides
                .jellyfin_url
                .as_deref()
                .or(env.jellyfin_url.as_deref())
                .unwrap_or(DEFAULT_JELLYFIN_URL),
        )?;
        let tdarr_url = validate_url(
            "Tdarr URL",
            overrides
                .tdarr_url
                .as_deref()
                .or(env.tdarr_url.as_deref())
                .unwrap_or(DEFAULT_TDARR_URL),
        )?;

        let poll_secs = match (overrides.poll_secs, env.poll_secs.as_deref()) {
            (Some(value), _) => value,
            (None, Some(raw)) => raw.parse::<u64>().map_err(|err| {
                ConfigError::invalid("poll interval", raw, err)
            })?,
            (None, None) => DEFAULT_POLL_SECS,
        };
        if poll_secs == 0 {
            return Err(ConfigError::invalid(
                "poll interval",
                &poll_secs.to_string(),
                "must be at least 1 second",
            ));
        }

        Ok(Self {
            jellyfin_url,
            jellyfin_api_key: env.jellyfin_api_key,
            tdarr_url,
            poll_interval: Duration::from_secs(poll_secs),
        })
    }
}

/// Parses for validity but keeps the string form, normalized without a
/// trailing slash, since the clients build paths by concatenation.
fn validate_url(name: &'static str, raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|err| ConfigError::invalid(name, raw, err))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ConfigError::invalid(
                name,
                raw,
                format!("unsupported scheme {other:?}"),
            ));
        }
    }
    Ok(raw.trim_end_matches('/').to_string())
}
