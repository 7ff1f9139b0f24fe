//! Jellyfin implementation of the session source.

use std::time::Duration;

use async_trait::async_trait;

use super::{Session, SessionSource};
use crate::error::ClientError;

const SESSIONS_TIMEOUT: Duration = Duration::from_secs(5);
const TOKEN_HEADER: &str = "X-Emby-Token";

/// Read-only client for Jellyfin's session API.
#[derive(Debug, Clone)]
pub struct JellyfinClient {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl JellyfinClient {
    /// Creates a client for the given base URL. The token is optional;
    /// servers that require authentication will answer 401 without it,
    /// which the probe treats as zero activity.
    pub fn new(base_url: &str, api_token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        }
    }
}

#[async_trait]
impl SessionSource for JellyfinClient {
    async fn fetch_sessions(&self) -> Result<Vec<Session>, ClientError> {
        let mut request = self
            .http
            .get(format!("{}/Sessions", self.base_url))
            .timeout(SESSIONS_TIMEOUT);
        if let Some(token) = &self.api_token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }

        let body = response.text().await?;
        let sessions = serde_json::from_str(&body)?;
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_normalized() {
        let client = JellyfinClient::new("http://jellyfin:8096/", None);
        assert_eq!(client.base_url, "http://jellyfin:8096");
    }
}
