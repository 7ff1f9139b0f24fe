//! Error taxonomy shared by the playback and farm clients.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single outbound call to the media server or the farm.
///
/// The taxonomy matters more than the payload: connectivity failures and
/// unexpected statuses mean "no information", while a malformed payload
/// means the remote answered but the body could not be decoded. Callers
/// branch on the kind; none of these is ever fatal to the control loop.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Timeout, refused connection, DNS failure, or any other transport
    /// error raised before a response body was decoded.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The remote answered with a non-success status.
    #[error("unexpected status: {0}")]
    Status(StatusCode),

    /// The remote answered but the body had an unexpected shape.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl ClientError {
    /// True for failures where the remote never gave a usable answer.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Status(_))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}
