//! Reduces the session list to a single activity count.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info};

use super::SessionSource;

/// Polls the session source and counts sessions actively playing video.
///
/// Never fails: connectivity problems and malformed payloads are logged
/// (distinguishably) and reported as zero activity. An erroneous zero only
/// risks transcoding during playback for one poll interval; an erroneous
/// nonzero would suppress the farm until someone noticed.
pub struct ActivityProbe {
    source: Arc<dyn SessionSource>,
}

impl fmt::Debug for ActivityProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityProbe").finish_non_exhaustive()
    }
}

impl ActivityProbe {
    /// Wraps a session source.
    pub fn new(source: Arc<dyn SessionSource>) -> Self {
        Self { source }
    }

    /// Returns the number of sessions actively playing video right now.
    pub async fn probe(&self) -> u64 {
        let sessions = match self.source.fetch_sessions().await {
            Ok(sessions) => sessions,
            Err(err) if err.is_connectivity() => {
                error!("session query failed: {err}");
                return 0;
            }
            Err(err) => {
                error!("session payload could not be decoded: {err}");
                return 0;
            }
        };

        info!("found {} sessions", sessions.len());

        let mut active = 0;
        for session in &sessions {
            let username = session.user_name.as_deref().unwrap_or("Unknown");
            let client = session.client.as_deref().unwrap_or("Unknown");
            let paused = session
                .play_state
                .as_ref()
                .and_then(|state| state.is_paused);
            let media_type = session
                .now_playing_item
                .as_ref()
                .and_then(|item| item.media_type.as_deref());
            debug!(
                "session: {username} on {client}, paused: {paused:?}, media type: {media_type:?}"
            );

            if session.is_active() {
                active += 1;
                debug!("counted as active: {username} on {client}");
            }
        }
        active
    }
}
