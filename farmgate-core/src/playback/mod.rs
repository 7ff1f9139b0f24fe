//! Playback session source: the read-only side of the control loop.

pub mod jellyfin;
pub mod probe;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ClientError;

/// One playback session as reported by the media server.
///
/// Only the fields the controller consumes are decoded; everything else in
/// the payload is ignored. Every field is optional because absence of
/// information must never count as activity.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Session {
    /// Client application name, diagnostic only.
    pub client: Option<String>,
    /// Account name, diagnostic only.
    pub user_name: Option<String>,
    /// Playback transport state; `None` when the server reported nothing.
    pub play_state: Option<PlayState>,
    /// Item currently playing, absent for idle sessions.
    pub now_playing_item: Option<NowPlayingItem>,
}

/// Transport state of a session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PlayState {
    /// Tri-state: `Some(true)` paused, `Some(false)` playing, `None` unknown.
    pub is_paused: Option<bool>,
}

/// The item a session is currently playing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NowPlayingItem {
    /// Media kind, e.g. `"Video"` or `"Audio"`.
    pub media_type: Option<String>,
}

impl Session {
    /// A session is active iff it is explicitly unpaused and explicitly
    /// playing video. Unknown or absent fields on either axis are inactive.
    pub fn is_active(&self) -> bool {
        let unpaused = self
            .play_state
            .as_ref()
            .and_then(|state| state.is_paused)
            == Some(false);
        let video = self
            .now_playing_item
            .as_ref()
            .and_then(|item| item.media_type.as_deref())
            == Some("Video");
        unpaused && video
    }
}

/// Read-only port to the media server's session list.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionSource: Send + Sync {
    /// Fetch the current session list, strictly decoded.
    async fn fetch_sessions(&self) -> Result<Vec<Session>, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session(is_paused: Option<bool>, media_type: Option<&str>) -> Session {
        Session {
            play_state: Some(PlayState { is_paused }),
            now_playing_item: Some(NowPlayingItem {
                media_type: media_type.map(str::to_string),
            }),
            ..Session::default()
        }
    }

    #[test]
    fn active_requires_unpaused_video() {
        assert!(session(Some(false), Some("Video")).is_active());

        assert!(!session(Some(true), Some("Video")).is_active());
        assert!(!session(Some(false), Some("Audio")).is_active());
        assert!(!session(Some(true), Some("Audio")).is_active());
    }

    #[test]
    fn unknown_fields_never_count_as_activity() {
        assert!(!session(None, Some("Video")).is_active());
        assert!(!session(Some(false), None).is_active());
        assert!(!session(None, None).is_active());
        assert!(!Session::default().is_active());
    }

    #[test]
    fn decodes_media_server_payload() {
        let sessions: Vec<Session> = serde_json::from_value(json!([
            {
                "Client": "Web",
                "UserName": "alice",
                "PlayState": { "IsPaused": false, "PositionTicks": 1234 },
                "NowPlayingItem": { "MediaType": "Video", "Name": "A Movie" }
            },
            {
                "Client": "Android",
                "UserName": "bob",
                "PlayState": { "IsPaused": true }
            },
            {}
        ]))
        .expect("session list should decode");

        assert_eq!(sessions.len(), 3);
        assert!(sessions[0].is_active());
        assert!(!sessions[1].is_active());
        assert!(!sessions[2].is_active());
        assert_eq!(sessions[0].user_name.as_deref(), Some("alice"));
    }

    #[test]
    fn non_list_payload_is_a_decode_failure() {
        let result: Result<Vec<Session>, _> =
            serde_json::from_value(json!({ "Sessions": [] }));
        assert!(result.is_err());
    }
}
