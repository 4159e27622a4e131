use std::collections::HashMap;
use std::fmt;

/// Free-form key/value payload attached to session events
pub type Extras = HashMap<String, String>;

/// Lifecycle of the binding to the remote playback service
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Suspended,
    Failed(String),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// Whether a new bind attempt would be a duplicate
    pub fn is_binding(&self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Suspended => write!(f, "suspended"),
            ConnectionState::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// Transient notification published on the connection event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Success,
    /// Catch-all channel: carries real failures as well as informational
    /// session events, so the name alone says nothing about severity.
    Error(String),
}

impl ConnectionEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ConnectionEvent::Error(message.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackStatus {
    #[default]
    None,
    Stopped,
    Paused,
    Playing,
    Buffering,
    Error,
}

impl PlaybackStatus {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackStatus::Playing | PlaybackStatus::Buffering)
    }
}

/// Transport state reported by the playback service
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackSnapshot {
    pub status: PlaybackStatus,
    pub position_ms: u64,
    pub playback_speed: f32,
    pub error_message: Option<String>,
    pub active_media_id: Option<String>,
}

impl PlaybackSnapshot {
    pub fn new(status: PlaybackStatus, position_ms: u64) -> Self {
        Self {
            status,
            position_ms,
            playback_speed: if status == PlaybackStatus::Playing { 1.0 } else { 0.0 },
            error_message: None,
            active_media_id: None,
        }
    }

    pub fn with_media_id(mut self, media_id: impl Into<String>) -> Self {
        self.active_media_id = Some(media_id.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.status = PlaybackStatus::Error;
        self.error_message = Some(message.into());
        self
    }
}

/// Description of the catalog item that is currently active
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackMetadata {
    pub media_id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub artwork_uri: Option<String>,
    pub duration_ms: u64,
}

impl TrackMetadata {
    pub fn new(media_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            media_id: media_id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_artwork_uri(mut self, uri: impl Into<String>) -> Self {
        self.artwork_uri = Some(uri.into());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Text shown under the title: the description, else the subtitle
    pub fn display_description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .or(self.subtitle.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShuffleMode {
    #[default]
    None,
    All,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RepeatMode {
    #[default]
    None,
    One,
    All,
    Group,
}

/// A node of the hierarchical catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub media_id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub browsable: bool,
    pub playable: bool,
}

impl MediaItem {
    pub fn browsable(media_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            media_id: media_id.into(),
            title: title.into(),
            subtitle: None,
            browsable: true,
            playable: false,
        }
    }

    pub fn playable(media_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            media_id: media_id.into(),
            title: title.into(),
            subtitle: None,
            browsable: false,
            playable: true,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }
}

/// Opaque handle that launches the activity owning the session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionActivity {
    pub target: String,
}

impl SessionActivity {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_binding() {
        assert!(ConnectionState::Connecting.is_binding());
        assert!(ConnectionState::Connected.is_binding());
        assert!(!ConnectionState::Suspended.is_binding());
        assert!(!ConnectionState::Failed("connection failed".to_string()).is_binding());
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_display_description_prefers_description() {
        let track = TrackMetadata::new("track:1", "Song")
            .with_subtitle("Artist")
            .with_description("Artist - Album");
        assert_eq!(track.display_description(), Some("Artist - Album"));

        let track = TrackMetadata::new("track:2", "Song").with_subtitle("Artist");
        assert_eq!(track.display_description(), Some("Artist"));

        let track = TrackMetadata::new("track:3", "Song");
        assert_eq!(track.display_description(), None);
    }

    #[test]
    fn test_playback_snapshot_error() {
        let snapshot = PlaybackSnapshot::new(PlaybackStatus::Playing, 1_000).with_error("decoder");
        assert_eq!(snapshot.status, PlaybackStatus::Error);
        assert_eq!(snapshot.error_message.as_deref(), Some("decoder"));
        assert!(!snapshot.status.is_playing());
    }
}
