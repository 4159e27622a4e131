use crate::models::{ConnectionState, PlaybackSnapshot, SessionActivity, TrackMetadata};
use tokio::sync::watch;

/// Last-value cells republished from the playback service
///
/// Every update replaces the whole value in one step, so a reader sees either
/// the previous or the new value. New receivers start from the current value
/// without waiting for another update.
pub struct StateCache {
    connection: watch::Sender<ConnectionState>,
    playback: watch::Sender<Option<PlaybackSnapshot>>,
    metadata: watch::Sender<Option<TrackMetadata>>,
    session_activity: watch::Sender<Option<SessionActivity>>,
}

impl StateCache {
    pub fn new() -> Self {
        let (connection, _) = watch::channel(ConnectionState::Disconnected);
        let (playback, _) = watch::channel(None);
        let (metadata, _) = watch::channel(None);
        let (session_activity, _) = watch::channel(None);

        Self {
            connection,
            playback,
            metadata,
            session_activity,
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.borrow().clone()
    }

    pub fn playback_state(&self) -> Option<PlaybackSnapshot> {
        self.playback.borrow().clone()
    }

    pub fn current_track(&self) -> Option<TrackMetadata> {
        self.metadata.borrow().clone()
    }

    pub fn session_activity(&self) -> Option<SessionActivity> {
        self.session_activity.borrow().clone()
    }

    /// Returns the previous state
    pub fn update_connection_state(&self, state: ConnectionState) -> ConnectionState {
        self.connection.send_replace(state)
    }

    pub fn update_playback_state(&self, state: Option<PlaybackSnapshot>) {
        self.playback.send_replace(state);
    }

    pub fn update_metadata(&self, metadata: Option<TrackMetadata>) {
        self.metadata.send_replace(metadata);
    }

    pub fn update_session_activity(&self, activity: Option<SessionActivity>) {
        self.session_activity.send_replace(activity);
    }

    pub fn observer(&self) -> StateObserver {
        StateObserver {
            connection: self.connection.subscribe(),
            playback: self.playback.subscribe(),
            metadata: self.metadata.subscribe(),
            session_activity: self.session_activity.subscribe(),
        }
    }
}

impl Default for StateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of the [`StateCache`] cells
#[derive(Clone)]
pub struct StateObserver {
    connection: watch::Receiver<ConnectionState>,
    playback: watch::Receiver<Option<PlaybackSnapshot>>,
    metadata: watch::Receiver<Option<TrackMetadata>>,
    session_activity: watch::Receiver<Option<SessionActivity>>,
}

impl StateObserver {
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.borrow().clone()
    }

    pub fn playback_state(&self) -> Option<PlaybackSnapshot> {
        self.playback.borrow().clone()
    }

    pub fn current_track(&self) -> Option<TrackMetadata> {
        self.metadata.borrow().clone()
    }

    pub fn session_activity(&self) -> Option<SessionActivity> {
        self.session_activity.borrow().clone()
    }

    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.clone()
    }

    pub fn watch_playback(&self) -> watch::Receiver<Option<PlaybackSnapshot>> {
        self.playback.clone()
    }

    pub fn watch_metadata(&self) -> watch::Receiver<Option<TrackMetadata>> {
        self.metadata.clone()
    }

    pub fn watch_session_activity(&self) -> watch::Receiver<Option<SessionActivity>> {
        self.session_activity.clone()
    }
}
