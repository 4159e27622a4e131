use crate::connection::manager::Message;
use crate::models::{Extras, MediaItem, PlaybackSnapshot, TrackMetadata};
use tokio::sync::mpsc;

/// Everything the remote service can report back
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCallback {
    Connected,
    ConnectionFailed,
    ConnectionSuspended,
    SessionDestroyed,
    SessionEvent {
        name: Option<String>,
        extras: Option<Extras>,
    },
    PlaybackStateChanged(Option<PlaybackSnapshot>),
    MetadataChanged(Option<TrackMetadata>),
    ChildrenLoaded {
        parent_id: String,
        children: Vec<MediaItem>,
    },
    ChildrenError {
        parent_id: String,
    },
}

impl RemoteCallback {
    pub fn name(&self) -> &'static str {
        match self {
            RemoteCallback::Connected => "connected",
            RemoteCallback::ConnectionFailed => "connection-failed",
            RemoteCallback::ConnectionSuspended => "connection-suspended",
            RemoteCallback::SessionDestroyed => "session-destroyed",
            RemoteCallback::SessionEvent { .. } => "session-event",
            RemoteCallback::PlaybackStateChanged(_) => "playback-state-changed",
            RemoteCallback::MetadataChanged(_) => "metadata-changed",
            RemoteCallback::ChildrenLoaded { .. } => "children-loaded",
            RemoteCallback::ChildrenError { .. } => "children-error",
        }
    }
}

/// Handle given to a [`MediaBrowser`](super::MediaBrowser) on each bind
///
/// Callbacks are queued onto the connection manager and applied in the order
/// they are dispatched. The sink belongs to one bind attempt: once the manager
/// disconnects or rebinds, anything sent through an older sink is dropped.
/// Cloning is cheap and the sink may be used from any thread.
#[derive(Clone)]
pub struct CallbackSink {
    generation: u64,
    tx: mpsc::WeakUnboundedSender<Message>,
}

impl CallbackSink {
    pub(crate) fn new(generation: u64, tx: mpsc::WeakUnboundedSender<Message>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Queue a callback; returns false when the manager is gone
    pub fn dispatch(&self, callback: RemoteCallback) -> bool {
        let Some(tx) = self.tx.upgrade() else {
            log::debug!(
                "Dropping {} callback: connection manager has shut down",
                callback.name()
            );
            return false;
        };

        tx.send(Message::Remote {
            generation: self.generation,
            callback,
        })
        .is_ok()
    }

    pub fn on_connected(&self) -> bool {
        self.dispatch(RemoteCallback::Connected)
    }

    pub fn on_connection_failed(&self) -> bool {
        self.dispatch(RemoteCallback::ConnectionFailed)
    }

    pub fn on_connection_suspended(&self) -> bool {
        self.dispatch(RemoteCallback::ConnectionSuspended)
    }

    pub fn on_session_destroyed(&self) -> bool {
        self.dispatch(RemoteCallback::SessionDestroyed)
    }

    pub fn on_session_event(&self, name: Option<String>, extras: Option<Extras>) -> bool {
        self.dispatch(RemoteCallback::SessionEvent { name, extras })
    }

    pub fn on_playback_state_changed(&self, state: Option<PlaybackSnapshot>) -> bool {
        self.dispatch(RemoteCallback::PlaybackStateChanged(state))
    }

    pub fn on_metadata_changed(&self, metadata: Option<TrackMetadata>) -> bool {
        self.dispatch(RemoteCallback::MetadataChanged(metadata))
    }

    pub fn on_children_loaded(&self, parent_id: impl Into<String>, children: Vec<MediaItem>) -> bool {
        self.dispatch(RemoteCallback::ChildrenLoaded {
            parent_id: parent_id.into(),
            children,
        })
    }

    pub fn on_children_error(&self, parent_id: impl Into<String>) -> bool {
        self.dispatch(RemoteCallback::ChildrenError {
            parent_id: parent_id.into(),
        })
    }
}

impl std::fmt::Debug for CallbackSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackSink")
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_tags_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = CallbackSink::new(7, tx.downgrade());

        assert!(sink.on_session_event(Some("custom".to_string()), None));

        match rx.try_recv().unwrap() {
            Message::Remote { generation, callback } => {
                assert_eq!(generation, 7);
                assert_eq!(
                    callback,
                    RemoteCallback::SessionEvent {
                        name: Some("custom".to_string()),
                        extras: None
                    }
                );
            }
            _ => panic!("Expected a remote callback message"),
        }
    }

    #[test]
    fn test_dispatch_after_manager_dropped() {
        let (tx, rx) = mpsc::unbounded_channel::<Message>();
        let sink = CallbackSink::new(1, tx.downgrade());
        drop(tx);
        drop(rx);

        assert!(!sink.on_connected());
    }
}
