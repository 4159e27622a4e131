use crate::models::ConnectionEvent;
use tokio::sync::broadcast;

/// Multicast stream of connection events
///
/// Receivers only see events emitted after they subscribed; nothing is replayed.
pub(crate) struct EventHub {
    tx: broadcast::Sender<ConnectionEvent>,
}

impl EventHub {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub(crate) fn sender(&self) -> broadcast::Sender<ConnectionEvent> {
        self.tx.clone()
    }

    pub(crate) fn emit(&self, event: ConnectionEvent) {
        log::debug!("Connection event: {:?}", event);
        // No receivers is not an error for a fire-and-forget stream
        let _ = self.tx.send(event);
    }
}
