use super::interface::LifecycleHandlers;
use super::subscription::{SubscriptionCallback, SubscriptionId, SubscriptionRegistry};
use super::types::ConnectionConfig;
use crate::error::{Result, ServiceError};
use crate::events::EventHub;
use crate::models::{
    ConnectionEvent, ConnectionState, Extras, PlaybackSnapshot, RepeatMode, SessionActivity,
    ShuffleMode, TrackMetadata,
};
use crate::state::{StateCache, StateObserver};
use crate::transport::{
    CallbackSink, MediaBrowser, RemoteCallback, TransportCommand, TransportFacade,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

pub(crate) const CONNECTION_FAILED: &str = "connection failed";
pub(crate) const CONNECTION_SUSPENDED: &str = "connection suspended";
pub(crate) const UNKNOWN_SESSION_EVENT: &str = "an unknown error occurred";

/// Work items processed by the connection actor, in arrival order
pub(crate) enum Message {
    Remote {
        generation: u64,
        callback: RemoteCallback,
    },
    Connect {
        reply: oneshot::Sender<Result<()>>,
    },
    Disconnect {
        reply: oneshot::Sender<()>,
    },
    Command {
        command: TransportCommand,
        reply: oneshot::Sender<Result<()>>,
    },
    Subscribe {
        parent_id: String,
        callback: Arc<SubscriptionCallback>,
        reply: oneshot::Sender<Result<SubscriptionId>>,
    },
    Unsubscribe {
        parent_id: String,
        reply: oneshot::Sender<()>,
    },
    ShuffleMode {
        reply: oneshot::Sender<Result<ShuffleMode>>,
    },
    RepeatMode {
        reply: oneshot::Sender<Result<RepeatMode>>,
    },
    /// Replies once every earlier message has been applied
    Barrier {
        reply: oneshot::Sender<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Client-side manager for the connection to a remote playback service
///
/// This is a cheap, cloneable handle. All state lives in a single task that
/// applies commands and remote callbacks one at a time, so observers never see
/// a half-applied update. The task stops on [`shutdown`](Self::shutdown) or
/// once every handle is dropped.
///
/// Transport commands issued while not connected fail with
/// [`ServiceError::NotConnected`]; they are never queued for later delivery.
#[derive(Clone)]
pub struct ConnectionManager {
    tx: mpsc::UnboundedSender<Message>,
    observer: StateObserver,
    events: broadcast::Sender<ConnectionEvent>,
    root_id: Arc<str>,
}

impl ConnectionManager {
    pub(crate) fn spawn(
        browser: Arc<dyn MediaBrowser>,
        config: ConnectionConfig,
        handlers: LifecycleHandlers,
        runtime: &tokio::runtime::Handle,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = StateCache::new();
        let events = EventHub::new(config.event_buffer_size);

        let manager = Self {
            tx: tx.clone(),
            observer: state.observer(),
            events: events.sender(),
            root_id: Arc::from(config.root_id.as_str()),
        };

        let actor = ConnectionActor {
            config,
            browser,
            state,
            events,
            handlers,
            subscriptions: SubscriptionRegistry::new(),
            transport: None,
            generation: 0,
            weak_tx: tx.downgrade(),
        };
        runtime.spawn(actor.run(rx));

        manager
    }

    /// Start binding to the service; a no-op while connecting or connected
    ///
    /// Returns once the bind has been requested. Completion is reported on the
    /// event stream and the connection-state cell.
    pub async fn connect(&self) -> Result<()> {
        self.request(|reply| Message::Connect { reply }).await?
    }

    /// Release the binding and drop every catalog subscription
    pub async fn disconnect(&self) -> Result<()> {
        self.request(|reply| Message::Disconnect { reply }).await
    }

    /// Disconnect and stop the manager task
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Message::Shutdown { reply }).await
    }

    /// Wait for a pending bind to settle
    ///
    /// Includes a bind requested by [`ConnectionBuilder::start`](super::ConnectionBuilder::start)
    /// when auto-connect is enabled.
    pub async fn wait_connected(&self) -> Result<()> {
        self.request(|reply| Message::Barrier { reply }).await?;

        let mut rx = self.observer.watch_connection();
        let state = rx
            .wait_for(|state| *state != ConnectionState::Connecting)
            .await
            .map_err(|_| ServiceError::Shutdown)?
            .clone();

        match state {
            ConnectionState::Connected => Ok(()),
            ConnectionState::Failed(reason) => Err(ServiceError::BindFailure(reason)),
            ConnectionState::Suspended => Err(ServiceError::Suspended),
            _ => Err(ServiceError::not_connected("wait_connected")),
        }
    }

    pub async fn play(&self) -> Result<()> {
        self.command(TransportCommand::Play).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.command(TransportCommand::Pause).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.command(TransportCommand::Stop).await
    }

    pub async fn seek_to(&self, position_ms: u64) -> Result<()> {
        self.command(TransportCommand::SeekTo(position_ms)).await
    }

    pub async fn skip_to_next(&self) -> Result<()> {
        self.command(TransportCommand::SkipToNext).await
    }

    pub async fn skip_to_previous(&self) -> Result<()> {
        self.command(TransportCommand::SkipToPrevious).await
    }

    pub async fn fast_forward(&self) -> Result<()> {
        self.command(TransportCommand::FastForward).await
    }

    pub async fn rewind(&self) -> Result<()> {
        self.command(TransportCommand::Rewind).await
    }

    pub async fn play_from_media_id(&self, media_id: impl Into<String>) -> Result<()> {
        self.command(TransportCommand::PlayFromMediaId(media_id.into()))
            .await
    }

    pub async fn set_shuffle_mode(&self, mode: ShuffleMode) -> Result<()> {
        self.command(TransportCommand::SetShuffleMode(mode)).await
    }

    pub async fn set_repeat_mode(&self, mode: RepeatMode) -> Result<()> {
        self.command(TransportCommand::SetRepeatMode(mode)).await
    }

    pub async fn command(&self, command: TransportCommand) -> Result<()> {
        self.request(|reply| Message::Command { command, reply })
            .await?
    }

    pub async fn shuffle_mode(&self) -> Result<ShuffleMode> {
        self.request(|reply| Message::ShuffleMode { reply }).await?
    }

    pub async fn repeat_mode(&self) -> Result<RepeatMode> {
        self.request(|reply| Message::RepeatMode { reply }).await?
    }

    /// Subscribe to a catalog node
    ///
    /// Any node other than the catalog root also starts playback: picking a
    /// category or item is treated as picking something to play. Each call on
    /// a non-root node issues exactly one `play`.
    pub async fn subscribe(
        &self,
        parent_id: impl Into<String>,
        callback: SubscriptionCallback,
    ) -> Result<SubscriptionId> {
        let parent_id = parent_id.into();
        let callback = Arc::new(callback);
        self.request(|reply| Message::Subscribe {
            parent_id,
            callback,
            reply,
        })
        .await?
    }

    /// Drop every subscription on `parent_id`; a no-op when there are none
    pub async fn unsubscribe(&self, parent_id: impl Into<String>) -> Result<()> {
        let parent_id = parent_id.into();
        self.request(|reply| Message::Unsubscribe { parent_id, reply })
            .await
    }

    /// Connection events from now on; past events are not replayed
    pub fn events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    pub fn observer(&self) -> StateObserver {
        self.observer.clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.observer.connection_state()
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state().is_connected()
    }

    pub fn playback_state(&self) -> Option<PlaybackSnapshot> {
        self.observer.playback_state()
    }

    pub fn current_track(&self) -> Option<TrackMetadata> {
        self.observer.current_track()
    }

    pub fn session_activity(&self) -> Option<SessionActivity> {
        self.observer.session_activity()
    }

    pub fn watch_connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.observer.watch_connection()
    }

    pub fn watch_playback_state(&self) -> watch::Receiver<Option<PlaybackSnapshot>> {
        self.observer.watch_playback()
    }

    pub fn watch_current_track(&self) -> watch::Receiver<Option<TrackMetadata>> {
        self.observer.watch_metadata()
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    pub(crate) fn send(&self, message: Message) -> Result<()> {
        self.tx.send(message).map_err(|_| ServiceError::Shutdown)
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Message) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.send(build(reply))?;
        response.await.map_err(|_| ServiceError::Shutdown)
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.connection_state())
            .field("root_id", &self.root_id)
            .finish()
    }
}

/// Sole owner of the connection state
struct ConnectionActor {
    config: ConnectionConfig,
    browser: Arc<dyn MediaBrowser>,
    state: StateCache,
    events: EventHub,
    handlers: LifecycleHandlers,
    subscriptions: SubscriptionRegistry,
    /// Present exactly while the state is `Connected`
    transport: Option<TransportFacade>,
    /// Bumped on every bind and release; callbacks from older binds are stale
    generation: u64,
    weak_tx: mpsc::WeakUnboundedSender<Message>,
}

impl ConnectionActor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Message>) {
        log::debug!("Connection manager started");

        while let Some(message) = rx.recv().await {
            match message {
                Message::Shutdown { reply } => {
                    self.disconnect();
                    let _ = reply.send(());
                    break;
                }
                other => self.handle(other),
            }
        }

        // Every handle dropped without an explicit shutdown
        self.disconnect();
        log::debug!("Connection manager stopped");
    }

    fn handle(&mut self, message: Message) {
        match message {
            Message::Remote {
                generation,
                callback,
            } => self.on_remote(generation, callback),
            Message::Connect { reply } => {
                let _ = reply.send(self.connect());
            }
            Message::Disconnect { reply } => {
                self.disconnect();
                let _ = reply.send(());
            }
            Message::Command { command, reply } => {
                let _ = reply.send(self.execute(command));
            }
            Message::Subscribe {
                parent_id,
                callback,
                reply,
            } => {
                let _ = reply.send(self.subscribe(parent_id, callback));
            }
            Message::Unsubscribe { parent_id, reply } => {
                self.unsubscribe(&parent_id);
                let _ = reply.send(());
            }
            Message::ShuffleMode { reply } => {
                let mode = self
                    .transport
                    .as_ref()
                    .map(|t| t.shuffle_mode())
                    .ok_or_else(|| ServiceError::not_connected("shuffle_mode"));
                let _ = reply.send(mode);
            }
            Message::RepeatMode { reply } => {
                let mode = self
                    .transport
                    .as_ref()
                    .map(|t| t.repeat_mode())
                    .ok_or_else(|| ServiceError::not_connected("repeat_mode"));
                let _ = reply.send(mode);
            }
            Message::Barrier { reply } => {
                let _ = reply.send(());
            }
            Message::Shutdown { reply } => {
                // Handled by the run loop
                let _ = reply.send(());
            }
        }
    }

    fn connect(&mut self) -> Result<()> {
        let current = self.state.connection_state();
        if current.is_binding() {
            log::debug!("connect() ignored: already {}", current);
            return Ok(());
        }

        if current != ConnectionState::Disconnected {
            // Release the suspended or failed binding before trying again
            self.browser.disconnect();
        }

        self.generation += 1;
        self.state.update_connection_state(ConnectionState::Connecting);
        log::info!("Binding to playback service (attempt #{})", self.generation);

        let sink = CallbackSink::new(self.generation, self.weak_tx.clone());
        if let Err(err) = self.browser.connect(sink) {
            log::warn!("Bind request rejected: {}", err);
            self.on_connection_failed();
            return Err(match err {
                ServiceError::BindFailure(reason) => ServiceError::BindFailure(reason),
                other => ServiceError::BindFailure(other.to_string()),
            });
        }
        Ok(())
    }

    fn disconnect(&mut self) {
        let previous = self.state.connection_state();
        if previous == ConnectionState::Disconnected {
            return;
        }

        log::info!("Releasing playback service binding ({})", previous);
        self.browser.disconnect();
        self.generation += 1;
        self.transport = None;
        let dropped = self.subscriptions.len();
        if dropped != 0 {
            log::debug!("Dropping {} catalog subscription(s)", dropped);
        }
        self.subscriptions.clear();
        self.state.update_session_activity(None);
        self.state.update_connection_state(ConnectionState::Disconnected);

        if previous.is_connected() {
            self.handlers.disconnected();
        }
    }

    fn on_remote(&mut self, generation: u64, callback: RemoteCallback) {
        if generation != self.generation {
            log::debug!(
                "Ignoring {} from released binding #{} (current #{})",
                callback.name(),
                generation,
                self.generation
            );
            return;
        }

        match callback {
            RemoteCallback::Connected => self.on_connected(),
            RemoteCallback::ConnectionFailed => self.on_connection_failed(),
            RemoteCallback::ConnectionSuspended => self.on_connection_suspended(),
            RemoteCallback::SessionDestroyed => {
                log::debug!("Remote session destroyed");
                self.on_connection_suspended();
            }
            RemoteCallback::SessionEvent { name, extras } => self.on_session_event(name, extras),
            RemoteCallback::PlaybackStateChanged(state) => {
                log::debug!("Playback state changed: {:?}", state);
                self.state.update_playback_state(state);
            }
            RemoteCallback::MetadataChanged(metadata) => {
                log::debug!(
                    "Metadata changed to {:?}",
                    metadata.as_ref().map(|m| m.title.as_str())
                );
                self.state.update_metadata(metadata);
            }
            RemoteCallback::ChildrenLoaded {
                parent_id,
                children,
            } => {
                let delivered = self.subscriptions.dispatch_children(&parent_id, &children);
                if delivered == 0 {
                    log::debug!("No subscriber for children of '{}'", parent_id);
                }
            }
            RemoteCallback::ChildrenError { parent_id } => {
                log::warn!("Catalog failed to load children of '{}'", parent_id);
                self.subscriptions.dispatch_error(&parent_id);
            }
        }
    }

    fn on_connected(&mut self) {
        // Never keep two facades alive for the same session
        self.transport = None;

        let controller = match self.browser.session() {
            Ok(controller) => controller,
            Err(err) => {
                log::warn!("Connected but no session is available: {}", err);
                self.on_connection_failed();
                return;
            }
        };

        let facade = TransportFacade::new(controller, self.generation);
        self.state.update_session_activity(facade.session_activity());
        self.transport = Some(facade);
        self.state.update_connection_state(ConnectionState::Connected);
        log::info!("Connected to playback service (#{})", self.generation);

        for parent_id in self.subscriptions.parent_ids() {
            if let Err(err) = self.browser.subscribe(&parent_id) {
                log::warn!("Failed to restore subscription on '{}': {}", parent_id, err);
            }
        }

        self.events.emit(ConnectionEvent::Success);
        self.handlers.connected();
    }

    fn on_connection_failed(&mut self) {
        let was_connected = self.drop_session();
        self.state
            .update_connection_state(ConnectionState::Failed(CONNECTION_FAILED.to_string()));
        log::warn!("Connection to playback service failed");

        self.events.emit(ConnectionEvent::error(CONNECTION_FAILED));
        self.handlers
            .error(ServiceError::BindFailure(CONNECTION_FAILED.to_string()));
        if was_connected {
            self.handlers.disconnected();
        }
    }

    fn on_connection_suspended(&mut self) {
        let was_connected = self.drop_session();
        self.state.update_connection_state(ConnectionState::Suspended);
        log::warn!("Connection to playback service suspended");

        self.events.emit(ConnectionEvent::error(CONNECTION_SUSPENDED));
        self.handlers.error(ServiceError::Suspended);
        if was_connected {
            self.handlers.disconnected();
        }
    }

    fn on_session_event(&mut self, name: Option<String>, extras: Option<Extras>) {
        let message = name.unwrap_or_else(|| UNKNOWN_SESSION_EVENT.to_string());
        log::debug!("Session event '{}' (extras: {:?})", message, extras);

        self.events.emit(ConnectionEvent::Error(message.clone()));
        self.handlers.error(ServiceError::SessionEvent(message));
    }

    /// Returns whether a session was live
    fn drop_session(&mut self) -> bool {
        let was_connected = self.transport.take().is_some();
        self.state.update_session_activity(None);
        was_connected
    }

    fn execute(&self, command: TransportCommand) -> Result<()> {
        match self.transport.as_ref() {
            Some(transport) => transport.execute(&command),
            None => {
                log::warn!(
                    "Rejecting {}: playback service is {}",
                    command,
                    self.state.connection_state()
                );
                Err(ServiceError::not_connected(command.name()))
            }
        }
    }

    fn subscribe(
        &mut self,
        parent_id: String,
        callback: Arc<SubscriptionCallback>,
    ) -> Result<SubscriptionId> {
        let Some(transport) = self.transport.as_ref() else {
            log::warn!("Rejecting subscribe('{}'): not connected", parent_id);
            return Err(ServiceError::not_connected("subscribe"));
        };

        let (id, first) = self.subscriptions.add(&parent_id, callback);
        if first {
            if let Err(err) = self.browser.subscribe(&parent_id) {
                self.subscriptions.remove(&parent_id);
                return Err(err);
            }
        }

        if !self.config.is_root(&parent_id) {
            // Subscribing to anything below the root means "play this"
            if let Err(err) = transport.execute(&TransportCommand::Play) {
                log::warn!("Auto-play after subscribing to '{}' failed: {}", parent_id, err);
            }
        }

        Ok(id)
    }

    fn unsubscribe(&mut self, parent_id: &str) {
        let removed = self.subscriptions.remove(parent_id);
        if removed == 0 {
            log::debug!("unsubscribe('{}') ignored: not subscribed", parent_id);
            return;
        }

        if self.transport.is_some() {
            if let Err(err) = self.browser.unsubscribe(parent_id) {
                log::warn!("Failed to unsubscribe from '{}': {}", parent_id, err);
            }
        }
        log::debug!("Removed {} subscription(s) on '{}'", removed, parent_id);
    }
}
