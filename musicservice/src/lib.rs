pub mod connection;
pub mod error;
mod events;
pub mod models;
pub mod notification;
pub mod state;
pub mod transport;

// Re-export key types for easier access
pub use connection::{
    ConnectionBuilder, ConnectionConfig, ConnectionManager, LifecycleHandlers, SubscriptionCallback,
    SubscriptionId,
};
pub use error::{Result, ServiceError};
pub use models::{
    ConnectionEvent, ConnectionState, Extras, MediaItem, PlaybackSnapshot, PlaybackStatus, RepeatMode,
    SessionActivity, ShuffleMode, TrackMetadata,
};
pub use notification::{
    Artwork, ArtworkLoader, ArtworkSource, DescriptionRenderer, HttpArtworkLoader, NotificationManager,
    NowPlayingCard, StatusDisplay,
};
pub use state::{StateCache, StateObserver};
pub use transport::{CallbackSink, MediaBrowser, RemoteCallback, SessionController, TransportCommand};
