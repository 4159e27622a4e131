//! Boundary to the remote playback service.
//!
//! The concrete mechanism used to reach the service is supplied by the caller
//! through [`MediaBrowser`] and [`SessionController`]. Everything the service
//! reports back flows through a [`CallbackSink`] as a [`RemoteCallback`].

pub mod callback;
pub mod facade;

use crate::error::Result;
use crate::models::{RepeatMode, SessionActivity, ShuffleMode};
use std::sync::Arc;

pub use callback::{CallbackSink, RemoteCallback};
pub use facade::{TransportCommand, TransportFacade};

/// Binding and catalog side of the remote service
pub trait MediaBrowser: Send + Sync {
    /// Start binding to the service
    ///
    /// Must not block until the binding completes. The outcome is reported
    /// later through `callbacks` (`Connected`, `ConnectionFailed`, ...).
    fn connect(&self, callbacks: CallbackSink) -> Result<()>;

    /// Release the binding
    fn disconnect(&self);

    /// Controller for the session exposed by a connected service
    fn session(&self) -> Result<Arc<dyn SessionController>>;

    /// Subscribe to the children of a catalog node
    fn subscribe(&self, parent_id: &str) -> Result<()>;

    fn unsubscribe(&self, parent_id: &str) -> Result<()>;
}

/// Control surface of a connected playback session
pub trait SessionController: Send + Sync {
    fn play(&self) -> Result<()>;
    fn pause(&self) -> Result<()>;
    fn stop(&self) -> Result<()>;
    fn seek_to(&self, position_ms: u64) -> Result<()>;
    fn skip_to_next(&self) -> Result<()>;
    fn skip_to_previous(&self) -> Result<()>;
    fn fast_forward(&self) -> Result<()>;
    fn rewind(&self) -> Result<()>;
    fn play_from_media_id(&self, media_id: &str) -> Result<()>;
    fn set_shuffle_mode(&self, mode: ShuffleMode) -> Result<()>;
    fn set_repeat_mode(&self, mode: RepeatMode) -> Result<()>;
    fn shuffle_mode(&self) -> ShuffleMode;
    fn repeat_mode(&self) -> RepeatMode;

    /// Launch handle for the activity that owns the session, if any
    fn session_activity(&self) -> Option<SessionActivity>;
}
