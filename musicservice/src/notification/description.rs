use super::artwork::{Artwork, ArtworkLoader, ArtworkRequest, ArtworkSource};
use crate::connection::ConnectionManager;
use crate::error::{Result, ServiceError};
use crate::models::{SessionActivity, TrackMetadata};
use crate::state::StateObserver;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

type MusicChangedHandler = Arc<dyn Fn() + Send + Sync>;

/// Turns the manager's current state into now-playing text and artwork
///
/// Title, subtitle and launch handle are read synchronously from the state
/// cells. Artwork is fetched in the background and handed over later.
pub struct DescriptionRenderer {
    state: StateObserver,
    loader: Arc<dyn ArtworkLoader>,
    source: ArtworkSource,
    on_music_changed: Option<MusicChangedHandler>,
    latest_request: Arc<AtomicU64>,
    runtime: tokio::runtime::Handle,
}

impl DescriptionRenderer {
    /// Create a renderer over the manager's state cells
    ///
    /// Must be called from within a tokio runtime; artwork fetches are spawned on it.
    pub fn new(manager: &ConnectionManager, loader: Arc<dyn ArtworkLoader>) -> Result<Self> {
        Self::from_observer(manager.observer(), loader)
    }

    pub fn from_observer(state: StateObserver, loader: Arc<dyn ArtworkLoader>) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ServiceError::NoRuntime(e.to_string()))?;

        Ok(Self {
            state,
            loader,
            source: ArtworkSource::default(),
            on_music_changed: None,
            latest_request: Arc::new(AtomicU64::new(0)),
            runtime,
        })
    }

    pub fn with_artwork_source(mut self, source: ArtworkSource) -> Self {
        self.source = source;
        self
    }

    /// Observer notified on every title read
    pub fn with_music_changed<F>(mut self, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_music_changed = Some(Arc::new(handler));
        self
    }

    /// Title of the current track
    ///
    /// Notifies the music-changed observer once per call, even when the track
    /// has not changed since the previous read; consumers use it as a refresh
    /// tick.
    pub fn current_title(&self) -> Option<String> {
        if let Some(ref handler) = self.on_music_changed {
            handler();
        }
        self.state.current_track().map(|track| track.title)
    }

    /// Description text of the current track, falling back to its subtitle
    pub fn current_subtitle(&self) -> Option<String> {
        self.state
            .current_track()
            .and_then(|track| track.display_description().map(str::to_string))
    }

    /// Launch handle of the connected session
    pub fn content_intent(&self) -> Option<SessionActivity> {
        self.state.session_activity()
    }

    /// Artwork URL for the current state, if there is one
    pub fn artwork_url(&self) -> Option<String> {
        resolve_artwork_url(&self.source, self.state.current_track().as_ref())
    }

    /// Start a background artwork fetch
    ///
    /// Starting a new fetch supersedes every earlier one: their requests
    /// resolve to `None` even if their download succeeds.
    pub fn fetch_artwork(&self) -> ArtworkRequest {
        let id = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        let (tx, rx) = oneshot::channel();

        let Some(url) = self.artwork_url() else {
            log::debug!("Artwork request #{}: nothing to fetch", id);
            return ArtworkRequest::new(id, rx);
        };

        let loader = Arc::clone(&self.loader);
        let latest = Arc::clone(&self.latest_request);
        self.runtime.spawn(async move {
            match loader.load(&url).await {
                Ok(artwork) => {
                    if latest.load(Ordering::SeqCst) != id {
                        log::debug!("Discarding superseded artwork request #{}", id);
                        return;
                    }
                    let _ = tx.send(artwork);
                }
                Err(err) => {
                    log::warn!("Artwork request #{} for {} failed: {}", id, url, err);
                }
            }
        });

        ArtworkRequest::new(id, rx)
    }

    /// Artwork for the status display
    ///
    /// Always returns `None`: the bitmap is never available synchronously.
    /// On success `callback` is invoked once from a background task. On
    /// failure or when superseded it is never invoked.
    pub fn large_icon<F>(&self, callback: F) -> Option<Artwork>
    where
        F: FnOnce(Artwork) + Send + 'static,
    {
        let request = self.fetch_artwork();
        self.runtime.spawn(async move {
            if let Some(artwork) = request.await {
                callback(artwork);
            }
        });
        None
    }
}

fn resolve_artwork_url(source: &ArtworkSource, track: Option<&TrackMetadata>) -> Option<String> {
    match source {
        ArtworkSource::Fixed(url) => Some(url.clone()),
        ArtworkSource::Metadata { fallback } => track
            .and_then(|t| t.artwork_uri.clone())
            .or_else(|| fallback.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_fixed_ignores_metadata() {
        let track = TrackMetadata::new("track:1", "One").with_artwork_uri("http://covers/1.png");
        let source = ArtworkSource::Fixed("http://covers/default.png".to_string());

        assert_eq!(
            resolve_artwork_url(&source, Some(&track)).as_deref(),
            Some("http://covers/default.png")
        );
    }

    #[test]
    fn test_resolve_metadata_with_fallback() {
        let source = ArtworkSource::Metadata {
            fallback: Some("http://covers/default.png".to_string()),
        };
        let with_art = TrackMetadata::new("track:1", "One").with_artwork_uri("http://covers/1.png");
        let without_art = TrackMetadata::new("track:2", "Two");

        assert_eq!(
            resolve_artwork_url(&source, Some(&with_art)).as_deref(),
            Some("http://covers/1.png")
        );
        assert_eq!(
            resolve_artwork_url(&source, Some(&without_art)).as_deref(),
            Some("http://covers/default.png")
        );
        assert_eq!(
            resolve_artwork_url(&source, None).as_deref(),
            Some("http://covers/default.png")
        );
    }

    #[test]
    fn test_resolve_metadata_without_fallback() {
        let source = ArtworkSource::default();
        assert!(resolve_artwork_url(&source, None).is_none());
    }
}
