use super::artwork::Artwork;
use super::description::DescriptionRenderer;
use crate::connection::ConnectionManager;
use crate::error::{Result, ServiceError};
use crate::models::{PlaybackStatus, SessionActivity};
use crate::state::StateObserver;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Content of the persistent now-playing display
#[derive(Debug, Clone, Default)]
pub struct NowPlayingCard {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub status: PlaybackStatus,
    pub content_intent: Option<SessionActivity>,
    pub artwork: Option<Artwork>,
}

impl NowPlayingCard {
    pub fn has_artwork(&self) -> bool {
        self.artwork.is_some()
    }
}

/// Surface that shows the now-playing card
///
/// Called from a background task, so implementations must be thread-safe.
pub trait StatusDisplay: Send + Sync {
    fn render(&self, card: &NowPlayingCard);
    fn clear(&self);
}

/// Keeps a [`StatusDisplay`] in sync with the current track and playback state
pub struct NotificationManager {
    renderer: Arc<DescriptionRenderer>,
    display: Arc<dyn StatusDisplay>,
    state: StateObserver,
    runtime: tokio::runtime::Handle,
    task: Option<JoinHandle<()>>,
}

impl NotificationManager {
    pub fn new(
        manager: &ConnectionManager,
        renderer: DescriptionRenderer,
        display: Arc<dyn StatusDisplay>,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ServiceError::NoRuntime(e.to_string()))?;

        Ok(Self {
            renderer: Arc::new(renderer),
            display,
            state: manager.observer(),
            runtime,
            task: None,
        })
    }

    pub fn renderer(&self) -> &DescriptionRenderer {
        &self.renderer
    }

    pub fn is_showing(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Start showing the card; a no-op when already showing
    pub fn show(&mut self) {
        if self.is_showing() {
            return;
        }

        log::debug!("Showing now-playing display");
        let worker = DisplayWorker {
            renderer: Arc::clone(&self.renderer),
            display: Arc::clone(&self.display),
            state: self.state.clone(),
        };
        self.task = Some(self.runtime.spawn(worker.run()));
    }

    /// Stop updating and clear the display
    pub fn hide(&mut self) {
        if let Some(task) = self.task.take() {
            log::debug!("Hiding now-playing display");
            task.abort();
            self.display.clear();
        }
    }
}

impl Drop for NotificationManager {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct DisplayWorker {
    renderer: Arc<DescriptionRenderer>,
    display: Arc<dyn StatusDisplay>,
    state: StateObserver,
}

impl DisplayWorker {
    async fn run(self) {
        let mut metadata_rx = self.state.watch_metadata();
        let mut playback_rx = self.state.watch_playback();
        let (artwork_tx, mut artwork_rx) = mpsc::unbounded_channel::<Artwork>();

        metadata_rx.borrow_and_update();
        playback_rx.borrow_and_update();

        let mut artwork = None;
        self.request_artwork(&artwork_tx);
        self.render(&artwork);

        loop {
            tokio::select! {
                changed = metadata_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    artwork = None;
                    self.request_artwork(&artwork_tx);
                    self.render(&artwork);
                }
                changed = playback_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.render(&artwork);
                }
                Some(delivered) = artwork_rx.recv() => {
                    // A late delivery for a previous track is dropped
                    if self.renderer.artwork_url().as_deref() == Some(delivered.url.as_str()) {
                        artwork = Some(delivered);
                        self.render(&artwork);
                    }
                }
            }
        }

        log::debug!("Now-playing display task finished");
    }

    fn request_artwork(&self, artwork_tx: &mpsc::UnboundedSender<Artwork>) {
        let artwork_tx = artwork_tx.clone();
        let immediate = self.renderer.large_icon(move |artwork| {
            let _ = artwork_tx.send(artwork);
        });
        debug_assert!(immediate.is_none());
    }

    fn render(&self, artwork: &Option<Artwork>) {
        let card = NowPlayingCard {
            title: self.renderer.current_title(),
            subtitle: self.renderer.current_subtitle(),
            status: self
                .state
                .playback_state()
                .map(|snapshot| snapshot.status)
                .unwrap_or_default(),
            content_intent: self.renderer.content_intent(),
            artwork: artwork.clone(),
        };
        self.display.render(&card);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_card_is_empty() {
        let card = NowPlayingCard::default();
        assert!(card.title.is_none());
        assert!(!card.has_artwork());
        assert_eq!(card.status, PlaybackStatus::None);
    }
}
