use std::sync::{Arc, Mutex};

use musicservice::{NowPlayingCard, StatusDisplay};

/// Status display backed by a panel of the terminal UI
///
/// The notification task writes the card; the draw loop reads it.
#[derive(Clone, Default)]
pub struct TerminalDisplay {
  card: Arc<Mutex<Option<NowPlayingCard>>>,
}

impl TerminalDisplay {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn card(&self) -> Option<NowPlayingCard> {
    self.card.lock().unwrap_or_else(|e| e.into_inner()).clone()
  }
}

impl StatusDisplay for TerminalDisplay {
  fn render(&self, card: &NowPlayingCard) {
    *self.card.lock().unwrap_or_else(|e| e.into_inner()) = Some(card.clone());
  }

  fn clear(&self) {
    *self.card.lock().unwrap_or_else(|e| e.into_inner()) = None;
  }
}
