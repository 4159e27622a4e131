use std::sync::{Arc, Mutex, MutexGuard};

use rand::seq::SliceRandom;

use musicservice::transport::{CallbackSink, MediaBrowser, SessionController};
use musicservice::{
  MediaItem, PlaybackSnapshot, PlaybackStatus, RepeatMode, Result, ServiceError, SessionActivity,
  ShuffleMode, TrackMetadata,
};

pub const ROOT_ID: &str = "root_id";
const SEEK_STEP_MS: u64 = 10_000;
const ACTIVITY_TARGET: &str = "musicservice://now-playing";

struct Genre {
  id: &'static str,
  title: &'static str,
  tracks: Vec<TrackMetadata>,
}

fn track(id: &str, title: &str, artist: &str, duration_ms: u64) -> TrackMetadata {
  TrackMetadata::new(id, title)
    .with_subtitle(artist)
    .with_duration_ms(duration_ms)
}

fn catalog() -> Vec<Genre> {
  vec![
    Genre {
      id: "genre:ambient",
      title: "Ambient",
      tracks: vec![
        track("ambient:1", "Low Tide", "Harbour Lights", 312_000),
        track("ambient:2", "Glasshouse", "Harbour Lights", 254_000),
        track("ambient:3", "Slow Weather", "North Field", 401_000),
      ],
    },
    Genre {
      id: "genre:jazz",
      title: "Jazz",
      tracks: vec![
        track("jazz:1", "Blue Corner", "The Late Set", 287_000),
        track("jazz:2", "Third Avenue", "The Late Set", 233_000),
        track("jazz:3", "Night Ferry", "Ruth Calder Trio", 346_000)
          .with_description("Recorded live, 1998"),
      ],
    },
    Genre {
      id: "genre:rock",
      title: "Rock",
      tracks: vec![
        track("rock:1", "Static Bloom", "Paper Engines", 198_000),
        track("rock:2", "Open Roads", "Paper Engines", 221_000),
      ],
    },
  ]
}

/// Playback state of the in-process service
struct Player {
  genres: Vec<Genre>,
  queue: Vec<TrackMetadata>,
  /// Play order as indices into `queue`
  order: Vec<usize>,
  cursor: usize,
  status: PlaybackStatus,
  position_ms: u64,
  shuffle: ShuffleMode,
  repeat: RepeatMode,
}

impl Player {
  fn new() -> Self {
    Self {
      genres: catalog(),
      queue: Vec::new(),
      order: Vec::new(),
      cursor: 0,
      status: PlaybackStatus::None,
      position_ms: 0,
      shuffle: ShuffleMode::None,
      repeat: RepeatMode::None,
    }
  }

  fn children(&self, parent_id: &str) -> Option<Vec<MediaItem>> {
    if parent_id == ROOT_ID {
      return Some(
        self
          .genres
          .iter()
          .map(|genre| MediaItem::browsable(genre.id, genre.title))
          .collect(),
      );
    }

    self.genres.iter().find(|g| g.id == parent_id).map(|genre| {
      genre
        .tracks
        .iter()
        .map(|t| {
          let item = MediaItem::playable(t.media_id.clone(), t.title.clone());
          match t.subtitle {
            Some(ref artist) => item.with_subtitle(artist.clone()),
            None => item,
          }
        })
        .collect()
    })
  }

  fn load_queue(&mut self, genre_id: &str) -> bool {
    let Some(genre) = self.genres.iter().find(|g| g.id == genre_id) else {
      return false;
    };
    self.queue = genre.tracks.clone();
    self.cursor = 0;
    self.position_ms = 0;
    self.reorder();
    true
  }

  fn reorder(&mut self) {
    self.order = (0..self.queue.len()).collect();
    if self.shuffle != ShuffleMode::None {
      self.order.shuffle(&mut rand::thread_rng());
    }
  }

  fn current(&self) -> Option<&TrackMetadata> {
    self.order.get(self.cursor).and_then(|&i| self.queue.get(i))
  }

  fn snapshot(&self) -> PlaybackSnapshot {
    let snapshot = PlaybackSnapshot::new(self.status, self.position_ms);
    match self.current() {
      Some(track) => snapshot.with_media_id(track.media_id.clone()),
      None => snapshot,
    }
  }

  fn step(&mut self, forward: bool) -> bool {
    if self.order.is_empty() {
      return false;
    }

    if self.repeat == RepeatMode::One {
      self.position_ms = 0;
      return true;
    }

    let last = self.order.len() - 1;
    let next = match (forward, self.cursor) {
      (true, c) if c < last => Some(c + 1),
      (true, _) => (self.repeat != RepeatMode::None).then_some(0),
      (false, 0) => (self.repeat != RepeatMode::None).then_some(last),
      (false, c) => Some(c - 1),
    };

    match next {
      Some(cursor) => {
        self.cursor = cursor;
        self.position_ms = 0;
        true
      }
      None => false,
    }
  }
}

struct Shared {
  player: Mutex<Player>,
  sink: Mutex<Option<CallbackSink>>,
}

impl Shared {
  fn player(&self) -> MutexGuard<'_, Player> {
    self.player.lock().unwrap_or_else(|e| e.into_inner())
  }

  fn sink(&self) -> Option<CallbackSink> {
    self.sink.lock().unwrap_or_else(|e| e.into_inner()).clone()
  }

  /// Report the player's state back through the current binding
  fn publish(&self, metadata_changed: bool) {
    let Some(sink) = self.sink() else {
      return;
    };

    let (snapshot, track) = {
      let player = self.player();
      (player.snapshot(), player.current().cloned())
    };
    if metadata_changed {
      sink.on_metadata_changed(track);
    }
    sink.on_playback_state_changed(Some(snapshot));
  }
}

/// Playback service living in the same process, standing in for a remote one
#[derive(Clone)]
pub struct LoopbackService {
  shared: Arc<Shared>,
}

impl LoopbackService {
  pub fn new() -> Self {
    Self {
      shared: Arc::new(Shared {
        player: Mutex::new(Player::new()),
        sink: Mutex::new(None),
      }),
    }
  }
}

impl Default for LoopbackService {
  fn default() -> Self {
    Self::new()
  }
}

impl MediaBrowser for LoopbackService {
  fn connect(&self, callbacks: CallbackSink) -> Result<()> {
    log::info!("Loopback service bound (#{})", callbacks.generation());
    callbacks.on_connected();
    *self.shared.sink.lock().unwrap_or_else(|e| e.into_inner()) = Some(callbacks);
    self.shared.publish(true);
    Ok(())
  }

  fn disconnect(&self) {
    log::info!("Loopback service released");
    *self.shared.sink.lock().unwrap_or_else(|e| e.into_inner()) = None;
  }

  fn session(&self) -> Result<Arc<dyn SessionController>> {
    Ok(Arc::new(self.clone()))
  }

  fn subscribe(&self, parent_id: &str) -> Result<()> {
    let Some(sink) = self.shared.sink() else {
      return Err(ServiceError::not_connected("subscribe"));
    };

    let children = {
      let mut player = self.shared.player();
      let children = player.children(parent_id);
      if children.is_some() && parent_id != ROOT_ID {
        player.load_queue(parent_id);
      }
      children
    };

    match children {
      Some(children) => {
        sink.on_children_loaded(parent_id, children);
        self.shared.publish(true);
      }
      None => {
        sink.on_children_error(parent_id);
      }
    }
    Ok(())
  }

  fn unsubscribe(&self, parent_id: &str) -> Result<()> {
    log::debug!("Loopback catalog unsubscribed from '{}'", parent_id);
    Ok(())
  }
}

impl SessionController for LoopbackService {
  fn play(&self) -> Result<()> {
    {
      let mut player = self.shared.player();
      if player.current().is_none() {
        return Err(ServiceError::remote("nothing queued"));
      }
      player.status = PlaybackStatus::Playing;
    }
    self.shared.publish(false);
    Ok(())
  }

  fn pause(&self) -> Result<()> {
    self.shared.player().status = PlaybackStatus::Paused;
    self.shared.publish(false);
    Ok(())
  }

  fn stop(&self) -> Result<()> {
    {
      let mut player = self.shared.player();
      player.status = PlaybackStatus::Stopped;
      player.position_ms = 0;
    }
    self.shared.publish(false);
    Ok(())
  }

  fn seek_to(&self, position_ms: u64) -> Result<()> {
    {
      let mut player = self.shared.player();
      let duration = player.current().map(|t| t.duration_ms).unwrap_or(0);
      player.position_ms = position_ms.min(duration);
    }
    self.shared.publish(false);
    Ok(())
  }

  fn skip_to_next(&self) -> Result<()> {
    if !self.shared.player().step(true) {
      return Err(ServiceError::remote("end of queue"));
    }
    self.shared.publish(true);
    Ok(())
  }

  fn skip_to_previous(&self) -> Result<()> {
    if !self.shared.player().step(false) {
      return Err(ServiceError::remote("start of queue"));
    }
    self.shared.publish(true);
    Ok(())
  }

  fn fast_forward(&self) -> Result<()> {
    let position_ms = self.shared.player().position_ms;
    self.seek_to(position_ms.saturating_add(SEEK_STEP_MS))
  }

  fn rewind(&self) -> Result<()> {
    let position_ms = self.shared.player().position_ms;
    self.seek_to(position_ms.saturating_sub(SEEK_STEP_MS))
  }

  fn play_from_media_id(&self, media_id: &str) -> Result<()> {
    {
      let mut player = self.shared.player();
      let genre_id = player
        .genres
        .iter()
        .find(|g| g.tracks.iter().any(|t| t.media_id == media_id))
        .map(|g| g.id)
        .ok_or_else(|| ServiceError::remote(format!("unknown media id '{}'", media_id)))?;

      player.load_queue(genre_id);
      let position = player
        .order
        .iter()
        .position(|&i| player.queue[i].media_id == media_id)
        .unwrap_or(0);
      player.cursor = position;
      player.status = PlaybackStatus::Playing;
    }
    self.shared.publish(true);
    Ok(())
  }

  fn set_shuffle_mode(&self, mode: ShuffleMode) -> Result<()> {
    let mut player = self.shared.player();
    let current = player.order.get(player.cursor).copied();
    player.shuffle = mode;
    player.reorder();
    if let Some(index) = current {
      player.cursor = player.order.iter().position(|&i| i == index).unwrap_or(0);
    }
    Ok(())
  }

  fn set_repeat_mode(&self, mode: RepeatMode) -> Result<()> {
    self.shared.player().repeat = mode;
    Ok(())
  }

  fn shuffle_mode(&self) -> ShuffleMode {
    self.shared.player().shuffle
  }

  fn repeat_mode(&self) -> RepeatMode {
    self.shared.player().repeat
  }

  fn session_activity(&self) -> Option<SessionActivity> {
    Some(SessionActivity::new(ACTIVITY_TARGET))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_root_lists_genres() {
    let player = Player::new();
    let children = player.children(ROOT_ID).unwrap();

    assert_eq!(children.len(), 3);
    assert!(children.iter().all(|item| item.browsable));
  }

  #[test]
  fn test_unknown_node_has_no_children() {
    let player = Player::new();
    assert!(player.children("genre:polka").is_none());
  }

  #[test]
  fn test_step_stops_at_queue_end_without_repeat() {
    let mut player = Player::new();
    assert!(player.load_queue("genre:rock"));

    assert!(player.step(true));
    assert!(!player.step(true));
    assert_eq!(player.current().map(|t| t.media_id.as_str()), Some("rock:2"));
  }

  #[test]
  fn test_step_wraps_with_repeat_all() {
    let mut player = Player::new();
    player.load_queue("genre:rock");
    player.repeat = RepeatMode::All;

    assert!(player.step(false));
    assert_eq!(player.current().map(|t| t.media_id.as_str()), Some("rock:2"));
    assert!(player.step(true));
    assert_eq!(player.current().map(|t| t.media_id.as_str()), Some("rock:1"));
  }

  #[test]
  fn test_shuffle_keeps_every_track() {
    let service = LoopbackService::new();
    service.shared.player().load_queue("genre:ambient");

    service.set_shuffle_mode(ShuffleMode::All).unwrap();

    let player = service.shared.player();
    let mut order = player.order.clone();
    order.sort_unstable();
    assert_eq!(order, vec![0, 1, 2]);
  }

  #[test]
  fn test_play_requires_queue() {
    let service = LoopbackService::new();
    assert!(matches!(service.play(), Err(ServiceError::Remote(_))));

    service.play_from_media_id("jazz:2").unwrap();
    assert_eq!(service.shared.player().status, PlaybackStatus::Playing);
    assert_eq!(
      service.shared.player().current().map(|t| t.title.as_str()),
      Some("Third Avenue")
    );
  }
}
