mod display;
mod keymap;
mod loopback;
mod view;
mod widget;

use std::collections::VecDeque;
use std::fs::File;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{self, KeyEvent};
use ratatui::{DefaultTerminal, Frame};
use simplelog::{Config, LevelFilter, WriteLogger};
use tokio::sync::broadcast::{self, error::TryRecvError};

use musicservice::{
  ArtworkSource, ConnectionBuilder, ConnectionEvent, ConnectionManager, DescriptionRenderer,
  HttpArtworkLoader, MediaItem, NotificationManager, RepeatMode, ShuffleMode,
  SubscriptionCallback,
};

use display::TerminalDisplay;
use keymap::Action;
use loopback::{LoopbackService, ROOT_ID};
use view::now_playing::{self, Screen};
use widget::selectable_list::SelectableList;

const DEFAULT_LOG_FILE: &str = "musicservice.log";
const EVENT_LOG_LEN: usize = 5;
const TICK: Duration = Duration::from_millis(100);

fn main() -> io::Result<()> {
  init_logging()?;

  let runtime = tokio::runtime::Runtime::new()?;
  let _guard = runtime.enter();
  let mut app = App::new(runtime.handle().clone())?;

  let mut terminal = ratatui::init();
  let app_result = app.run(&mut terminal);
  ratatui::restore();

  app.shutdown();
  app_result
}

fn init_logging() -> io::Result<()> {
  let path = std::env::var("MUSICSERVICE_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
  WriteLogger::init(LevelFilter::Debug, Config::default(), File::create(path)?)
    .map_err(io::Error::other)
}

fn artwork_source() -> ArtworkSource {
  match std::env::var("MUSICSERVICE_ARTWORK_URL") {
    Ok(url) if !url.trim().is_empty() => ArtworkSource::Fixed(url),
    _ => ArtworkSource::default(),
  }
}

pub struct App {
  runtime: tokio::runtime::Handle,
  manager: ConnectionManager,
  notifications: NotificationManager,
  display: TerminalDisplay,
  events: broadcast::Receiver<ConnectionEvent>,
  event_log: VecDeque<String>,
  genres: Arc<Mutex<Vec<MediaItem>>>,
  list: SelectableList,
  open_genre: Option<String>,
  exit: bool,
}

impl App {
  pub fn new(runtime: tokio::runtime::Handle) -> io::Result<Self> {
    let manager = ConnectionBuilder::new(Arc::new(LoopbackService::new()))
      .with_root_id(ROOT_ID)
      .start()
      .map_err(io::Error::other)?;
    let events = manager.events();

    let loader = HttpArtworkLoader::new(Duration::from_secs(5)).map_err(io::Error::other)?;
    let renderer = DescriptionRenderer::new(&manager, Arc::new(loader))
      .map_err(io::Error::other)?
      .with_artwork_source(artwork_source())
      .with_music_changed(|| log::trace!("Now-playing card refreshed"));

    let display = TerminalDisplay::new();
    let mut notifications = NotificationManager::new(&manager, renderer, Arc::new(display.clone()))
      .map_err(io::Error::other)?;
    notifications.show();

    let mut app = Self {
      runtime,
      manager,
      notifications,
      display,
      events,
      event_log: VecDeque::with_capacity(EVENT_LOG_LEN),
      genres: Arc::new(Mutex::new(Vec::new())),
      list: SelectableList::new("Genres", Vec::new()),
      open_genre: None,
      exit: false,
    };
    app.browse_root();
    Ok(app)
  }

  pub fn run(&mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
    while !self.exit {
      self.sync_catalog();
      self.drain_events();
      terminal.draw(|frame| self.draw(frame))?;

      if event::poll(TICK)? {
        if let event::Event::Key(key_event) = event::read()? {
          self.handle_key(key_event);
        }
      }
    }
    Ok(())
  }

  pub fn shutdown(&mut self) {
    self.notifications.hide();
    if let Err(err) = self.runtime.block_on(self.manager.shutdown()) {
      log::warn!("Shutdown failed: {}", err);
    }
  }

  fn draw(&mut self, frame: &mut Frame) {
    let connection = self.manager.connection_state();
    let playback = self.manager.playback_state();
    let card = self.display.card();
    let events: Vec<String> = self.event_log.iter().cloned().collect();
    let (shuffle, repeat) = self.modes();

    let screen = Screen {
      connection: &connection,
      playback: playback.as_ref(),
      card: card.as_ref(),
      shuffle,
      repeat,
      events: &events,
    };
    now_playing::draw(frame, &mut self.list, &screen);
  }

  fn handle_key(&mut self, key_event: KeyEvent) {
    let Some(action) = keymap::action_for(key_event) else {
      return;
    };

    match action {
      Action::Quit => self.exit = true,
      Action::SelectUp => {
        self.list.previous();
      }
      Action::SelectDown => {
        self.list.next();
      }
      Action::ToggleDisplay => {
        if self.notifications.is_showing() {
          self.notifications.hide();
        } else {
          self.notifications.show();
        }
      }
      Action::Connect => self.connect(),
      Action::Disconnect => {
        self.open_genre = None;
        let result = self.runtime.block_on(self.manager.disconnect());
        self.report("disconnect", result);
      }
      Action::OpenSelected => self.open_selected(),
      other => self.transport(other),
    }
  }

  fn transport(&mut self, action: Action) {
    let manager = self.manager.clone();
    let result = self.runtime.block_on(async move {
      match action {
        Action::TogglePlayback => {
          let playing = manager
            .playback_state()
            .is_some_and(|state| state.status.is_playing());
          if playing {
            manager.pause().await
          } else {
            manager.play().await
          }
        }
        Action::Stop => manager.stop().await,
        Action::Next => manager.skip_to_next().await,
        Action::Previous => manager.skip_to_previous().await,
        Action::FastForward => manager.fast_forward().await,
        Action::Rewind => manager.rewind().await,
        Action::CycleShuffle => {
          let mode = manager.shuffle_mode().await?;
          manager.set_shuffle_mode(next_shuffle(mode)).await
        }
        Action::CycleRepeat => {
          let mode = manager.repeat_mode().await?;
          manager.set_repeat_mode(next_repeat(mode)).await
        }
        _ => Ok(()),
      }
    });
    self.report(&format!("{:?}", action), result);
  }

  fn connect(&mut self) {
    let result = self.runtime.block_on(async {
      self.manager.connect().await?;
      self.manager.wait_connected().await
    });
    if result.is_ok() {
      self.browse_root();
    } else {
      self.report("connect", result);
    }
  }

  /// Load the genre list; needs a connection
  fn browse_root(&mut self) {
    let genres = self.genres.clone();
    let callback = SubscriptionCallback::new()
      .on_children_loaded(move |_, children| {
        *genres.lock().unwrap_or_else(|e| e.into_inner()) = children.to_vec();
      })
      .on_error(|parent_id| log::warn!("Catalog node '{}' failed to load", parent_id));

    let result = self.runtime.block_on(async {
      self.manager.wait_connected().await?;
      self.manager.subscribe(ROOT_ID, callback).await
    });
    if let Err(err) = result {
      self.push_log(format!("browse: {}", err));
    }
  }

  fn open_selected(&mut self) {
    let Some(genre) = self.list.selected().map(|item| item.media_id.clone()) else {
      return;
    };

    let previous = self.open_genre.replace(genre.clone());
    let result = self.runtime.block_on(async {
      if let Some(previous) = previous {
        self.manager.unsubscribe(previous).await?;
      }
      // Subscribing to a genre queues it and starts playback
      self.manager.subscribe(genre, SubscriptionCallback::new()).await
    });
    if let Err(err) = result {
      self.open_genre = None;
      self.push_log(format!("open: {}", err));
    }
  }

  fn modes(&self) -> (ShuffleMode, RepeatMode) {
    if !self.manager.is_connected() {
      return (ShuffleMode::None, RepeatMode::None);
    }
    self.runtime.block_on(async {
      (
        self.manager.shuffle_mode().await.unwrap_or_default(),
        self.manager.repeat_mode().await.unwrap_or_default(),
      )
    })
  }

  fn sync_catalog(&mut self) {
    let genres = self.genres.lock().unwrap_or_else(|e| e.into_inner()).clone();
    if genres.len() != self.list.len() {
      self.list.update_items(genres);
    }
  }

  fn drain_events(&mut self) {
    loop {
      match self.events.try_recv() {
        Ok(ConnectionEvent::Success) => self.push_log("connected".to_string()),
        Ok(ConnectionEvent::Error(message)) => self.push_log(message),
        Err(TryRecvError::Lagged(skipped)) => {
          self.push_log(format!("({} events skipped)", skipped));
        }
        Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
      }
    }
  }

  fn report(&mut self, what: &str, result: musicservice::Result<()>) {
    if let Err(err) = result {
      log::warn!("{} failed: {}", what, err);
      self.push_log(format!("{}: {}", what, err));
    }
  }

  fn push_log(&mut self, line: String) {
    if self.event_log.len() == EVENT_LOG_LEN {
      self.event_log.pop_front();
    }
    self.event_log.push_back(line);
  }
}

fn next_shuffle(mode: ShuffleMode) -> ShuffleMode {
  match mode {
    ShuffleMode::None => ShuffleMode::All,
    ShuffleMode::All | ShuffleMode::Group => ShuffleMode::None,
  }
}

fn next_repeat(mode: RepeatMode) -> RepeatMode {
  match mode {
    RepeatMode::None => RepeatMode::All,
    RepeatMode::All => RepeatMode::One,
    RepeatMode::One | RepeatMode::Group => RepeatMode::None,
  }
}
