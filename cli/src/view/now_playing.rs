use ratatui::{
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Style, Stylize},
  text::{Line, Span, Text},
  widgets::{Block, Borders, Paragraph, Wrap},
  Frame,
};

use musicservice::{
  ConnectionState, NowPlayingCard, PlaybackSnapshot, PlaybackStatus, RepeatMode, ShuffleMode,
};

use crate::keymap::HELP;
use crate::widget::selectable_list::SelectableList;

pub struct Screen<'a> {
  pub connection: &'a ConnectionState,
  pub playback: Option<&'a PlaybackSnapshot>,
  pub card: Option<&'a NowPlayingCard>,
  pub shuffle: ShuffleMode,
  pub repeat: RepeatMode,
  pub events: &'a [String],
}

pub fn draw(frame: &mut Frame, list: &mut SelectableList, screen: &Screen) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1),
      Constraint::Min(6),
      Constraint::Length(7),
      Constraint::Length(1),
    ])
    .split(frame.area());

  frame.render_widget(Paragraph::new(header(screen)), rows[0]);

  let body = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
    .split(rows[1]);

  list.draw(frame, body[0]);
  draw_card(frame, body[1], screen);
  draw_events(frame, rows[2], screen.events);

  frame.render_widget(Paragraph::new(HELP).style(Style::new().dim()), rows[3]);
}

fn header(screen: &Screen) -> Line<'static> {
  let color = match screen.connection {
    ConnectionState::Connected => Color::Green,
    ConnectionState::Connecting => Color::Yellow,
    ConnectionState::Disconnected => Color::Gray,
    ConnectionState::Suspended | ConnectionState::Failed(_) => Color::Red,
  };

  Line::from(vec![
    Span::raw("musicservice  ").bold(),
    Span::styled(screen.connection.to_string(), Style::default().fg(color)),
    Span::raw(format!(
      "  shuffle: {:?}  repeat: {:?}",
      screen.shuffle, screen.repeat
    )),
  ])
}

fn draw_card(frame: &mut Frame, area: Rect, screen: &Screen) {
  let block = Block::default().borders(Borders::ALL).title("Now Playing");

  let Some(card) = screen.card else {
    let hidden = Paragraph::new("display hidden")
      .style(Style::new().dim())
      .block(block);
    frame.render_widget(hidden, area);
    return;
  };

  let mut lines = vec![
    Line::from(Span::raw(card.title.clone().unwrap_or_else(|| "-".to_string())).bold()),
    Line::from(card.subtitle.clone().unwrap_or_default()),
    Line::from(""),
    Line::from(status_line(card.status, screen.playback)),
  ];

  lines.push(Line::from(match card.artwork {
    Some(ref artwork) => format!("artwork {}x{}", artwork.width(), artwork.height()),
    None => "no artwork".to_string(),
  }));

  if let Some(ref intent) = card.content_intent {
    lines.push(Line::from(Span::raw(format!("open: {}", intent.target)).dim()));
  }

  let paragraph = Paragraph::new(Text::from(lines))
    .wrap(Wrap { trim: true })
    .block(block);
  frame.render_widget(paragraph, area);
}

fn status_line(status: PlaybackStatus, playback: Option<&PlaybackSnapshot>) -> String {
  let label = match status {
    PlaybackStatus::None => "idle",
    PlaybackStatus::Stopped => "stopped",
    PlaybackStatus::Paused => "paused",
    PlaybackStatus::Playing => "playing",
    PlaybackStatus::Buffering => "buffering",
    PlaybackStatus::Error => "error",
  };

  match playback {
    Some(snapshot) => match snapshot.error_message {
      Some(ref message) => format!("{} ({})", label, message),
      None => format!("{} {}", label, format_position(snapshot.position_ms)),
    },
    None => label.to_string(),
  }
}

fn draw_events(frame: &mut Frame, area: Rect, events: &[String]) {
  let lines: Vec<Line> = events.iter().map(|e| Line::from(e.clone())).collect();
  let paragraph =
    Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL).title("Events"));
  frame.render_widget(paragraph, area);
}

pub fn format_position(position_ms: u64) -> String {
  let seconds = position_ms / 1000;
  format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
  use ratatui::{backend::TestBackend, Terminal};

  use musicservice::MediaItem;

  use super::*;

  #[test]
  fn test_format_position() {
    assert_eq!(format_position(0), "0:00");
    assert_eq!(format_position(61_500), "1:01");
    assert_eq!(format_position(3_600_000), "60:00");
  }

  #[test]
  fn test_status_line_prefers_error_message() {
    let snapshot = PlaybackSnapshot::new(PlaybackStatus::Playing, 0).with_error("decoder gone");
    assert_eq!(
      status_line(snapshot.status, Some(&snapshot)),
      "error (decoder gone)"
    );
  }

  #[test]
  fn test_draw_doesnt_panic() {
    let mut list = SelectableList::new("Genres", vec![MediaItem::browsable("genre:jazz", "Jazz")]);
    let card = NowPlayingCard {
      title: Some("Blue Corner".to_string()),
      status: PlaybackStatus::Playing,
      ..Default::default()
    };
    let events = vec!["connected".to_string()];
    let screen = Screen {
      connection: &ConnectionState::Connected,
      playback: None,
      card: Some(&card),
      shuffle: ShuffleMode::None,
      repeat: RepeatMode::All,
      events: &events,
    };

    let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
    terminal.draw(|frame| draw(frame, &mut list, &screen)).unwrap();
  }
}
