use ratatui::{
  layout::Rect,
  style::{Style, Stylize},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState},
  Frame,
};

use musicservice::MediaItem;

/// Catalog entries with a movable highlight
pub struct SelectableList {
  title: String,
  items: Vec<MediaItem>,
  state: ListState,
}

impl SelectableList {
  pub fn new(title: &str, items: Vec<MediaItem>) -> Self {
    let mut list = Self {
      title: title.to_string(),
      items: Vec::new(),
      state: ListState::default(),
    };
    list.update_items(items);
    list
  }

  pub fn draw(&mut self, frame: &mut Frame, area: Rect) {
    let rows: Vec<ListItem> = self.items.iter().map(row).collect();
    let list = List::new(rows)
      .block(Block::default().borders(Borders::ALL).title(self.title.clone()))
      .highlight_style(Style::new().reversed())
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.state);
  }

  pub fn next(&mut self) -> Option<usize> {
    if self.items.is_empty() {
      return None;
    }

    let i = self.state.selected().unwrap_or(0);
    let next = (i + 1) % self.items.len();
    self.state.select(Some(next));
    Some(next)
  }

  pub fn previous(&mut self) -> Option<usize> {
    if self.items.is_empty() {
      return None;
    }

    let i = match self.state.selected() {
      Some(0) | None => self.items.len() - 1,
      Some(i) => i - 1,
    };
    self.state.select(Some(i));
    Some(i)
  }

  pub fn selected(&self) -> Option<&MediaItem> {
    self.state.selected().and_then(|i| self.items.get(i))
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  /// Replace the entries, keeping the highlight on the same media id when it is still listed
  pub fn update_items(&mut self, items: Vec<MediaItem>) {
    let previous = self.selected().map(|item| item.media_id.clone());
    self.items = items;

    let index = previous
      .and_then(|id| self.items.iter().position(|item| item.media_id == id))
      .or(if self.items.is_empty() { None } else { Some(0) });
    self.state.select(index);
  }
}

fn row(item: &MediaItem) -> ListItem<'static> {
  let mut spans = vec![Span::raw(item.title.clone())];
  if let Some(ref subtitle) = item.subtitle {
    spans.push(Span::raw(" - ").dim());
    spans.push(Span::raw(subtitle.clone()).dim());
  }
  ListItem::new(Line::from(spans))
}
