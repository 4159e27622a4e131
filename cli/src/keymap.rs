use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key press asks the app to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  Quit,
  TogglePlayback,
  Stop,
  Next,
  Previous,
  FastForward,
  Rewind,
  CycleShuffle,
  CycleRepeat,
  Connect,
  Disconnect,
  SelectUp,
  SelectDown,
  OpenSelected,
  ToggleDisplay,
}

pub fn action_for(key_event: KeyEvent) -> Option<Action> {
  if key_event.kind != KeyEventKind::Press {
    return None;
  }

  if key_event.modifiers.contains(KeyModifiers::CONTROL) {
    return match key_event.code {
      KeyCode::Char('c') => Some(Action::Quit),
      _ => None,
    };
  }

  let action = match key_event.code {
    KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
    KeyCode::Char(' ') => Action::TogglePlayback,
    KeyCode::Char('x') => Action::Stop,
    KeyCode::Char('n') => Action::Next,
    KeyCode::Char('p') => Action::Previous,
    KeyCode::Char('f') | KeyCode::Right => Action::FastForward,
    KeyCode::Char('b') | KeyCode::Left => Action::Rewind,
    KeyCode::Char('s') => Action::CycleShuffle,
    KeyCode::Char('r') => Action::CycleRepeat,
    KeyCode::Char('c') => Action::Connect,
    KeyCode::Char('d') => Action::Disconnect,
    KeyCode::Char('h') => Action::ToggleDisplay,
    KeyCode::Up | KeyCode::Char('k') => Action::SelectUp,
    KeyCode::Down | KeyCode::Char('j') => Action::SelectDown,
    KeyCode::Enter => Action::OpenSelected,
    _ => return None,
  };
  Some(action)
}

pub const HELP: &str =
  "space play/pause  x stop  n/p next/prev  f/b seek  s shuffle  r repeat  enter play genre  c/d connect  h display  q quit";

#[cfg(test)]
mod tests {
  use super::*;

  fn press(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_transport_keys() {
    assert_eq!(action_for(press(KeyCode::Char(' '))), Some(Action::TogglePlayback));
    assert_eq!(action_for(press(KeyCode::Char('n'))), Some(Action::Next));
    assert_eq!(action_for(press(KeyCode::Char('p'))), Some(Action::Previous));
    assert_eq!(action_for(press(KeyCode::Right)), Some(Action::FastForward));
    assert_eq!(action_for(press(KeyCode::Left)), Some(Action::Rewind));
  }

  #[test]
  fn test_quit_keys() {
    assert_eq!(action_for(press(KeyCode::Char('q'))), Some(Action::Quit));
    assert_eq!(
      action_for(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
      Some(Action::Quit)
    );
    // Plain 'c' connects
    assert_eq!(action_for(press(KeyCode::Char('c'))), Some(Action::Connect));
  }

  #[test]
  fn test_release_is_ignored() {
    let mut event = press(KeyCode::Char(' '));
    event.kind = KeyEventKind::Release;
    assert_eq!(action_for(event), None);
  }

  #[test]
  fn test_unbound_key() {
    assert_eq!(action_for(press(KeyCode::Char('z'))), None);
  }
}
