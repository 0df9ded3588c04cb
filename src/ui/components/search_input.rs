use super::input::{InputResult, TextInput};
use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
  /// Query after an edit; empty when the filter was cancelled
  Changed(String),
  /// Filter box closed with the query kept
  Submitted,
}

/// Live filter input opened with `/`
#[derive(Debug, Clone)]
pub struct SearchInput {
  input: TextInput,
  active: bool,
  title: &'static str,
}

impl SearchInput {
  pub fn new(title: &'static str) -> Self {
    Self {
      input: TextInput::new(),
      active: false,
      title,
    }
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn query(&self) -> &str {
    self.input.value()
  }

  /// Reopen the filter, keeping the previous query for refinement
  pub fn activate(&mut self) {
    self.active = true;
  }

  /// Close and drop the query without emitting an event
  pub fn reset(&mut self) {
    self.active = false;
    self.input.clear();
  }

  /// Opens on `/` while inactive; once open, swallows every key. Esc clears
  /// the query, Enter keeps it.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<SearchEvent> {
    if !self.active {
      return match key.code {
        KeyCode::Char('/') => {
          self.activate();
          KeyResult::Handled
        }
        _ => KeyResult::NotHandled,
      };
    }

    match self.input.handle_key(key) {
      InputResult::Consumed => KeyResult::Event(SearchEvent::Changed(self.query().to_string())),
      InputResult::Submitted(_) => {
        self.active = false;
        KeyResult::Event(SearchEvent::Submitted)
      }
      InputResult::Cancelled => {
        self.reset();
        KeyResult::Event(SearchEvent::Changed(String::new()))
      }
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  /// Draw the filter box over the bottom edge of `pane`
  pub fn render_overlay(&self, frame: &mut Frame, pane: Rect) {
    if !self.active || pane.height < 3 {
      return;
    }

    let popup = Rect::new(
      pane.x + 1,
      pane.y + pane.height - 3,
      pane.width.saturating_sub(2),
      3,
    );
    frame.render_widget(Clear, popup);

    let block = Block::default()
      .title(format!(" {} ", self.title))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);
    frame.render_widget(Paragraph::new(self.input.line("/", Color::Yellow)), inner);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_slash_activates() {
    let mut search = SearchInput::new("Filter");
    assert_eq!(search.handle_key(key(KeyCode::Char('x'))), KeyResult::NotHandled);
    assert_eq!(search.handle_key(key(KeyCode::Char('/'))), KeyResult::Handled);
    assert!(search.is_active());
  }

  #[test]
  fn test_typing_emits_changes() {
    let mut search = SearchInput::new("Filter");
    search.activate();
    assert_eq!(
      search.handle_key(key(KeyCode::Char('л'))),
      KeyResult::Event(SearchEvent::Changed("л".to_string()))
    );
    assert_eq!(
      search.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(SearchEvent::Submitted)
    );
    assert!(!search.is_active());
    assert_eq!(search.query(), "л");
  }

  #[test]
  fn test_escape_clears() {
    let mut search = SearchInput::new("Filter");
    search.activate();
    search.handle_key(key(KeyCode::Char('a')));
    assert_eq!(
      search.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(SearchEvent::Changed(String::new()))
    );
    assert_eq!(search.query(), "");
  }
}
