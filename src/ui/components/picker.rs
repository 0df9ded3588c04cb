use super::KeyResult;
use crate::ui::renderfns::centered_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};

/// Events emitted by the picker that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent {
  /// Item selected (returns the item)
  Selected(String),
  /// Picker cancelled
  Cancelled,
}

/// Centered list overlay for choosing one of a few names, e.g. a column
#[derive(Debug, Clone, Default)]
pub struct Picker {
  active: bool,
  items: Vec<String>,
  selected: usize,
  title: String,
}

impl Picker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Check if picker is currently active
  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Show the picker with `items`, preselecting `current` when present
  pub fn show(&mut self, title: impl Into<String>, items: Vec<String>, current: Option<&str>) {
    self.selected = current
      .and_then(|c| items.iter().position(|i| i == c))
      .unwrap_or(0);
    self.active = true;
    self.items = items;
    self.title = title.into();
  }

  /// Hide the picker
  pub fn hide(&mut self) {
    self.active = false;
    self.items.clear();
    self.selected = 0;
  }

  /// Handle a key event
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<PickerEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc | KeyCode::Char('q') => {
        self.hide();
        KeyResult::Event(PickerEvent::Cancelled)
      }
      KeyCode::Enter => {
        let event = match self.items.get(self.selected) {
          Some(item) => PickerEvent::Selected(item.clone()),
          None => PickerEvent::Cancelled,
        };
        self.hide();
        KeyResult::Event(event)
      }
      KeyCode::Char('j') | KeyCode::Down => {
        if !self.items.is_empty() {
          self.selected = (self.selected + 1) % self.items.len();
        }
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        if !self.items.is_empty() {
          self.selected = if self.selected == 0 {
            self.items.len() - 1
          } else {
            self.selected - 1
          };
        }
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  /// Render the picker overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active || self.items.is_empty() {
      return;
    }

    let height = (self.items.len() as u16 + 2).min(area.height.saturating_sub(4)).max(3);
    let overlay_area = centered_rect(area, 40, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" {} ", self.title));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let items: Vec<ListItem> = self
      .items
      .iter()
      .map(|item| ListItem::new(Span::styled(item.as_str(), Style::default().fg(Color::Cyan))))
      .collect();

    let list =
      List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut state = ListState::default();
    state.select(Some(self.selected));

    frame.render_stateful_widget(list, inner, &mut state);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn columns() -> Vec<String> {
    vec!["Room".to_string(), "Item".to_string(), "Qty".to_string()]
  }

  #[test]
  fn test_preselects_current() {
    let mut picker = Picker::new();
    picker.show("Group by", columns(), Some("Item"));
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(PickerEvent::Selected("Item".to_string()))
    );
    assert!(!picker.is_active());
  }

  #[test]
  fn test_navigation_wraps() {
    let mut picker = Picker::new();
    picker.show("Delete column", columns(), None);
    picker.handle_key(key(KeyCode::Up));
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(PickerEvent::Selected("Qty".to_string()))
    );
  }

  #[test]
  fn test_empty_picker_cancels() {
    let mut picker = Picker::new();
    picker.show("Delete column", Vec::new(), None);
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(PickerEvent::Cancelled)
    );
  }
}
