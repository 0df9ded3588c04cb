use super::KeyResult;
use crate::ui::renderfns::centered_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Yes/no overlay for destructive actions. Only `y` confirms.
#[derive(Debug, Clone, Default)]
pub struct Confirm {
  active: bool,
  message: String,
}

impl Confirm {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn show(&mut self, message: impl Into<String>) {
    self.active = true;
    self.message = message.into();
  }

  /// Emits `true` on confirmation, `false` on any other key
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<bool> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    self.active = false;
    let confirmed = matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y'));
    KeyResult::Event(confirmed)
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let overlay_area = centered_rect(area, 60, 5);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red))
      .title(" Confirm ");

    let text = vec![
      Line::raw(self.message.as_str()),
      Line::from(vec![
        Span::styled("<y>", Style::default().fg(Color::Cyan)),
        Span::styled(" yes   ", Style::default().fg(Color::DarkGray)),
        Span::styled("<any>", Style::default().fg(Color::Cyan)),
        Span::styled(" no", Style::default().fg(Color::DarkGray)),
      ]),
    ];

    frame.render_widget(
      Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
      overlay_area,
    );
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
  fn test_only_y_confirms() {
    let mut confirm = Confirm::new();
    confirm.show("Delete column \"Qty\"?");
    assert_eq!(confirm.handle_key(key(KeyCode::Enter)), KeyResult::Event(false));
    assert!(!confirm.is_active());

    confirm.show("Reset?");
    assert_eq!(confirm.handle_key(key(KeyCode::Char('y'))), KeyResult::Event(true));
  }

  #[test]
  fn test_inactive() {
    let mut confirm = Confirm::new();
    assert_eq!(confirm.handle_key(key(KeyCode::Char('y'))), KeyResult::NotHandled);
  }
}
