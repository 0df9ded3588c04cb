use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::ui::renderfns::centered_rect;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Events emitted by the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEvent {
  Submitted(String),
  Cancelled,
}

/// Modal single-line editor with a title, optionally prefilled.
#[derive(Debug, Clone, Default)]
pub struct Prompt {
  input: TextInput,
  active: bool,
  title: String,
  hint: Option<String>,
}

impl Prompt {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Open the prompt with `initial` as the editable value
  pub fn show(&mut self, title: impl Into<String>, initial: &str) {
    self.active = true;
    self.title = title.into();
    self.hint = None;
    self.input.set_value(initial);
  }

  /// Dimmed line shown above the input
  pub fn with_hint(&mut self, hint: impl Into<String>) {
    self.hint = Some(hint.into());
  }

  fn hide(&mut self) {
    self.active = false;
    self.input.clear();
    self.hint = None;
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<PromptEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(value) => {
        self.hide();
        KeyResult::Event(PromptEvent::Submitted(value))
      }
      InputResult::Cancelled => {
        self.hide();
        KeyResult::Event(PromptEvent::Cancelled)
      }
      InputResult::Consumed | InputResult::NotHandled => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let height = if self.hint.is_some() { 4 } else { 3 };
    let overlay_area = centered_rect(area, 70, height);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" {} ", self.title));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let mut lines = Vec::new();
    if let Some(hint) = &self.hint {
      lines.push(Line::styled(hint.as_str(), Style::default().fg(Color::DarkGray)));
    }
    lines.push(self.input.line("> ", Color::Yellow));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
  }
}
