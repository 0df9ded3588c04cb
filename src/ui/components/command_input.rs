use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::commands::{self, Command};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

const MAX_SUGGESTIONS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEvent {
  /// Canonical command name, or the raw lowercased input when nothing matched
  Submitted(String),
  Cancelled,
}

/// `:` command palette with ranked autocomplete
#[derive(Debug, Clone, Default)]
pub struct CommandInput {
  input: TextInput,
  active: bool,
  highlighted: usize,
}

impl CommandInput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn activate(&mut self) {
    self.active = true;
    self.input.clear();
    self.highlighted = 0;
  }

  fn close(&mut self) {
    self.active = false;
    self.input.clear();
    self.highlighted = 0;
  }

  pub fn suggestions(&self) -> Vec<&'static Command> {
    commands::get_suggestions(self.input.value())
  }

  fn cycle(&mut self, forward: bool) {
    let len = self.suggestions().len();
    if len == 0 {
      return;
    }
    self.highlighted = if forward {
      (self.highlighted + 1) % len
    } else {
      (self.highlighted + len - 1) % len
    };
  }

  /// Opens on `:` while inactive; once open, swallows every key
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<CommandEvent> {
    if !self.active {
      return match key.code {
        KeyCode::Char(':') => {
          self.activate();
          KeyResult::Handled
        }
        _ => KeyResult::NotHandled,
      };
    }

    match key.code {
      KeyCode::Tab | KeyCode::Down => self.cycle(true),
      KeyCode::BackTab | KeyCode::Up => self.cycle(false),
      _ => match self.input.handle_key(key) {
        InputResult::Submitted(_) => {
          let name = self.resolve();
          self.close();
          return KeyResult::Event(CommandEvent::Submitted(name));
        }
        InputResult::Cancelled => {
          self.close();
          return KeyResult::Event(CommandEvent::Cancelled);
        }
        // New text means a new ranking
        InputResult::Consumed => self.highlighted = 0,
        InputResult::NotHandled => {}
      },
    }
    KeyResult::Handled
  }

  fn resolve(&self) -> String {
    self
      .suggestions()
      .get(self.highlighted)
      .map(|cmd| cmd.name.to_string())
      .unwrap_or_else(|| self.input.value().trim().to_lowercase())
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let suggestions = self.suggestions();
    let shown = suggestions.len().min(MAX_SUGGESTIONS) as u16;
    let width = area.width.saturating_sub(2).min(64);
    let popup = Rect::new(area.x + 1, area.y + 1, width, 3 + shown).intersection(area);

    frame.render_widget(Clear, popup);
    let block = Block::default()
      .title(" Command ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);
    if inner.height == 0 {
      return;
    }

    let [input_area, list_area] =
      Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);
    frame.render_widget(Paragraph::new(self.input.line(":", Color::Yellow)), input_area);

    if suggestions.is_empty() || list_area.height == 0 {
      return;
    }

    let items: Vec<ListItem> = suggestions
      .iter()
      .map(|cmd| {
        let aliases = if cmd.aliases.is_empty() {
          String::new()
        } else {
          format!(" ({})", cmd.aliases.join(", "))
        };
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:<14}", cmd.name), Style::default().fg(Color::Cyan)),
          Span::styled(cmd.description, Style::default().fg(Color::Gray)),
          Span::styled(aliases, Style::default().fg(Color::DarkGray)),
        ]))
      })
      .collect();

    let list = List::new(items).highlight_style(Style::default().bg(Color::DarkGray).bold());
    let mut state = ListState::default().with_selected(Some(self.highlighted));
    frame.render_stateful_widget(list, list_area, &mut state);
  }
}
