use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Severity of a status line message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
  Info,
  Warning,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
  pub level: StatusLevel,
  pub text: String,
}

impl StatusMessage {
  pub fn info(text: impl Into<String>) -> Self {
    Self {
      level: StatusLevel::Info,
      text: text.into(),
    }
  }

  pub fn warning(text: impl Into<String>) -> Self {
    Self {
      level: StatusLevel::Warning,
      text: text.into(),
    }
  }

  pub fn error(text: impl Into<String>) -> Self {
    Self {
      level: StatusLevel::Error,
      text: text.into(),
    }
  }
}

/// Draw the footer bar: breadcrumb on the left, latest status message after it
pub fn draw_footer(
  frame: &mut Frame,
  area: Rect,
  breadcrumb: &[String],
  status: Option<&StatusMessage>,
) {
  let mut spans = Vec::new();

  spans.push(Span::raw(" "));

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }

    let style = if i == breadcrumb.len() - 1 {
      // Current filter - highlighted
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };

    spans.push(Span::styled(part.clone(), style));
  }

  if let Some(status) = status {
    let color = match status.level {
      StatusLevel::Info => Color::Green,
      StatusLevel::Warning => Color::Yellow,
      StatusLevel::Error => Color::Red,
    };
    spans.push(Span::styled("  │  ", Style::default().fg(Color::DarkGray)));
    spans.push(Span::styled(status.text.clone(), Style::default().fg(color)));
  }

  let line = Line::from(spans);
  let paragraph = Paragraph::new(line).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}
