use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use url::Url;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone, Copy)]
pub struct Shortcut {
  pub key: &'static str,
  pub label: &'static str,
}

impl Shortcut {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self { key, label }
  }
}

/// Draw the header bar with logo, context, and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  dataset: &Url,
  context: &str,
  shortcuts: &[Shortcut],
) {
  let mut spans = vec![
    Span::styled(" invtab ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} ", dataset_label(dataset)),
      Style::default().fg(Color::White),
    ),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} ", context),
      Style::default().fg(Color::Yellow).bold(),
    ),
    Span::raw(" "),
  ];

  // Shortcuts - keys and brackets highlighted, descriptions dimmed
  for shortcut in shortcuts {
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}

/// Short label for the dataset location: host and path for remote
/// datasets, the file name for local ones
fn dataset_label(url: &Url) -> String {
  if url.scheme() == "file" {
    return url
      .path_segments()
      .and_then(|mut s| s.next_back())
      .unwrap_or("")
      .to_string();
  }
  match url.host_str() {
    Some(host) => format!("{}{}", host, url.path()),
    None => url.to_string(),
  }
}
