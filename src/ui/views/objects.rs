use crate::ui::renderfns::truncate;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// One entry of the object list as rendered
pub struct ObjectItem {
  pub name: String,
  pub count: usize,
  /// Comment preview, `None` when the object has no comment
  pub preview: Option<String>,
  /// Whether the row table is currently filtered to this object
  pub active: bool,
}

pub fn draw_objects(
  frame: &mut Frame,
  area: Rect,
  items: &[ObjectItem],
  state: &mut ListState,
  grouping_column: &str,
  focused: bool,
) {
  let title = format!(" Objects by {} ({}) ", grouping_column, items.len());
  let border = if focused { Color::Blue } else { Color::DarkGray };

  let block = Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));

  if items.is_empty() {
    let paragraph = Paragraph::new("No objects.")
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
    return;
  }

  let name_width = area.width.saturating_sub(12) as usize;

  let list_items: Vec<ListItem> = items
    .iter()
    .map(|item| {
      let name_style = if item.active {
        Style::default().fg(Color::Yellow).bold()
      } else {
        Style::default().fg(Color::Cyan)
      };

      let header = Line::from(vec![
        Span::styled(truncate(&item.name, name_width), name_style),
        Span::styled(
          format!(" ({})", item.count),
          Style::default().fg(Color::White),
        ),
      ]);

      let comment = match &item.preview {
        Some(preview) => Line::styled(format!("  {}", preview), Style::default().fg(Color::Gray)),
        None => Line::styled("  (none)", Style::default().fg(Color::DarkGray)),
      };

      ListItem::new(vec![header, comment])
    })
    .collect();

  let list = List::new(list_items)
    .block(block)
    .highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  frame.render_stateful_widget(list, area, state);
}
