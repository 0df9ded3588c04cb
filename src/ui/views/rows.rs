use crate::table::Record;
use crate::ui::renderfns::truncate;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

const COLUMN_WIDTH: u16 = 18;

/// First column to draw so that `selected` stays inside a window of
/// `visible` columns starting at `offset`
pub fn scroll_offset(offset: usize, selected: usize, visible: usize) -> usize {
  let visible = visible.max(1);
  if selected < offset {
    selected
  } else if selected >= offset + visible {
    selected + 1 - visible
  } else {
    offset
  }
}

#[allow(clippy::too_many_arguments)]
pub fn draw_rows(
  frame: &mut Frame,
  area: Rect,
  title: &str,
  columns: &[String],
  rows: &[&Record],
  state: &mut TableState,
  selected_column: usize,
  column_offset: &mut usize,
  focused: bool,
) {
  let border = if focused { Color::Blue } else { Color::DarkGray };
  let block = Block::default()
    .title(format!(" {} ({}) ", title, rows.len()))
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));

  if columns.is_empty() || rows.is_empty() {
    let content = if columns.is_empty() {
      "No columns. Use :add-column to create one."
    } else {
      "No rows match. Press 'a' to add one."
    };
    let paragraph = Paragraph::new(content)
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
    return;
  }

  let inner_width = area.width.saturating_sub(4);
  let visible = (inner_width / (COLUMN_WIDTH + 1)).max(1) as usize;
  *column_offset = scroll_offset(*column_offset, selected_column, visible);
  let shown: Vec<(usize, &String)> = columns
    .iter()
    .enumerate()
    .skip(*column_offset)
    .take(visible)
    .collect();

  let max_chars = COLUMN_WIDTH as usize;
  let header = Row::new(shown.iter().map(|(i, name)| {
    let style = if *i == selected_column {
      Style::default().fg(Color::Yellow).bold()
    } else {
      Style::default().fg(Color::Cyan).bold()
    };
    Cell::from(truncate(name, max_chars)).style(style)
  }));

  let selected_row = state.selected();
  let body: Vec<Row> = rows
    .iter()
    .enumerate()
    .map(|(r, record)| {
      Row::new(shown.iter().map(|(i, name)| {
        let cell = Cell::from(truncate(record.get(name), max_chars));
        if focused && Some(r) == selected_row && *i == selected_column {
          cell.style(Style::default().bg(Color::Blue).fg(Color::White))
        } else {
          cell
        }
      }))
    })
    .collect();

  let widths = vec![Constraint::Length(COLUMN_WIDTH); shown.len()];
  let table = Table::new(body, widths)
    .header(header)
    .block(block)
    .column_spacing(1)
    .row_highlight_style(Style::default().bg(Color::DarkGray))
    .highlight_symbol("> ");

  frame.render_stateful_widget(table, area, state);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_scroll_offset() {
    // Selected inside the window
    assert_eq!(scroll_offset(0, 2, 4), 0);
    // Selected past the right edge
    assert_eq!(scroll_offset(0, 5, 4), 2);
    // Selected before the left edge
    assert_eq!(scroll_offset(3, 1, 4), 1);
    assert_eq!(scroll_offset(0, 0, 0), 0);
  }
}
