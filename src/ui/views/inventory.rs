use std::collections::HashMap;
use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{ListState, TableState};

use super::objects::{draw_objects, ObjectItem};
use super::rows::draw_rows;
use crate::store::Store;
use crate::table::{Comment, Group, GroupKey, Record, TableManager};
use crate::ui::components::{
  CommandEvent, CommandInput, Confirm, KeyResult, Picker, PickerEvent, Prompt, PromptEvent,
  SearchEvent, SearchInput,
};
use crate::ui::renderfns::{Shortcut, StatusMessage};

pub const DEFAULT_EXPORT_FILE: &str = "inventory-export.json";
const PREVIEW_CHARS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
  Objects,
  Rows,
}

/// Requests the view hands to the App, which owns the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  None,
  Quit,
  Status(StatusMessage),
  AddRow { group: String },
  EditCell {
    row_id: String,
    column: String,
    value: String,
  },
  /// `group` is the comment key of the group, see `GroupKey::comment_key`
  SetComment { group: String, text: String },
  AddColumn(String),
  RenameColumn { from: String, to: String },
  DeleteColumn(String),
  GroupBy(String),
  Export(PathBuf),
  Import(PathBuf),
  Reset,
}

/// What the open prompt is collecting
#[derive(Debug, Clone)]
enum Pending {
  EditCell { row_id: String, column: String },
  AddRow,
  Comment { group: String },
  AddColumn,
  RenameTo { from: String },
  Export,
  Import,
}

#[derive(Debug, Clone, Copy)]
enum PickFor {
  GroupBy,
  Rename,
  Delete,
}

#[derive(Debug, Clone)]
enum ConfirmFor {
  DeleteColumn(String),
  Reset,
}

/// Two-pane inventory screen: objects on the left, their rows on the right
pub struct InventoryView {
  focus: Pane,
  objects_state: ListState,
  rows_state: TableState,
  column: usize,
  column_offset: usize,
  group_filter: Option<GroupKey>,
  object_search: SearchInput,
  row_search: SearchInput,
  command: CommandInput,
  prompt: Prompt,
  pending: Option<Pending>,
  picker: Picker,
  picking: Option<PickFor>,
  confirm: Confirm,
  confirming: Option<ConfirmFor>,
  comments: HashMap<String, Comment>,
}

impl Default for InventoryView {
  fn default() -> Self {
    Self::new()
  }
}

impl InventoryView {
  pub fn new() -> Self {
    Self {
      focus: Pane::Objects,
      objects_state: ListState::default().with_selected(Some(0)),
      rows_state: TableState::default().with_selected(Some(0)),
      column: 0,
      column_offset: 0,
      group_filter: None,
      object_search: SearchInput::new("Filter objects"),
      row_search: SearchInput::new("Filter rows"),
      command: CommandInput::new(),
      prompt: Prompt::new(),
      pending: None,
      picker: Picker::new(),
      picking: None,
      confirm: Confirm::new(),
      confirming: None,
      comments: HashMap::new(),
    }
  }

  pub fn focus(&self) -> Pane {
    self.focus
  }

  pub fn group_filter(&self) -> Option<&GroupKey> {
    self.group_filter.as_ref()
  }

  pub fn set_comments(&mut self, comments: Vec<Comment>) {
    self.comments = comments.into_iter().map(|c| (c.group.clone(), c)).collect();
  }

  /// Drop filters and selections after the table was replaced wholesale
  pub fn reset_filters(&mut self) {
    self.group_filter = None;
    self.object_search.reset();
    self.row_search.reset();
    self.objects_state.select(Some(0));
    self.rows_state.select(Some(0));
    self.column = 0;
    self.column_offset = 0;
  }

  /// Clear a group filter whose group no longer exists
  pub fn clear_group_filter(&mut self) {
    self.group_filter = None;
    self.rows_state.select(Some(0));
  }

  /// Move the row cursor to `row_id` if it is visible
  pub fn select_row<S: Store>(&mut self, table: &TableManager<S>, row_id: &str) {
    if let Some(index) = self.visible_rows(table).iter().position(|r| r.id == row_id) {
      self.rows_state.select(Some(index));
      self.focus = Pane::Rows;
    }
  }

  /// Keep the cell cursor inside the column set
  pub fn clamp_column(&mut self, len: usize) {
    self.column = self.column.min(len.saturating_sub(1));
  }

  // ==========================================================================
  // Projections
  // ==========================================================================

  fn visible_groups<S: Store>(&self, table: &TableManager<S>) -> Vec<Group> {
    let needle = self.object_search.query().to_lowercase();
    table
      .compute_groups()
      .into_iter()
      .filter(|g| needle.is_empty() || g.name.to_lowercase().contains(&needle))
      .collect()
  }

  fn visible_rows<'t, S: Store>(&self, table: &'t TableManager<S>) -> Vec<&'t Record> {
    table.filtered_rows(self.group_filter.as_ref(), self.row_search.query())
  }

  fn selected_group<S: Store>(&self, table: &TableManager<S>) -> Option<Group> {
    let index = self.objects_state.selected()?;
    self.visible_groups(table).into_iter().nth(index)
  }

  fn selected_row<'t, S: Store>(&self, table: &'t TableManager<S>) -> Option<&'t Record> {
    let index = self.rows_state.selected()?;
    self.visible_rows(table).get(index).copied()
  }

  fn selected_column<'t, S: Store>(&self, table: &'t TableManager<S>) -> Option<&'t str> {
    table.columns().get(self.column)
  }

  /// Object the user is looking at and its label: the filtered one in the
  /// rows pane, otherwise the highlighted one
  fn current_group<S: Store>(&self, table: &TableManager<S>) -> Option<(GroupKey, String)> {
    match (&self.group_filter, self.focus) {
      (Some(key), Pane::Rows) => Some((key.clone(), key.label(table.ungrouped_label()).to_string())),
      _ => self.selected_group(table).map(|g| (g.key, g.name)),
    }
  }

  fn comment_preview(&self, key: &GroupKey) -> Option<String> {
    self
      .comments
      .get(key.comment_key())
      .filter(|c| !c.text.trim().is_empty())
      .map(|c| c.preview(PREVIEW_CHARS))
  }

  // ==========================================================================
  // Key handling
  // ==========================================================================

  /// Whether a modal overlay currently owns the keyboard
  pub fn overlay_active(&self) -> bool {
    self.confirm.is_active()
      || self.picker.is_active()
      || self.prompt.is_active()
      || self.command.is_active()
      || self.object_search.is_active()
      || self.row_search.is_active()
  }

  pub fn handle_key<S: Store>(&mut self, key: KeyEvent, table: &TableManager<S>) -> Action {
    if let Some(action) = self.handle_overlay_key(key, table) {
      return action;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
      return match key.code {
        KeyCode::Char('c') => Action::Quit,
        KeyCode::Char('s') => Action::Status(StatusMessage::info(
          "Changes are saved locally as you make them",
        )),
        _ => Action::None,
      };
    }

    // Activation keys for the command palette and the pane filter
    if self.command.handle_key(key).is_consumed() {
      return Action::None;
    }
    let search = match self.focus {
      Pane::Objects => &mut self.object_search,
      Pane::Rows => &mut self.row_search,
    };
    if search.handle_key(key).is_consumed() {
      return Action::None;
    }

    match key.code {
      KeyCode::Char('q') => return Action::Quit,
      KeyCode::Tab | KeyCode::BackTab => {
        self.focus = match self.focus {
          Pane::Objects => Pane::Rows,
          Pane::Rows => Pane::Objects,
        };
        return Action::None;
      }
      KeyCode::Char('a') => return self.start_add_row(table),
      KeyCode::Char('c') => return self.start_comment(table),
      _ => {}
    }

    match self.focus {
      Pane::Objects => self.handle_objects_key(key, table),
      Pane::Rows => self.handle_rows_key(key, table),
    }
  }

  fn handle_overlay_key<S: Store>(
    &mut self,
    key: KeyEvent,
    table: &TableManager<S>,
  ) -> Option<Action> {
    if self.confirm.is_active() {
      return Some(match self.confirm.handle_key(key) {
        KeyResult::Event(confirmed) => self.on_confirm(confirmed),
        _ => Action::None,
      });
    }

    if self.picker.is_active() {
      return Some(match self.picker.handle_key(key) {
        KeyResult::Event(PickerEvent::Selected(item)) => self.on_pick(item),
        KeyResult::Event(PickerEvent::Cancelled) => {
          self.picking = None;
          Action::None
        }
        _ => Action::None,
      });
    }

    if self.prompt.is_active() {
      return Some(match self.prompt.handle_key(key) {
        KeyResult::Event(PromptEvent::Submitted(value)) => self.on_prompt(value),
        KeyResult::Event(PromptEvent::Cancelled) => {
          self.pending = None;
          Action::None
        }
        _ => Action::None,
      });
    }

    if self.command.is_active() {
      return Some(match self.command.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(name)) => self.run_command(&name, table),
        _ => Action::None,
      });
    }

    for (pane, search) in [
      (Pane::Objects, &mut self.object_search),
      (Pane::Rows, &mut self.row_search),
    ] {
      if !search.is_active() {
        continue;
      }
      if let KeyResult::Event(SearchEvent::Changed(_)) = search.handle_key(key) {
        match pane {
          Pane::Objects => self.objects_state.select(Some(0)),
          Pane::Rows => self.rows_state.select(Some(0)),
        }
      }
      return Some(Action::None);
    }

    None
  }

  fn handle_objects_key<S: Store>(&mut self, key: KeyEvent, table: &TableManager<S>) -> Action {
    let len = self.visible_groups(table).len();
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => move_selection(&mut self.objects_state, len, 1),
      KeyCode::Char('k') | KeyCode::Up => move_selection(&mut self.objects_state, len, -1),
      KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
        if let Some(group) = self.selected_group(table) {
          self.group_filter = Some(group.key);
          self.rows_state.select(Some(0));
          self.focus = Pane::Rows;
        }
      }
      KeyCode::Esc => {
        if !self.object_search.query().is_empty() {
          self.object_search.reset();
          self.objects_state.select(Some(0));
        }
      }
      _ => {}
    }
    Action::None
  }

  fn handle_rows_key<S: Store>(&mut self, key: KeyEvent, table: &TableManager<S>) -> Action {
    let len = self.visible_rows(table).len();
    let columns = table.columns().len();
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => move_selection_table(&mut self.rows_state, len, 1),
      KeyCode::Char('k') | KeyCode::Up => move_selection_table(&mut self.rows_state, len, -1),
      KeyCode::Char('h') | KeyCode::Left => self.column = self.column.saturating_sub(1),
      KeyCode::Char('l') | KeyCode::Right => {
        if self.column + 1 < columns {
          self.column += 1;
        }
      }
      KeyCode::Enter | KeyCode::Char('e') => return self.start_edit_cell(table),
      KeyCode::Esc => {
        if self.group_filter.is_some() {
          self.clear_group_filter();
        } else if !self.row_search.query().is_empty() {
          self.row_search.reset();
        } else {
          self.focus = Pane::Objects;
        }
      }
      _ => {}
    }
    Action::None
  }

  // ==========================================================================
  // Flows
  // ==========================================================================

  fn start_edit_cell<S: Store>(&mut self, table: &TableManager<S>) -> Action {
    let (Some(row), Some(column)) = (self.selected_row(table), self.selected_column(table)) else {
      return Action::None;
    };
    self.prompt.show(format!("Edit {}", column), row.get(column));
    self.pending = Some(Pending::EditCell {
      row_id: row.id.clone(),
      column: column.to_string(),
    });
    Action::None
  }

  fn start_add_row<S: Store>(&mut self, table: &TableManager<S>) -> Action {
    if let Some(key) = &self.group_filter {
      let group = match key {
        GroupKey::Named(name) => name.clone(),
        GroupKey::Ungrouped => String::new(),
      };
      return Action::AddRow { group };
    }

    let initial = match self.selected_group(table) {
      Some(Group {
        key: GroupKey::Named(name),
        ..
      }) => name,
      _ => String::new(),
    };
    self
      .prompt
      .show(format!("{} of the new row", table.grouping_column()), &initial);
    self.pending = Some(Pending::AddRow);
    Action::None
  }

  fn start_comment<S: Store>(&mut self, table: &TableManager<S>) -> Action {
    let Some((key, label)) = self.current_group(table) else {
      return Action::Status(StatusMessage::warning("No object selected"));
    };
    let group = key.comment_key().to_string();
    let existing = self
      .comments
      .get(&group)
      .map(|c| c.text.clone())
      .unwrap_or_default();
    self.prompt.show(format!("Comment for {}", label), &existing);
    self.pending = Some(Pending::Comment { group });
    Action::None
  }

  fn show_column_picker<S: Store>(
    &mut self,
    table: &TableManager<S>,
    title: &str,
    purpose: PickFor,
  ) -> Action {
    if table.columns().is_empty() {
      return Action::Status(StatusMessage::warning("The table has no columns"));
    }
    let current = match purpose {
      PickFor::GroupBy => Some(table.grouping_column().to_string()),
      PickFor::Rename | PickFor::Delete => self.selected_column(table).map(String::from),
    };
    self.picker.show(
      title,
      table.columns().iter().cloned().collect(),
      current.as_deref(),
    );
    self.picking = Some(purpose);
    Action::None
  }

  fn run_command<S: Store>(&mut self, name: &str, table: &TableManager<S>) -> Action {
    match name {
      "add-row" => self.start_add_row(table),
      "add-column" => {
        self.prompt.show("New column", "");
        self.pending = Some(Pending::AddColumn);
        Action::None
      }
      "rename-column" => self.show_column_picker(table, "Rename column", PickFor::Rename),
      "delete-column" => self.show_column_picker(table, "Delete column", PickFor::Delete),
      "group-by" => self.show_column_picker(table, "Group by", PickFor::GroupBy),
      "comment" => self.start_comment(table),
      "export" => {
        self.prompt.show("Export to file", DEFAULT_EXPORT_FILE);
        self.pending = Some(Pending::Export);
        Action::None
      }
      "import" => {
        self.prompt.show("Import from file", "");
        self
          .prompt
          .with_hint("Replaces every row and column with the file's contents");
        self.pending = Some(Pending::Import);
        Action::None
      }
      "reset" => {
        self
          .confirm
          .show("Delete all local edits and caches and reload the original data?");
        self.confirming = Some(ConfirmFor::Reset);
        Action::None
      }
      "quit" => Action::Quit,
      "" => Action::None,
      other => Action::Status(StatusMessage::error(format!("Unknown command: {}", other))),
    }
  }

  fn on_prompt(&mut self, value: String) -> Action {
    let Some(pending) = self.pending.take() else {
      return Action::None;
    };

    match pending {
      Pending::EditCell { row_id, column } => Action::EditCell {
        row_id,
        column,
        value,
      },
      Pending::AddRow => Action::AddRow {
        group: value.trim().to_string(),
      },
      Pending::Comment { group } => Action::SetComment { group, text: value },
      Pending::AddColumn => Action::AddColumn(value),
      Pending::RenameTo { from } => Action::RenameColumn { from, to: value },
      Pending::Export => {
        let path = value.trim();
        let path = if path.is_empty() {
          DEFAULT_EXPORT_FILE
        } else {
          path
        };
        Action::Export(PathBuf::from(path))
      }
      Pending::Import => {
        let path = value.trim();
        if path.is_empty() {
          Action::Status(StatusMessage::warning("No file given"))
        } else {
          Action::Import(PathBuf::from(path))
        }
      }
    }
  }

  fn on_pick(&mut self, item: String) -> Action {
    match self.picking.take() {
      Some(PickFor::GroupBy) => Action::GroupBy(item),
      Some(PickFor::Rename) => {
        self.prompt.show(format!("Rename {} to", item), &item);
        self.pending = Some(Pending::RenameTo { from: item });
        Action::None
      }
      Some(PickFor::Delete) => {
        self.confirm.show(format!(
          "Delete column \"{}\" and all of its values?",
          item
        ));
        self.confirming = Some(ConfirmFor::DeleteColumn(item));
        Action::None
      }
      None => Action::None,
    }
  }

  fn on_confirm(&mut self, confirmed: bool) -> Action {
    let target = self.confirming.take();
    if !confirmed {
      return Action::Status(StatusMessage::info("Cancelled"));
    }
    match target {
      Some(ConfirmFor::DeleteColumn(name)) => Action::DeleteColumn(name),
      Some(ConfirmFor::Reset) => Action::Reset,
      None => Action::None,
    }
  }

  // ==========================================================================
  // Rendering
  // ==========================================================================

  pub fn shortcuts(&self) -> Vec<Shortcut> {
    let mut shortcuts = vec![
      Shortcut::new(":", "command"),
      Shortcut::new("/", "filter"),
      Shortcut::new("Tab", "pane"),
      Shortcut::new("a", "add row"),
      Shortcut::new("c", "comment"),
    ];
    match self.focus {
      Pane::Objects => shortcuts.push(Shortcut::new("Enter", "open")),
      Pane::Rows => {
        shortcuts.push(Shortcut::new("e", "edit"));
        shortcuts.push(Shortcut::new("h/l", "column"));
        shortcuts.push(Shortcut::new("Esc", "all objects"));
      }
    }
    shortcuts
  }

  pub fn breadcrumb<S: Store>(&self, table: &TableManager<S>) -> Vec<String> {
    let mut parts = vec![format!("Objects by {}", table.grouping_column())];
    if let Some(key) = &self.group_filter {
      parts.push(key.label(table.ungrouped_label()).to_string());
    }
    if !self.row_search.query().is_empty() {
      parts.push(format!("/{}", self.row_search.query()));
    }
    if let (Pane::Rows, Some(column)) = (self.focus, self.selected_column(table)) {
      parts.push(column.to_string());
    }
    parts
  }

  pub fn render<S: Store>(&mut self, frame: &mut Frame, area: Rect, table: &TableManager<S>) {
    let chunks = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Percentage(32), Constraint::Percentage(68)])
      .split(area);

    let groups = self.visible_groups(table);
    clamp_list(&mut self.objects_state, groups.len());
    let items: Vec<ObjectItem> = groups
      .into_iter()
      .map(|g| ObjectItem {
        preview: self.comment_preview(&g.key),
        active: self.group_filter.as_ref() == Some(&g.key),
        name: g.name,
        count: g.count,
      })
      .collect();
    draw_objects(
      frame,
      chunks[0],
      &items,
      &mut self.objects_state,
      table.grouping_column(),
      self.focus == Pane::Objects,
    );

    let rows = self.visible_rows(table);
    clamp_table(&mut self.rows_state, rows.len());
    self.clamp_column(table.columns().len());
    let title = match &self.group_filter {
      Some(key) => key.label(table.ungrouped_label()).to_string(),
      None => "All rows".to_string(),
    };
    draw_rows(
      frame,
      chunks[1],
      &title,
      table.columns().as_slice(),
      &rows,
      &mut self.rows_state,
      self.column,
      &mut self.column_offset,
      self.focus == Pane::Rows,
    );

    self.object_search.render_overlay(frame, chunks[0]);
    self.row_search.render_overlay(frame, chunks[1]);
    self.command.render_overlay(frame, area);
    self.prompt.render_overlay(frame, area);
    self.picker.render_overlay(frame, area);
    self.confirm.render_overlay(frame, area);
  }
}

fn step(selected: Option<usize>, len: usize, delta: i32) -> Option<usize> {
  if len == 0 {
    return None;
  }
  let current = selected.unwrap_or(0) as i32;
  Some((current + delta).rem_euclid(len as i32) as usize)
}

fn move_selection(state: &mut ListState, len: usize, delta: i32) {
  state.select(step(state.selected(), len, delta));
}

fn move_selection_table(state: &mut TableState, len: usize, delta: i32) {
  state.select(step(state.selected(), len, delta));
}

fn clamp(selected: Option<usize>, len: usize) -> Option<usize> {
  match (selected, len) {
    (_, 0) => None,
    (Some(i), len) => Some(i.min(len - 1)),
    (None, _) => Some(0),
  }
}

fn clamp_list(state: &mut ListState, len: usize) {
  state.select(clamp(state.selected(), len));
}

fn clamp_table(state: &mut TableState, len: usize) {
  state.select(clamp(state.selected(), len));
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryStore;
  use crate::table::TableOptions;
  use serde_json::json;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn press(view: &mut InventoryView, table: &TableManager<MemoryStore>, keys: &str) -> Action {
    let mut last = Action::None;
    for c in keys.chars() {
      last = view.handle_key(key(KeyCode::Char(c)), table);
    }
    last
  }

  async fn table() -> TableManager<MemoryStore> {
    let doc = json!({
      "headers": ["Room", "Item", "Qty"],
      "rows": [
        {"id": "r1", "Room": "Lobby", "Item": "Sofa", "Qty": "2"},
        {"id": "r2", "Room": "101", "Item": "Desk", "Qty": "1"},
        {"id": "r3", "Room": "Lobby", "Item": "Lamp", "Qty": "4"}
      ]
    });
    TableManager::load(MemoryStore::new(), TableOptions::default(), || async move {
      Ok(doc)
    })
    .await
    .unwrap()
    .0
  }

  #[test]
  fn test_step_wraps() {
    assert_eq!(step(Some(0), 3, -1), Some(2));
    assert_eq!(step(Some(2), 3, 1), Some(0));
    assert_eq!(step(None, 0, 1), None);
    assert_eq!(clamp(Some(5), 2), Some(1));
    assert_eq!(clamp(Some(1), 0), None);
  }

  #[tokio::test]
  async fn test_enter_filters_rows_by_object() {
    let table = table().await;
    let mut view = InventoryView::new();

    // Groups are "101", "Lobby"; select Lobby
    view.handle_key(key(KeyCode::Down), &table);
    view.handle_key(key(KeyCode::Enter), &table);

    assert_eq!(view.focus(), Pane::Rows);
    assert_eq!(
      view.group_filter(),
      Some(&GroupKey::Named("Lobby".to_string()))
    );
    assert_eq!(view.visible_rows(&table).len(), 2);

    // Esc drops the object filter
    view.handle_key(key(KeyCode::Esc), &table);
    assert_eq!(view.group_filter(), None);
    assert_eq!(view.visible_rows(&table).len(), 3);
  }

  #[tokio::test]
  async fn test_edit_cell_flow() {
    let table = table().await;
    let mut view = InventoryView::new();
    view.handle_key(key(KeyCode::Tab), &table);

    // Move to "Item" and edit it
    press(&mut view, &table, "l");
    assert_eq!(press(&mut view, &table, "e"), Action::None);
    assert!(view.overlay_active());

    // Prefilled with "Sofa"; replace with "Chair"
    for _ in 0..4 {
      view.handle_key(key(KeyCode::Backspace), &table);
    }
    press(&mut view, &table, "Chair");
    let action = view.handle_key(key(KeyCode::Enter), &table);

    assert_eq!(
      action,
      Action::EditCell {
        row_id: "r1".to_string(),
        column: "Item".to_string(),
        value: "Chair".to_string(),
      }
    );
    assert!(!view.overlay_active());
  }

  #[tokio::test]
  async fn test_add_row_uses_group_filter() {
    let table = table().await;
    let mut view = InventoryView::new();
    view.handle_key(key(KeyCode::Enter), &table);

    assert_eq!(
      press(&mut view, &table, "a"),
      Action::AddRow {
        group: "101".to_string()
      }
    );
  }

  #[tokio::test]
  async fn test_add_row_prompts_without_filter() {
    let table = table().await;
    let mut view = InventoryView::new();

    assert_eq!(press(&mut view, &table, "a"), Action::None);
    // Prefilled with the highlighted object
    let action = view.handle_key(key(KeyCode::Enter), &table);
    assert_eq!(
      action,
      Action::AddRow {
        group: "101".to_string()
      }
    );
  }

  #[tokio::test]
  async fn test_row_filter_typing_does_not_trigger_shortcuts() {
    let table = table().await;
    let mut view = InventoryView::new();
    view.handle_key(key(KeyCode::Tab), &table);

    press(&mut view, &table, "/");
    // 'a', 'q' and ':' are plain text while the filter is open
    assert_eq!(press(&mut view, &table, "lamp"), Action::None);
    assert_eq!(press(&mut view, &table, "q"), Action::None);
    view.handle_key(key(KeyCode::Backspace), &table);
    view.handle_key(key(KeyCode::Enter), &table);

    let rows = view.visible_rows(&table);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "r3");
  }

  #[tokio::test]
  async fn test_delete_column_needs_confirmation() {
    let table = table().await;
    let mut view = InventoryView::new();

    press(&mut view, &table, ":delete-column");
    view.handle_key(key(KeyCode::Enter), &table);
    // Picker opens on the first column; pick "Qty"
    view.handle_key(key(KeyCode::Up), &table);
    assert_eq!(view.handle_key(key(KeyCode::Enter), &table), Action::None);

    // Anything but 'y' cancels
    assert!(matches!(
      view.handle_key(key(KeyCode::Char('n')), &table),
      Action::Status(_)
    ));

    press(&mut view, &table, ":delete-column");
    view.handle_key(key(KeyCode::Enter), &table);
    view.handle_key(key(KeyCode::Up), &table);
    view.handle_key(key(KeyCode::Enter), &table);
    assert_eq!(
      press(&mut view, &table, "y"),
      Action::DeleteColumn("Qty".to_string())
    );
  }

  #[tokio::test]
  async fn test_rename_column_flow() {
    let table = table().await;
    let mut view = InventoryView::new();

    press(&mut view, &table, ":rename-column");
    view.handle_key(key(KeyCode::Enter), &table);
    view.handle_key(key(KeyCode::Enter), &table);
    // Prompt is prefilled with "Room"
    press(&mut view, &table, "s");
    assert_eq!(
      view.handle_key(key(KeyCode::Enter), &table),
      Action::RenameColumn {
        from: "Room".to_string(),
        to: "Rooms".to_string()
      }
    );
  }

  #[tokio::test]
  async fn test_group_by_preselects_current() {
    let table = table().await;
    let mut view = InventoryView::new();

    press(&mut view, &table, ":group-by");
    view.handle_key(key(KeyCode::Enter), &table);
    view.handle_key(key(KeyCode::Down), &table);
    assert_eq!(
      view.handle_key(key(KeyCode::Enter), &table),
      Action::GroupBy("Item".to_string())
    );
  }

  #[tokio::test]
  async fn test_comment_prefills_existing_text() {
    let mut table = table().await;
    let comment = table.set_comment("101", "Needs a new lock").unwrap();
    let mut view = InventoryView::new();
    view.set_comments(vec![comment]);

    assert_eq!(
      view.comment_preview(&GroupKey::Named("101".to_string())).as_deref(),
      Some("Needs a new lock")
    );
    assert_eq!(view.comment_preview(&GroupKey::Named("Lobby".to_string())), None);

    press(&mut view, &table, "c");
    press(&mut view, &table, "!");
    assert_eq!(
      view.handle_key(key(KeyCode::Enter), &table),
      Action::SetComment {
        group: "101".to_string(),
        text: "Needs a new lock!".to_string()
      }
    );
  }

  #[tokio::test]
  async fn test_ungrouped_comment_is_not_shared_with_same_named_group() {
    let doc = json!({
      "headers": ["Room", "Item"],
      "rows": [
        {"id": "r1", "Room": "(ungrouped)", "Item": "Sign"},
        {"id": "r2", "Room": "", "Item": "Box"}
      ]
    });
    let mut table = TableManager::load(MemoryStore::new(), TableOptions::default(), || async move {
      Ok(doc)
    })
    .await
    .unwrap()
    .0;
    let comment = table
      .set_comment(GroupKey::Ungrouped.comment_key(), "Unsorted")
      .unwrap();
    let mut view = InventoryView::new();
    view.set_comments(vec![comment]);

    assert_eq!(
      view.comment_preview(&GroupKey::Ungrouped).as_deref(),
      Some("Unsorted")
    );
    assert_eq!(
      view.comment_preview(&GroupKey::Named("(ungrouped)".to_string())),
      None
    );

    // Same label; the named group sorts first
    press(&mut view, &table, "cx");
    assert_eq!(
      view.handle_key(key(KeyCode::Enter), &table),
      Action::SetComment {
        group: "(ungrouped)".to_string(),
        text: "x".to_string()
      }
    );

    view.handle_key(key(KeyCode::Down), &table);
    press(&mut view, &table, "c!");
    assert_eq!(
      view.handle_key(key(KeyCode::Enter), &table),
      Action::SetComment {
        group: String::new(),
        text: "Unsorted!".to_string()
      }
    );
  }

  #[tokio::test]
  async fn test_export_defaults_file_name() {
    let table = table().await;
    let mut view = InventoryView::new();

    press(&mut view, &table, ":export");
    view.handle_key(key(KeyCode::Enter), &table);
    assert_eq!(
      view.handle_key(key(KeyCode::Enter), &table),
      Action::Export(PathBuf::from(DEFAULT_EXPORT_FILE))
    );
  }

  #[tokio::test]
  async fn test_ctrl_s_and_unknown_command() {
    let table = table().await;
    let mut view = InventoryView::new();

    let action = view.handle_key(
      KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL),
      &table,
    );
    assert!(matches!(action, Action::Status(_)));

    press(&mut view, &table, ":zzz");
    assert_eq!(
      view.handle_key(key(KeyCode::Enter), &table),
      Action::Status(StatusMessage::error("Unknown command: zzz"))
    );
  }
}
