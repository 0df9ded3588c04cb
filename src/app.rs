use crate::error::{ErrorKind, TableError};
use crate::event::{Event, EventHandler};
use crate::offline::ServeSource;
use crate::session::{Session, Table};
use crate::table::LoadSource;
use crate::ui::renderfns::{draw_footer, draw_header, StatusMessage};
use crate::ui::{Action, InventoryView};
use color_eyre::Result;
use crossterm::{
  event::KeyEvent,
  terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
  ExecutableCommand,
};
use ratatui::prelude::*;
use std::io::stdout;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use url::Url;

const STATUS_TTL: Duration = Duration::from_secs(6);

/// Main application state
pub struct App {
  session: Session,
  view: InventoryView,
  dataset: Url,
  status: Option<(StatusMessage, Instant)>,
  should_quit: bool,
  /// Error that ended the loop; returned from `run`
  fatal: Option<color_eyre::Report>,
}

impl App {
  pub fn new(session: Session, dataset: Url) -> Self {
    let mut app = Self {
      session,
      view: InventoryView::new(),
      dataset,
      status: None,
      should_quit: false,
      fatal: None,
    };
    app.refresh_comments();
    if let Some(status) = startup_status(&app.session) {
      app.set_status(status);
    }
    app
  }

  /// Run the main application loop
  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let result = self.event_loop().await;

    // Restore the terminal even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut events = EventHandler::new(Duration::from_millis(250));

    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key).await,
        Some(Event::Tick) => self.expire_status(),
        Some(Event::Resize) => {}
        None => break,
      }
    }

    match self.fatal.take() {
      Some(e) => Err(e),
      None => Ok(()),
    }
  }

  async fn handle_key(&mut self, key: KeyEvent) {
    let action = self.view.handle_key(key, self.session.table());
    self.apply(action).await;
  }

  /// Carry out a view request against the table. Failures end up in the
  /// status line and the app keeps running, except for a failed reset,
  /// which leaves no table to work on and ends the app.
  async fn apply(&mut self, action: Action) {
    if !self.session.is_loaded() {
      self.should_quit = true;
      return;
    }

    let result: Result<Option<StatusMessage>, TableError> = match action {
      Action::None => return,
      Action::Quit => {
        self.should_quit = true;
        return;
      }
      Action::Status(status) => {
        self.set_status(status);
        return;
      }
      Action::AddRow { group } => self.table_mut().add_row(&group).map(|id| {
        self.view.select_row(self.session.table(), &id);
        Some(StatusMessage::info("Row added"))
      }),
      Action::EditCell {
        row_id,
        column,
        value,
      } => self
        .table_mut()
        .edit_cell(&row_id, &column, &value)
        .map(|changed| changed.then(|| StatusMessage::info(format!("{} saved", column)))),
      Action::SetComment { group, text } => {
        let result = self.table_mut().set_comment(&group, &text);
        self.refresh_comments();
        result.map(|_| Some(StatusMessage::info("Comment saved")))
      }
      Action::AddColumn(name) => self
        .table_mut()
        .add_column(&name)
        .map(|_| Some(StatusMessage::info(format!("Column {} added", name.trim())))),
      Action::RenameColumn { from, to } => self
        .table_mut()
        .rename_column(&from, &to)
        .map(|_| Some(StatusMessage::info(format!("Column {} renamed", from)))),
      Action::DeleteColumn(name) => self
        .table_mut()
        .delete_column(&name)
        .map(|_| Some(StatusMessage::info(format!("Column {} deleted", name)))),
      Action::GroupBy(name) => self.table_mut().set_grouping_column(&name).map(|_| {
        self.view.reset_filters();
        Some(StatusMessage::info(format!("Grouped by {}", name)))
      }),
      Action::Export(path) => {
        let status = match self
          .session
          .export_json()
          .and_then(|json| std::fs::write(&path, json).map_err(Into::into))
        {
          Ok(()) => {
            info!("Exported table to {}", path.display());
            StatusMessage::info(format!("Exported to {}", path.display()))
          }
          Err(e) => {
            warn!("Export failed: {}", e);
            StatusMessage::error(format!("Export failed: {}", e))
          }
        };
        self.set_status(status);
        return;
      }
      Action::Import(path) => {
        let status = match self.session.import_file(&path) {
          Ok(rows) => {
            info!(rows, "Imported table from {}", path.display());
            self.view.reset_filters();
            self.refresh_comments();
            StatusMessage::info(format!("Imported {} rows from {}", rows, path.display()))
          }
          Err(e) => {
            warn!("Import failed: {}", e);
            StatusMessage::error(format!("Import failed: {}", e))
          }
        };
        self.set_status(status);
        return;
      }
      Action::Reset => {
        self.set_status(StatusMessage::info("Resetting..."));
        if let Err(e) = self.session.reset().await {
          error!("Reset failed, stopping: {}", e);
          self.fatal = Some(e.wrap_err("Reset failed"));
          self.should_quit = true;
          return;
        }
        let status = StatusMessage::info(format!(
          "Reloaded {} rows from the original data",
          self.session.report().rows
        ));
        self.view.reset_filters();
        self.refresh_comments();
        self.set_status(status);
        return;
      }
    };

    match result {
      Ok(Some(status)) => self.set_status(status),
      Ok(None) => {}
      Err(e) => {
        warn!("Table operation failed: {}", e);
        self.set_status(error_status(&e));
      }
    }
    self.drop_stale_filter();
    self
      .view
      .clamp_column(self.session.table().columns().len());
  }

  fn table_mut(&mut self) -> &mut Table {
    self.session.table_mut()
  }

  fn refresh_comments(&mut self) {
    match self.session.table().comments() {
      Ok(comments) => self.view.set_comments(comments),
      Err(e) => warn!("Failed to read comments: {}", e),
    }
  }

  /// An edit can empty the group the rows pane is filtered to
  fn drop_stale_filter(&mut self) {
    let Some(key) = self.view.group_filter() else {
      return;
    };
    let exists = self
      .session
      .table()
      .compute_groups()
      .iter()
      .any(|g| &g.key == key);
    if !exists {
      self.view.clear_group_filter();
    }
  }

  fn set_status(&mut self, status: StatusMessage) {
    self.status = Some((status, Instant::now()));
  }

  fn expire_status(&mut self) {
    if let Some((_, at)) = &self.status {
      if at.elapsed() >= STATUS_TTL {
        self.status = None;
      }
    }
  }

  fn draw(&mut self, frame: &mut Frame) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Header
        Constraint::Min(1),    // Panes
        Constraint::Length(1), // Footer
      ])
      .split(frame.area());

    let table = self.session.table();
    draw_header(
      frame,
      chunks[0],
      &self.dataset,
      &header_context(table, self.session.report().source == LoadSource::Resumed),
      &self.view.shortcuts(),
    );

    self.view.render(frame, chunks[1], table);

    let breadcrumb = self.view.breadcrumb(table);
    draw_footer(
      frame,
      chunks[2],
      &breadcrumb,
      self.status.as_ref().map(|(s, _)| s),
    );
  }
}

fn header_context(table: &Table, resumed: bool) -> String {
  let origin = if resumed { "local" } else { "seeded" };
  format!(
    "{} rows, {} columns, {}",
    table.rows().len(),
    table.columns().len(),
    origin
  )
}

fn error_status(e: &TableError) -> StatusMessage {
  match e.kind() {
    ErrorKind::Validation | ErrorKind::NotFound => StatusMessage::warning(e.to_string()),
    ErrorKind::Storage | ErrorKind::Network => StatusMessage::error(e.to_string()),
  }
}

/// First status line after startup: data loss or offline seeding
fn startup_status(session: &Session) -> Option<StatusMessage> {
  if let Some(path) = session.backup_path() {
    return Some(StatusMessage::warning(format!(
      "Stored data had an incompatible format and was reseeded; old rows saved to {}",
      path.display()
    )));
  }
  match session.seed_source() {
    Some(ServeSource::Offline) => Some(StatusMessage::warning(
      "Offline: loaded the dataset from the local cache",
    )),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;
  use crate::error::StorageError;
  use crate::ui::renderfns::footer::StatusLevel;
  use serde_json::json;

  #[tokio::test]
  async fn test_failed_reset_ends_the_app() {
    let dir = std::env::temp_dir().join(format!("invtab-app-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
      dir.join("data.json"),
      json!({"headers": ["Room"], "rows": [{"Room": "101"}]}).to_string(),
    )
    .unwrap();
    let config = Config {
      asset_root: dir.clone(),
      database: Some(dir.join("inventory.db")),
      ..Config::default()
    };

    let session = Session::open(&config).await.unwrap();
    let mut app = App::new(session, config.dataset_url().unwrap());
    std::fs::remove_file(dir.join("data.json")).unwrap();

    app.apply(Action::Reset).await;
    assert!(app.should_quit);
    assert!(!app.session.is_loaded());
    let fatal = app.fatal.take().unwrap();
    assert!(fatal.to_string().contains("Reset failed"));

    // Nothing reaches the torn-down table afterwards
    app.should_quit = false;
    app.apply(Action::AddRow { group: "101".to_string() }).await;
    assert!(app.should_quit);
    assert!(app.session.table().rows().is_empty());

    let _ = std::fs::remove_dir_all(&dir);
  }

  #[test]
  fn test_error_status_levels() {
    let status = error_status(&TableError::validation("Column name must not be empty"));
    assert_eq!(status, StatusMessage::warning("Column name must not be empty"));

    let status = error_status(&TableError::Storage(StorageError::Poisoned));
    assert_eq!(status.level, StatusLevel::Error);
  }
}
