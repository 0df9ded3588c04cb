//! Table manager: owns the in-memory table and mirrors it into the store.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use tracing::{debug, info, warn};

use super::collate::{Collator, Locale};
use super::groups::{Group, GroupKey};
use super::meta::{
  Comment, MetaEntry, PendingRename, RawRow, META_APP_VERSION, META_HEADERS, META_OBJECT_COL,
  META_PENDING_RENAME,
};
use super::record::{normalize_column_name, ColumnSet, Record};
use super::snapshot::{DocumentKind, Snapshot};
use super::FORMAT_VERSION;
use crate::error::{NetworkError, TableError};
use crate::store::{Collection, Store, StoredRecord};

/// Display and ordering settings for a table.
#[derive(Debug, Clone)]
pub struct TableOptions {
  pub locale: Locale,
  pub ungrouped_label: String,
}

impl Default for TableOptions {
  fn default() -> Self {
    Self {
      locale: Locale::default(),
      ungrouped_label: "(ungrouped)".to_string(),
    }
  }
}

/// Why the seed document was used instead of the stored table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedReason {
  /// No format version stored yet
  FirstRun,
  /// Stored data was written by an incompatible format version
  VersionMismatch { found: String },
  /// Version matched but the rows collection was empty
  NoRows,
  /// Rows were stored without the `headers` entry, so column order is unknown
  NoSchema,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
  Resumed,
  Seeded(SeedReason),
}

/// Outcome of loading the table at startup.
#[derive(Debug, Clone)]
pub struct LoadReport {
  pub source: LoadSource,
  pub rows: usize,
  /// Rows and schema dropped because of a version mismatch, as a document
  pub discarded: Option<Value>,
}

/// In-memory table. Only `TableManager` mutates it.
#[derive(Debug, Clone, Default)]
struct TableState {
  columns: ColumnSet,
  grouping: String,
  rows: Vec<Record>,
}

pub struct TableManager<S: Store> {
  store: S,
  state: TableState,
  collator: Collator,
  ungrouped_label: String,
}

impl<S: Store> TableManager<S> {
  /// Load the table from `store`, falling back to the seed document.
  ///
  /// `seed` is only invoked when the stored data cannot be resumed.
  pub async fn load<F, Fut>(
    store: S,
    options: TableOptions,
    seed: F,
  ) -> Result<(Self, LoadReport), TableError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, TableError>>,
  {
    let mut manager = Self {
      store,
      state: TableState::default(),
      collator: Collator::new(options.locale),
      ungrouped_label: options.ungrouped_label,
    };
    let report = manager.reload(seed).await?;
    Ok((manager, report))
  }

  /// Re-run the startup load against the current store contents.
  pub async fn reload<F, Fut>(&mut self, seed: F) -> Result<LoadReport, TableError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, TableError>>,
  {
    let version: Option<String> = self.read_meta(META_APP_VERSION)?;
    let mut discarded = None;

    let reason = match version {
      Some(v) if v == FORMAT_VERSION => {
        let rows: Vec<Record> = self.store.get_all()?;
        let headers: Option<Vec<String>> = self.read_meta(META_HEADERS)?;
        match headers {
          Some(headers) if !rows.is_empty() => {
            self.hydrate(headers, rows)?;
            info!(rows = self.state.rows.len(), "Resumed table from local store");
            return Ok(LoadReport {
              source: LoadSource::Resumed,
              rows: self.state.rows.len(),
              discarded: None,
            });
          }
          Some(_) => SeedReason::NoRows,
          None if rows.is_empty() => SeedReason::NoRows,
          None => {
            discarded = self.stored_document()?;
            warn!(rows = rows.len(), "Stored rows have no column list, reseeding");
            SeedReason::NoSchema
          }
        }
      }
      Some(found) => {
        discarded = self.stored_document()?;
        if discarded.is_some() {
          warn!(
            found = %found,
            expected = FORMAT_VERSION,
            "Stored data has an incompatible format version, reseeding"
          );
        }
        SeedReason::VersionMismatch { found }
      }
      None => SeedReason::FirstRun,
    };

    let doc = seed().await?;
    let snapshot = Snapshot::from_document(&doc, DocumentKind::Seed)
      .map_err(|e| TableError::Network(NetworkError::Decode(e)))?;

    self.replace_all(snapshot, "seed")?;
    self.write_meta(META_APP_VERSION, &FORMAT_VERSION)?;
    info!(rows = self.state.rows.len(), reason = ?reason, "Seeded table");

    Ok(LoadReport {
      source: LoadSource::Seeded(reason),
      rows: self.state.rows.len(),
      discarded,
    })
  }

  fn hydrate(&mut self, mut headers: Vec<String>, mut rows: Vec<Record>) -> Result<(), TableError> {
    let mut stored_grouping: Option<String> = self.read_meta(META_OBJECT_COL)?;
    let pending: Option<PendingRename> = self
      .read_meta::<Option<PendingRename>>(META_PENDING_RENAME)?
      .flatten();
    if let Some(rename) = &pending {
      rename.replay(&mut headers, &mut stored_grouping, &mut rows);
    }

    let columns = ColumnSet::new(&headers)?;
    let grouping = stored_grouping
      .filter(|g| columns.contains(g))
      .or_else(|| columns.first().map(String::from))
      .unwrap_or_default();

    rows.sort_by_key(|r| r.rank);
    for row in &mut rows {
      row.conform(&columns);
    }

    self.state = TableState {
      columns,
      grouping,
      rows,
    };

    if let Some(rename) = pending {
      warn!(from = %rename.from, to = %rename.to, "Completing interrupted column rename");
      self.persist_all_rows("rename column")?;
      self.persist_schema()?;
      self.write_meta(META_PENDING_RENAME, &None::<PendingRename>)?;
    }
    Ok(())
  }

  /// Best-effort document of whatever is stored, for backups.
  fn stored_document(&self) -> Result<Option<Value>, TableError> {
    let rows: Vec<RawRow> = self.store.get_all()?;
    if rows.is_empty() {
      return Ok(None);
    }
    let headers: Option<Value> = self.read_meta(META_HEADERS).unwrap_or(None);
    let object_column: Option<Value> = self.read_meta(META_OBJECT_COL).unwrap_or(None);

    // Flatten `{id, values: {..}}` rows back into document rows when possible
    let rows: Vec<Value> = rows
      .into_iter()
      .map(|raw| {
        let id = raw.store_key();
        match raw.0 {
          Value::Object(mut obj) => match obj.remove("values") {
            Some(Value::Object(values)) => {
              let mut row = serde_json::Map::new();
              row.insert("id".to_string(), Value::String(id));
              row.extend(values);
              Value::Object(row)
            }
            Some(other) => {
              obj.insert("values".to_string(), other);
              Value::Object(obj)
            }
            None => Value::Object(obj),
          },
          other => other,
        }
      })
      .collect();

    Ok(Some(serde_json::json!({
      "headers": headers.unwrap_or(Value::Null),
      "objectColumn": object_column.unwrap_or(Value::Null),
      "rows": rows,
    })))
  }

  // ==========================================================================
  // Accessors
  // ==========================================================================

  pub fn columns(&self) -> &ColumnSet {
    &self.state.columns
  }

  pub fn grouping_column(&self) -> &str {
    &self.state.grouping
  }

  pub fn rows(&self) -> &[Record] {
    &self.state.rows
  }

  #[cfg(test)]
  pub fn row(&self, id: &str) -> Option<&Record> {
    self.state.rows.iter().find(|r| r.id == id)
  }

  pub fn ungrouped_label(&self) -> &str {
    &self.ungrouped_label
  }

  #[cfg(test)]
  pub fn store(&self) -> &S {
    &self.store
  }

  // ==========================================================================
  // Structural edits
  // ==========================================================================

  /// Append `name` unless it is already a column. Safe to call on every start.
  ///
  /// Returns whether the column was added.
  pub fn ensure_column(&mut self, name: &str) -> Result<bool, TableError> {
    let name = normalize_column_name(name)?;
    if self.state.columns.contains(&name) {
      return Ok(false);
    }
    self.append_column(name, "ensure column")?;
    Ok(true)
  }

  pub fn add_column(&mut self, name: &str) -> Result<(), TableError> {
    let name = normalize_column_name(name)?;
    if self.state.columns.contains(&name) {
      return Err(TableError::validation(format!(
        "column \"{}\" already exists",
        name
      )));
    }
    self.append_column(name, "add column")
  }

  fn append_column(&mut self, name: String, operation: &'static str) -> Result<(), TableError> {
    for row in &mut self.state.rows {
      row.set(&name, "");
    }
    self.state.columns.push(name.clone());
    if self.state.grouping.is_empty() {
      self.state.grouping = name.clone();
    }
    info!(column = %name, "Added column");

    self.persist_all_rows(operation)?;
    self.persist_schema()
  }

  pub fn rename_column(&mut self, from: &str, to: &str) -> Result<(), TableError> {
    if !self.state.columns.contains(from) {
      return Err(TableError::not_found(format!("column \"{}\"", from)));
    }
    let to = normalize_column_name(to)?;
    if to == from {
      return Err(TableError::validation("new name is the same as the old one"));
    }
    if self.state.columns.contains(&to) {
      return Err(TableError::validation(format!(
        "column \"{}\" already exists",
        to
      )));
    }

    // Stored rows are migrated one by one; mark the rename first so a resume
    // can finish it
    let pending = PendingRename {
      from: from.to_string(),
      to: to.clone(),
    };
    self.write_meta(META_PENDING_RENAME, &Some(&pending))?;

    self.state.columns.rename(from, &to);
    if self.state.grouping == from {
      self.state.grouping = to.clone();
    }
    for row in &mut self.state.rows {
      let value = row.values.remove(from).unwrap_or_default();
      row.set(&to, value);
    }
    info!(from = %from, to = %to, "Renamed column");

    self.persist_all_rows("rename column")?;
    self.persist_schema()?;
    self.write_meta(META_PENDING_RENAME, &None::<PendingRename>)
  }

  pub fn delete_column(&mut self, name: &str) -> Result<(), TableError> {
    if !self.state.columns.contains(name) {
      return Err(TableError::not_found(format!("column \"{}\"", name)));
    }
    if name == self.state.grouping {
      return Err(TableError::validation(format!(
        "\"{}\" is the grouping column and cannot be deleted",
        name
      )));
    }

    self.state.columns.remove(name);
    for row in &mut self.state.rows {
      row.values.remove(name);
    }
    info!(column = %name, "Deleted column");

    self.persist_all_rows("delete column")?;
    self.persist_schema()
  }

  pub fn set_grouping_column(&mut self, name: &str) -> Result<(), TableError> {
    if !self.state.columns.contains(name) {
      return Err(TableError::not_found(format!("column \"{}\"", name)));
    }
    self.state.grouping = name.to_string();
    self.persist_schema()
  }

  // ==========================================================================
  // Row edits
  // ==========================================================================

  /// Insert an empty row at the front, grouped under `group`.
  ///
  /// Returns the new row id.
  pub fn add_row(&mut self, group: &str) -> Result<String, TableError> {
    let rank = self
      .state
      .rows
      .iter()
      .map(|r| r.rank)
      .min()
      .map_or(0, |min| min - 1);
    let mut record = Record::empty(rank, &self.state.columns);
    if self.state.columns.contains(&self.state.grouping) {
      record.set(&self.state.grouping, group);
    }
    let id = record.id.clone();

    self.state.rows.insert(0, record);
    self.store.put(&self.state.rows[0])?;
    debug!(id = %id, "Added row");
    Ok(id)
  }

  /// Set one cell and persist the whole row.
  ///
  /// Returns `Ok(false)` without touching anything if `row_id` is unknown.
  pub fn edit_cell(
    &mut self,
    row_id: &str,
    column: &str,
    value: &str,
  ) -> Result<bool, TableError> {
    let Some(index) = self.state.rows.iter().position(|r| r.id == row_id) else {
      return Ok(false);
    };
    if !self.state.columns.contains(column) {
      return Err(TableError::not_found(format!("column \"{}\"", column)));
    }

    let row = &mut self.state.rows[index];
    row.set(column, value);
    self.store.put(&*row)?;
    Ok(true)
  }

  // ==========================================================================
  // Read-side projections
  // ==========================================================================

  /// Groups with member counts, in locale order.
  pub fn compute_groups(&self) -> Vec<Group> {
    let mut counts: HashMap<GroupKey, usize> = HashMap::new();
    for row in &self.state.rows {
      *counts
        .entry(GroupKey::from_value(row.get(&self.state.grouping)))
        .or_default() += 1;
    }

    let mut groups: Vec<Group> = counts
      .into_iter()
      .map(|(key, count)| Group {
        name: key.label(&self.ungrouped_label).to_string(),
        key,
        count,
      })
      .collect();

    groups.sort_by(|a, b| {
      self
        .collator
        .compare(&a.name, &b.name)
        .then_with(|| a.key.is_ungrouped().cmp(&b.key.is_ungrouped()))
    });
    groups
  }

  /// Rows in table order matching an optional group and a free-text filter.
  pub fn filtered_rows(&self, group: Option<&GroupKey>, text: &str) -> Vec<&Record> {
    let needle = text.to_lowercase();
    self
      .state
      .rows
      .iter()
      .filter(|row| group.map_or(true, |g| g.matches(row.get(&self.state.grouping))))
      .filter(|row| {
        needle.is_empty()
          || self
            .state
            .columns
            .iter()
            .any(|c| row.get(c).to_lowercase().contains(&needle))
      })
      .collect()
  }

  // ==========================================================================
  // Export / import
  // ==========================================================================

  pub fn export_snapshot(&self) -> Snapshot {
    let rows = self
      .state
      .rows
      .iter()
      .enumerate()
      .map(|(i, r)| Record {
        rank: i as i64,
        ..r.clone()
      })
      .collect();

    Snapshot {
      columns: self.state.columns.clone(),
      object_column: self.state.grouping.clone(),
      rows,
    }
  }

  /// Replace the whole table with a document. Invalid documents change nothing.
  pub fn import_snapshot(&mut self, doc: &Value) -> Result<usize, TableError> {
    let snapshot =
      Snapshot::from_document(doc, DocumentKind::Import).map_err(TableError::Validation)?;
    self.replace_all(snapshot, "import")?;
    info!(rows = self.state.rows.len(), "Imported table");
    Ok(self.state.rows.len())
  }

  fn replace_all(&mut self, snapshot: Snapshot, operation: &'static str) -> Result<(), TableError> {
    self.state = TableState {
      columns: snapshot.columns,
      grouping: snapshot.object_column,
      rows: snapshot.rows,
    };

    self.store.clear(Collection::Rows)?;
    self.persist_all_rows(operation)?;
    self.persist_schema()
  }

  // ==========================================================================
  // Comments
  // ==========================================================================

  pub fn set_comment(&mut self, group: &str, text: &str) -> Result<Comment, TableError> {
    let comment = Comment {
      group: group.to_string(),
      text: text.to_string(),
      updated_at: Utc::now(),
    };
    self.store.put(&comment)?;
    Ok(comment)
  }

  pub fn get_comment(&self, group: &str) -> Result<Option<Comment>, TableError> {
    Ok(self.store.get(group)?)
  }

  pub fn comments(&self) -> Result<Vec<Comment>, TableError> {
    Ok(self.store.get_all()?)
  }

  // ==========================================================================
  // Reset
  // ==========================================================================

  /// Clear every collection and drop the in-memory table.
  ///
  /// The manager is empty afterwards; call `reload` to start over.
  pub fn reset_all(&mut self) -> Result<(), TableError> {
    self.state = TableState::default();
    for collection in Collection::ALL {
      self.store.clear(collection)?;
    }
    info!("Cleared all local data");
    Ok(())
  }

  // ==========================================================================
  // Persistence helpers
  // ==========================================================================

  fn persist_all_rows(&self, operation: &'static str) -> Result<(), TableError> {
    let total = self.state.rows.len();
    for (written, row) in self.state.rows.iter().enumerate() {
      self
        .store
        .put(row)
        .map_err(|source| TableError::PartialWrite {
          operation,
          written,
          total,
          source,
        })?;
    }
    Ok(())
  }

  fn persist_schema(&self) -> Result<(), TableError> {
    self.write_meta(META_HEADERS, &self.state.columns)?;
    self.write_meta(META_OBJECT_COL, &self.state.grouping)
  }

  fn write_meta<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), TableError> {
    let entry = MetaEntry {
      key: key.to_string(),
      value: serde_json::to_value(value).map_err(crate::error::StorageError::from)?,
    };
    Ok(self.store.put(&entry)?)
  }

  fn read_meta<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, TableError> {
    let Some(entry) = self.store.get::<MetaEntry>(key)? else {
      return Ok(None);
    };
    let value = serde_json::from_value(entry.value).map_err(crate::error::StorageError::from)?;
    Ok(Some(value))
  }
}
