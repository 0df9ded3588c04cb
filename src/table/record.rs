//! Records and the ordered column set they conform to.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::TableError;
use crate::store::{Collection, StoredRecord};

/// Column name that would collide with the record id in documents.
pub const RESERVED_COLUMN: &str = "id";

/// Trim a user-supplied column name and reject empty or reserved names.
pub fn normalize_column_name(name: &str) -> Result<String, TableError> {
  let name = name.trim();
  if name.is_empty() {
    return Err(TableError::validation("column name must not be empty"));
  }
  if name == RESERVED_COLUMN {
    return Err(TableError::validation(format!(
      "\"{}\" is reserved for row ids",
      RESERVED_COLUMN
    )));
  }
  Ok(name.to_string())
}

/// Ordered, duplicate-free list of column names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnSet(Vec<String>);

impl ColumnSet {
  /// Build a column set, normalising each name and rejecting duplicates.
  pub fn new<I, T>(names: I) -> Result<Self, TableError>
  where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
  {
    let mut columns = Self::default();
    for name in names {
      let name = normalize_column_name(name.as_ref())?;
      if columns.contains(&name) {
        return Err(TableError::validation(format!(
          "duplicate column \"{}\"",
          name
        )));
      }
      columns.0.push(name);
    }
    Ok(columns)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.0.iter().any(|c| c == name)
  }

  pub fn iter(&self) -> impl Iterator<Item = &String> {
    self.0.iter()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn first(&self) -> Option<&str> {
    self.0.first().map(String::as_str)
  }

  pub fn get(&self, index: usize) -> Option<&str> {
    self.0.get(index).map(String::as_str)
  }

  pub fn as_slice(&self) -> &[String] {
    &self.0
  }

  pub(crate) fn push(&mut self, name: String) {
    self.0.push(name);
  }

  pub(crate) fn rename(&mut self, from: &str, to: &str) {
    for column in &mut self.0 {
      if column == from {
        *column = to.to_string();
      }
    }
  }

  pub(crate) fn remove(&mut self, name: &str) {
    self.0.retain(|c| c != name);
  }
}

/// One row of the table.
///
/// `values` always holds exactly one entry per column of the owning table;
/// `rank` orders rows for display and survives a reload from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
  pub id: String,
  #[serde(default)]
  pub rank: i64,
  #[serde(default)]
  pub values: BTreeMap<String, String>,
}

impl Record {
  /// A record with a fresh id and every column empty.
  pub fn empty(rank: i64, columns: &ColumnSet) -> Self {
    Self {
      id: fresh_id(),
      rank,
      values: columns.iter().map(|c| (c.clone(), String::new())).collect(),
    }
  }

  /// Value of a column; missing keys read as the empty string.
  pub fn get(&self, column: &str) -> &str {
    self.values.get(column).map(String::as_str).unwrap_or("")
  }

  pub(crate) fn set(&mut self, column: &str, value: impl Into<String>) {
    self.values.insert(column.to_string(), value.into());
  }

  /// Make the key set equal to `columns`: fill gaps with "", drop the rest.
  pub(crate) fn conform(&mut self, columns: &ColumnSet) {
    self.values.retain(|k, _| columns.contains(k));
    for column in columns.iter() {
      self.values.entry(column.clone()).or_default();
    }
  }
}

impl StoredRecord for Record {
  fn collection() -> Collection {
    Collection::Rows
  }

  fn store_key(&self) -> String {
    self.id.clone()
  }
}

pub fn fresh_id() -> String {
  uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_column_set_rejects_duplicates_and_reserved() {
    assert!(ColumnSet::new(["Room", "Qty"]).is_ok());
    assert!(ColumnSet::new(["Room", "Room"]).is_err());
    assert!(ColumnSet::new(["Room", "id"]).is_err());
    assert!(ColumnSet::new(["Room", "  "]).is_err());
  }

  #[test]
  fn test_column_set_trims_names() {
    let columns = ColumnSet::new([" Room "]).unwrap();
    assert_eq!(columns.as_slice(), ["Room".to_string()]);
  }

  #[test]
  fn test_rename_preserves_order() {
    let mut columns = ColumnSet::new(["A", "B", "C"]).unwrap();
    columns.rename("B", "X");
    assert_eq!(columns.as_slice(), ["A", "X", "C"]);
  }

  #[test]
  fn test_conform() {
    let columns = ColumnSet::new(["A", "B"]).unwrap();
    let mut record = Record {
      id: "r1".to_string(),
      rank: 0,
      values: [("A".to_string(), "1".to_string()), ("Z".to_string(), "9".to_string())]
        .into_iter()
        .collect(),
    };
    record.conform(&columns);

    assert_eq!(record.get("A"), "1");
    assert_eq!(record.get("B"), "");
    assert_eq!(record.values.len(), 2);
  }

  #[test]
  fn test_empty_record_has_unique_ids() {
    let columns = ColumnSet::new(["A"]).unwrap();
    let a = Record::empty(0, &columns);
    let b = Record::empty(0, &columns);
    assert_ne!(a.id, b.id);
    assert_eq!(a.get("A"), "");
  }
}
