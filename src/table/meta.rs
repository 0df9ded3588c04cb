use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::Record;
use crate::store::{Collection, StoredRecord};

pub const META_HEADERS: &str = "headers";
pub const META_OBJECT_COL: &str = "object_col";
pub const META_APP_VERSION: &str = "app_version";
pub const META_PENDING_RENAME: &str = "pending_rename";

/// One schema setting in the `meta` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaEntry {
  pub key: String,
  pub value: serde_json::Value,
}

impl StoredRecord for MetaEntry {
  fn collection() -> Collection {
    Collection::Meta
  }

  fn store_key(&self) -> String {
    self.key.clone()
  }
}

/// Column rename whose per-row writes may not all have reached the store.
///
/// Written before the first row is touched and cleared once the schema is
/// saved, so a resume can finish the rename instead of dropping values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRename {
  pub from: String,
  pub to: String,
}

impl PendingRename {
  /// Apply the rename to stored headers, grouping and rows. Rows already
  /// written under the new name are left alone.
  pub fn replay(&self, headers: &mut [String], grouping: &mut Option<String>, rows: &mut [Record]) {
    let has_from = headers.iter().any(|h| *h == self.from);
    let has_to = headers.iter().any(|h| *h == self.to);
    if has_from && has_to {
      return;
    }

    if has_from {
      for header in headers.iter_mut().filter(|h| **h == self.from) {
        *header = self.to.clone();
      }
      if grouping.as_deref() == Some(self.from.as_str()) {
        *grouping = Some(self.to.clone());
      }
    }

    for row in rows {
      if let Some(value) = row.values.remove(&self.from) {
        row.values.entry(self.to.clone()).or_insert(value);
      }
    }
  }
}

/// Free-text note attached to a group name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub group: String,
  pub text: String,
  pub updated_at: DateTime<Utc>,
}

impl Comment {
  /// Short single-line preview for list views
  pub fn preview(&self, max_chars: usize) -> String {
    let flat = self.text.replace(['\r', '\n'], " ");
    if flat.chars().count() > max_chars {
      let head: String = flat.chars().take(max_chars).collect();
      format!("{}…", head)
    } else {
      flat
    }
  }
}

impl StoredRecord for Comment {
  fn collection() -> Collection {
    Collection::Comments
  }

  fn store_key(&self) -> String {
    self.group.clone()
  }
}

/// A stored row read without assuming the current record layout.
///
/// Used to back up rows written by an incompatible format version before
/// they are discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow(pub serde_json::Value);

impl StoredRecord for RawRow {
  fn collection() -> Collection {
    Collection::Rows
  }

  fn store_key(&self) -> String {
    match self.0.get("id") {
      Some(serde_json::Value::String(id)) => id.clone(),
      Some(other) => other.to_string(),
      None => String::new(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn comment(text: &str) -> Comment {
    Comment {
      group: "Lobby".to_string(),
      text: text.to_string(),
      updated_at: Utc::now(),
    }
  }

  #[test]
  fn test_preview_short_text() {
    assert_eq!(comment("two chairs").preview(64), "two chairs");
  }

  #[test]
  fn test_preview_truncates_on_chars() {
    let text = "ж".repeat(70);
    let preview = comment(&text).preview(64);
    assert_eq!(preview.chars().count(), 65);
    assert!(preview.ends_with('…'));
  }

  #[test]
  fn test_preview_flattens_newlines() {
    assert_eq!(comment("a\nb").preview(64), "a b");
  }
}
