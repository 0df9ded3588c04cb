//! Seed, export and import documents.
//!
//! Wire format: `{ "headers": [..], "objectColumn": "..", "rows": [{..}] }`.
//! Rows are flat objects; `id` is optional on input and always present on
//! output, followed by the columns in column order.

use serde_json::{Map, Value};
use std::collections::HashSet;

use super::record::{fresh_id, ColumnSet, Record, RESERVED_COLUMN};

/// How strictly a document is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
  /// Bundled seed: `headers` may be omitted (taken from the first row) and a
  /// missing `rows` array means an empty table.
  Seed,
  /// User import: both `headers` and `rows` are required.
  Import,
}

/// Complete, validated table contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
  pub columns: ColumnSet,
  pub object_column: String,
  pub rows: Vec<Record>,
}

impl Snapshot {
  /// Validate a JSON document. Nothing is mutated on failure.
  pub fn from_document(doc: &Value, kind: DocumentKind) -> Result<Self, String> {
    let obj = doc
      .as_object()
      .ok_or_else(|| "document must be a JSON object".to_string())?;

    let rows: &[Value] = match obj.get("rows") {
      Some(Value::Array(rows)) => rows,
      Some(_) => return Err("\"rows\" must be an array".to_string()),
      None if kind == DocumentKind::Seed => &[],
      None => return Err("document has no \"rows\"".to_string()),
    };

    let headers: Vec<String> = match obj.get("headers") {
      Some(Value::Array(headers)) if !headers.is_empty() => headers
        .iter()
        .map(|h| {
          h.as_str()
            .map(String::from)
            .ok_or_else(|| "\"headers\" must contain only strings".to_string())
        })
        .collect::<Result<_, _>>()?,
      Some(Value::Array(_)) | None if kind == DocumentKind::Seed => rows
        .first()
        .and_then(Value::as_object)
        .map(|row| {
          row
            .keys()
            .filter(|k| k.as_str() != RESERVED_COLUMN)
            .cloned()
            .collect()
        })
        .unwrap_or_default(),
      Some(Value::Array(_)) => return Err("\"headers\" must not be empty".to_string()),
      Some(_) => return Err("\"headers\" must be an array".to_string()),
      None => return Err("document has no \"headers\"".to_string()),
    };

    let columns = ColumnSet::new(&headers).map_err(|e| e.to_string())?;

    let object_column = match obj.get("objectColumn") {
      Some(Value::String(name)) if !name.trim().is_empty() => {
        let name = name.trim();
        if !columns.contains(name) {
          return Err(format!("objectColumn \"{}\" is not one of the headers", name));
        }
        name.to_string()
      }
      Some(Value::String(_)) | Some(Value::Null) | None => {
        columns.first().unwrap_or_default().to_string()
      }
      Some(_) => return Err("\"objectColumn\" must be a string".to_string()),
    };

    let mut seen_ids = HashSet::new();
    let mut records = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
      let row = row
        .as_object()
        .ok_or_else(|| format!("row {} is not an object", index + 1))?;
      let record = record_from_row(row, index as i64, &columns);
      if !seen_ids.insert(record.id.clone()) {
        return Err(format!("duplicate row id \"{}\"", record.id));
      }
      records.push(record);
    }

    Ok(Self {
      columns,
      object_column,
      rows: records,
    })
  }

  /// Render the snapshot as a document.
  pub fn to_document(&self) -> Value {
    let headers: Vec<Value> = self
      .columns
      .iter()
      .map(|c| Value::String(c.clone()))
      .collect();

    let rows: Vec<Value> = self
      .rows
      .iter()
      .map(|record| {
        let mut row = Map::new();
        row.insert("id".to_string(), Value::String(record.id.clone()));
        for column in self.columns.iter() {
          row.insert(column.clone(), Value::String(record.get(column).to_string()));
        }
        Value::Object(row)
      })
      .collect();

    let mut doc = Map::new();
    doc.insert("headers".to_string(), Value::Array(headers));
    doc.insert(
      "objectColumn".to_string(),
      Value::String(self.object_column.clone()),
    );
    doc.insert("rows".to_string(), Value::Array(rows));
    Value::Object(doc)
  }
}

fn record_from_row(row: &Map<String, Value>, rank: i64, columns: &ColumnSet) -> Record {
  let id = match row.get(RESERVED_COLUMN) {
    Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
    Some(Value::Number(n)) => n.to_string(),
    _ => fresh_id(),
  };

  let values = columns
    .iter()
    .map(|column| (column.clone(), cell_text(row.get(column))))
    .collect();

  Record { id, rank, values }
}

/// Columns are strings; anything else is stringified.
fn cell_text(value: Option<&Value>) -> String {
  match value {
    None | Some(Value::Null) => String::new(),
    Some(Value::String(s)) => s.clone(),
    Some(Value::Number(n)) => n.to_string(),
    Some(Value::Bool(b)) => b.to_string(),
    Some(other) => other.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_demo_dataset_is_a_valid_seed() {
    let doc: Value = serde_json::from_str(include_str!("../../demos/data.json")).unwrap();
    let snapshot = Snapshot::from_document(&doc, DocumentKind::Seed).unwrap();
    assert_eq!(snapshot.object_column, "Объект");
    assert_eq!(snapshot.columns.len(), 5);
    assert_eq!(snapshot.rows.len(), 10);
  }

  #[test]
  fn test_seed_with_object_column() {
    let doc = json!({
      "headers": ["Room", "Qty"],
      "objectColumn": "Room",
      "rows": [{"Room": "101", "Qty": "3"}]
    });
    let snapshot = Snapshot::from_document(&doc, DocumentKind::Seed).unwrap();

    assert_eq!(snapshot.columns.as_slice(), ["Room", "Qty"]);
    assert_eq!(snapshot.object_column, "Room");
    assert_eq!(snapshot.rows.len(), 1);
    assert_eq!(snapshot.rows[0].get("Qty"), "3");
    assert!(!snapshot.rows[0].id.is_empty());
  }

  #[test]
  fn test_object_column_defaults_to_first_header() {
    let doc = json!({"headers": ["Room", "Qty"], "rows": []});
    let snapshot = Snapshot::from_document(&doc, DocumentKind::Import).unwrap();
    assert_eq!(snapshot.object_column, "Room");
  }

  #[test]
  fn test_seed_headers_from_first_row() {
    let doc = json!({"rows": [{"id": "x", "Room": "1", "Qty": 2}]});
    let snapshot = Snapshot::from_document(&doc, DocumentKind::Seed).unwrap();

    assert_eq!(snapshot.columns.len(), 2);
    assert!(snapshot.columns.contains("Room"));
    assert!(!snapshot.columns.contains("id"));
    assert_eq!(snapshot.rows[0].id, "x");
    assert_eq!(snapshot.rows[0].get("Qty"), "2");
  }

  #[test]
  fn test_import_requires_headers_and_rows() {
    let no_rows = json!({"headers": ["Room"]});
    let no_headers = json!({"rows": []});
    assert!(Snapshot::from_document(&no_rows, DocumentKind::Import).is_err());
    assert!(Snapshot::from_document(&no_headers, DocumentKind::Import).is_err());
    assert!(Snapshot::from_document(&json!([1, 2]), DocumentKind::Import).is_err());
  }

  #[test]
  fn test_unknown_object_column_rejected() {
    let doc = json!({"headers": ["Room"], "objectColumn": "Floor", "rows": []});
    assert!(Snapshot::from_document(&doc, DocumentKind::Import).is_err());
  }

  #[test]
  fn test_duplicate_ids_rejected() {
    let doc = json!({"headers": ["Room"], "rows": [{"id": "a"}, {"id": "a"}]});
    assert!(Snapshot::from_document(&doc, DocumentKind::Import).is_err());
  }

  #[test]
  fn test_values_are_coerced_and_extra_keys_dropped() {
    let doc = json!({
      "headers": ["A", "B", "C"],
      "rows": [{"A": null, "B": true, "C": 1.5, "Z": "dropped"}]
    });
    let snapshot = Snapshot::from_document(&doc, DocumentKind::Import).unwrap();
    let row = &snapshot.rows[0];

    assert_eq!(row.get("A"), "");
    assert_eq!(row.get("B"), "true");
    assert_eq!(row.get("C"), "1.5");
    assert!(!row.values.contains_key("Z"));
  }

  #[test]
  fn test_document_keeps_column_order() {
    let doc = json!({
      "headers": ["Zeta", "Alpha"],
      "objectColumn": "Zeta",
      "rows": [{"id": "r1", "Zeta": "z", "Alpha": "a"}]
    });
    let snapshot = Snapshot::from_document(&doc, DocumentKind::Import).unwrap();
    let out = snapshot.to_document();

    let keys: Vec<&String> = out["rows"][0].as_object().unwrap().keys().collect();
    assert_eq!(keys, ["id", "Zeta", "Alpha"]);
    assert_eq!(out, doc);
  }
}
