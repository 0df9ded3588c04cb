/// Bucket a record falls into, by its trimmed grouping-column value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
  Named(String),
  /// Empty or whitespace-only grouping value
  Ungrouped,
}

impl GroupKey {
  pub fn from_value(value: &str) -> Self {
    let value = value.trim();
    if value.is_empty() {
      GroupKey::Ungrouped
    } else {
      GroupKey::Named(value.to_string())
    }
  }

  /// Whether a raw grouping-column value belongs to this group
  pub fn matches(&self, value: &str) -> bool {
    match self {
      GroupKey::Named(name) => value.trim() == name,
      GroupKey::Ungrouped => value.trim().is_empty(),
    }
  }

  pub fn is_ungrouped(&self) -> bool {
    matches!(self, GroupKey::Ungrouped)
  }

  /// Key the group's comment is stored under. Named keys are never empty,
  /// so the ungrouped bucket cannot share a comment with a named group even
  /// when the label and a name coincide.
  pub fn comment_key(&self) -> &str {
    match self {
      GroupKey::Named(name) => name,
      GroupKey::Ungrouped => "",
    }
  }

  /// Display name; the ungrouped bucket uses `ungrouped_label`
  pub fn label<'a>(&'a self, ungrouped_label: &'a str) -> &'a str {
    match self {
      GroupKey::Named(name) => name,
      GroupKey::Ungrouped => ungrouped_label,
    }
  }
}

/// One entry of the grouped object list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
  pub key: GroupKey,
  pub name: String,
  pub count: usize,
}
