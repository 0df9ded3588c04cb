//! Locale-aware ordering for group names.
//!
//! A small multi-level collation in the spirit of the Unicode Collation
//! Algorithm: base letters first (case and accents ignored), then accents,
//! then case with lowercase first. Scripts are reordered per locale so that
//! Cyrillic names come before Latin ones for Russian.

use serde::Deserialize;
use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
  #[default]
  Ru,
  En,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Collator {
  locale: Locale,
}

/// Per base character: (class, folded char), accents, is-uppercase
struct Keys {
  primary: Vec<(u8, char)>,
  secondary: Vec<Vec<char>>,
  tertiary: Vec<bool>,
}

impl Collator {
  pub fn new(locale: Locale) -> Self {
    Self { locale }
  }

  pub fn compare(&self, a: &str, b: &str) -> Ordering {
    let ka = self.keys(a);
    let kb = self.keys(b);
    ka.primary
      .cmp(&kb.primary)
      .then_with(|| ka.secondary.cmp(&kb.secondary))
      .then_with(|| ka.tertiary.cmp(&kb.tertiary))
      .then_with(|| a.cmp(b))
  }

  fn keys(&self, s: &str) -> Keys {
    let mut keys = Keys {
      primary: Vec::new(),
      secondary: Vec::new(),
      tertiary: Vec::new(),
    };

    for c in decompose(s) {
      if is_combining_mark(c) {
        if let Some(accents) = keys.secondary.last_mut() {
          accents.push(c);
        }
        continue;
      }
      let folded = c.to_lowercase().next().unwrap_or(c);
      keys.primary.push((self.class(folded), folded));
      keys.secondary.push(Vec::new());
      keys.tertiary.push(c != folded);
    }

    keys
  }

  fn class(&self, c: char) -> u8 {
    if c.is_alphabetic() {
      let (cyrillic, latin) = match self.locale {
        Locale::Ru => (3, 4),
        Locale::En => (4, 3),
      };
      if is_cyrillic(c) {
        cyrillic
      } else if c.is_ascii_alphabetic() || ('\u{00C0}'..='\u{024F}').contains(&c) {
        latin
      } else {
        5
      }
    } else if c.is_numeric() {
      2
    } else if "$+<=>^`|~".contains(c) {
      1
    } else {
      0
    }
  }
}

/// Canonical decomposition, except that й stays a letter of its own.
fn decompose(s: &str) -> Vec<char> {
  let mut out = Vec::with_capacity(s.len());
  for c in s.chars() {
    match c {
      'й' | 'Й' => out.push(c),
      _ => out.extend(std::iter::once(c).nfd()),
    }
  }
  out
}

fn is_cyrillic(c: char) -> bool {
  ('\u{0400}'..='\u{052F}').contains(&c)
}
