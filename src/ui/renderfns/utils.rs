use ratatui::prelude::*;

/// Truncate a string to at most `max_chars` characters, adding "…" if truncated
pub fn truncate(s: &str, max_chars: usize) -> String {
  if s.chars().count() <= max_chars {
    return s.to_string();
  }
  let kept: String = s.chars().take(max_chars.saturating_sub(1)).collect();
  format!("{}…", kept)
}

/// Area of `percent_x`% width and `height` rows centered in `area`
pub fn centered_rect(area: Rect, percent_x: u16, height: u16) -> Rect {
  let width = (area.width * percent_x / 100).max(20).min(area.width);
  let height = height.min(area.height);
  let x = area.x + (area.width - width) / 2;
  let y = area.y + (area.height - height) / 2;
  Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello w…");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("Огнетушитель", 6), "Огнет…");
    assert_eq!(truncate("Стол", 4), "Стол");
  }

  #[test]
  fn test_centered_rect() {
    let area = Rect::new(0, 0, 100, 40);
    assert_eq!(centered_rect(area, 50, 10), Rect::new(25, 15, 50, 10));

    // Never larger than the area
    let small = Rect::new(0, 0, 10, 2);
    assert_eq!(centered_rect(small, 50, 5), Rect::new(0, 0, 10, 2));
  }
}
