/// What a component did with a key press.
///
/// Views route a key to their active overlay first and only fall back to
/// their own bindings on `NotHandled`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed without anything for the parent to do
  Handled,
  /// Consumed, with an event for the parent
  Event(T),
  /// Not consumed; the parent tries its next handler
  NotHandled,
}

impl<T> KeyResult<T> {
  /// Whether the component took the key, with or without an event
  pub fn is_consumed(&self) -> bool {
    !matches!(self, KeyResult::NotHandled)
  }
}
