mod command_input;
mod confirm;
mod input;
mod key_result;
mod picker;
mod prompt;
mod search_input;

pub use command_input::{CommandEvent, CommandInput};
pub use confirm::Confirm;
pub use key_result::KeyResult;
pub use picker::{Picker, PickerEvent};
pub use prompt::{Prompt, PromptEvent};
pub use search_input::{SearchEvent, SearchInput};
