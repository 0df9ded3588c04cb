pub mod footer;
pub mod header;
pub mod utils;

pub use footer::{draw_footer, StatusMessage};
pub use header::{draw_header, Shortcut};
pub use utils::{centered_rect, truncate};
