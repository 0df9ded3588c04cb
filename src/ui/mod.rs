pub mod components;
pub mod renderfns;
mod views;

pub use views::{Action, InventoryView};
