mod inventory;
mod objects;
mod rows;

pub use inventory::{Action, InventoryView};
