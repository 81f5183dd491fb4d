//! High-level operations that correspond to CLI commands
//!
//! These modules hold the command logic for each rname operation,
//! separated from CLI concerns like argument parsing and output formatting.

pub mod favorites;
pub mod history;
pub mod rename;
pub mod undo;

pub use favorites::{
    favorites_add_operation, favorites_alias_operation, favorites_get_operation,
    favorites_list_operation, favorites_remove_operation,
};
pub use history::history_operation;
pub use rename::{print_data_operation, rename_operation, RenameRequest};
pub use undo::{undo_operation, UndoTarget};
