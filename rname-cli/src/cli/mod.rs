pub mod args;
pub mod types;

pub use args::{Cli, Commands, FavoritesCommand, RenameArgs};
pub use types::OutputFormat;
