#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod batch;
pub mod config;
pub mod context;
pub mod error;
pub mod favorites;
pub mod history;
pub mod lock;
pub mod operation;
pub mod operations;
pub mod options;
pub mod output;
pub mod preview;
pub mod prompt;
pub mod store;
pub mod template;
pub mod undo;

pub use batch::{Batch, BatchReport};
pub use config::{data_dir, Config, FilterRule};
pub use context::{Context, ContextProvider, FileContextProvider, FileFacts, INDEX_PLACEHOLDER};
pub use error::RenameError;
pub use favorites::{Favorite, FavoritesStore};
pub use history::{format_history, HistoryItem, DEFAULT_PAGE_SIZE};
pub use lock::LockFile;
pub use operation::{Operation, Outcome, SkipReason};
pub use options::{RenameOptions, SortKey, SortMode};
pub use output::{
    FavoritesResult, HistoryResult, OutputFormat, OutputFormatter, RenameResult, UndoResult,
    VersionResult,
};
pub use preview::{render_preview, PreviewLine};
pub use prompt::{Answer, AutoPrompter, Prompter, ScriptedPrompter};
pub use store::{BatchRecord, JsonLogStore, LogEntry, OperationLogStore, Page};
pub use template::{Renderer, TemplateEngine, TemplateError};
pub use undo::{undo_batch, undo_entries, undo_latest, UndoReport};
pub use operations::{
    favorites_add_operation, favorites_alias_operation, favorites_get_operation,
    favorites_list_operation, favorites_remove_operation, history_operation, print_data_operation,
    rename_operation, undo_operation, RenameRequest, UndoTarget,
};
