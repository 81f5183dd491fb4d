use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while planning or executing a batch.
///
/// Collisions, missing directories and pre-existing targets are not errors;
/// they are tracked as flags on each [`crate::Operation`].
#[derive(Debug, Error)]
pub enum RenameError {
    /// The template could not be rendered against a file's context.
    #[error("failed to render template `{template}` for {}: {message}", input.display())]
    Template {
        template: String,
        input: PathBuf,
        message: String,
    },

    /// A `--regex` pattern or a user filter pattern failed to compile.
    #[error("invalid regex `{pattern}`: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The rename itself failed (permissions, disk full, source vanished).
    #[error("failed to rename {} to {}: {source}", from.display(), to.display())]
    Filesystem {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A logged output path no longer exists when undo is attempted.
    #[error("cannot undo {}: file no longer exists", output.display())]
    UndoTargetMissing { output: PathBuf },

    /// The prompter could not obtain an answer (closed stdin, Ctrl-C).
    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl RenameError {
    /// Planning errors abort the whole batch before anything is renamed.
    pub fn is_planning_error(&self) -> bool {
        matches!(self, Self::Template { .. } | Self::InvalidRegex { .. })
    }
}

pub type Result<T, E = RenameError> = std::result::Result<T, E>;
