use crate::lock::LockFile;
use crate::output::UndoResult;
use crate::store::JsonLogStore;
use crate::undo::{undo_batch, undo_entries, undo_latest};
use anyhow::{Context, Result};
use std::path::Path;

/// What `rname undo` should revert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoTarget {
    /// Newest batch with open entries
    Latest,
    /// Batch id or unique id prefix
    Batch(String),
    /// Selected entries of one batch
    Entries { batch: String, entries: Vec<u64> },
}

/// High-level undo operation - equivalent to `rname undo`
pub fn undo_operation(target: &UndoTarget, data_dir: &Path) -> Result<UndoResult> {
    let _lock =
        LockFile::acquire(data_dir).context("Failed to acquire lock for undo operation")?;
    let mut store = JsonLogStore::load(data_dir)?;

    let report = match target {
        UndoTarget::Latest => undo_latest(&mut store)?,
        UndoTarget::Batch(id) => {
            let id = store.resolve_batch_id(id)?;
            undo_batch(&mut store, &id)?
        },
        UndoTarget::Entries { batch, entries } => {
            let id = store.resolve_batch_id(batch)?;
            undo_entries(&mut store, &id, entries)?
        },
    };

    Ok(UndoResult { report })
}
