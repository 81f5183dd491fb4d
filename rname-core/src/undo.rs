use crate::batch::generate_batch_id;
use crate::error::RenameError;
use crate::operation::{path_key, perform_rename};
use crate::store::{BatchRecord, LogEntry, OperationLogStore};
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// An entry undo could not restore
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub entry_id: u64,
    pub input: PathBuf,
    pub output: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UndoReport {
    /// Batch that was reverted, absent when there was nothing to undo
    pub batch_id: Option<String>,
    /// Batch recording the reversal, absent when nothing was restored
    pub revert_batch_id: Option<String>,
    pub restored: Vec<LogEntry>,
    pub skipped: Vec<SkippedEntry>,
}

/// Undo the newest batch that still has open entries. An empty history
/// yields an empty report.
pub fn undo_latest(store: &mut dyn OperationLogStore) -> Result<UndoReport> {
    let Some(batch) = store.most_recent_open_batch() else {
        info!("No rename batches found that can be undone");
        return Ok(UndoReport {
            batch_id: None,
            revert_batch_id: None,
            restored: Vec::new(),
            skipped: Vec::new(),
        });
    };
    let entries = batch.open_entries().cloned().collect();
    revert(store, &batch, entries, true)
}

/// Undo every open entry of one batch
pub fn undo_batch(store: &mut dyn OperationLogStore, batch_id: &str) -> Result<UndoReport> {
    let batch = open_batch(store, batch_id)?;
    let entries = batch.open_entries().cloned().collect();
    revert(store, &batch, entries, true)
}

/// Undo selected entries of one batch. Entries already undone cannot be
/// selected again.
pub fn undo_entries(
    store: &mut dyn OperationLogStore,
    batch_id: &str,
    entry_ids: &[u64],
) -> Result<UndoReport> {
    let batch = open_batch(store, batch_id)?;

    let mut selected = Vec::with_capacity(entry_ids.len());
    for id in entry_ids {
        match batch.entries.iter().find(|e| e.id == *id) {
            Some(entry) if entry.undone => {
                return Err(anyhow!("Entry {} of batch {} is already undone", id, batch.id));
            },
            Some(entry) => selected.push(entry.clone()),
            None => return Err(anyhow!("Entry {} does not belong to batch {}", id, batch.id)),
        }
    }
    selected.sort_by_key(|e| e.id);
    selected.dedup_by_key(|e| e.id);
    revert(store, &batch, selected, false)
}

fn open_batch(store: &dyn OperationLogStore, batch_id: &str) -> Result<BatchRecord> {
    let batch = store
        .batch(batch_id)
        .ok_or_else(|| anyhow!("History batch '{}' not found", batch_id))?;
    if batch.is_revert() {
        return Err(anyhow!(
            "Batch {} is itself an undo and cannot be undone",
            batch.id
        ));
    }
    if batch.undone {
        return Err(anyhow!("Batch {} has already been undone", batch.id));
    }
    Ok(batch)
}

/// Move each entry's output back to its input, newest first. With
/// `close`, the batch is closed even when some entries were skipped.
fn revert(
    store: &mut dyn OperationLogStore,
    batch: &BatchRecord,
    entries: Vec<LogEntry>,
    close: bool,
) -> Result<UndoReport> {
    let mut restored = Vec::new();
    let mut skipped = Vec::new();

    for entry in entries.into_iter().rev() {
        match restore(&entry) {
            Ok(()) => {
                info!(
                    "Restored {} -> {}",
                    entry.output.display(),
                    entry.input.display()
                );
                restored.push(entry);
            },
            Err(reason) => {
                warn!("{}", reason);
                skipped.push(SkippedEntry {
                    entry_id: entry.id,
                    input: entry.input,
                    output: entry.output,
                    reason,
                });
            },
        }
    }

    let mut revert_batch_id = None;
    if !restored.is_empty() {
        let revert = BatchRecord::revert(
            generate_batch_id(&batch.command, &batch.working_dir),
            batch,
        );
        let id = revert.id.clone();
        store.append_batch(revert)?;
        let pairs: Vec<_> = restored
            .iter()
            .map(|e| (e.output.clone(), e.input.clone()))
            .collect();
        store.append_entries(&id, &pairs)?;
        let ids: Vec<u64> = restored.iter().map(|e| e.id).collect();
        store.mark_undone(&batch.id, &ids)?;
        revert_batch_id = Some(id);
    }
    if close {
        store.close_batch(&batch.id)?;
    }

    Ok(UndoReport {
        batch_id: Some(batch.id.clone()),
        revert_batch_id,
        restored,
        skipped,
    })
}

fn restore(entry: &LogEntry) -> Result<(), String> {
    if fs::symlink_metadata(&entry.output).is_err() {
        return Err(RenameError::UndoTargetMissing {
            output: entry.output.clone(),
        }
        .to_string());
    }
    let occupied = fs::symlink_metadata(&entry.input).is_ok()
        && path_key(&entry.input) != path_key(&entry.output);
    if occupied {
        return Err(format!(
            "cannot undo {}: {} is occupied by another file",
            entry.output.display(),
            entry.input.display()
        ));
    }

    if let Some(parent) = entry.input.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| {
                RenameError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                }
                .to_string()
            })?;
        }
    }
    perform_rename(&entry.output, &entry.input).map_err(|e| e.to_string())
}
