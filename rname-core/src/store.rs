use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

pub const HISTORY_FILE_NAME: &str = "history.json";

/// One executed rename
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique across the whole store
    pub id: u64,
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub undone: bool,
    pub created_at: String,
}

/// Header plus entries for one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub id: String,
    pub created_at: String,
    /// Argument vector the batch was started with
    pub command: Vec<String>,
    pub working_dir: PathBuf,
    #[serde(default)]
    pub undone: bool,
    /// Set on batches written by undo: the batch that was reverted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert_of: Option<String>,
    #[serde(default)]
    pub entries: Vec<LogEntry>,
}

impl BatchRecord {
    pub fn new(id: impl Into<String>, command: Vec<String>, working_dir: PathBuf) -> Self {
        Self {
            id: id.into(),
            created_at: chrono::Local::now().to_rfc3339(),
            command,
            working_dir,
            undone: false,
            revert_of: None,
            entries: Vec::new(),
        }
    }

    pub fn revert(id: impl Into<String>, of: &Self) -> Self {
        Self {
            revert_of: Some(of.id.clone()),
            ..Self::new(id, of.command.clone(), of.working_dir.clone())
        }
    }

    /// Entries not yet undone, in execution order
    pub fn open_entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(|e| !e.undone)
    }

    pub fn is_revert(&self) -> bool {
        self.revert_of.is_some()
    }
}

/// One page of history, newest first
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub batches: Vec<BatchRecord>,
}

impl Page {
    pub fn total_pages(&self) -> usize {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.per_page)
    }
}

/// Durable, append-only record of executed renames
pub trait OperationLogStore {
    fn append_batch(&mut self, batch: BatchRecord) -> Result<()>;

    /// Append `(input, output)` pairs to an existing batch
    fn append_entries(&mut self, batch_id: &str, pairs: &[(PathBuf, PathBuf)])
        -> Result<Vec<LogEntry>>;

    fn batch(&self, id: &str) -> Option<BatchRecord>;

    /// Newest batch that is neither undone, a revert, nor empty
    fn most_recent_open_batch(&self) -> Option<BatchRecord>;

    /// Mark entries undone; the batch follows once all its entries are.
    fn mark_undone(&mut self, batch_id: &str, entry_ids: &[u64]) -> Result<()>;

    /// Mark the batch undone whatever the state of its entries
    fn close_batch(&mut self, batch_id: &str) -> Result<()>;

    /// 1-based page of batches, newest first
    fn paginate(&self, page: usize, per_page: usize, include_undone: bool) -> Page;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LogFile {
    #[serde(default)]
    batches: Vec<BatchRecord>,
}

/// [`OperationLogStore`] kept in `history.json`, rewritten after every
/// mutation
#[derive(Debug, Default)]
pub struct JsonLogStore {
    path: Option<PathBuf>,
    log: LogFile,
}

impl JsonLogStore {
    /// Load the store from the data directory
    pub fn load(data_dir: &Path) -> Result<Self> {
        Self::load_from_path(&data_dir.join(HISTORY_FILE_NAME))
    }

    /// Load the store from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let log = if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open history file: {}", path.display()))?;
            let reader = BufReader::new(file);
            serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse history file: {}", path.display()))?
        } else {
            LogFile::default()
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            log,
        })
    }

    /// Store that is never written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> &[BatchRecord] {
        &self.log.batches
    }

    /// Find a batch by id or unique id prefix
    pub fn resolve_batch_id(&self, id: &str) -> Result<String> {
        if let Some(batch) = self.log.batches.iter().find(|b| b.id == id) {
            return Ok(batch.id.clone());
        }
        let matches: Vec<_> = self
            .log
            .batches
            .iter()
            .filter(|b| b.id.starts_with(id))
            .collect();
        match matches.as_slice() {
            [only] => Ok(only.id.clone()),
            [] => Err(anyhow!("History batch '{}' not found", id)),
            _ => Err(anyhow!("History batch id '{}' is ambiguous", id)),
        }
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("Failed to create history file: {}", path.display()))?;

        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self.log)
            .with_context(|| format!("Failed to write history file: {}", path.display()))?;

        Ok(())
    }

    fn batch_mut(&mut self, id: &str) -> Result<&mut BatchRecord> {
        self.log
            .batches
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| anyhow!("History batch '{}' not found", id))
    }

    fn next_entry_id(&self) -> u64 {
        self.log
            .batches
            .iter()
            .flat_map(|b| b.entries.iter().map(|e| e.id))
            .max()
            .map_or(1, |max| max + 1)
    }
}

impl OperationLogStore for JsonLogStore {
    fn append_batch(&mut self, batch: BatchRecord) -> Result<()> {
        if self.log.batches.iter().any(|b| b.id == batch.id) {
            return Err(anyhow!("History batch with ID {} already exists", batch.id));
        }

        self.log.batches.push(batch);
        self.save()
    }

    fn append_entries(
        &mut self,
        batch_id: &str,
        pairs: &[(PathBuf, PathBuf)],
    ) -> Result<Vec<LogEntry>> {
        let mut next_id = self.next_entry_id();
        let created_at = chrono::Local::now().to_rfc3339();
        let batch = self.batch_mut(batch_id)?;

        let mut added = Vec::with_capacity(pairs.len());
        for (input, output) in pairs {
            let entry = LogEntry {
                id: next_id,
                input: input.clone(),
                output: output.clone(),
                undone: false,
                created_at: created_at.clone(),
            };
            next_id += 1;
            batch.entries.push(entry.clone());
            added.push(entry);
        }

        self.save()?;
        Ok(added)
    }

    fn batch(&self, id: &str) -> Option<BatchRecord> {
        self.log.batches.iter().find(|b| b.id == id).cloned()
    }

    fn most_recent_open_batch(&self) -> Option<BatchRecord> {
        self.log
            .batches
            .iter()
            .rev()
            .find(|b| !b.undone && !b.is_revert() && b.open_entries().next().is_some())
            .cloned()
    }

    fn mark_undone(&mut self, batch_id: &str, entry_ids: &[u64]) -> Result<()> {
        let batch = self.batch_mut(batch_id)?;
        for entry in &mut batch.entries {
            if entry_ids.contains(&entry.id) {
                entry.undone = true;
            }
        }
        if batch.entries.iter().all(|e| e.undone) {
            batch.undone = true;
        }
        self.save()
    }

    fn close_batch(&mut self, batch_id: &str) -> Result<()> {
        self.batch_mut(batch_id)?.undone = true;
        self.save()
    }

    fn paginate(&self, page: usize, per_page: usize, include_undone: bool) -> Page {
        let visible: Vec<&BatchRecord> = self
            .log
            .batches
            .iter()
            .rev()
            .filter(|b| include_undone || !b.undone)
            .collect();
        let page = page.max(1);
        let batches = visible
            .iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .map(|b| (*b).clone())
            .collect();

        Page {
            page,
            per_page,
            total: visible.len(),
            batches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: &str) -> BatchRecord {
        BatchRecord::new(id, vec!["rname".to_string()], PathBuf::from("/work"))
    }

    fn pair(from: &str, to: &str) -> (PathBuf, PathBuf) {
        (PathBuf::from(from), PathBuf::from(to))
    }

    #[test]
    fn test_store_append_and_load() {
        let temp_dir = TempDir::new().unwrap();

        let mut store = JsonLogStore::load(temp_dir.path()).unwrap();
        store.append_batch(record("batch1")).unwrap();
        let entries = store
            .append_entries("batch1", &[pair("/a", "/b"), pair("/c", "/d")])
            .unwrap();
        assert_eq!(entries.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2]);

        let loaded = JsonLogStore::load(temp_dir.path()).unwrap();
        let batch = loaded.batch("batch1").unwrap();
        assert_eq!(batch.entries.len(), 2);
        assert_eq!(batch.entries[1].output, PathBuf::from("/d"));
        assert!(!batch.undone);
    }

    #[test]
    fn test_entry_ids_unique_across_batches() {
        let mut store = JsonLogStore::in_memory();
        store.append_batch(record("one")).unwrap();
        store.append_entries("one", &[pair("/a", "/b")]).unwrap();
        store.append_batch(record("two")).unwrap();
        let added = store.append_entries("two", &[pair("/c", "/d")]).unwrap();
        assert_eq!(added[0].id, 2);
    }

    #[test]
    fn test_duplicate_batch_rejected() {
        let mut store = JsonLogStore::in_memory();
        store.append_batch(record("same")).unwrap();
        assert!(store.append_batch(record("same")).is_err());
        assert!(store.append_entries("missing", &[pair("/a", "/b")]).is_err());
    }

    #[test]
    fn test_mark_undone_partial_then_full() {
        let mut store = JsonLogStore::in_memory();
        store.append_batch(record("b")).unwrap();
        store
            .append_entries("b", &[pair("/a", "/b"), pair("/c", "/d")])
            .unwrap();

        store.mark_undone("b", &[1]).unwrap();
        let batch = store.batch("b").unwrap();
        assert!(batch.entries[0].undone);
        assert!(!batch.undone);
        assert_eq!(batch.open_entries().count(), 1);

        store.mark_undone("b", &[2]).unwrap();
        assert!(store.batch("b").unwrap().undone);
    }

    #[test]
    fn test_closed_batch_is_no_longer_open() {
        let mut store = JsonLogStore::in_memory();
        store.append_batch(record("old")).unwrap();
        store.append_entries("old", &[pair("/a", "/b")]).unwrap();
        store.append_batch(record("new")).unwrap();
        store.append_entries("new", &[pair("/c", "/d")]).unwrap();

        store.close_batch("new").unwrap();
        let closed = store.batch("new").unwrap();
        assert!(closed.undone);
        assert!(!closed.entries[0].undone);
        assert_eq!(store.most_recent_open_batch().unwrap().id, "old");
        assert!(store.close_batch("missing").is_err());
    }

    #[test]
    fn test_most_recent_open_batch_skips_reverts_and_empty() {
        let mut store = JsonLogStore::in_memory();
        store.append_batch(record("first")).unwrap();
        store.append_entries("first", &[pair("/a", "/b")]).unwrap();
        store.append_batch(record("empty")).unwrap();
        let first = store.batch("first").unwrap();
        store.append_batch(BatchRecord::revert("rev", &first)).unwrap();
        store.append_entries("rev", &[pair("/b", "/a")]).unwrap();

        assert_eq!(store.most_recent_open_batch().unwrap().id, "first");

        store.mark_undone("first", &[1]).unwrap();
        assert!(store.most_recent_open_batch().is_none());
    }

    #[test]
    fn test_paginate_newest_first() {
        let mut store = JsonLogStore::in_memory();
        for i in 0..25 {
            store.append_batch(record(&format!("b{}", i))).unwrap();
        }
        store.append_entries("b24", &[pair("/a", "/b")]).unwrap();
        store.mark_undone("b24", &[1]).unwrap();

        let page = store.paginate(1, 10, false);
        assert_eq!(page.total, 24);
        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.batches[0].id, "b23");

        let last = store.paginate(3, 10, false);
        assert_eq!(last.batches.len(), 4);

        let all = store.paginate(1, 10, true);
        assert_eq!(all.batches[0].id, "b24");
    }

    #[test]
    fn test_resolve_batch_id_prefix() {
        let mut store = JsonLogStore::in_memory();
        store.append_batch(record("abc123")).unwrap();
        store.append_batch(record("abd456")).unwrap();

        assert_eq!(store.resolve_batch_id("abc").unwrap(), "abc123");
        assert_eq!(store.resolve_batch_id("abd456").unwrap(), "abd456");
        assert!(store.resolve_batch_id("ab").is_err());
        assert!(store.resolve_batch_id("zzz").is_err());
    }
}
