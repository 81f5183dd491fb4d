use crate::context::ContextProvider;
use crate::error::{RenameError, Result};
use crate::operation::{path_key, Operation, Outcome, SkipReason};
use crate::options::{RenameOptions, SortKey};
use crate::preview::PreviewLine;
use crate::prompt::Prompter;
use crate::store::{BatchRecord, OperationLogStore};
use crate::template::Renderer;
use anyhow::anyhow;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

static BATCH_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// All operations produced by one invocation
#[derive(Debug)]
pub struct Batch {
    id: String,
    command: Vec<String>,
    working_dir: PathBuf,
    options: RenameOptions,
    operations: Vec<Operation>,
    planned: bool,
}

/// What happened to each operation, in execution order
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Set when the batch was recorded in the operation log
    pub batch_id: Option<String>,
    pub outcomes: Vec<Outcome>,
}

impl BatchReport {
    pub fn renamed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_renamed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Skipped { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Failed { .. }))
            .count()
    }

    pub fn declined(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o,
                    Outcome::Skipped {
                        reason: SkipReason::Declined,
                        ..
                    }
                )
            })
            .count()
    }
}

impl Batch {
    pub fn new(
        inputs: Vec<PathBuf>,
        template: &str,
        options: RenameOptions,
        working_dir: &Path,
        command: Vec<String>,
    ) -> Self {
        let operations = inputs
            .into_iter()
            .map(|input| Operation::new(input, template, working_dir))
            .collect();

        Self {
            id: generate_batch_id(&command, working_dir),
            command,
            working_dir: working_dir.to_path_buf(),
            options,
            operations,
            planned: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn options(&self) -> &RenameOptions {
        &self.options
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Render, sort and index every operation. Any render error aborts the
    /// plan and leaves it unexecutable.
    pub fn plan(&mut self, provider: &dyn ContextProvider, renderer: &dyn Renderer) -> Result<()> {
        self.planned = false;
        for operation in &mut self.operations {
            operation.render(provider, renderer, &self.options)?;
        }
        self.sort();
        self.index_and_find_conflicts();
        self.planned = true;
        Ok(())
    }

    /// Run every planned operation in order.
    ///
    /// Filesystem failures are isolated per operation. A prompt failure
    /// aborts the remaining operations.
    pub fn execute(
        &mut self,
        prompter: &mut dyn Prompter,
        mut store: Option<&mut dyn OperationLogStore>,
    ) -> Result<BatchReport> {
        if !self.planned {
            return Err(RenameError::Store(anyhow!(
                "batch {} must be planned before it is executed",
                self.id
            )));
        }

        let recording = !self.options.simulate && !self.options.no_undo;
        let mut batch_id = None;
        if recording {
            if let Some(store) = store.as_deref_mut() {
                store.append_batch(BatchRecord::new(
                    self.id.clone(),
                    self.command.clone(),
                    self.working_dir.clone(),
                ))?;
                batch_id = Some(self.id.clone());
            }
        }

        let mut outcomes = Vec::with_capacity(self.operations.len());
        for operation in &mut self.operations {
            let outcome = match operation.run(&self.options, prompter) {
                Ok(outcome) => outcome,
                Err(e @ RenameError::Prompt(_)) => return Err(e),
                Err(e) => Outcome::Failed {
                    input: operation.input().to_path_buf(),
                    error: e.to_string(),
                },
            };

            match &outcome {
                Outcome::Renamed { input, output, .. } => {
                    if let (Some(id), Some(store)) = (&batch_id, store.as_deref_mut()) {
                        let pair = (input.clone(), output.clone());
                        if let Err(e) = store.append_entries(id, &[pair]) {
                            warn!(
                                "Renamed {} but could not record it for undo: {:#}",
                                input.display(),
                                e
                            );
                        }
                    }
                },
                Outcome::Failed { error, .. } => warn!("{}", error),
                _ => {},
            }
            outcomes.push(outcome);
        }

        Ok(BatchReport { batch_id, outcomes })
    }

    /// `plan` followed by `execute`
    pub fn complete(
        &mut self,
        provider: &dyn ContextProvider,
        renderer: &dyn Renderer,
        prompter: &mut dyn Prompter,
        store: Option<&mut dyn OperationLogStore>,
    ) -> Result<BatchReport> {
        self.plan(provider, renderer)?;
        self.execute(prompter, store)
    }

    /// One annotated line per planned operation
    pub fn preview_lines(&self) -> Vec<PreviewLine> {
        self.operations
            .iter()
            .map(|op| PreviewLine::from_operation(op, &self.working_dir))
            .collect()
    }

    /// Names sort ascending; dates and sizes newest/largest first. Stable,
    /// so ties keep input order.
    fn sort(&mut self) {
        let Some(mode) = self.options.sort else {
            return;
        };
        match mode.key {
            SortKey::Name => self.operations.sort_by(|a, b| a.input().cmp(b.input())),
            SortKey::CreateDate => self
                .operations
                .sort_by(|a, b| b.facts().created.cmp(&a.facts().created)),
            SortKey::ModifyDate => self
                .operations
                .sort_by(|a, b| b.facts().modified.cmp(&a.facts().modified)),
            SortKey::Size => self
                .operations
                .sort_by(|a, b| b.facts().size.cmp(&a.facts().size)),
        }
        if mode.reverse {
            self.operations.reverse();
        }
        debug!("Sorted {} operations by {}", self.operations.len(), mode);
    }

    fn index_and_find_conflicts(&mut self) {
        let mut widths = vec![1; self.operations.len()];
        for group in self.collision_groups() {
            if group.len() == 1 {
                self.operations[group[0]].set_index("", &self.options);
                continue;
            }

            info!(
                "{} operations have the same output path: {}",
                group.len(),
                self.operations[group[0]].output().display()
            );
            if self.options.no_index {
                for &i in &group {
                    self.operations[i].set_index("", &self.options);
                    self.operations[i].set_conflict(true);
                }
            } else {
                self.assign_indices(&group);
                for &i in &group {
                    widths[i] = index_width(group.len());
                }
            }
        }

        if !self.options.no_index {
            self.resolve_indexed_collisions(&widths);
        }
    }

    /// Indexing can recreate a name another operation already produces,
    /// e.g. `a` + `1` next to a literal `a1`. The earliest operation keeps
    /// the name and each later one takes the lowest index that is still
    /// free. Every candidate is distinct and the set of taken names is
    /// finite, so this always terminates.
    fn resolve_indexed_collisions(&mut self, widths: &[usize]) {
        let mut pending: HashMap<String, usize> = HashMap::new();
        for operation in &self.operations {
            *pending.entry(path_key(operation.output())).or_default() += 1;
        }

        let mut claimed: HashSet<String> = HashSet::new();
        for i in 0..self.operations.len() {
            let key = path_key(self.operations[i].output());
            if let Some(count) = pending.get_mut(&key) {
                *count -= 1;
                if *count == 0 {
                    pending.remove(&key);
                }
            }
            if claimed.insert(key) {
                continue;
            }

            let mut next = 1;
            loop {
                let index = format!("{:0width$}", next, width = widths[i]);
                self.operations[i].set_index(&index, &self.options);
                let candidate = path_key(self.operations[i].output());
                if !claimed.contains(&candidate) && !pending.contains_key(&candidate) {
                    claimed.insert(candidate);
                    break;
                }
                next += 1;
            }
            debug!(
                "Re-indexed {} to {}",
                self.operations[i].input().display(),
                self.operations[i].output().display()
            );
        }
    }

    fn assign_indices(&mut self, group: &[usize]) {
        let width = index_width(group.len());
        for (position, &i) in group.iter().enumerate() {
            let index = format!("{:0width$}", position + 1, width = width);
            debug!("Index {} for {}", index, self.operations[i].input().display());
            self.operations[i].set_index(&index, &self.options);
        }
    }

    /// Operation positions grouped by case-insensitive output path, groups
    /// in order of first appearance
    fn collision_groups(&self) -> Vec<Vec<usize>> {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for (i, operation) in self.operations.iter().enumerate() {
            let key = path_key(operation.output());
            match positions.get(&key) {
                Some(&g) => groups[g].push(i),
                None => {
                    positions.insert(key, groups.len());
                    groups.push(vec![i]);
                },
            }
        }
        groups
    }
}

/// Digits in `group_size`: 9 → 1, 12 → 2, 100 → 3
pub fn index_width(group_size: usize) -> usize {
    group_size.to_string().len()
}

pub(crate) fn generate_batch_id(command: &[String], working_dir: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(command.join("\0").as_bytes());
    hasher.update(working_dir.to_string_lossy().as_bytes());
    hasher.update(std::process::id().to_le_bytes());
    hasher.update(BATCH_SEQUENCE.fetch_add(1, Ordering::Relaxed).to_le_bytes());
    hasher.update(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default()
            .to_string()
            .as_bytes(),
    );
    format!("{:x}", hasher.finalize())[..16].to_string()
}
