use crate::output::HistoryResult;
use crate::store::{JsonLogStore, OperationLogStore};
use anyhow::Result;
use std::path::Path;

/// History operation - one page of batches, newest first
pub fn history_operation(
    page: usize,
    per_page: usize,
    include_undone: bool,
    data_dir: &Path,
) -> Result<HistoryResult> {
    let store = JsonLogStore::load(data_dir)?;
    Ok(HistoryResult {
        page: store.paginate(page, per_page, include_undone),
    })
}
