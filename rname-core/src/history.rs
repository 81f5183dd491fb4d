use crate::favorites::command_line;
use crate::store::{BatchRecord, Page};
use anyhow::Result;
use serde::Serialize;

/// Batches shown per page when no limit is given
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One row of the history listing
#[derive(Debug, Clone, Serialize)]
pub struct HistoryItem {
    pub id: String,
    pub created_at: String,
    pub command: String,
    pub working_dir: String,
    pub operations: usize,
    pub undone_operations: usize,
    pub undone: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revert_of: Option<String>,
}

impl From<&BatchRecord> for HistoryItem {
    fn from(batch: &BatchRecord) -> Self {
        Self {
            id: batch.id.clone(),
            created_at: batch.created_at.clone(),
            command: command_line(&batch.command),
            working_dir: batch.working_dir.to_string_lossy().into_owned(),
            operations: batch.entries.len(),
            undone_operations: batch.entries.iter().filter(|e| e.undone).count(),
            undone: batch.undone,
            revert_of: batch.revert_of.clone(),
        }
    }
}

impl HistoryItem {
    fn kind(&self) -> &'static str {
        if self.revert_of.is_some() {
            "undo"
        } else if self.undone {
            "undone"
        } else if self.undone_operations > 0 {
            "partial"
        } else {
            "rename"
        }
    }
}

/// Format a history page for display
pub fn format_history(page: &Page, json: bool) -> Result<String> {
    let items: Vec<HistoryItem> = page.batches.iter().map(HistoryItem::from).collect();
    if json {
        return Ok(serde_json::to_string_pretty(&serde_json::json!({
            "page": page.page,
            "per_page": page.per_page,
            "total": page.total,
            "batches": items,
        }))?);
    }
    if items.is_empty() {
        return Ok("No history entries found".to_string());
    }

    use comfy_table::{Cell, Color, Table};

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Date").fg(Color::Cyan),
        Cell::new("Command").fg(Color::Cyan),
        Cell::new("Renames").fg(Color::Cyan),
        Cell::new("Type").fg(Color::Cyan),
    ]);

    for item in &items {
        let date = item
            .created_at
            .split('T')
            .next()
            .unwrap_or(&item.created_at);
        table.add_row(vec![
            &item.id[..8.min(item.id.len())],
            date,
            &item.command,
            &item.operations.to_string(),
            item.kind(),
        ]);
    }

    let mut output = table.to_string();
    if page.total_pages() > 1 {
        output.push_str(&format!("\nPage {} of {}", page.page, page.total_pages()));
    }
    Ok(output)
}
