use anyhow::Result;
use rname_core::{undo_operation, OutputFormatter, UndoTarget};
use std::path::Path;

use crate::cli::OutputFormat;

pub fn handle_undo(
    batch: Option<String>,
    entries: Vec<u64>,
    output: OutputFormat,
    quiet: bool,
    data_dir: &Path,
) -> Result<()> {
    let target = match batch {
        None => UndoTarget::Latest,
        Some(batch) if entries.is_empty() => UndoTarget::Batch(batch),
        Some(batch) => UndoTarget::Entries { batch, entries },
    };
    let result = undo_operation(&target, data_dir)?;

    match output {
        OutputFormat::Json => println!("{}", result.format_json()),
        OutputFormat::Summary => {
            if !quiet {
                print!("{}", result.format_summary());
            }
        },
    }
    Ok(())
}
