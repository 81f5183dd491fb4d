use anyhow::Result;
use rname_core::{history_operation, OutputFormatter, DEFAULT_PAGE_SIZE};
use std::path::Path;

use crate::cli::OutputFormat;

pub fn handle_history(
    page: usize,
    limit: Option<usize>,
    all: bool,
    output: OutputFormat,
    quiet: bool,
    data_dir: &Path,
) -> Result<()> {
    let result = history_operation(page, limit.unwrap_or(DEFAULT_PAGE_SIZE), all, data_dir)?;

    match output {
        OutputFormat::Json => println!("{}", result.format_json()),
        OutputFormat::Summary => {
            if !quiet {
                println!("{}", result.format_summary());
            }
        },
    }
    Ok(())
}
