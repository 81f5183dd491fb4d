use crate::batch::Batch;
use crate::config::Config;
use crate::context::{Context as FileContext, ContextProvider, FileContextProvider};
use crate::lock::LockFile;
use crate::options::RenameOptions;
use crate::output::RenameResult;
use crate::prompt::Prompter;
use crate::store::{JsonLogStore, OperationLogStore};
use crate::template::TemplateEngine;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything one `rname rename` invocation needs
#[derive(Debug, Clone)]
pub struct RenameRequest {
    pub inputs: Vec<PathBuf>,
    pub template: String,
    pub options: RenameOptions,
    pub working_dir: PathBuf,
    /// Argument vector recorded with the batch
    pub command: Vec<String>,
}

/// Plan and run a batch. Simulated batches never touch the data directory.
pub fn rename_operation(
    request: RenameRequest,
    config: &Config,
    data_dir: &Path,
    prompter: &mut dyn Prompter,
    use_color: bool,
) -> Result<RenameResult> {
    let RenameRequest {
        inputs,
        template,
        options,
        working_dir,
        command,
    } = request;
    let simulate = options.simulate;

    let provider = FileContextProvider::new(config, &options)?;
    let renderer = TemplateEngine::from_config(config)?;

    let mut batch = Batch::new(inputs, &template, options, &working_dir, command);
    batch.plan(&provider, &renderer)?;
    debug!("Planned batch {} with {} operations", batch.id(), batch.operations().len());

    let report = if simulate {
        batch.execute(prompter, None)?
    } else {
        let lock = LockFile::acquire(data_dir)
            .context("Failed to acquire lock for rename operation")?;
        let mut log_store = JsonLogStore::load(data_dir)?;
        let store: Option<&mut dyn OperationLogStore> = if batch.options().no_undo {
            None
        } else {
            Some(&mut log_store)
        };
        let report = batch.execute(prompter, store)?;
        lock.release()?;
        report
    };

    let preview = if simulate {
        batch.preview_lines()
    } else {
        Vec::new()
    };
    Ok(RenameResult::new(report, working_dir, simulate).with_preview(preview, use_color))
}

/// Context of every input, for `--printdata`
pub fn print_data_operation(
    inputs: &[PathBuf],
    options: &RenameOptions,
    config: &Config,
) -> Result<Vec<(PathBuf, FileContext)>> {
    let provider = FileContextProvider::new(config, options)?;
    inputs
        .iter()
        .map(|input| -> Result<(PathBuf, FileContext)> {
            Ok((input.clone(), provider.context(input, options)?))
        })
        .collect()
}
