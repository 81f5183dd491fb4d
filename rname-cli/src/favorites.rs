use anyhow::{anyhow, Result};
use clap::Parser;
use rname_core::{
    favorites_add_operation, favorites_alias_operation, favorites_get_operation,
    favorites_list_operation, favorites_remove_operation, OutputFormatter,
};
use std::path::Path;

use crate::cli::{Cli, Commands, FavoritesCommand, OutputFormat, RenameArgs};

/// What the caller should do after a favorites command
pub enum FavoritesAction {
    Done,
    /// Replay this rename with the stored argument vector
    Run(RenameArgs, Vec<String>),
}

pub fn handle_favorites(
    command: FavoritesCommand,
    quiet: bool,
    data_dir: &Path,
) -> Result<FavoritesAction> {
    match command {
        FavoritesCommand::List { output } => {
            let result = favorites_list_operation(data_dir)?;
            match output {
                OutputFormat::Json => println!("{}", result.format_json()),
                OutputFormat::Summary => println!("{}", result.format_summary()),
            }
        },
        FavoritesCommand::Add { alias, args } => {
            parse_rename(&args)?;
            let favorite = favorites_add_operation(args, alias, data_dir)?;
            if !quiet {
                println!("Saved favorite {}: {}", favorite.id, favorite.command_line());
            }
        },
        FavoritesCommand::Run { id } => {
            let favorite = favorites_get_operation(&id, data_dir)?;
            if !quiet {
                eprintln!("Running favorite {}: {}", favorite.id, favorite.command_line());
            }
            let args = parse_rename(&favorite.command)?;
            return Ok(FavoritesAction::Run(args, favorite.command));
        },
        FavoritesCommand::Remove { id } => {
            let removed = favorites_remove_operation(&id, data_dir)?;
            if !quiet {
                println!("Removed favorite {}", removed.id);
            }
        },
        FavoritesCommand::Alias { id, alias, clear } => {
            let alias = if clear { None } else { alias };
            favorites_alias_operation(id, alias.clone(), data_dir)?;
            if !quiet {
                match alias {
                    Some(alias) => println!("Favorite {} is now aliased '{}'", id, alias),
                    None => println!("Cleared alias of favorite {}", id),
                }
            }
        },
    }
    Ok(FavoritesAction::Done)
}

/// Favorites may only hold rename invocations
fn parse_rename(args: &[String]) -> Result<RenameArgs> {
    let argv = std::iter::once("rname".to_string()).chain(args.iter().cloned());
    let cli = Cli::try_parse_from(argv).map_err(|e| anyhow!("Invalid favorite command: {}", e))?;
    match cli.command {
        Commands::Rename(args) => Ok(args),
        _ => Err(anyhow!("Favorites can only store rename commands")),
    }
}
