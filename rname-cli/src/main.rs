use anyhow::{Context, Result};
use clap::Parser;
use rname_core::{data_dir, Config};
use std::io::{self, IsTerminal};
use std::process;

mod cli;
mod completions;
mod favorites;
mod glob;
mod history;
mod logging;
mod prompter;
mod rename;
mod undo;
mod version;

use cli::{Cli, Commands};
use favorites::FavoritesAction;
use rename::RenameEnv;

fn main() {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet);
    let use_color = !cli.no_color && io::stdout().is_terminal();
    let argv: Vec<String> = std::env::args().skip(1).collect();

    if let Err(e) = run(cli, argv, use_color) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli, argv: Vec<String>, use_color: bool) -> Result<()> {
    let Cli {
        command,
        verbose,
        quiet,
        ..
    } = cli;

    // Neither needs the data directory
    match &command {
        Commands::Completions { shell } => {
            completions::handle_completions(*shell);
            return Ok(());
        },
        Commands::Version { output } => {
            version::handle_version(*output);
            return Ok(());
        },
        _ => {},
    }

    let data_dir = data_dir()?;
    let config = Config::load()?;
    let working_dir = std::env::current_dir().context("Failed to determine current directory")?;
    let env = |argv: Vec<String>| RenameEnv {
        config: &config,
        data_dir: &data_dir,
        working_dir: &working_dir,
        argv,
        verbose,
        quiet,
        use_color,
    };

    match command {
        Commands::Rename(args) => rename::handle_rename(args, env(argv)),
        Commands::Undo {
            batch,
            entries,
            output,
        } => undo::handle_undo(batch, entries, output, quiet, &data_dir),
        Commands::History {
            page,
            limit,
            all,
            output,
        } => history::handle_history(page, limit, all, output, quiet, &data_dir),
        Commands::Favorites { command } => {
            match favorites::handle_favorites(command, quiet, &data_dir)? {
                FavoritesAction::Done => Ok(()),
                FavoritesAction::Run(args, command) => rename::handle_rename(args, env(command)),
            }
        },
        Commands::Completions { .. } | Commands::Version { .. } => Ok(()),
    }
}
