use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use super::types::{parse_sort, OutputFormat, SortArg};

/// Batch rename files with templates, collision handling and undo
#[derive(Parser, Debug)]
#[command(name = "rname")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR", value_parser = clap::builder::FalseyValueParser::new())]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rename files using a template
    Rename(RenameArgs),

    /// Undo the last batch, or a specific batch or entries
    Undo {
        /// Batch ID (or unique prefix) to undo
        #[arg(long)]
        batch: Option<String>,

        /// Entry IDs within the batch (comma-separated)
        #[arg(long, value_delimiter = ',', requires = "batch")]
        entries: Vec<u64>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
        output: OutputFormat,
    },

    /// Show rename history
    History {
        /// Page to show, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Batches per page
        #[arg(long)]
        limit: Option<usize>,

        /// Include undone batches
        #[arg(long)]
        all: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
        output: OutputFormat,
    },

    /// Manage saved commands
    Favorites {
        #[command(subcommand)]
        command: FavoritesCommand,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
        output: OutputFormat,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct RenameArgs {
    /// Input files or glob patterns, followed by the output template
    #[arg(required = true, value_name = "INPUTS... TEMPLATE")]
    pub args: Vec<String>,

    /// Overwrite existing files without asking
    #[arg(short, long, conflicts_with = "keep")]
    pub force: bool,

    /// Keep both files when the output already exists
    #[arg(short, long)]
    pub keep: bool,

    /// Show what would happen without renaming anything
    #[arg(short, long = "sim")]
    pub simulate: bool,

    /// Do not add an index to colliding output names
    #[arg(short = 'n', long = "noindex")]
    pub no_index: bool,

    /// Do not trim whitespace around the output name
    #[arg(long = "notrim")]
    pub no_trim: bool,

    /// Skip directories
    #[arg(short = 'd', long = "ignoredirectories")]
    pub ignore_directories: bool,

    /// Keep every file in its own directory
    #[arg(long = "nomove")]
    pub no_move: bool,

    /// Create missing output directories without asking
    #[arg(long = "createdirs")]
    pub create_dirs: bool,

    /// Do not append the input extension when the output has none
    #[arg(long = "noext")]
    pub no_ext: bool,

    /// Do not record this batch for undo
    #[arg(long = "noundo")]
    pub no_undo: bool,

    /// Sort mode: alphabet, date-create, date-modified, size, their reverse- forms, or none
    #[arg(long, value_name = "MODE", value_parser = parse_sort)]
    pub sort: Option<SortArg>,

    /// Regex matched against each file name; groups are available to the template
    #[arg(short, long, value_name = "PATTERN")]
    pub regex: Vec<String>,

    /// Save this command as a favorite
    #[arg(long)]
    pub favorite: bool,

    /// Alias for the saved favorite
    #[arg(long, requires = "favorite")]
    pub alias: Option<String>,

    /// Print the template data of each input as JSON instead of renaming
    #[arg(long = "printdata")]
    pub print_data: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
    pub output: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum FavoritesCommand {
    /// List saved favorites
    List {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
        output: OutputFormat,
    },

    /// Save a command, e.g. `rname favorites add -- rename '*.jpg' '{{f|big}}'`
    Add {
        #[arg(long)]
        alias: Option<String>,

        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Run a saved favorite
    Run {
        #[arg(value_name = "ID|ALIAS")]
        id: String,
    },

    /// Remove a saved favorite
    Remove {
        #[arg(value_name = "ID|ALIAS")]
        id: String,
    },

    /// Set the alias of a favorite, or clear it with --clear
    Alias {
        id: u64,

        #[arg(required_unless_present = "clear")]
        alias: Option<String>,

        #[arg(long, conflicts_with = "alias")]
        clear: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rname_core::{SortKey, SortMode};

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_rename_flags() {
        let cli = Cli::try_parse_from([
            "rname", "rename", "-s", "--noindex", "--sort", "reverse-size", "-r", "(\\d+)",
            "*.txt", "out",
        ])
        .unwrap();
        let Commands::Rename(args) = cli.command else {
            panic!("expected rename");
        };
        assert!(args.simulate);
        assert!(args.no_index);
        assert_eq!(args.sort, Some(SortArg(Some(SortMode::reversed(SortKey::Size)))));
        assert_eq!(args.regex, vec!["(\\d+)"]);
        assert_eq!(args.args, vec!["*.txt", "out"]);
    }

    #[test]
    fn test_force_conflicts_with_keep() {
        assert!(Cli::try_parse_from(["rname", "rename", "-f", "-k", "a", "b"]).is_err());
    }

    #[test]
    fn test_entries_require_batch() {
        assert!(Cli::try_parse_from(["rname", "undo", "--entries", "1,2"]).is_err());
        let cli = Cli::try_parse_from(["rname", "undo", "--batch", "abc", "--entries", "1,2"])
            .unwrap();
        let Commands::Undo { entries, .. } = cli.command else {
            panic!("expected undo");
        };
        assert_eq!(entries, vec![1, 2]);
    }

    #[test]
    fn test_favorites_add_keeps_hyphen_args() {
        let cli =
            Cli::try_parse_from(["rname", "favorites", "add", "rename", "-s", "*.txt", "out"])
                .unwrap();
        let Commands::Favorites {
            command: FavoritesCommand::Add { args, .. },
        } = cli.command
        else {
            panic!("expected favorites add");
        };
        assert_eq!(args, vec!["rename", "-s", "*.txt", "out"]);
    }
}
