use anyhow::{anyhow, Result};
use rname_core::{
    favorites_add_operation, print_data_operation, rename_operation, Config, OutputFormatter,
    RenameOptions, RenameRequest,
};
use std::path::Path;

use crate::cli::{OutputFormat, RenameArgs};
use crate::glob::expand_inputs;
use crate::prompter::TerminalPrompter;

/// Everything a rename needs from outside its own arguments
pub struct RenameEnv<'a> {
    pub config: &'a Config,
    pub data_dir: &'a Path,
    pub working_dir: &'a Path,
    /// Argument vector recorded with the batch and saved by `--favorite`
    pub argv: Vec<String>,
    pub verbose: bool,
    pub quiet: bool,
    pub use_color: bool,
}

pub fn handle_rename(args: RenameArgs, env: RenameEnv<'_>) -> Result<()> {
    let mut positional = args.args.clone();
    let template = if args.print_data {
        None
    } else {
        if positional.len() < 2 {
            return Err(anyhow!("Expected at least one input followed by a template"));
        }
        positional.pop()
    };

    let options = build_options(&args, env.config, env.verbose)?;

    if args.favorite {
        let favorite =
            favorites_add_operation(strip_favorite_flags(&env.argv), args.alias.clone(), env.data_dir)?;
        if !env.quiet {
            eprintln!("Saved favorite {}", favorite.id);
        }
    }

    let expanded = expand_inputs(&positional, env.working_dir)?;
    for missing in &expanded.missing {
        eprintln!("Skipping {}: no such file or directory", missing);
    }
    if expanded.paths.is_empty() {
        if args.output == OutputFormat::Json {
            println!("{}", serde_json::json!({ "success": true, "operations": 0 }));
        } else if !env.quiet {
            println!("No input files found");
        }
        return Ok(());
    }

    if args.print_data {
        let data = print_data_operation(&expanded.paths, &options, env.config)?;
        let items: Vec<serde_json::Value> = data
            .into_iter()
            .map(|(path, context)| serde_json::json!({ "input": path, "data": context }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    let request = RenameRequest {
        inputs: expanded.paths,
        template: template.unwrap_or_default(),
        options,
        working_dir: env.working_dir.to_path_buf(),
        command: env.argv,
    };
    let mut prompter = TerminalPrompter::new();
    let result = rename_operation(
        request,
        env.config,
        env.data_dir,
        &mut prompter,
        env.use_color,
    )?;

    match args.output {
        OutputFormat::Json => println!("{}", result.format_json()),
        OutputFormat::Summary => {
            if !env.quiet {
                print!("{}", result.format_summary());
            }
        },
    }
    Ok(())
}

/// Config defaults with CLI flags OR-ed on top
fn build_options(args: &RenameArgs, config: &Config, verbose: bool) -> Result<RenameOptions> {
    let defaults = config.default_options()?;
    Ok(RenameOptions {
        force: args.force || (defaults.force && !args.keep),
        keep: args.keep || (defaults.keep && !args.force),
        simulate: args.simulate,
        verbose,
        no_index: args.no_index || defaults.no_index,
        no_trim: args.no_trim || defaults.no_trim,
        ignore_directories: args.ignore_directories || defaults.ignore_directories,
        no_move: args.no_move || defaults.no_move,
        create_dirs: args.create_dirs || defaults.create_dirs,
        no_ext: args.no_ext || defaults.no_ext,
        no_undo: args.no_undo || defaults.no_undo,
        sort: args.sort.map_or(defaults.sort, |s| s.0),
        regex: args.regex.clone(),
    })
}

/// Drop `--favorite` and `--alias` so replaying a favorite does not save it again
fn strip_favorite_flags(argv: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(argv.len());
    let mut iter = argv.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--favorite" => {},
            "--alias" => {
                iter.next();
            },
            a if a.starts_with("--alias=") => {},
            _ => out.push(arg.clone()),
        }
    }
    out
}
