use anyhow::{Context, Result};
use globset::GlobBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Inputs found on disk plus the patterns that matched nothing
#[derive(Debug, Default)]
pub struct ExpandedInputs {
    pub paths: Vec<PathBuf>,
    pub missing: Vec<String>,
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// Expand shell-style patterns relative to `working_dir`.
///
/// Literal paths are kept when they exist. Glob patterns are walked from
/// their literal prefix; `*` does not cross directories, `**` does.
pub fn expand_inputs(patterns: &[String], working_dir: &Path) -> Result<ExpandedInputs> {
    let mut expanded = ExpandedInputs::default();
    let mut seen = HashSet::new();

    for pattern in patterns {
        let matches = if is_glob(pattern) {
            expand_glob(pattern, working_dir)?
        } else {
            let path = working_dir.join(pattern);
            if path.symlink_metadata().is_ok() {
                vec![path]
            } else {
                Vec::new()
            }
        };

        if matches.is_empty() {
            expanded.missing.push(pattern.clone());
            continue;
        }
        for path in matches {
            if seen.insert(path.clone()) {
                expanded.paths.push(path);
            }
        }
    }

    Ok(expanded)
}

fn expand_glob(pattern: &str, working_dir: &Path) -> Result<Vec<PathBuf>> {
    let normalized = pattern.replace('\\', "/");
    let components: Vec<&str> = normalized.split('/').collect();
    let split = components
        .iter()
        .position(|c| is_glob(c))
        .unwrap_or(components.len());

    let prefix = components[..split].join("/");
    let base = if prefix.is_empty() && normalized.starts_with('/') {
        PathBuf::from("/")
    } else {
        working_dir.join(&prefix)
    };
    let rest = &components[split..];
    let rest_pattern = rest.join("/");
    let recursive = rest.contains(&"**");
    let wants_hidden = rest.last().is_some_and(|c| c.starts_with('.'));

    let matcher = GlobBuilder::new(&rest_pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("Invalid glob pattern: {}", pattern))?
        .compile_matcher();

    debug!("Expanding {} from {}", rest_pattern, base.display());

    let mut walker = WalkDir::new(&base).min_depth(1).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(rest.len());
    }

    let mut matches = Vec::new();
    for entry in walker.into_iter().filter_map(Result::ok) {
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden && !wants_hidden {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(&base) else {
            continue;
        };
        if matcher.is_match(relative) {
            matches.push(entry.into_path());
        }
    }
    Ok(matches)
}
