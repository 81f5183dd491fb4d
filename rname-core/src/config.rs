use crate::options::{RenameOptions, SortMode};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that relocates the data directory
pub const HOME_ENV: &str = "RNAME_HOME";

const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Extra variables available to every template
    #[serde(default)]
    pub variables: BTreeMap<String, String>,

    /// Regex replacement filters registered next to the built-in ones
    #[serde(default)]
    pub filters: BTreeMap<String, FilterRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub keep: bool,
    #[serde(default)]
    pub no_index: bool,
    #[serde(default)]
    pub no_trim: bool,
    #[serde(default)]
    pub ignore_directories: bool,
    #[serde(default)]
    pub no_move: bool,
    #[serde(default)]
    pub create_dirs: bool,
    #[serde(default)]
    pub no_ext: bool,
    #[serde(default)]
    pub no_undo: bool,

    /// Default sort mode, e.g. "alphabet" or "reverse-size"
    #[serde(default)]
    pub sort: Option<String>,
}

/// A user filter: `{{ f | name }}` replaces every match of `pattern`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterRule {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

impl Config {
    /// Load config from the data directory if it exists
    pub fn load() -> Result<Self> {
        let config_path = data_dir()?.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Self::load_from_path(&config_path);
        }

        Ok(Self::default())
    }

    /// Load config from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save config to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Options seeded from `[defaults]`; CLI flags are layered on top.
    pub fn default_options(&self) -> Result<RenameOptions> {
        let d = &self.defaults;
        let sort = match &d.sort {
            Some(s) => SortMode::parse_optional(s).map_err(|e| anyhow!(e))?,
            None => None,
        };
        Ok(RenameOptions {
            force: d.force,
            keep: d.keep,
            no_index: d.no_index,
            no_trim: d.no_trim,
            ignore_directories: d.ignore_directories,
            no_move: d.no_move,
            create_dirs: d.create_dirs,
            no_ext: d.no_ext,
            no_undo: d.no_undo,
            sort,
            ..RenameOptions::default()
        })
    }
}

/// Directory holding config, history and favorites.
///
/// `$RNAME_HOME` wins over `~/.rname`.
pub fn data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(HOME_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".rname"))
        .ok_or_else(|| anyhow!("Could not determine home directory"))
}
