use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Flags that control how a batch is planned and executed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameOptions {
    /// Overwrite existing targets without asking
    pub force: bool,
    /// Keep both files when the target exists by appending `-1`, `-2`, ...
    pub keep: bool,
    /// Only report what would happen
    pub simulate: bool,
    pub verbose: bool,
    /// Do not inject a disambiguating index into colliding outputs
    pub no_index: bool,
    /// Do not trim whitespace around the rendered output
    pub no_trim: bool,
    /// Skip inputs that are directories
    pub ignore_directories: bool,
    /// Keep every output in its input's directory
    pub no_move: bool,
    /// Create missing output directories without asking
    pub create_dirs: bool,
    /// Do not append the input's extension when the output has none
    pub no_ext: bool,
    /// Do not record the batch in the operation log
    pub no_undo: bool,
    pub sort: Option<SortMode>,
    /// Patterns matched against each input's file stem
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    Name,
    CreateDate,
    ModifyDate,
    Size,
}

/// Ordering applied to operations after rendering and before indexing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortMode {
    pub key: SortKey,
    pub reverse: bool,
}

impl SortMode {
    pub const fn new(key: SortKey) -> Self {
        Self {
            key,
            reverse: false,
        }
    }

    pub const fn reversed(key: SortKey) -> Self {
        Self { key, reverse: true }
    }

    /// Parse a `--sort` value. `none` yields `Ok(None)`.
    pub fn parse_optional(s: &str) -> Result<Option<Self>, String> {
        if s.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        s.parse().map(Some)
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        let (reverse, name) = match lower.strip_prefix("reverse-") {
            Some(rest) => (true, rest),
            None => (false, lower.as_str()),
        };
        let key = match name {
            "alphabet" => SortKey::Name,
            "date-create" => SortKey::CreateDate,
            "date-modified" => SortKey::ModifyDate,
            "size" => SortKey::Size,
            _ => return Err(format!("Invalid sort mode: {}", s)),
        };
        Ok(Self { key, reverse })
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.key {
            SortKey::Name => "alphabet",
            SortKey::CreateDate => "date-create",
            SortKey::ModifyDate => "date-modified",
            SortKey::Size => "size",
        };
        if self.reverse {
            write!(f, "reverse-{}", name)
        } else {
            f.write_str(name)
        }
    }
}
