//! Per-file template variables.
//!
//! A [`ContextProvider`] turns an input path into the JSON object a template
//! is rendered against. The batch engine only sees the trait, so tests and
//! embedders can supply their own variables.

use crate::config::Config;
use crate::error::{RenameError, Result};
use crate::options::RenameOptions;
use chrono::{DateTime, Local};
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Marker rendered for `{{i}}`; replaced once the batch assigns indices.
pub const INDEX_PLACEHOLDER: &str = "--FILEINDEXHERE--";

/// Variable name → value mapping for one file
pub type Context = Map<String, Value>;

/// Filesystem facts used for sorting and for skipping directories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFacts {
    pub exists: bool,
    pub is_dir: bool,
    pub size: u64,
    pub created: Option<SystemTime>,
    pub modified: Option<SystemTime>,
    pub accessed: Option<SystemTime>,
}

impl FileFacts {
    /// Read facts without following symlinks. Missing files yield defaults.
    pub fn read(path: &Path) -> Self {
        match fs::symlink_metadata(path) {
            Ok(meta) => Self {
                exists: true,
                is_dir: meta.is_dir(),
                size: meta.len(),
                created: meta.created().ok(),
                modified: meta.modified().ok(),
                accessed: meta.accessed().ok(),
            },
            Err(_) => Self::default(),
        }
    }
}

pub trait ContextProvider {
    fn facts(&self, input: &Path) -> FileFacts {
        FileFacts::read(input)
    }

    fn context(&self, input: &Path, options: &RenameOptions) -> Result<Context>;
}

/// Default provider: file name parts, dates, OS info, regex captures and
/// the user's `[variables]`.
#[derive(Debug, Clone, Default)]
pub struct FileContextProvider {
    variables: BTreeMap<String, String>,
    patterns: Vec<Regex>,
}

impl FileContextProvider {
    pub fn new(config: &Config, options: &RenameOptions) -> Result<Self> {
        let patterns = options
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| RenameError::InvalidRegex {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            variables: config.variables.clone(),
            patterns,
        })
    }

    fn regex_values(&self, stem: &str, context: &mut Context) {
        let mut matches = Vec::new();
        for re in &self.patterns {
            matches.extend(re.find_iter(stem).map(|m| Value::from(m.as_str())));

            let captures = re.captures(stem);
            for name in re.capture_names().flatten() {
                let value = captures
                    .as_ref()
                    .and_then(|c| c.name(name))
                    .map_or("", |m| m.as_str());
                context.insert(name.to_string(), Value::from(value));
            }
        }
        context.insert("regex".to_string(), Value::Array(matches));
    }
}

impl ContextProvider for FileContextProvider {
    fn context(&self, input: &Path, options: &RenameOptions) -> Result<Context> {
        let facts = self.facts(input);
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = input
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let parent = input
            .parent()
            .and_then(Path::file_name)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let now = Local::now().to_rfc3339();
        let index = if options.no_index {
            ""
        } else {
            INDEX_PLACEHOLDER
        };

        let mut context = Context::new();
        context.insert("i".to_string(), Value::from(index));
        context.insert("f".to_string(), Value::from(stem.as_str()));
        context.insert("fileName".to_string(), Value::from(stem.as_str()));
        context.insert("ext".to_string(), Value::from(ext));
        context.insert("isDirectory".to_string(), Value::from(facts.is_dir));
        context.insert("p".to_string(), Value::from(parent.as_str()));
        context.insert("parent".to_string(), Value::from(parent));
        context.insert(
            "date".to_string(),
            json!({
                "current": now,
                "now": now,
                "create": rfc3339(facts.created),
                "modify": rfc3339(facts.modified),
                "access": rfc3339(facts.accessed),
            }),
        );
        context.insert(
            "os".to_string(),
            json!({
                "homedir": dirs::home_dir()
                    .map(|h| h.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                "platform": std::env::consts::OS,
                "hostname": hostname(),
                "user": username(),
            }),
        );
        context.insert(
            "guid".to_string(),
            Value::from(uuid::Uuid::new_v4().to_string()),
        );
        context.insert("stats".to_string(), json!({ "size": facts.size }));

        self.regex_values(&stem, &mut context);

        for (key, value) in &self.variables {
            context.insert(key.clone(), Value::from(value.as_str()));
        }

        Ok(context)
    }
}

fn rfc3339(time: Option<SystemTime>) -> String {
    time.map(|t| DateTime::<Local>::from(t).to_rfc3339())
        .unwrap_or_default()
}

fn username() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_default()
}

fn hostname() -> String {
    gethostname::gethostname().to_string_lossy().into_owned()
}
