use crate::context::{Context, ContextProvider, FileFacts, INDEX_PLACEHOLDER};
use crate::error::{RenameError, Result};
use crate::options::RenameOptions;
use crate::prompt::Prompter;
use crate::template::Renderer;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

const OVERWRITE_CHOICES: [&str; 3] = ["Overwrite the file", "Keep both files", "Skip"];

/// Why an operation did not rename anything
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The user (or a declining prompter) said no
    Declined,
    /// The input vanished between planning and execution
    SourceMissing,
    /// The input is a directory and directories are ignored
    Directory,
}

/// Result of running one operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Renamed {
        input: PathBuf,
        output: PathBuf,
        overwritten: bool,
    },
    Simulated {
        input: PathBuf,
        output: PathBuf,
    },
    Skipped {
        input: PathBuf,
        reason: SkipReason,
    },
    Failed {
        input: PathBuf,
        error: String,
    },
}

impl Outcome {
    pub fn input(&self) -> &Path {
        match self {
            Self::Renamed { input, .. }
            | Self::Simulated { input, .. }
            | Self::Skipped { input, .. }
            | Self::Failed { input, .. } => input,
        }
    }

    pub const fn is_renamed(&self) -> bool {
        matches!(self, Self::Renamed { .. })
    }
}

/// One file's planned rename.
///
/// `rendered` is the template output before path resolution; `output` is
/// the absolute destination derived from it. Both change when the batch
/// assigns an index or the user picks a new name.
#[derive(Debug, Clone)]
pub struct Operation {
    input: PathBuf,
    template: String,
    working_dir: PathBuf,
    context: Option<Context>,
    facts: FileFacts,
    rendered: String,
    output: PathBuf,
    has_index_placeholder: bool,
    conflict: bool,
    already_exists: bool,
    directory_exists: bool,
}

impl Operation {
    pub fn new(input: impl Into<PathBuf>, template: impl Into<String>, working_dir: &Path) -> Self {
        let input = normalize(&absolute(working_dir, &input.into()));
        Self {
            output: input.clone(),
            input,
            template: template.into(),
            working_dir: working_dir.to_path_buf(),
            context: None,
            facts: FileFacts::default(),
            rendered: String::new(),
            has_index_placeholder: false,
            conflict: false,
            already_exists: false,
            directory_exists: true,
        }
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    pub fn facts(&self) -> &FileFacts {
        &self.facts
    }

    pub const fn has_index_placeholder(&self) -> bool {
        self.has_index_placeholder
    }

    pub const fn conflict(&self) -> bool {
        self.conflict
    }

    pub const fn already_exists(&self) -> bool {
        self.already_exists
    }

    pub const fn directory_exists(&self) -> bool {
        self.directory_exists
    }

    /// Compute the context, render the template and resolve the first-draft
    /// output path.
    pub fn render(
        &mut self,
        provider: &dyn ContextProvider,
        renderer: &dyn Renderer,
        options: &RenameOptions,
    ) -> Result<()> {
        let context = provider.context(&self.input, options)?;
        self.facts = provider.facts(&self.input);

        let rendered = renderer
            .render(&self.template, &context)
            .map_err(|e| RenameError::Template {
                template: self.template.clone(),
                input: self.input.clone(),
                message: e.0,
            })?;
        self.context = Some(context);
        self.has_index_placeholder = rendered.contains(INDEX_PLACEHOLDER);
        self.set_rendered(rendered, options);
        Ok(())
    }

    /// Replace the index placeholder with `index`, or append `index` before
    /// the extension when the template has no placeholder.
    pub fn set_index(&mut self, index: &str, options: &RenameOptions) {
        let rendered = if self.rendered.contains(INDEX_PLACEHOLDER) {
            self.rendered.replace(INDEX_PLACEHOLDER, index)
        } else {
            append_to_file_name(&self.rendered, index)
        };
        self.set_rendered(rendered, options);
    }

    pub fn set_conflict(&mut self, conflict: bool) {
        self.conflict = conflict;
    }

    /// `"<input> → <output>"` with both paths relative to `base` when
    /// possible
    pub fn operation_text(&self, base: &Path) -> String {
        format!(
            "{} → {}",
            relative_display(&self.input, base),
            relative_display(&self.output, base)
        )
    }

    /// Execute the rename, asking `prompter` whenever policy requires a
    /// decision. Existing targets are handled first, then batch conflicts,
    /// then missing directories.
    pub fn run(&mut self, options: &RenameOptions, prompter: &mut dyn Prompter) -> Result<Outcome> {
        if options.ignore_directories && self.facts.is_dir {
            info!("Skipping {} because it is a directory", self.input.display());
            return Ok(self.skipped(SkipReason::Directory));
        }

        loop {
            self.refresh_flags();

            if self.already_exists && options.keep {
                self.keep_both(options);
            }

            if options.simulate {
                return Ok(Outcome::Simulated {
                    input: self.input.clone(),
                    output: self.output.clone(),
                });
            }

            if fs::symlink_metadata(&self.input).is_err() {
                info!(
                    "Skipping {} because the file no longer exists",
                    self.input.display()
                );
                return Ok(self.skipped(SkipReason::SourceMissing));
            }

            let text = self.operation_text(&self.working_dir);
            let mut overwritten = false;

            if self.already_exists {
                if !options.force {
                    let question = format!(
                        "{}\n  WARNING: {} already exists! What would you like to do?",
                        text,
                        relative_display(&self.output, &self.working_dir)
                    );
                    match prompter.choose(&question, &OVERWRITE_CHOICES)? {
                        Some(0) => {},
                        Some(1) => {
                            let default = self.alternate_name(options);
                            let answer = prompter.input_text(
                                "Please input the desired file name",
                                &relative_display(&default, &self.working_dir),
                            )?;
                            self.set_rendered(answer, options);
                            continue;
                        },
                        _ => return Ok(self.declined()),
                    }
                }
                overwritten = true;
            }

            if self.conflict && !options.force && !options.keep {
                let question = format!(
                    "{}\n  WARNING: This operation conflicts with other operations in this batch! Proceed?",
                    text
                );
                if !prompter.confirm(&question)? {
                    return Ok(self.declined());
                }
            }

            if !self.directory_exists && !options.create_dirs {
                let question = format!(
                    "{}\n  WARNING: The directory does not exist! Create it?",
                    text
                );
                if !prompter.confirm(&question)? {
                    return Ok(self.declined());
                }
            }

            return Ok(match self.execute() {
                Ok(()) => Outcome::Renamed {
                    input: self.input.clone(),
                    output: self.output.clone(),
                    overwritten,
                },
                Err(e) => Outcome::Failed {
                    input: self.input.clone(),
                    error: e.to_string(),
                },
            });
        }
    }

    fn execute(&mut self) -> Result<()> {
        if !self.directory_exists {
            if let Some(dir) = self.output.parent() {
                fs::create_dir_all(dir).map_err(|source| RenameError::CreateDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
            self.directory_exists = true;
        }
        perform_rename(&self.input, &self.output)
    }

    fn skipped(&self, reason: SkipReason) -> Outcome {
        Outcome::Skipped {
            input: self.input.clone(),
            reason,
        }
    }

    fn declined(&self) -> Outcome {
        info!("Skipping {}", relative_display(&self.output, &self.working_dir));
        self.skipped(SkipReason::Declined)
    }

    /// Append `-1`, `-2`, ... until the output names a free path
    fn keep_both(&mut self, options: &RenameOptions) {
        let base = self.rendered.clone();
        for n in 1.. {
            self.set_rendered(append_to_file_name(&base, &format!("-{}", n)), options);
            if !self.output.exists() {
                break;
            }
        }
        debug!("Keeping both files, new output {}", self.output.display());
    }

    /// `<dir>/<stem>1<ext>`, offered when the user keeps both files
    fn alternate_name(&self, options: &RenameOptions) -> PathBuf {
        let mut alternate = self.clone();
        alternate.set_rendered(append_to_file_name(&self.rendered, "1"), options);
        alternate.output
    }

    fn set_rendered(&mut self, rendered: String, options: &RenameOptions) {
        self.rendered = if options.no_trim {
            rendered
        } else {
            rendered.trim().to_string()
        };
        self.output = self.resolve_output(options);
        self.refresh_flags();
    }

    fn resolve_output(&self, options: &RenameOptions) -> PathBuf {
        let rendered = Path::new(&self.rendered);
        let input_dir = self.input.parent().unwrap_or(&self.working_dir);

        let dir = if options.no_move {
            input_dir.to_path_buf()
        } else {
            match rendered.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => {
                    normalize(&absolute(&self.working_dir, parent))
                },
                _ => self.working_dir.clone(),
            }
        };

        let mut name = rendered
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if rendered.extension().is_none() && !options.no_ext {
            if let Some(ext) = self.input.extension() {
                name.push('.');
                name.push_str(&ext.to_string_lossy());
            }
        }
        dir.join(name)
    }

    /// Existence checks only apply when the output differs from the input by
    /// more than letter case.
    fn refresh_flags(&mut self) {
        if differs_ignoring_case(&self.input, &self.output) {
            self.already_exists = fs::symlink_metadata(&self.output).is_ok();
            self.directory_exists = self.output.parent().map_or(true, Path::is_dir);
        } else {
            self.already_exists = false;
            self.directory_exists = true;
        }
    }
}

/// `dir/stem<append>.ext`
pub fn append_to_file_name(name: &str, append: &str) -> String {
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let file_name = format!("{}{}{}", stem, append, ext);
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            parent.join(file_name).to_string_lossy().into_owned()
        },
        _ => file_name,
    }
}

/// Case-insensitive key used for collision grouping
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}

fn differs_ignoring_case(a: &Path, b: &Path) -> bool {
    path_key(a) != path_key(b)
}

pub(crate) fn relative_display(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

fn absolute(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Lexically resolve `.` and `..` components
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            },
            other => out.push(other),
        }
    }
    out
}

/// Check if the filesystem holding `path` is case-insensitive
fn is_case_insensitive_fs(path: &Path) -> bool {
    let test_lower = path.join(".rname_case_test");
    let test_upper = path.join(".RNAME_CASE_TEST");

    if File::create(&test_lower).is_ok() {
        let case_insensitive = test_upper.exists();
        let _ = fs::remove_file(&test_lower);
        case_insensitive
    } else {
        false
    }
}

/// Rename a file or directory. Case-only renames on case-insensitive
/// filesystems go through a temporary name.
pub(crate) fn perform_rename(from: &Path, to: &Path) -> Result<()> {
    debug!("Renaming {} -> {}", from.display(), to.display());
    let fs_error = |source| RenameError::Filesystem {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    let case_only_rename = !differs_ignoring_case(from, to) && from != to;

    if case_only_rename && is_case_insensitive_fs(from.parent().unwrap_or_else(|| Path::new(".")))
    {
        let temp_name = from.with_extension(format!("{}.rname.tmp", std::process::id()));
        debug!("Case-only rename detected, using temp: {}", temp_name.display());
        fs::rename(from, &temp_name).map_err(fs_error)?;
        fs::rename(&temp_name, to).map_err(fs_error)?;
    } else {
        fs::rename(from, to).map_err(fs_error)?;
    }
    Ok(())
}
