use crate::batch::BatchReport;
use crate::favorites::{format_favorites, Favorite};
use crate::history::format_history;
use crate::operation::{relative_display, Outcome, SkipReason};
use crate::preview::{render_preview, PreviewLine};
use crate::store::Page;
use crate::undo::UndoReport;
use serde::Serialize;
use serde_json::json;
use std::fmt::Write;
use std::path::PathBuf;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Summary,
    Json,
}

/// Trait for formatting output in different formats
pub trait OutputFormatter {
    fn format(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => self.format_json(),
            OutputFormat::Summary => self.format_summary(),
        }
    }

    fn format_json(&self) -> String;
    fn format_summary(&self) -> String;
}

/// Result of a rename batch
#[derive(Debug, Serialize)]
pub struct RenameResult {
    pub batch_id: Option<String>,
    pub working_dir: PathBuf,
    pub simulated: bool,
    pub outcomes: Vec<Outcome>,
    /// Annotated plan, filled for simulated batches
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub preview: Vec<PreviewLine>,
    #[serde(skip)]
    pub use_color: bool,
}

impl RenameResult {
    pub fn new(report: BatchReport, working_dir: PathBuf, simulated: bool) -> Self {
        Self {
            batch_id: report.batch_id,
            working_dir,
            simulated,
            outcomes: report.outcomes,
            preview: Vec::new(),
            use_color: false,
        }
    }

    #[must_use]
    pub fn with_preview(mut self, preview: Vec<PreviewLine>, use_color: bool) -> Self {
        self.preview = preview;
        self.use_color = use_color;
        self
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(*o)).count()
    }

    fn rel(&self, path: &std::path::Path) -> String {
        relative_display(path, &self.working_dir)
    }
}

impl OutputFormatter for RenameResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": true,
            "operation": "rename",
            "batch_id": self.batch_id,
            "simulated": self.simulated,
            "summary": {
                "renamed": self.count(Outcome::is_renamed),
                "simulated": self.count(|o| matches!(o, Outcome::Simulated { .. })),
                "skipped": self.count(|o| matches!(o, Outcome::Skipped { .. })),
                "failed": self.count(|o| matches!(o, Outcome::Failed { .. })),
            },
            "outcomes": self.outcomes,
            "preview": self.preview,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = render_preview(&self.preview, &self.working_dir, self.use_color);

        for outcome in &self.outcomes {
            match outcome {
                Outcome::Renamed {
                    input,
                    output: to,
                    overwritten,
                } => {
                    let _ = write!(output, "{} → {}", self.rel(input), self.rel(to));
                    if *overwritten {
                        output.push_str(" (overwritten)");
                    }
                    output.push('\n');
                },
                Outcome::Skipped { input, reason } => {
                    let why = match reason {
                        SkipReason::Declined => "declined",
                        SkipReason::SourceMissing => "file no longer exists",
                        SkipReason::Directory => "directory",
                    };
                    let _ = writeln!(output, "Skipped {} ({})", self.rel(input), why);
                },
                Outcome::Failed { input, error } => {
                    let _ = writeln!(output, "Failed {}: {}", self.rel(input), error);
                },
                Outcome::Simulated { .. } => {},
            }
        }

        let skipped = self.count(|o| matches!(o, Outcome::Skipped { .. }));
        let failed = self.count(|o| matches!(o, Outcome::Failed { .. }));
        if self.simulated {
            let _ = write!(
                output,
                "Simulated {} operations",
                self.count(|o| matches!(o, Outcome::Simulated { .. }))
            );
        } else {
            let _ = write!(output, "Renamed {} files", self.count(Outcome::is_renamed));
        }
        if skipped > 0 || failed > 0 {
            let _ = write!(output, " ({} skipped, {} failed)", skipped, failed);
        }
        output.push('\n');

        if let Some(id) = &self.batch_id {
            if self.count(Outcome::is_renamed) > 0 {
                let _ = writeln!(output, "Undo with: rname undo --batch {}", id);
            }
        }

        output
    }
}

/// Result of an undo
#[derive(Debug, Serialize)]
pub struct UndoResult {
    #[serde(flatten)]
    pub report: UndoReport,
}

impl OutputFormatter for UndoResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": true,
            "operation": "undo",
            "batch_id": self.report.batch_id,
            "revert_batch_id": self.report.revert_batch_id,
            "summary": {
                "restored": self.report.restored.len(),
                "skipped": self.report.skipped.len(),
            },
            "restored": self.report.restored,
            "skipped": self.report.skipped,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = String::new();
        for entry in &self.report.restored {
            let _ = writeln!(
                output,
                "{} → {}",
                entry.output.display(),
                entry.input.display()
            );
        }
        for skipped in &self.report.skipped {
            let _ = writeln!(output, "Skipped: {}", skipped.reason);
        }

        let Some(batch_id) = &self.report.batch_id else {
            output.push_str("Nothing to undo\n");
            return output;
        };
        if self.report.restored.is_empty() {
            let _ = writeln!(output, "No files were restored from batch {}", batch_id);
        } else {
            let _ = writeln!(
                output,
                "✓ Restored {} files from batch {}",
                self.report.restored.len(),
                batch_id
            );
        }
        output
    }
}

/// Result of a history listing
#[derive(Debug, Serialize)]
pub struct HistoryResult {
    pub page: Page,
}

impl OutputFormatter for HistoryResult {
    fn format_json(&self) -> String {
        format_history(&self.page, true).unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        format_history(&self.page, false).unwrap_or_default()
    }
}

/// Result of a favorites listing
#[derive(Debug, Serialize)]
pub struct FavoritesResult {
    pub favorites: Vec<Favorite>,
}

impl OutputFormatter for FavoritesResult {
    fn format_json(&self) -> String {
        format_favorites(&self.favorites, true).unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        format_favorites(&self.favorites, false).unwrap_or_default()
    }
}

/// Result of a version command
#[derive(Debug, Serialize)]
pub struct VersionResult {
    pub name: String,
    pub version: String,
}

impl OutputFormatter for VersionResult {
    fn format_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        format!("{} {}", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LogEntry;
    use crate::undo::SkippedEntry;

    fn rename_result(simulated: bool, outcomes: Vec<Outcome>) -> RenameResult {
        RenameResult {
            batch_id: (!simulated).then(|| "abc123".to_string()),
            working_dir: PathBuf::from("/w"),
            simulated,
            outcomes,
            preview: Vec::new(),
            use_color: false,
        }
    }

    #[test]
    fn test_rename_summary() {
        let result = rename_result(
            false,
            vec![
                Outcome::Renamed {
                    input: PathBuf::from("/w/a.txt"),
                    output: PathBuf::from("/w/b.txt"),
                    overwritten: false,
                },
                Outcome::Skipped {
                    input: PathBuf::from("/w/c.txt"),
                    reason: SkipReason::Declined,
                },
            ],
        );
        let summary = result.format(OutputFormat::Summary);
        assert!(summary.contains("a.txt → b.txt\n"));
        assert!(summary.contains("Skipped c.txt (declined)"));
        assert!(summary.contains("Renamed 1 files (1 skipped, 0 failed)"));
        assert!(summary.contains("rname undo --batch abc123"));
    }

    #[test]
    fn test_rename_json() {
        let result = rename_result(
            true,
            vec![Outcome::Simulated {
                input: PathBuf::from("/w/a.txt"),
                output: PathBuf::from("/w/b.txt"),
            }],
        );
        let value: serde_json::Value =
            serde_json::from_str(&result.format(OutputFormat::Json)).unwrap();
        assert_eq!(value["summary"]["simulated"], 1);
        assert_eq!(value["batch_id"], serde_json::Value::Null);
        assert_eq!(value["outcomes"][0]["status"], "simulated");
    }

    #[test]
    fn test_undo_summary() {
        let result = UndoResult {
            report: UndoReport {
                batch_id: Some("abc".to_string()),
                revert_batch_id: Some("def".to_string()),
                restored: vec![LogEntry {
                    id: 1,
                    input: PathBuf::from("/w/a"),
                    output: PathBuf::from("/w/b"),
                    undone: true,
                    created_at: String::new(),
                }],
                skipped: vec![SkippedEntry {
                    entry_id: 2,
                    input: PathBuf::from("/w/c"),
                    output: PathBuf::from("/w/d"),
                    reason: "cannot undo /w/d: file no longer exists".to_string(),
                }],
            },
        };
        let summary = result.format_summary();
        assert!(summary.contains("Skipped: cannot undo /w/d"));
        assert!(summary.contains("Restored 1 files from batch abc"));
    }

    #[test]
    fn test_undo_summary_with_empty_history() {
        let result = UndoResult {
            report: UndoReport {
                batch_id: None,
                revert_batch_id: None,
                restored: Vec::new(),
                skipped: Vec::new(),
            },
        };
        assert_eq!(result.format_summary(), "Nothing to undo\n");
        let value: serde_json::Value = serde_json::from_str(&result.format_json()).unwrap();
        assert_eq!(value["batch_id"], serde_json::Value::Null);
        assert_eq!(value["summary"]["restored"], 0);
    }

    #[test]
    fn test_version_formats() {
        let result = VersionResult {
            name: "rname".to_string(),
            version: "0.1.0".to_string(),
        };
        assert_eq!(result.format(OutputFormat::Summary), "rname 0.1.0");
        assert!(result.format(OutputFormat::Json).contains("\"version\":\"0.1.0\""));
    }
}
