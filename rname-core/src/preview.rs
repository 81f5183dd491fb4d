use crate::operation::{relative_display, Operation};
use nu_ansi_term::{Color, Style};
use serde::Serialize;
use std::fmt::Write;
use std::path::{Path, PathBuf};

const ORANGE: Color = Color::Rgb(0xFF, 0xA5, 0x00);

/// A planned operation as shown by `--sim`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewLine {
    pub input: PathBuf,
    pub output: PathBuf,
    pub text: String,
    pub conflict: bool,
    pub already_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_directory: Option<PathBuf>,
}

impl PreviewLine {
    pub fn from_operation(operation: &Operation, base: &Path) -> Self {
        let missing_directory = if operation.directory_exists() {
            None
        } else {
            operation.output().parent().map(Path::to_path_buf)
        };
        Self {
            input: operation.input().to_path_buf(),
            output: operation.output().to_path_buf(),
            text: operation.operation_text(base),
            conflict: operation.conflict(),
            already_exists: operation.already_exists(),
            missing_directory,
        }
    }

    pub fn has_warning(&self) -> bool {
        self.conflict || self.already_exists || self.missing_directory.is_some()
    }
}

/// Render preview lines, one operation per line with indented warnings.
///
/// Identical input always yields identical text.
pub fn render_preview(lines: &[PreviewLine], base: &Path, use_color: bool) -> String {
    let paint = |style: Style, text: &str| {
        if use_color {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    };

    let mut output = String::new();
    for line in lines {
        let style = if line.already_exists {
            Color::Red.normal()
        } else if line.conflict || line.missing_directory.is_some() {
            ORANGE.normal()
        } else {
            Style::new()
        };
        let _ = writeln!(output, "{}", paint(style, &line.text));

        if line.already_exists {
            let warning = format!(
                "  WARNING: {} already exists!",
                relative_display(&line.output, base)
            );
            let _ = writeln!(output, "{}", paint(Color::Red.normal(), &warning));
        }
        if line.conflict {
            let _ = writeln!(
                output,
                "{}",
                paint(
                    ORANGE.normal(),
                    "  WARNING: This operation conflicts with other operations in this batch!"
                )
            );
        }
        if let Some(dir) = &line.missing_directory {
            let warning = format!(
                "  WARNING: The directory {} does not exist!",
                relative_display(dir, base)
            );
            let _ = writeln!(output, "{}", paint(ORANGE.normal(), &warning));
        }
    }
    output
}
