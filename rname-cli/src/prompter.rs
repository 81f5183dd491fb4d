use inquire::{Confirm, InquireError, Select, Text};
use rname_core::{Prompter, RenameError};
use std::io::{self, IsTerminal};

type PromptResult<T> = Result<T, RenameError>;

/// Asks on the terminal. Declines everything when stdin is not a terminal,
/// so undecided operations are skipped instead of blocking.
#[derive(Debug)]
pub struct TerminalPrompter {
    interactive: bool,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            interactive: io::stdin().is_terminal(),
        }
    }
}

fn prompt_error(err: InquireError) -> RenameError {
    RenameError::Prompt(err.to_string())
}

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, question: &str) -> PromptResult<bool> {
        if !self.interactive {
            return Ok(false);
        }
        Confirm::new(question)
            .with_default(false)
            .prompt_skippable()
            .map(|answer| answer.unwrap_or(false))
            .map_err(prompt_error)
    }

    fn choose(&mut self, question: &str, options: &[&str]) -> PromptResult<Option<usize>> {
        if !self.interactive {
            return Ok(None);
        }
        Select::new(question, options.to_vec())
            .raw_prompt_skippable()
            .map(|choice| choice.map(|option| option.index))
            .map_err(prompt_error)
    }

    fn input_text(&mut self, question: &str, default: &str) -> PromptResult<String> {
        if !self.interactive {
            return Ok(default.to_string());
        }
        Text::new(question)
            .with_initial_value(default)
            .prompt()
            .map_err(prompt_error)
    }
}
