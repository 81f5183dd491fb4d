//! Questions asked while a batch executes.
//!
//! [`crate::Operation::run`] never talks to a terminal directly; it asks a
//! [`Prompter`]. The CLI supplies an interactive one, tests and embedders use
//! [`AutoPrompter`] or [`ScriptedPrompter`].

use crate::error::{RenameError, Result};
use std::collections::VecDeque;

pub trait Prompter {
    /// Yes/no question
    fn confirm(&mut self, question: &str) -> Result<bool>;

    /// Pick one of `options`. `None` means the user cancelled.
    fn choose(&mut self, question: &str, options: &[&str]) -> Result<Option<usize>>;

    /// Free text with a pre-filled default
    fn input_text(&mut self, question: &str, default: &str) -> Result<String>;
}

/// Answers every question without asking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoPrompter {
    accept: bool,
}

impl AutoPrompter {
    /// Declines confirmations and cancels choices
    pub const fn declining() -> Self {
        Self { accept: false }
    }

    /// Accepts confirmations and picks the first option
    pub const fn accepting() -> Self {
        Self { accept: true }
    }
}

impl Prompter for AutoPrompter {
    fn confirm(&mut self, _question: &str) -> Result<bool> {
        Ok(self.accept)
    }

    fn choose(&mut self, _question: &str, _options: &[&str]) -> Result<Option<usize>> {
        Ok(self.accept.then_some(0))
    }

    fn input_text(&mut self, _question: &str, default: &str) -> Result<String> {
        Ok(default.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    Choice(Option<usize>),
    Text(String),
}

/// Replays a fixed list of answers and records every question asked.
///
/// Running out of answers is a [`RenameError::Prompt`], the same as a
/// closed terminal.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    pub asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    fn next(&mut self, question: &str) -> Result<Answer> {
        self.asked.push(question.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| RenameError::Prompt(format!("no scripted answer for: {}", question)))
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        match self.next(question)? {
            Answer::Yes => Ok(true),
            Answer::No => Ok(false),
            other => Err(RenameError::Prompt(format!(
                "expected yes/no for `{}`, got {:?}",
                question, other
            ))),
        }
    }

    fn choose(&mut self, question: &str, options: &[&str]) -> Result<Option<usize>> {
        match self.next(question)? {
            Answer::Choice(choice) if choice.map_or(true, |c| c < options.len()) => Ok(choice),
            other => Err(RenameError::Prompt(format!(
                "expected a choice for `{}`, got {:?}",
                question, other
            ))),
        }
    }

    fn input_text(&mut self, question: &str, default: &str) -> Result<String> {
        match self.next(question)? {
            Answer::Text(text) if text.is_empty() => Ok(default.to_string()),
            Answer::Text(text) => Ok(text),
            other => Err(RenameError::Prompt(format!(
                "expected text for `{}`, got {:?}",
                question, other
            ))),
        }
    }
}
