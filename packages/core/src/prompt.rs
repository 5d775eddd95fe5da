//! Interactive input capability.

use std::collections::VecDeque;
use std::io;

use dialoguer::{Confirm, Input};
use snafu::ResultExt;

use crate::error::{PromptSnafu, Result};

/// Asks the user a question and returns the trimmed answer.
pub trait Prompt {
    fn ask(&mut self, question: &str) -> Result<String>;

    /// Asks until the answer is `y` or `n`. Returns true for `y`.
    fn confirm(&mut self, question: &str) -> Result<bool> {
        let question = format!("{} (y/n) ", question);
        loop {
            match self.ask(&question)?.to_lowercase().as_str() {
                "y" => return Ok(true),
                "n" => return Ok(false),
                _ => continue,
            }
        }
    }
}

/// Terminal prompt backed by dialoguer.
#[derive(Debug, Default)]
pub struct StdinPrompt;

/// dialoguer's theme adds its own `: ` or `[y/n]` suffix.
fn bare(question: &str) -> &str {
    question.trim_end().trim_end_matches(':')
}

impl Prompt for StdinPrompt {
    fn ask(&mut self, question: &str) -> Result<String> {
        let answer: String = Input::new()
            .with_prompt(bare(question))
            .allow_empty(true)
            .interact_text()
            .context(PromptSnafu)?;
        Ok(answer.trim().to_string())
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        Confirm::new()
            .with_prompt(bare(question))
            .interact()
            .context(PromptSnafu)
    }
}

/// Replays a fixed list of answers; used by tests and non-interactive callers.
///
/// Running out of answers is reported as an end-of-input error.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    pub asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, question: &str) -> Result<String> {
        self.asked.push(question.to_string());
        self.answers.pop_front().ok_or_else(|| crate::Error::Prompt {
            source: dialoguer::Error::IO(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no scripted answer left",
            )),
        })
    }
}
