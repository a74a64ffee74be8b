//! Interactive confirmation, injected into operations that can be declined.
use std::io::{self, BufRead as _, Write as _};

use anyhow::{Context as _, Result};

/// Result of an operation that the user may decline.
///
/// A declined confirmation is not a failure: callers report it and exit
/// successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T = ()> {
    /// The operation ran to completion.
    Completed(T),
    /// The user declined a confirmation prompt.
    Cancelled,
}

impl<T> Outcome<T> {
    /// Return `true` if the operation was declined.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The value of a completed operation.
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Cancelled => None,
        }
    }
}

/// Source of yes/no answers for destructive actions.
#[cfg_attr(test, mockall::automock)]
pub trait Confirm {
    /// Ask `prompt` and return `true` if the user agreed.
    ///
    /// # Errors
    ///
    /// Returns an error if the answer cannot be read.
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Reads answers from standard input; only `y`/`yes` counts as agreement.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    #[allow(clippy::print_stdout)]
    fn confirm(&self, prompt: &str) -> Result<bool> {
        print!("{prompt} [y/N]: ");
        io::stdout().flush().context("flushing stdout")?;

        let mut input = String::new();
        io::stdin()
            .lock()
            .read_line(&mut input)
            .context("reading confirmation")?;
        Ok(is_yes(&input))
    }
}

/// Agrees to everything (`--noconfirm`, `--overwrite`).
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
