//! Injectable confirmation before long runs

use std::io::{self, BufRead, Write};

/// Asks the operator whether to continue
pub trait Confirm {
    /// Returns `Ok(true)` when the run may proceed
    fn confirm(&self, question: &str) -> io::Result<bool>;
}

/// Always confirms; used for `--yes` and non-interactive contexts
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&self, question: &str) -> io::Result<bool> {
        tracing::debug!(question, "Auto-confirmed");
        Ok(true)
    }
}

/// Reads an `s/n` answer from standard input
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, question: &str) -> io::Result<bool> {
        print!("{question} (s/n): ");
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(is_affirmative(&answer))
    }
}

/// Only an explicit "s" (sí) counts as yes
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("s")
}
