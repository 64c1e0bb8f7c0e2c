//! Confirmation gate for destructive operations.
//!
//! Nothing is mutated until the user answers affirmatively. Invalid input
//! re-prompts a bounded number of times and then declines; declining is a
//! normal termination, not an error.

use std::io::{self, BufRead, Write};

use yansi::Paint;

/// Maximum number of prompts before an unanswered question declines.
pub const MAX_ATTEMPTS: usize = 3;

/// Ask for confirmation on stdin/stderr.
///
/// Returns `true` only on an explicit affirmative answer. `assume_yes`
/// (the `--yes` flag) bypasses the prompt for scripted use.
#[must_use]
pub fn confirm(question: &str, assume_yes: bool) -> bool {
    if assume_yes {
        log::debug!("Confirmation bypassed by --yes: {question}");
        return true;
    }
    let stdin = io::stdin();
    let mut input = stdin.lock();
    confirm_from(question, &mut input, &mut io::stderr()).unwrap_or(false)
}

/// Ask for confirmation over explicit streams (testable core).
///
/// Accepts `y`/`yes`; `n`/`no` and an empty answer decline. Anything else
/// re-prompts, at most [`MAX_ATTEMPTS`] times, then declines.
///
/// # Errors
///
/// Propagates I/O errors on the streams.
pub fn confirm_from<R: BufRead, W: Write>(
    question: &str,
    reader: &mut R,
    writer: &mut W,
) -> io::Result<bool> {
    for _ in 0..MAX_ATTEMPTS {
        write!(writer, "{} [y/N]: ", question.bold())?;
        writer.flush()?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            // EOF declines.
            return Ok(false);
        }
        match line.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" | "" => return Ok(false),
            other => {
                writeln!(writer, "Unrecognized answer: {other:?}")?;
            }
        }
    }
    writeln!(writer, "No valid answer after {MAX_ATTEMPTS} attempts; aborting.")?;
    Ok(false)
}
