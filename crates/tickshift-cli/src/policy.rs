//! Terminal confirmation
//!
//! Mirrors the interactive "Continue anyway?" questions of the node's
//! maintenance scripts. Only an explicit `y` or `yes` proceeds; an empty
//! line, end of input or a read error declines.

use crate::DataLossPolicy;
use std::io::{self, BufRead, Write};
use tickshift_formats::{AutoApprove, AutoReject, Confirmation, ConfirmationPolicy};

/// Asks on a writer and reads the answer from a reader
#[derive(Debug)]
pub struct PromptPolicy<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptPolicy<R, W> {
    /// Prompt on `output`, read answers from `input`
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> io::Result<bool> {
        write!(self.output, "{question} Continue anyway? [y/N] ")?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        let answer = answer.trim().to_ascii_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}

/// Question text for a confirmation request
pub fn describe(request: &Confirmation<'_>) -> String {
    match request {
        Confirmation::DataLoss(reports) => reports
            .iter()
            .map(|report| {
                format!(
                    "Shrinking '{}' from {} to {} elements discards {} non-zero elements (indices {}..={}).",
                    report.segment,
                    report.old_capacity,
                    report.new_capacity,
                    report.lost_elements,
                    report.first_index,
                    report.last_index
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Confirmation::SizeMismatch {
            kind,
            expected,
            actual,
        } => format!(
            "The {kind} file is {actual} bytes but {expected} bytes were expected for the old tick duration."
        ),
    }
}

impl<R: BufRead, W: Write> ConfirmationPolicy for PromptPolicy<R, W> {
    fn confirm(&mut self, request: &Confirmation<'_>) -> bool {
        self.ask(&describe(request)).unwrap_or(false)
    }
}

/// Policy for the `--on-data-loss` choice
///
/// The prompt reads stdin and writes to stderr so stdout only carries
/// command output.
pub fn from_choice(choice: DataLossPolicy) -> Box<dyn ConfirmationPolicy> {
    match choice {
        DataLossPolicy::Reject => Box::new(AutoReject),
        DataLossPolicy::Accept => Box::new(AutoApprove),
        DataLossPolicy::Prompt => Box::new(PromptPolicy::new(io::stdin().lock(), io::stderr())),
    }
}
