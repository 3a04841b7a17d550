use anyhow::Result;
use std::io::IsTerminal;

use crate::batch::{BatchResult, FileOutcome};
use crate::operation::MetadataOperation;

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Which output streams are attached to a terminal and get ANSI color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terminals {
    pub stdout: bool,
    pub stderr: bool,
}

impl Terminals {
    pub fn detect() -> Self {
        Self {
            stdout: std::io::stdout().is_terminal(),
            stderr: std::io::stderr().is_terminal(),
        }
    }

    /// The per-file line, colored only if the stream it is printed to
    /// (stdout for successes, stderr for failures) is a terminal.
    pub fn render(&self, action: &str, outcome: &FileOutcome) -> String {
        let line = format_line(action, outcome);
        match outcome {
            FileOutcome::Success { .. } if self.stdout => format!("{GREEN}{line}{RESET}"),
            FileOutcome::Failure { .. } if self.stderr => format!("{RED}{line}{RESET}"),
            _ => line,
        }
    }
}

/// Print the batch outcome and a summary log line.
///
/// Plain mode prints one line per target, successes on stdout and failures
/// on stderr. JSON mode prints only the JSON array on stdout, so the output
/// can be piped straight into a parser.
pub fn print_report(operation: &MetadataOperation, result: &BatchResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        let terminals = Terminals::detect();
        for outcome in &result.outcomes {
            let line = terminals.render(operation.action(), outcome);
            if outcome.is_success() {
                println!("{line}");
            } else {
                eprintln!("{line}");
            }
        }
    }

    log::info!("{}", summary(result));
    Ok(())
}

/// The per-file line, e.g. `tag-pano a.jpg: ok`.
pub fn format_line(action: &str, outcome: &FileOutcome) -> String {
    match outcome {
        FileOutcome::Success { path } => format!("{action} {}: ok", path.display()),
        FileOutcome::Failure { path, reason } => {
            format!("{action} {}: FAILED ({reason})", path.display())
        }
    }
}

pub fn summary(result: &BatchResult) -> String {
    format!(
        "Done: {} succeeded, {} failed out of {} files",
        result.succeeded(),
        result.failed(),
        result.len()
    )
}
