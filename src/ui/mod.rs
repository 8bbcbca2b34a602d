//! Terminal output for `testres` commands
//!
//! Suite listings and summaries go to stdout; recording failures and skipped
//! suites go to stderr with a coloured label. Commands only see the [`UI`]
//! trait, which lets their tests capture every line.

use crate::error::Result;
use console::style;
use std::io::{self, Write};

#[cfg(test)]
pub mod test_ui;

/// Where commands send the lines they print
pub trait UI {
    /// A line of command output, such as a suite summary row
    fn output(&mut self, message: &str) -> Result<()>;

    /// A failure that made the command exit non-zero
    fn error(&mut self, message: &str) -> Result<()>;

    /// A problem the command worked around, e.g. an unreadable suite summary
    fn warning(&mut self, message: &str) -> Result<()>;
}

/// Writes to the process's stdout and stderr.
pub struct CliUI {
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
}

impl CliUI {
    pub fn new() -> Self {
        CliUI {
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
        }
    }
}

impl Default for CliUI {
    fn default() -> Self {
        Self::new()
    }
}

impl UI for CliUI {
    fn output(&mut self, message: &str) -> Result<()> {
        writeln!(self.stdout, "{}", message)?;
        Ok(())
    }

    fn error(&mut self, message: &str) -> Result<()> {
        let label = style("Error:").red().bold().for_stderr();
        writeln!(self.stderr, "{} {}", label, message)?;
        Ok(())
    }

    fn warning(&mut self, message: &str) -> Result<()> {
        let label = style("Warning:").yellow().for_stderr();
        writeln!(self.stderr, "{} {}", label, message)?;
        Ok(())
    }
}
