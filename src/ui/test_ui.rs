//! In-memory [`UI`] for command tests

use crate::error::Result;
use crate::ui::UI;

/// Records every line a command prints, split by channel.
#[derive(Debug, Default)]
pub struct TestUI {
    pub output: Vec<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl TestUI {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stdout as it would appear on a terminal.
    pub fn output_text(&self) -> String {
        self.output.join("\n")
    }
}

impl UI for TestUI {
    fn output(&mut self, message: &str) -> Result<()> {
        self.output.push(message.to_string());
        Ok(())
    }

    fn error(&mut self, message: &str) -> Result<()> {
        self.errors.push(message.to_string());
        Ok(())
    }

    fn warning(&mut self, message: &str) -> Result<()> {
        self.warnings.push(message.to_string());
        Ok(())
    }
}
