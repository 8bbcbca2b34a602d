//! Command system for testresults
//!
//! Each CLI subcommand is a type implementing the Command trait.

use crate::error::Result;
use crate::ui::UI;

pub mod record;
pub mod report;
pub mod suite;
pub mod suites;
mod utils;

pub use record::{RecordArgs, RecordCommand};
pub use report::ReportCommand;
pub use suite::SuiteCommand;
pub use suites::SuitesCommand;

/// Where a command finds its configuration and result store.
#[derive(Debug, Clone, Default)]
pub struct StoreLocation {
    /// Working directory holding `.testres.conf` (defaults to `.`)
    pub directory: Option<String>,
    /// Overrides the configured results directory
    pub results_dir: Option<String>,
}

impl StoreLocation {
    pub fn new(directory: Option<String>, results_dir: Option<String>) -> Self {
        StoreLocation {
            directory,
            results_dir,
        }
    }
}

/// Trait that all commands must implement
pub trait Command {
    /// Execute the command, returning the process exit code
    fn execute(&self, ui: &mut dyn UI) -> Result<i32>;

    /// Get the command name
    fn name(&self) -> &str;

    /// Get command help text
    fn help(&self) -> &str;
}
