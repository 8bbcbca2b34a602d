//! List all suites with their counts

use crate::commands::utils::open_store;
use crate::commands::{Command, StoreLocation};
use crate::error::Result;
use crate::store::ResultStore;
use crate::ui::UI;

pub struct SuitesCommand {
    location: StoreLocation,
}

impl SuitesCommand {
    pub fn new(location: StoreLocation) -> Self {
        SuitesCommand { location }
    }
}

impl Command for SuitesCommand {
    fn execute(&self, ui: &mut dyn UI) -> Result<i32> {
        let store = open_store(&self.location)?;
        let suites = store.list_suites()?;

        if suites.is_empty() {
            ui.output("No suites recorded")?;
            return Ok(0);
        }

        ui.output(&format!("{} suite(s):", suites.len()))?;
        for suite in &suites {
            match store.read_summary(suite) {
                Ok(summary) => ui.output(&format!(
                    "  {}: {} total, {} passed, {} failed, {} skipped, {} blocked",
                    summary.suite_name,
                    summary.total_tests,
                    summary.passed_tests,
                    summary.failed_tests,
                    summary.skipped_tests,
                    summary.blocked_tests
                ))?,
                Err(e) => ui.warning(&format!("{}: {}", suite, e))?,
            }
        }

        Ok(0)
    }

    fn name(&self) -> &str {
        "suites"
    }

    fn help(&self) -> &str {
        "List every suite with its rolling counts"
    }
}
