//! Write the plain-text run summary

use crate::commands::utils::{load_config, open_store};
use crate::commands::{Command, StoreLocation};
use crate::error::Result;
use crate::report::write_run_summary;
use crate::ui::UI;

pub struct ReportCommand {
    location: StoreLocation,
    environment: Option<String>,
}

impl ReportCommand {
    pub fn new(location: StoreLocation, environment: Option<String>) -> Self {
        ReportCommand {
            location,
            environment,
        }
    }
}

impl Command for ReportCommand {
    fn execute(&self, ui: &mut dyn UI) -> Result<i32> {
        let environment = match self.environment {
            Some(ref environment) => environment.clone(),
            None => load_config(&self.location)?.environment,
        };
        let store = open_store(&self.location)?;

        let path = write_run_summary(&store, &environment)?;
        ui.output(&format!("Summary report saved: {}", path.display()))?;
        Ok(0)
    }

    fn name(&self) -> &str {
        "report"
    }

    fn help(&self) -> &str {
        "Write test-summary.txt with per-suite counts"
    }
}
