//! Show one suite's rolling summary

use crate::commands::utils::{open_store, styled_status};
use crate::commands::{Command, StoreLocation};
use crate::error::Result;
use crate::store::record::iso_millis;
use crate::store::ResultStore;
use crate::ui::UI;

pub struct SuiteCommand {
    location: StoreLocation,
    suite_name: String,
}

impl SuiteCommand {
    pub fn new(location: StoreLocation, suite_name: impl Into<String>) -> Self {
        SuiteCommand {
            location,
            suite_name: suite_name.into(),
        }
    }
}

impl Command for SuiteCommand {
    fn execute(&self, ui: &mut dyn UI) -> Result<i32> {
        let store = open_store(&self.location)?;
        let summary = store.read_summary(&self.suite_name)?;

        ui.output(&format!("Suite: {}", summary.suite_name))?;
        ui.output(&format!(
            "Last updated: {}",
            iso_millis::format(&summary.last_updated)
        ))?;
        ui.output(&format!(
            "Total: {}  Passed: {}  Failed: {}  Skipped: {}  Blocked: {}",
            summary.total_tests,
            summary.passed_tests,
            summary.failed_tests,
            summary.skipped_tests,
            summary.blocked_tests
        ))?;

        if !summary.results.is_empty() {
            ui.output("")?;
            ui.output("Recent results (oldest first):")?;
            for entry in &summary.results {
                ui.output(&format!(
                    "  {} {:>8}ms {} {}",
                    iso_millis::format(&entry.timestamp),
                    entry.duration,
                    styled_status(entry.status),
                    entry.test_name
                ))?;
            }
        }

        // Non-zero when the window holds failures
        if summary.failed_tests > 0 {
            Ok(1)
        } else {
            Ok(0)
        }
    }

    fn name(&self) -> &str {
        "suite"
    }

    fn help(&self) -> &str {
        "Show a suite's counts and its most recent results"
    }
}
