//! Record one test execution

use crate::commands::utils::open_store;
use crate::commands::{Command, StoreLocation};
use crate::emergency::record_or_log;
use crate::error::{Error, Result};
use crate::store::{ExecutionOptions, ExecutionStatus, ResultStore, Screenshot};
use crate::ui::UI;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;

/// Raw arguments for a single execution, as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct RecordArgs {
    pub test_name: String,
    /// Runner status word; unknown or absent maps to SKIPPED
    pub status: Option<String>,
    pub duration_ms: Option<u64>,
    /// RFC 3339 start instant
    pub started_at: Option<String>,
    pub error: Option<String>,
    pub stack_trace: Option<String>,
    pub browser: Option<String>,
    pub environment: Option<String>,
    pub tags: Vec<String>,
    /// File holding raw screenshot bytes
    pub screenshot: Option<PathBuf>,
    /// File holding a base64-encoded screenshot
    pub screenshot_base64: Option<PathBuf>,
    /// Inline JSON document
    pub test_data: Option<String>,
    pub url: Option<String>,
}

pub struct RecordCommand {
    location: StoreLocation,
    args: RecordArgs,
}

impl RecordCommand {
    pub fn new(location: StoreLocation, args: RecordArgs) -> Self {
        RecordCommand { location, args }
    }

    fn status(&self) -> ExecutionStatus {
        ExecutionStatus::from_runner(self.args.status.as_deref())
    }

    fn options(&self) -> Result<ExecutionOptions> {
        let args = &self.args;

        let started_at = args
            .started_at
            .as_deref()
            .map(|s| {
                DateTime::parse_from_rfc3339(s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| Error::Other(format!("Invalid --started-at {:?}: {}", s, e)))
            })
            .transpose()?;

        let screenshot = match (&args.screenshot, &args.screenshot_base64) {
            (Some(path), _) => Some(Screenshot::Bytes(fs::read(path)?)),
            (None, Some(path)) => Some(Screenshot::Base64(fs::read_to_string(path)?)),
            (None, None) => None,
        };

        let test_data = args
            .test_data
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(ExecutionOptions {
            error: args.error.clone(),
            stack_trace: args.stack_trace.clone(),
            duration_ms: args.duration_ms,
            started_at,
            browser: args.browser.clone(),
            environment: args.environment.clone(),
            tags: args.tags.clone(),
            screenshot,
            test_data,
            url: args.url.clone(),
        })
    }
}

impl Command for RecordCommand {
    fn execute(&self, ui: &mut dyn UI) -> Result<i32> {
        let options = self.options()?;
        let store = open_store(&self.location)?;

        match record_or_log(&store, &self.args.test_name, self.status(), options) {
            Some(dir) => {
                ui.output(&dir.display().to_string())?;
                Ok(0)
            }
            None => {
                ui.error(&format!(
                    "Failed to save result for {:?}; see {}",
                    self.args.test_name,
                    store
                        .base_path()
                        .join(crate::emergency::ERROR_LOG_FILE)
                        .display()
                ))?;
                Ok(1)
            }
        }
    }

    fn name(&self) -> &str {
        "record"
    }

    fn help(&self) -> &str {
        "Record the result of one test execution"
    }
}
