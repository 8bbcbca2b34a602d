//! Best-effort recording for test runners
//!
//! A failure to persist a result must never abort the surrounding test run.
//! [`record_or_log`] turns such failures into a single line in
//! `<base>/error-log.txt` and a diagnostic log event.

use crate::store::record::iso_millis;
use crate::store::{ExecutionOptions, ExecutionStatus, ResultStore};
use chrono::Utc;
use std::fmt::Display;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const ERROR_LOG_FILE: &str = "error-log.txt";

/// Record an execution, falling back to the emergency error log on failure.
///
/// Returns the execution directory, or `None` if recording failed.
pub fn record_or_log<S: ResultStore + ?Sized>(
    store: &S,
    test_name: &str,
    status: ExecutionStatus,
    options: ExecutionOptions,
) -> Option<PathBuf> {
    match store.record_execution(test_name, status, options) {
        Ok(dir) => Some(dir),
        Err(e) => {
            tracing::error!(test = test_name, error = %e, "failed to save test result");
            if let Err(log_err) = append_error_log(store.base_path(), test_name, &e) {
                tracing::error!(error = %log_err, "emergency logging also failed");
            }
            None
        }
    }
}

/// Append `<timestamp> | <test name> | <error>` to the error log under `base`.
///
/// Line breaks in the name or the error are flattened to spaces, so every
/// failure occupies exactly one line.
pub fn append_error_log(base: &Path, test_name: &str, error: &dyn Display) -> io::Result<()> {
    fs::create_dir_all(base)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(base.join(ERROR_LOG_FILE))?;
    writeln!(
        file,
        "{} | {} | {}",
        iso_millis::format(&Utc::now()),
        single_line(test_name),
        single_line(&error.to_string())
    )
}

fn single_line(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\r', '\n'], " ")
}
