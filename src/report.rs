//! Plain-text run summary (`test-summary.txt`)

use crate::error::Result;
use crate::store::record::iso_millis;
use crate::store::{ResultStore, SuiteSummary};
use chrono::Utc;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

pub const RUN_SUMMARY_FILE: &str = "test-summary.txt";

/// Render the run summary for the given suites.
pub fn render_run_summary(
    environment: &str,
    results_dir: &str,
    summaries: &[SuiteSummary],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Test Execution Summary");
    let _ = writeln!(out, "=====================");
    let _ = writeln!(out, "Generated: {}", iso_millis::format(&Utc::now()));
    let _ = writeln!(out, "Environment: {}", environment);
    let _ = writeln!(out);
    let _ = writeln!(out, "Results stored in: {}", results_dir);
    let _ = writeln!(out, "Individual test results in: {}/suites/", results_dir);
    let _ = writeln!(out);

    if summaries.is_empty() {
        let _ = writeln!(out, "No suites recorded.");
    } else {
        let _ = writeln!(out, "Suites (last {} results each):", crate::store::SUMMARY_WINDOW);
        for summary in summaries {
            let _ = writeln!(
                out,
                "  {}: {} total, {} passed, {} failed, {} skipped, {} blocked",
                summary.suite_name,
                summary.total_tests,
                summary.passed_tests,
                summary.failed_tests,
                summary.skipped_tests,
                summary.blocked_tests
            );
        }
    }
    let _ = writeln!(out, "=================================================");
    out
}

/// Write `test-summary.txt` at the base of the store and return its path.
///
/// Suites whose summary cannot be read are left out.
pub fn write_run_summary<S: ResultStore + ?Sized>(store: &S, environment: &str) -> Result<PathBuf> {
    let mut summaries = Vec::new();
    for suite in store.list_suites()? {
        match store.read_summary(&suite) {
            Ok(summary) => summaries.push(summary),
            Err(e) => tracing::warn!(suite = %suite, error = %e, "skipping unreadable suite summary"),
        }
    }

    let base = store.base_path();
    let text = render_run_summary(environment, &base.display().to_string(), &summaries);
    let path = base.join(RUN_SUMMARY_FILE);
    fs::write(&path, text)?;
    tracing::info!(path = %path.display(), "summary report saved");
    Ok(path)
}
