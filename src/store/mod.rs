//! Result store abstraction
//!
//! This module provides the trait for recording test executions and
//! maintaining per-suite rolling summaries, and a directory-based
//! implementation of it.

use crate::error::Result;
use std::path::{Path, PathBuf};

pub mod file;
pub mod lock;
pub mod record;

pub use record::{
    ExecutionOptions, ExecutionRecord, ExecutionStatus, Screenshot, SuiteSummary, SummaryEntry,
    SUMMARY_WINDOW,
};

/// Abstract store for test execution results
///
/// # Examples
///
/// ```
/// use testresults::store::{ExecutionOptions, ExecutionStatus, ResultStore};
/// use testresults::store::file::FileResultStore;
/// use tempfile::TempDir;
///
/// # fn main() -> testresults::error::Result<()> {
/// let temp = TempDir::new().unwrap();
/// let store = FileResultStore::new(temp.path())?;
///
/// // Record a passing login test
/// let options = ExecutionOptions::new()
///     .with_duration_ms(1250)
///     .with_tag("@smoke");
/// let dir = store.record_execution("Login with valid user", ExecutionStatus::Passed, options)?;
/// assert!(dir.join("test-result.json").exists());
///
/// // The suite summary now includes it
/// let summary = store.read_summary("Authentication")?;
/// assert_eq!(summary.total_tests, 1);
/// assert_eq!(summary.passed_tests, 1);
/// # Ok(())
/// # }
/// ```
pub trait ResultStore {
    /// Root directory of the store
    fn base_path(&self) -> &Path;

    /// Persist one test execution and fold it into its suite summary.
    ///
    /// Returns the directory the execution was written to. Any I/O failure
    /// is returned to the caller; see [`crate::emergency::record_or_log`] for
    /// the best-effort wrapper used by test runners.
    fn record_execution(
        &self,
        test_name: &str,
        status: ExecutionStatus,
        options: ExecutionOptions,
    ) -> Result<PathBuf>;

    /// Append an entry to a suite's rolling window and re-derive its counters.
    ///
    /// The whole read-modify-write cycle runs under a per-suite lock. An
    /// unreadable or malformed existing summary is replaced by a fresh one.
    fn update_summary(&self, suite_name: &str, entry: SummaryEntry) -> Result<SuiteSummary>;

    /// Read the current summary of a suite
    fn read_summary(&self, suite_name: &str) -> Result<SuiteSummary>;

    /// List the suites that have recorded executions, sorted by name
    fn list_suites(&self) -> Result<Vec<String>>;

    /// Read the execution record stored in an execution directory
    fn read_execution(&self, execution_dir: &Path) -> Result<ExecutionRecord>;
}
