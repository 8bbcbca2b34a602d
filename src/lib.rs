//! testresults - A hierarchical store of test execution results
//!
//! # Overview
//!
//! testresults durably records the outcome of individual test executions,
//! groups them into suites by naming convention, and keeps a rolling summary
//! of the most recent outcomes of every suite. It is meant to be called once
//! per finished test by a test runner, possibly from many workers at once.
//!
//! # Architecture
//!
//! - [`store`]: the [`store::ResultStore`] trait, record types and the
//!   directory-based implementation with per-suite locking
//! - [`naming`]: suite classification and test-name sanitization
//! - [`emergency`]: best-effort recording that never fails the caller
//! - [`report`]: plain-text run summary
//! - [`config`]: .testres.conf configuration file parsing
//! - [`commands`]: the `testres` subcommands
//! - [`ui`]: user interface abstraction for output
//! - [`error`]: error types and Result alias
//!
//! # Store Format
//!
//! ```text
//! <base>/
//!   suites/<Suite>/suite-summary.json
//!   suites/<Suite>/<sanitized_test_name>/<timestamp>/test-result.json
//!   suites/<Suite>/<sanitized_test_name>/<timestamp>/screenshots/test-screenshot.png
//!   suites/<Suite>/<sanitized_test_name>/<timestamp>/data/test-data.json
//!   suites/<Suite>/<sanitized_test_name>/<timestamp>/logs/
//!   error-log.txt
//!   test-summary.txt
//! ```
//!
//! # Example
//!
//! ```no_run
//! use testresults::emergency::record_or_log;
//! use testresults::store::file::FileResultStore;
//! use testresults::store::{ExecutionOptions, ExecutionStatus};
//!
//! # fn main() -> testresults::error::Result<()> {
//! let store = FileResultStore::new("test-results")?;
//!
//! let status = ExecutionStatus::from_runner(Some("failed"));
//! let options = ExecutionOptions::new()
//!     .with_duration_ms(5300)
//!     .with_error("element not found: #welcome", None)
//!     .with_url("https://example.test/dashboard");
//!
//! // Never fails: problems end up in test-results/error-log.txt
//! if let Some(dir) = record_or_log(&store, "Dashboard shows welcome", status, options) {
//!     println!("saved to {}", dir.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod config;
pub mod emergency;
pub mod error;
pub mod naming;
pub mod report;
pub mod store;
pub mod ui;

pub use error::{Error, Result};
