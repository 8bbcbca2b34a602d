//! Execution record and suite summary data structures
//!
//! These types define the two stable on-disk JSON schemas,
//! `test-result.json` and `suite-summary.json`. Field names are camelCase and
//! unknown fields are carried through a rewrite untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

/// Number of most recent results retained in a suite summary.
pub const SUMMARY_WINDOW: usize = 50;

/// Outcome of a single test execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutionStatus {
    Passed,
    Failed,
    Skipped,
    /// Test could not complete, e.g. it timed out or was interrupted.
    Blocked,
}

impl ExecutionStatus {
    /// Map a test runner's status vocabulary onto an execution status.
    ///
    /// Unknown or absent statuses map to [`ExecutionStatus::Skipped`].
    pub fn from_runner(status: Option<&str>) -> Self {
        match status {
            Some("passed") | Some("PASSED") => ExecutionStatus::Passed,
            Some("failed") | Some("FAILED") => ExecutionStatus::Failed,
            Some("skipped") | Some("SKIPPED") => ExecutionStatus::Skipped,
            Some("timedOut") | Some("interrupted") | Some("BLOCKED") => ExecutionStatus::Blocked,
            _ => ExecutionStatus::Skipped,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Passed => "PASSED",
            ExecutionStatus::Failed => "FAILED",
            ExecutionStatus::Skipped => "SKIPPED",
            ExecutionStatus::Blocked => "BLOCKED",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Screenshot payload supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screenshot {
    /// Raw image bytes.
    Bytes(Vec<u8>),
    /// Base64-encoded image text.
    Base64(String),
}

impl Screenshot {
    pub fn is_empty(&self) -> bool {
        match self {
            Screenshot::Bytes(bytes) => bytes.is_empty(),
            Screenshot::Base64(text) => text.trim().is_empty(),
        }
    }
}

/// Optional fields supplied alongside a test name and status.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    pub error: Option<String>,
    pub stack_trace: Option<String>,
    /// Duration in milliseconds. Derived from `started_at` when absent.
    pub duration_ms: Option<u64>,
    /// When the test started; replaces any shared start-time bookkeeping.
    pub started_at: Option<DateTime<Utc>>,
    pub browser: Option<String>,
    pub environment: Option<String>,
    pub tags: Vec<String>,
    pub screenshot: Option<Screenshot>,
    pub test_data: Option<Value>,
    pub url: Option<String>,
}

impl ExecutionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the error message and optional stack trace
    pub fn with_error(mut self, error: impl Into<String>, stack_trace: Option<String>) -> Self {
        self.error = Some(error.into());
        self.stack_trace = stack_trace;
        self
    }

    /// Set the duration in milliseconds
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Set the start instant
    pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self
    }

    pub fn with_browser(mut self, browser: impl Into<String>) -> Self {
        self.browser = Some(browser.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_screenshot(mut self, screenshot: Screenshot) -> Self {
        self.screenshot = Some(screenshot);
        self
    }

    pub fn with_test_data(mut self, test_data: Value) -> Self {
        self.test_data = Some(test_data);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// One test run's persisted outcome (`test-result.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub test_id: String,
    pub test_name: String,
    pub test_suite: String,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    /// Duration in milliseconds.
    #[serde(default)]
    pub duration: u64,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub browser: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso_millis::option"
    )]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Fields written by other tools, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExecutionRecord {
    /// The lightweight form of this record kept in a suite summary.
    pub fn summary_entry(&self) -> SummaryEntry {
        SummaryEntry {
            test_name: self.test_name.clone(),
            status: self.status,
            timestamp: self.timestamp,
            duration: self.duration,
        }
    }
}

/// Entry in a suite summary's rolling window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryEntry {
    pub test_name: String,
    pub status: ExecutionStatus,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    /// Duration in milliseconds.
    #[serde(default)]
    pub duration: u64,
}

/// Rolling per-suite summary (`suite-summary.json`).
///
/// The counters are always derived from `results`; they are never adjusted
/// on their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteSummary {
    pub suite_name: String,
    #[serde(with = "iso_millis")]
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub total_tests: usize,
    #[serde(default)]
    pub passed_tests: usize,
    #[serde(default)]
    pub failed_tests: usize,
    #[serde(default)]
    pub skipped_tests: usize,
    #[serde(default)]
    pub blocked_tests: usize,
    #[serde(default)]
    pub results: Vec<SummaryEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SuiteSummary {
    /// Creates an empty summary with all counters at zero.
    pub fn new(suite_name: impl Into<String>) -> Self {
        SuiteSummary {
            suite_name: suite_name.into(),
            last_updated: Utc::now(),
            total_tests: 0,
            passed_tests: 0,
            failed_tests: 0,
            skipped_tests: 0,
            blocked_tests: 0,
            results: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Appends an entry, evicts the oldest entries beyond [`SUMMARY_WINDOW`]
    /// and re-derives every counter.
    pub fn push(&mut self, entry: SummaryEntry) {
        self.results.push(entry);
        if self.results.len() > SUMMARY_WINDOW {
            let excess = self.results.len() - SUMMARY_WINDOW;
            self.results.drain(..excess);
        }
        self.recount();
    }

    /// Recompute all counters from the rolling window.
    pub fn recount(&mut self) {
        let count = |status: ExecutionStatus| {
            self.results
                .iter()
                .filter(|entry| entry.status == status)
                .count()
        };
        let passed = count(ExecutionStatus::Passed);
        let failed = count(ExecutionStatus::Failed);
        let skipped = count(ExecutionStatus::Skipped);
        let blocked = count(ExecutionStatus::Blocked);

        self.total_tests = self.results.len();
        self.passed_tests = passed;
        self.failed_tests = failed;
        self.skipped_tests = skipped;
        self.blocked_tests = blocked;
    }

    /// Number of entries in the window with the given status.
    pub fn count(&self, status: ExecutionStatus) -> usize {
        match status {
            ExecutionStatus::Passed => self.passed_tests,
            ExecutionStatus::Failed => self.failed_tests,
            ExecutionStatus::Skipped => self.skipped_tests,
            ExecutionStatus::Blocked => self.blocked_tests,
        }
    }
}

/// Timestamps as RFC 3339 with millisecond precision and a `Z` suffix.
pub(crate) mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => serializer.serialize_str(&super::format(dt)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            raw.map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
        }
    }
}
