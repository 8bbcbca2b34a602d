//! Directory-based result store
//!
//! Layout under the base directory:
//! - `suites/<Suite>/suite-summary.json`: rolling summary of the suite
//! - `suites/<Suite>/<sanitized_name>/<timestamp>/test-result.json`: one execution
//! - `.../<timestamp>/screenshots/test-screenshot.png`: optional screenshot
//! - `.../<timestamp>/data/test-data.json`: optional caller-supplied test data
//! - `.../<timestamp>/logs/`: reserved
//!
//! Execution directories are never rewritten; only the summary file of each
//! suite is shared between writers.

use crate::error::{Error, Result};
use crate::naming::{classify_suite, sanitize_test_name};
use crate::store::lock::with_suite_lock;
use crate::store::record::iso_millis;
use crate::store::{
    ExecutionOptions, ExecutionRecord, ExecutionStatus, ResultStore, Screenshot, SuiteSummary,
    SummaryEntry,
};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Map;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub const SUITES_DIR: &str = "suites";
pub const SUMMARY_FILE: &str = "suite-summary.json";
pub const RESULT_FILE: &str = "test-result.json";
pub const SCREENSHOT_FILE: &str = "test-screenshot.png";
pub const TEST_DATA_FILE: &str = "test-data.json";
pub const EXECUTION_SUBDIRS: [&str; 3] = ["screenshots", "logs", "data"];

pub const DEFAULT_BROWSER: &str = "chromium";
pub const DEFAULT_ENVIRONMENT: &str = "dev";
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Attempts at claiming a suffixed execution directory before giving up.
const MAX_CLAIM_ATTEMPTS: u32 = 32;

static NEXT_SUFFIX: AtomicU64 = AtomicU64::new(0);

pub struct FileResultStore {
    base: PathBuf,
    default_browser: String,
    default_environment: String,
    lock_timeout: Duration,
}

impl FileResultStore {
    /// Open a store rooted at `base`, creating the directory if needed.
    pub fn new(base: impl Into<PathBuf>) -> Result<Self> {
        let base = base.into();
        fs::create_dir_all(&base)?;
        tracing::debug!(base = %base.display(), "opened result store");

        Ok(FileResultStore {
            base,
            default_browser: DEFAULT_BROWSER.to_string(),
            default_environment: DEFAULT_ENVIRONMENT.to_string(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        })
    }

    /// Set the browser and environment recorded when the caller omits them
    pub fn with_defaults(
        mut self,
        browser: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        self.default_browser = browser.into();
        self.default_environment = environment.into();
        self
    }

    /// Set how long to wait for another process's summary lock
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    fn suite_dir(&self, suite_name: &str) -> PathBuf {
        self.base.join(SUITES_DIR).join(suite_name)
    }

    fn summary_path(&self, suite_name: &str) -> PathBuf {
        self.suite_dir(suite_name).join(SUMMARY_FILE)
    }

    /// Load the summary at `path`, falling back to an empty one when the file
    /// is missing, unreadable or malformed.
    fn load_summary_or_fresh(&self, suite_name: &str, path: &Path) -> SuiteSummary {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return SuiteSummary::new(suite_name),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable suite summary, starting fresh");
                return SuiteSummary::new(suite_name);
            }
        };

        match serde_json::from_str::<SuiteSummary>(&contents) {
            Ok(mut summary) => {
                summary.suite_name = suite_name.to_string();
                summary
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "malformed suite summary, starting fresh");
                SuiteSummary::new(suite_name)
            }
        }
    }
}

/// Render an instant as a directory name: millisecond precision, with the
/// colons and periods of RFC 3339 replaced by hyphens.
pub fn execution_dir_name(timestamp: &DateTime<Utc>) -> String {
    iso_millis::format(timestamp).replace([':', '.'], "-")
}

/// Atomically claim a fresh execution directory under `test_dir`.
///
/// The plain timestamp is tried first; if another execution already owns it,
/// a `-<pid>-<seq>` suffix is appended. Returns the directory and the suffix
/// used, if any.
fn claim_execution_dir(test_dir: &Path, stamp: &str) -> Result<(PathBuf, Option<String>)> {
    let plain = test_dir.join(stamp);
    match fs::create_dir(&plain) {
        Ok(()) => return Ok((plain, None)),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
        Err(e) => return Err(e.into()),
    }

    for _ in 0..MAX_CLAIM_ATTEMPTS {
        let suffix = format!(
            "{}-{}",
            std::process::id(),
            NEXT_SUFFIX.fetch_add(1, Ordering::Relaxed)
        );
        let candidate = test_dir.join(format!("{}-{}", stamp, suffix));
        match fs::create_dir(&candidate) {
            Ok(()) => {
                tracing::debug!(dir = %candidate.display(), "execution directory collided, using suffix");
                return Ok((candidate, Some(suffix)));
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(Error::Other(format!(
        "Could not claim an execution directory under {}",
        test_dir.display()
    )))
}

fn decode_screenshot(screenshot: &Screenshot) -> Result<Vec<u8>> {
    match screenshot {
        Screenshot::Bytes(bytes) => Ok(bytes.clone()),
        Screenshot::Base64(text) => {
            Ok(base64::engine::general_purpose::STANDARD.decode(text.trim())?)
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// Write via a sibling temporary file and rename, so readers never see a
/// partially written document.
fn write_json_replace<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(format!(".{}.tmp", std::process::id()));
    let tmp_path = path.with_file_name(tmp_name);

    write_json(&tmp_path, value)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

/// Remove duplicate tags, keeping the first occurrence of each.
fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !unique.contains(&tag) {
            unique.push(tag);
        }
    }
    unique
}

impl ResultStore for FileResultStore {
    fn base_path(&self) -> &Path {
        &self.base
    }

    fn record_execution(
        &self,
        test_name: &str,
        status: ExecutionStatus,
        options: ExecutionOptions,
    ) -> Result<PathBuf> {
        tracing::info!(test = test_name, %status, "saving result");
        let now = Utc::now();

        let suite = classify_suite(test_name);
        let sanitized = sanitize_test_name(test_name);

        let test_dir = self.suite_dir(suite.as_str()).join(&sanitized);
        fs::create_dir_all(&test_dir)?;
        let (execution_dir, suffix) = claim_execution_dir(&test_dir, &execution_dir_name(&now))?;
        for subdir in EXECUTION_SUBDIRS {
            fs::create_dir_all(execution_dir.join(subdir))?;
        }
        tracing::debug!(dir = %execution_dir.display(), "created execution directory");

        let screenshot_path = match options.screenshot.as_ref().filter(|s| !s.is_empty()) {
            Some(screenshot) => {
                let bytes = decode_screenshot(screenshot)?;
                let path = execution_dir.join("screenshots").join(SCREENSHOT_FILE);
                fs::write(&path, bytes)?;
                tracing::info!(path = %path.display(), "screenshot saved");
                Some(path)
            }
            None => None,
        };

        let mut test_id = format!("{}_{}_{}", suite, sanitized, now.timestamp_millis());
        if let Some(suffix) = suffix {
            test_id.push('-');
            test_id.push_str(&suffix);
        }

        let duration = options
            .duration_ms
            .or_else(|| {
                options
                    .started_at
                    .map(|start| (now - start).num_milliseconds().max(0) as u64)
            })
            .unwrap_or(0);

        let record = ExecutionRecord {
            test_id,
            test_name: test_name.to_string(),
            test_suite: suite.to_string(),
            status,
            error: options.error,
            stack_trace: options.stack_trace,
            duration,
            timestamp: now,
            browser: options
                .browser
                .unwrap_or_else(|| self.default_browser.clone()),
            environment: options
                .environment
                .unwrap_or_else(|| self.default_environment.clone()),
            tags: dedup_tags(options.tags),
            started_at: options.started_at,
            screenshot_path,
            test_data: options.test_data,
            url: options.url,
            extra: Map::new(),
        };

        let result_path = execution_dir.join(RESULT_FILE);
        write_json(&result_path, &record)?;

        if let Some(ref test_data) = record.test_data {
            write_json(&execution_dir.join("data").join(TEST_DATA_FILE), test_data)?;
        }

        self.update_summary(suite.as_str(), record.summary_entry())?;

        tracing::info!(path = %result_path.display(), test_id = %record.test_id, "test result saved");
        Ok(execution_dir)
    }

    fn update_summary(&self, suite_name: &str, entry: SummaryEntry) -> Result<SuiteSummary> {
        fs::create_dir_all(self.suite_dir(suite_name))?;
        let summary_path = self.summary_path(suite_name);

        with_suite_lock(&summary_path, self.lock_timeout, || {
            let mut summary = self.load_summary_or_fresh(suite_name, &summary_path);
            summary.push(entry);
            summary.last_updated = Utc::now();
            write_json_replace(&summary_path, &summary)?;
            Ok(summary)
        })
    }

    fn read_summary(&self, suite_name: &str) -> Result<SuiteSummary> {
        let path = self.summary_path(suite_name);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::SuiteNotFound(suite_name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&contents)?)
    }

    fn list_suites(&self) -> Result<Vec<String>> {
        let suites_dir = self.base.join(SUITES_DIR);
        let entries = match fs::read_dir(&suites_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut suites = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                suites.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        suites.sort();
        Ok(suites)
    }

    fn read_execution(&self, execution_dir: &Path) -> Result<ExecutionRecord> {
        let path = execution_dir.join(RESULT_FILE);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::ExecutionNotFound(execution_dir.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use tempfile::TempDir;

    fn entry(name: &str, status: ExecutionStatus) -> SummaryEntry {
        SummaryEntry {
            test_name: name.to_string(),
            status,
            timestamp: Utc::now(),
            duration: 5,
        }
    }

    #[test]
    fn test_execution_dir_name_is_filesystem_safe() {
        let ts = Utc.timestamp_opt(1_700_000_000, 123_000_000).unwrap();
        assert_eq!(execution_dir_name(&ts), "2023-11-14T22-13-20-123Z");
    }

    #[test]
    fn test_new_creates_base() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("nested").join("test-results");
        let store = FileResultStore::new(&base).unwrap();
        assert!(base.is_dir());
        assert_eq!(store.base_path(), base.as_path());
    }

    #[test]
    fn test_record_execution_layout() {
        let temp = TempDir::new().unwrap();
        let store = FileResultStore::new(temp.path()).unwrap();

        let dir = store
            .record_execution(
                "Login with valid credentials",
                ExecutionStatus::Passed,
                ExecutionOptions::new().with_duration_ms(321),
            )
            .unwrap();

        let test_dir = temp
            .path()
            .join("suites")
            .join("Authentication")
            .join("login_with_valid_credentials");
        assert_eq!(dir.parent().unwrap(), test_dir.as_path());
        for subdir in EXECUTION_SUBDIRS {
            assert!(dir.join(subdir).is_dir());
        }
        assert!(dir.join(RESULT_FILE).is_file());
        assert!(!dir.join("screenshots").join(SCREENSHOT_FILE).exists());
        assert!(!dir.join("data").join(TEST_DATA_FILE).exists());

        let name = dir.file_name().unwrap().to_string_lossy().into_owned();
        assert!(!name.contains(':'));
        assert!(!name.contains('.'));
    }

    #[test]
    fn test_record_execution_defaults() {
        let temp = TempDir::new().unwrap();
        let store = FileResultStore::new(temp.path()).unwrap();

        let dir = store
            .record_execution("Random flow", ExecutionStatus::Skipped, ExecutionOptions::new())
            .unwrap();
        let record = store.read_execution(&dir).unwrap();

        assert_eq!(record.test_suite, "General");
        assert_eq!(record.duration, 0);
        assert_eq!(record.browser, "chromium");
        assert_eq!(record.environment, "dev");
        assert!(record.tags.is_empty());
        assert!(record.screenshot_path.is_none());
        assert!(record
            .test_id
            .starts_with(&format!("General_random_flow_{}", record.timestamp.timestamp_millis())));
    }

    #[test]
    fn test_record_execution_custom_defaults() {
        let temp = TempDir::new().unwrap();
        let store = FileResultStore::new(temp.path())
            .unwrap()
            .with_defaults("firefox", "staging");

        let dir = store
            .record_execution("Random flow", ExecutionStatus::Passed, ExecutionOptions::new())
            .unwrap();
        let record = store.read_execution(&dir).unwrap();
        assert_eq!(record.browser, "firefox");
        assert_eq!(record.environment, "staging");

        let dir = store
            .record_execution(
                "Random flow",
                ExecutionStatus::Passed,
                ExecutionOptions::new().with_browser("webkit"),
            )
            .unwrap();
        assert_eq!(store.read_execution(&dir).unwrap().browser, "webkit");
    }

    #[test]
    fn test_record_execution_writes_screenshot_bytes() {
        let temp = TempDir::new().unwrap();
        let store = FileResultStore::new(temp.path()).unwrap();
        let png = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

        let dir = store
            .record_execution(
                "Dashboard shows widgets",
                ExecutionStatus::Failed,
                ExecutionOptions::new()
                    .with_error("widget missing", Some("at dashboard.spec:10".to_string()))
                    .with_screenshot(Screenshot::Bytes(png.clone())),
            )
            .unwrap();

        let screenshot = dir.join("screenshots").join(SCREENSHOT_FILE);
        assert_eq!(fs::read(&screenshot).unwrap(), png);

        let record = store.read_execution(&dir).unwrap();
        assert_eq!(record.screenshot_path.as_deref(), Some(screenshot.as_path()));
        assert_eq!(record.error.as_deref(), Some("widget missing"));
        assert_eq!(record.stack_trace.as_deref(), Some("at dashboard.spec:10"));
    }

    #[test]
    fn test_record_execution_decodes_base64_screenshot() {
        let temp = TempDir::new().unwrap();
        let store = FileResultStore::new(temp.path()).unwrap();

        let dir = store
            .record_execution(
                "Admin panel",
                ExecutionStatus::Failed,
                ExecutionOptions::new().with_screenshot(Screenshot::Base64("aGVsbG8=".to_string())),
            )
            .unwrap();

        let screenshot = dir.join("screenshots").join(SCREENSHOT_FILE);
        assert_eq!(fs::read(screenshot).unwrap(), b"hello");
    }

    #[test]
    fn test_record_execution_invalid_base64_fails() {
        let temp = TempDir::new().unwrap();
        let store = FileResultStore::new(temp.path()).unwrap();

        let result = store.record_execution(
            "Admin panel",
            ExecutionStatus::Failed,
            ExecutionOptions::new().with_screenshot(Screenshot::Base64("not base64!!".to_string())),
        );
        assert!(matches!(result, Err(Error::ScreenshotDecode(_))));
    }

    #[test]
    fn test_record_execution_writes_test_data() {
        let temp = TempDir::new().unwrap();
        let store = FileResultStore::new(temp.path()).unwrap();
        let data = json!({"user": {"name": "Admin", "roles": ["ess", "admin"]}, "attempt": 2});

        let dir = store
            .record_execution(
                "validate required fields",
                ExecutionStatus::Passed,
                ExecutionOptions::new()
                    .with_test_data(data.clone())
                    .with_url("https://example.test/form"),
            )
            .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join("data").join(TEST_DATA_FILE)).unwrap())
                .unwrap();
        assert_eq!(written, data);

        let record = store.read_execution(&dir).unwrap();
        assert_eq!(record.test_suite, "Validation");
        assert_eq!(record.test_data, Some(data));
        assert_eq!(record.url.as_deref(), Some("https://example.test/form"));
    }

    #[test]
    fn test_record_execution_dedups_tags() {
        let temp = TempDir::new().unwrap();
        let store = FileResultStore::new(temp.path()).unwrap();

        let dir = store
            .record_execution(
                "Random flow",
                ExecutionStatus::Passed,
                ExecutionOptions::new()
                    .with_tag("@smoke")
                    .with_tag("@regression")
                    .with_tag("@smoke"),
            )
            .unwrap();
        let record = store.read_execution(&dir).unwrap();
        assert_eq!(record.tags, vec!["@smoke", "@regression"]);
    }

    #[test]
    fn test_duration_derived_from_start() {
        let temp = TempDir::new().unwrap();
        let store = FileResultStore::new(temp.path()).unwrap();
        let started = Utc::now() - chrono::Duration::seconds(2);

        let dir = store
            .record_execution(
                "Random flow",
                ExecutionStatus::Passed,
                ExecutionOptions::new().with_started_at(started),
            )
            .unwrap();
        let record = store.read_execution(&dir).unwrap();
        assert!(record.duration >= 2000);
        assert!(record.started_at.is_some());
    }

    #[test]
    fn test_explicit_duration_wins_over_start() {
        let temp = TempDir::new().unwrap();
        let store = FileResultStore::new(temp.path()).unwrap();
        let started = Utc::now() - chrono::Duration::seconds(2);

        let dir = store
            .record_execution(
                "Random flow",
                ExecutionStatus::Passed,
                ExecutionOptions::new()
                    .with_started_at(started)
                    .with_duration_ms(15),
            )
            .unwrap();
        assert_eq!(store.read_execution(&dir).unwrap().duration, 15);
    }

    #[test]
    fn test_same_millisecond_executions_get_distinct_dirs() {
        let temp = TempDir::new().unwrap();
        let test_dir = temp.path().join("t");
        fs::create_dir_all(&test_dir).unwrap();

        let (first, first_suffix) = claim_execution_dir(&test_dir, "stamp").unwrap();
        let (second, second_suffix) = claim_execution_dir(&test_dir, "stamp").unwrap();

        assert_ne!(first, second);
        assert!(first_suffix.is_none());
        assert!(second_suffix.is_some());
    }

    #[test]
    fn test_record_execution_updates_summary() {
        let temp = TempDir::new().unwrap();
        let store = FileResultStore::new(temp.path()).unwrap();

        store
            .record_execution("Login ok", ExecutionStatus::Passed, ExecutionOptions::new())
            .unwrap();
        store
            .record_execution("Login bad password", ExecutionStatus::Failed, ExecutionOptions::new())
            .unwrap();

        let summary = store.read_summary("Authentication").unwrap();
        assert_eq!(summary.suite_name, "Authentication");
        assert_eq!(summary.total_tests, 2);
        assert_eq!(summary.passed_tests, 1);
        assert_eq!(summary.failed_tests, 1);
        assert_eq!(summary.results[0].test_name, "Login ok");
        assert_eq!(summary.results[1].test_name, "Login bad password");
    }

    #[test]
    fn test_update_summary_window() {
        let temp = TempDir::new().unwrap();
        let store = FileResultStore::new(temp.path()).unwrap();

        for i in 0..60 {
            store
                .update_summary("General", entry(&format!("t{}", i), ExecutionStatus::Passed))
                .unwrap();
        }

        let summary = store.read_summary("General").unwrap();
        assert_eq!(summary.results.len(), 50);
        assert_eq!(summary.total_tests, 50);
        let names: Vec<_> = summary.results.iter().map(|r| r.test_name.clone()).collect();
        let expected: Vec<_> = (10..60).map(|i| format!("t{}", i)).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_update_summary_recovers_from_corruption() {
        let temp = TempDir::new().unwrap();
        let store = FileResultStore::new(temp.path()).unwrap();
        let suite_dir = temp.path().join("suites").join("Dashboard");
        fs::create_dir_all(&suite_dir).unwrap();
        fs::write(suite_dir.join(SUMMARY_FILE), "{ this is not json").unwrap();

        let summary = store
            .update_summary("Dashboard", entry("widgets", ExecutionStatus::Blocked))
            .unwrap();
        assert_eq!(summary.total_tests, 1);
        assert_eq!(summary.blocked_tests, 1);

        let reread = store.read_summary("Dashboard").unwrap();
        assert_eq!(reread.results.len(), 1);
        assert_eq!(reread.results[0].test_name, "widgets");
    }

    #[test]
    fn test_update_summary_leaves_no_temporary_files() {
        let temp = TempDir::new().unwrap();
        let store = FileResultStore::new(temp.path()).unwrap();
        store
            .update_summary("General", entry("a", ExecutionStatus::Passed))
            .unwrap();

        let names: Vec<_> = fs::read_dir(temp.path().join("suites").join("General"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![SUMMARY_FILE.to_string()]);
    }

    #[test]
    fn test_read_summary_missing_suite() {
        let temp = TempDir::new().unwrap();
        let store = FileResultStore::new(temp.path()).unwrap();
        assert!(matches!(
            store.read_summary("Validation"),
            Err(Error::SuiteNotFound(_))
        ));
    }

    #[test]
    fn test_list_suites() {
        let temp = TempDir::new().unwrap();
        let store = FileResultStore::new(temp.path()).unwrap();
        assert!(store.list_suites().unwrap().is_empty());

        store
            .record_execution("Random flow", ExecutionStatus::Passed, ExecutionOptions::new())
            .unwrap();
        store
            .record_execution("admin page", ExecutionStatus::Passed, ExecutionOptions::new())
            .unwrap();

        assert_eq!(
            store.list_suites().unwrap(),
            vec!["Administration".to_string(), "General".to_string()]
        );
    }

    #[test]
    fn test_read_execution_missing() {
        let temp = TempDir::new().unwrap();
        let store = FileResultStore::new(temp.path()).unwrap();
        assert!(matches!(
            store.read_execution(&temp.path().join("nowhere")),
            Err(Error::ExecutionNotFound(_))
        ));
    }
}
