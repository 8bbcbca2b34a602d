//! Configuration file (.testres.conf) parsing and handling
//!
//! The .testres.conf file uses INI format with a [DEFAULT] section. Every key
//! is optional; unknown keys are ignored.

use crate::error::{Error, Result};
use crate::store::file::{FileResultStore, DEFAULT_BROWSER, DEFAULT_ENVIRONMENT};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE: &str = ".testres.conf";

pub const DEFAULT_RESULTS_DIR: &str = "test-results";

/// Configuration loaded from .testres.conf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory results are stored under, relative to the working directory
    pub results_dir: String,

    /// Browser recorded when a result does not name one
    pub browser: String,

    /// Environment recorded when a result does not name one
    pub environment: String,

    /// How long to wait for another process's summary lock
    pub lock_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            results_dir: DEFAULT_RESULTS_DIR.to_string(),
            browser: DEFAULT_BROWSER.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            lock_timeout: crate::store::file::DEFAULT_LOCK_TIMEOUT,
        }
    }
}

impl StoreConfig {
    /// Load configuration from `dir/.testres.conf`, or defaults if it is absent
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from_file(&path)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", CONFIG_FILE, e)))?;

        Self::parse(&contents)
    }

    /// Parse configuration from a string
    pub fn parse(contents: &str) -> Result<Self> {
        let ini: HashMap<String, HashMap<String, String>> = serde_ini::from_str(contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", CONFIG_FILE, e)))?;

        let mut config = Self::default();
        let Some(default) = ini.get("DEFAULT") else {
            return Ok(config);
        };

        if let Some(dir) = non_empty(default, "results_dir") {
            config.results_dir = dir;
        }
        if let Some(browser) = non_empty(default, "browser") {
            config.browser = browser;
        }
        if let Some(environment) = non_empty(default, "environment") {
            config.environment = environment;
        }
        if let Some(timeout) = non_empty(default, "lock_timeout") {
            let secs: u64 = timeout.parse().map_err(|_| {
                Error::Config(format!("lock_timeout must be a whole number of seconds, got {:?}", timeout))
            })?;
            config.lock_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Open the store this configuration describes, relative to `dir`
    pub fn open_store(&self, dir: &Path) -> Result<FileResultStore> {
        Ok(FileResultStore::new(dir.join(&self.results_dir))?
            .with_defaults(self.browser.clone(), self.environment.clone())
            .with_lock_timeout(self.lock_timeout))
    }
}

fn non_empty(section: &HashMap<String, String>, key: &str) -> Option<String> {
    section
        .get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
