//! Utility functions for command implementation

use crate::commands::StoreLocation;
use crate::config::StoreConfig;
use crate::error::Result;
use crate::store::file::FileResultStore;
use crate::store::ExecutionStatus;
use console::style;
use std::path::Path;

/// Load the configuration for a location, applying its overrides
pub fn load_config(location: &StoreLocation) -> Result<StoreConfig> {
    let base = working_dir(location);
    let mut config = StoreConfig::load(base)?;
    if let Some(ref results_dir) = location.results_dir {
        config.results_dir = results_dir.clone();
    }
    Ok(config)
}

/// Open the result store for a location
pub fn open_store(location: &StoreLocation) -> Result<FileResultStore> {
    let config = load_config(location)?;
    config.open_store(working_dir(location))
}

fn working_dir(location: &StoreLocation) -> &Path {
    location
        .directory
        .as_deref()
        .map(Path::new)
        .unwrap_or_else(|| Path::new("."))
}

/// Status label coloured for terminals (plain when colours are disabled)
pub fn styled_status(status: ExecutionStatus) -> String {
    let label = style(status.as_str());
    match status {
        ExecutionStatus::Passed => label.green(),
        ExecutionStatus::Failed => label.red(),
        ExecutionStatus::Skipped => label.yellow(),
        ExecutionStatus::Blocked => label.magenta(),
    }
    .to_string()
}
