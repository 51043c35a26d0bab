use std::path::PathBuf;

use crate::storage::{STORAGE_KEY, json::DEFAULT_MAX_BACKUPS};

/// Runtime settings for the command line front end
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// JSON file holding the whole data set
    pub data_file: PathBuf,
    /// Rotated copies of the data file kept in `backups/` next to it
    pub max_backups: usize,
}

impl Config {
    /// Uses `data_file` when given, otherwise the platform data directory
    pub fn resolve(data_file: Option<PathBuf>) -> Self {
        Self {
            data_file: data_file.unwrap_or_else(default_data_file),
            max_backups: DEFAULT_MAX_BACKUPS,
        }
    }
}

/// `<data_local_dir>/tdo-manager/tdo-manager-data.json`, falling back to the
/// working directory when the platform has no data directory
pub fn default_data_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tdo-manager")
        .join(format!("{STORAGE_KEY}.json"))
}
