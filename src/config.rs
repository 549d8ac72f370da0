//! Runtime configuration.
//!
//! Values arrive from clap, which reads the `ORDERDESK_*` environment
//! variables behind each flag. This module only fills in defaults.

use std::path::PathBuf;

use crate::backup::DEFAULT_BACKUP_PREFIX;

pub const DEFAULT_DATA_DIR: &str = ".orderdesk";
const BACKUP_SUBDIR: &str = "backups";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the collection blobs.
    pub data_dir: PathBuf,
    /// Where exported backups are written.
    pub backup_dir: PathBuf,
    /// Leading part of backup file names.
    pub backup_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::resolve(None, None, None)
    }
}

impl Config {
    /// Build config from optional flag/env values. Blank values count as unset.
    ///
    /// - data dir: default `.orderdesk`
    /// - backup dir: default `<data dir>/backups`
    /// - backup prefix: default `orderdesk_backup`
    #[must_use]
    pub fn resolve(data_dir: Option<PathBuf>, backup_dir: Option<PathBuf>, backup_prefix: Option<String>) -> Self {
        let data_dir = non_blank_path(data_dir).unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let backup_dir = non_blank_path(backup_dir).unwrap_or_else(|| data_dir.join(BACKUP_SUBDIR));
        let backup_prefix = backup_prefix
            .map(|p| p.trim().to_owned())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_BACKUP_PREFIX.to_owned());
        Self { data_dir, backup_dir, backup_prefix }
    }
}

fn non_blank_path(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.to_string_lossy().trim().is_empty())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
