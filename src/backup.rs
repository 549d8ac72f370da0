//! Backup documents: export and restore of every collection at once.
//!
//! DESIGN
//! ======
//! A backup is one pretty-printed JSON object:
//! `{products, customers, orders, version, timestamp}`. Export always writes
//! all three collections plus the version string and an epoch-milliseconds
//! timestamp. Restore is loose: the text must be JSON other than `null`,
//! a missing or `null` collection becomes an empty list, and records that do
//! not fit the typed model are skipped and counted rather than failing the
//! whole document. The version tag is carried through but never consulted.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::clock::date_stamp;
use crate::model::{Collection, Collections, Customer, Order, Product};

/// Written into every exported backup.
pub const BACKUP_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "-native");

pub const DEFAULT_BACKUP_PREFIX: &str = "orderdesk_backup";

const BACKUP_EXTENSION: &str = "json";

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("backup is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("backup document is null")]
    NullDocument,
    #[error("backup files must end in .json: {0}")]
    NotJsonFile(PathBuf),
    #[error("failed to encode backup: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("backup io failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// EXPORT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub products: Vec<Product>,
    pub customers: Vec<Customer>,
    pub orders: Vec<Order>,
    pub version: String,
    /// Epoch milliseconds at capture time.
    pub timestamp: i64,
}

impl Backup {
    /// Snapshot the collections as they are now.
    #[must_use]
    pub fn capture(collections: &Collections, timestamp: i64) -> Self {
        Self {
            products: collections.products.clone(),
            customers: collections.customers.clone(),
            orders: collections.orders.clone(),
            version: BACKUP_VERSION.to_owned(),
            timestamp,
        }
    }

    /// Two-space indented JSON, the on-disk backup format.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be encoded.
    pub fn to_json_pretty(&self) -> Result<String, BackupError> {
        serde_json::to_string_pretty(self).map_err(BackupError::Encode)
    }
}

/// `<prefix>_<YYYY-MM-DD>.json`, dated in UTC.
#[must_use]
pub fn backup_file_name(prefix: &str, timestamp: i64) -> String {
    format!("{prefix}_{}.{BACKUP_EXTENSION}", date_stamp(timestamp))
}

/// Write `backup` into `dir`, creating it if needed. Same-day exports overwrite.
///
/// # Errors
///
/// Returns an error if encoding, directory creation or the write fails.
pub fn write_backup(dir: &Path, prefix: &str, backup: &Backup) -> Result<PathBuf, BackupError> {
    let json = backup.to_json_pretty()?;
    std::fs::create_dir_all(dir).map_err(|source| BackupError::Io { path: dir.to_path_buf(), source })?;
    let path = dir.join(backup_file_name(prefix, backup.timestamp));
    std::fs::write(&path, json).map_err(|source| BackupError::Io { path: path.clone(), source })?;
    info!(
        path = %path.display(),
        products = backup.products.len(),
        customers = backup.customers.len(),
        orders = backup.orders.len(),
        "backup written"
    );
    Ok(path)
}

// =============================================================================
// RESTORE
// =============================================================================

/// Parsed backup, ready to replace state once confirmed.
#[derive(Debug, Clone, PartialEq)]
pub struct RestorePlan {
    pub collections: Collections,
    pub version: Option<String>,
    pub timestamp: Option<i64>,
    /// Records (or whole non-array collection values) that were dropped.
    pub skipped: usize,
}

/// Parse backup text into a restore plan.
///
/// # Errors
///
/// Returns `Malformed` for non-JSON text and `NullDocument` for a bare `null`.
/// Any other JSON value is accepted; a non-object has no collections and so
/// restores to empty.
pub fn parse_backup(text: &str) -> Result<RestorePlan, BackupError> {
    let value = serde_json::from_str::<Value>(text).map_err(BackupError::Malformed)?;
    let mut map = match value {
        Value::Object(map) => map,
        Value::Null => return Err(BackupError::NullDocument),
        other => {
            debug!(kind = json_kind(&other), "backup is not an object; no collections present");
            serde_json::Map::new()
        }
    };

    let mut skipped = 0_usize;
    let products = take_records::<Product>(&mut map, Collection::Products, &mut skipped);
    let customers = take_records::<Customer>(&mut map, Collection::Customers, &mut skipped);
    let orders = take_records::<Order>(&mut map, Collection::Orders, &mut skipped);

    let version = map.get("version").and_then(Value::as_str).map(str::to_owned);
    let timestamp = map.get("timestamp").and_then(|v| v.as_i64().or_else(|| v.as_f64().map(f64_to_ms)));

    if skipped > 0 {
        warn!(skipped, "backup contained records that could not be read");
    }

    Ok(RestorePlan { collections: Collections { products, customers, orders }, version, timestamp, skipped })
}

#[allow(clippy::cast_possible_truncation)]
fn f64_to_ms(value: f64) -> i64 {
    value as i64
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn take_records<T: DeserializeOwned>(
    map: &mut serde_json::Map<String, Value>,
    collection: Collection,
    skipped: &mut usize,
) -> Vec<T> {
    match map.remove(collection.label()) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let (records, dropped) = typed_records(items, collection);
            *skipped = skipped.saturating_add(dropped);
            records
        }
        Some(_) => {
            *skipped = skipped.saturating_add(1);
            Vec::new()
        }
    }
}

/// Decode each element on its own, dropping the ones that do not fit `T`.
/// Returns the kept records and how many were dropped.
pub(crate) fn typed_records<T: DeserializeOwned>(items: Vec<Value>, collection: Collection) -> (Vec<T>, usize) {
    let total = items.len();
    let records: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<T>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(error = %e, collection = collection.label(), index, "skipping unreadable record");
                None
            }
        })
        .collect();
    let dropped = total - records.len();
    (records, dropped)
}

#[cfg(test)]
#[path = "backup_test.rs"]
mod tests;
