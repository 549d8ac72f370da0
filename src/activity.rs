//! Action log: bounded, newest-first notices for display.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::clock::now_ms;

/// Entries kept; older ones fall off the end.
pub const MAX_LOG_ENTRIES: usize = 50;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 9;

/// Severity tag. Display only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogKind {
    #[default]
    Info,
    Success,
    Error,
}

impl LogKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Success => "SUCCESS",
            Self::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: LogKind,
}

#[derive(Debug, Clone, Default)]
pub struct ActionLog {
    entries: VecDeque<LogEntry>,
}

impl ActionLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a notice at the front, dropping the oldest past the cap.
    pub fn push(&mut self, message: impl Into<String>, kind: LogKind) -> &LogEntry {
        self.entries.push_front(LogEntry {
            id: generate_log_id(),
            timestamp: now_ms(),
            message: message.into(),
            kind,
        });
        self.entries.truncate(MAX_LOG_ENTRIES);
        &self.entries[0]
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[must_use]
pub fn generate_log_id() -> String {
    let mut rng = rand::rng();
    (0..ID_LEN)
        .map(|_| {
            let idx = rng.random_range(0..ID_ALPHABET.len());
            ID_ALPHABET[idx] as char
        })
        .collect()
}

#[cfg(test)]
#[path = "activity_test.rs"]
mod tests;
