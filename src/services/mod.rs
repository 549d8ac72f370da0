//! Collection services used by the CLI and the interactive shell.
//!
//! ARCHITECTURE
//! ============
//! Service functions own validation and record construction, then hand the
//! change to `AppState`, which persists it. Front ends stay focused on
//! argument parsing and printing.

use uuid::Uuid;

pub mod customer;
pub mod order;
pub mod product;

const RECORD_ID_LEN: usize = 8;

/// Short random record id that `taken` does not already use.
pub(crate) fn new_record_id(taken: impl Fn(&str) -> bool) -> String {
    loop {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(RECORD_ID_LEN);
        if !taken(&id) {
            return id;
        }
    }
}

/// Trimmed, non-empty text or `None`.
pub(crate) fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_owned()) }
}

/// Round a money amount to cents.
#[must_use]
pub fn round_money(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
