//! Local order, product and customer book with JSON backup and restore.
//!
//! ARCHITECTURE
//! ============
//! `storage` is a string key/value surface. `store` maps the three
//! collections onto it as whole JSON arrays. `state::AppState` owns the
//! in-memory collections and the action log, and writes through to the store
//! on every change. `services` hold the record operations, `backup` the
//! export/restore format, and `cli`/`shell` the terminal surfaces.

pub mod activity;
pub mod backup;
pub mod cli;
pub mod clock;
pub mod config;
pub mod model;
pub mod services;
pub mod shell;
pub mod state;
pub mod storage;
pub mod store;
