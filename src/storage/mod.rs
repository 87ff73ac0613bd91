//! Storage module for persisting harvested records
//!
//! This module handles all database operations for the harvester, including:
//! - SQLite database initialization and schema management
//! - Idempotent, identity-keyed upserts (conflict-do-nothing)
//! - Row counts for the stats mode
//!
//! Records are insert-only: a re-fetch of known content is a silent no-op,
//! which is what makes at-least-once job delivery safe.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{Store, StorageError, StorageResult};

use crate::DriftnetError;
use std::path::Path;

/// Row counts per table, for the stats mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub submissions: u64,
    pub comments: u64,
    pub board_posts: u64,
}

/// Initializes or opens a storage database
pub fn open_store(path: &Path) -> Result<SqliteStore, DriftnetError> {
    SqliteStore::new(path)
}
