//! Storage module for persisting work items
//!
//! The pipeline only ever talks to the [`Store`] trait, so the SQLite backend
//! and the in-memory backend are interchangeable. Neither offers transactions
//! across items: overlapping writes to the same item are last-writer-wins
//! unless they go through [`Store::compare_and_save`].

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Store, StorageError, StorageResult};

use std::path::Path;

/// Opens (or creates) the SQLite store at the given path
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to open the database or create the schema
pub fn open_store(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::new(path)
}
