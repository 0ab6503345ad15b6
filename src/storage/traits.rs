//! Storage traits and error types

use crate::state::{Status, WorkItem};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    Poisoned,

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence collaborator consumed by the pipeline
///
/// Implementations must be safe to call from many analysis tasks at once.
/// Writes to an item that no longer exists are no-ops, never errors.
pub trait Store: Send + Sync {
    /// Inserts a new item, assigning a fresh ID if the item has none
    ///
    /// # Returns
    ///
    /// The item as stored, including its ID
    fn create(&self, item: WorkItem) -> StorageResult<WorkItem>;

    /// Gets an item by ID
    fn get(&self, id: &str) -> StorageResult<Option<WorkItem>>;

    /// Lists every item, newest first
    fn list(&self) -> StorageResult<Vec<WorkItem>>;

    /// Gets a point-in-time snapshot of all items with the given status
    fn query_by_status(&self, status: Status) -> StorageResult<Vec<WorkItem>>;

    /// Overwrites an item unconditionally (last writer wins)
    ///
    /// Returns false if the item does not exist.
    fn save(&self, item: &WorkItem) -> StorageResult<bool>;

    /// Overwrites an item only if the stored copy still has the expected
    /// attempt number and status
    ///
    /// Returns false when the stored copy has moved on or is gone.
    fn compare_and_save(
        &self,
        item: &WorkItem,
        expected_attempt: u64,
        expected_status: Status,
    ) -> StorageResult<bool>;

    /// Clears results, requeues the item and advances its attempt number
    ///
    /// Returns the reset item, or None if it does not exist.
    fn reset(&self, id: &str) -> StorageResult<Option<WorkItem>>;

    /// Deletes an item; returns false if there was nothing to delete
    fn delete_by_id(&self, id: &str) -> StorageResult<bool>;

    /// Counts items with the given status
    fn count_by_status(&self, status: Status) -> StorageResult<u64>;
}
