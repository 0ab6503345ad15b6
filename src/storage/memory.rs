//! In-memory storage implementation
//!
//! Used by tests. Semantics match the SQLite store, including no-op writes to
//! deleted items.

use crate::state::{Status, WorkItem};
use crate::storage::traits::{Store, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Work items kept in a mutex-guarded map
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, WorkItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, HashMap<String, WorkItem>>> {
        self.items.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl Store for MemoryStore {
    fn create(&self, mut item: WorkItem) -> StorageResult<WorkItem> {
        if item.id.is_empty() {
            item.id = Uuid::new_v4().to_string();
        }
        self.lock()?.insert(item.id.clone(), item.clone());
        Ok(item)
    }

    fn get(&self, id: &str) -> StorageResult<Option<WorkItem>> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn list(&self) -> StorageResult<Vec<WorkItem>> {
        let mut items: Vec<WorkItem> = self.lock()?.values().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    fn query_by_status(&self, status: Status) -> StorageResult<Vec<WorkItem>> {
        let mut items: Vec<WorkItem> = self
            .lock()?
            .values()
            .filter(|item| item.status == status)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(items)
    }

    fn save(&self, item: &WorkItem) -> StorageResult<bool> {
        let mut items = self.lock()?;
        match items.get_mut(&item.id) {
            Some(stored) => {
                *stored = item.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn compare_and_save(
        &self,
        item: &WorkItem,
        expected_attempt: u64,
        expected_status: Status,
    ) -> StorageResult<bool> {
        let mut items = self.lock()?;
        match items.get_mut(&item.id) {
            Some(stored)
                if stored.attempt == expected_attempt && stored.status == expected_status =>
            {
                *stored = item.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn reset(&self, id: &str) -> StorageResult<Option<WorkItem>> {
        let mut items = self.lock()?;
        Ok(items.get_mut(id).map(|stored| {
            stored.reset();
            stored.clone()
        }))
    }

    fn delete_by_id(&self, id: &str) -> StorageResult<bool> {
        Ok(self.lock()?.remove(id).is_some())
    }

    fn count_by_status(&self, status: Status) -> StorageResult<u64> {
        let count = self
            .lock()?
            .values()
            .filter(|item| item.status == status)
            .count();
        Ok(count as u64)
    }
}
