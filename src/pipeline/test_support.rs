//! Store wrapper that fails on demand

use crate::state::{Status, WorkItem};
use crate::storage::{MemoryStore, StorageError, StorageResult, Store};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
pub struct FailingStore {
    pub inner: MemoryStore,
    pub fail_queries: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl FailingStore {
    fn check(flag: &AtomicBool) -> StorageResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Store for FailingStore {
    fn create(&self, item: WorkItem) -> StorageResult<WorkItem> {
        self.inner.create(item)
    }

    fn get(&self, id: &str) -> StorageResult<Option<WorkItem>> {
        self.inner.get(id)
    }

    fn list(&self) -> StorageResult<Vec<WorkItem>> {
        self.inner.list()
    }

    fn query_by_status(&self, status: Status) -> StorageResult<Vec<WorkItem>> {
        Self::check(&self.fail_queries)?;
        self.inner.query_by_status(status)
    }

    fn save(&self, item: &WorkItem) -> StorageResult<bool> {
        Self::check(&self.fail_writes)?;
        self.inner.save(item)
    }

    fn compare_and_save(
        &self,
        item: &WorkItem,
        expected_attempt: u64,
        expected_status: Status,
    ) -> StorageResult<bool> {
        Self::check(&self.fail_writes)?;
        self.inner
            .compare_and_save(item, expected_attempt, expected_status)
    }

    fn reset(&self, id: &str) -> StorageResult<Option<WorkItem>> {
        self.inner.reset(id)
    }

    fn delete_by_id(&self, id: &str) -> StorageResult<bool> {
        self.inner.delete_by_id(id)
    }

    fn count_by_status(&self, status: Status) -> StorageResult<u64> {
        self.inner.count_by_status(status)
    }
}
