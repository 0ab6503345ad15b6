//! Intake operations: how items enter, re-enter, and leave the pipeline

use crate::hub::{Hub, StatusEvent};
use crate::state::WorkItem;
use crate::storage::Store;
use crate::url::{normalize_url, with_default_scheme};
use crate::{Result, SitelensError};
use std::sync::Arc;

/// Submission, retry, and removal of work items
#[derive(Clone)]
pub struct Intake {
    store: Arc<dyn Store>,
    hub: Arc<Hub>,
}

impl Intake {
    pub fn new(store: Arc<dyn Store>, hub: Arc<Hub>) -> Self {
        Self { store, hub }
    }

    /// Normalizes `raw`, stores a new Queued item, and announces it
    ///
    /// The stored `url` is what gets fetched, so it always carries a scheme.
    pub async fn submit(&self, raw: &str) -> Result<WorkItem> {
        let normalized = normalize_url(raw)?;
        let url = with_default_scheme(raw)?;
        let item = self.store.create(WorkItem::new(url, normalized))?;

        tracing::info!("Queued {} as {}", item.normalized_url, item.id);
        self.hub.broadcast(&StatusEvent::created(&item)).await;
        Ok(item)
    }

    /// Clears an item's results and puts it back in the queue
    ///
    /// Any attempt still in flight for the item will have its outcome
    /// discarded.
    pub async fn request_reanalysis(&self, id: &str) -> Result<WorkItem> {
        let item = self
            .store
            .reset(id)?
            .ok_or_else(|| SitelensError::NotFound(id.to_string()))?;

        tracing::info!("Requeued {} for reanalysis", item.id);
        self.hub.broadcast(&StatusEvent::transition(&item)).await;
        Ok(item)
    }

    /// Removes an item; returns false if it did not exist
    pub async fn delete(&self, id: &str) -> Result<bool> {
        if !self.store.delete_by_id(id)? {
            return Ok(false);
        }

        tracing::info!("Deleted {}", id);
        self.hub.broadcast(&StatusEvent::deleted(id)).await;
        Ok(true)
    }
}
