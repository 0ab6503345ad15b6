//! Worker dispatcher: bounded concurrency for analysis tasks

use super::task::{AnalysisTask, TaskContext, TaskReport};
use crate::state::WorkItem;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Dispatcher is closed")]
    Closed,
}

/// Runs at most `pool_size` analysis tasks at once
///
/// `submit` waits for a free slot before spawning, so a full pool pushes back
/// on whoever is handing out work. The slot is held by the spawned task and
/// released when it finishes, whichever way it finishes.
#[derive(Debug)]
pub struct Dispatcher {
    slots: Arc<Semaphore>,
    pool_size: usize,
    context: TaskContext,
    task_timeout: Duration,
}

impl Dispatcher {
    /// A pool size of zero is treated as one
    pub fn new(pool_size: usize, context: TaskContext, task_timeout: Duration) -> Self {
        let pool_size = pool_size.max(1);
        Self {
            slots: Arc::new(Semaphore::new(pool_size)),
            pool_size,
            context,
            task_timeout,
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Slots not currently held by a running task
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Waits for a free slot, then starts analysing `item`
    ///
    /// The item must already be persisted as Running.
    pub async fn submit(&self, item: WorkItem) -> Result<JoinHandle<TaskReport>, DispatchError> {
        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| DispatchError::Closed)?;

        tracing::debug!("Dispatching {} (attempt {})", item.url, item.attempt);

        let task = AnalysisTask::new(item, self.context.clone(), self.task_timeout);
        Ok(tokio::spawn(async move {
            let _permit = permit;
            task.run().await
        }))
    }

    /// Refuses further submissions; tasks already running are unaffected
    pub fn close(&self) {
        self.slots.close();
    }

    pub fn is_closed(&self) -> bool {
        self.slots.is_closed()
    }
}
