//! Scheduler: periodically moves queued items into the worker pool

use super::dispatcher::{DispatchError, Dispatcher};
use super::task::TaskReport;
use crate::hub::{Hub, StatusEvent};
use crate::state::{Status, WorkItem};
use crate::storage::{StorageResult, Store};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// What one scheduling pass did
#[derive(Debug, Default)]
pub struct TickReport {
    /// Items found Queued at the start of the pass
    pub queued: usize,
    /// Items handed to the dispatcher
    pub dispatched: usize,
    /// Items another writer changed before this pass could claim them
    pub skipped: usize,
    /// Items claimed but handed back to the queue because the dispatcher closed
    pub released: usize,
    handles: Vec<JoinHandle<TaskReport>>,
}

impl TickReport {
    /// Waits for every task dispatched during this pass
    pub async fn wait(self) -> Vec<TaskReport> {
        let mut reports = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => tracing::warn!("Analysis task panicked: {}", e),
            }
        }
        reports
    }
}

pub struct Scheduler {
    store: Arc<dyn Store>,
    hub: Arc<Hub>,
    dispatcher: Arc<Dispatcher>,
    poll_interval: Duration,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn Store>,
        hub: Arc<Hub>,
        dispatcher: Arc<Dispatcher>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            hub,
            dispatcher,
            poll_interval,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// One scheduling pass over a snapshot of the Queued items
    ///
    /// Each item is claimed with a compare-and-swap from Queued to Running,
    /// announced, and then submitted. Submission waits while the pool is
    /// full, so a pass can take longer than the poll interval. Once the
    /// dispatcher is closed the pass stops claiming, and an item whose
    /// submission was refused goes back to Queued.
    pub async fn tick(&self) -> StorageResult<TickReport> {
        let snapshot = self.store.query_by_status(Status::Queued)?;
        let mut report = TickReport {
            queued: snapshot.len(),
            ..Default::default()
        };

        for mut item in snapshot {
            if self.dispatcher.is_closed() {
                tracing::info!("Dispatcher closed, ending scheduling pass early");
                break;
            }

            let expected_attempt = item.attempt;
            item.begin_attempt();

            match self
                .store
                .compare_and_save(&item, expected_attempt, Status::Queued)
            {
                Ok(true) => {}
                Ok(false) => {
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    // Left Queued; the next pass tries again
                    tracing::warn!("Failed to mark {} as running: {}", item.id, e);
                    report.skipped += 1;
                    continue;
                }
            }

            self.hub.broadcast(&StatusEvent::transition(&item)).await;

            match self.dispatcher.submit(item.clone()).await {
                Ok(handle) => {
                    report.dispatched += 1;
                    report.handles.push(handle);
                }
                Err(DispatchError::Closed) => {
                    tracing::info!("Dispatcher closed, ending scheduling pass early");
                    self.release_claim(item).await;
                    report.released += 1;
                    break;
                }
            }
        }

        Ok(report)
    }

    /// Puts a claimed but undispatched item back to Queued and announces it
    async fn release_claim(&self, mut item: WorkItem) {
        let attempt = item.attempt;
        item.status = Status::Queued;

        match self.store.compare_and_save(&item, attempt, Status::Running) {
            Ok(true) => {
                self.hub.broadcast(&StatusEvent::transition(&item)).await;
            }
            Ok(false) => {}
            Err(e) => {
                // Left Running; recover_interrupted requeues it on the next start
                tracing::warn!("Failed to requeue {}: {}", item.id, e);
            }
        }
    }

    /// Puts items left Running by an earlier process back in the queue
    ///
    /// Only call this before the first tick; it would otherwise requeue
    /// items that are genuinely in flight.
    pub async fn recover_interrupted(&self) -> StorageResult<usize> {
        let stranded = self.store.query_by_status(Status::Running)?;
        let mut recovered = 0;

        for item in stranded {
            if let Some(item) = self.store.reset(&item.id)? {
                tracing::info!("Requeued interrupted item {} ({})", item.id, item.url);
                self.hub.broadcast(&StatusEvent::transition(&item)).await;
                recovered += 1;
            }
        }

        Ok(recovered)
    }

    /// Ticks every poll interval until `shutdown` fires
    ///
    /// The first tick happens one interval after start. Shutdown closes the
    /// dispatcher, so a pass blocked on a full pool ends promptly; tasks
    /// already running are left to finish on their own.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            "Scheduler started (interval {:?}, pool size {})",
            self.poll_interval,
            self.dispatcher.pool_size()
        );

        let closer = {
            let dispatcher = Arc::clone(&self.dispatcher);
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                shutdown.cancelled().await;
                dispatcher.close();
            })
        };

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.tick().await {
                Ok(report) if report.queued > 0 => {
                    tracing::info!(
                        "Scheduling pass: {} queued, {} dispatched, {} skipped, {} released",
                        report.queued,
                        report.dispatched,
                        report.skipped,
                        report.released
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::error!("Skipping scheduling pass: {}", e),
            }
        }

        self.dispatcher.close();
        let _ = closer.await;
        tracing::info!("Scheduler stopped");
    }
}
