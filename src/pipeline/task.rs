//! Analysis task: one analyzer run raced against a deadline
//!
//! ```text
//! Dispatched -> Analyzing -> { Succeeded | Failed | TimedOut } -> Recorded
//! ```
//!
//! The analyzer runs as its own tokio task. If the deadline wins, the
//! analyzer's cancellation token is fired and its eventual result is never
//! looked at. The outcome is written with a compare-and-swap on the item's
//! attempt number, so at most one terminal state lands per attempt and a
//! retry issued meanwhile is never overwritten.

use crate::analyzer::{AnalysisError, ErrorKind, PageAnalyzer};
use crate::hub::{Hub, StatusEvent};
use crate::state::{Status, WorkItem};
use crate::storage::Store;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Shared collaborators every task needs
#[derive(Clone)]
pub struct TaskContext {
    pub store: Arc<dyn Store>,
    pub hub: Arc<Hub>,
    pub analyzer: Arc<dyn PageAnalyzer>,
}

impl std::fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskContext").finish_non_exhaustive()
    }
}

/// How an attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    Failed(ErrorKind),
    TimedOut,
}

/// What a finished task did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub item_id: String,
    pub attempt: u64,
    pub outcome: TaskOutcome,
    /// False when the item was reset, deleted, or already terminal for this attempt
    pub recorded: bool,
}

/// One in-flight analysis attempt
#[derive(Debug)]
pub struct AnalysisTask {
    item: WorkItem,
    context: TaskContext,
    timeout: Duration,
}

impl AnalysisTask {
    /// Creates a task for an item that has already been marked Running
    pub fn new(item: WorkItem, context: TaskContext, timeout: Duration) -> Self {
        Self {
            item,
            context,
            timeout,
        }
    }

    /// Runs the race, records the winner, and publishes it
    pub async fn run(self) -> TaskReport {
        let Self {
            mut item,
            context,
            timeout,
        } = self;

        let result = race_analyzer(&context.analyzer, &item.url, timeout).await;

        let outcome = match &result {
            Ok(_) => TaskOutcome::Succeeded,
            Err(AnalysisError::Timeout) => TaskOutcome::TimedOut,
            Err(e) => TaskOutcome::Failed(e.kind()),
        };

        match result {
            Ok(metrics) => item.record_success(metrics),
            Err(e) => {
                tracing::debug!("Analysis of {} failed: {}", item.url, e);
                item.record_failure(e.to_string(), e.error_code());
            }
        }

        let recorded = match context
            .store
            .compare_and_save(&item, item.attempt, Status::Running)
        {
            Ok(true) => true,
            Ok(false) => {
                tracing::debug!(
                    "Discarding outcome for {} (attempt {}): item was reset or removed",
                    item.id,
                    item.attempt
                );
                false
            }
            Err(e) => {
                // Best effort: the outcome is still published
                tracing::warn!("Failed to record outcome for {}: {}", item.id, e);
                context.hub.broadcast(&StatusEvent::terminal(&item)).await;
                return report(&item, outcome, false);
            }
        };

        if recorded {
            context.hub.broadcast(&StatusEvent::terminal(&item)).await;
            tracing::info!("Analysis of {} finished: {}", item.url, item.status);
        }

        report(&item, outcome, recorded)
    }
}

fn report(item: &WorkItem, outcome: TaskOutcome, recorded: bool) -> TaskReport {
    TaskReport {
        item_id: item.id.clone(),
        attempt: item.attempt,
        outcome,
        recorded,
    }
}

/// Runs the analyzer as a separate task and waits at most `timeout` for it
async fn race_analyzer(
    analyzer: &Arc<dyn PageAnalyzer>,
    url: &str,
    timeout: Duration,
) -> Result<crate::state::AnalysisResult, AnalysisError> {
    let cancel = CancellationToken::new();
    let analyzer = Arc::clone(analyzer);
    let url = url.to_string();
    let token = cancel.clone();

    let mut handle = tokio::spawn(async move { analyzer.analyze(&url, token).await });

    tokio::select! {
        joined = &mut handle => match joined {
            Ok(result) => result,
            Err(e) => Err(AnalysisError::Parse(format!("analyzer aborted: {}", e))),
        },
        _ = tokio::time::sleep(timeout) => {
            cancel.cancel();
            Err(AnalysisError::Timeout)
        }
    }
}
