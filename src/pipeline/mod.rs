//! The analysis pipeline
//!
//! Items flow from [`Intake`] into the store as Queued. The [`Scheduler`]
//! claims them on each tick and hands them to the [`Dispatcher`], which runs
//! each one as an [`AnalysisTask`] under a bounded pool and a per-task
//! deadline.

mod dispatcher;
mod intake;
mod scheduler;
mod task;

#[cfg(test)]
mod test_support;

pub use dispatcher::{DispatchError, Dispatcher};
pub use intake::Intake;
pub use scheduler::{Scheduler, TickReport};
pub use task::{AnalysisTask, TaskContext, TaskOutcome, TaskReport};

use crate::analyzer::PageAnalyzer;
use crate::config::PipelineSettings;
use crate::hub::Hub;
use crate::storage::Store;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Wires a scheduler and dispatcher together from resolved settings
pub fn build_scheduler(
    settings: &PipelineSettings,
    store: Arc<dyn Store>,
    hub: Arc<Hub>,
    analyzer: Arc<dyn PageAnalyzer>,
) -> Scheduler {
    let settings = settings.sanitized();
    let context = TaskContext {
        store: Arc::clone(&store),
        hub: Arc::clone(&hub),
        analyzer,
    };
    let dispatcher = Arc::new(Dispatcher::new(
        settings.pool_size,
        context,
        settings.task_timeout,
    ));
    Scheduler::new(store, hub, dispatcher, settings.poll_interval)
}

/// Cancels `shutdown` once `signal` fires
///
/// If the signal listener cannot be installed the token is left alone and
/// the pipeline keeps running.
pub async fn cancel_on_signal<F>(signal: F, shutdown: CancellationToken)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            tracing::info!("Shutting down");
            shutdown.cancel();
        }
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }
}
