use crate::config::types::AnalysisConfig;
use std::time::Duration;

/// Default time between scheduler ticks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default per-analysis timeout
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(15);

/// Default number of pool slots
pub const DEFAULT_POOL_SIZE: usize = 1;

/// Resolved pipeline settings
///
/// All values are guaranteed positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub poll_interval: Duration,
    pub task_timeout: Duration,
    pub pool_size: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            task_timeout: DEFAULT_TASK_TIMEOUT,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl PipelineSettings {
    /// Resolves raw configuration values, falling back to defaults silently
    pub fn resolve(raw: &AnalysisConfig) -> Self {
        Self {
            poll_interval: positive(raw.poll_interval_secs)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            task_timeout: positive(raw.timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TASK_TIMEOUT),
            pool_size: positive(raw.pool_size)
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(DEFAULT_POOL_SIZE),
        }
    }

    /// Clamps already-built settings so none of them is zero
    pub fn sanitized(self) -> Self {
        Self {
            poll_interval: non_zero(self.poll_interval, DEFAULT_POLL_INTERVAL),
            task_timeout: non_zero(self.task_timeout, DEFAULT_TASK_TIMEOUT),
            pool_size: if self.pool_size == 0 {
                DEFAULT_POOL_SIZE
            } else {
                self.pool_size
            },
        }
    }
}

fn positive(value: Option<i64>) -> Option<u64> {
    value.filter(|v| *v > 0).map(|v| v as u64)
}

fn non_zero(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
