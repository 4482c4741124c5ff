//! Production scheduler on a tokio runtime.

use crate::error::SchedulerError;
use chrono::{DateTime, Utc};
use composable_core::environment::{Clock, ScheduledTask, Scheduler};
use std::time::Duration;
use tokio::runtime::Handle;

/// Runs scheduled tasks on a tokio runtime after a real-time sleep
///
/// Each scheduled task is its own spawned tokio task, so a pending delay holds
/// no lock on any store. With tokio's paused test clock (`start_paused`) the
/// sleeps complete as soon as the runtime is otherwise idle.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Scheduler on an explicit runtime handle
    #[must_use]
    pub const fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Scheduler on the runtime the caller is running inside
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NoRuntime`] when called outside a tokio runtime.
    pub fn try_current() -> Result<Self, SchedulerError> {
        Ok(Self::new(Handle::try_current()?))
    }
}

impl Clock for TokioScheduler {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&self, delay: Duration, task: ScheduledTask) {
        tracing::trace!(delay_ms = delay.as_millis(), "Scheduling task");
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
    }
}
