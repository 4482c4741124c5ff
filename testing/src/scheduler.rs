//! Deterministic schedulers for tests.

use crate::mocks::test_clock;
use chrono::{DateTime, Utc};
use composable_core::environment::{Clock, ScheduledTask, Scheduler};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A scheduler on virtual time
///
/// Nothing runs until the test moves the clock with [`advance`](Self::advance) or
/// [`run`](Self::run). Due tasks fire in order of due time, then scheduling order.
/// Time starts at 2025-01-01T00:00:00Z.
///
/// # Example
///
/// ```
/// use composable_core::environment::Scheduler;
/// use composable_testing::TestScheduler;
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// let scheduler = TestScheduler::new();
/// let log = Arc::new(Mutex::new(Vec::new()));
///
/// let sink = Arc::clone(&log);
/// scheduler.schedule_after(Duration::from_secs(1), Box::new(move || sink.lock().unwrap().push("late")));
/// let sink = Arc::clone(&log);
/// scheduler.schedule_after(Duration::from_millis(500), Box::new(move || sink.lock().unwrap().push("early")));
///
/// scheduler.advance(Duration::from_millis(500));
/// assert_eq!(*log.lock().unwrap(), vec!["early"]);
///
/// scheduler.advance(Duration::from_millis(500));
/// assert_eq!(*log.lock().unwrap(), vec!["early", "late"]);
/// ```
pub struct TestScheduler {
    start: DateTime<Utc>,
    inner: Mutex<Timeline>,
}

#[derive(Default)]
struct Timeline {
    elapsed: Duration,
    sequence: u64,
    tasks: BTreeMap<(Duration, u64), ScheduledTask>,
}

impl TestScheduler {
    /// A scheduler at the start of virtual time
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: test_clock().now(),
            inner: Mutex::new(Timeline::default()),
        }
    }

    fn timeline(&self) -> MutexGuard<'_, Timeline> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Virtual time elapsed since the start
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.timeline().elapsed
    }

    /// Number of tasks waiting to fire
    #[must_use]
    pub fn pending(&self) -> usize {
        self.timeline().tasks.len()
    }

    /// Move time forward by `by`, firing every task that falls due
    ///
    /// Tasks scheduled by firing tasks also run if they fall inside the window.
    pub fn advance(&self, by: Duration) {
        let target = self.elapsed() + by;
        tracing::trace!(?by, "Advancing virtual time");
        while let Some(task) = self.next_due(Some(target)) {
            task();
        }
        self.timeline().elapsed = target;
    }

    /// Fire every scheduled task, moving time as far as needed
    pub fn run(&self) {
        while let Some(task) = self.next_due(None) {
            task();
        }
    }

    /// Pop the earliest task due at or before `limit`, moving time to it
    fn next_due(&self, limit: Option<Duration>) -> Option<ScheduledTask> {
        let mut timeline = self.timeline();
        let (&(due, sequence), _) = timeline.tasks.first_key_value()?;
        if limit.is_some_and(|limit| due > limit) {
            return None;
        }
        timeline.elapsed = timeline.elapsed.max(due);
        timeline.tasks.remove(&(due, sequence))
    }
}

impl Default for TestScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TestScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let timeline = self.timeline();
        f.debug_struct("TestScheduler")
            .field("elapsed", &timeline.elapsed)
            .field("pending", &timeline.tasks.len())
            .finish()
    }
}

impl Clock for TestScheduler {
    fn now(&self) -> DateTime<Utc> {
        chrono::Duration::from_std(self.elapsed()).map_or(self.start, |elapsed| self.start + elapsed)
    }
}

impl Scheduler for TestScheduler {
    fn schedule_after(&self, delay: Duration, task: ScheduledTask) {
        let mut timeline = self.timeline();
        let due = timeline.elapsed + delay;
        let sequence = timeline.sequence;
        timeline.sequence += 1;
        timeline.tasks.insert((due, sequence), task);
    }
}

/// A scheduler that runs every task immediately, ignoring the delay
///
/// Useful when a test cares about what a delayed effect produces, not when.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateScheduler;

impl Clock for ImmediateScheduler {
    fn now(&self) -> DateTime<Utc> {
        test_clock().now()
    }
}

impl Scheduler for ImmediateScheduler {
    fn schedule_after(&self, _delay: Duration, task: ScheduledTask) {
        task();
    }
}
