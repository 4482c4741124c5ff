//! # Composable Testing
//!
//! Testing utilities and helpers for reducers, effects and stores.
//!
//! This crate provides:
//! - Deterministic implementations of Environment traits (virtual-time scheduler, id generators)
//! - [`TestStore`], an exhaustive harness asserting every state change and every effect action
//! - [`ReducerTest`], a Given-When-Then builder for single reducer steps
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use composable_testing::{TestScheduler, TestStore};
//!
//! #[test]
//! fn completing_a_todo_sorts_it_last() {
//!     let scheduler = Arc::new(TestScheduler::new());
//!     let mut store = TestStore::new(todo_list_reducer(), two_todos(), environment(&scheduler));
//!
//!     store.send(toggle(first), |state| state.todos.get_mut(&first).unwrap().completed = true);
//!     scheduler.advance(Duration::from_secs(1));
//!     store.receive(TodoListAction::SortCompletedTodos, |state| state.todos.swap(0, 1));
//! }
//! ```

use chrono::{DateTime, Utc};
use composable_core::environment::{Clock, UuidGenerator};
use composable_core::Uuid;

/// Ergonomic reducer testing
pub mod reducer_test;

/// Virtual-time and inline schedulers
pub mod scheduler;

/// Exhaustive store harness
pub mod test_store;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc, Uuid, UuidGenerator};
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use composable_testing::mocks::FixedClock;
    /// use composable_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Identifier generator yielding `00000000-0000-0000-0000-000000000001`,
    /// `…0002`, … in order
    ///
    /// ```
    /// use composable_core::environment::UuidGenerator;
    /// use composable_testing::SequentialUuidGenerator;
    ///
    /// let ids = SequentialUuidGenerator::new();
    /// assert_eq!(ids.generate().to_string(), "00000000-0000-0000-0000-000000000001");
    /// assert_eq!(ids.generate().as_u128(), 2);
    /// ```
    #[derive(Debug, Default)]
    pub struct SequentialUuidGenerator {
        issued: AtomicU64,
    }

    impl SequentialUuidGenerator {
        /// A generator whose first id is `…0001`
        #[must_use]
        pub const fn new() -> Self {
            Self {
                issued: AtomicU64::new(0),
            }
        }

        /// The id the `n`th call (1-based) returns
        #[must_use]
        pub const fn nth(n: u64) -> Uuid {
            Uuid::from_u128(n as u128)
        }
    }

    impl UuidGenerator for SequentialUuidGenerator {
        fn generate(&self) -> Uuid {
            let n = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
            Self::nth(n)
        }
    }

    /// Identifier generator that always returns the same id
    #[derive(Debug, Clone, Copy)]
    pub struct ConstantUuidGenerator(pub Uuid);

    impl UuidGenerator for ConstantUuidGenerator {
        fn generate(&self) -> Uuid {
            self.0
        }
    }
}

/// Install a `tracing` subscriber that writes through the test harness
///
/// Filtered by `RUST_LOG`; safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{ConstantUuidGenerator, FixedClock, SequentialUuidGenerator, test_clock};
pub use reducer_test::{ReducerTest, assertions};
pub use scheduler::{ImmediateScheduler, TestScheduler};
pub use test_store::TestStore;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn sequential_ids_are_predictable() {
        let ids = SequentialUuidGenerator::new();
        let first = ids.generate();
        let second = ids.generate();

        assert_eq!(first, SequentialUuidGenerator::nth(1));
        assert_eq!(second, SequentialUuidGenerator::nth(2));
        assert_eq!(ConstantUuidGenerator(first).generate(), first);
    }
}
