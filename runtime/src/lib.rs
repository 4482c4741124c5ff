//! # Composable Runtime
//!
//! Runtime implementation for unidirectional state management.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: The runtime that owns state and serializes dispatch
//! - **`ScopedStore`**: A stateless child view projecting a parent store
//! - **Effect Executor**: Interprets effect descriptions and feeds actions back
//! - **`TokioScheduler`**: Production scheduler sleeping on a tokio runtime
//!
//! ## Example
//!
//! ```ignore
//! use composable_runtime::{Store, TokioScheduler};
//!
//! let scheduler = Arc::new(TokioScheduler::try_current()?);
//! let store = Store::new(AppState::default(), app_reducer(), AppEnvironment::live(scheduler));
//!
//! // Send an action
//! store.send(AppAction::Onboarding(OnboardingAction::StartButtonTapped))?;
//!
//! // Read state
//! let on_feature_list = store.state(|s| matches!(s, AppState::FeatureList(_)));
//! ```

/// Effect interpretation and keyed cancellation
pub mod executor;

/// Metric names and recorders
pub mod metrics;

/// Production scheduler
pub mod scheduler;

/// Store, scoped stores and subscriptions
pub mod store;

pub use executor::{ActionSink, EffectExecutor};
pub use scheduler::TokioScheduler;
pub use store::{ScopedStore, Store, Subscription};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown.
        #[error("Store is shutting down")]
        ShutdownInProgress,
    }

    /// Errors constructing a scheduler
    #[derive(Error, Debug)]
    pub enum SchedulerError {
        /// No tokio runtime is available on the current thread
        #[error("No tokio runtime available: {0}")]
        NoRuntime(#[from] tokio::runtime::TryCurrentError),
    }
}

pub use error::{SchedulerError, StoreError};

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use composable_runtime::StoreConfig;
///
/// let config = StoreConfig::default()
///     .with_label("app")
///     .with_broadcast_capacity(64);
///
/// assert_eq!(config.label, "app");
/// assert_eq!(config.broadcast_capacity, 64);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Name attached to this store's log lines
    pub label: String,
    /// Capacity of the channel returned by `Store::subscribe_actions`
    pub broadcast_capacity: usize,
}

impl StoreConfig {
    /// Set the store label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the action broadcast capacity (minimum 1)
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            label: "store".to_string(),
            broadcast_capacity: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.label, "store");
        assert_eq!(config.broadcast_capacity, 16);
    }

    #[test]
    fn store_error_display() {
        assert_eq!(StoreError::ShutdownInProgress.to_string(), "Store is shutting down");
    }
}
