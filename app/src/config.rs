//! Configuration for the todo application.
//!
//! Loads settings from `TODO_APP_*` environment variables, falling back to
//! the timings the features were designed around.

use std::time::Duration;
use thiserror::Error;

/// Log filter used when `TODO_APP_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "info";

const LOG_KEY: &str = "TODO_APP_LOG";
const NAVIGATION_DELAY_KEY: &str = "TODO_APP_NAVIGATION_DELAY_MS";
const SORT_DEBOUNCE_KEY: &str = "TODO_APP_SORT_DEBOUNCE_MS";
const MOVE_SORT_DELAY_KEY: &str = "TODO_APP_MOVE_SORT_DELAY_MS";

/// Errors raised while reading configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A duration variable did not hold a whole number of milliseconds
    #[error("{key} must be a whole number of milliseconds, got {value:?}")]
    InvalidDuration {
        /// The offending variable
        key: &'static str,
        /// The value it held
        value: String,
    },
}

/// Delays used by the features' effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Wait between tapping the home button and showing the home page
    pub navigation_delay: Duration,
    /// Quiet period after the last checkbox toggle before completed todos sink
    pub sort_debounce: Duration,
    /// Wait after a move before completed todos sink
    pub move_sort_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            navigation_delay: Duration::from_millis(300),
            sort_debounce: Duration::from_secs(1),
            move_sort_delay: Duration::from_millis(100),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `tracing` filter directive for the binary
    pub log_filter: String,
    /// Effect timings
    pub timings: Timings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            timings: Timings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDuration`] if a duration variable is set
    /// but does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// ```
    /// use std::time::Duration;
    /// use todo_app::config::AppConfig;
    ///
    /// let config = AppConfig::from_lookup(|key| {
    ///     (key == "TODO_APP_SORT_DEBOUNCE_MS").then(|| "250".to_string())
    /// })
    /// .unwrap();
    ///
    /// assert_eq!(config.timings.sort_debounce, Duration::from_millis(250));
    /// assert_eq!(config.timings.move_sort_delay, Duration::from_millis(100));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDuration`] if a duration variable is set
    /// but does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Timings::default();

        Ok(Self {
            log_filter: lookup(LOG_KEY).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            timings: Timings {
                navigation_delay: millis(&lookup, NAVIGATION_DELAY_KEY, defaults.navigation_delay)?,
                sort_debounce: millis(&lookup, SORT_DEBOUNCE_KEY, defaults.sort_debounce)?,
                move_sort_delay: millis(&lookup, MOVE_SORT_DELAY_KEY, defaults.move_sort_delay)?,
            },
        })
    }
}

fn millis<F>(lookup: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidDuration { key, value }),
    }
}
