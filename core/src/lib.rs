//! # Composable Core
//!
//! Core traits and types for unidirectional state management.
//!
//! This crate provides the fundamental abstractions for building user-facing
//! applications as a single state tree driven by reducers.
//!
//! ## Core Concepts
//!
//! - **State**: Domain state for a feature
//! - **Action**: All possible inputs to a reducer (user intents, effect results)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Description of deferred work that may yield further actions
//! - **Environment**: Injected dependencies (scheduler, id generator)
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell
//! - Unidirectional Data Flow
//! - Explicit Effects (no hidden I/O, no hidden timers)
//! - Dependency Injection via Environment
//! - Composition over inheritance: features are lifted into their parents with
//!   [`composition::pullback`], [`composition::optional`] and [`composition::for_each`]
//!
//! ## Example
//!
//! ```
//! use composable_core::{smallvec, Effect, Effects, Reducer};
//!
//! #[derive(Clone, Debug, Default)]
//! struct CounterState {
//!     count: i64,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum CounterAction {
//!     Increment,
//!     Decrement,
//! }
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = CounterState;
//!     type Action = CounterAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut CounterState,
//!         action: CounterAction,
//!         _env: &(),
//!     ) -> Effects<CounterAction> {
//!         match action {
//!             CounterAction::Increment => state.count += 1,
//!             CounterAction::Decrement => state.count -= 1,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = CounterState::default();
//! let _ = CounterReducer.reduce(&mut state, CounterAction::Increment, &());
//! assert_eq!(state.count, 1);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{smallvec, SmallVec};
pub use uuid::Uuid;

/// Reducer composition utilities (combine, pullback, optional, `for_each`, debug)
pub mod composition;

/// Effect descriptions and keyed cancellation identifiers
pub mod effect;

/// Ordered collections of uniquely identified elements
pub mod identified;

mod effect_macros;

pub use composition::ReducerExt;
pub use effect::{Effect, EffectId, Effects};
pub use identified::{Identifiable, IdentifiedVec};
pub use reducer::Reducer;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all business logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effects;
    use std::sync::Arc;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for TodoReducer {
    ///     type State = Todo;
    ///     type Action = TodoAction;
    ///     type Environment = TodoEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut Todo,
    ///         action: TodoAction,
    ///         _env: &TodoEnvironment,
    ///     ) -> Effects<TodoAction> {
    ///         match action {
    ///             TodoAction::CheckboxToggled => state.completed = !state.completed,
    ///             TodoAction::TextFieldChanged(text) => state.description = text,
    ///         }
    ///         Effects::new()
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Updates state in place
        /// 2. Returns effect descriptions to be executed by the runtime
        ///
        /// Returning several effects merges them: all of them run.
        ///
        /// # Arguments
        ///
        /// - `state`: Mutable reference to current state
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Effects<Self::Action>;
    }

    impl<R> Reducer for Box<R>
    where
        R: Reducer + ?Sized,
    {
        type State = R::State;
        type Action = R::Action;
        type Environment = R::Environment;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Effects<Self::Action> {
            (**self).reduce(state, action, env)
        }
    }

    impl<R> Reducer for Arc<R>
    where
        R: Reducer + ?Sized,
    {
        type State = R::State;
        type Action = R::Action;
        type Environment = R::Environment;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Effects<Self::Action> {
            (**self).reduce(state, action, env)
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All side-effect capabilities (time, scheduling, identifier generation) are
/// abstracted behind traits and injected via the Environment parameter, so
/// tests can substitute deterministic implementations.
pub mod environment {
    use chrono::{DateTime, Utc};
    use std::time::Duration;
    use uuid::Uuid;

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use composable_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let before = clock.now();
    /// assert!(clock.now() >= before);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// A unit of work handed to a [`Scheduler`]
    pub type ScheduledTask = Box<dyn FnOnce() + Send + 'static>;

    /// Scheduler trait - runs work after a delay on some notion of time
    ///
    /// Production implementations sleep on a real timer; test implementations
    /// keep a virtual clock that only moves when the test advances it.
    pub trait Scheduler: Clock {
        /// Run `task` once `delay` has elapsed on this scheduler's clock
        fn schedule_after(&self, delay: Duration, task: ScheduledTask);
    }

    /// Identifier generator - produces fresh unique identifiers
    pub trait UuidGenerator: Send + Sync {
        /// Produce a new identifier
        fn generate(&self) -> Uuid;
    }

    /// Production identifier generator using random (v4) UUIDs
    #[derive(Debug, Clone, Copy, Default)]
    pub struct V4UuidGenerator;

    impl UuidGenerator for V4UuidGenerator {
        fn generate(&self) -> Uuid {
            Uuid::new_v4()
        }
    }
}
