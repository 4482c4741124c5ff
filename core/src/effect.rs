//! Effect module - Side effect descriptions
//!
//! Effects describe work to be performed by the runtime after a reducer has
//! committed its state change. They are values (not execution): a reducer
//! returns them, the Store interprets them, and any action they yield is fed
//! back through the reducer.

use crate::environment::Scheduler;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Effects returned by a single reducer invocation; all of them run.
pub type Effects<Action> = SmallVec<[Effect<Action>; 4]>;

/// Key under which cancellable effects are registered.
///
/// Declare one `const` per concern next to the reducer that owns it:
///
/// ```
/// use composable_core::EffectId;
///
/// const SEARCH_DEBOUNCE: EffectId = EffectId::new("search_debounce");
/// assert_eq!(SEARCH_DEBOUNCE.name(), "search_debounce");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(&'static str);

impl EffectId {
    /// Create an identifier from a static name
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The name this identifier was created with
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Effect type - describes a side effect to be executed
///
/// Effects are NOT executed immediately. They are descriptions of what should happen,
/// returned from reducers and executed by the Store runtime.
///
/// # Type Parameters
///
/// - `Action`: The action type that effects can produce (feedback loop)
pub enum Effect<Action> {
    /// No-op effect
    None,

    /// Feed exactly one action back into the store
    Just(Action),

    /// Run effects concurrently; completes when all of them have completed
    Parallel(Vec<Effect<Action>>),

    /// Run effects one after another, each starting when the previous completes
    Sequential(Vec<Effect<Action>>),

    /// Run the inner effect once `duration` has elapsed on `scheduler`
    Delay {
        /// How long to wait
        duration: Duration,
        /// Scheduler whose clock measures the wait
        scheduler: Arc<dyn Scheduler>,
        /// Effect to run after the wait
        effect: Box<Effect<Action>>,
    },

    /// Register the inner effect under `id` so it can be cancelled
    Cancellable {
        /// Cancellation key
        id: EffectId,
        /// Cancel effects already registered under `id` before starting
        cancel_in_flight: bool,
        /// The effect being registered
        effect: Box<Effect<Action>>,
    },

    /// Cancel every in-flight effect registered under the key
    Cancel(EffectId),
}

// Manual Debug implementation since the scheduler is an opaque trait object
impl<Action> fmt::Debug for Effect<Action>
where
    Action: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::None => write!(f, "Effect::None"),
            Effect::Just(action) => f.debug_tuple("Effect::Just").field(action).finish(),
            Effect::Parallel(effects) => f.debug_tuple("Effect::Parallel").field(effects).finish(),
            Effect::Sequential(effects) => {
                f.debug_tuple("Effect::Sequential").field(effects).finish()
            },
            Effect::Delay {
                duration, effect, ..
            } => f
                .debug_struct("Effect::Delay")
                .field("duration", duration)
                .field("effect", effect)
                .finish_non_exhaustive(),
            Effect::Cancellable {
                id,
                cancel_in_flight,
                effect,
            } => f
                .debug_struct("Effect::Cancellable")
                .field("id", id)
                .field("cancel_in_flight", cancel_in_flight)
                .field("effect", effect)
                .finish(),
            Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
        }
    }
}

impl<Action> Effect<Action> {
    /// An effect that does nothing and completes immediately
    #[must_use]
    pub const fn none() -> Self {
        Effect::None
    }

    /// An effect that yields exactly one action
    #[must_use]
    pub const fn just(action: Action) -> Self {
        Effect::Just(action)
    }

    /// Combine effects to run in parallel
    #[must_use]
    pub const fn merge(effects: Vec<Effect<Action>>) -> Self {
        Effect::Parallel(effects)
    }

    /// Chain effects to run sequentially
    #[must_use]
    pub const fn chain(effects: Vec<Effect<Action>>) -> Self {
        Effect::Sequential(effects)
    }

    /// Cancel any in-flight effect registered under `id`
    #[must_use]
    pub const fn cancel(id: EffectId) -> Self {
        Effect::Cancel(id)
    }

    /// Re-emit this effect's actions after `duration` on `scheduler`
    #[must_use]
    pub fn delay(self, duration: Duration, scheduler: Arc<dyn Scheduler>) -> Self {
        Effect::Delay {
            duration,
            scheduler,
            effect: Box::new(self),
        }
    }

    /// Register this effect under `id` so that it can be cancelled later
    #[must_use]
    pub fn cancellable(self, id: EffectId, cancel_in_flight: bool) -> Self {
        Effect::Cancellable {
            id,
            cancel_in_flight,
            effect: Box::new(self),
        }
    }

    /// Delay this effect, cancelling any earlier effect under the same key
    ///
    /// Only the most recent effect survives once `duration` passes without a
    /// newer one being registered under `id`.
    #[must_use]
    pub fn debounce(self, id: EffectId, duration: Duration, scheduler: Arc<dyn Scheduler>) -> Self {
        self.delay(duration, scheduler).cancellable(id, true)
    }

    /// Check whether this effect is a no-op
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Effect::None)
    }

    /// Transform every action this effect can yield
    ///
    /// Used to lift child effects into a parent's action type.
    #[must_use]
    pub fn map<B, F>(self, f: F) -> Effect<B>
    where
        F: Fn(Action) -> B + Clone,
    {
        match self {
            Effect::None => Effect::None,
            Effect::Just(action) => Effect::Just(f(action)),
            Effect::Parallel(effects) => {
                Effect::Parallel(effects.into_iter().map(|e| e.map(f.clone())).collect())
            },
            Effect::Sequential(effects) => {
                Effect::Sequential(effects.into_iter().map(|e| e.map(f.clone())).collect())
            },
            Effect::Delay {
                duration,
                scheduler,
                effect,
            } => Effect::Delay {
                duration,
                scheduler,
                effect: Box::new(effect.map(f)),
            },
            Effect::Cancellable {
                id,
                cancel_in_flight,
                effect,
            } => Effect::Cancellable {
                id,
                cancel_in_flight,
                effect: Box::new(effect.map(f)),
            },
            Effect::Cancel(id) => Effect::Cancel(id),
        }
    }
}
