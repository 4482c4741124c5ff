//! Reducer composition utilities
//!
//! This module provides utilities for composing reducers in various ways:
//! - **`combine_reducers`**: Run multiple reducers on the same state/action
//! - **`pullback`**: Lift a child reducer into a parent state/action/environment
//! - **`optional`**: Lift a reducer over `State` into one over `Option<State>`
//! - **`for_each`**: Run an element reducer on one element of an identified collection
//! - **`debug`**: Log every action a reducer receives and the state it leaves behind
//!
//! Each child reducer stays unaware of its parent's shape: the parent supplies
//! plain functions that project state, extract/embed actions and derive the
//! child environment.
//!
//! # Examples
//!
//! ## Combining Reducers
//!
//! ```
//! use composable_core::{Effect, Effects, Reducer, smallvec};
//! use composable_core::composition::combine_reducers;
//!
//! #[derive(Clone, Default)]
//! struct AppState {
//!     counter: i32,
//!     logged: bool,
//! }
//!
//! #[derive(Clone)]
//! enum AppAction {
//!     Increment,
//!     Log,
//! }
//!
//! struct CounterReducer;
//! struct LoggingReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = AppState;
//!     type Action = AppAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut AppState, action: AppAction, _env: &()) -> Effects<AppAction> {
//!         if matches!(action, AppAction::Increment) {
//!             state.counter += 1;
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! impl Reducer for LoggingReducer {
//!     type State = AppState;
//!     type Action = AppAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut AppState, action: AppAction, _env: &()) -> Effects<AppAction> {
//!         if matches!(action, AppAction::Log) {
//!             state.logged = true;
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let combined = combine_reducers(vec![Box::new(CounterReducer), Box::new(LoggingReducer)]);
//!
//! let mut state = AppState::default();
//! let _ = combined.reduce(&mut state, AppAction::Increment, &());
//! assert_eq!(state.counter, 1);
//! ```

use crate::effect::Effects;
use crate::identified::{Identifiable, IdentifiedVec};
use crate::reducer::Reducer;
use std::fmt::Debug;

/// A boxed reducer that can be shared with the runtime
pub type BoxedReducer<S, A, E> = Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in order on the full state, action and environment, and
/// all effects are collected and concatenated. Later reducers observe the state
/// as mutated by earlier ones in the same call.
///
/// # Type Parameters
///
/// - `S`: The state type
/// - `A`: The action type
/// - `E`: The environment type
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: Vec<BoxedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    A: Clone,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E> {
    reducers: Vec<BoxedReducer<S, A, E>>,
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    A: Clone,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects<Self::Action> {
        let mut all_effects = Effects::new();

        for reducer in &self.reducers {
            let effects = reducer.reduce(state, action.clone(), env);
            all_effects.extend(effects.into_iter().filter(|effect| !effect.is_none()));
        }

        all_effects
    }
}

/// Lifts a child reducer so that it operates on a parent state, action and environment.
///
/// - `state` projects the child state out of the parent. It returns `None` when the
///   parent is an enum currently in a different case.
/// - `extract_action` returns the child action carried by a parent action, if any.
/// - `embed_action` wraps child actions produced by effects back into parent actions.
/// - `environment` derives the child environment from the parent one.
///
/// Parent actions that carry no child action are ignored. A child action arriving
/// while the parent state is in another case is ignored as well (logged at `warn`):
/// it usually means an effect outlived the screen that started it.
///
/// # Examples
///
/// ```
/// use composable_core::{Effects, Reducer};
/// use composable_core::composition::pullback;
///
/// #[derive(Clone, Default)]
/// struct CounterState {
///     count: i32,
/// }
///
/// #[derive(Clone)]
/// enum CounterAction {
///     Add(i32),
/// }
///
/// struct CounterReducer;
///
/// impl Reducer for CounterReducer {
///     type State = CounterState;
///     type Action = CounterAction;
///     type Environment = ();
///
///     fn reduce(&self, state: &mut CounterState, action: CounterAction, _env: &()) -> Effects<CounterAction> {
///         match action {
///             CounterAction::Add(n) => state.count += n,
///         }
///         Effects::new()
///     }
/// }
///
/// #[derive(Clone, Default)]
/// struct AppState {
///     counter: CounterState,
///     other_data: String,
/// }
///
/// #[derive(Clone)]
/// enum AppAction {
///     Counter(CounterAction),
///     Rename(String),
/// }
///
/// fn counter_state(state: &mut AppState) -> Option<&mut CounterState> {
///     Some(&mut state.counter)
/// }
///
/// fn counter_action(action: AppAction) -> Option<CounterAction> {
///     match action {
///         AppAction::Counter(action) => Some(action),
///         AppAction::Rename(_) => None,
///     }
/// }
///
/// let scoped = pullback(CounterReducer, counter_state, counter_action, AppAction::Counter, |_: &()| ());
///
/// let mut state = AppState::default();
/// let _ = scoped.reduce(&mut state, AppAction::Counter(CounterAction::Add(3)), &());
/// assert_eq!(state.counter.count, 3);
/// ```
pub fn pullback<R, S, A, E>(
    reducer: R,
    state: fn(&mut S) -> Option<&mut R::State>,
    extract_action: fn(A) -> Option<R::Action>,
    embed_action: fn(R::Action) -> A,
    environment: fn(&E) -> R::Environment,
) -> Pullback<R, S, A, E>
where
    R: Reducer,
{
    Pullback {
        reducer,
        state,
        extract_action,
        embed_action,
        environment,
    }
}

/// A reducer lifted into a parent domain.
///
/// Created by [`pullback`].
pub struct Pullback<R, S, A, E>
where
    R: Reducer,
{
    reducer: R,
    state: fn(&mut S) -> Option<&mut R::State>,
    extract_action: fn(A) -> Option<R::Action>,
    embed_action: fn(R::Action) -> A,
    environment: fn(&E) -> R::Environment,
}

impl<R, S, A, E> Reducer for Pullback<R, S, A, E>
where
    R: Reducer,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects<Self::Action> {
        let Some(child_action) = (self.extract_action)(action) else {
            return Effects::new();
        };

        let Some(child_state) = (self.state)(state) else {
            tracing::warn!(
                child = std::any::type_name::<R::State>(),
                "Child action received while parent state is in another case; ignoring"
            );
            return Effects::new();
        };

        let child_env = (self.environment)(env);
        let embed = self.embed_action;

        self.reducer
            .reduce(child_state, child_action, &child_env)
            .into_iter()
            .map(|effect| effect.map(embed))
            .collect()
    }
}

/// Lifts a reducer over `State` into one over `Option<State>`.
///
/// Typically combined with [`pullback`] so that only the child's own actions reach
/// it: non-matching actions are filtered out before this reducer runs.
///
/// # Panics
///
/// The returned reducer panics when it receives an action while the state is
/// `None`. Sending an action to a feature that is not presented is a programming
/// error in the caller, not a recoverable condition.
#[must_use]
pub const fn optional<R>(reducer: R) -> OptionalReducer<R>
where
    R: Reducer,
{
    OptionalReducer { reducer }
}

/// A reducer over optional state.
///
/// Created by [`optional`].
pub struct OptionalReducer<R> {
    reducer: R,
}

impl<R> Reducer for OptionalReducer<R>
where
    R: Reducer,
    R::Action: Debug,
{
    type State = Option<R::State>;
    type Action = R::Action;
    type Environment = R::Environment;

    #[allow(clippy::panic)] // Reducing absent state is a broken precondition, not an error
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects<Self::Action> {
        match state {
            Some(state) => self.reducer.reduce(state, action, env),
            None => panic!(
                "an optional reducer for {} received {action:?} while its state was absent; \
                 actions must only be sent while the state is present",
                std::any::type_name::<R::State>()
            ),
        }
    }
}

/// Runs an element reducer on a single element of an [`IdentifiedVec`].
///
/// - `elements` projects the collection out of the parent state.
/// - `extract_action` returns the element id and element action carried by a parent action.
/// - `embed_action` wraps element actions produced by effects back into parent actions,
///   tagged with the element's id.
/// - `environment` derives the element environment.
///
/// An action for an id that is no longer in the collection is a silent no-op: the
/// element was removed between the action being created and being processed.
pub fn for_each<R, S, A, E>(
    reducer: R,
    elements: fn(&mut S) -> &mut IdentifiedVec<R::State>,
    extract_action: fn(A) -> Option<(<R::State as Identifiable>::Id, R::Action)>,
    embed_action: fn(<R::State as Identifiable>::Id, R::Action) -> A,
    environment: fn(&E) -> R::Environment,
) -> ForEachReducer<R, S, A, E>
where
    R: Reducer,
    R::State: Identifiable,
{
    ForEachReducer {
        reducer,
        elements,
        extract_action,
        embed_action,
        environment,
    }
}

/// A reducer that forwards tagged actions to elements of a collection.
///
/// Created by [`for_each`].
pub struct ForEachReducer<R, S, A, E>
where
    R: Reducer,
    R::State: Identifiable,
{
    reducer: R,
    elements: fn(&mut S) -> &mut IdentifiedVec<R::State>,
    extract_action: fn(A) -> Option<(<R::State as Identifiable>::Id, R::Action)>,
    embed_action: fn(<R::State as Identifiable>::Id, R::Action) -> A,
    environment: fn(&E) -> R::Environment,
}

impl<R, S, A, E> Reducer for ForEachReducer<R, S, A, E>
where
    R: Reducer,
    R::State: Identifiable,
    <R::State as Identifiable>::Id: Debug,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects<Self::Action> {
        let Some((id, element_action)) = (self.extract_action)(action) else {
            return Effects::new();
        };

        let Some(element) = (self.elements)(state).get_mut(&id) else {
            tracing::debug!(id = ?id, "Element action for a removed element; ignoring");
            return Effects::new();
        };

        let element_env = (self.environment)(env);
        let embed = self.embed_action;

        self.reducer
            .reduce(element, element_action, &element_env)
            .into_iter()
            .map(|effect| {
                let id = id.clone();
                effect.map(move |action| embed(id.clone(), action))
            })
            .collect()
    }
}

/// Wraps a reducer so that every action and resulting state is logged.
///
/// Actions are logged at `debug` with the given label, the resulting state at `trace`.
#[must_use]
pub const fn debug<R>(reducer: R, label: &'static str) -> DebugReducer<R>
where
    R: Reducer,
{
    DebugReducer { reducer, label }
}

/// A reducer that logs what it receives.
///
/// Created by [`debug`].
pub struct DebugReducer<R> {
    reducer: R,
    label: &'static str,
}

impl<R> Reducer for DebugReducer<R>
where
    R: Reducer,
    R::State: Debug,
    R::Action: Debug,
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
        tracing::debug!(reducer = self.label, action = ?action, "received action");
        let effects = self.reducer.reduce(state, action, env);
        tracing::trace!(
            reducer = self.label,
            state = ?state,
            effects = effects.len(),
            "state after action"
        );
        effects
    }
}

/// Method-chaining forms of the composition functions.
///
/// ```ignore
/// let feature = todo_list_reducer()
///     .optional()
///     .pullback(todo_list_state, todo_list_action, FeatureListAction::TodoList, todo_list_env)
///     .boxed();
/// ```
pub trait ReducerExt: Reducer + Sized {
    /// See [`pullback`]
    fn pullback<S, A, E>(
        self,
        state: fn(&mut S) -> Option<&mut Self::State>,
        extract_action: fn(A) -> Option<Self::Action>,
        embed_action: fn(Self::Action) -> A,
        environment: fn(&E) -> Self::Environment,
    ) -> Pullback<Self, S, A, E> {
        pullback(self, state, extract_action, embed_action, environment)
    }

    /// See [`optional`]
    fn optional(self) -> OptionalReducer<Self> {
        optional(self)
    }

    /// See [`for_each`]
    fn for_each<S, A, E>(
        self,
        elements: fn(&mut S) -> &mut IdentifiedVec<Self::State>,
        extract_action: fn(A) -> Option<(<Self::State as Identifiable>::Id, Self::Action)>,
        embed_action: fn(<Self::State as Identifiable>::Id, Self::Action) -> A,
        environment: fn(&E) -> Self::Environment,
    ) -> ForEachReducer<Self, S, A, E>
    where
        Self::State: Identifiable,
    {
        for_each(self, elements, extract_action, embed_action, environment)
    }

    /// See [`debug`]
    fn debug(self, label: &'static str) -> DebugReducer<Self> {
        debug(self, label)
    }

    /// Box this reducer for use with [`combine_reducers`]
    fn boxed(self) -> BoxedReducer<Self::State, Self::Action, Self::Environment>
    where
        Self: Send + Sync + 'static,
    {
        Box::new(self)
    }
}

impl<R> ReducerExt for R where R: Reducer {}
