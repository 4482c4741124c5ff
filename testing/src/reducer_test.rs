//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.
//! Unlike [`TestStore`](crate::TestStore) it stops at the reducer boundary: effects are
//! inspected as values and never executed.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use composable_core::{Effect, Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// use composable_testing::{ReducerTest, assertions};
///
/// ReducerTest::new(todo_list_reducer())
///     .with_env(test_environment())
///     .given_state(TodoListState::default())
///     .when_action(TodoListAction::AddButtonTapped)
///     .then_state(|state| {
///         assert_eq!(state.todos.len(), 1);
///     })
///     .then_effects(assertions::assert_no_effects)
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    actions: Vec<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Add an action to reduce (When)
    ///
    /// Several actions are reduced in order; effect assertions see the effects
    /// of the last one.
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the resulting effects (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        assert!(
            !self.actions.is_empty(),
            "At least one action must be set with when_action()"
        );

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let mut effects = Vec::new();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env).into_vec();
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use composable_core::{Effect, EffectId};
    use std::time::Duration;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if any effect other than `Effect::None` is present.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that some effect (possibly nested) is a delay of `duration`
    ///
    /// # Panics
    ///
    /// Panics if no such delay is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_delay_effect<A>(effects: &[Effect<A>], duration: Duration) {
        assert!(
            effects.iter().any(|e| contains_delay(e, duration)),
            "Expected a Delay of {duration:?}, but none found"
        );
    }

    /// Assert that some effect registers under `id`
    ///
    /// # Panics
    ///
    /// Panics if no `Cancellable` effect with that id is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_cancellable_effect<A>(effects: &[Effect<A>], id: EffectId) {
        assert!(
            effects.iter().any(|e| contains_cancellable(e, id)),
            "Expected an effect cancellable under {id}, but none found"
        );
    }

    /// Assert that some effect cancels `id`
    ///
    /// # Panics
    ///
    /// Panics if no `Cancel` effect with that id is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_cancel_effect<A>(effects: &[Effect<A>], id: EffectId) {
        assert!(
            effects.iter().any(|e| contains_cancel(e, id)),
            "Expected an effect cancelling {id}, but none found"
        );
    }

    /// Actions yielded immediately (without a delay) by these effects, in order
    #[must_use]
    pub fn immediate_actions<A>(effects: &[Effect<A>]) -> Vec<&A> {
        let mut actions = Vec::new();
        for effect in effects {
            collect_immediate(effect, &mut actions);
        }
        actions
    }

    fn collect_immediate<'a, A>(effect: &'a Effect<A>, actions: &mut Vec<&'a A>) {
        match effect {
            Effect::Just(action) => actions.push(action),
            Effect::Parallel(effects) | Effect::Sequential(effects) => {
                for effect in effects {
                    collect_immediate(effect, actions);
                }
            },
            Effect::Cancellable { effect, .. } => collect_immediate(effect, actions),
            Effect::None | Effect::Delay { .. } | Effect::Cancel(_) => {},
        }
    }

    fn children<A>(effect: &Effect<A>) -> &[Effect<A>] {
        match effect {
            Effect::Parallel(effects) | Effect::Sequential(effects) => effects,
            Effect::Delay { effect, .. } | Effect::Cancellable { effect, .. } => {
                std::slice::from_ref(&**effect)
            },
            Effect::None | Effect::Just(_) | Effect::Cancel(_) => &[],
        }
    }

    fn contains_delay<A>(effect: &Effect<A>, duration: Duration) -> bool {
        matches!(effect, Effect::Delay { duration: d, .. } if *d == duration)
            || children(effect).iter().any(|e| contains_delay(e, duration))
    }

    fn contains_cancellable<A>(effect: &Effect<A>, id: EffectId) -> bool {
        matches!(effect, Effect::Cancellable { id: registered, .. } if *registered == id)
            || children(effect).iter().any(|e| contains_cancellable(e, id))
    }

    fn contains_cancel<A>(effect: &Effect<A>, id: EffectId) -> bool {
        matches!(effect, Effect::Cancel(cancelled) if *cancelled == id)
            || children(effect).iter().any(|e| contains_cancel(e, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImmediateScheduler;
    use composable_core::{Effect, EffectId, Effects, Reducer, smallvec};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Clone, Debug)]
    struct TestState {
        count: i32,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        Increment,
        Decrement,
        IncrementLater,
    }

    struct TestReducer;

    struct TestEnv;

    const LATER: EffectId = EffectId::new("later");

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> Effects<Self::Action> {
            match action {
                TestAction::Increment => {
                    state.count += 1;
                    smallvec![Effect::None]
                },
                TestAction::Decrement => {
                    state.count -= 1;
                    smallvec![Effect::None]
                },
                TestAction::IncrementLater => smallvec![
                    Effect::just(TestAction::Increment)
                        .debounce(LATER, Duration::from_secs(1), Arc::new(ImmediateScheduler)),
                    Effect::just(TestAction::Decrement),
                ],
            }
        }
    }

    #[test]
    fn test_reducer_test_increment() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Increment)
            .then_state(|state| {
                assert_eq!(state.count, 1);
            })
            .then_effects(|effects| {
                assertions::assert_no_effects(effects);
            })
            .run();
    }

    #[test]
    fn test_reducer_test_action_sequence() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 5 })
            .when_action(TestAction::Decrement)
            .when_action(TestAction::Decrement)
            .then_state(|state| {
                assert_eq!(state.count, 3);
            })
            .run();
    }

    #[test]
    fn test_effect_assertions_look_inside_wrappers() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::IncrementLater)
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 2);
                assertions::assert_has_delay_effect(effects, Duration::from_secs(1));
                assertions::assert_has_cancellable_effect(effects, LATER);
                assert_eq!(
                    assertions::immediate_actions(effects),
                    vec![&TestAction::Decrement]
                );
            })
            .run();
    }

    #[test]
    fn test_assertions_no_effects() {
        assertions::assert_no_effects::<TestAction>(&[Effect::None]);
        assertions::assert_no_effects::<TestAction>(&[]);
    }

    #[test]
    fn test_assert_has_cancel_effect() {
        assertions::assert_has_cancel_effect::<TestAction>(
            &[Effect::merge(vec![Effect::None, Effect::cancel(LATER)])],
            LATER,
        );
    }

    #[test]
    #[should_panic(expected = "Expected no effects")]
    fn test_assert_no_effects_fails_on_action() {
        assertions::assert_no_effects(&[Effect::just(TestAction::Increment)]);
    }
}
