//! Exhaustive store harness.
//!
//! [`TestStore`] runs a reducer the way the runtime does, but every action an
//! effect produces is captured instead of fed back. The test must acknowledge
//! each one, in order, with [`TestStore::receive`], describing the state change
//! it expects. Anything left unacknowledged fails the test, and so does a
//! delayed effect that is still scheduled when the store is dropped.

#![allow(clippy::module_name_repetitions)]
#![allow(clippy::panic)] // Harness failures are test failures

use composable_core::{Effects, Reducer};
use composable_runtime::{ActionSink, EffectExecutor};
use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Actions produced by effects, waiting to be received
struct ReceivedActions<A> {
    queue: Mutex<VecDeque<A>>,
}

impl<A> ReceivedActions<A> {
    fn queue(&self) -> MutexGuard<'_, VecDeque<A>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A: Send> ActionSink<A> for ReceivedActions<A> {
    fn deliver(&self, action: A) {
        self.queue().push_back(action);
    }
}

/// Exhaustive test harness for a reducer and its effects
///
/// # Example
///
/// ```ignore
/// let scheduler = Arc::new(TestScheduler::new());
/// let mut store = TestStore::new(todo_list_reducer(), state, environment(&scheduler));
///
/// store.send(TodoListAction::Todo { id, action: TodoAction::CheckboxToggled }, |state| {
///     state.todos.get_mut(&id).unwrap().completed = true;
/// });
///
/// scheduler.advance(Duration::from_secs(1));
/// store.receive(TodoListAction::SortCompletedTodos, |state| {
///     state.todos.swap(0, 1);
/// });
/// ```
pub struct TestStore<R>
where
    R: Reducer,
    R::Action: Debug + Send + 'static,
{
    reducer: R,
    environment: R::Environment,
    state: R::State,
    received: Arc<ReceivedActions<R::Action>>,
    executor: Arc<EffectExecutor<R::Action>>,
    /// Whether dropping with scheduled effects fails the test
    exhaustive_effects: bool,
}

impl<R> TestStore<R>
where
    R: Reducer,
    R::State: Clone + PartialEq + Debug,
    R::Action: PartialEq + Debug + Send + 'static,
{
    /// Create a harness around `reducer` starting from `initial_state`
    #[must_use]
    pub fn new(reducer: R, initial_state: R::State, environment: R::Environment) -> Self {
        let received = Arc::new(ReceivedActions {
            queue: Mutex::new(VecDeque::new()),
        });
        let sink: Weak<dyn ActionSink<R::Action>> = Arc::downgrade(&received) as Weak<dyn ActionSink<R::Action>>;

        Self {
            reducer,
            environment,
            state: initial_state,
            received,
            executor: Arc::new(EffectExecutor::new(sink)),
            exhaustive_effects: true,
        }
    }

    /// The current state
    #[must_use]
    pub const fn state(&self) -> &R::State {
        &self.state
    }

    /// The environment the reducer runs with
    #[must_use]
    pub const fn environment(&self) -> &R::Environment {
        &self.environment
    }

    /// Send an action and assert the resulting state
    ///
    /// `update` receives a copy of the state before the action and must turn it
    /// into exactly the state the reducer produces.
    ///
    /// # Panics
    ///
    /// Panics if effect actions are still waiting to be received, or if the
    /// state after the action differs from the expected one.
    pub fn send(&mut self, action: R::Action, update: impl FnOnce(&mut R::State)) {
        let pending = self.received.queue();
        if !pending.is_empty() {
            panic!(
                "Must handle {} received action(s) before sending {action:?}: {:?}",
                pending.len(),
                *pending
            );
        }
        drop(pending);

        let description = format!("send {action:?}");
        self.step(action, update, &description);
    }

    /// Receive the next effect-produced action and assert the resulting state
    ///
    /// # Panics
    ///
    /// Panics if no action was received, if the next action is not `expected`,
    /// or if the state after it differs from the expected one.
    pub fn receive(&mut self, expected: R::Action, update: impl FnOnce(&mut R::State)) {
        let next = self.received.queue().pop_front();
        let Some(action) = next else {
            panic!("Expected to receive {expected:?}, but no action was received");
        };
        assert_eq!(action, expected, "Received an unexpected action");

        let description = format!("receive {action:?}");
        self.step(action, update, &description);
    }

    /// Discard every received action without asserting on it
    pub fn skip_received_actions(&mut self) {
        let skipped = self.received.queue().len();
        self.received.queue().clear();
        tracing::debug!(skipped, "Skipped received actions");
    }

    /// Stop failing on delayed effects still scheduled when the store is dropped
    pub fn skip_in_flight_effects(&mut self) {
        self.exhaustive_effects = false;
        tracing::debug!(
            in_flight = self.executor.pending_effects(),
            "Skipped in-flight effects"
        );
    }

    /// Number of scheduled effects that can still produce actions
    #[must_use]
    pub fn pending_effects(&self) -> usize {
        self.executor.pending_effects()
    }

    /// Number of received actions not yet acknowledged
    #[must_use]
    pub fn pending_received(&self) -> usize {
        self.received.queue().len()
    }

    fn step(&mut self, action: R::Action, update: impl FnOnce(&mut R::State), description: &str) {
        let mut expected = self.state.clone();
        update(&mut expected);

        let effects: Effects<R::Action> = self.reducer.reduce(&mut self.state, action, &self.environment);

        assert_eq!(
            self.state, expected,
            "State after `{description}` did not match the expected state"
        );

        for effect in effects {
            self.executor.execute(effect);
        }
    }
}

impl<R> Drop for TestStore<R>
where
    R: Reducer,
    R::Action: Debug + Send + 'static,
{
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        let pending = self.received.queue();
        if !pending.is_empty() {
            panic!(
                "The store received {} unexpected action(s) that were never asserted on: {:?}",
                pending.len(),
                *pending
            );
        }
        drop(pending);

        let in_flight = self.executor.pending_effects();
        if self.exhaustive_effects && in_flight > 0 {
            panic!(
                "The store was dropped with {in_flight} effect(s) still in flight; \
                 advance the scheduler, cancel them, or call skip_in_flight_effects()"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestScheduler;
    use composable_core::environment::Scheduler;
    use composable_core::{Effect, EffectId, smallvec};
    use std::time::Duration;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Counter {
        count: i32,
        saved: bool,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum CounterAction {
        Increment,
        IncrementAndSave,
        Saved,
        CancelSave,
        Echo(i32),
    }

    struct CounterEnv {
        scheduler: Arc<dyn Scheduler>,
    }

    struct CounterReducer;

    const SAVE: EffectId = EffectId::new("save");

    impl Reducer for CounterReducer {
        type State = Counter;
        type Action = CounterAction;
        type Environment = CounterEnv;

        fn reduce(&self, state: &mut Counter, action: CounterAction, env: &CounterEnv) -> Effects<CounterAction> {
            match action {
                CounterAction::Increment => {
                    state.count += 1;
                    Effects::new()
                },
                CounterAction::IncrementAndSave => {
                    state.count += 1;
                    state.saved = false;
                    smallvec![Effect::just(CounterAction::Saved).debounce(
                        SAVE,
                        Duration::from_secs(1),
                        Arc::clone(&env.scheduler),
                    )]
                },
                CounterAction::Saved => {
                    state.saved = true;
                    Effects::new()
                },
                CounterAction::CancelSave => smallvec![Effect::cancel(SAVE)],
                CounterAction::Echo(n) if n > 0 => smallvec![Effect::just(CounterAction::Echo(n - 1))],
                CounterAction::Echo(_) => Effects::new(),
            }
        }
    }

    fn store() -> (TestStore<CounterReducer>, Arc<TestScheduler>) {
        let scheduler = Arc::new(TestScheduler::new());
        let store = TestStore::new(
            CounterReducer,
            Counter::default(),
            CounterEnv {
                scheduler: scheduler.clone(),
            },
        );
        (store, scheduler)
    }

    #[test]
    fn send_asserts_state() {
        let (mut store, _) = store();
        store.send(CounterAction::Increment, |state| state.count = 1);
        assert_eq!(store.state().count, 1);
    }

    #[test]
    #[should_panic(expected = "did not match the expected state")]
    fn send_fails_on_wrong_expectation() {
        let (mut store, _) = store();
        store.send(CounterAction::Increment, |state| state.count = 2);
    }

    #[test]
    fn debounced_effect_is_received_once() {
        let (mut store, scheduler) = store();

        store.send(CounterAction::IncrementAndSave, |state| state.count = 1);
        scheduler.advance(Duration::from_millis(500));
        store.send(CounterAction::IncrementAndSave, |state| state.count = 2);
        scheduler.advance(Duration::from_millis(999));
        assert_eq!(store.pending_received(), 0);

        scheduler.advance(Duration::from_millis(1));
        store.receive(CounterAction::Saved, |state| state.saved = true);
    }

    #[test]
    fn immediate_effects_are_received_in_order() {
        let (mut store, _) = store();

        store.send(CounterAction::Echo(2), |_| {});
        store.receive(CounterAction::Echo(1), |_| {});
        store.receive(CounterAction::Echo(0), |_| {});
    }

    #[test]
    #[should_panic(expected = "Must handle 1 received action(s)")]
    fn sending_with_pending_received_actions_fails() {
        let (mut store, _) = store();

        store.send(CounterAction::Echo(1), |_| {});
        store.send(CounterAction::Increment, |state| state.count = 1);
    }

    #[test]
    #[should_panic(expected = "never asserted on")]
    fn dropping_with_unreceived_actions_fails() {
        let (mut store, _) = store();
        store.send(CounterAction::Echo(1), |_| {});
    }

    #[test]
    fn skip_received_actions_opts_out() {
        let (mut store, _) = store();
        store.send(CounterAction::Echo(1), |_| {});
        store.skip_received_actions();
        store.send(CounterAction::Increment, |state| state.count = 1);
    }

    #[test]
    #[should_panic(expected = "still in flight")]
    fn dropping_with_scheduled_effects_fails() {
        let (mut store, scheduler) = store();

        store.send(CounterAction::IncrementAndSave, |state| state.count = 1);
        scheduler.advance(Duration::from_millis(999));
    }

    #[test]
    fn cancelled_effects_are_not_in_flight() {
        let (mut store, _) = store();

        store.send(CounterAction::IncrementAndSave, |state| state.count = 1);
        assert_eq!(store.pending_effects(), 1);

        store.send(CounterAction::CancelSave, |_| {});
        assert_eq!(store.pending_effects(), 0);
    }

    #[test]
    fn skip_in_flight_effects_opts_out() {
        let (mut store, _) = store();
        store.send(CounterAction::IncrementAndSave, |state| state.count = 1);
        store.skip_in_flight_effects();
    }
}
