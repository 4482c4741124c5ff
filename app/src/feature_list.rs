//! The feature picker and the features it presents.
//!
//! Selecting a feature creates its state; going back drops it. The todo list
//! keeps delayed sorts in flight, so leaving the list cancels them before its
//! state disappears.

use crate::config::Timings;
use crate::todo_list::{
    SORT_AFTER_MOVE_ID, TODO_COMPLETION_ID, TodoListAction, TodoListEnvironment, TodoListState,
    todo_list_reducer,
};
use composable_core::composition::{CombinedReducer, DebugReducer, combine_reducers};
use composable_core::environment::{Scheduler, UuidGenerator};
use composable_core::{Effect, Effects, Reducer, ReducerExt, smallvec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Features offered by the list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    /// The todo list
    Todo,
    /// Weather search
    SearchWeather,
}

impl Feature {
    /// Every feature, in display order
    pub const ALL_CASES: [Self; 2] = [Self::Todo, Self::SearchWeather];

    /// Title shown in the list
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Todo => "Todo",
            Self::SearchWeather => "Search Weather",
        }
    }
}

/// State of the weather search screen
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchWeatherState {
    /// Text typed into the search field
    pub query: String,
}

/// Actions of the weather search screen
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchWeatherAction {
    /// The search field changed
    QueryChanged(String),
}

/// Reducer for the weather search screen
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchWeatherReducer;

impl Reducer for SearchWeatherReducer {
    type State = SearchWeatherState;
    type Action = SearchWeatherAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut SearchWeatherState,
        action: SearchWeatherAction,
        _env: &(),
    ) -> Effects<SearchWeatherAction> {
        match action {
            SearchWeatherAction::QueryChanged(query) => state.query = query,
        }
        Effects::new()
    }
}

/// State of the feature list
///
/// At most one feature is presented at a time in practice, but nothing here
/// depends on it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureListState {
    /// The todo list, while presented
    pub todo_list: Option<TodoListState>,
    /// Weather search, while presented
    pub search_weather: Option<SearchWeatherState>,
}

/// Actions of the feature list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureListAction {
    /// Present a feature
    FeatureSelected(Feature),
    /// Dismiss whatever is presented
    BackButtonTapped,
    /// Return to onboarding (handled by the app reducer)
    RestartButtonTapped,
    /// An action of the presented todo list
    TodoList(TodoListAction),
    /// An action of the presented weather search
    SearchWeather(SearchWeatherAction),
}

/// Dependencies of the feature list
#[derive(Clone)]
pub struct FeatureListEnvironment {
    /// Source of new todo ids
    pub uuid: Arc<dyn UuidGenerator>,
    /// Scheduler for delayed effects
    pub scheduler: Arc<dyn Scheduler>,
    /// Effect timings
    pub timings: Timings,
}

impl FeatureListEnvironment {
    /// Environment of the todo list
    #[must_use]
    pub fn todo_list(&self) -> TodoListEnvironment {
        TodoListEnvironment {
            uuid: Arc::clone(&self.uuid),
            scheduler: Arc::clone(&self.scheduler),
            timings: self.timings,
        }
    }
}

/// Presentation logic of the feature list
///
/// Use [`feature_list_reducer`] for the full feature, including the presented
/// features' reducers.
#[derive(Clone, Copy, Debug, Default)]
pub struct FeatureListReducer;

impl Reducer for FeatureListReducer {
    type State = FeatureListState;
    type Action = FeatureListAction;
    type Environment = FeatureListEnvironment;

    fn reduce(
        &self,
        state: &mut FeatureListState,
        action: FeatureListAction,
        _env: &FeatureListEnvironment,
    ) -> Effects<FeatureListAction> {
        match action {
            FeatureListAction::FeatureSelected(Feature::Todo) => {
                state.todo_list = Some(TodoListState::default());
                Effects::new()
            },
            FeatureListAction::FeatureSelected(Feature::SearchWeather) => {
                state.search_weather = Some(SearchWeatherState::default());
                Effects::new()
            },
            FeatureListAction::BackButtonTapped => {
                state.todo_list = None;
                state.search_weather = None;
                cancel_todo_effects()
            },
            FeatureListAction::RestartButtonTapped => cancel_todo_effects(),
            FeatureListAction::TodoList(_) | FeatureListAction::SearchWeather(_) => Effects::new(),
        }
    }
}

fn cancel_todo_effects() -> Effects<FeatureListAction> {
    smallvec![
        Effect::cancel(TODO_COMPLETION_ID),
        Effect::cancel(SORT_AFTER_MOVE_ID)
    ]
}

/// Concrete type of the assembled feature list reducer
pub type FeatureListFeature =
    DebugReducer<CombinedReducer<FeatureListState, FeatureListAction, FeatureListEnvironment>>;

/// The feature list with the todo list and weather search lifted into it
///
/// Every action and resulting state is logged under the `feature_list` label.
#[must_use]
pub fn feature_list_reducer() -> FeatureListFeature {
    combine_reducers(vec![
        todo_list_reducer()
            .optional()
            .pullback(
                todo_list_state,
                todo_list_action,
                FeatureListAction::TodoList,
                FeatureListEnvironment::todo_list,
            )
            .boxed(),
        SearchWeatherReducer
            .optional()
            .pullback(
                search_weather_state,
                search_weather_action,
                FeatureListAction::SearchWeather,
                search_weather_environment,
            )
            .boxed(),
        FeatureListReducer.boxed(),
    ])
    .debug("feature_list")
}

#[allow(clippy::unnecessary_wraps)] // Shape required by pullback
fn todo_list_state(state: &mut FeatureListState) -> Option<&mut Option<TodoListState>> {
    Some(&mut state.todo_list)
}

fn todo_list_action(action: FeatureListAction) -> Option<TodoListAction> {
    match action {
        FeatureListAction::TodoList(action) => Some(action),
        _ => None,
    }
}

#[allow(clippy::unnecessary_wraps)] // Shape required by pullback
fn search_weather_state(state: &mut FeatureListState) -> Option<&mut Option<SearchWeatherState>> {
    Some(&mut state.search_weather)
}

fn search_weather_action(action: FeatureListAction) -> Option<SearchWeatherAction> {
    match action {
        FeatureListAction::SearchWeather(action) => Some(action),
        _ => None,
    }
}

const fn search_weather_environment(_env: &FeatureListEnvironment) {}

#[cfg(test)]
mod tests {
    use super::*;
    use composable_testing::{ReducerTest, SequentialUuidGenerator, TestScheduler, assertions};

    fn env() -> FeatureListEnvironment {
        FeatureListEnvironment {
            uuid: Arc::new(SequentialUuidGenerator::new()),
            scheduler: Arc::new(TestScheduler::new()),
            timings: Timings::default(),
        }
    }

    #[test]
    fn selecting_a_feature_presents_it() {
        ReducerTest::new(feature_list_reducer())
            .with_env(env())
            .given_state(FeatureListState::default())
            .when_action(FeatureListAction::FeatureSelected(Feature::Todo))
            .then_state(|state| {
                assert_eq!(state.todo_list, Some(TodoListState::default()));
                assert_eq!(state.search_weather, None);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn presented_todo_list_receives_its_actions() {
        ReducerTest::new(feature_list_reducer())
            .with_env(env())
            .given_state(FeatureListState::default())
            .when_action(FeatureListAction::FeatureSelected(Feature::Todo))
            .when_action(FeatureListAction::TodoList(TodoListAction::AddButtonTapped))
            .then_state(|state| {
                assert_eq!(state.todo_list.as_ref().map(|list| list.todos.len()), Some(1));
            })
            .run();
    }

    #[test]
    fn back_dismisses_and_cancels_todo_effects() {
        ReducerTest::new(feature_list_reducer())
            .with_env(env())
            .given_state(FeatureListState {
                todo_list: Some(TodoListState::default()),
                search_weather: Some(SearchWeatherState::default()),
            })
            .when_action(FeatureListAction::BackButtonTapped)
            .then_state(|state| assert_eq!(*state, FeatureListState::default()))
            .then_effects(|effects| {
                assertions::assert_has_cancel_effect(effects, TODO_COMPLETION_ID);
                assertions::assert_has_cancel_effect(effects, SORT_AFTER_MOVE_ID);
            })
            .run();
    }

    #[test]
    fn restart_cancels_todo_effects_and_keeps_state() {
        ReducerTest::new(feature_list_reducer())
            .with_env(env())
            .given_state(FeatureListState::default())
            .when_action(FeatureListAction::RestartButtonTapped)
            .then_state(|state| assert_eq!(*state, FeatureListState::default()))
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 2);
                assertions::assert_has_cancel_effect(effects, TODO_COMPLETION_ID);
            })
            .run();
    }

    #[test]
    fn weather_query_is_stored() {
        ReducerTest::new(feature_list_reducer())
            .with_env(env())
            .given_state(FeatureListState::default())
            .when_action(FeatureListAction::FeatureSelected(Feature::SearchWeather))
            .when_action(FeatureListAction::SearchWeather(SearchWeatherAction::QueryChanged(
                "Istanbul".to_string(),
            )))
            .then_state(|state| {
                assert_eq!(
                    state.search_weather.as_ref().map(|s| s.query.as_str()),
                    Some("Istanbul")
                );
            })
            .run();
    }

    #[test]
    #[should_panic(expected = "while its state was absent")]
    fn todo_action_without_a_todo_list_is_a_programming_error() {
        ReducerTest::new(feature_list_reducer())
            .with_env(env())
            .given_state(FeatureListState::default())
            .when_action(FeatureListAction::TodoList(TodoListAction::AddButtonTapped))
            .run();
    }

    #[test]
    fn titles() {
        let titles: Vec<_> = Feature::ALL_CASES.iter().map(|f| f.title()).collect();
        assert_eq!(titles, vec!["Todo", "Search Weather"]);
    }
}
