//! End-to-end flows through the composed application
//!
//! Onboarding and feature routing with the exhaustive `TestStore`, then the
//! whole app on a real `Store` through scoped stores.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use composable_runtime::Store;
use composable_testing::{SequentialUuidGenerator, TestScheduler, TestStore, init_test_tracing};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use todo_app::app::AppFeature;
use todo_app::feature_list::{Feature, FeatureListAction, FeatureListState};
use todo_app::onboarding::{OnboardingAction, OnboardingPage, OnboardingState};
use todo_app::{
    AppAction, AppEnvironment, AppState, Timings, Todo, TodoAction, TodoId, TodoListAction, TodoListState,
    app_reducer,
};
use uuid::Uuid;

// ============================================================================
// Fixtures
// ============================================================================

fn environment(scheduler: &Arc<TestScheduler>) -> AppEnvironment {
    AppEnvironment {
        uuid: Arc::new(SequentialUuidGenerator::new()),
        scheduler: scheduler.clone(),
        timings: Timings::default(),
    }
}

fn test_store(initial: AppState) -> (TestStore<AppFeature>, Arc<TestScheduler>) {
    init_test_tracing();
    let scheduler = Arc::new(TestScheduler::new());
    let store = TestStore::new(app_reducer(), initial, environment(&scheduler));
    (store, scheduler)
}

fn todo_id(n: u128) -> TodoId {
    TodoId::from_uuid(Uuid::from_u128(n))
}

fn onboarding(action: OnboardingAction) -> AppAction {
    AppAction::Onboarding(action)
}

fn todo_list(action: TodoListAction) -> AppAction {
    AppAction::FeatureList(FeatureListAction::TodoList(action))
}

fn todo_list_state(state: &mut AppState) -> &mut TodoListState {
    match state {
        AppState::FeatureList(FeatureListState {
            todo_list: Some(list), ..
        }) => list,
        other => panic!("todo list is not presented: {other:?}"),
    }
}

fn presenting(todos: Vec<Todo>) -> AppState {
    AppState::FeatureList(FeatureListState {
        todo_list: Some(TodoListState::with_todos(todos)),
        search_weather: None,
    })
}

// ============================================================================
// Onboarding and routing
// ============================================================================

#[test]
fn start_and_restart() {
    let (mut store, _) = test_store(AppState::default());

    store.send(onboarding(OnboardingAction::StartButtonTapped), |state| {
        *state = AppState::FeatureList(FeatureListState::default());
    });
    store.send(AppAction::FeatureList(FeatureListAction::RestartButtonTapped), |state| {
        *state = AppState::Onboarding(OnboardingState {
            page: OnboardingPage::Launch,
            ..OnboardingState::default()
        });
    });
}

#[test]
fn home_navigation_waits_for_the_delay() {
    let (mut store, scheduler) = test_store(AppState::default());

    store.send(onboarding(OnboardingAction::SetButtonOffset(0.0)), |_| {});
    store.send(onboarding(OnboardingAction::ToggleAnimation(true)), |state| {
        if let AppState::Onboarding(onboarding) = state {
            onboarding.is_animating = true;
        }
    });
    store.send(onboarding(OnboardingAction::HomeButtonTapped), |_| {});

    scheduler.advance(Duration::from_millis(299));
    assert_eq!(store.pending_received(), 0);

    scheduler.advance(Duration::from_millis(1));
    store.receive(onboarding(OnboardingAction::HomeNavigationDelayCompleted), |state| {
        if let AppState::Onboarding(onboarding) = state {
            onboarding.page = OnboardingPage::Home;
        }
    });

    store.send(onboarding(OnboardingAction::RestartButtonTapped), |state| {
        if let AppState::Onboarding(onboarding) = state {
            onboarding.page = OnboardingPage::Launch;
        }
    });
}

#[test]
fn navigation_arriving_after_start_is_ignored() {
    let (mut store, scheduler) = test_store(AppState::default());

    store.send(onboarding(OnboardingAction::HomeButtonTapped), |_| {});
    store.send(onboarding(OnboardingAction::StartButtonTapped), |state| {
        *state = AppState::FeatureList(FeatureListState::default());
    });

    scheduler.advance(Duration::from_millis(300));
    store.receive(onboarding(OnboardingAction::HomeNavigationDelayCompleted), |_| {});
}

#[test]
fn selecting_and_leaving_the_todo_list() {
    let (mut store, _) = test_store(AppState::FeatureList(FeatureListState::default()));

    store.send(
        AppAction::FeatureList(FeatureListAction::FeatureSelected(Feature::Todo)),
        |state| *state = presenting(Vec::new()),
    );
    store.send(todo_list(TodoListAction::AddButtonTapped), |state| {
        assert!(todo_list_state(state).todos.push(Todo::new(todo_id(1))));
    });
    store.send(AppAction::FeatureList(FeatureListAction::BackButtonTapped), |state| {
        *state = AppState::FeatureList(FeatureListState::default());
    });
}

#[test]
fn leaving_the_todo_list_cancels_pending_sorts() {
    let (mut store, scheduler) = test_store(presenting(vec![
        Todo::new(todo_id(1)).with_description("Milk"),
        Todo::new(todo_id(2)).with_description("Eggs"),
    ]));

    store.send(
        todo_list(TodoListAction::Todo {
            id: todo_id(1),
            action: TodoAction::CheckboxToggled,
        }),
        |state| todo_list_state(state).todos.get_mut(&todo_id(1)).unwrap().completed = true,
    );
    store.send(
        todo_list(TodoListAction::Move {
            source: BTreeSet::from([1]),
            destination: 0,
        }),
        |state| todo_list_state(state).todos.swap(0, 1),
    );

    scheduler.advance(Duration::from_millis(50));
    store.send(AppAction::FeatureList(FeatureListAction::BackButtonTapped), |state| {
        *state = AppState::FeatureList(FeatureListState::default());
    });

    scheduler.advance(Duration::from_secs(5));
    assert_eq!(store.pending_received(), 0);
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn restart_from_the_todo_list_cancels_pending_sorts() {
    let (mut store, scheduler) = test_store(presenting(vec![Todo::new(todo_id(1))]));

    store.send(
        todo_list(TodoListAction::Todo {
            id: todo_id(1),
            action: TodoAction::CheckboxToggled,
        }),
        |state| todo_list_state(state).todos.get_mut(&todo_id(1)).unwrap().completed = true,
    );
    store.send(AppAction::FeatureList(FeatureListAction::RestartButtonTapped), |state| {
        *state = AppState::default();
    });

    scheduler.run();
    assert_eq!(store.pending_received(), 0);
}

// ============================================================================
// Whole app on a real Store
// ============================================================================

#[test]
fn scoped_stores_drive_the_whole_app() {
    init_test_tracing();
    let scheduler = Arc::new(TestScheduler::new());
    let store = Store::new(AppState::default(), app_reducer(), environment(&scheduler));

    let onboarding_store = store.scope(
        |state: &AppState| match state {
            AppState::Onboarding(onboarding) => Some(onboarding.page),
            AppState::FeatureList(_) => None,
        },
        AppAction::Onboarding,
    );
    onboarding_store.send(OnboardingAction::HomeButtonTapped).unwrap();
    scheduler.advance(Duration::from_millis(300));
    assert_eq!(onboarding_store.snapshot(), Some(OnboardingPage::Home));

    onboarding_store.send(OnboardingAction::StartButtonTapped).unwrap();
    assert_eq!(onboarding_store.snapshot(), None);

    let features = store.scope(
        |state: &AppState| match state {
            AppState::FeatureList(features) => Some(features.clone()),
            AppState::Onboarding(_) => None,
        },
        AppAction::FeatureList,
    );
    features.send(FeatureListAction::FeatureSelected(Feature::Todo)).unwrap();

    let todos = features.scope(
        |features: &Option<FeatureListState>| {
            features
                .as_ref()
                .and_then(|f| f.todo_list.as_ref())
                .map(|list| list.todos.iter().map(|t| (t.description.clone(), t.completed)).collect::<Vec<_>>())
        },
        FeatureListAction::TodoList,
    );

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _subscription = todos.subscribe(move |rows: &Option<Vec<(String, bool)>>| {
        sink.lock().unwrap().push(rows.as_ref().map_or(0, Vec::len));
    });

    todos.send(TodoListAction::AddButtonTapped).unwrap();
    todos.send(TodoListAction::AddButtonTapped).unwrap();
    for (n, description) in [(1, "Eggs"), (2, "Milk")] {
        todos
            .send(TodoListAction::Todo {
                id: todo_id(n),
                action: TodoAction::TextFieldChanged(description.to_string()),
            })
            .unwrap();
    }
    todos
        .send(TodoListAction::Todo {
            id: todo_id(2),
            action: TodoAction::CheckboxToggled,
        })
        .unwrap();

    assert_eq!(
        todos.snapshot(),
        Some(vec![("Milk".to_string(), true), ("Eggs".to_string(), false)])
    );

    scheduler.advance(Duration::from_secs(1));
    assert_eq!(
        todos.snapshot(),
        Some(vec![("Eggs".to_string(), false), ("Milk".to_string(), true)])
    );
    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 2, 2, 2, 2]);

    features.send(FeatureListAction::RestartButtonTapped).unwrap();
    assert_eq!(store.snapshot(), AppState::default());
}
