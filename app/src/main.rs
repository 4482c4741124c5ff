//! Scripted walkthrough of the todo application.
//!
//! Drives the app the way the screens would: through scoped stores, on a real
//! tokio scheduler, then prints the final state as JSON.

use anyhow::Context;
use composable_runtime::metrics::describe_metrics;
use composable_runtime::{Store, StoreConfig, TokioScheduler};
use std::sync::Arc;
use std::time::Duration;
use todo_app::feature_list::{Feature, FeatureListAction, FeatureListState};
use todo_app::onboarding::{OnboardingAction, OnboardingState};
use todo_app::{AppAction, AppConfig, AppEnvironment, AppState, TodoAction, TodoListAction, TodoListState, app_reducer};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

/// Upper bound on waiting for a delayed effect
const EFFECT_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    tracing::info!(timings = ?config.timings, "Starting todo app walkthrough");
    describe_metrics();

    let scheduler = Arc::new(TokioScheduler::try_current()?);
    let store = Store::with_config(
        AppState::default(),
        app_reducer(),
        AppEnvironment::live(scheduler, config.timings),
        StoreConfig::default().with_label("app"),
    );
    let mut actions = store.subscribe_actions();

    // Onboarding
    let onboarding = store.scope(
        |state: &AppState| match state {
            AppState::Onboarding(onboarding) => Some(onboarding.clone()),
            AppState::FeatureList(_) => None,
        },
        AppAction::Onboarding,
    );
    let page_changes = onboarding.subscribe(|state: &Option<OnboardingState>| {
        if let Some(state) = state {
            tracing::debug!(page = ?state.page, "Onboarding state");
        }
    });

    onboarding.send(OnboardingAction::ToggleAnimation(true))?;
    onboarding.send(OnboardingAction::SetButtonOffset(240.0))?;
    onboarding.send(OnboardingAction::HomeButtonTapped)?;
    wait_for(
        &mut actions,
        &AppAction::Onboarding(OnboardingAction::HomeNavigationDelayCompleted),
    )
    .await?;
    println!("Onboarding page: {:?}", onboarding.snapshot().map(|state| state.page));

    onboarding.send(OnboardingAction::StartButtonTapped)?;
    page_changes.unsubscribe();

    // Feature list
    let features = store.scope(
        |state: &AppState| match state {
            AppState::FeatureList(features) => Some(features.clone()),
            AppState::Onboarding(_) => None,
        },
        AppAction::FeatureList,
    );
    features.send(FeatureListAction::FeatureSelected(Feature::Todo))?;
    println!("Presenting: {}", Feature::Todo.title());

    // Todo list
    let todos = features.scope(
        |features: &Option<FeatureListState>| features.as_ref().and_then(|f| f.todo_list.clone()),
        FeatureListAction::TodoList,
    );
    let _count_changes = todos.subscribe(|list: &Option<TodoListState>| {
        if let Some(list) = list {
            tracing::debug!(todos = list.todos.len(), "Todo list state");
        }
    });

    for description in ["Eggs", "Milk", "Bread"] {
        todos.send(TodoListAction::AddButtonTapped)?;
        let id = todos
            .state(|list| list.as_ref().and_then(|list| list.todos.ids().first().copied()))
            .context("todo list is not presented")?;
        todos.send(TodoListAction::Todo {
            id,
            action: TodoAction::TextFieldChanged(description.to_string()),
        })?;
    }

    let bread = todos
        .state(|list| list.as_ref().and_then(|list| list.todos.ids().first().copied()))
        .context("todo list is not presented")?;
    todos.send(TodoListAction::Todo {
        id: bread,
        action: TodoAction::CheckboxToggled,
    })?;
    wait_for(
        &mut actions,
        &AppAction::FeatureList(FeatureListAction::TodoList(TodoListAction::SortCompletedTodos)),
    )
    .await?;

    if let Some(list) = todos.snapshot() {
        println!("Todos after sorting:");
        for todo in list.todos.iter() {
            let status = if todo.completed { "✓" } else { " " };
            println!("  [{status}] {}", todo.description);
        }
    }

    println!("\nFinal state:\n{}", serde_json::to_string_pretty(&store.snapshot())?);

    store.shutdown();
    Ok(())
}

/// Wait until the store broadcasts `expected`
async fn wait_for(actions: &mut broadcast::Receiver<AppAction>, expected: &AppAction) -> anyhow::Result<()> {
    tokio::time::timeout(EFFECT_TIMEOUT, async {
        loop {
            match actions.recv().await {
                Ok(action) if action == *expected => return Ok(()),
                Ok(_) => {},
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Action receiver lagged");
                },
                Err(error) => return Err(anyhow::Error::from(error)),
            }
        }
    })
    .await
    .with_context(|| format!("timed out waiting for {expected:?}"))?
}
