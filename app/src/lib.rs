//! Todo application built from composable reducers.
//!
//! Three features are composed into one state tree:
//!
//! - [`onboarding`]: launch and home pages, with a delayed navigation
//! - [`feature_list`]: a picker presenting the todo list or weather search
//! - [`todo_list`]: todos with filtering, reordering and debounced sorting
//!
//! [`app::app_reducer`] lifts the features into [`AppState`] with `pullback`,
//! `optional` and `for_each`; the runtime `Store` drives it.
//!
//! # Quick Start
//!
//! ```
//! use composable_runtime::Store;
//! use composable_testing::{SequentialUuidGenerator, TestScheduler};
//! use std::sync::Arc;
//! use std::time::Duration;
//! use todo_app::{AppAction, AppEnvironment, AppState, app_reducer};
//! use todo_app::feature_list::{Feature, FeatureListAction};
//! use todo_app::onboarding::OnboardingAction;
//! use todo_app::todo_list::TodoListAction;
//!
//! let scheduler = Arc::new(TestScheduler::new());
//! let env = AppEnvironment {
//!     uuid: Arc::new(SequentialUuidGenerator::new()),
//!     scheduler: scheduler.clone(),
//!     timings: Default::default(),
//! };
//! let store = Store::new(AppState::default(), app_reducer(), env);
//!
//! store.send(AppAction::Onboarding(OnboardingAction::StartButtonTapped)).unwrap();
//! store.send(AppAction::FeatureList(FeatureListAction::FeatureSelected(Feature::Todo))).unwrap();
//! store.send(AppAction::FeatureList(FeatureListAction::TodoList(TodoListAction::AddButtonTapped))).unwrap();
//! scheduler.advance(Duration::from_secs(1));
//!
//! assert!(matches!(store.snapshot(), AppState::FeatureList(_)));
//! ```

pub mod app;
pub mod config;
pub mod feature_list;
pub mod onboarding;
pub mod todo;
pub mod todo_list;

// Re-export commonly used types
pub use app::{AppAction, AppEnvironment, AppState, app_reducer};
pub use config::{AppConfig, ConfigError, Timings};
pub use todo::{Todo, TodoAction, TodoId};
pub use todo_list::{Filter, TodoListAction, TodoListState};
