//! The application root: onboarding first, then the feature list.

use crate::config::Timings;
use crate::feature_list::{FeatureListAction, FeatureListEnvironment, FeatureListState, feature_list_reducer};
use crate::onboarding::{OnboardingAction, OnboardingEnvironment, OnboardingReducer, OnboardingState};
use composable_core::composition::{CombinedReducer, combine_reducers};
use composable_core::environment::{Scheduler, UuidGenerator, V4UuidGenerator};
use composable_core::{Effects, Reducer, ReducerExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Root state: exactly one of the two flows is on screen
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AppState {
    /// The onboarding flow
    Onboarding(OnboardingState),
    /// The feature list
    FeatureList(FeatureListState),
}

impl Default for AppState {
    fn default() -> Self {
        Self::Onboarding(OnboardingState::default())
    }
}

/// Root actions
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AppAction {
    /// An onboarding action
    Onboarding(OnboardingAction),
    /// A feature list action
    FeatureList(FeatureListAction),
}

/// Root dependencies, narrowed for each feature
#[derive(Clone)]
pub struct AppEnvironment {
    /// Source of new todo ids
    pub uuid: Arc<dyn UuidGenerator>,
    /// Scheduler for every delayed effect
    pub scheduler: Arc<dyn Scheduler>,
    /// Effect timings
    pub timings: Timings,
}

impl AppEnvironment {
    /// Production dependencies on `scheduler`: random ids
    #[must_use]
    pub fn live(scheduler: Arc<dyn Scheduler>, timings: Timings) -> Self {
        Self {
            uuid: Arc::new(V4UuidGenerator),
            scheduler,
            timings,
        }
    }

    /// Environment of the onboarding flow
    #[must_use]
    pub fn onboarding(&self) -> OnboardingEnvironment {
        OnboardingEnvironment {
            scheduler: Arc::clone(&self.scheduler),
            navigation_delay: self.timings.navigation_delay,
        }
    }

    /// Environment of the feature list
    #[must_use]
    pub fn feature_list(&self) -> FeatureListEnvironment {
        FeatureListEnvironment {
            uuid: Arc::clone(&self.uuid),
            scheduler: Arc::clone(&self.scheduler),
            timings: self.timings,
        }
    }
}

/// Transitions between the two flows
///
/// Runs after the feature reducers, so each feature sees its own action before
/// its state is replaced.
#[derive(Clone, Copy, Debug, Default)]
pub struct AppReducer;

impl Reducer for AppReducer {
    type State = AppState;
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn reduce(&self, state: &mut AppState, action: AppAction, _env: &AppEnvironment) -> Effects<AppAction> {
        match action {
            AppAction::Onboarding(OnboardingAction::StartButtonTapped) => {
                tracing::info!("Onboarding finished");
                *state = AppState::FeatureList(FeatureListState::default());
            },
            AppAction::FeatureList(FeatureListAction::RestartButtonTapped) => {
                tracing::info!("Restarting onboarding");
                *state = AppState::Onboarding(OnboardingState::default());
            },
            AppAction::Onboarding(_) | AppAction::FeatureList(_) => {},
        }
        Effects::new()
    }
}

/// Concrete type of the assembled app reducer
pub type AppFeature = CombinedReducer<AppState, AppAction, AppEnvironment>;

/// The whole application: both flows lifted into the root, then the transitions
#[must_use]
pub fn app_reducer() -> AppFeature {
    combine_reducers(vec![
        OnboardingReducer
            .pullback(
                onboarding_state,
                onboarding_action,
                AppAction::Onboarding,
                AppEnvironment::onboarding,
            )
            .boxed(),
        feature_list_reducer()
            .pullback(
                feature_list_state,
                feature_list_action,
                AppAction::FeatureList,
                AppEnvironment::feature_list,
            )
            .boxed(),
        AppReducer.boxed(),
    ])
}

fn onboarding_state(state: &mut AppState) -> Option<&mut OnboardingState> {
    match state {
        AppState::Onboarding(onboarding) => Some(onboarding),
        AppState::FeatureList(_) => None,
    }
}

fn onboarding_action(action: AppAction) -> Option<OnboardingAction> {
    match action {
        AppAction::Onboarding(action) => Some(action),
        AppAction::FeatureList(_) => None,
    }
}

fn feature_list_state(state: &mut AppState) -> Option<&mut FeatureListState> {
    match state {
        AppState::FeatureList(feature_list) => Some(feature_list),
        AppState::Onboarding(_) => None,
    }
}

fn feature_list_action(action: AppAction) -> Option<FeatureListAction> {
    match action {
        AppAction::FeatureList(action) => Some(action),
        AppAction::Onboarding(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::OnboardingPage;
    use composable_testing::{ReducerTest, SequentialUuidGenerator, TestScheduler, assertions};

    fn env() -> AppEnvironment {
        AppEnvironment {
            uuid: Arc::new(SequentialUuidGenerator::new()),
            scheduler: Arc::new(TestScheduler::new()),
            timings: Timings::default(),
        }
    }

    #[test]
    fn starts_in_onboarding_launch() {
        assert_eq!(
            AppState::default(),
            AppState::Onboarding(OnboardingState {
                page: OnboardingPage::Launch,
                ..OnboardingState::default()
            })
        );
    }

    #[test]
    fn start_enters_the_feature_list() {
        ReducerTest::new(app_reducer())
            .with_env(env())
            .given_state(AppState::default())
            .when_action(AppAction::Onboarding(OnboardingAction::StartButtonTapped))
            .then_state(|state| assert_eq!(*state, AppState::FeatureList(FeatureListState::default())))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn restart_returns_to_onboarding() {
        ReducerTest::new(app_reducer())
            .with_env(env())
            .given_state(AppState::FeatureList(FeatureListState::default()))
            .when_action(AppAction::FeatureList(FeatureListAction::RestartButtonTapped))
            .then_state(|state| assert_eq!(*state, AppState::default()))
            .then_effects(|effects| assertions::assert_effects_count(effects, 2))
            .run();
    }

    #[test]
    fn actions_for_the_hidden_flow_are_ignored() {
        ReducerTest::new(app_reducer())
            .with_env(env())
            .given_state(AppState::FeatureList(FeatureListState::default()))
            .when_action(AppAction::Onboarding(OnboardingAction::HomeNavigationDelayCompleted))
            .then_state(|state| assert_eq!(*state, AppState::FeatureList(FeatureListState::default())))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn environment_narrowing_shares_the_scheduler() {
        let env = env();
        let onboarding = env.onboarding();
        let feature_list = env.feature_list();

        assert!(Arc::ptr_eq(&env.scheduler, &onboarding.scheduler));
        assert!(Arc::ptr_eq(&env.scheduler, &feature_list.todo_list().scheduler));
        assert_eq!(onboarding.navigation_delay, env.timings.navigation_delay);
    }
}
