//! Onboarding: a launch page with a slide-to-start button, then a home page.

use composable_core::environment::Scheduler;
use composable_core::{Effects, Reducer, delay, smallvec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Which onboarding page is shown
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnboardingPage {
    /// The launch page with the slide-to-start button
    #[default]
    Launch,
    /// The home page offering start and restart
    Home,
}

/// State of the onboarding flow
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OnboardingState {
    /// Current page
    pub page: OnboardingPage,
    /// Horizontal drag offset of the start button, in points
    pub button_offset: f64,
    /// Whether the entrance animation is running
    pub is_animating: bool,
}

/// Actions of the onboarding flow
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum OnboardingAction {
    /// Start button tapped or slid past halfway
    HomeButtonTapped,
    /// The navigation delay after [`HomeButtonTapped`](Self::HomeButtonTapped) elapsed
    HomeNavigationDelayCompleted,
    /// Leave onboarding for the feature list (handled by the app reducer)
    StartButtonTapped,
    /// Back to the launch page
    RestartButtonTapped,
    /// The start button was dragged
    SetButtonOffset(f64),
    /// Start or stop the entrance animation
    ToggleAnimation(bool),
}

/// Dependencies of the onboarding flow
#[derive(Clone)]
pub struct OnboardingEnvironment {
    /// Scheduler for the navigation delay
    pub scheduler: Arc<dyn Scheduler>,
    /// Wait between tapping the start button and showing the home page
    pub navigation_delay: Duration,
}

/// Reducer for the onboarding flow
#[derive(Clone, Copy, Debug, Default)]
pub struct OnboardingReducer;

impl Reducer for OnboardingReducer {
    type State = OnboardingState;
    type Action = OnboardingAction;
    type Environment = OnboardingEnvironment;

    fn reduce(
        &self,
        state: &mut OnboardingState,
        action: OnboardingAction,
        env: &OnboardingEnvironment,
    ) -> Effects<OnboardingAction> {
        match action {
            OnboardingAction::HomeButtonTapped => smallvec![delay! {
                duration: env.navigation_delay,
                scheduler: env.scheduler,
                action: OnboardingAction::HomeNavigationDelayCompleted
            }],
            OnboardingAction::HomeNavigationDelayCompleted => {
                state.page = OnboardingPage::Home;
                Effects::new()
            },
            OnboardingAction::StartButtonTapped => Effects::new(),
            OnboardingAction::RestartButtonTapped => {
                state.page = OnboardingPage::Launch;
                Effects::new()
            },
            OnboardingAction::SetButtonOffset(offset) => {
                state.button_offset = offset;
                Effects::new()
            },
            OnboardingAction::ToggleAnimation(animating) => {
                state.is_animating = animating;
                Effects::new()
            },
        }
    }
}
