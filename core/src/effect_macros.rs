//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when creating time-based `Effect`s, which
//! always need a scheduler and usually a cancellation key.

/// Create an `Effect::Delay` that yields one action after a wait
///
/// # Example
///
/// ```rust,ignore
/// use composable_core::delay;
///
/// delay! {
///     duration: env.timings.navigation_delay,
///     scheduler: env.scheduler,
///     action: OnboardingAction::HomeNavigationDelayCompleted
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        scheduler: $scheduler:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            scheduler: ::std::sync::Arc::clone(&$scheduler),
            effect: ::std::boxed::Box::new($crate::effect::Effect::Just($action)),
        }
    };
}

/// Create a debounced action: a delay registered under `id` that cancels any
/// earlier effect under the same `id`
///
/// # Example
///
/// ```rust,ignore
/// use composable_core::debounce;
///
/// debounce! {
///     id: TODO_COMPLETION_ID,
///     duration: env.timings.sort_debounce,
///     scheduler: env.scheduler,
///     action: TodoListAction::SortCompletedTodos
/// }
/// ```
#[macro_export]
macro_rules! debounce {
    (
        id: $id:expr,
        duration: $duration:expr,
        scheduler: $scheduler:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Cancellable {
            id: $id,
            cancel_in_flight: true,
            effect: ::std::boxed::Box::new($crate::delay! {
                duration: $duration,
                scheduler: $scheduler,
                action: $action
            }),
        }
    };
}
