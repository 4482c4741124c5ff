//! Effect interpretation.
//!
//! [`EffectExecutor`] turns [`Effect`] descriptions into work: immediate actions
//! are delivered synchronously, delays are handed to the scheduler carried by the
//! effect, and cancellation is keyed by [`EffectId`]. Cancellation is cooperative:
//! a cancelled timer still fires, notices its token and drops its payload.
//!
//! The executor never holds one of its own locks while delivering an action or
//! calling into a scheduler, so a sink may re-enter it freely.

use crate::metrics::EffectMetrics;
use composable_core::{Effect, EffectId};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Destination for actions produced by effects
pub trait ActionSink<A>: Send + Sync {
    /// Receive one action
    fn deliver(&self, action: A);
}

/// Called once an effect (and everything it spawned) has finished or been cancelled
type Completion = Box<dyn FnOnce() + Send + 'static>;

/// Cancellation flag shared by an effect and its registration
#[derive(Debug, Default)]
struct CancellationToken {
    cancelled: AtomicBool,
}

impl CancellationToken {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Every `Cancellable` an effect is nested in
type Scope = Vec<Arc<CancellationToken>>;

fn is_cancelled(scope: &Scope) -> bool {
    scope.iter().any(|token| token.is_cancelled())
}

/// Interprets effects and feeds their actions to a sink
pub struct EffectExecutor<A> {
    sink: Weak<dyn ActionSink<A>>,
    in_flight: Mutex<HashMap<EffectId, Vec<Arc<CancellationToken>>>>,
    /// Delays handed to a scheduler that have not fired yet
    timers: Mutex<HashMap<u64, Scope>>,
    next_timer: AtomicU64,
}

impl<A> EffectExecutor<A>
where
    A: Send + 'static,
{
    /// Create an executor delivering to `sink`
    ///
    /// The sink is held weakly: once it is dropped, produced actions are discarded.
    #[must_use]
    pub fn new(sink: Weak<dyn ActionSink<A>>) -> Self {
        Self {
            sink,
            in_flight: Mutex::new(HashMap::new()),
            timers: Mutex::new(HashMap::new()),
            next_timer: AtomicU64::new(0),
        }
    }

    /// Start executing an effect
    pub fn execute(self: &Arc<Self>, effect: Effect<A>) {
        self.run(effect, Vec::new(), Box::new(|| {}));
    }

    /// Cancel every in-flight effect registered under `id`
    ///
    /// Returns how many registrations were cancelled; zero when nothing was in flight.
    pub fn cancel(&self, id: EffectId) -> usize {
        let tokens = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .unwrap_or_default();

        for token in &tokens {
            token.cancel();
        }
        if !tokens.is_empty() {
            tracing::trace!(id = %id, count = tokens.len(), "Cancelled in-flight effects");
            EffectMetrics::record_cancelled(tokens.len());
        }
        tokens.len()
    }

    /// Cancel everything in flight
    pub fn cancel_all(&self) -> usize {
        let registrations: Vec<_> = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();

        let mut count = 0;
        for (_, tokens) in registrations {
            for token in tokens {
                token.cancel();
                count += 1;
            }
        }
        if count > 0 {
            EffectMetrics::record_cancelled(count);
        }
        count
    }

    /// Number of live registrations under `id`
    #[must_use]
    pub fn in_flight_count(&self, id: EffectId) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .map_or(0, Vec::len)
    }

    /// Number of scheduled delays that have neither fired nor been cancelled
    ///
    /// Anything counted here can still produce actions.
    #[must_use]
    pub fn pending_effects(&self) -> usize {
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|scope| !is_cancelled(scope))
            .count()
    }

    fn deliver(&self, action: A) {
        if let Some(sink) = self.sink.upgrade() {
            sink.deliver(action);
        } else {
            tracing::debug!("Effect produced an action after its store was dropped");
            EffectMetrics::record_dropped();
        }
    }

    fn run(self: &Arc<Self>, effect: Effect<A>, scope: Scope, done: Completion) {
        match effect {
            Effect::None => {
                EffectMetrics::record_executed("none");
                done();
            },
            Effect::Just(action) => {
                EffectMetrics::record_executed("just");
                if is_cancelled(&scope) {
                    tracing::trace!("Dropping action from a cancelled effect");
                } else {
                    self.deliver(action);
                }
                done();
            },
            Effect::Parallel(effects) => {
                tracing::trace!("Executing Effect::Parallel with {} effects", effects.len());
                EffectMetrics::record_executed("parallel");
                self.run_parallel(effects, &scope, done);
            },
            Effect::Sequential(effects) => {
                tracing::trace!("Executing Effect::Sequential with {} effects", effects.len());
                EffectMetrics::record_executed("sequential");
                self.run_sequential(effects.into(), scope, done);
            },
            Effect::Delay {
                duration,
                scheduler,
                effect,
            } => {
                tracing::trace!("Scheduling Effect::Delay (duration: {:?})", duration);
                EffectMetrics::record_executed("delay");
                let timer = self.next_timer.fetch_add(1, Ordering::Relaxed);
                self.timers
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(timer, scope.clone());

                let executor = Arc::clone(self);
                scheduler.schedule_after(
                    duration,
                    Box::new(move || {
                        executor
                            .timers
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .remove(&timer);
                        if is_cancelled(&scope) {
                            tracing::trace!("Delayed effect fired after cancellation");
                            done();
                        } else {
                            executor.run(*effect, scope, done);
                        }
                    }),
                );
            },
            Effect::Cancellable {
                id,
                cancel_in_flight,
                effect,
            } => {
                EffectMetrics::record_executed("cancellable");
                if cancel_in_flight {
                    self.cancel(id);
                }

                let token = Arc::new(CancellationToken::default());
                self.in_flight
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .entry(id)
                    .or_default()
                    .push(Arc::clone(&token));

                let mut scope = scope;
                scope.push(Arc::clone(&token));

                let executor = Arc::downgrade(self);
                self.run(
                    *effect,
                    scope,
                    Box::new(move || {
                        if let Some(executor) = executor.upgrade() {
                            executor.release(id, &token);
                        }
                        done();
                    }),
                );
            },
            Effect::Cancel(id) => {
                EffectMetrics::record_executed("cancel");
                self.cancel(id);
                done();
            },
        }
    }

    fn run_parallel(self: &Arc<Self>, effects: Vec<Effect<A>>, scope: &Scope, done: Completion) {
        if effects.is_empty() {
            done();
            return;
        }

        let remaining = Arc::new(AtomicUsize::new(effects.len()));
        let done = Arc::new(Mutex::new(Some(done)));
        for effect in effects {
            let remaining = Arc::clone(&remaining);
            let done = Arc::clone(&done);
            self.run(
                effect,
                scope.clone(),
                Box::new(move || {
                    if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                        let done = done.lock().unwrap_or_else(PoisonError::into_inner).take();
                        if let Some(done) = done {
                            done();
                        }
                    }
                }),
            );
        }
    }

    fn run_sequential(self: &Arc<Self>, mut effects: VecDeque<Effect<A>>, scope: Scope, done: Completion) {
        let Some(first) = effects.pop_front() else {
            done();
            return;
        };

        let executor = Arc::clone(self);
        let rest_scope = scope.clone();
        self.run(
            first,
            scope,
            Box::new(move || executor.run_sequential(effects, rest_scope, done)),
        );
    }

    /// Drop a finished registration; a registration already removed by `cancel` is left alone
    fn release(&self, id: EffectId, token: &Arc<CancellationToken>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tokens) = in_flight.get_mut(&id) {
            tokens.retain(|registered| !Arc::ptr_eq(registered, token));
            if tokens.is_empty() {
                in_flight.remove(&id);
            }
        }
    }
}
