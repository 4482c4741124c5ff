//! The Store: runtime shell around one (state, reducer, environment) triple.
//!
//! # Dispatch model
//!
//! Every action goes through one FIFO mailbox. The first `send` to find the
//! mailbox idle becomes its owner and drains it: for each queued action it
//! reduces under the state lock, commits, notifies subscribers outside the
//! lock, broadcasts effect-produced actions, then starts the returned effects.
//!
//! A `send` issued on the owning thread while it drains (from a subscriber or
//! an immediate effect) only enqueues and returns; the running drain picks it
//! up after the current action has committed and notified. A `send` from any
//! other thread enqueues and then blocks until its own action has been
//! processed. Reducer invocations are therefore never reentrant, and
//! effect-produced actions are processed in the order they were produced.

use crate::error::StoreError;
use crate::executor::{ActionSink, EffectExecutor};
use crate::metrics::StoreMetrics;
use crate::StoreConfig;
use composable_core::{EffectId, Reducer};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, ThreadId};
use std::time::Instant;
use tokio::sync::broadcast;

type Observer<S> = Arc<dyn Fn(&S) + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Queued<A> {
    action: A,
    /// Produced by an effect rather than sent directly
    from_effect: bool,
}

struct Mailbox<A> {
    queue: VecDeque<Queued<A>>,
    /// Thread currently draining the queue
    owner: Option<ThreadId>,
    /// Tickets handed out, one per enqueued action
    enqueued: u64,
    /// Actions reduced, notified and with their effects started
    processed: u64,
}

/// Hands the mailbox back if a reducer or subscriber panics mid-drain
///
/// Only the panicking action is lost. Whatever is still queued stays queued
/// and is drained by the next sender.
struct DrainGuard<'a, A> {
    mailbox: &'a Mutex<Mailbox<A>>,
    progress: &'a Condvar,
    label: &'a str,
}

impl<A> Drop for DrainGuard<'_, A> {
    fn drop(&mut self) {
        if !thread::panicking() {
            return;
        }
        let mut mailbox = lock(self.mailbox);
        mailbox.processed += 1;
        mailbox.owner = None;
        tracing::error!(
            store = %self.label,
            queued = mailbox.queue.len(),
            "Action panicked during dispatch, mailbox released"
        );
        drop(mailbox);
        self.progress.notify_all();
    }
}

struct StoreInner<S, A, E, R> {
    state: Mutex<S>,
    reducer: R,
    environment: E,
    mailbox: Mutex<Mailbox<A>>,
    /// Signalled whenever `Mailbox::processed` advances or the owner leaves
    progress: Condvar,
    observers: Mutex<Vec<(u64, Observer<S>)>>,
    next_observer: AtomicU64,
    executor: Arc<EffectExecutor<A>>,
    shutdown: AtomicBool,
    /// Actions produced by effects, for observers outside the state tree
    action_broadcast: broadcast::Sender<A>,
    label: String,
}

impl<S, A, E, R> StoreInner<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: Send + Clone + 'static,
    S: Send + Clone + 'static,
    E: Send + Sync + 'static,
{
    fn dispatch(&self, action: A, from_effect: bool) {
        let current = thread::current().id();
        let mut mailbox = lock(&self.mailbox);
        let ticket = mailbox.enqueued;
        mailbox.enqueued += 1;
        mailbox.queue.push_back(Queued { action, from_effect });

        loop {
            let owner = mailbox.owner;
            match owner {
                Some(owner) if owner == current => {
                    tracing::trace!(store = %self.label, "Queued action behind the running dispatch");
                    return;
                },
                _ if mailbox.processed > ticket => return,
                Some(_) => {
                    tracing::trace!(store = %self.label, "Waiting for dispatch on another thread");
                    mailbox = self
                        .progress
                        .wait(mailbox)
                        .unwrap_or_else(PoisonError::into_inner);
                },
                None => break,
            }
        }

        mailbox.owner = Some(current);
        drop(mailbox);
        self.drain();
    }

    fn drain(&self) {
        let _guard = DrainGuard {
            mailbox: &self.mailbox,
            progress: &self.progress,
            label: &self.label,
        };
        loop {
            let next = {
                let mut mailbox = lock(&self.mailbox);
                let next = mailbox.queue.pop_front();
                if next.is_none() {
                    mailbox.owner = None;
                }
                next
            };
            let Some(queued) = next else {
                break;
            };

            self.process(queued);

            lock(&self.mailbox).processed += 1;
            self.progress.notify_all();
        }
    }

    fn process(&self, queued: Queued<A>) {
        let Queued { action, from_effect } = queued;
        let span = tracing::debug_span!("store_send", store = %self.label);
        let _enter = span.enter();
        tracing::debug!("Processing action");

        let broadcast = (from_effect && self.action_broadcast.receiver_count() > 0).then(|| action.clone());

        let (effects, snapshot) = {
            let mut state = lock(&self.state);

            let reducer_span = tracing::trace_span!("reducer_execution");
            let _reducer_enter = reducer_span.enter();
            let start = Instant::now();
            let effects = self.reducer.reduce(&mut state, action, &self.environment);
            StoreMetrics::record_action(start.elapsed());
            tracing::trace!("Reducer completed, returned {} effects", effects.len());

            let has_observers = !lock(&self.observers).is_empty();
            (effects, has_observers.then(|| (*state).clone()))
        };

        if let Some(snapshot) = snapshot {
            self.notify(&snapshot);
        }

        if let Some(action) = broadcast {
            // Receivers may all have gone since the check
            let _ = self.action_broadcast.send(action);
        }

        for effect in effects {
            self.executor.execute(effect);
        }
    }

    fn notify(&self, state: &S) {
        let observers: Vec<Observer<S>> = lock(&self.observers)
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer(state);
        }
    }

    fn remove_observer(&self, id: u64) {
        lock(&self.observers).retain(|(observer_id, _)| *observer_id != id);
    }
}

impl<S, A, E, R> ActionSink<A> for StoreInner<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: Send + Clone + 'static,
    S: Send + Clone + 'static,
    E: Send + Sync + 'static,
{
    fn deliver(&self, action: A) {
        if self.shutdown.load(Ordering::Acquire) {
            tracing::debug!(store = %self.label, "Dropping effect action: store is shut down");
            crate::metrics::EffectMetrics::record_dropped();
            return;
        }
        self.dispatch(action, true);
    }
}

/// The Store - runtime coordinator for a reducer
///
/// The Store manages:
/// 1. State (behind a mutex, only ever mutated by the reducer)
/// 2. Reducer (business logic)
/// 3. Environment (injected dependencies)
/// 4. Effect execution (with feedback loop)
///
/// Cloning a Store is cheap and yields another handle to the same runtime.
///
/// # Example
///
/// ```ignore
/// let store = Store::new(AppState::default(), app_reducer(), environment);
///
/// store.send(AppAction::Onboarding(OnboardingAction::StartButtonTapped))?;
/// assert!(store.state(|s| matches!(s, AppState::FeatureList(_))));
/// ```
pub struct Store<S, A, E, R> {
    inner: Arc<StoreInner<S, A, E, R>>,
}

impl<S, A, E, R> Clone for Store<S, A, E, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: Send + Clone + 'static,
    S: Send + Clone + 'static,
    E: Send + Sync + 'static,
{
    /// Create a new store with initial state, reducer, and environment
    ///
    /// Uses [`StoreConfig::default`].
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self::with_config(initial_state, reducer, environment, StoreConfig::default())
    }

    /// Create a store with explicit configuration
    #[must_use]
    pub fn with_config(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self {
        let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

        let inner = Arc::new_cyclic(|weak: &Weak<StoreInner<S, A, E, R>>| {
            let sink: Weak<dyn ActionSink<A>> = weak.clone();
            StoreInner {
                state: Mutex::new(initial_state),
                reducer,
                environment,
                mailbox: Mutex::new(Mailbox {
                    queue: VecDeque::new(),
                    owner: None,
                    enqueued: 0,
                    processed: 0,
                }),
                progress: Condvar::new(),
                observers: Mutex::new(Vec::new()),
                next_observer: AtomicU64::new(0),
                executor: Arc::new(EffectExecutor::new(sink)),
                shutdown: AtomicBool::new(false),
                action_broadcast,
                label: config.label,
            }
        });

        tracing::debug!(store = %inner.label, "Store created");
        Self { inner }
    }

    /// Send an action to the store
    ///
    /// Reduces the action, commits the new state, notifies every current
    /// subscriber with it and then starts the returned effects. Actions those
    /// effects produce immediately are processed before this call returns;
    /// delayed ones arrive later through the same path.
    ///
    /// When another thread is dispatching, this call blocks until that thread
    /// has processed the action. A send made from inside a subscriber or an
    /// immediate effect is queued and returns at once.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] once [`shutdown`](Self::shutdown) was called.
    pub fn send(&self, action: A) -> Result<(), StoreError> {
        if self.inner.shutdown.load(Ordering::Acquire) {
            tracing::warn!(store = %self.inner.label, "Rejected action: store is shut down");
            StoreMetrics::record_rejected();
            return Err(StoreError::ShutdownInProgress);
        }
        self.inner.dispatch(action, false);
        Ok(())
    }

    /// Read current state via a closure
    ///
    /// ```ignore
    /// let count = store.state(|s| s.todos.len());
    /// ```
    pub fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = lock(&self.inner.state);
        f(&state)
    }

    /// A copy of the current state
    #[must_use]
    pub fn snapshot(&self) -> S {
        self.state(Clone::clone)
    }

    /// Register a state observer
    ///
    /// The observer is called with the committed state after every action,
    /// outside the state lock, so it may read the store or send to it.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        let id = self.inner.next_observer.fetch_add(1, Ordering::Relaxed);
        lock(&self.inner.observers).push((id, Arc::new(observer)));

        let inner = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.remove_observer(id);
            }
        })
    }

    /// Subscribe to actions produced by effects
    ///
    /// Each action is broadcast after it has been reduced and subscribers were
    /// notified, so a receiver that wakes up reads state that already includes
    /// it. Actions sent directly through [`send`](Self::send) are not broadcast.
    /// Receivers that fall behind lose the oldest actions (`RecvError::Lagged`).
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
        self.inner.action_broadcast.subscribe()
    }

    /// Derive a child view of this store
    ///
    /// The child holds no state of its own: reads project the parent's state
    /// through `to_child_state`, sends are wrapped with `embed_action` and go to
    /// the parent, and child subscribers are driven by the parent's changes.
    pub fn scope<CS, CA>(
        &self,
        to_child_state: impl Fn(&S) -> CS + Send + Sync + 'static,
        embed_action: impl Fn(CA) -> A + Send + Sync + 'static,
    ) -> ScopedStore<CS, CA>
    where
        CS: 'static,
        CA: 'static,
    {
        let to_child_state = Arc::new(to_child_state);

        let read_store = self.clone();
        let read_child = Arc::clone(&to_child_state);
        let send_store = self.clone();
        let subscribe_store = self.clone();

        ScopedStore {
            state: Arc::new(move || read_store.state(|s| read_child(s))),
            send: Arc::new(move |action| send_store.send(embed_action(action))),
            subscribe: Arc::new(move |observer: ChildObserver<CS>| {
                let to_child_state = Arc::clone(&to_child_state);
                subscribe_store.subscribe(move |state| observer(&to_child_state(state)))
            }),
        }
    }

    /// Cancel every in-flight effect registered under `id`
    pub fn cancel(&self, id: EffectId) -> usize {
        self.inner.executor.cancel(id)
    }

    /// Tear the store down
    ///
    /// Cancels every in-flight cancellable effect, drops all subscribers and
    /// rejects further sends. Effect actions that still arrive are dropped.
    pub fn shutdown(&self) {
        if self.inner.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        let cancelled = self.inner.executor.cancel_all();
        lock(&self.inner.observers).clear();
        tracing::info!(store = %self.inner.label, cancelled, "Store shut down");
    }

    /// Whether [`shutdown`](Self::shutdown) has been called
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.load(Ordering::Acquire)
    }
}

/// Handle returned by `subscribe`
///
/// Unsubscribes when [`unsubscribe`](Self::unsubscribe) is called or when dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop receiving state updates
    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Keep the observer registered for the lifetime of the store
    pub fn detach(mut self) {
        self.cancel = None;
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

type ChildObserver<S> = Box<dyn Fn(&S) + Send + Sync>;

/// A narrowed view of a parent [`Store`]
///
/// Created by [`Store::scope`] or [`ScopedStore::scope`].
pub struct ScopedStore<S, A> {
    state: Arc<dyn Fn() -> S + Send + Sync>,
    send: Arc<dyn Fn(A) -> Result<(), StoreError> + Send + Sync>,
    subscribe: Arc<dyn Fn(ChildObserver<S>) -> Subscription + Send + Sync>,
}

impl<S, A> Clone for ScopedStore<S, A> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            send: Arc::clone(&self.send),
            subscribe: Arc::clone(&self.subscribe),
        }
    }
}

impl<S, A> ScopedStore<S, A>
where
    S: 'static,
    A: 'static,
{
    /// The current child state, projected from the parent
    #[must_use]
    pub fn snapshot(&self) -> S {
        (self.state)()
    }

    /// Read the current child state via a closure
    pub fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        f(&(self.state)())
    }

    /// Send a child action; it reaches the parent wrapped
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] when the root store is shut down.
    pub fn send(&self, action: A) -> Result<(), StoreError> {
        (self.send)(action)
    }

    /// Observe the child state after every parent action
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        (self.subscribe)(Box::new(observer))
    }

    /// Narrow this view further
    pub fn scope<CS, CA>(
        &self,
        to_child_state: impl Fn(&S) -> CS + Send + Sync + 'static,
        embed_action: impl Fn(CA) -> A + Send + Sync + 'static,
    ) -> ScopedStore<CS, CA>
    where
        CS: 'static,
        CA: 'static,
    {
        let to_child_state = Arc::new(to_child_state);

        let parent_state = Arc::clone(&self.state);
        let read_child = Arc::clone(&to_child_state);
        let parent_send = Arc::clone(&self.send);
        let parent_subscribe = Arc::clone(&self.subscribe);

        ScopedStore {
            state: Arc::new(move || read_child(&parent_state())),
            send: Arc::new(move |action| parent_send(embed_action(action))),
            subscribe: Arc::new(move |observer: ChildObserver<CS>| {
                let to_child_state = Arc::clone(&to_child_state);
                parent_subscribe(Box::new(move |state: &S| observer(&to_child_state(state))))
            }),
        }
    }
}
