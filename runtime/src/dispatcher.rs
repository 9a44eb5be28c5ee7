//! The Dispatcher - runtime for stores and observers
//!
//! The Dispatcher owns:
//! 1. The store registry (key → [`Store`], registration order)
//! 2. The inverse index (store identity → key)
//! 3. The observer registry (key → subscriptions)
//! 4. The current [`AggregateState`]
//!
//! All four live in one `DispatcherState` behind `Rc<RefCell<..>>`. The cell is
//! never borrowed while user code runs (stores, observers, thunks), so any of
//! them may call back into the dispatcher without tripping the borrow checker
//! at runtime.
//!
//! # Nested dispatch
//!
//! A dispatch issued while another dispatch is running is handled according to
//! [`ReentrancyPolicy`]: queued and drained in FIFO order after the running
//! dispatch finishes notifying (the default), or rejected.

use crate::config::{DispatcherConfig, ReentrancyPolicy};
use crate::error::DispatchError;
use crate::metrics::DispatcherMetrics;
use crate::observers::{Observer, ObserverFn, ObserverRegistry, Subscription};
use flux_core::{Action, AggregateState, Store, StoreId, BOOTSTRAP_STORE};
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Instant;

/// Everything a dispatcher owns
pub(crate) struct DispatcherState {
    stores: Rc<IndexMap<String, Store>>,
    store_keys: HashMap<StoreId, String>,
    pub(crate) observers: ObserverRegistry,
    current: AggregateState,
    queue: VecDeque<Action>,
    dispatching: bool,
    config: DispatcherConfig,
}

impl DispatcherState {
    fn new(config: DispatcherConfig) -> Self {
        Self {
            stores: Rc::default(),
            store_keys: HashMap::new(),
            observers: ObserverRegistry::default(),
            current: AggregateState::new(),
            queue: VecDeque::new(),
            dispatching: false,
            config,
        }
    }

    /// Refuse a dispatch issued while another one is running, if it cannot
    /// be queued
    fn admit_nested(&self, action_type: &str) -> Result<(), DispatchError> {
        match self.config.reentrancy {
            ReentrancyPolicy::Reject => {
                tracing::warn!(action_type, "Rejected action: dispatch in progress");
                DispatcherMetrics::record_rejection();
                Err(DispatchError::NestedDispatch {
                    action_type: action_type.to_string(),
                })
            }
            ReentrancyPolicy::Queue => {
                let limit = self.config.max_queued_actions;
                if self.queue.len() >= limit {
                    tracing::warn!(limit, "Rejected action: dispatch queue is full");
                    DispatcherMetrics::record_rejection();
                    return Err(DispatchError::QueueOverflow { limit });
                }
                Ok(())
            }
        }
    }

    /// Install `store` under `key`, keeping the identity index in sync
    ///
    /// Copies the registry only while a dispatch still holds the previous one.
    fn install(&mut self, key: String, store: Store) {
        let stores = Rc::make_mut(&mut self.stores);
        if let Some(replaced) = stores.insert(key.clone(), store.clone()) {
            if replaced.id() != store.id()
                && self.store_keys.get(&replaced.id()) == Some(&key)
            {
                self.store_keys.remove(&replaced.id());
                // Still registered elsewhere: point the index at that key
                if let Some(other_key) = stores
                    .iter()
                    .find(|(_, other)| other.id() == replaced.id())
                    .map(|(other_key, _)| other_key.clone())
                {
                    self.store_keys.insert(replaced.id(), other_key);
                }
            }
            tracing::debug!(key = %key, store = %store.id(), "Replaced store");
        } else {
            tracing::debug!(key = %key, store = %store.id(), "Registered store");
        }

        self.observers.ensure_key(&key);
        self.store_keys.insert(store.id(), key);
    }

    fn store_key(&self, store: &Store) -> Result<String, DispatchError> {
        self.store_keys.get(&store.id()).cloned().ok_or_else(|| {
            tracing::warn!(
                store = %store.id(),
                reducer = store.reducer_name(),
                "This store is not registered"
            );
            DispatchError::UnregisteredStore {
                store: store.id(),
                reducer: store.reducer_name(),
            }
        })
    }
}

/// Resets the in-progress flag when the outermost dispatch ends
///
/// Also runs when an observer panics, so the dispatcher stays usable.
struct DispatchGuard<'a>(&'a RefCell<DispatcherState>);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.0.try_borrow_mut() {
            state.dispatching = false;
            if !state.queue.is_empty() {
                tracing::warn!(
                    discarded = state.queue.len(),
                    "Discarding queued actions after failed dispatch"
                );
                state.queue.clear();
            }
        }
    }
}

/// Run every store over `action`, producing the next state
///
/// Stores run in registration order. The first store that produces no slice
/// aborts the computation; nothing is returned for the stores already run.
///
/// # Errors
///
/// Returns [`DispatchError::NullSlice`] naming the first store that returned
/// `None`.
pub fn compute_next_state(
    previous: &AggregateState,
    stores: &IndexMap<String, Store>,
    action: &Action,
) -> Result<AggregateState, DispatchError> {
    let mut slices = IndexMap::with_capacity(stores.len());

    for (key, store) in stores {
        let before = previous.slice(key);
        if before.is_some_and(|slice| !store.produces(slice)) {
            tracing::debug!(key = %key, "Slice type changed, reseeding store");
        }

        let Some(next) = store.reduce(before, action) else {
            tracing::error!(
                key = %key,
                action_type = action.action_type(),
                "State returned by store is null or undefined"
            );
            DispatcherMetrics::record_null_slice();
            return Err(DispatchError::NullSlice { key: key.clone() });
        };
        slices.insert(key.clone(), next);
    }

    Ok(AggregateState::from_slices(slices))
}

/// The dispatcher: a process- or test-local state container
///
/// Not `Send`: a dispatcher and everything it hands out stay on the thread
/// that created it.
///
/// # Example
///
/// ```
/// use flux_core::{Action, Store};
/// use flux_runtime::Dispatcher;
/// use std::rc::Rc;
///
/// # fn main() -> Result<(), flux_runtime::DispatchError> {
/// let todos = Store::from_fn(|state: Option<Rc<Vec<String>>>, action: &Action| {
///     let state = state.unwrap_or_default();
///     match action.action_type() {
///         "ADD_TODO" => {
///             let mut next = (*state).clone();
///             next.push(action.get("text")?.as_str()?.to_string());
///             Some(Rc::new(next))
///         }
///         _ => Some(state),
///     }
/// });
///
/// let dispatcher = Dispatcher::new();
/// dispatcher.receive_stores([("todos", todos)])?;
/// dispatcher.dispatch(Action::new("ADD_TODO").with("text", "ship it"))?;
///
/// let todos = dispatcher.state().get::<Vec<String>>("todos");
/// assert_eq!(todos.as_deref(), Some(&vec!["ship it".to_string()]));
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher {
    state: Rc<RefCell<DispatcherState>>,
}

impl Dispatcher {
    /// Create an empty dispatcher with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    /// Create an empty dispatcher with a custom configuration
    #[must_use]
    pub fn with_config(config: DispatcherConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(DispatcherState::new(config))),
        }
    }

    /// The configuration this dispatcher was built with
    #[must_use]
    pub fn config(&self) -> DispatcherConfig {
        self.state.borrow().config.clone()
    }

    /// Snapshot of the current aggregate state
    #[must_use]
    pub fn state(&self) -> AggregateState {
        self.state.borrow().current.clone()
    }

    /// Number of registered stores
    #[must_use]
    pub fn store_count(&self) -> usize {
        self.state.borrow().stores.len()
    }

    /// Number of subscriptions watching `key`
    #[must_use]
    pub fn observer_count(&self, key: &str) -> usize {
        self.state.borrow().observers.count(key)
    }

    /// Whether a dispatch is currently running
    #[must_use]
    pub fn is_dispatching(&self) -> bool {
        self.state.borrow().dispatching
    }

    /// A weak handle that dispatches into this dispatcher
    #[must_use]
    pub fn dispatch_handle(&self) -> Dispatch {
        Dispatch {
            state: Rc::downgrade(&self.state),
        }
    }

    /// Register (or replace) stores, then bootstrap them
    ///
    /// Each store is installed under its key, replacing whatever was there.
    /// Afterwards the reserved bootstrap action runs through every store, old
    /// and new, which notifies observers of every slice that changed.
    ///
    /// May be called any number of times to add stores late.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::EmptyStoreKey`] if any key is empty (nothing is installed)
    /// - [`DispatchError::NestedDispatch`] / [`DispatchError::QueueOverflow`]
    ///   if called during a dispatch whose policy refuses the bootstrap
    ///   (nothing is installed)
    /// - Any error of the bootstrap dispatch, e.g. [`DispatchError::NullSlice`]
    #[tracing::instrument(skip_all, name = "receive_stores")]
    pub fn receive_stores<K, I>(&self, stores: I) -> Result<(), DispatchError>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Store)>,
    {
        let stores: Vec<(String, Store)> = stores
            .into_iter()
            .map(|(key, store)| (key.into(), store))
            .collect();

        if stores.iter().any(|(key, _)| key.is_empty()) {
            tracing::warn!("Rejected stores: empty store key");
            return Err(DispatchError::EmptyStoreKey);
        }

        {
            let mut state = self.state.borrow_mut();
            // A refused bootstrap must leave the registry untouched
            if state.dispatching {
                state.admit_nested(BOOTSTRAP_STORE)?;
            }
            for (key, store) in stores {
                state.install(key, store);
            }
            DispatcherMetrics::record_store_count(state.stores.len());
        }

        tracing::debug!("Bootstrapping stores");
        self.enqueue(Action::bootstrap())
    }

    /// Resolve a store to the key it was registered under
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnregisteredStore`] if the store was never
    /// passed to [`receive_stores`](Self::receive_stores).
    pub fn get_store_key(&self, store: &Store) -> Result<String, DispatchError> {
        self.state.borrow().store_key(store)
    }

    /// Dispatch an action through every store
    ///
    /// Computes the next state, swaps it in and notifies the observers of
    /// every slice that changed identity.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::ReservedActionType`] for the bootstrap action
    /// - [`DispatchError::NullSlice`] if a store produced no slice
    /// - [`DispatchError::NestedDispatch`] / [`DispatchError::QueueOverflow`]
    ///   for nested dispatches, depending on the reentrancy policy
    pub fn dispatch(&self, action: Action) -> Result<(), DispatchError> {
        if action.is_bootstrap() {
            tracing::warn!("Rejected action: BOOTSTRAP_STORE is reserved");
            DispatcherMetrics::record_rejection();
            return Err(DispatchError::ReservedActionType);
        }
        self.enqueue(action)
    }

    /// Dispatch an action given as raw JSON
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidAction`] if the `type` field is not a
    /// string, before any state is computed. Otherwise as [`dispatch`](Self::dispatch).
    pub fn dispatch_value(&self, value: serde_json::Value) -> Result<(), DispatchError> {
        let action = Action::try_from(value).map_err(|error| {
            tracing::warn!(%error, "Rejected action");
            DispatcherMetrics::record_rejection();
            error
        })?;
        self.dispatch(action)
    }

    /// Watch a set of stores
    ///
    /// `on_change` is called once right away with the current state, then
    /// once per dispatch in which any watched slice changed.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnregisteredStore`] if any store is unknown; in
    /// that case `on_change` is never called and nothing is registered.
    pub fn observe_stores<F>(
        &self,
        stores: &[Store],
        on_change: F,
    ) -> Result<Subscription, DispatchError>
    where
        F: Fn(&AggregateState) + 'static,
    {
        let (keys, id, current) = {
            let mut state = self.state.borrow_mut();
            let keys = stores
                .iter()
                .map(|store| state.store_key(store))
                .collect::<Result<Vec<_>, _>>()?;
            (keys, state.observers.next_id(), state.current.clone())
        };

        let on_change: ObserverFn = Rc::new(on_change);
        on_change(&current);

        {
            let mut state = self.state.borrow_mut();
            for key in &keys {
                state.observers.add(
                    key,
                    Observer {
                        id,
                        on_change: Rc::clone(&on_change),
                    },
                );
            }
        }
        tracing::debug!(subscription = %id, keys = ?keys, "Observing stores");

        Ok(Subscription {
            id,
            keys,
            state: Rc::downgrade(&self.state),
        })
    }

    /// Run `action` now, or queue/reject it if a dispatch is running
    fn enqueue(&self, action: Action) -> Result<(), DispatchError> {
        {
            let mut state = self.state.borrow_mut();
            if state.dispatching {
                state.admit_nested(action.action_type())?;
                tracing::trace!(action_type = action.action_type(), "Queued nested dispatch");
                DispatcherMetrics::record_queued();
                state.queue.push_back(action);
                return Ok(());
            }
            state.dispatching = true;
        }

        let _guard = DispatchGuard(&self.state);
        self.process(&action)?;

        loop {
            let next = self.state.borrow_mut().queue.pop_front();
            let Some(action) = next else {
                break;
            };
            self.process(&action)?;
        }

        Ok(())
    }

    /// Reduce, swap and notify for one action
    #[tracing::instrument(skip(self, action), fields(action_type = %action), name = "dispatch")]
    fn process(&self, action: &Action) -> Result<(), DispatchError> {
        let (previous, stores) = {
            let state = self.state.borrow();
            (state.current.clone(), Rc::clone(&state.stores))
        };

        let start = Instant::now();
        let next = compute_next_state(&previous, &stores, action)?;
        let changed: SmallVec<[&str; 8]> = next.changed_since(&previous).collect();
        DispatcherMetrics::record_reduce(start.elapsed(), changed.len());

        let observers = {
            let mut state = self.state.borrow_mut();
            state.current = next.clone();
            if changed.is_empty() {
                tracing::trace!("No slice changed");
                return Ok(());
            }
            state.observers.gather(changed.iter().copied())
        };

        tracing::trace!(changed = ?changed, observers = observers.len(), "Notifying observers");
        DispatcherMetrics::record_notifications(observers.len());
        for observer in &observers {
            (observer.on_change)(&next);
        }

        Ok(())
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Dispatcher")
            .field("stores", &state.stores.keys().collect::<Vec<_>>())
            .field("dispatching", &state.dispatching)
            .field("queued", &state.queue.len())
            .finish_non_exhaustive()
    }
}

/// Weak handle for dispatching into a [`Dispatcher`]
///
/// Handed to thunks; cheap to clone and free to keep across `.await` points.
/// It does not keep the dispatcher alive.
#[derive(Clone)]
pub struct Dispatch {
    state: Weak<RefCell<DispatcherState>>,
}

impl Dispatch {
    fn upgrade(&self) -> Result<Dispatcher, DispatchError> {
        self.state
            .upgrade()
            .map(|state| Dispatcher { state })
            .ok_or(DispatchError::DispatcherDropped)
    }

    /// Dispatch an action
    ///
    /// # Errors
    ///
    /// [`DispatchError::DispatcherDropped`] if the dispatcher is gone, otherwise
    /// as [`Dispatcher::dispatch`].
    pub fn dispatch(&self, action: Action) -> Result<(), DispatchError> {
        self.upgrade()?.dispatch(action)
    }

    /// Dispatch an action given as raw JSON
    ///
    /// # Errors
    ///
    /// [`DispatchError::DispatcherDropped`] if the dispatcher is gone, otherwise
    /// as [`Dispatcher::dispatch_value`].
    pub fn dispatch_value(&self, value: serde_json::Value) -> Result<(), DispatchError> {
        self.upgrade()?.dispatch_value(value)
    }

    /// Snapshot of the dispatcher's current state
    ///
    /// # Errors
    ///
    /// [`DispatchError::DispatcherDropped`] if the dispatcher is gone.
    pub fn state(&self) -> Result<AggregateState, DispatchError> {
        Ok(self.upgrade()?.state())
    }

    /// Whether the dispatcher still exists
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.state.strong_count() > 0
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("alive", &self.is_alive())
            .finish()
    }
}
