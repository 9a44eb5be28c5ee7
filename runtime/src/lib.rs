//! # Flux Runtime
//!
//! The dispatcher: the runtime that owns registered stores, the current
//! aggregate state and the observers watching it.
//!
//! ## Core Components
//!
//! - **Dispatcher**: Registers stores, reduces actions, swaps state, notifies observers
//! - **Dispatch**: Weak handle used by thunks to dispatch later
//! - **Subscription**: Handle returned by `observe_stores`, used to unsubscribe
//! - **Dispatchable**: What an action creator returns (a plain action or a thunk)
//!
//! ## Data Flow
//!
//! `receive_stores` → bootstrap → `observe_stores` → `dispatch` → reduce every
//! store → swap state → diff slices by identity → notify each affected observer
//! exactly once.
//!
//! ## Example
//!
//! ```
//! use flux_core::{Action, Store};
//! use flux_runtime::Dispatcher;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! # fn main() -> Result<(), flux_runtime::error::DispatchError> {
//! let counter = Store::from_fn(|state: Option<Rc<i64>>, action: &Action| {
//!     let state = state.unwrap_or_else(|| Rc::new(0));
//!     match action.action_type() {
//!         "INCREMENT" => Some(Rc::new(*state + 1)),
//!         _ => Some(state),
//!     }
//! });
//!
//! let dispatcher = Dispatcher::new();
//! dispatcher.receive_stores([("counter", counter.clone())])?;
//!
//! let seen = Rc::new(Cell::new(0));
//! let sink = Rc::clone(&seen);
//! let subscription = dispatcher.observe_stores(&[counter], move |state| {
//!     sink.set(*state.get::<i64>("counter").unwrap_or_default());
//! })?;
//!
//! dispatcher.dispatch(Action::new("INCREMENT"))?;
//! assert_eq!(seen.get(), 1);
//!
//! subscription.unsubscribe();
//! # Ok(())
//! # }
//! ```

/// Action creators and thunks
pub mod action_creator;

/// Dispatcher configuration
pub mod config;

/// The dispatcher and its weak dispatch handle
pub mod dispatcher;

/// Metrics for observability
pub mod metrics;

/// Observer bookkeeping and subscriptions
pub mod observers;

/// Error types for the dispatcher
pub mod error {
    use flux_core::{ActionError, StoreId};
    use thiserror::Error;

    /// Errors that can occur during dispatcher operations
    ///
    /// Every variant is a caller-side contract violation. None of them is
    /// transient, so nothing is retried: fix the action, the store, or the
    /// registration order.
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum DispatchError {
        /// The action's `type` is not a string
        ///
        /// Raised before any state is computed.
        #[error(transparent)]
        InvalidAction(#[from] ActionError),

        /// An external caller dispatched the reserved bootstrap action
        #[error("Action type BOOTSTRAP_STORE is reserved for store registration")]
        ReservedActionType,

        /// A store produced no slice
        ///
        /// The dispatch is aborted and the previous state stays current.
        #[error("State returned by {key} is null or undefined")]
        NullSlice {
            /// Registration key of the offending store
            key: String,
        },

        /// A store was used before being passed to `receive_stores`
        #[error("This store is not registered: {reducer} ({store})")]
        UnregisteredStore {
            /// Identity of the unknown store
            store: StoreId,
            /// Type name of its reducer
            reducer: &'static str,
        },

        /// A store was offered under an empty key
        #[error("Store key must be a non-empty string")]
        EmptyStoreKey,

        /// A dispatch was attempted while another was in progress
        ///
        /// Only returned under `ReentrancyPolicy::Reject`.
        #[error("Cannot dispatch {action_type} while dispatching")]
        NestedDispatch {
            /// Type of the rejected action
            action_type: String,
        },

        /// Too many nested dispatches are waiting behind the running one
        #[error("Dispatch queue is full ({limit} actions pending)")]
        QueueOverflow {
            /// Configured queue limit
            limit: usize,
        },

        /// The dispatcher behind a `Dispatch` handle no longer exists
        #[error("Dispatcher has been dropped")]
        DispatcherDropped,
    }
}

// Re-export commonly used types
pub use action_creator::{Dispatchable, Thunk};
pub use config::{DispatcherConfig, ReentrancyPolicy};
pub use dispatcher::{Dispatch, Dispatcher};
pub use error::DispatchError;
pub use observers::{Subscription, SubscriptionId};
