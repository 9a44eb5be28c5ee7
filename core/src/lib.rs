//! # Flux Core
//!
//! Core types for the Flux dispatcher.
//!
//! This crate provides the values that flow through a unidirectional-data-flow
//! state container. The dispatcher itself lives in `flux-runtime`.
//!
//! ## Core Concepts
//!
//! - **Action**: An immutable event with a string `type` and a JSON payload
//! - **Reducer**: Pure function `(Option<slice>, &Action) → slice`
//! - **Store**: A reducer with an identity, registered under a string key
//! - **Slice**: One store's portion of the state, compared by identity
//! - **Aggregate State**: Snapshot of every registered store's slice
//!
//! ## Architecture Principles
//!
//! - Unidirectional Data Flow
//! - Pure reducers, identity-based change detection
//! - Immutable snapshots (the state is replaced, never mutated)
//!
//! ## Example
//!
//! ```
//! use flux_core::{Action, AggregateState, Store};
//! use std::rc::Rc;
//!
//! let counter = Store::from_fn(|state: Option<Rc<i64>>, action: &Action| {
//!     let state = state.unwrap_or_else(|| Rc::new(0));
//!     match action.action_type() {
//!         "INCREMENT" => Some(Rc::new(*state + 1)),
//!         _ => Some(state),
//!     }
//! });
//!
//! let slice = counter.reduce(None, &Action::bootstrap());
//! assert!(slice.is_some());
//! # let _ = AggregateState::new();
//! ```

/// Actions and the reserved bootstrap action type
pub mod action;

/// The reducer trait and closure adapter
pub mod reducer;

/// Slices and aggregate state snapshots
pub mod state;

/// Identity-carrying store handles
pub mod store;

// Re-export commonly used types
pub use action::{Action, ActionError, BOOTSTRAP_STORE};
pub use reducer::{from_fn, FnReducer, Reducer};
pub use state::{same_slice, AggregateState, Slice};
pub use store::{Store, StoreId};
