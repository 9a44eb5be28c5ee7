//! # Counter Example
//!
//! A simple counter demonstrating the Flux dispatcher.
//!
//! This example showcases:
//! - Reducers for two independent slices (`counter` and `history`)
//! - Registering stores and observing them
//! - Plain action creators and thunks, including one that dispatches later
//!
//! ## Example
//!
//! ```
//! use counter::{actions, register};
//! use flux_runtime::Dispatcher;
//!
//! # fn main() -> Result<(), flux_runtime::DispatchError> {
//! let dispatcher = Dispatcher::new();
//! register(&dispatcher)?;
//!
//! let increment = dispatcher.wrap_action_creator(actions::increment);
//! increment(())?;
//! increment(())?;
//!
//! let count = dispatcher.state().get::<counter::CounterState>("counter").map(|state| state.count);
//! assert_eq!(count, Some(2));
//! # Ok(())
//! # }
//! ```

use flux_core::{Action, Reducer, Store};
use flux_runtime::{DispatchError, Dispatcher};
use std::rc::Rc;

/// Key the counter slice is registered under
pub const COUNTER: &str = "counter";

/// Key the history slice is registered under
pub const HISTORY: &str = "history";

/// Counter state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterState {
    /// Current count value
    pub count: i64,
}

/// Counter reducer
///
/// Handles `INCREMENT`, `DECREMENT`, `ADD` (with an integer `amount`) and
/// `RESET`. Every other action returns the previous slice untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterReducer;

impl Reducer for CounterReducer {
    type Slice = CounterState;

    fn reduce(&self, state: Option<Rc<CounterState>>, action: &Action) -> Option<Rc<CounterState>> {
        let state = state.unwrap_or_default();
        let count = match action.action_type() {
            actions::INCREMENT => state.count + 1,
            actions::DECREMENT => state.count - 1,
            actions::ADD => {
                let amount = action.get("amount").and_then(|amount| amount.as_i64());
                state.count + amount.unwrap_or(0)
            }
            actions::RESET if state.count != 0 => 0,
            _ => return Some(state),
        };
        Some(Rc::new(CounterState { count }))
    }
}

/// Remembers the type of every action that touched the counter
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryReducer;

impl Reducer for HistoryReducer {
    type Slice = Vec<String>;

    fn reduce(&self, state: Option<Rc<Vec<String>>>, action: &Action) -> Option<Rc<Vec<String>>> {
        let state = state.unwrap_or_default();
        match action.action_type() {
            actions::INCREMENT | actions::DECREMENT | actions::ADD | actions::RESET => {
                let mut history = Vec::clone(&state);
                history.push(action.action_type().to_string());
                Some(Rc::new(history))
            }
            _ => Some(state),
        }
    }
}

/// Register the counter and history stores with a dispatcher
///
/// Returns the two stores, in that order, for use with `observe_stores`.
///
/// # Errors
///
/// Propagates a failed bootstrap.
pub fn register(dispatcher: &Dispatcher) -> Result<(Store, Store), DispatchError> {
    let counter = Store::new(CounterReducer);
    let history = Store::new(HistoryReducer);
    dispatcher.receive_stores([(COUNTER, counter.clone()), (HISTORY, history.clone())])?;
    Ok((counter, history))
}

/// Action types and creators
pub mod actions {
    use flux_core::Action;
    use flux_runtime::Dispatchable;
    use std::time::Duration;

    /// Add one
    pub const INCREMENT: &str = "INCREMENT";
    /// Subtract one
    pub const DECREMENT: &str = "DECREMENT";
    /// Add `amount`
    pub const ADD: &str = "ADD";
    /// Back to zero
    pub const RESET: &str = "RESET";

    /// `INCREMENT`
    #[must_use]
    pub fn increment((): ()) -> Dispatchable {
        Action::new(INCREMENT).into()
    }

    /// `DECREMENT`
    #[must_use]
    pub fn decrement((): ()) -> Dispatchable {
        Action::new(DECREMENT).into()
    }

    /// `ADD` with the given amount
    #[must_use]
    pub fn add(amount: i64) -> Dispatchable {
        Action::new(ADD).with("amount", amount).into()
    }

    /// `RESET`
    #[must_use]
    pub fn reset((): ()) -> Dispatchable {
        Action::new(RESET).into()
    }

    /// Increment only when the current count is odd
    #[must_use]
    pub fn increment_if_odd((): ()) -> Dispatchable {
        Dispatchable::thunk(|dispatch, state| {
            let count = state
                .get::<super::CounterState>(super::COUNTER)
                .map_or(0, |state| state.count);
            if count % 2 == 0 {
                tracing::debug!(count, "Count is even, skipping increment");
                return Ok(());
            }
            dispatch.dispatch(Action::new(INCREMENT))
        })
    }

    /// Increment after `delay`
    ///
    /// The dispatch happens on a task spawned with [`tokio::task::spawn_local`],
    /// so this must be called from within a [`tokio::task::LocalSet`].
    #[must_use]
    pub fn increment_later(delay: Duration) -> Dispatchable {
        Dispatchable::thunk(move |dispatch, _| {
            tokio::task::spawn_local(async move {
                tokio::time::sleep(delay).await;
                if let Err(error) = dispatch.dispatch(Action::new(INCREMENT)) {
                    tracing::warn!(%error, "Delayed increment failed");
                }
            });
            Ok(())
        })
    }
}
