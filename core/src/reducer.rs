//! Reducer trait - the pure function behind every store
//!
//! A reducer maps `(previous slice, action)` to the next slice. The previous
//! slice is `None` the first time a store runs (during bootstrap). Returning
//! `None` means "no slice", which is never valid and aborts the dispatch.
//!
//! Reducers signal "no change" by returning the `Rc` they were given. Only a
//! freshly allocated slice is treated as a change.
//!
//! # Example
//!
//! ```
//! use flux_core::{action::Action, reducer::Reducer};
//! use std::rc::Rc;
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type Slice = i64;
//!
//!     fn reduce(&self, state: Option<Rc<i64>>, action: &Action) -> Option<Rc<i64>> {
//!         let state = state.unwrap_or_else(|| Rc::new(0));
//!         match action.action_type() {
//!             "INCREMENT" => Some(Rc::new(*state + 1)),
//!             _ => Some(state),
//!         }
//!     }
//! }
//!
//! let reducer = CounterReducer;
//! let initial = reducer.reduce(None, &Action::bootstrap());
//! assert_eq!(initial.as_deref(), Some(&0));
//! ```

use crate::action::Action;
use std::any::Any;
use std::marker::PhantomData;
use std::rc::Rc;

/// The Reducer trait - business logic for one slice of state
pub trait Reducer {
    /// The slice type this reducer produces
    type Slice: Any;

    /// Compute the next slice for `action`
    ///
    /// # Arguments
    ///
    /// - `state`: The previous slice, `None` before the first reduction
    /// - `action`: The action being dispatched
    ///
    /// # Returns
    ///
    /// The next slice. Return `state` unchanged for irrelevant actions; `None`
    /// is a contract violation.
    fn reduce(&self, state: Option<Rc<Self::Slice>>, action: &Action) -> Option<Rc<Self::Slice>>;
}

/// Wraps a plain function or closure as a [`Reducer`]
///
/// Created by [`from_fn`].
pub struct FnReducer<T, F> {
    reduce: F,
    _phantom: PhantomData<fn() -> T>,
}

/// Use a closure as a reducer
///
/// # Example
///
/// ```
/// use flux_core::{action::Action, reducer::{from_fn, Reducer}};
/// use std::rc::Rc;
///
/// let todos = from_fn(|state: Option<Rc<Vec<String>>>, action: &Action| {
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
/// let next = todos.reduce(None, &Action::new("ADD_TODO").with("text", "ship it"));
/// assert_eq!(next.as_deref(), Some(&vec!["ship it".to_string()]));
/// ```
pub const fn from_fn<T, F>(reduce: F) -> FnReducer<T, F>
where
    T: Any,
    F: Fn(Option<Rc<T>>, &Action) -> Option<Rc<T>>,
{
    FnReducer {
        reduce,
        _phantom: PhantomData,
    }
}

impl<T, F> Reducer for FnReducer<T, F>
where
    T: Any,
    F: Fn(Option<Rc<T>>, &Action) -> Option<Rc<T>>,
{
    type Slice = T;

    fn reduce(&self, state: Option<Rc<T>>, action: &Action) -> Option<Rc<T>> {
        (self.reduce)(state, action)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct ToggleReducer;

    impl Reducer for ToggleReducer {
        type Slice = bool;

        fn reduce(&self, state: Option<Rc<bool>>, action: &Action) -> Option<Rc<bool>> {
            let state = state.unwrap_or_else(|| Rc::new(false));
            if action.action_type() == "TOGGLE" {
                Some(Rc::new(!*state))
            } else {
                Some(state)
            }
        }
    }

    #[test]
    fn test_irrelevant_action_returns_same_allocation() {
        let state = ToggleReducer.reduce(None, &Action::bootstrap()).unwrap();
        let next = ToggleReducer
            .reduce(Some(Rc::clone(&state)), &Action::new("OTHER"))
            .unwrap();

        assert!(Rc::ptr_eq(&state, &next));
    }

    #[test]
    fn test_relevant_action_allocates() {
        let state = ToggleReducer.reduce(None, &Action::bootstrap()).unwrap();
        let next = ToggleReducer
            .reduce(Some(Rc::clone(&state)), &Action::new("TOGGLE"))
            .unwrap();

        assert!(!Rc::ptr_eq(&state, &next));
        assert!(*next);
    }

    #[test]
    fn test_from_fn() {
        let reducer = from_fn(|state: Option<Rc<u32>>, _action: &Action| {
            Some(Rc::new(state.map_or(1, |count| *count + 1)))
        });

        let first = reducer.reduce(None, &Action::bootstrap()).unwrap();
        let second = reducer.reduce(Some(first), &Action::new("TICK")).unwrap();
        assert_eq!(*second, 2);
    }
}
