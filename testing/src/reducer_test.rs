//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use flux_core::{action::Action, reducer::Reducer};
use std::rc::Rc;

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// What the reduction is expected to do with the given slice's identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdentityExpectation {
    Unchanged,
    Changed,
}

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// # Example
///
/// ```
/// use flux_core::{Action, Reducer};
/// use flux_testing::ReducerTest;
/// use std::rc::Rc;
///
/// struct CounterReducer;
///
/// impl Reducer for CounterReducer {
///     type Slice = i64;
///
///     fn reduce(&self, state: Option<Rc<i64>>, action: &Action) -> Option<Rc<i64>> {
///         let state = state.unwrap_or_else(|| Rc::new(0));
///         match action.action_type() {
///             "INCREMENT" => Some(Rc::new(*state + 1)),
///             _ => Some(state),
///         }
///     }
/// }
///
/// ReducerTest::new(CounterReducer)
///     .given_state(0)
///     .when_action(Action::new("INCREMENT"))
///     .then_changed()
///     .then_state(|count| assert_eq!(*count, 1))
///     .run();
///
/// ReducerTest::new(CounterReducer)
///     .given_state(5)
///     .when_action(Action::new("SOMETHING_ELSE"))
///     .then_unchanged()
///     .run();
/// ```
pub struct ReducerTest<R>
where
    R: Reducer,
{
    reducer: R,
    initial_state: Option<Rc<R::Slice>>,
    action: Option<Action>,
    state_assertions: Vec<StateAssertion<R::Slice>>,
    identity: Option<IdentityExpectation>,
    expect_null: bool,
}

impl<R> ReducerTest<R>
where
    R: Reducer,
{
    /// Create a new reducer test with the given reducer
    ///
    /// Without [`given_state`](Self::given_state) the reducer sees no previous
    /// slice, as during bootstrap.
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            initial_state: None,
            action: None,
            state_assertions: Vec::new(),
            identity: None,
            expect_null: false,
        }
    }

    /// Set the previous slice (Given)
    #[must_use]
    pub fn given_state(mut self, state: R::Slice) -> Self {
        self.initial_state = Some(Rc::new(state));
        self
    }

    /// Set the action to test (When)
    #[must_use]
    pub fn when_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// Add an assertion about the resulting slice (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&R::Slice) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Expect the reducer to hand back the given slice itself (Then)
    #[must_use]
    pub const fn then_unchanged(mut self) -> Self {
        self.identity = Some(IdentityExpectation::Unchanged);
        self
    }

    /// Expect the reducer to produce a new slice (Then)
    #[must_use]
    pub const fn then_changed(mut self) -> Self {
        self.identity = Some(IdentityExpectation::Changed);
        self
    }

    /// Expect the reducer to produce no slice at all (Then)
    #[must_use]
    pub const fn then_null(mut self) -> Self {
        self.expect_null = true;
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if the action is not set, or if any assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let action = self.action.expect("Action must be set with when_action()");
        let given = self.initial_state.clone();

        // Execute reducer
        let next = self.reducer.reduce(self.initial_state, &action);

        if self.expect_null {
            assert!(
                next.is_none(),
                "Expected no slice for {action}, but the reducer produced one"
            );
            return;
        }
        let next = next.unwrap_or_else(|| panic!("Reducer returned no slice for {action}"));

        match (self.identity, given) {
            (Some(IdentityExpectation::Unchanged), Some(given)) => assert!(
                Rc::ptr_eq(&given, &next),
                "Expected {action} to return the given slice, but a new one was allocated"
            ),
            (Some(IdentityExpectation::Unchanged), None) => {
                panic!("then_unchanged() needs a slice set with given_state()")
            }
            (Some(IdentityExpectation::Changed), Some(given)) => assert!(
                !Rc::ptr_eq(&given, &next),
                "Expected {action} to produce a new slice, but the given one was returned"
            ),
            (Some(IdentityExpectation::Changed), None) | (None, _) => {}
        }

        // Run state assertions
        for assertion in self.state_assertions {
            assertion(&next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestReducer;

    impl Reducer for TestReducer {
        type Slice = i32;

        fn reduce(&self, state: Option<Rc<i32>>, action: &Action) -> Option<Rc<i32>> {
            let state = state.unwrap_or_else(|| Rc::new(0));
            match action.action_type() {
                "INCREMENT" => Some(Rc::new(*state + 1)),
                "DECREMENT" => Some(Rc::new(*state - 1)),
                "BREAK" => None,
                _ => Some(state),
            }
        }
    }

    #[test]
    fn test_reducer_test_increment() {
        ReducerTest::new(TestReducer)
            .given_state(0)
            .when_action(Action::new("INCREMENT"))
            .then_changed()
            .then_state(|state| {
                assert_eq!(*state, 1);
            })
            .run();
    }

    #[test]
    fn test_reducer_test_decrement() {
        ReducerTest::new(TestReducer)
            .given_state(5)
            .when_action(Action::new("DECREMENT"))
            .then_state(|state| {
                assert_eq!(*state, 4);
            })
            .run();
    }

    #[test]
    fn test_reducer_test_bootstrap_without_state() {
        ReducerTest::new(TestReducer)
            .when_action(Action::bootstrap())
            .then_state(|state| assert_eq!(*state, 0))
            .run();
    }

    #[test]
    fn test_reducer_test_unchanged() {
        ReducerTest::new(TestReducer)
            .given_state(3)
            .when_action(Action::new("UNRELATED"))
            .then_unchanged()
            .run();
    }

    #[test]
    fn test_reducer_test_null() {
        ReducerTest::new(TestReducer)
            .given_state(3)
            .when_action(Action::new("BREAK"))
            .then_null()
            .run();
    }

    #[test]
    #[should_panic(expected = "to return the given slice")]
    fn test_reducer_test_unchanged_fails_on_new_slice() {
        ReducerTest::new(TestReducer)
            .given_state(3)
            .when_action(Action::new("INCREMENT"))
            .then_unchanged()
            .run();
    }
}
