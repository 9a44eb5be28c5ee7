//! # Flux Testing
//!
//! Testing utilities and helpers for the Flux dispatcher.
//!
//! This crate provides:
//! - [`ReducerTest`]: Given-When-Then harness for a single reducer
//! - [`NotificationRecorder`]: an observer that records every notification
//! - [`ActionLog`]: a store that records every action it reduces
//! - [`init_test_tracing`]: tracing output routed to the test harness
//!
//! ## Example
//!
//! ```
//! use flux_core::Action;
//! use flux_testing::{ActionLog, NotificationRecorder};
//!
//! let log = ActionLog::new();
//! let store = log.store();
//! let slice = store.reduce(None, &Action::bootstrap());
//! let _ = store.reduce(slice.as_ref(), &Action::new("PING"));
//! assert_eq!(log.actions(), vec!["BOOTSTRAP_STORE", "PING"]);
//!
//! let recorder = NotificationRecorder::new();
//! assert_eq!(recorder.count(), 0);
//! ```

use flux_core::{Action, AggregateState, Store};
use std::cell::RefCell;
use std::rc::Rc;

/// Fluent reducer testing
pub mod reducer_test;

pub use reducer_test::ReducerTest;

/// Mock stores and observers
pub mod mocks {
    use super::{Action, AggregateState, RefCell, Rc, Store};

    /// Observer that records every state it is called with
    ///
    /// Clones share the same record.
    ///
    /// # Example
    ///
    /// ```
    /// use flux_core::AggregateState;
    /// use flux_testing::NotificationRecorder;
    ///
    /// let recorder = NotificationRecorder::new();
    /// let observer = recorder.observer();
    /// observer(&AggregateState::new());
    /// assert_eq!(recorder.count(), 1);
    /// ```
    #[derive(Debug, Clone, Default)]
    pub struct NotificationRecorder {
        calls: Rc<RefCell<Vec<AggregateState>>>,
    }

    impl NotificationRecorder {
        /// Create an empty recorder
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// A callback suitable for `Dispatcher::observe_stores`
        #[must_use]
        pub fn observer(&self) -> impl Fn(&AggregateState) + use<> {
            let calls = Rc::clone(&self.calls);
            move |state: &AggregateState| calls.borrow_mut().push(state.clone())
        }

        /// Number of recorded notifications
        #[must_use]
        pub fn count(&self) -> usize {
            self.calls.borrow().len()
        }

        /// The state passed to the most recent notification
        #[must_use]
        pub fn last(&self) -> Option<AggregateState> {
            self.calls.borrow().last().cloned()
        }

        /// Every recorded state, oldest first
        #[must_use]
        pub fn snapshots(&self) -> Vec<AggregateState> {
            self.calls.borrow().clone()
        }

        /// Forget everything recorded so far
        pub fn reset(&self) {
            self.calls.borrow_mut().clear();
        }
    }

    /// Store that records the type of every action it reduces
    ///
    /// Its slice is a unit value allocated once during bootstrap and returned
    /// unchanged afterwards, so it never triggers notifications after its
    /// first bootstrap.
    #[derive(Debug, Clone)]
    pub struct ActionLog {
        seen: Rc<RefCell<Vec<String>>>,
        store: Store,
    }

    impl ActionLog {
        /// Create a log with its own store identity
        #[must_use]
        pub fn new() -> Self {
            let seen = Rc::new(RefCell::new(Vec::new()));
            let sink = Rc::clone(&seen);
            let store = Store::from_fn(move |state: Option<Rc<()>>, action: &Action| {
                sink.borrow_mut().push(action.action_type().to_string());
                Some(state.unwrap_or_default())
            });
            Self { seen, store }
        }

        /// The store to register (always the same identity)
        #[must_use]
        pub fn store(&self) -> Store {
            self.store.clone()
        }

        /// Action types seen so far, in order
        #[must_use]
        pub fn actions(&self) -> Vec<String> {
            self.seen.borrow().clone()
        }

        /// How often an action type was seen
        #[must_use]
        pub fn count_of(&self, action_type: &str) -> usize {
            self.seen
                .borrow()
                .iter()
                .filter(|seen| seen.as_str() == action_type)
                .count()
        }
    }

    impl Default for ActionLog {
        fn default() -> Self {
            Self::new()
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Route tracing output to the test harness
    ///
    /// Honors `RUST_LOG`, defaulting to `flux_runtime=debug`. Safe to call from
    /// every test; only the first call installs a subscriber.
    pub fn init_test_tracing() {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("flux_runtime=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use helpers::init_test_tracing;
pub use mocks::{ActionLog, NotificationRecorder};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_action_log_keeps_identity() {
        let log = ActionLog::new();
        let store = log.store();

        let first = store.reduce(None, &Action::bootstrap());
        let second = store.reduce(first.as_ref(), &Action::new("PING"));

        assert!(Rc::ptr_eq(first.as_ref().unwrap(), second.as_ref().unwrap()));
        assert_eq!(log.actions(), vec!["BOOTSTRAP_STORE", "PING"]);
        assert_eq!(log.count_of("PING"), 1);
        assert_eq!(log.store().id(), store.id());
    }

    #[test]
    fn test_recorder_shares_record_between_clones() {
        let recorder = NotificationRecorder::new();
        let observer = recorder.clone().observer();

        observer(&AggregateState::new());
        observer(&AggregateState::new());
        assert_eq!(recorder.count(), 2);
        assert!(recorder.last().is_some());

        recorder.reset();
        assert_eq!(recorder.count(), 0);
        assert!(recorder.snapshots().is_empty());
    }
}
