//! Action creators - functions that build what gets dispatched
//!
//! An action creator returns a [`Dispatchable`]: either a plain [`Action`],
//! dispatched immediately, or a [`Thunk`], which is called with a [`Dispatch`]
//! handle and a snapshot of the state at the moment it runs. A thunk may
//! dispatch any number of times, conditionally, or later (for example from a
//! future spawned on a local executor). The dispatcher itself stays
//! synchronous.
//!
//! # Example
//!
//! ```
//! use flux_core::{Action, Store};
//! use flux_runtime::{Dispatchable, Dispatcher};
//! use std::rc::Rc;
//!
//! # fn main() -> Result<(), flux_runtime::DispatchError> {
//! let counter = Store::from_fn(|state: Option<Rc<i64>>, action: &Action| {
//!     let state = state.unwrap_or_else(|| Rc::new(0));
//!     match action.action_type() {
//!         "INCREMENT" => Some(Rc::new(*state + 1)),
//!         _ => Some(state),
//!     }
//! });
//! let dispatcher = Dispatcher::new();
//! dispatcher.receive_stores([("counter", counter)])?;
//!
//! let increment = dispatcher.wrap_action_creator(|()| Action::new("INCREMENT").into());
//! let increment_if_odd = dispatcher.wrap_action_creator(|()| {
//!     Dispatchable::thunk(|dispatch, state| {
//!         match state.get::<i64>("counter") {
//!             Some(count) if *count % 2 == 1 => dispatch.dispatch(Action::new("INCREMENT")),
//!             _ => Ok(()),
//!         }
//!     })
//! });
//!
//! increment(())?;
//! increment_if_odd(())?;
//! assert_eq!(dispatcher.state().get::<i64>("counter").as_deref(), Some(&2));
//! # Ok(())
//! # }
//! ```

use crate::dispatcher::{Dispatch, Dispatcher};
use crate::error::DispatchError;
use flux_core::{Action, AggregateState};
use std::fmt;

/// Deferred dispatch logic returned by an action creator
pub type Thunk = Box<dyn FnOnce(Dispatch, AggregateState) -> Result<(), DispatchError>>;

/// What an action creator returns
pub enum Dispatchable {
    /// Dispatched as soon as the creator returns
    Action(Action),
    /// Called with a dispatch handle and the current state
    Thunk(Thunk),
}

impl Dispatchable {
    /// Box a closure as a thunk
    #[must_use]
    pub fn thunk<F>(thunk: F) -> Self
    where
        F: FnOnce(Dispatch, AggregateState) -> Result<(), DispatchError> + 'static,
    {
        Self::Thunk(Box::new(thunk))
    }
}

impl From<Action> for Dispatchable {
    fn from(action: Action) -> Self {
        Self::Action(action)
    }
}

impl fmt::Debug for Dispatchable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action(action) => f.debug_tuple("Dispatchable::Action").field(action).finish(),
            Self::Thunk(_) => write!(f, "Dispatchable::Thunk(<thunk>)"),
        }
    }
}

impl Dispatch {
    /// Dispatch a plain action, or run a thunk against the live state
    ///
    /// # Errors
    ///
    /// Whatever the dispatch (or the thunk) returns;
    /// [`DispatchError::DispatcherDropped`] if the dispatcher is gone.
    pub fn run(&self, dispatchable: Dispatchable) -> Result<(), DispatchError> {
        match dispatchable {
            Dispatchable::Action(action) => self.dispatch(action),
            Dispatchable::Thunk(thunk) => {
                let state = self.state()?;
                tracing::trace!("Running thunk");
                thunk(self.clone(), state)
            }
        }
    }
}

impl Dispatcher {
    /// Bind an action creator to this dispatcher
    ///
    /// The returned function takes the creator's argument (use a tuple for
    /// several, `()` for none), calls the creator and dispatches the result.
    /// It holds only a weak handle, so it may outlive the dispatcher; calls
    /// made afterwards fail with [`DispatchError::DispatcherDropped`].
    pub fn wrap_action_creator<Args, F>(
        &self,
        creator: F,
    ) -> impl Fn(Args) -> Result<(), DispatchError> + use<Args, F>
    where
        Args: 'static,
        F: Fn(Args) -> Dispatchable + 'static,
    {
        let dispatch = self.dispatch_handle();
        move |args| dispatch.run(creator(args))
    }
}
