//! Store handles - identity-carrying, type-erased reducers
//!
//! The dispatcher needs two things from a store: a way to run it over an
//! untyped [`Slice`], and a stable identity so that callers can refer to the
//! store later (to subscribe to it) without knowing its registration key.
//! [`Store`] provides both. Every [`Store::new`] call allocates a fresh
//! [`StoreId`]; clones share it.
//!
//! Two stores built from the same reducer are distinct stores. Registering one
//! store under two keys produces two independent slices.

use crate::action::Action;
use crate::reducer::{from_fn, Reducer};
use crate::state::Slice;
use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a [`Store`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(u64);

impl StoreId {
    fn next() -> Self {
        Self(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store#{}", self.0)
    }
}

type ErasedReduce = dyn Fn(Option<&Slice>, &Action) -> Option<Slice>;

/// A registered (or registrable) reducer together with its identity
#[derive(Clone)]
pub struct Store {
    id: StoreId,
    reducer_name: &'static str,
    slice_type: TypeId,
    reduce: Rc<ErasedReduce>,
}

impl Store {
    /// Wrap a reducer, allocating a new identity
    ///
    /// A previous slice of a different type than `R::Slice` (left behind by a
    /// store this one replaced) is handed to the reducer as `None`.
    #[must_use]
    pub fn new<R>(reducer: R) -> Self
    where
        R: Reducer + 'static,
    {
        let reduce = move |previous: Option<&Slice>, action: &Action| {
            let previous = previous.and_then(|slice| Rc::clone(slice).downcast::<R::Slice>().ok());
            reducer.reduce(previous, action).map(|next| next as Slice)
        };

        Self {
            id: StoreId::next(),
            reducer_name: std::any::type_name::<R>(),
            slice_type: TypeId::of::<R::Slice>(),
            reduce: Rc::new(reduce),
        }
    }

    /// Wrap a closure as a store
    #[must_use]
    pub fn from_fn<T, F>(reduce: F) -> Self
    where
        T: Any,
        F: Fn(Option<Rc<T>>, &Action) -> Option<Rc<T>> + 'static,
    {
        Self::new(from_fn(reduce))
    }

    /// This store's identity
    #[must_use]
    pub const fn id(&self) -> StoreId {
        self.id
    }

    /// Type name of the wrapped reducer, for diagnostics
    #[must_use]
    pub const fn reducer_name(&self) -> &'static str {
        self.reducer_name
    }

    /// Whether `slice` has the type this store produces
    #[must_use]
    pub fn produces(&self, slice: &Slice) -> bool {
        Any::type_id(&**slice) == self.slice_type
    }

    /// Run the reducer over an untyped slice
    #[must_use]
    pub fn reduce(&self, previous: Option<&Slice>, action: &Action) -> Option<Slice> {
        (self.reduce)(previous, action)
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.id)
            .field("reducer", &self.reducer_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn counter() -> Store {
        Store::from_fn(|state: Option<Rc<i64>>, action: &Action| {
            let state = state.unwrap_or_else(|| Rc::new(0));
            match action.action_type() {
                "INCREMENT" => Some(Rc::new(*state + 1)),
                _ => Some(state),
            }
        })
    }

    #[test]
    fn test_each_store_gets_its_own_id() {
        let a = counter();
        let b = counter();

        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), a.clone().id());
    }

    #[test]
    fn test_erased_reduce_preserves_identity() {
        let store = counter();
        let initial = store.reduce(None, &Action::bootstrap()).unwrap();
        let unchanged = store.reduce(Some(&initial), &Action::new("NOOP")).unwrap();
        let changed = store.reduce(Some(&initial), &Action::new("INCREMENT")).unwrap();

        assert!(Rc::ptr_eq(&initial, &unchanged));
        assert!(!Rc::ptr_eq(&initial, &changed));
        assert_eq!(*changed.downcast::<i64>().unwrap(), 1);
    }

    #[test]
    fn test_foreign_slice_type_reseeds() {
        let store = counter();
        let foreign: Slice = Rc::new("not a number");

        assert!(!store.produces(&foreign));
        let next = store.reduce(Some(&foreign), &Action::bootstrap()).unwrap();
        assert!(store.produces(&next));
        assert_eq!(*next.downcast::<i64>().unwrap(), 0);
    }

    #[test]
    fn test_null_slice_is_reported_as_none() {
        let store = Store::from_fn(|_: Option<Rc<i64>>, _: &Action| None);
        assert!(store.reduce(None, &Action::bootstrap()).is_none());
    }
}
