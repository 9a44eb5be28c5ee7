//! Aggregate state - the combined slices of every registered store
//!
//! Each store owns one [`Slice`] of the [`AggregateState`], keyed by the name it
//! was registered under. Slices are reference counted and compared by
//! allocation identity: a store that returns the same `Rc` it was given is
//! reporting "nothing changed", and no observer of that key is notified.
//!
//! An `AggregateState` is itself a cheap, immutable snapshot. The dispatcher
//! replaces it wholesale on every dispatch, so a clone taken earlier keeps
//! describing the state at that moment.

use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// One store's portion of the aggregate state
pub type Slice = Rc<dyn Any>;

/// Whether two slices are the same allocation
#[must_use]
pub fn same_slice(a: &Slice, b: &Slice) -> bool {
    Rc::ptr_eq(a, b)
}

/// Immutable snapshot of every store's slice, in registration order
#[derive(Clone, Default)]
pub struct AggregateState {
    slices: Rc<IndexMap<String, Slice>>,
}

impl AggregateState {
    /// An empty state (no stores registered yet)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from already computed slices
    #[must_use]
    pub fn from_slices(slices: IndexMap<String, Slice>) -> Self {
        Self {
            slices: Rc::new(slices),
        }
    }

    /// The untyped slice stored under `key`
    #[must_use]
    pub fn slice(&self, key: &str) -> Option<&Slice> {
        self.slices.get(key)
    }

    /// The slice stored under `key`, downcast to `T`
    ///
    /// Returns `None` if the key is unknown or holds a different type.
    #[must_use]
    pub fn get<T: Any>(&self, key: &str) -> Option<Rc<T>> {
        let slice = Rc::clone(self.slices.get(key)?);
        slice.downcast::<T>().ok()
    }

    /// Whether a slice exists for `key`
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.slices.contains_key(key)
    }

    /// Keys in registration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slices.keys().map(String::as_str)
    }

    /// `(key, slice)` pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Slice)> {
        self.slices.iter().map(|(key, slice)| (key.as_str(), slice))
    }

    /// Number of slices
    #[must_use]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// Whether the state holds no slices
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Keys whose slice in `self` is not the same allocation as in `previous`
    ///
    /// Keys absent from `previous` count as changed.
    pub fn changed_since<'a>(&'a self, previous: &'a Self) -> impl Iterator<Item = &'a str> + 'a {
        self.iter()
            .filter(move |(key, slice)| {
                previous
                    .slice(key)
                    .is_none_or(|before| !same_slice(before, slice))
            })
            .map(|(key, _)| key)
    }

    /// Whether both values are the same snapshot
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.slices, &other.slices)
    }
}

/// Two states are equal when they hold the same keys and every slice is the
/// same allocation.
impl PartialEq for AggregateState {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.len() == other.len()
                && self.iter().all(|(key, slice)| {
                    other
                        .slice(key)
                        .is_some_and(|theirs| same_slice(slice, theirs))
                }))
    }
}

impl fmt::Debug for AggregateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateState")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}
