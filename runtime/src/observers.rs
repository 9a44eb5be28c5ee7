//! Observer registry and subscription handles
//!
//! Observers are kept per store key, in subscription order. A single
//! `observe_stores` call adds one entry (sharing one [`SubscriptionId`]) to the
//! list of every key it watches; the id is what deduplicates notifications and
//! what `unsubscribe` removes.

use crate::dispatcher::DispatcherState;
use flux_core::AggregateState;
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Callback invoked with the new state
pub(crate) type ObserverFn = Rc<dyn Fn(&AggregateState)>;

/// Identity of one `observe_stores` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscription#{}", self.0)
    }
}

#[derive(Clone)]
pub(crate) struct Observer {
    pub(crate) id: SubscriptionId,
    pub(crate) on_change: ObserverFn,
}

/// Per-key observer lists
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    by_key: IndexMap<String, SmallVec<[Observer; 4]>>,
    next_id: u64,
}

impl ObserverRegistry {
    /// Make sure `key` has a (possibly empty) list
    pub(crate) fn ensure_key(&mut self, key: &str) {
        if !self.by_key.contains_key(key) {
            self.by_key.insert(key.to_string(), SmallVec::new());
        }
    }

    pub(crate) fn next_id(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }

    pub(crate) fn add(&mut self, key: &str, observer: Observer) {
        self.ensure_key(key);
        if let Some(list) = self.by_key.get_mut(key) {
            list.push(observer);
        }
    }

    /// Remove every entry of `id` under `keys`, returning how many were removed
    pub(crate) fn remove(&mut self, id: SubscriptionId, keys: &[String]) -> usize {
        let mut removed = 0;
        for key in keys {
            if let Some(list) = self.by_key.get_mut(key.as_str()) {
                let before = list.len();
                list.retain(|observer| observer.id != id);
                removed += before - list.len();
            }
        }
        removed
    }

    /// Observers of any of `changed_keys`, deduplicated, in gathering order
    pub(crate) fn gather<'a>(
        &self,
        changed_keys: impl IntoIterator<Item = &'a str>,
    ) -> SmallVec<[Observer; 8]> {
        let mut gathered: SmallVec<[Observer; 8]> = SmallVec::new();
        for key in changed_keys {
            let Some(list) = self.by_key.get(key) else {
                continue;
            };
            for observer in list {
                if !gathered.iter().any(|seen| seen.id == observer.id) {
                    gathered.push(observer.clone());
                }
            }
        }
        gathered
    }

    pub(crate) fn count(&self, key: &str) -> usize {
        self.by_key.get(key).map_or(0, SmallVec::len)
    }
}

/// Handle returned by `Dispatcher::observe_stores`
///
/// Dropping a subscription does not unsubscribe. Call
/// [`unsubscribe`](Self::unsubscribe) to stop future notifications; a
/// notification pass already in progress still completes.
pub struct Subscription {
    pub(crate) id: SubscriptionId,
    pub(crate) keys: Vec<String>,
    pub(crate) state: Weak<RefCell<DispatcherState>>,
}

impl Subscription {
    /// Identity of this subscription
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Store keys this subscription watches
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Stop notifying this subscription
    ///
    /// Idempotent, and a no-op once the dispatcher has been dropped.
    pub fn unsubscribe(&self) {
        let Some(state) = self.state.upgrade() else {
            tracing::trace!(subscription = %self.id, "Dispatcher already dropped");
            return;
        };
        let removed = state.borrow_mut().observers.remove(self.id, &self.keys);
        tracing::debug!(subscription = %self.id, removed, "Unsubscribed");
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}
