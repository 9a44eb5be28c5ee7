//! Configuration for Dispatcher instances

/// What happens when `dispatch` is called while a dispatch is running
///
/// A nested dispatch comes from an observer callback, or from a thunk that
/// dispatches synchronously while being run by an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReentrancyPolicy {
    /// Append the action to a FIFO queue, drained after the running
    /// dispatch finishes its notification pass
    #[default]
    Queue,

    /// Fail the nested call with `DispatchError::NestedDispatch`
    Reject,
}

/// Configuration for Dispatcher instances
///
/// # Example
///
/// ```
/// use flux_runtime::{DispatcherConfig, ReentrancyPolicy};
///
/// let config = DispatcherConfig::default()
///     .with_reentrancy(ReentrancyPolicy::Reject)
///     .with_max_queued_actions(16);
///
/// assert_eq!(config.reentrancy, ReentrancyPolicy::Reject);
/// ```
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Handling of dispatches issued during a dispatch
    pub reentrancy: ReentrancyPolicy,
    /// Maximum number of queued nested dispatches
    pub max_queued_actions: usize,
}

impl DispatcherConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub const fn new(reentrancy: ReentrancyPolicy, max_queued_actions: usize) -> Self {
        Self {
            reentrancy,
            max_queued_actions,
        }
    }

    /// Set the reentrancy policy
    #[must_use]
    pub const fn with_reentrancy(mut self, reentrancy: ReentrancyPolicy) -> Self {
        self.reentrancy = reentrancy;
        self
    }

    /// Set the queue limit for nested dispatches
    #[must_use]
    pub const fn with_max_queued_actions(mut self, max_queued_actions: usize) -> Self {
        self.max_queued_actions = max_queued_actions;
        self
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            reentrancy: ReentrancyPolicy::Queue,
            max_queued_actions: 1024,
        }
    }
}
