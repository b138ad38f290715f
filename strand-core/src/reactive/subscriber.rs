//! Subscriber bookkeeping.
//!
//! Each signal owns a [`SubscriberSet`]: the execution contexts that read it
//! and must re-run when it is written. Each execution context holds
//! [`Subscription`]s pointing back at those sets so that disposal can remove
//! it again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;

use super::effect::ExecutionContext;

/// Unique identifier for a subscriber.
///
/// Every effect gets one when it is created. Signals key their subscriber
/// sets by it, so a context that reads the same signal twice in one run is
/// still notified once per write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// The contexts subscribed to one signal, in insertion order.
pub(crate) struct SubscriberSet {
    signal_id: u64,
    entries: Mutex<IndexMap<SubscriberId, Arc<ExecutionContext>>>,
}

impl SubscriberSet {
    pub(crate) fn new(signal_id: u64) -> Self {
        Self {
            signal_id,
            entries: Mutex::new(IndexMap::new()),
        }
    }

    pub(crate) fn signal_id(&self) -> u64 {
        self.signal_id
    }

    /// Add a context. Returns `false` if it was already subscribed.
    pub(crate) fn insert(&self, context: &Arc<ExecutionContext>) -> bool {
        self.entries
            .lock()
            .insert(context.id(), Arc::clone(context))
            .is_none()
    }

    /// Remove a context. Returns `false` if it was not subscribed.
    pub(crate) fn remove(&self, id: SubscriberId) -> bool {
        // shift_remove keeps the remaining notification order stable
        self.entries.lock().shift_remove(&id).is_some()
    }

    /// Copy of the current members, taken before a notification pass.
    pub(crate) fn snapshot(&self) -> Vec<Arc<ExecutionContext>> {
        self.entries.lock().values().cloned().collect()
    }

    pub(crate) fn contains(&self, id: SubscriberId) -> bool {
        self.entries.lock().contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// A context's handle on one signal it subscribed to.
///
/// Holds the set weakly: a subscription never keeps a signal alive.
pub(crate) struct Subscription {
    signal_id: u64,
    source: Weak<SubscriberSet>,
}

impl Subscription {
    pub(crate) fn new(source: &Arc<SubscriberSet>) -> Self {
        Self {
            signal_id: source.signal_id(),
            source: Arc::downgrade(source),
        }
    }

    pub(crate) fn signal_id(&self) -> u64 {
        self.signal_id
    }

    /// Remove `subscriber` from the signal, if the signal still exists.
    pub(crate) fn release(&self, subscriber: SubscriberId) {
        if let Some(source) = self.source.upgrade() {
            if source.remove(subscriber) {
                tracing::trace!(signal = self.signal_id, ?subscriber, "unsubscribed");
            }
        }
    }
}
