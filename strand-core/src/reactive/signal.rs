//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which effects depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read while an effect is running, the signal
//!    registers that effect as a subscriber and becomes the effect's
//!    unsubscribe binding.
//!
//! 2. When a signal is written, every subscriber present at the start of
//!    the write is re-run, in subscription order, before the write returns.
//!
//! 3. There is no equality check: writing the same value notifies again.
//!
//! # Memory Layout
//!
//! Each signal consists of:
//! - A unique ID (8 bytes)
//! - The value (behind `Arc<RwLock<_>>`, shared by clones)
//! - A subscriber set (grows with number of dependents)

use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::context::ReactiveContext;
use super::subscriber::{SubscriberId, SubscriberSet, Subscription};

/// Counter for generating unique signal IDs.
static SIGNAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique signal ID.
fn next_signal_id() -> u64 {
    SIGNAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A reactive cell holding a value of type `T`.
///
/// Clones are handles to the same cell.
///
/// The closures passed to [`with`](Self::with) and
/// [`update`](Self::update) run while the value is locked for reading and
/// must not write to the same signal, directly or through the effects of
/// another signal they write.
///
/// # Example
///
/// ```rust
/// use strand_core::create_signal;
///
/// let count = create_signal(0);
/// assert_eq!(count.get(), 0);
///
/// count.set(5);
/// count.update(|n| n + 1);
/// assert_eq!(count.get(), 6);
/// ```
pub struct Signal<T>
where
    T: Send + Sync + 'static,
{
    id: u64,
    value: Arc<RwLock<T>>,
    subscribers: Arc<SubscriberSet>,
}

impl<T> Signal<T>
where
    T: Send + Sync + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        let id = next_signal_id();
        Self {
            id,
            value: Arc::new(RwLock::new(value)),
            subscribers: Arc::new(SubscriberSet::new(id)),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Subscribe the innermost running effect, if there is one.
    fn track(&self) {
        let Some(context) = ReactiveContext::current() else {
            return;
        };
        if context.is_disposed() {
            return;
        }

        if self.subscribers.insert(&context) {
            tracing::trace!(signal = self.id, subscriber = ?context.id(), "subscribed");
        }
        context.bind(Subscription::new(&self.subscribers));
    }

    /// Borrow the current value.
    ///
    /// Tracks like [`get`](Self::get). The same write restriction as
    /// [`update`](Self::update) applies to `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&*self.value.read())
    }

    /// Borrow the current value without tracking.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.value.read())
    }

    /// Set a new value and re-run subscribers.
    pub fn set(&self, value: T) {
        let previous = std::mem::replace(&mut *self.value.write(), value);
        drop(previous);

        self.notify_subscribers();
    }

    /// Replace the value with `f(&current)`.
    ///
    /// Notifies exactly like [`set`](Self::set). `f` runs under the value's
    /// read lock: it may read other signals, but any write that reaches this
    /// signal, including one made by an effect of another signal `f` writes,
    /// deadlocks. Compute such writes after `update` returns.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = self.with_untracked(f);
        self.set(next);
    }

    /// Run every subscriber present before the pass started.
    fn notify_subscribers(&self) {
        let subscribers = self.subscribers.snapshot();
        if subscribers.is_empty() {
            return;
        }

        tracing::trace!(signal = self.id, count = subscribers.len(), "notifying subscribers");
        for context in subscribers {
            context.run();

            // A disposed context only lingers here through a stale binding.
            if context.is_disposed() && self.subscribers.remove(context.id()) {
                tracing::trace!(signal = self.id, subscriber = ?context.id(), "pruned disposed subscriber");
            }
        }
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Whether the effect known by `subscriber` would re-run on the next
    /// write.
    pub fn has_subscriber(&self, subscriber: SubscriberId) -> bool {
        self.subscribers.contains(subscriber)
    }
}

impl<T> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Get the current value.
    ///
    /// If called while an effect is running, this also subscribes that
    /// effect.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> T {
        self.with_untracked(T::clone)
    }
}

/// Create a signal. Shorthand for [`Signal::new`].
pub fn create_signal<T>(value: T) -> Signal<T>
where
    T: Send + Sync + 'static,
{
    Signal::new(value)
}

impl<T> Clone for Signal<T>
where
    T: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Arc::clone(&self.value),
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

impl<T> Default for Signal<T>
where
    T: Default + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Debug for Signal<T>
where
    T: Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_untracked(|value| {
            f.debug_struct("Signal")
                .field("id", &self.id)
                .field("value", value)
                .field("subscriber_count", &self.subscriber_count())
                .finish()
        })
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{create_effect, create_effect_with, CleanupPolicy, EffectOptions};
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicI32;

    #[test]
    fn signal_get_and_set() {
        let signal = Signal::new(0);
        assert_eq!(signal.get(), 0);

        signal.set(42);
        assert_eq!(signal.get(), 42);
    }

    #[test]
    fn signal_update() {
        let signal = Signal::new(10);
        signal.update(|v| v + 5);
        assert_eq!(signal.get(), 15);
    }

    #[test]
    fn read_outside_effect_does_not_subscribe() {
        let signal = create_signal("plain");

        assert_eq!(signal.get(), "plain");
        assert_eq!(signal.with(|s| s.len()), 5);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn unset_initial_value() {
        let signal: Signal<Option<u8>> = Signal::default();
        assert_eq!(signal.get(), None);

        signal.set(Some(3));
        assert_eq!(signal.get(), Some(3));
    }

    #[test]
    fn signal_clone_shares_state() {
        let signal1 = Signal::new(0);
        let signal2 = signal1.clone();

        signal1.set(42);
        assert_eq!(signal2.get(), 42);

        signal2.set(100);
        assert_eq!(signal1.get(), 100);
        assert_eq!(signal1.id(), signal2.id());
    }

    #[test]
    fn signal_ids_are_unique() {
        let s1 = Signal::new(0);
        let s2 = Signal::new(0);
        let s3 = Signal::new(0);

        assert_ne!(s1.id(), s2.id());
        assert_ne!(s2.id(), s3.id());
        assert_ne!(s1.id(), s3.id());
    }

    #[test]
    fn repeated_reads_subscribe_once() {
        let signal = Signal::new(1);
        let runs = Arc::new(AtomicI32::new(0));

        let (reader, counter) = (signal.clone(), runs.clone());
        let _effect = create_effect(move || {
            reader.get();
            reader.get();
            reader.with(|_| ());
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(signal.subscriber_count(), 1);

        signal.set(2);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn untracked_reads_do_not_subscribe() {
        let signal = Signal::new(1);
        let reader = signal.clone();

        let _effect = create_effect(move || {
            reader.get_untracked();
            reader.with_untracked(|_| ());
        });

        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn notifies_in_subscription_order() {
        let signal = Signal::new(0);
        let order = Arc::new(Mutex::new(Vec::new()));

        let _effects: Vec<_> = (0..3)
            .map(|n| {
                let (reader, order) = (signal.clone(), order.clone());
                create_effect(move || {
                    reader.get();
                    order.lock().push(n);
                })
            })
            .collect();
        order.lock().clear();

        signal.set(1);
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn subscribers_added_during_pass_wait_for_next_write() {
        let signal = Signal::new(0);
        let late_runs = Arc::new(AtomicI32::new(0));
        let spawned = Arc::new(Mutex::new(Vec::new()));

        let (reader, late, keep) = (signal.clone(), late_runs.clone(), spawned.clone());
        let _spawner = create_effect(move || {
            if reader.get() == 1 {
                let (inner_reader, late) = (reader.clone(), late.clone());
                keep.lock().push(create_effect(move || {
                    inner_reader.get();
                    late.fetch_add(1, Ordering::SeqCst);
                }));
            }
        });

        signal.set(1);
        // One run from its own construction, none from the pass that made it
        assert_eq!(late_runs.load(Ordering::SeqCst), 1);

        signal.set(2);
        assert_eq!(late_runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn stale_subscriber_is_pruned_on_write() {
        let first = Signal::new(0);
        let second = Signal::new(0);
        let runs = Arc::new(AtomicI32::new(0));

        let (a, b, counter) = (first.clone(), second.clone(), runs.clone());
        let effect = create_effect(move || {
            a.get();
            b.get();
            counter.fetch_add(1, Ordering::SeqCst);
        });

        effect.dispose();
        // Only the last signal read was released
        assert_eq!(first.subscriber_count(), 1);
        assert_eq!(second.subscriber_count(), 0);

        first.set(1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(first.subscriber_count(), 0);
    }

    #[test]
    fn all_sources_policy_releases_everything() {
        let first = Signal::new(0);
        let second = Signal::new(0);

        let (a, b) = (first.clone(), second.clone());
        let effect = create_effect_with(
            EffectOptions::new().with_cleanup(CleanupPolicy::AllSources),
            move || {
                a.get();
                b.get();
            },
        );
        assert_eq!(first.subscriber_count(), 1);
        assert_eq!(second.subscriber_count(), 1);

        effect.dispose();
        assert_eq!(first.subscriber_count(), 0);
        assert_eq!(second.subscriber_count(), 0);
    }

    #[test]
    fn update_closure_reads_other_signals() {
        let step = Signal::new(3);
        let total = Signal::new(10);
        let seen = Arc::new(AtomicI32::new(0));

        let (reader, last) = (total.clone(), seen.clone());
        let _effect = create_effect(move || last.store(reader.get(), Ordering::SeqCst));

        total.update(|t| t + step.get());

        assert_eq!(total.get(), 13);
        assert_eq!(seen.load(Ordering::SeqCst), 13);
        assert_eq!(step.subscriber_count(), 0);
    }

    #[test]
    fn debug_shows_value() {
        let signal = Signal::new(7);
        let rendered = format!("{signal:?}");

        assert!(rendered.contains("value: 7"));
        assert!(rendered.contains("subscriber_count: 0"));
    }
}
