//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever a signal
//! it read is written.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its body immediately to establish
//!    initial subscriptions.
//!
//! 2. While the body runs, the effect's execution context sits on top of
//!    the context stack, so every signal it reads subscribes it.
//!
//! 3. When one of those signals is written, the signal runs the context
//!    again, synchronously, and the body re-tracks what it reads.
//!
//! 4. The [`Disposer`] returned at creation detaches the effect. A disposed
//!    effect never runs its body again.
//!
//! # Failures
//!
//! A body may return `()` or `Result<(), E>`. An `Err`, or a panic, is
//! turned into an [`EffectError`] and handed to the thread's diagnostic
//! sink. The writer that triggered the run never sees it, and the context
//! stack is popped either way. Subscriptions made before the failure stay.

use std::borrow::Cow;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;

use super::context::ReactiveContext;
use super::options::{CleanupPolicy, EffectOptions};
use super::subscriber::{SubscriberId, Subscription};
use crate::diagnostics::{self, Diagnostic};
use crate::error::{BoxError, EffectError};

type Body = Arc<dyn Fn() -> Result<(), EffectError> + Send + Sync>;

/// What an effect body may return.
///
/// Implemented for `()` and for `Result<(), E>` with any error that boxes
/// into a `dyn Error`.
pub trait EffectOutcome {
    fn into_result(self) -> Result<(), EffectError>;
}

impl EffectOutcome for () {
    fn into_result(self) -> Result<(), EffectError> {
        Ok(())
    }
}

impl<E> EffectOutcome for Result<(), E>
where
    E: Into<BoxError>,
{
    fn into_result(self) -> Result<(), EffectError> {
        self.map_err(|err| EffectError::Failed(err.into()))
    }
}

/// Lifecycle of an execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Created, body not yet run to completion.
    Fresh,
    /// Has run at least once and may be re-run by its signals.
    Tracking,
    /// Detached. Terminal.
    Disposed,
}

/// The tracking identity of one effect.
///
/// Re-used across every run of the effect. Signals hold it as a subscriber;
/// the context stack holds it while the body runs.
pub(crate) struct ExecutionContext {
    id: SubscriberId,
    name: Option<Cow<'static, str>>,
    policy: CleanupPolicy,
    /// Taken on disposal so the body's captures are released.
    body: Mutex<Option<Body>>,
    state: Mutex<ContextState>,
    /// Unsubscribe handles. Holds at most one entry under `LastRead`.
    bindings: Mutex<SmallVec<[Subscription; 2]>>,
    runs: AtomicUsize,
}

impl ExecutionContext {
    pub(crate) fn new(options: EffectOptions, body: Body) -> Arc<Self> {
        let (name, policy) = options.into_parts();
        Arc::new(Self {
            id: SubscriberId::new(),
            name,
            policy,
            body: Mutex::new(Some(body)),
            state: Mutex::new(ContextState::Fresh),
            bindings: Mutex::new(SmallVec::new()),
            runs: AtomicUsize::new(0),
        })
    }

    pub(crate) fn id(&self) -> SubscriberId {
        self.id
    }

    pub(crate) fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn state(&self) -> ContextState {
        *self.state.lock()
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.state() == ContextState::Disposed
    }

    pub(crate) fn run_count(&self) -> usize {
        self.runs.load(Ordering::Relaxed)
    }

    /// Record the unsubscribe handle of a signal this context just read.
    pub(crate) fn bind(&self, subscription: Subscription) {
        let mut bindings = self.bindings.lock();
        match self.policy {
            CleanupPolicy::LastRead => {
                bindings.clear();
                bindings.push(subscription);
            }
            CleanupPolicy::AllSources => {
                if !bindings
                    .iter()
                    .any(|bound| bound.signal_id() == subscription.signal_id())
                {
                    bindings.push(subscription);
                }
            }
        }
    }

    /// Execute the body with this context on top of the stack.
    ///
    /// A disposed context does nothing: no body run, no push, no new
    /// subscriptions.
    pub(crate) fn run(self: &Arc<Self>) {
        let Some(body) = self.body.lock().clone() else {
            tracing::trace!(subscriber = ?self.id, "skipping disposed effect");
            return;
        };

        if self.policy == CleanupPolicy::AllSources {
            self.release_bindings();
        }

        let result = {
            let _ctx = ReactiveContext::enter(Arc::clone(self));
            panic::catch_unwind(AssertUnwindSafe(|| body()))
                .unwrap_or_else(|payload| Err(EffectError::from_panic(payload)))
        };

        self.runs.fetch_add(1, Ordering::Relaxed);
        {
            let mut state = self.state.lock();
            if *state == ContextState::Fresh {
                *state = ContextState::Tracking;
            }
        }

        if let Err(error) = result {
            diagnostics::report(Diagnostic::new(self.id, self.name.clone(), error));
        }
    }

    /// Detach from the bound signal(s) and never run again. Idempotent.
    pub(crate) fn dispose(&self) {
        let body = {
            let mut state = self.state.lock();
            if *state == ContextState::Disposed {
                return;
            }
            *state = ContextState::Disposed;
            self.body.lock().take()
        };

        self.release_bindings();
        drop(body);

        tracing::debug!(subscriber = ?self.id, effect = self.name(), "disposed effect");
    }

    fn release_bindings(&self) {
        let released = std::mem::take(&mut *self.bindings.lock());
        for subscription in released {
            subscription.release(self.id);
        }
    }

    #[cfg(test)]
    pub(crate) fn idle() -> Arc<Self> {
        Self::new(
            EffectOptions::new(),
            Arc::new(|| -> Result<(), EffectError> { Ok(()) }),
        )
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state())
            .field("runs", &self.run_count())
            .finish()
    }
}

/// Handle returned by [`create_effect`]. Calling [`dispose`](Self::dispose)
/// stops the effect.
///
/// Dropping the handle does not dispose the effect; it keeps running for as
/// long as a signal holds it as a subscriber. An effect whose body captures
/// a signal it subscribes to forms a reference cycle through that signal, so
/// it is never freed until it is disposed, even once every handle is gone.
#[derive(Clone)]
pub struct Disposer {
    context: Arc<ExecutionContext>,
}

impl Disposer {
    /// Unsubscribe and mark the effect inert.
    ///
    /// Calling this more than once has no further effect.
    pub fn dispose(&self) {
        self.context.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.context.is_disposed()
    }

    pub fn state(&self) -> ContextState {
        self.context.state()
    }

    /// How many times the body has run, failed runs included.
    pub fn run_count(&self) -> usize {
        self.context.run_count()
    }

    /// The subscriber identity signals know this effect by.
    pub fn id(&self) -> SubscriberId {
        self.context.id()
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Disposer").field(&self.context).finish()
    }
}

/// Create an effect with default options.
///
/// The body runs once before this returns.
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use strand_core::{create_effect, create_signal};
///
/// let name = create_signal("world");
/// let seen = Arc::new(Mutex::new(Vec::new()));
///
/// let (reader, log) = (name.clone(), seen.clone());
/// let effect = create_effect(move || log.lock().unwrap().push(reader.get()));
///
/// name.set("strand");
/// effect.dispose();
/// name.set("ignored");
///
/// assert_eq!(*seen.lock().unwrap(), vec!["world", "strand"]);
/// ```
pub fn create_effect<F, R>(body: F) -> Disposer
where
    F: Fn() -> R + Send + Sync + 'static,
    R: EffectOutcome,
{
    create_effect_with(EffectOptions::default(), body)
}

/// Create an effect with explicit [`EffectOptions`].
pub fn create_effect_with<F, R>(options: EffectOptions, body: F) -> Disposer
where
    F: Fn() -> R + Send + Sync + 'static,
    R: EffectOutcome,
{
    let body: Body = Arc::new(move || body().into_result());
    let context = ExecutionContext::new(options, body);

    tracing::debug!(
        subscriber = ?context.id(),
        effect = context.name(),
        policy = ?context.policy,
        "created effect"
    );

    context.run();
    Disposer { context }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
