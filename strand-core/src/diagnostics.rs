//! Diagnostics
//!
//! Effect bodies that fail are never reported to the code that wrote the
//! signal. Instead, each failed run produces one [`Diagnostic`], delivered to
//! the sink installed on the current thread.
//!
//! The default sink, [`TracingSink`], logs the failure as a `tracing` error
//! event with target [`COMPONENT`]. Install another sink to collect reports
//! somewhere else:
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use strand_core::diagnostics::{self, Diagnostic};
//! use strand_core::{create_effect, create_signal};
//!
//! let failures = Arc::new(Mutex::new(Vec::new()));
//! let sink = failures.clone();
//! diagnostics::set_sink(Arc::new(move |report: &Diagnostic| {
//!     sink.lock().unwrap().push(report.error().to_string());
//! }));
//!
//! let count = create_signal(0);
//! let reader = count.clone();
//! let _effect = create_effect(move || {
//!     if reader.get() > 0 {
//!         return Err("positive");
//!     }
//!     Ok(())
//! });
//! count.set(1);
//!
//! assert_eq!(*failures.lock().unwrap(), vec!["effect body failed: positive"]);
//! diagnostics::reset_sink();
//! ```

use std::borrow::Cow;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::EffectError;
use crate::reactive::SubscriberId;

/// Tag attached to every diagnostic and used as the log target.
pub const COMPONENT: &str = "strand";

/// One failed effect run.
#[derive(Debug)]
pub struct Diagnostic {
    component: &'static str,
    subscriber: SubscriberId,
    effect: Option<Cow<'static, str>>,
    error: EffectError,
}

impl Diagnostic {
    pub(crate) fn new(
        subscriber: SubscriberId,
        effect: Option<Cow<'static, str>>,
        error: EffectError,
    ) -> Self {
        Self {
            component: COMPONENT,
            subscriber,
            effect,
            error,
        }
    }

    pub fn component(&self) -> &'static str {
        self.component
    }

    /// The effect whose body failed.
    pub fn subscriber(&self) -> SubscriberId {
        self.subscriber
    }

    /// The effect's name, if it was created with one.
    pub fn effect(&self) -> Option<&str> {
        self.effect.as_deref()
    }

    pub fn error(&self) -> &EffectError {
        &self.error
    }

    pub fn into_error(self) -> EffectError {
        self.error
    }
}

/// Receives failed effect runs.
///
/// Sinks are called synchronously from inside the signal write that
/// triggered the run. A sink that panics is caught; the report is then
/// logged through [`TracingSink`] instead.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&Diagnostic) + Send + Sync,
{
    fn report(&self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}

/// Default sink: logs through `tracing` at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        tracing::error!(
            target: COMPONENT,
            subscriber = ?diagnostic.subscriber(),
            effect = diagnostic.effect(),
            error = %diagnostic.error(),
            "[{}] effect run failed",
            diagnostic.component()
        );
    }
}

thread_local! {
    static SINK: RefCell<Arc<dyn DiagnosticSink>> = RefCell::new(Arc::new(TracingSink));
}

/// Install `sink` for the current thread, returning the previous one.
pub fn set_sink(sink: Arc<dyn DiagnosticSink>) -> Arc<dyn DiagnosticSink> {
    SINK.with(|current| current.replace(sink))
}

/// Restore the default [`TracingSink`] for the current thread.
pub fn reset_sink() {
    set_sink(Arc::new(TracingSink));
}

/// Deliver `diagnostic` to the current thread's sink.
pub(crate) fn report(diagnostic: Diagnostic) {
    // clone out so a sink may install another sink while reporting
    let Ok(sink) = SINK.try_with(|current| Arc::clone(&current.borrow())) else {
        TracingSink.report(&diagnostic);
        return;
    };

    if panic::catch_unwind(AssertUnwindSafe(|| sink.report(&diagnostic))).is_err() {
        tracing::warn!(target: COMPONENT, "diagnostic sink panicked");
        TracingSink.report(&diagnostic);
    }
}
