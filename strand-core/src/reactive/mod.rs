//! Reactive Primitives
//!
//! This module implements the reactive core: signals and effects, plus the
//! context stack that connects them.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! while an effect is running, the signal automatically registers that
//! effect as a subscriber. When the signal is written, every subscriber
//! re-runs.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation that runs once on creation and
//! again whenever a signal it read is written. Effects are used to
//! synchronize reactive state with external systems, such as a renderer or
//! a log.
//!
//! # Implementation Notes
//!
//! The system uses a thread-local stack of execution contexts to detect
//! dependencies. When a signal is read, we check if there is an active
//! context and, if so, subscribe it.
//!
//! Disposal detaches an effect from the signal(s) it is bound to, as chosen
//! by its [`CleanupPolicy`].

mod context;
mod effect;
mod options;
mod signal;
mod stack;
mod subscriber;

pub use context::ReactiveContext;
pub use effect::{create_effect, create_effect_with, ContextState, Disposer, EffectOutcome};
pub use options::{CleanupPolicy, EffectOptions};
pub use signal::{create_signal, Signal};
pub use subscriber::SubscriberId;
