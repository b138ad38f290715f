//! Strand Core
//!
//! This crate provides a small fine-grained reactive engine.
//! It implements:
//!
//! - Signals: mutable cells that remember who read them
//! - Effects: computations that re-run when a signal they read is written
//! - Implicit dependency discovery through a per-thread context stack
//! - Explicit disposal of effects
//!
//! Everything runs synchronously on the calling thread. There is no
//! scheduler, no batching and no memoization; a write notifies its
//! subscribers before it returns.
//!
//! # Architecture
//!
//! - `reactive`: signals, effects and the tracking context
//! - `diagnostics`: where failing effect bodies are reported
//! - `error`: the error values handed to diagnostics
//!
//! # Example
//!
//! ```rust
//! use strand_core::{create_effect, create_signal};
//!
//! let count = create_signal(0);
//!
//! let reader = count.clone();
//! let dispose = create_effect(move || {
//!     println!("Count: {}", reader.get());
//! });
//! // Prints "Count: 0"
//!
//! count.set(5);
//! // Prints "Count: 5"
//!
//! dispose.dispose();
//! count.set(6);
//! // Prints nothing
//! ```

pub mod diagnostics;
pub mod error;
pub mod reactive;

pub use error::EffectError;
pub use reactive::{
    create_effect, create_effect_with, create_signal, CleanupPolicy, ContextState, Disposer,
    EffectOptions, EffectOutcome, ReactiveContext, Signal, SubscriberId,
};
