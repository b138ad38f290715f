//! Error values produced by effect bodies.
//!
//! These never propagate out of the engine. They are handed to the
//! diagnostic sink of the thread that ran the effect.

use std::any::Any;
use std::error::Error as StdError;

use thiserror::Error;

/// Boxed error returned by a failing effect body.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Why an effect run did not complete.
#[derive(Debug, Error)]
pub enum EffectError {
    /// The body returned `Err`.
    #[error("effect body failed: {0}")]
    Failed(#[source] BoxError),

    /// The body panicked. The payload is kept if it was a string.
    #[error("effect body panicked: {0}")]
    Panicked(String),
}

impl EffectError {
    /// Convert a payload caught by `catch_unwind`.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(message) => (*message).to_string(),
                Err(_) => "non-string panic payload".to_string(),
            },
        };
        Self::Panicked(message)
    }

    /// Whether the body panicked rather than returning an error.
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }
}
