//! Per-effect configuration.

use std::borrow::Cow;

/// What an effect unsubscribes from when it re-runs or is disposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPolicy {
    /// Every signal read replaces the effect's single unsubscribe binding.
    ///
    /// Disposal therefore only detaches the effect from the signal it read
    /// last. Other signals keep a stale entry until their next write, which
    /// finds the effect disposed, skips it and drops the entry. Re-runs do
    /// not clear anything, so signals that are no longer read keep
    /// triggering the effect.
    #[default]
    LastRead,

    /// The effect remembers every signal it read.
    ///
    /// All of them are released on disposal, and before each re-run so that
    /// the new run tracks its dependencies from scratch.
    AllSources,
}

/// Options for [`create_effect_with`](super::create_effect_with).
///
/// ```rust
/// use strand_core::{CleanupPolicy, EffectOptions};
///
/// let options = EffectOptions::new()
///     .with_name("title-sync")
///     .with_cleanup(CleanupPolicy::AllSources);
///
/// assert_eq!(options.name(), Some("title-sync"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EffectOptions {
    name: Option<Cow<'static, str>>,
    cleanup: CleanupPolicy,
}

impl EffectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label used in logs and diagnostics.
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_cleanup(mut self, cleanup: CleanupPolicy) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn cleanup(&self) -> CleanupPolicy {
        self.cleanup
    }

    pub(crate) fn into_parts(self) -> (Option<Cow<'static, str>>, CleanupPolicy) {
        (self.name, self.cleanup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_last_read() {
        let options = EffectOptions::new();

        assert_eq!(options.cleanup(), CleanupPolicy::LastRead);
        assert_eq!(options.name(), None);
    }

    #[test]
    fn builder_sets_fields() {
        let options = EffectOptions::new()
            .with_name(format!("effect-{}", 3))
            .with_cleanup(CleanupPolicy::AllSources);

        assert_eq!(options.name(), Some("effect-3"));
        assert_eq!(options.cleanup(), CleanupPolicy::AllSources);
    }
}
