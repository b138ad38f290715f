//! Reactive Context
//!
//! The reactive context tracks which effect is currently running.
//! This enables automatic dependency tracking: when a signal is read,
//! it registers the current effect as a subscriber.
//!
//! # Implementation
//!
//! We use a thread-local stack to track the currently executing effect.
//! When an effect runs, its execution context is pushed onto the stack and
//! popped again when the run completes. An effect body that creates another
//! effect nests a second entry on top; signals only ever see the innermost.
//!
//! The stack is empty whenever no effect is running.

use std::cell::RefCell;
use std::sync::Arc;

use super::effect::ExecutionContext;
use super::stack::ContextStack;
use super::SubscriberId;

thread_local! {
    static CONTEXT_STACK: RefCell<ContextStack<Arc<ExecutionContext>>> =
        RefCell::new(ContextStack::new());
}

/// Guard that pops the context when dropped.
///
/// This ensures the context stack is properly maintained even if
/// the effect body panics.
pub struct ReactiveContext {
    subscriber_id: SubscriberId,
}

impl ReactiveContext {
    /// Push `context` as the innermost running effect.
    ///
    /// The context is popped again when the returned guard is dropped.
    pub(crate) fn enter(context: Arc<ExecutionContext>) -> Self {
        let subscriber_id = context.id();
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(context));
        Self { subscriber_id }
    }

    /// Check if there is an active reactive context.
    pub fn is_active() -> bool {
        CONTEXT_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// Number of effects currently running on this thread, innermost
    /// included.
    pub fn depth() -> usize {
        CONTEXT_STACK.with(|stack| stack.borrow().len())
    }

    /// Get the current subscriber ID, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        CONTEXT_STACK.with(|stack| stack.borrow().peek().map(|context| context.id()))
    }

    /// The innermost running context.
    pub(crate) fn current() -> Option<Arc<ExecutionContext>> {
        CONTEXT_STACK.with(|stack| stack.borrow().peek().cloned())
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        // try_with: the guard may be dropped while thread locals are torn down
        let _ = CONTEXT_STACK.try_with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(context) = popped {
                debug_assert_eq!(
                    context.id(),
                    self.subscriber_id,
                    "ReactiveContext mismatch: expected {:?}, got {:?}",
                    self.subscriber_id,
                    context.id()
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_context() -> Arc<ExecutionContext> {
        ExecutionContext::idle()
    }

    #[test]
    fn context_tracks_subscriber() {
        let context = idle_context();
        let id = context.id();

        assert!(!ReactiveContext::is_active());
        assert!(ReactiveContext::current_subscriber().is_none());

        {
            let _ctx = ReactiveContext::enter(context);

            assert!(ReactiveContext::is_active());
            assert_eq!(ReactiveContext::depth(), 1);
            assert_eq!(ReactiveContext::current_subscriber(), Some(id));
        }

        // Context should be cleaned up after drop
        assert!(!ReactiveContext::is_active());
        assert_eq!(ReactiveContext::depth(), 0);
        assert!(ReactiveContext::current_subscriber().is_none());
    }

    #[test]
    fn nested_contexts() {
        let outer = idle_context();
        let inner = idle_context();
        let (id1, id2) = (outer.id(), inner.id());

        {
            let _ctx1 = ReactiveContext::enter(outer);
            assert_eq!(ReactiveContext::current_subscriber(), Some(id1));

            {
                let _ctx2 = ReactiveContext::enter(inner);
                assert_eq!(ReactiveContext::current_subscriber(), Some(id2));
                assert_eq!(ReactiveContext::depth(), 2);
            }

            // After inner context drops, outer should be current
            assert_eq!(ReactiveContext::current_subscriber(), Some(id1));
            assert_eq!(
                ReactiveContext::current().map(|context| context.id()),
                Some(id1)
            );
        }

        assert!(ReactiveContext::current_subscriber().is_none());
    }

    #[test]
    fn guard_pops_during_unwind() {
        let context = idle_context();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _ctx = ReactiveContext::enter(context);
            panic!("body blew up");
        }));

        assert!(result.is_err());
        assert_eq!(ReactiveContext::depth(), 0);
    }
}
