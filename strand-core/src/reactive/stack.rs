//! LIFO storage for the tracking context.
//!
//! Only the top of the stack is ever observed, so the structure grows and
//! shrinks at one end. Nesting is usually shallow, so the first few entries
//! live inline and deeper nesting spills to the heap.

use smallvec::SmallVec;

/// Entries kept inline before the stack allocates.
const INLINE_DEPTH: usize = 8;

/// A last-in-first-out stack of execution contexts.
#[derive(Debug)]
pub(crate) struct ContextStack<T> {
    entries: SmallVec<[T; INLINE_DEPTH]>,
}

impl<T> ContextStack<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: SmallVec::new(),
        }
    }

    /// Push onto the top.
    pub(crate) fn push(&mut self, entry: T) {
        self.entries.push(entry);
    }

    /// Remove and return the top entry, or `None` if the stack is empty.
    pub(crate) fn pop(&mut self) -> Option<T> {
        self.entries.pop()
    }

    /// The top entry without removing it.
    pub(crate) fn peek(&self) -> Option<&T> {
        self.entries.last()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for ContextStack<T> {
    fn default() -> Self {
        Self::new()
    }
}
