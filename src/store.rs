//! The card stack.
//!
//! [`FeedStore`] is the only owner of the ordered article sequence.  The
//! *last* element is the top card, the one the user is acting on.  The store
//! does no I/O and never refills itself; that is the coordinator's job.

use crate::error::{FeedError, Result};
use crate::source::Article;

#[derive(Debug, Default)]
pub struct FeedStore {
    /// Bottom first, top last.
    stack: Vec<Article>,
}

impl FeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the current stack and replace it with `batch`.
    pub fn replace(&mut self, batch: Vec<Article>) {
        self.stack = batch;
    }

    /// Slide `batch` in underneath the existing cards.
    ///
    /// Cards fetched earlier but not yet seen stay on top and are used up
    /// first; the new batch becomes the bottom of the stack.
    pub fn append(&mut self, batch: Vec<Article>) {
        if batch.is_empty() {
            return;
        }
        let existing = std::mem::replace(&mut self.stack, batch);
        self.stack.extend(existing);
    }

    /// Remove and return the top card.
    pub fn pop_top(&mut self) -> Result<Article> {
        self.stack.pop().ok_or(FeedError::EmptyStack)
    }

    pub fn top(&self) -> Option<&Article> {
        self.stack.last()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Cards in display order: top first.
    pub fn iter_top_first(&self) -> impl Iterator<Item = &Article> {
        self.stack.iter().rev()
    }

    /// Cards bottom first, as stored.
    #[cfg(test)]
    pub fn as_slice(&self) -> &[Article] {
        &self.stack
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
