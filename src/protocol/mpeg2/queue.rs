//! Double-ended queue backing the lookahead window

use std::collections::VecDeque;

/// FIFO of buffered items with access to both ends
///
/// The smoothing buffer pushes newly read packets at the back, inspects the
/// back for PCRs and sends from the front.
#[derive(Debug, Clone)]
pub struct LookaheadQueue<T> {
    items: VecDeque<T>,
}

impl<T> LookaheadQueue<T> {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Create an empty queue with room for `capacity` items
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
        }
    }

    /// Append at the back
    pub fn push_back(&mut self, item: T) {
        self.items.push_back(item);
    }

    /// Prepend at the front
    pub fn push_front(&mut self, item: T) {
        self.items.push_front(item);
    }

    /// Remove from the front
    pub fn pop_front(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Remove from the back
    pub fn pop_back(&mut self) -> Option<T> {
        self.items.pop_back()
    }

    /// Oldest item
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    /// Newest item
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.items.back()
    }

    /// Number of items
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop every item
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Iterate front to back
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter()
    }
}

impl<T> Default for LookaheadQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
