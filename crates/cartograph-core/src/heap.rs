//! # Min-Heap
//!
//! Array-backed binary heap ordering search candidates by priority.
//!
//! The heap stores `(priority, value)` pairs and compares priorities only.
//! It has no decrease-key operation: the shortest-path search pushes a new
//! entry on every improvement and skips stale entries when they surface.

/// A binary min-heap of `(priority, value)` pairs.
///
/// - `push` / `pop` are `O(log n)`
/// - `peek` / `len` / `is_empty` are `O(1)`
/// - Equal priorities are legal; their relative pop order is unspecified
#[derive(Debug, Clone)]
pub struct MinHeap<P, V> {
    entries: Vec<(P, V)>,
}

impl<P: Ord, V> Default for MinHeap<P, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Ord, V> MinHeap<P, V> {
    /// Create an empty heap.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create an empty heap with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the heap is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The minimum entry, without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<(&P, &V)> {
        self.entries.first().map(|(p, v)| (p, v))
    }

    /// Insert a value with the given priority.
    pub fn push(&mut self, priority: P, value: V) {
        self.entries.push((priority, value));
        self.sift_up(self.entries.len() - 1);
    }

    /// Remove and return the entry with the smallest priority.
    ///
    /// Returns `None` on an empty heap.
    pub fn pop(&mut self) -> Option<(P, V)> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        let min = self.entries.pop();
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        min
    }

    fn sift_up(&mut self, mut child: usize) {
        while child > 0 {
            let parent = (child - 1) / 2;
            if self.entries[child].0 < self.entries[parent].0 {
                self.entries.swap(child, parent);
                child = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut parent: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * parent + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let smaller = if right < len && self.entries[right].0 < self.entries[left].0 {
                right
            } else {
                left
            };
            if self.entries[smaller].0 < self.entries[parent].0 {
                self.entries.swap(smaller, parent);
                parent = smaller;
            } else {
                break;
            }
        }
    }
}

impl<P: Ord, V> Extend<(P, V)> for MinHeap<P, V> {
    fn extend<I: IntoIterator<Item = (P, V)>>(&mut self, iter: I) {
        for (priority, value) in iter {
            self.push(priority, value);
        }
    }
}

impl<P: Ord, V> FromIterator<(P, V)> for MinHeap<P, V> {
    fn from_iter<I: IntoIterator<Item = (P, V)>>(iter: I) -> Self {
        let mut heap = Self::new();
        heap.extend(iter);
        heap
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_on_empty_heap_returns_none() {
        let mut heap: MinHeap<u32, &str> = MinHeap::new();
        assert!(heap.is_empty());
        assert_eq!(heap.pop(), None);
        assert!(heap.peek().is_none());
    }

    #[test]
    fn pops_in_ascending_priority() {
        let mut heap = MinHeap::new();
        for (p, v) in [(5, 'e'), (1, 'a'), (4, 'd'), (2, 'b'), (3, 'c')] {
            heap.push(p, v);
        }
        assert_eq!(heap.len(), 5);
        assert_eq!(heap.peek(), Some((&1, &'a')));

        let order: Vec<char> = std::iter::from_fn(|| heap.pop().map(|(_, v)| v)).collect();
        assert_eq!(order, vec!['a', 'b', 'c', 'd', 'e']);
        assert!(heap.is_empty());
    }

    #[test]
    fn duplicate_priorities_all_returned() {
        let mut heap: MinHeap<u32, u32> = [(7, 1), (7, 2), (3, 3), (7, 4)].into_iter().collect();

        assert_eq!(heap.pop(), Some((3, 3)));
        let mut rest: Vec<u32> = std::iter::from_fn(|| heap.pop().map(|(_, v)| v)).collect();
        rest.sort_unstable();
        assert_eq!(rest, vec![1, 2, 4]);
    }

    #[test]
    fn clear_empties_heap() {
        let mut heap = MinHeap::with_capacity(4);
        heap.push(1u8, ());
        heap.push(2u8, ());
        heap.clear();
        assert_eq!(heap.len(), 0);
        assert_eq!(heap.pop(), None);
    }
}
