//! Bounded undo/redo history over reversible actions.

use std::collections::VecDeque;

/// Maximum number of undo entries kept by default.
pub const DEFAULT_UNDO_DEPTH: usize = 50;

/// An action that knows how to re-apply and invert itself against a target.
///
/// Actions are plain data; new kinds only need a new implementation, never
/// a change to [`History`].
pub trait Reversible {
    type Target;

    /// Re-apply the forward effect.
    fn apply(&self, target: &mut Self::Target);

    /// Undo the forward effect.
    fn revert(&self, target: &mut Self::Target);
}

/// Two-stack undo/redo history.
///
/// Recording a new action discards everything on the redo stack. When the
/// undo stack reaches capacity the oldest entry is dropped.
#[derive(Debug, Clone)]
pub struct History<A> {
    undo: VecDeque<A>,
    redo: Vec<A>,
    capacity: usize,
}

impl<A> Default for History<A> {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_DEPTH)
    }
}

impl<A> History<A> {
    /// Create an empty history keeping at most `capacity` undo entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Push an action that has already been applied.
    pub fn record(&mut self, action: A) {
        self.undo.push_back(action);
        self.redo.clear();
        if self.undo.len() > self.capacity {
            self.undo.pop_front();
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// The action a call to `redo` would re-apply.
    pub fn peek_redo(&self) -> Option<&A> {
        self.redo.last()
    }

    /// The action a call to `undo` would revert.
    pub fn peek_undo(&self) -> Option<&A> {
        self.undo.back()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop both stacks.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

impl<A: Reversible> History<A> {
    /// Revert the most recent action.
    /// Returns true if an action was reverted, false if there was nothing to undo.
    pub fn undo(&mut self, target: &mut A::Target) -> bool {
        let Some(action) = self.undo.pop_back() else {
            return false;
        };
        action.revert(target);
        self.redo.push(action);
        true
    }

    /// Re-apply the most recently undone action.
    /// Returns true if an action was re-applied, false if there was nothing to redo.
    pub fn redo(&mut self, target: &mut A::Target) -> bool {
        let Some(action) = self.redo.pop() else {
            return false;
        };
        action.apply(target);
        self.undo.push_back(action);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Add(i32);

    impl Reversible for Add {
        type Target = i32;

        fn apply(&self, target: &mut i32) {
            *target += self.0;
        }

        fn revert(&self, target: &mut i32) {
            *target -= self.0;
        }
    }

    fn run(history: &mut History<Add>, value: &mut i32, action: Add) {
        action.apply(value);
        history.record(action);
    }

    #[test]
    fn test_undo_redo_roundtrip() {
        let mut history = History::default();
        let mut value = 0;
        run(&mut history, &mut value, Add(5));
        let after = value;

        assert!(history.undo(&mut value));
        assert_eq!(value, 0);
        assert!(history.redo(&mut value));
        assert_eq!(value, after);
    }

    #[test]
    fn test_redo_branching() {
        let mut history = History::default();
        let mut value = 0;
        run(&mut history, &mut value, Add(1));
        run(&mut history, &mut value, Add(10));

        assert!(history.undo(&mut value));
        assert_eq!(history.redo_len(), 1);
        assert_eq!(history.peek_redo(), Some(&Add(10)));

        run(&mut history, &mut value, Add(100));
        assert_eq!(history.redo_len(), 0);
        assert!(!history.redo(&mut value));
        assert_eq!(value, 101);
    }

    #[test]
    fn test_empty_history() {
        let mut history: History<Add> = History::default();
        let mut value = 7;
        assert!(!history.undo(&mut value));
        assert!(!history.redo(&mut value));
        assert_eq!(value, 7);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = History::new(3);
        let mut value = 0;
        for i in 1..=5 {
            run(&mut history, &mut value, Add(i));
        }
        assert_eq!(history.undo_len(), 3);
        while history.undo(&mut value) {}
        // 1 and 2 fell off the bottom.
        assert_eq!(value, 3);
    }

    #[test]
    fn test_clear() {
        let mut history = History::default();
        let mut value = 0;
        run(&mut history, &mut value, Add(1));
        history.undo(&mut value);
        run(&mut history, &mut value, Add(2));
        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
