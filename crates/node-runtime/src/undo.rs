//! Undo/redo history using compressed snapshots
//!
//! Each recorded state is a zstd-compressed [`TreeSnapshot`]. Undo and
//! redo restore the tree from the neighbouring snapshot, which replays
//! inserts and connects and therefore works for any kind of edit.

use std::collections::VecDeque;

use crate::error::Result;
use crate::snapshot::TreeSnapshot;
use crate::tree::NodeTree;

/// Bounded undo/redo history for one tree
pub struct UndoHistory {
    /// Compressed tree states
    snapshots: VecDeque<Vec<u8>>,
    /// Index of the state the tree currently matches
    current: usize,
    max_snapshots: usize,
}

impl UndoHistory {
    /// Create a history keeping at most `max_snapshots` states
    pub fn new(max_snapshots: usize) -> Self {
        Self {
            snapshots: VecDeque::new(),
            current: 0,
            max_snapshots: max_snapshots.max(1),
        }
    }

    /// Record the tree's current state.
    ///
    /// Discards any redo history.
    pub fn record(&mut self, tree: &NodeTree) -> Result<()> {
        let compressed = tree.snapshot().to_compressed()?;

        self.snapshots.truncate(self.current + 1);
        self.snapshots.push_back(compressed);
        self.current = self.snapshots.len() - 1;

        while self.snapshots.len() > self.max_snapshots {
            self.snapshots.pop_front();
            self.current = self.current.saturating_sub(1);
        }
        Ok(())
    }

    /// Restore the previous state. Returns false if there is none.
    pub fn undo(&mut self, tree: &mut NodeTree) -> Result<bool> {
        if !self.can_undo() {
            return Ok(false);
        }
        self.current -= 1;
        self.apply(tree)?;
        Ok(true)
    }

    /// Restore the next state. Returns false if there is none.
    pub fn redo(&mut self, tree: &mut NodeTree) -> Result<bool> {
        if !self.can_redo() {
            return Ok(false);
        }
        self.current += 1;
        self.apply(tree)?;
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current + 1 < self.snapshots.len()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.current = 0;
    }

    /// Total compressed size of all states in bytes
    pub fn compressed_size(&self) -> usize {
        self.snapshots.iter().map(|s| s.len()).sum()
    }

    fn apply(&self, tree: &mut NodeTree) -> Result<()> {
        let snapshot = TreeSnapshot::from_compressed(&self.snapshots[self.current])?;
        tree.restore(&snapshot)
    }
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::define_node;
    use crate::interface::NodeInterface;

    fn tree() -> NodeTree {
        let mut tree = NodeTree::new();
        tree.register_node_type(
            define_node("num", "input")
                .input("in", || NodeInterface::number("In"))
                .output("out", || NodeInterface::number("Out"))
                .build(),
        )
        .unwrap();
        tree
    }

    #[test]
    fn test_undo_redo() {
        let mut tree = tree();
        let mut history = UndoHistory::default();
        history.record(&tree).unwrap();

        let a = tree.insert_node_at("num", (0.0, 0.0)).unwrap();
        history.record(&tree).unwrap();
        let b = tree.insert_node_at("num", (0.0, 0.0)).unwrap();
        tree.connect(&a, "out", &b, "in").unwrap();
        history.record(&tree).unwrap();

        assert!(history.undo(&mut tree).unwrap());
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.connection_count(), 0);
        assert!(tree.node(&a).is_some());

        assert!(history.undo(&mut tree).unwrap());
        assert_eq!(tree.node_count(), 0);
        assert!(!history.undo(&mut tree).unwrap());

        assert!(history.redo(&mut tree).unwrap());
        assert!(history.redo(&mut tree).unwrap());
        assert_eq!(tree.connection_count(), 1);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_record_discards_redo() {
        let mut tree = tree();
        let mut history = UndoHistory::new(10);
        history.record(&tree).unwrap();
        tree.insert_node_at("num", (0.0, 0.0)).unwrap();
        history.record(&tree).unwrap();

        history.undo(&mut tree).unwrap();
        assert!(history.can_redo());
        history.record(&tree).unwrap();
        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_bounded_depth() {
        let mut tree = tree();
        let mut history = UndoHistory::new(3);
        for _ in 0..5 {
            tree.insert_node_at("num", (0.0, 0.0)).unwrap();
            history.record(&tree).unwrap();
        }
        assert_eq!(history.len(), 3);
        assert!(history.compressed_size() > 0);

        history.undo(&mut tree).unwrap();
        history.undo(&mut tree).unwrap();
        assert!(!history.can_undo());
        assert_eq!(tree.node_count(), 3);

        history.clear();
        assert!(history.is_empty());
    }
}
