use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use crate::IndexNode;

/// Date-ordered index nodes for exactly one symbol.
///
/// Every mutation sets the dirty flag; only a successful persist clears it
/// (see [`SymbolIndex::persist`](crate::SymbolIndex::persist)).
#[derive(Debug, Clone, Default)]
pub struct DateIndex {
    nodes: BTreeMap<u64, IndexNode>,
    dirty: bool,
}

impl DateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes, tombstones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Exact-date lookup.
    pub fn get(&self, date: u64) -> Option<IndexNode> {
        self.nodes.get(&date).copied()
    }

    pub fn contains(&self, date: u64) -> bool {
        self.nodes.contains_key(&date)
    }

    /// Inserts or replaces the node for `node.date`.
    pub fn insert(&mut self, node: IndexNode) -> Option<IndexNode> {
        self.dirty = true;
        self.nodes.insert(node.date, node)
    }

    pub fn remove(&mut self, date: u64) -> Option<IndexNode> {
        let removed = self.nodes.remove(&date);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    /// Sets the record count of an existing node. Returns `false` if `date`
    /// is not indexed.
    pub fn set_count(&mut self, date: u64, count: u32) -> bool {
        match self.nodes.get_mut(&date) {
            Some(node) => {
                node.count = count;
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Moves an existing node by `delta` bytes. Returns `false` if `date` is
    /// not indexed.
    pub fn shift_offset(&mut self, date: u64, delta: i64) -> bool {
        match self.nodes.get_mut(&date) {
            Some(node) => {
                node.shift_offset(delta);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    pub fn first(&self) -> Option<IndexNode> {
        self.nodes.values().next().copied()
    }

    pub fn last(&self) -> Option<IndexNode> {
        self.nodes.values().next_back().copied()
    }

    /// Strict predecessor of `date`; `date` itself need not be indexed.
    pub fn prev(&self, date: u64) -> Option<IndexNode> {
        self.nodes.range(..date).next_back().map(|(_, n)| *n)
    }

    /// Strict successor of `date`; `date` itself need not be indexed.
    pub fn next(&self, date: u64) -> Option<IndexNode> {
        self.nodes
            .range((Excluded(date), Unbounded))
            .next()
            .map(|(_, n)| *n)
    }

    /// All nodes in ascending date order, tombstones included.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &IndexNode> {
        self.nodes.values()
    }

    /// Nodes that survive a persist (`count > 0`), in ascending date order.
    pub fn live(&self) -> impl Iterator<Item = &IndexNode> {
        self.nodes.values().filter(|n| !n.is_tombstone())
    }

    /// Dates strictly after `date`, ascending.
    pub fn dates_after(&self, date: u64) -> Vec<u64> {
        self.nodes
            .range((Excluded(date), Unbounded))
            .map(|(d, _)| *d)
            .collect()
    }
}

impl FromIterator<IndexNode> for DateIndex {
    /// Builds a clean index, as if just loaded from disk.
    fn from_iter<I: IntoIterator<Item = IndexNode>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().map(|n| (n.date, n)).collect(),
            dirty: false,
        }
    }
}
