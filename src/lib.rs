//! # fantree
//!
//! An ordered set backed by a bounded-fanout multiway search tree.
//!
//! Each node stores up to a configured number of elements in ascending
//! order. A node that has reached that bound routes further inserts into
//! child subtrees, one child slot per gap between adjacent elements (plus
//! one slot at each end). Nodes are never split or merged: the bound is
//! purely the threshold at which a node stops accepting elements directly.
//!
//! ## Example
//!
//! ```rust
//! use fantree::FanTree;
//!
//! let mut tree: FanTree<u32> = FanTree::new();
//! tree.insert(3);
//! tree.insert(1);
//! tree.insert(2);
//!
//! assert!(tree.contains(&2));
//! let sorted: Vec<u32> = tree.iter().copied().collect();
//! assert_eq!(sorted, vec![1, 2, 3]);
//! ```

#![deny(unsafe_op_in_unsafe_fn)]

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;

use smallvec::smallvec;

mod cursor;

pub use cursor::{Cursor, CursorMut, Iter};

use cursor::{IndexPath, RawCursor};

/// Default per-node element bound, matching `FanTree::new`.
pub const DEFAULT_MAX_NODE_ELEMS: usize = 40;

// =============================================================================
// Node arena
// =============================================================================

/// Index of a node in the tree's arena.
///
/// Nodes are only ever appended (there is no element deletion), so an id
/// stays valid for the lifetime of the tree that issued it. Ids are local
/// to one tree; a deep copy carries them over verbatim, which is what keeps
/// parent back-references correct without any rewiring pass.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct NodeId(u32);

pub(crate) struct Node<T> {
    /// Elements in strictly ascending order, at most `max_node_elems`.
    pub(crate) elems: Vec<T>,
    /// Child slots, grown lazily. Slot `i` holds values ordered between
    /// `elems[i - 1]` and `elems[i]`. A slot is only ever populated once
    /// this node is full.
    pub(crate) children: Vec<Option<NodeId>>,
    /// Non-owning back-reference, used solely for upward cursor traversal.
    pub(crate) parent: Option<NodeId>,
}

impl<T: Clone> Clone for Node<T> {
    fn clone(&self) -> Self {
        Self {
            elems: self.elems.clone(),
            children: self.children.clone(),
            parent: self.parent,
        }
    }
}

// =============================================================================
// FanTree
// =============================================================================

/// An ordered set of unique elements stored in a multiway search tree.
///
/// Unlike a classical B-tree there is no rebalancing: a full node never
/// splits, it simply stops accepting elements and routes inserts into its
/// children. Tree shape therefore depends on insertion order, but the
/// in-order element sequence is always sorted.
pub struct FanTree<T> {
    nodes: Vec<Node<T>>,
    head: Option<NodeId>,
    max_node_elems: usize,
    count: usize,
}

impl<T> FanTree<T> {
    /// Creates an empty tree with the default per-node bound of 40.
    pub fn new() -> Self {
        Self::with_max_node_elems(DEFAULT_MAX_NODE_ELEMS)
    }

    /// Creates an empty tree whose nodes hold at most `max_node_elems`
    /// elements each.
    ///
    /// # Panics
    ///
    /// Panics if `max_node_elems` is zero: a node must be able to hold at
    /// least one element.
    pub fn with_max_node_elems(max_node_elems: usize) -> Self {
        assert!(max_node_elems >= 1, "max_node_elems must be at least 1");
        Self {
            nodes: Vec::new(),
            head: None,
            max_node_elems,
            count: 0,
        }
    }

    /// The configured per-node element bound.
    #[inline]
    pub fn max_node_elems(&self) -> usize {
        self.max_node_elems
    }

    /// Number of elements in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Drops every element, keeping the configured bound.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.count = 0;
    }

    #[inline]
    pub(crate) fn head(&self) -> Option<NodeId> {
        self.head
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node<T> {
        &self.nodes[id.0 as usize]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        &mut self.nodes[id.0 as usize]
    }

    /// The populated child in slot `slot` of `id`, if any. Slots past the
    /// end of the lazily-grown child vector read as unpopulated.
    #[inline]
    pub(crate) fn child_at(&self, id: NodeId, slot: usize) -> Option<NodeId> {
        self.node(id).children.get(slot).copied().flatten()
    }

    fn alloc_node(&mut self, elem: T, parent: Option<NodeId>) -> NodeId {
        let idx = u32::try_from(self.nodes.len()).expect("node arena exceeds u32::MAX nodes");
        self.nodes.push(Node {
            elems: vec![elem],
            children: Vec::new(),
            parent,
        });
        NodeId(idx)
    }

    /// First index in `id` whose element is not less than `elem`, or the
    /// element count if all are less. Reports an exact match through the
    /// bool. Linear scan: nodes are small and `T` is only required to be
    /// totally ordered.
    fn scan_node(&self, id: NodeId, elem: &T) -> (usize, bool)
    where
        T: Ord,
    {
        let node = self.node(id);
        for (i, existing) in node.elems.iter().enumerate() {
            match elem.cmp(existing) {
                Ordering::Less => return (i, false),
                Ordering::Equal => return (i, true),
                Ordering::Greater => {}
            }
        }
        (node.elems.len(), false)
    }
}

impl<T: Ord> FanTree<T> {
    /// Inserts `elem` unless an equal element is already present.
    ///
    /// Returns a cursor to the element's location and `true` if it was
    /// inserted, or a cursor to the pre-existing equal element and `false`
    /// with the tree left untouched.
    pub fn insert(&mut self, elem: T) -> (CursorMut<'_, T>, bool) {
        let Some(head) = self.head else {
            // Lazy head: the empty tree has no node at all.
            let id = self.alloc_node(elem, None);
            self.head = Some(id);
            self.count += 1;
            let raw = RawCursor::Positioned {
                node: id,
                path: smallvec![0],
            };
            return (CursorMut::new(self, raw), true);
        };

        let mut node = head;
        let mut path: IndexPath = IndexPath::new();
        loop {
            let (i, exact) = self.scan_node(node, &elem);
            if exact {
                path.push(i);
                let raw = RawCursor::Positioned { node, path };
                return (CursorMut::new(self, raw), false);
            }

            if self.node(node).elems.len() < self.max_node_elems {
                // Under-full: the element lands here. Insert a matching
                // empty child slot so slot-to-element alignment survives.
                let n = self.node_mut(node);
                n.elems.insert(i, elem);
                if i < n.children.len() {
                    n.children.insert(i, None);
                }
                self.count += 1;
                path.push(i);
                let raw = RawCursor::Positioned { node, path };
                return (CursorMut::new(self, raw), true);
            }

            // Full: route into child slot `i`.
            if let Some(child) = self.child_at(node, i) {
                path.push(i);
                node = child;
                continue;
            }

            // No child there yet: a fresh node is born holding the element.
            let child = self.alloc_node(elem, Some(node));
            let n = self.node_mut(node);
            if i >= n.children.len() {
                n.children.resize(i + 1, None);
            }
            n.children[i] = Some(child);
            self.count += 1;
            path.push(i);
            path.push(0);
            let raw = RawCursor::Positioned { node: child, path };
            return (CursorMut::new(self, raw), true);
        }
    }

    pub(crate) fn find_raw(&self, elem: &T) -> RawCursor {
        let Some(head) = self.head else {
            return cursor::end_raw(self);
        };

        let mut node = head;
        let mut path: IndexPath = IndexPath::new();
        loop {
            let (i, exact) = self.scan_node(node, elem);
            if exact {
                path.push(i);
                return RawCursor::Positioned { node, path };
            }
            match self.child_at(node, i) {
                Some(child) => {
                    path.push(i);
                    node = child;
                }
                None => return cursor::end_raw(self),
            }
        }
    }

    /// Cursor to the element equal to `elem`, or the end cursor if absent.
    pub fn find(&self, elem: &T) -> Cursor<'_, T> {
        Cursor::new(self, self.find_raw(elem))
    }

    /// Mutable-view counterpart of [`find`](Self::find).
    pub fn find_mut(&mut self, elem: &T) -> CursorMut<'_, T> {
        let raw = self.find_raw(elem);
        CursorMut::new(self, raw)
    }

    pub fn contains(&self, elem: &T) -> bool {
        !self.find(elem).is_end()
    }
}

impl<T> FanTree<T> {
    /// Cursor at the smallest element, or the end cursor for an empty tree.
    pub fn cursor_front(&self) -> Cursor<'_, T> {
        Cursor::new(self, cursor::begin_raw(self))
    }

    /// The end sentinel cursor: one past the largest element.
    pub fn cursor_end(&self) -> Cursor<'_, T> {
        Cursor::new(self, cursor::end_raw(self))
    }

    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, T> {
        let raw = cursor::begin_raw(self);
        CursorMut::new(self, raw)
    }

    pub fn cursor_end_mut(&mut self) -> CursorMut<'_, T> {
        let raw = cursor::end_raw(self);
        CursorMut::new(self, raw)
    }

    /// Double-ended in-order iterator over `[begin, end)`.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// The smallest element, if any.
    pub fn first(&self) -> Option<&T> {
        self.iter().next()
    }

    /// The largest element, if any.
    pub fn last(&self) -> Option<&T> {
        self.iter().next_back()
    }
}

// =============================================================================
// Trait impls
// =============================================================================

impl<T> Default for FanTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for FanTree<T> {
    fn clone(&self) -> Self {
        // Ids are arena indices, so cloning the arena duplicates the whole
        // node graph with every parent back-reference already pointing into
        // the copy.
        Self {
            nodes: self.nodes.clone(),
            head: self.head,
            max_node_elems: self.max_node_elems,
            count: self.count,
        }
    }
}

impl<T: PartialEq> PartialEq for FanTree<T> {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for FanTree<T> {}

impl<T: fmt::Debug> fmt::Debug for FanTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Breadth-first dump: every element of every node, head first, then each
/// level's populated children left to right. Elements are separated by a
/// single space, with no trailing space and no newline.
impl<T: fmt::Display> fmt::Display for FanTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        queue.extend(self.head);

        let mut first = true;
        while let Some(id) = queue.pop_front() {
            let node = self.node(id);
            queue.extend(node.children.iter().flatten());
            for elem in &node.elems {
                if !first {
                    f.write_str(" ")?;
                }
                first = false;
                write!(f, "{elem}")?;
            }
        }
        Ok(())
    }
}

impl<T: Ord> FromIterator<T> for FanTree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<T: Ord> Extend<T> for FanTree<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for elem in iter {
            self.insert(elem);
        }
    }
}

impl<'a, T> IntoIterator for &'a FanTree<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// Owned in-order iterator returned by [`FanTree::into_iter`].
pub struct IntoIter<T> {
    elems: std::vec::IntoIter<T>,
}

impl<T> IntoIterator for FanTree<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(mut self) -> IntoIter<T> {
        // Iterative in-order drain: tree depth is unbounded (bound 1 on
        // sorted input degenerates to a list), so no recursion.
        struct Frame<T> {
            elems: std::vec::IntoIter<T>,
            children: std::vec::IntoIter<Option<NodeId>>,
            expect_child: bool,
        }

        fn take_frame<T>(nodes: &mut [Node<T>], id: NodeId) -> Frame<T> {
            let node = &mut nodes[id.0 as usize];
            Frame {
                elems: std::mem::take(&mut node.elems).into_iter(),
                children: std::mem::take(&mut node.children).into_iter(),
                expect_child: true,
            }
        }

        let mut out = Vec::with_capacity(self.count);
        let mut stack: Vec<Frame<T>> = Vec::new();
        if let Some(head) = self.head {
            stack.push(take_frame(&mut self.nodes, head));
        }
        while let Some(top) = stack.last_mut() {
            if top.expect_child {
                top.expect_child = false;
                if let Some(Some(child)) = top.children.next() {
                    let frame = take_frame(&mut self.nodes, child);
                    stack.push(frame);
                    continue;
                }
            }
            match top.elems.next() {
                Some(elem) => {
                    out.push(elem);
                    top.expect_child = true;
                }
                None => {
                    stack.pop();
                }
            }
        }

        IntoIter {
            elems: out.into_iter(),
        }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.elems.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.elems.size_hint()
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        self.elems.next_back()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> std::iter::FusedIterator for IntoIter<T> {}


#[cfg(test)]
mod proptests;
