//! Bidirectional cursors over the in-order element sequence.
//!
//! A cursor is either positioned on an element, carrying the full path of
//! indices from the head (the child slot taken at each ancestor, topped by
//! the element index in the current node), or it is the end sentinel. The
//! sentinel carries no path, only the node holding the largest element, so
//! stepping backward from end is well-defined without re-descending from
//! the head.

use std::fmt;
use std::mem;
use std::ptr;

use smallvec::SmallVec;

use crate::{FanTree, NodeId};

/// Path of indices from the head to a cursor position. Trees deeper than
/// the inline capacity spill to the heap; depth beyond a handful of levels
/// only occurs with tiny fanout bounds.
pub(crate) type IndexPath = SmallVec<[usize; 8]>;

/// Position descriptor shared by every cursor and iterator type.
#[derive(Clone, PartialEq, Eq, Debug)]
pub(crate) enum RawCursor {
    /// On the element `path.last()` within `node`.
    Positioned { node: NodeId, path: IndexPath },
    /// One past the largest element. `last` is the node holding that
    /// element, or `None` for the empty tree.
    End { last: Option<NodeId> },
}

/// Cursor at the smallest element: leftmost descent from the head.
pub(crate) fn begin_raw<T>(tree: &FanTree<T>) -> RawCursor {
    let Some(head) = tree.head() else {
        return RawCursor::End { last: None };
    };
    let mut node = head;
    let mut path = IndexPath::new();
    while let Some(child) = tree.child_at(node, 0) {
        path.push(0);
        node = child;
    }
    path.push(0);
    RawCursor::Positioned { node, path }
}

/// The end sentinel: trailing-slot descent from the head finds the node
/// holding the largest element.
pub(crate) fn end_raw<T>(tree: &FanTree<T>) -> RawCursor {
    let Some(head) = tree.head() else {
        return RawCursor::End { last: None };
    };
    let mut node = head;
    loop {
        let k = tree.node(node).elems.len();
        match tree.child_at(node, k) {
            Some(child) => node = child,
            None => break,
        }
    }
    RawCursor::End { last: Some(node) }
}

/// Child slots taken from the head down to `target`, reconstructed through
/// parent back-references. Used when reviving a position from the end
/// sentinel, which stores no path.
fn path_from_head<T>(tree: &FanTree<T>, target: NodeId) -> IndexPath {
    let mut path = IndexPath::new();
    let mut node = target;
    while let Some(parent) = tree.node(node).parent {
        let slot = tree
            .node(parent)
            .children
            .iter()
            .position(|c| *c == Some(node))
            .expect("child must occupy a slot of its parent");
        path.push(slot);
        node = parent;
    }
    path.reverse();
    path
}

/// Advances `pos` to the in-order successor.
///
/// # Panics
///
/// Panics if `pos` is the end sentinel.
pub(crate) fn successor<T>(tree: &FanTree<T>, pos: &mut RawCursor) {
    let taken = mem::replace(pos, RawCursor::End { last: None });
    let RawCursor::Positioned {
        mut node,
        mut path,
    } = taken
    else {
        panic!("cursor already at end");
    };
    let start = node;
    let idx = *path.last().expect("positioned cursor carries an index");

    // Subtree to the right: its minimum comes next.
    if let Some(child) = tree.child_at(node, idx + 1) {
        *path.last_mut().expect("non-empty path") = idx + 1;
        node = child;
        while let Some(next) = tree.child_at(node, 0) {
            path.push(0);
            node = next;
        }
        path.push(0);
        *pos = RawCursor::Positioned { node, path };
        return;
    }

    // Next element within this node.
    if idx + 1 < tree.node(node).elems.len() {
        *path.last_mut().expect("non-empty path") = idx + 1;
        *pos = RawCursor::Positioned { node, path };
        return;
    }

    // Climb until an ancestor still has an element to the right of the
    // slot we came up through. Running out at the head means `start` held
    // the maximum, which the sentinel remembers.
    loop {
        match tree.node(node).parent {
            Some(parent) => {
                path.pop();
                let slot = *path.last().expect("path covers every ancestor");
                node = parent;
                if slot < tree.node(node).elems.len() {
                    *pos = RawCursor::Positioned { node, path };
                    return;
                }
            }
            None => {
                *pos = RawCursor::End { last: Some(start) };
                return;
            }
        }
    }
}

/// Moves `pos` to the in-order predecessor; the exact mirror of
/// [`successor`].
///
/// # Panics
///
/// Panics if `pos` is at the smallest element (or the tree is empty).
pub(crate) fn predecessor<T>(tree: &FanTree<T>, pos: &mut RawCursor) {
    match mem::replace(pos, RawCursor::End { last: None }) {
        RawCursor::End { last } => {
            let node = last.expect("cursor already at the first element");
            let mut path = path_from_head(tree, node);
            let k = tree.node(node).elems.len();
            debug_assert!(k > 0, "nodes are never empty");
            path.push(k - 1);
            *pos = RawCursor::Positioned { node, path };
        }
        RawCursor::Positioned {
            mut node,
            mut path,
        } => {
            let idx = *path.last().expect("positioned cursor carries an index");

            // Subtree to the left: its maximum comes first.
            if let Some(child) = tree.child_at(node, idx) {
                node = child;
                loop {
                    let k = tree.node(node).elems.len();
                    match tree.child_at(node, k) {
                        Some(next) => {
                            path.push(k);
                            node = next;
                        }
                        None => {
                            path.push(k - 1);
                            break;
                        }
                    }
                }
                *pos = RawCursor::Positioned { node, path };
                return;
            }

            // Previous element within this node.
            if idx > 0 {
                *path.last_mut().expect("non-empty path") = idx - 1;
                *pos = RawCursor::Positioned { node, path };
                return;
            }

            // Climb until an ancestor slot has an element to its left.
            loop {
                match tree.node(node).parent {
                    Some(parent) => {
                        path.pop();
                        let slot = *path.last().expect("path covers every ancestor");
                        node = parent;
                        if slot > 0 {
                            *path.last_mut().expect("non-empty path") = slot - 1;
                            *pos = RawCursor::Positioned { node, path };
                            return;
                        }
                    }
                    None => panic!("cursor already at the first element"),
                }
            }
        }
    }
}

fn get_raw<'a, T>(tree: &'a FanTree<T>, raw: &RawCursor) -> Option<&'a T> {
    match raw {
        RawCursor::Positioned { node, path } => {
            let idx = *path.last().expect("positioned cursor carries an index");
            Some(&tree.node(*node).elems[idx])
        }
        RawCursor::End { .. } => None,
    }
}

// =============================================================================
// Cursor (shared view)
// =============================================================================

/// A read-only bidirectional position over a tree's in-order sequence.
///
/// Obtained from [`FanTree::find`], [`FanTree::cursor_front`] or
/// [`FanTree::cursor_end`], or by converting a [`CursorMut`]. The reverse
/// conversion does not exist.
pub struct Cursor<'a, T> {
    tree: &'a FanTree<T>,
    raw: RawCursor,
}

impl<'a, T> Cursor<'a, T> {
    pub(crate) fn new(tree: &'a FanTree<T>, raw: RawCursor) -> Self {
        Self { tree, raw }
    }

    /// The element under the cursor, or `None` at the end sentinel.
    pub fn get(&self) -> Option<&'a T> {
        get_raw(self.tree, &self.raw)
    }

    /// Whether this cursor is the end sentinel.
    pub fn is_end(&self) -> bool {
        matches!(self.raw, RawCursor::End { .. })
    }

    /// Steps to the in-order successor.
    ///
    /// # Panics
    ///
    /// Panics when already at the end sentinel.
    pub fn move_next(&mut self) {
        successor(self.tree, &mut self.raw);
    }

    /// Steps to the in-order predecessor. From the end sentinel this lands
    /// on the largest element.
    ///
    /// # Panics
    ///
    /// Panics when already at the smallest element, or on an empty tree.
    pub fn move_prev(&mut self) {
        predecessor(self.tree, &mut self.raw);
    }
}

impl<T> Clone for Cursor<'_, T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            raw: self.raw.clone(),
        }
    }
}

impl<T> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.raw).finish()
    }
}

impl<T> PartialEq for Cursor<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.tree, other.tree) && self.raw == other.raw
    }
}

impl<T> Eq for Cursor<'_, T> {}

// =============================================================================
// CursorMut (mutable view)
// =============================================================================

/// A bidirectional position granting mutable access to elements.
///
/// Converts one-directionally into a read-only [`Cursor`] via
/// [`as_cursor`](CursorMut::as_cursor) or
/// [`into_cursor`](CursorMut::into_cursor).
pub struct CursorMut<'a, T> {
    tree: &'a mut FanTree<T>,
    raw: RawCursor,
}

impl<'a, T> CursorMut<'a, T> {
    pub(crate) fn new(tree: &'a mut FanTree<T>, raw: RawCursor) -> Self {
        Self { tree, raw }
    }

    /// The element under the cursor, or `None` at the end sentinel.
    pub fn get(&self) -> Option<&T> {
        get_raw(self.tree, &self.raw)
    }

    /// Mutable access to the element under the cursor.
    ///
    /// The mutation must not change how the element orders relative to the
    /// rest of the tree; doing so leaves the in-order sequence unsorted and
    /// later lookups undefined. This is a documented precondition, not an
    /// enforced one.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        match &self.raw {
            RawCursor::Positioned { node, path } => {
                let node = *node;
                let idx = *path.last().expect("positioned cursor carries an index");
                Some(&mut self.tree.node_mut(node).elems[idx])
            }
            RawCursor::End { .. } => None,
        }
    }

    /// Whether this cursor is the end sentinel.
    pub fn is_end(&self) -> bool {
        matches!(self.raw, RawCursor::End { .. })
    }

    /// Steps to the in-order successor.
    ///
    /// # Panics
    ///
    /// Panics when already at the end sentinel.
    pub fn move_next(&mut self) {
        successor(self.tree, &mut self.raw);
    }

    /// Steps to the in-order predecessor. From the end sentinel this lands
    /// on the largest element.
    ///
    /// # Panics
    ///
    /// Panics when already at the smallest element, or on an empty tree.
    pub fn move_prev(&mut self) {
        predecessor(self.tree, &mut self.raw);
    }

    /// A read-only cursor at the same position, borrowing this one.
    pub fn as_cursor(&self) -> Cursor<'_, T> {
        Cursor::new(self.tree, self.raw.clone())
    }

    /// Converts into a read-only cursor at the same position.
    pub fn into_cursor(self) -> Cursor<'a, T> {
        Cursor::new(self.tree, self.raw)
    }
}

impl<T> fmt::Debug for CursorMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CursorMut").field(&self.raw).finish()
    }
}

impl<T> PartialEq for CursorMut<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq::<FanTree<T>>(&*self.tree, &*other.tree) && self.raw == other.raw
    }
}

impl<T> Eq for CursorMut<'_, T> {}

impl<T> PartialEq<Cursor<'_, T>> for CursorMut<'_, T> {
    fn eq(&self, other: &Cursor<'_, T>) -> bool {
        ptr::eq::<FanTree<T>>(&*self.tree, other.tree) && self.raw == other.raw
    }
}

impl<T> PartialEq<CursorMut<'_, T>> for Cursor<'_, T> {
    fn eq(&self, other: &CursorMut<'_, T>) -> bool {
        ptr::eq::<FanTree<T>>(self.tree, &*other.tree) && self.raw == other.raw
    }
}

// =============================================================================
// Iter
// =============================================================================

/// Double-ended in-order iterator over `&T`, returned by [`FanTree::iter`].
pub struct Iter<'a, T> {
    tree: &'a FanTree<T>,
    /// Next position to yield from the front.
    front: RawCursor,
    /// Exclusive back bound; starts at the end sentinel.
    back: RawCursor,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(tree: &'a FanTree<T>) -> Self {
        Self {
            tree,
            front: begin_raw(tree),
            back: end_raw(tree),
            remaining: tree.len(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let elem = get_raw(self.tree, &self.front).expect("front of a non-exhausted range");
        successor(self.tree, &mut self.front);
        self.remaining -= 1;
        Some(elem)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        predecessor(self.tree, &mut self.back);
        self.remaining -= 1;
        get_raw(self.tree, &self.back)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> std::iter::FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            front: self.front.clone(),
            back: self.back.clone(),
            remaining: self.remaining,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
