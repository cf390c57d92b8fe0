//! Tree nodes and shape helpers.
//!
//! A leaf holds up to [`WIDTH`] elements. A branch holds up to [`WIDTH`]
//! children and is either:
//! - `Full`: every child is itself balanced and every child but the last is
//!   completely full, so a child is located by shifting the index; or
//! - `Relaxed`: children of arbitrary size, located through a cumulative size
//!   table.
//!
//! Levels count from 0 (leaves). A full subtree at level `l` holds
//! `1 << (BITS * (l + 1))` elements.

use std::sync::Arc;

use crate::{BITS, MASK, WIDTH};

#[derive(Clone)]
pub(crate) enum Node<T> {
    Leaf(Vec<T>),
    Full(Vec<Arc<Node<T>>>),
    Relaxed {
        children: Vec<Arc<Node<T>>>,
        /// `sizes[i]` is the number of elements in `children[..=i]`.
        sizes: Vec<usize>,
    },
}

impl<T> Node<T> {
    #[inline]
    pub(crate) fn leaf(&self) -> &[T] {
        match self {
            Node::Leaf(items) => items,
            _ => unreachable!("expected a leaf, found a branch"),
        }
    }

    #[inline]
    pub(crate) fn children(&self) -> &[Arc<Node<T>>] {
        match self {
            Node::Full(children) | Node::Relaxed { children, .. } => children,
            Node::Leaf(_) => unreachable!("expected a branch, found a leaf"),
        }
    }

    #[inline]
    pub(crate) fn child(&self, slot: usize) -> &Node<T> {
        &self.children()[slot]
    }

    #[inline]
    pub(crate) fn sizes(&self) -> Option<&[usize]> {
        match self {
            Node::Relaxed { sizes, .. } => Some(sizes),
            _ => None,
        }
    }

    /// Occupied slots: elements for a leaf, children for a branch.
    #[inline]
    pub(crate) fn slots(&self) -> usize {
        match self {
            Node::Leaf(items) => items.len(),
            Node::Full(children) | Node::Relaxed { children, .. } => children.len(),
        }
    }

    #[inline]
    pub(crate) fn is_relaxed(&self) -> bool {
        matches!(self, Node::Relaxed { .. })
    }

    /// Resolves `index` (relative to this branch at `level`) to a child slot
    /// and the index relative to that child.
    #[inline]
    pub(crate) fn locate(&self, index: usize, level: usize) -> (usize, usize) {
        match self.sizes() {
            Some(sizes) => {
                let slot = index_in_sizes(sizes, index);
                let before = if slot == 0 { 0 } else { sizes[slot - 1] };
                (slot, index - before)
            }
            None => {
                let shift = BITS * level;
                ((index >> shift) & MASK, index & ((1 << shift) - 1))
            }
        }
    }

    pub(crate) fn leaf_mut(&mut self) -> &mut Vec<T> {
        match self {
            Node::Leaf(items) => items,
            _ => unreachable!("expected a leaf, found a branch"),
        }
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Arc<Node<T>>> {
        match self {
            Node::Full(children) | Node::Relaxed { children, .. } => children,
            Node::Leaf(_) => unreachable!("expected a branch, found a leaf"),
        }
    }

    /// Recomputes whether this branch at `level` needs a size table.
    pub(crate) fn settle(&mut self, level: usize) {
        let children = std::mem::take(self.children_mut());
        *self = with_computed_sizes(children, level);
    }

    /// Drops the size table of a relaxed branch whose children turned out to
    /// be perfectly packed.
    pub(crate) fn tighten(&mut self, level: usize) {
        if let Node::Relaxed { children, sizes } = self {
            if is_packed(children, sizes, level) {
                let children = std::mem::take(children);
                *self = Node::Full(children);
            }
        }
    }

    /// Turns this branch into a relaxed one carrying `sizes`.
    pub(crate) fn relax(&mut self, sizes: Vec<usize>) {
        debug_assert_eq!(sizes.len(), self.slots());
        let children = std::mem::take(self.children_mut());
        *self = Node::Relaxed { children, sizes };
    }

    /// An empty node of `level` with room for `capacity` slots.
    pub(crate) fn with_capacity(level: usize, capacity: usize) -> Self {
        if level == 0 {
            Node::Leaf(Vec::with_capacity(capacity))
        } else {
            Node::Full(Vec::with_capacity(capacity))
        }
    }
}

/// Single-element leaf sized for a full block.
pub(crate) fn leaf_of<T>(value: T) -> Node<T> {
    let mut items = Vec::with_capacity(WIDTH);
    items.push(value);
    Node::Leaf(items)
}

/// Single-child branch sized for a full block.
pub(crate) fn branch_of<T>(child: Arc<Node<T>>) -> Node<T> {
    let mut children = Vec::with_capacity(WIDTH);
    children.push(child);
    Node::Full(children)
}

/// Bounded slot copy: appends `src[from..from + count]` to `dst`. Both nodes
/// must live at the same level.
pub(crate) fn copy_slots<T: Clone>(dst: &mut Node<T>, src: &Node<T>, from: usize, count: usize) {
    debug_assert!(dst.slots() + count <= WIDTH);
    match (dst, src) {
        (Node::Leaf(dst), Node::Leaf(src)) => dst.extend_from_slice(&src[from..from + count]),
        (Node::Leaf(_), _) | (_, Node::Leaf(_)) => {
            unreachable!("slot copy between nodes of different levels")
        }
        (dst, src) => dst
            .children_mut()
            .extend_from_slice(&src.children()[from..from + count]),
    }
}

/// First slot whose cumulative size exceeds `index`.
#[inline]
pub(crate) fn index_in_sizes(sizes: &[usize], index: usize) -> usize {
    sizes.partition_point(|&size| size <= index)
}

/// Number of elements below `node`, which sits at `level`.
pub(crate) fn tree_size<T>(node: &Node<T>, level: usize) -> usize {
    match node {
        Node::Leaf(items) => items.len(),
        Node::Relaxed { sizes, .. } => sizes.last().copied().unwrap_or(0),
        Node::Full(children) => match children.split_last() {
            Some((last, rest)) => (rest.len() << (BITS * level)) + tree_size(last, level - 1),
            None => 0,
        },
    }
}

/// Builds a branch at `level` over `children`, attaching a size table only
/// when the children cannot be addressed by index bits alone.
pub(crate) fn with_computed_sizes<T>(children: Vec<Arc<Node<T>>>, level: usize) -> Node<T> {
    debug_assert!(level > 0 && !children.is_empty() && children.len() <= WIDTH);
    let mut sizes = Vec::with_capacity(children.len());
    let mut acc = 0;
    for child in &children {
        acc += tree_size(child, level - 1);
        sizes.push(acc);
    }
    if is_packed(&children, &sizes, level) {
        Node::Full(children)
    } else {
        Node::Relaxed { children, sizes }
    }
}

fn is_packed<T>(children: &[Arc<Node<T>>], sizes: &[usize], level: usize) -> bool {
    let full = 1 << (BITS * level);
    children.iter().all(|child| !child.is_relaxed())
        && sizes[..sizes.len().saturating_sub(1)]
            .iter()
            .enumerate()
            .all(|(i, &size)| size == (i + 1) * full)
}

/// Total slots of the level below across the children a merge will repack:
/// `left` minus its last child, the previous level's result, and `right`
/// minus its first child.
pub(crate) fn compute_branching<T>(
    left: &[Arc<Node<T>>],
    concat: &[Arc<Node<T>>],
    right: &[Arc<Node<T>>],
) -> usize {
    left.iter()
        .chain(concat)
        .chain(right)
        .map(|child| child.slots())
        .sum()
}
