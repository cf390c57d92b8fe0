//! Focus relocation and the transient discipline.
//!
//! Moving the focus reuses the longest common prefix of the old and new paths:
//! inside the balanced window only the levels below the divergence point are
//! re-walked. Leaving the window normalizes and descends from the root.

use std::sync::Arc;

use crate::node::{leaf_of, tree_size, Node};
use crate::{Vector, BITS, WIDTH};

/// Lowest level at which two window offsets whose XOR is `xor` share a node.
#[inline]
pub(crate) fn level_of(xor: usize) -> usize {
    if xor < 1 << BITS {
        0
    } else if xor < 1 << (2 * BITS) {
        1
    } else if xor < 1 << (3 * BITS) {
        2
    } else if xor < 1 << (4 * BITS) {
        3
    } else if xor < 1 << (5 * BITS) {
        4
    } else if xor < 1 << (6 * BITS) {
        5
    } else {
        (usize::BITS - 1 - xor.leading_zeros()) as usize / BITS
    }
}

impl<T> Vector<T> {
    /// Number of elements below `display[level]`, taking the display array as
    /// authoritative for the focus path.
    pub(crate) fn display_size(&self, level: usize) -> usize {
        let node = self.display_node(level);
        match &**node {
            Node::Full(children) if self.transient => {
                let last = children.len() - 1;
                let last_size = if self.path_slot(level) == last {
                    self.display_size(level - 1)
                } else {
                    tree_size(&children[last], level - 1)
                };
                (last << (BITS * level)) + last_size
            }
            node => tree_size(node, level),
        }
    }

    /// Replaces `display[..level]` with the path through `display[level]`
    /// selected by the window offset `offset`.
    fn focus_down(&mut self, level: usize, offset: usize) {
        for l in (1..=level).rev() {
            let slot = (offset >> (BITS * l)) & crate::MASK;
            let child = self.display_node(l).children()[slot].clone();
            self.display[l - 1] = Some(child);
        }
    }

    /// Descends from the root to the leaf holding `index`. The vector must not
    /// be transient.
    fn focus_from_root(&mut self, index: usize) {
        debug_assert!(!self.transient);
        let mut level = self.depth - 1;
        let mut start = 0;
        let mut relax = 0;
        while level > 0 {
            let node = self.display_node(level);
            let Some(sizes) = node.sizes() else { break };
            let (slot, rest) = node.locate(index - start, level);
            let child = node.children()[slot].clone();
            if slot > 0 {
                start += sizes[slot - 1];
            }
            debug_assert_eq!(index - start, rest);
            relax |= slot << (BITS * level);
            self.display[level - 1] = Some(child);
            level -= 1;
        }

        let offset = index - start;
        self.focus_depth = level + 1;
        self.focus_start = start;
        self.focus_end = start + tree_size(self.display_node(level), level);
        self.focus_relax = relax;
        self.focus_down(level, offset);
        self.focus = offset & !crate::MASK;
    }

    /// Recomputes the focus window after the path was rebuilt at one edge.
    /// `focus | focus_relax` must already hold the slot taken at every level.
    pub(crate) fn refocus_edge(&mut self, at_back: bool) {
        let path = self.focus | self.focus_relax;
        let mut focus_depth = 1;
        while focus_depth < self.depth && !self.display_node(focus_depth).is_relaxed() {
            focus_depth += 1;
        }
        let mask = (1 << (BITS * focus_depth)) - 1;
        self.focus_depth = focus_depth;
        self.focus = path & mask;
        self.focus_relax = path & !mask;

        let size = self.display_size(focus_depth - 1);
        if at_back {
            self.focus_end = self.len;
            self.focus_start = self.len - size;
        } else {
            self.focus_start = 0;
            self.focus_end = size;
        }
    }

    pub(crate) fn init_single(&mut self, value: T) {
        self.display = Default::default();
        self.display[0] = Some(Arc::new(leaf_of(value)));
        self.len = 1;
        self.depth = 1;
        self.focus = 0;
        self.focus_start = 0;
        self.focus_end = 1;
        self.focus_depth = 1;
        self.focus_relax = 0;
        self.transient = false;
    }

    /// Installs `root` as the whole tree and focuses index 0. `len` must
    /// already describe the new tree.
    pub(crate) fn init_from_root(&mut self, root: Arc<Node<T>>, depth: usize) {
        debug_assert!(depth >= 1 && depth <= crate::MAX_DEPTH);
        self.display = Default::default();
        self.display[depth - 1] = Some(root);
        self.depth = depth;
        self.transient = false;
        self.focus_from_root(0);
    }
}

impl<T: Clone> Vector<T> {
    /// Writes `display[level - 1]` back into its parent for every level in
    /// `1..=up_to`, innermost first.
    pub(crate) fn stabilize(&mut self, up_to: usize) {
        if !self.transient {
            return;
        }
        for level in 1..=up_to {
            let child = self.display_node(level - 1).clone();
            let slot = self.path_slot(level);
            let node = self.display_mut(level);
            node.children_mut()[slot] = child;
            node.tighten(level);
        }
    }

    /// Folds the privately owned focus path back into the tree. Afterwards
    /// every display node is reachable from the root and may be shared.
    pub fn normalize(&mut self) {
        if self.transient {
            self.stabilize(self.depth - 1);
            self.transient = false;
        }
    }

    /// Takes private ownership of the focus path so edits can happen in
    /// place. Nodes still shared with another handle are copied once here.
    pub(crate) fn make_transient_if_needed(&mut self) {
        if self.transient || self.depth <= 1 {
            return;
        }
        for level in 0..self.depth {
            if let Some(node) = &mut self.display[level] {
                Arc::make_mut(node);
            }
        }
        self.transient = true;
    }

    /// Moves the focus to the leaf holding `index`.
    pub(crate) fn focus_on(&mut self, index: usize) {
        debug_assert!(index < self.len);
        if self.focus_start <= index && index < self.focus_end {
            let offset = index - self.focus_start;
            let xor = offset ^ self.focus;
            if xor >= WIDTH {
                let level = level_of(xor);
                debug_assert!(level < self.focus_depth);
                self.stabilize(level);
                self.focus_down(level, offset);
                self.focus = offset & !crate::MASK;
            }
        } else {
            self.normalize();
            self.focus_from_root(index);
        }
    }

    /// Moves the focus to the last leaf, where appends land.
    pub(crate) fn focus_on_last_block(&mut self) {
        self.focus_on(self.len - 1);
    }
}
