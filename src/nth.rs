//! Indexed access.
//!
//! Indices inside the focus window are resolved from the display array by
//! XOR-ing against the focused leaf's offset: the highest differing 5-bit group
//! tells how many levels have to be walked. Everything else descends from the
//! root, using size tables until a balanced subtree is reached.

use crate::focus::level_of;
use crate::node::Node;
use crate::{Vector, BITS, MASK};

impl<T> Vector<T> {
    /// Returns the element at `index`, or `None` when out of bounds.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        if self.focus_start <= index && index < self.focus_end {
            let offset = index - self.focus_start;
            return Some(self.get_in_focus(offset, offset ^ self.focus));
        }
        Some(self.get_from_root(index))
    }

    /// Returns the element at `index`, counting from the end when `index` is
    /// negative (`-1` is the last element).
    pub fn nth(&self, index: isize) -> Option<&T> {
        let index = if index < 0 {
            index.checked_add_unsigned(self.len)?
        } else {
            index
        };
        usize::try_from(index).ok().and_then(|index| self.get(index))
    }

    /// Like [`Vector::nth`], yielding `not_found` for an out-of-range index.
    ///
    /// ```rust
    /// use cassowry::Vector;
    ///
    /// let v: Vector<i32> = (1..=3).collect();
    /// assert_eq!(*v.nth_or(-1, &0), 3);
    /// assert_eq!(*v.nth_or(3, &0), 0);
    /// ```
    pub fn nth_or<'a>(&'a self, index: isize, not_found: &'a T) -> &'a T {
        self.nth(index).unwrap_or(not_found)
    }

    #[inline]
    fn get_in_focus(&self, offset: usize, xor: usize) -> &T {
        let level = level_of(xor);
        debug_assert!(level < self.focus_depth);
        get_elem(self.display_node(level), offset, level)
    }

    fn get_from_root(&self, index: usize) -> &T {
        let mut level = self.depth - 1;
        let mut node: &Node<T> = self.display_node(level);
        let mut index = index;
        let mut on_path = self.transient;
        while level > 0 {
            if !on_path && !node.is_relaxed() {
                return get_elem(node, index, level);
            }
            let (slot, rest) = node.locate(index, level);
            node = if on_path && slot == self.path_slot(level) {
                self.display_node(level - 1)
            } else {
                on_path = false;
                node.child(slot)
            };
            index = rest;
            level -= 1;
        }
        &node.leaf()[index]
    }

    /// Leaf holding `index` and the position of `index` inside it.
    pub(crate) fn leaf_at(&self, index: usize) -> (&[T], usize) {
        debug_assert!(index < self.len);
        if self.focus_start <= index && index < self.focus_end {
            let offset = index - self.focus_start;
            let level = level_of(offset ^ self.focus);
            let mut node: &Node<T> = self.display_node(level);
            for l in (1..=level).rev() {
                node = node.child((offset >> (BITS * l)) & MASK);
            }
            return (node.leaf(), offset & MASK);
        }

        let mut level = self.depth - 1;
        let mut node: &Node<T> = self.display_node(level);
        let mut index = index;
        let mut on_path = self.transient;
        while level > 0 {
            let (slot, rest) = node.locate(index, level);
            node = if on_path && slot == self.path_slot(level) {
                self.display_node(level - 1)
            } else {
                on_path = false;
                node.child(slot)
            };
            index = rest;
            level -= 1;
        }
        (node.leaf(), index)
    }
}

/// Bit-masked descent through a balanced subtree at `level`.
#[inline]
fn get_elem<T>(node: &Node<T>, i: usize, level: usize) -> &T {
    match level {
        0 => &node.leaf()[i & MASK],
        1 => &node.child((i >> BITS) & MASK).leaf()[i & MASK],
        2 => &node
            .child((i >> (2 * BITS)) & MASK)
            .child((i >> BITS) & MASK)
            .leaf()[i & MASK],
        3 => &node
            .child((i >> (3 * BITS)) & MASK)
            .child((i >> (2 * BITS)) & MASK)
            .child((i >> BITS) & MASK)
            .leaf()[i & MASK],
        4 => &node
            .child((i >> (4 * BITS)) & MASK)
            .child((i >> (3 * BITS)) & MASK)
            .child((i >> (2 * BITS)) & MASK)
            .child((i >> BITS) & MASK)
            .leaf()[i & MASK],
        5 => &node
            .child((i >> (5 * BITS)) & MASK)
            .child((i >> (4 * BITS)) & MASK)
            .child((i >> (3 * BITS)) & MASK)
            .child((i >> (2 * BITS)) & MASK)
            .child((i >> BITS) & MASK)
            .leaf()[i & MASK],
        _ => {
            let mut node = node;
            for l in (1..=level).rev() {
                node = node.child((i >> (BITS * l)) & MASK);
            }
            &node.leaf()[i & MASK]
        }
    }
}
