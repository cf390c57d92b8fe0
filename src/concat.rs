//! Concatenation.
//!
//! A short left side absorbing a single leaf is handled by plain appends.
//! Everything else is a tree merge: both sides are focused on the edges that
//! meet, and the merge climbs level by level, repacking the slots of the two
//! edge nodes together with the result of the level below into as few nodes as
//! possible. Untouched subtrees on either side are shared, not copied.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::CapacityError;
use crate::node::{compute_branching, copy_slots, with_computed_sizes, Node};
use crate::{Vector, FAST_CONCAT_MAX_LEFT, FAST_CONCAT_MAX_RIGHT, MAX_DEPTH, WIDTH};

impl<T: Clone> Vector<T> {
    /// Moves every element of `other` to the end of `self`.
    ///
    /// # Panics
    ///
    /// Panics if the combined length exceeds [`CAPACITY`](crate::CAPACITY) or
    /// the merged tree would need more than [`MAX_DEPTH`](crate::MAX_DEPTH)
    /// levels.
    pub fn append_all(&mut self, other: Vector<T>) {
        if let Err(err) = self.try_append_all(other) {
            panic!("{err}");
        }
    }

    /// Moves every element of `other` to the end of `self`, reporting
    /// capacity exhaustion instead of panicking. On error `self` keeps its
    /// previous contents.
    pub fn try_append_all(&mut self, mut other: Vector<T>) -> Result<(), CapacityError> {
        if other.is_empty() {
            return Ok(());
        }
        if self.is_empty() {
            *self = other;
            return Ok(());
        }
        self.check_growth(other.len)?;

        if self.len < FAST_CONCAT_MAX_LEFT && other.len <= FAST_CONCAT_MAX_RIGHT {
            self.append_leaves(&other)
        } else {
            self.append_trees(&mut other)
        }
    }

    /// Returns the concatenation of `self` and `other`, leaving both intact.
    pub fn concat(&self, other: &Vector<T>) -> Vector<T> {
        let mut result = self.clone();
        result.append_all(other.clone());
        result
    }

    fn append_leaves(&mut self, other: &Vector<T>) -> Result<(), CapacityError> {
        trace!(left = self.len, right = other.len, "appending leaves");
        self.focus_on_last_block();
        self.make_transient_if_needed();
        let mut index = 0;
        while index < other.len {
            let (leaf, offset) = other.leaf_at(index);
            let items = &leaf[offset..];
            self.extend_back_from_slice(items)?;
            index += items.len();
        }
        Ok(())
    }

    fn append_trees(&mut self, other: &mut Vector<T>) -> Result<(), CapacityError> {
        self.normalize();
        other.normalize();
        self.focus_on(self.len - 1);
        other.focus_on(0);

        let max_depth = self.depth.max(other.depth);
        debug!(
            left = self.len,
            right = other.len,
            left_depth = self.depth,
            right_depth = other.depth,
            "merging trees"
        );

        let mut concat = rebalance_leaves(self.display_node(0), other.display_node(0));
        for level in 1..max_depth {
            let left = (level < self.depth).then(|| &**self.display_node(level));
            let right = (level < other.depth).then(|| &**other.display_node(level));
            concat = rebalance(left, concat, right, level);
        }

        let (root, depth) = match concat.len() {
            1 => (concat.swap_remove(0), max_depth),
            _ if max_depth == MAX_DEPTH => {
                return Err(CapacityError::Depth {
                    requested: MAX_DEPTH + 1,
                    max: MAX_DEPTH,
                })
            }
            _ => (Arc::new(with_computed_sizes(concat, max_depth)), max_depth + 1),
        };

        self.len += other.len;
        debug!(len = self.len, depth, relaxed = root.is_relaxed(), "merged trees");
        self.init_from_root(root, depth);
        Ok(())
    }
}

/// Merges the last leaf of the left side with the first leaf of the right
/// side into one or two leaves, the first of them full whenever possible.
fn rebalance_leaves<T: Clone>(left: &Arc<Node<T>>, right: &Arc<Node<T>>) -> Vec<Arc<Node<T>>> {
    let (l, r) = (left.leaf(), right.leaf());
    if l.len() == WIDTH {
        return vec![left.clone(), right.clone()];
    }
    let mut first = Vec::with_capacity(WIDTH);
    first.extend_from_slice(l);
    if l.len() + r.len() <= WIDTH {
        first.extend_from_slice(r);
        return vec![Arc::new(Node::Leaf(first))];
    }
    let split = WIDTH - l.len();
    first.extend_from_slice(&r[..split]);
    vec![
        Arc::new(Node::Leaf(first)),
        Arc::new(Node::Leaf(r[split..].to_vec())),
    ]
}

/// Builds the nodes at `level` that replace the left edge node, the right
/// edge node and the merged nodes of the level below.
///
/// The children taking part are those of `left` except its last, then
/// `concat`, then those of `right` except its first. Their slots are packed
/// greedily into full nodes; a child that is already full is kept as-is when
/// it starts on a node boundary.
fn rebalance<T: Clone>(
    left: Option<&Node<T>>,
    concat: Vec<Arc<Node<T>>>,
    right: Option<&Node<T>>,
    level: usize,
) -> Vec<Arc<Node<T>>> {
    let left_children = left.map_or(&[][..], |node| {
        let children = node.children();
        &children[..children.len() - 1]
    });
    let right_children = right.map_or(&[][..], |node| &node.children()[1..]);
    let branching = compute_branching(left_children, &concat, right_children);
    trace!(level, branching, "rebalancing");

    let mut packed: Vec<Arc<Node<T>>> = Vec::with_capacity(branching.div_ceil(WIDTH));
    let mut bot: Option<Node<T>> = None;
    for child in left_children.iter().chain(&concat).chain(right_children) {
        let slots = child.slots();
        if bot.is_none() && slots == WIDTH {
            packed.push(child.clone());
            continue;
        }
        let mut from = 0;
        while from < slots {
            let node = bot.get_or_insert_with(|| Node::with_capacity(level - 1, WIDTH));
            let count = (slots - from).min(WIDTH - node.slots());
            copy_slots(node, child, from, count);
            from += count;
            if node.slots() == WIDTH {
                if let Some(node) = bot.take() {
                    packed.push(finish(node, level - 1));
                }
            }
        }
    }
    if let Some(node) = bot {
        packed.push(finish(node, level - 1));
    }

    packed
        .chunks(WIDTH)
        .map(|group| Arc::new(with_computed_sizes(group.to_vec(), level)))
        .collect()
}

fn finish<T>(mut node: Node<T>, level: usize) -> Arc<Node<T>> {
    if level > 0 {
        node.settle(level);
    }
    Arc::new(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::validate;

    fn range(r: std::ops::Range<u32>) -> Vector<u32> {
        r.collect()
    }

    #[test]
    fn test_small_right_side_is_appended_leafwise() {
        let mut v = range(0..1023);
        v.append_all(range(1023..1055));
        // Leaf-wise appends leave the edited path pending write-back.
        assert!(v.transient);
        assert_eq!(v.len(), 1055);
        assert_eq!(validate(&v), 0);
        assert!(v.iter().copied().eq(0..1055));
        assert_eq!(v.get(1023), Some(&1023));
    }

    #[test]
    fn test_fast_path_limits() {
        let mut v = range(0..1024);
        v.append_all(range(1024..1056));
        assert!(!v.transient);
        assert!(v.iter().copied().eq(0..1056));

        let mut v = range(0..1023);
        v.append_all(range(1023..1056));
        assert!(!v.transient);
        assert_eq!(validate(&v), 0);
        assert!(v.iter().copied().eq(0..1056));
    }

    #[test]
    fn test_full_merge_shares_leaves() {
        let left = range(0..2048);
        let right = range(2048..4096);
        let left_leaf = left.leaf_at(0).0.as_ptr();
        let right_leaf = right.leaf_at(0).0.as_ptr();

        let mut v = left.clone();
        v.append_all(right.clone());
        assert!(!v.transient);
        assert_eq!(v.len(), 4096);
        assert_eq!(validate(&v), 0);
        assert!(v.iter().copied().eq(0..4096));
        assert!(std::ptr::eq(v.leaf_at(0).0.as_ptr(), left_leaf));
        assert!(std::ptr::eq(v.leaf_at(2048).0.as_ptr(), right_leaf));
    }

    #[test]
    fn test_unaligned_merge_keeps_order() {
        let mut v = range(0..1500);
        v.append_all(range(1500..1537));
        v.append_all(range(1537..4000));
        validate(&v);
        assert!(v.iter().copied().eq(0..4000));
        for i in (0..4000).step_by(97) {
            assert_eq!(v.get(i as usize), Some(&i));
        }
    }

    #[test]
    fn test_differing_depths() {
        let mut shallow = range(0..5);
        shallow.append_all(range(5..40_000));
        validate(&shallow);
        assert!(shallow.iter().copied().eq(0..40_000));

        let mut deep = range(0..40_000);
        deep.append_all(range(40_000..40_100));
        validate(&deep);
        assert_eq!(deep.nth(-1), Some(&40_099));
        assert_eq!(deep.get(40_000), Some(&40_000));
    }

    #[test]
    fn test_operands_survive() {
        let a = range(0..3000);
        let b = range(3000..5000);
        let c = a.concat(&b);
        assert_eq!(c.len(), 5000);
        assert!(c.iter().copied().eq(0..5000));
        assert!(a.iter().copied().eq(0..3000));
        assert!(b.iter().copied().eq(3000..5000));
    }

    #[test]
    fn test_small_operands() {
        let v = range(0..10).concat(&range(10..20));
        assert_eq!(v.depth(), 1);
        assert!(v.iter().copied().eq(0..20));

        let v = range(0..20).concat(&range(20..40));
        assert_eq!(v.depth(), 2);
        assert!(v.iter().copied().eq(0..40));
    }

    #[test]
    fn test_empty_operands() {
        let empty: Vector<u32> = Vector::new();
        assert_eq!(empty.concat(&range(0..3)), range(0..3));
        assert_eq!(range(0..3).concat(&empty), range(0..3));
        assert!(empty.concat(&empty).is_empty());
    }

    #[test]
    fn test_edits_after_merge() {
        let mut v = range(100..2100);
        v.append_all(range(2100..2200));
        v.push_front(99);
        v.push_back(2200);
        let mut left = range(0..99);
        left.append_all(v);
        validate(&left);
        assert!(left.iter().copied().eq(0..2201));
    }

    #[test]
    fn test_repeated_self_concat() {
        let mut v = range(0..33);
        for _ in 0..10 {
            v = v.concat(&v);
        }
        assert_eq!(v.len(), 33 << 10);
        validate(&v);
        for i in (0..v.len()).step_by(1013) {
            assert_eq!(v.get(i), Some(&((i % 33) as u32)));
        }
    }
}
