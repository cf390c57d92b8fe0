//! # cassowry
//!
//! A persistent vector backed by a Relaxed Radix-Balanced (RRB) tree with a
//! branching factor of 32.
//!
//! - O(log₃₂ n) indexed access, O(1) for indices near the cached focus
//! - amortized O(1) [`Vector::push_back`] / [`Vector::push_front`]
//! - O(log n) concatenation of two vectors of any size ([`Vector::append_all`])
//! - O(1) [`Clone`]: every clone shares the whole tree
//!
//! The vector keeps the path from its root down to one leaf (the *focus*) in a
//! small array of "displays". Reads near the focus skip the root descent and
//! repeated edits at the same edge write straight into privately owned path
//! nodes. Every node is an [`Arc`]; a node reachable from more than one handle
//! is copied before it is written, so a vector never observes edits made
//! through another handle.
//!
//! ## Example
//!
//! ```rust
//! use cassowry::Vector;
//!
//! let mut left: Vector<u32> = (0..2048).collect();
//! let right: Vector<u32> = (2048..4096).collect();
//! let snapshot = left.clone();
//!
//! left.append_all(right);
//! left.push_front(7);
//!
//! assert_eq!(left.len(), 4097);
//! assert_eq!(left.get(0), Some(&7));
//! assert_eq!(left.nth(-1), Some(&4095));
//! assert_eq!(snapshot.len(), 2048);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::fmt;
use std::ops::Index;
use std::sync::Arc;

mod append;
mod concat;
mod error;
mod focus;
mod iter;
mod node;
mod nth;

pub use error::CapacityError;
pub use iter::Iter;

use node::Node;

// =============================================================================
// Configuration
// =============================================================================

/// Index bits consumed per tree level.
pub const BITS: usize = 5;
/// Branching factor: slots per node.
pub const WIDTH: usize = 1 << BITS;
/// Mask selecting one level's slot from an index.
pub const MASK: usize = WIDTH - 1;
/// Maximum number of tree levels, leaves included.
pub const MAX_DEPTH: usize = 6;
/// Maximum number of elements a vector can hold (32^6).
pub const CAPACITY: usize = 1 << (BITS * MAX_DEPTH);

/// `append_all` splices leaves instead of merging trees when the left side is
/// shorter than this...
pub(crate) const FAST_CONCAT_MAX_LEFT: usize = 1 << (2 * BITS);
/// ...and the right side fits in a single leaf.
pub(crate) const FAST_CONCAT_MAX_RIGHT: usize = WIDTH;

// =============================================================================
// Vector
// =============================================================================

/// A persistent, structurally shared sequence.
///
/// `display[0]` is the focused leaf and `display[k]` its ancestor at level
/// `k`; `display[depth - 1]` is the root. The focus window
/// `[focus_start, focus_end)` is the range of the balanced subtree rooted at
/// `display[focus_depth - 1]`, addressable by plain bit arithmetic.
///
/// While `transient` is set, the child slot on the focus path inside
/// `display[k]` may hold an outdated version of `display[k - 1]`; the display
/// array is authoritative and [`Vector::normalize`] writes it back.
pub struct Vector<T> {
    len: usize,
    /// Number of levels, 0 for the empty vector.
    depth: usize,
    display: [Option<Arc<Node<T>>>; MAX_DEPTH],
    /// Offset of the focused leaf inside the balanced subtree.
    focus: usize,
    focus_start: usize,
    focus_end: usize,
    /// Levels `0..focus_depth` of the path are balanced.
    focus_depth: usize,
    /// Slot indices taken in relaxed nodes above the balanced subtree,
    /// shifted into their level's bit position.
    focus_relax: usize,
    transient: bool,
}

impl<T> Vector<T> {
    /// Creates an empty vector. Does not allocate.
    pub fn new() -> Self {
        Self {
            len: 0,
            depth: 0,
            display: Default::default(),
            focus: 0,
            focus_start: 0,
            focus_end: 0,
            focus_depth: 0,
            focus_relax: 0,
            transient: false,
        }
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the vector holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of tree levels (0 when empty, 1 for a single leaf).
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    fn display_node(&self, level: usize) -> &Arc<Node<T>> {
        match &self.display[level] {
            Some(node) => node,
            None => unreachable!("display level {level} is not populated (depth {})", self.depth),
        }
    }

    /// Slot taken by the focus path inside `display[level]`.
    #[inline]
    fn path_slot(&self, level: usize) -> usize {
        ((self.focus | self.focus_relax) >> (BITS * level)) & MASK
    }
}

impl<T: Clone> Vector<T> {
    /// Returns a copy-on-write handle to `display[level]`.
    #[inline]
    fn display_mut(&mut self, level: usize) -> &mut Node<T> {
        match &mut self.display[level] {
            Some(node) => Arc::make_mut(node),
            None => unreachable!("display level {level} is not populated"),
        }
    }
}

impl<T> Default for Vector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Vector<T> {
    fn clone(&self) -> Self {
        Self {
            len: self.len,
            depth: self.depth,
            display: self.display.clone(),
            focus: self.focus,
            focus_start: self.focus_start,
            focus_end: self.focus_end,
            focus_depth: self.focus_depth,
            focus_relax: self.focus_relax,
            transient: self.transient,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Vector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for Vector<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for Vector<T> {}

impl<T> Index<usize> for Vector<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => panic!(
                "index out of bounds: the len is {} but the index is {}",
                self.len, index
            ),
        }
    }
}

impl<T: Clone> FromIterator<T> for Vector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut vector = Self::new();
        vector.extend(iter);
        vector
    }
}

impl<T: Clone> Extend<T> for Vector<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<T: Clone> From<&[T]> for Vector<T> {
    fn from(items: &[T]) -> Self {
        items.iter().cloned().collect()
    }
}

impl<'a, T> IntoIterator for &'a Vector<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::validate;

    #[test]
    fn test_empty() {
        let v: Vector<u32> = Vector::new();
        assert_eq!(v.len(), 0);
        assert_eq!(v.depth(), 0);
        assert!(v.is_empty());
        assert_eq!(v.get(0), None);
        assert_eq!(v.nth(-1), None);
        assert_eq!(v.iter().count(), 0);
        assert_eq!(validate(&v), 0);
    }

    #[test]
    fn test_round_trip() {
        for n in [0usize, 1, 31, 32, 33, 1023, 1024, 1025, 40_000] {
            let v: Vector<usize> = (0..n).collect();
            let back: Vec<usize> = v.iter().copied().collect();
            assert_eq!(back, (0..n).collect::<Vec<_>>(), "round trip of {n}");
            assert_eq!(validate(&v), 0, "push_back only builds balanced trees");
        }
    }

    #[test]
    fn test_depth_boundaries() {
        let mut v: Vector<u32> = Vector::new();
        let mut next = 0u32;
        for k in 1..=4usize {
            let target = 1usize << (BITS * k);
            while v.len() < target {
                v.push_back(next);
                next += 1;
            }
            assert_eq!(v.depth(), k, "32^{k} elements");
            v.push_back(next);
            next += 1;
            assert_eq!(v.depth(), k + 1, "32^{k} + 1 elements");
        }
        assert_eq!(v.get(1 << 20), Some(&(1u32 << 20)));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut a: Vector<u32> = (0..100).collect();
        let b = a.clone();
        a.push_back(100);
        a.push_front(999);
        assert_eq!(b.len(), 100);
        assert_eq!(b.iter().copied().collect::<Vec<_>>(), (0..100).collect::<Vec<_>>());
        assert_eq!(a.get(0), Some(&999));
        assert_eq!(a.get(101), Some(&100));
    }

    #[test]
    fn test_eq_and_debug() {
        let a: Vector<u32> = (0..3).collect();
        let mut b: Vector<u32> = Vector::new();
        b.push_front(2);
        b.push_front(1);
        b.push_front(0);
        assert_eq!(a, b);
        assert_eq!(format!("{a:?}"), "[0, 1, 2]");
        assert_ne!(a, (0..4).collect::<Vector<u32>>());
    }

    #[test]
    fn test_index_and_from_slice() {
        let v = Vector::from(&[10, 20, 30][..]);
        assert_eq!(v[1], 20);
        let sum: i32 = (&v).into_iter().sum();
        assert_eq!(sum, 60);
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn test_index_out_of_bounds() {
        let v: Vector<u32> = (0..3).collect();
        let _ = v[3];
    }

    #[test]
    fn test_shared_reads_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Vector<String>>();

        let mut v: Vector<u64> = (0..10_000).collect();
        v.normalize();
        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let v = v.clone();
                std::thread::spawn(move || {
                    (0..10_000usize)
                        .step_by(4)
                        .map(|i| v[i + t as usize])
                        .sum::<u64>()
                })
            })
            .collect();
        for (t, handle) in handles.into_iter().enumerate() {
            let expected: u64 = (0..10_000u64).step_by(4).map(|i| i + t as u64).sum();
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    #[test]
    fn test_randomized_against_vec() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(7);
        let mut v: Vector<u64> = Vector::new();
        let mut m: Vec<u64> = Vec::new();

        for _ in 0..20_000 {
            match rng.gen_range(0..100) {
                0..=44 => {
                    let x: u64 = rng.gen();
                    v.push_back(x);
                    m.push(x);
                }
                45..=69 => {
                    let x: u64 = rng.gen();
                    v.push_front(x);
                    m.insert(0, x);
                }
                70..=97 => {
                    if !m.is_empty() {
                        let i = rng.gen_range(0..m.len());
                        assert_eq!(v.get(i), m.get(i), "index {i}");
                    }
                }
                _ => {
                    let n = rng.gen_range(0..200);
                    let extra: Vec<u64> = (0..n).map(|_| rng.gen()).collect();
                    v.append_all(extra.iter().copied().collect());
                    m.extend_from_slice(&extra);
                }
            }
            assert_eq!(v.len(), m.len());
        }

        validate(&v);
        assert_eq!(v.iter().copied().collect::<Vec<_>>(), m);
    }
}

#[cfg(test)]
mod proptests;
