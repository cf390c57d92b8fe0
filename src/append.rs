//! Single-element append and prepend.
//!
//! Both edges work the same way: focus the edge leaf, take private ownership
//! of the path, and either write into the leaf or hang a fresh chain of nodes
//! off the lowest ancestor with a free slot. Size tables of relaxed ancestors
//! are kept exact so readers never see a stale count.

use std::sync::Arc;

use tracing::trace;

use crate::error::CapacityError;
use crate::node::{branch_of, leaf_of, tree_size, Node};
use crate::{Vector, BITS, CAPACITY, MAX_DEPTH, WIDTH};

impl<T: Clone> Vector<T> {
    /// Appends `value` at the end.
    ///
    /// # Panics
    ///
    /// Panics if the vector already holds [`CAPACITY`](crate::CAPACITY)
    /// elements or its tree cannot grow any deeper.
    pub fn push_back(&mut self, value: T) {
        if let Err(err) = self.try_push_back(value) {
            panic!("{err}");
        }
    }

    /// Appends `value` at the end, reporting capacity exhaustion instead of
    /// panicking.
    pub fn try_push_back(&mut self, value: T) -> Result<(), CapacityError> {
        self.check_growth(1)?;
        if self.depth == 0 {
            self.init_single(value);
            return Ok(());
        }
        self.focus_on_last_block();
        self.make_transient_if_needed();
        if self.display_node(0).slots() < WIDTH {
            self.display_mut(0).leaf_mut().push(value);
            self.grow_back(1);
            Ok(())
        } else {
            self.append_back_new_block(value)
        }
    }

    /// Inserts `value` at the front.
    ///
    /// # Panics
    ///
    /// Panics if the vector already holds [`CAPACITY`](crate::CAPACITY)
    /// elements or its tree cannot grow any deeper.
    pub fn push_front(&mut self, value: T) {
        if let Err(err) = self.try_push_front(value) {
            panic!("{err}");
        }
    }

    /// Inserts `value` at the front, reporting capacity exhaustion instead of
    /// panicking.
    pub fn try_push_front(&mut self, value: T) -> Result<(), CapacityError> {
        self.check_growth(1)?;
        if self.depth == 0 {
            self.init_single(value);
            return Ok(());
        }
        self.focus_on(0);
        self.make_transient_if_needed();
        if self.display_node(0).slots() < WIDTH {
            self.display_mut(0).leaf_mut().insert(0, value);
            self.grow_front(1);
            Ok(())
        } else {
            self.prepend_front_new_block(value)
        }
    }

    /// Returns a new vector with `value` appended; `self` is left untouched.
    pub fn appended(&self, value: T) -> Self {
        let mut vector = self.clone();
        vector.push_back(value);
        vector
    }

    /// Returns a new vector with `value` prepended; `self` is left untouched.
    pub fn prepended(&self, value: T) -> Self {
        let mut vector = self.clone();
        vector.push_front(value);
        vector
    }

    pub(crate) fn check_growth(&self, extra: usize) -> Result<(), CapacityError> {
        match self.len.checked_add(extra) {
            Some(len) if len <= CAPACITY => Ok(()),
            requested => Err(CapacityError::Length {
                requested: requested.unwrap_or(usize::MAX),
                max: CAPACITY,
            }),
        }
    }

    /// Appends `items` at the end, filling the last leaf before opening new
    /// ones. The focus must be on the last leaf and the path transient.
    pub(crate) fn extend_back_from_slice(&mut self, mut items: &[T]) -> Result<(), CapacityError> {
        while let Some((first, rest)) = items.split_first() {
            let room = WIDTH - self.display_node(0).slots();
            if room == 0 {
                self.append_back_new_block(first.clone())?;
                items = rest;
            } else {
                let take = room.min(items.len());
                self.display_mut(0).leaf_mut().extend_from_slice(&items[..take]);
                self.grow_back(take);
                items = &items[take..];
            }
        }
        Ok(())
    }

    /// Accounts for `n` elements written into the focused last leaf.
    fn grow_back(&mut self, n: usize) {
        self.len += n;
        self.focus_end += n;
        for level in self.focus_depth..self.depth {
            if !self.display_node(level).is_relaxed() {
                continue;
            }
            if let Node::Relaxed { sizes, .. } = self.display_mut(level) {
                if let Some(last) = sizes.last_mut() {
                    *last += n;
                }
            }
        }
    }

    /// Accounts for `n` elements written into the focused first leaf.
    fn grow_front(&mut self, n: usize) {
        self.len += n;
        self.focus_end += n;
        for level in self.focus_depth..self.depth {
            if !self.display_node(level).is_relaxed() {
                continue;
            }
            if let Node::Relaxed { sizes, .. } = self.display_mut(level) {
                sizes.iter_mut().for_each(|size| *size += n);
            }
        }
    }

    fn append_back_new_block(&mut self, value: T) -> Result<(), CapacityError> {
        let level = self.free_level()?;
        self.stabilize(level);
        let top = self.new_edge(value, level);
        let slot = {
            let node = self.display_mut(level);
            node.children_mut().push(top);
            node.settle(level);
            node.slots() - 1
        };

        let keep = !((1 << (BITS * (level + 1))) - 1);
        self.focus = ((self.focus | self.focus_relax) & keep) | (slot << (BITS * level));
        self.focus_relax = 0;
        self.transient = true;
        for upper in level + 1..self.depth {
            self.grow_path_node(upper, |sizes| {
                if let Some(last) = sizes.last_mut() {
                    *last += 1;
                }
            });
        }

        self.len += 1;
        self.refocus_edge(true);
        Ok(())
    }

    fn prepend_front_new_block(&mut self, value: T) -> Result<(), CapacityError> {
        let level = self.free_level()?;
        self.stabilize(level);
        let top = self.new_edge(value, level);
        {
            let node = self.display_mut(level);
            node.children_mut().insert(0, top);
            node.settle(level);
        }

        self.focus = 0;
        self.focus_relax = 0;
        self.transient = true;
        for upper in level + 1..self.depth {
            self.grow_path_node(upper, |sizes| sizes.iter_mut().for_each(|size| *size += 1));
        }

        self.len += 1;
        self.refocus_edge(false);
        Ok(())
    }

    /// Lowest level on the focus path with a free slot, adding a root level
    /// when every ancestor is full.
    fn free_level(&mut self) -> Result<usize, CapacityError> {
        let mut level = 1;
        while level < self.depth && self.display_node(level).slots() == WIDTH {
            level += 1;
        }
        if level == self.depth {
            if self.depth == MAX_DEPTH {
                return Err(CapacityError::Depth {
                    requested: MAX_DEPTH + 1,
                    max: MAX_DEPTH,
                });
            }
            self.grow_root();
        }
        Ok(level)
    }

    /// Wraps the current root as the sole child of a new root one level up.
    fn grow_root(&mut self) {
        let level = self.depth;
        let old_root = self.display_node(level - 1).clone();
        let root = if old_root.is_relaxed() {
            let size = self.display_size(level - 1);
            let mut root = branch_of(old_root);
            root.relax(vec![size]);
            root
        } else {
            branch_of(old_root)
        };
        self.display[level] = Some(Arc::new(root));
        self.depth += 1;
        trace!(depth = self.depth, len = self.len, "grew root");
    }

    /// Builds a leaf holding `value` plus single-child ancestors up to
    /// `level - 1`, installs them as `display[..level]` and returns the top.
    fn new_edge(&mut self, value: T, level: usize) -> Arc<Node<T>> {
        let mut node = Arc::new(leaf_of(value));
        self.display[0] = Some(node.clone());
        for l in 1..level {
            node = Arc::new(branch_of(node));
            self.display[l] = Some(node.clone());
        }
        node
    }

    /// Updates `display[level]` after its focus-path child gained one element.
    fn grow_path_node(&mut self, level: usize, bump: impl FnOnce(&mut Vec<usize>)) {
        if self.display_node(level).is_relaxed() {
            if let Node::Relaxed { sizes, .. } = self.display_mut(level) {
                bump(sizes);
            }
        } else if self.display_node(level - 1).is_relaxed() {
            let sizes = self.path_sizes(level);
            self.display_mut(level).relax(sizes);
        }
    }

    /// Cumulative child sizes of `display[level]`, reading the focus-path child
    /// from the display array.
    fn path_sizes(&self, level: usize) -> Vec<usize> {
        let slot = self.path_slot(level);
        let mut acc = 0;
        self.display_node(level)
            .children()
            .iter()
            .enumerate()
            .map(|(i, child)| {
                acc += if i == slot {
                    self.display_size(level - 1)
                } else {
                    tree_size(child, level - 1)
                };
                acc
            })
            .collect()
    }
}
