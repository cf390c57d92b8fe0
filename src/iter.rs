use std::iter::FusedIterator;
use std::slice;

use crate::Vector;

/// Borrowing iterator over a [`Vector`], walking one leaf at a time.
pub struct Iter<'a, T> {
    vector: &'a Vector<T>,
    /// Index of the first element after `leaf`.
    next_leaf: usize,
    leaf: slice::Iter<'a, T>,
}

impl<T> Vector<T> {
    /// Iterates over the elements front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            vector: self,
            next_leaf: 0,
            leaf: <&[T]>::default().iter(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if let Some(item) = self.leaf.next() {
            return Some(item);
        }
        if self.next_leaf >= self.vector.len() {
            return None;
        }
        let (leaf, offset) = self.vector.leaf_at(self.next_leaf);
        let rest = &leaf[offset..];
        self.next_leaf += rest.len();
        self.leaf = rest.iter();
        self.leaf.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len();
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {
    fn len(&self) -> usize {
        self.leaf.len() + (self.vector.len() - self.next_leaf)
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            vector: self.vector,
            next_leaf: self.next_leaf,
            leaf: self.leaf.clone(),
        }
    }
}
