//! # cassowry-bench
//!
//! Benchmark support for `cassowry`. The benches in `benches/` compare
//! [`cassowry::Vector`] against `Vec`, `VecDeque`, `std::collections::LinkedList`
//! and the persistent [`SinglyLinkedList`] defined here.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

struct Link<T> {
    value: T,
    /// Number of elements from this link down to the oldest one.
    len: usize,
    next: Option<Arc<Link<T>>>,
}

/// Persistent singly-linked list. New elements go on top, and indices count
/// from the oldest element, so index order is insertion order.
///
/// ```rust
/// use cassowry_bench::SinglyLinkedList;
///
/// let list = SinglyLinkedList::of(1).push(2).push(3);
/// assert_eq!(list.nth(0), Some(&1));
/// assert_eq!(list.nth(-1), Some(&3));
/// assert_eq!(list.to_vec(), vec![1, 2, 3]);
/// ```
pub struct SinglyLinkedList<T> {
    head: Option<Arc<Link<T>>>,
}

impl<T> SinglyLinkedList<T> {
    /// The empty list.
    pub fn new() -> Self {
        Self { head: None }
    }

    /// A list holding only `value`.
    pub fn of(value: T) -> Self {
        Self::new().push(value)
    }

    /// Returns a new list with `value` on top; `self` is shared, not copied.
    pub fn push(&self, value: T) -> Self {
        let link = Link {
            value,
            len: self.len() + 1,
            next: self.head.clone(),
        };
        Self {
            head: Some(Arc::new(link)),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.head.as_ref().map_or(0, |link| link.len)
    }

    /// Returns `true` if the list holds no elements.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Element at insertion position `index`; negative indices count from the
    /// newest element. Walks from the top, so older elements cost more.
    pub fn nth(&self, index: isize) -> Option<&T> {
        let index = if index < 0 {
            index.checked_add_unsigned(self.len())?
        } else {
            index
        };
        let index = usize::try_from(index).ok()?;
        if index >= self.len() {
            return None;
        }
        self.links()
            .find(|link| link.len - 1 == index)
            .map(|link| &link.value)
    }

    /// The oldest `n` elements. Shares every link with `self`.
    ///
    /// This trims from the newest end. A list that counts from its top
    /// would instead keep the oldest `len - n`; here `take(n)` and `drop(n)`
    /// mirror `Iterator::take` and `Iterator::skip` over insertion order.
    pub fn take(&self, n: usize) -> Self {
        if n >= self.len() {
            return self.clone();
        }
        Self {
            head: self.links().find(|link| link.len == n).cloned(),
        }
    }

    fn links(&self) -> impl Iterator<Item = &Arc<Link<T>>> {
        std::iter::successors(self.head.as_ref(), |link| link.next.as_ref())
    }
}

impl<T: Clone> SinglyLinkedList<T> {
    /// Builds a list whose insertion order is the order of `items`.
    pub fn from_slice(items: &[T]) -> Self {
        items
            .iter()
            .fold(Self::new(), |list, item| list.push(item.clone()))
    }

    /// Everything but the oldest `n` elements. The remaining links are
    /// rebuilt because their lengths change.
    pub fn drop(&self, n: usize) -> Self {
        if n >= self.len() {
            return Self::new();
        }
        let kept = self.len() - n;
        let mut newest_first: Vec<&T> = self.links().take(kept).map(|link| &link.value).collect();
        newest_first.reverse();
        newest_first
            .into_iter()
            .fold(Self::new(), |list, item| list.push(item.clone()))
    }

    /// Elements in insertion order, oldest first. This is the reverse of
    /// the order the links are stored in, which runs newest first.
    pub fn to_vec(&self) -> Vec<T> {
        let mut items: Vec<T> = self.links().map(|link| link.value.clone()).collect();
        items.reverse();
        items
    }
}

impl<T> Default for SinglyLinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SinglyLinkedList<T> {
    fn clone(&self) -> Self {
        Self {
            head: self.head.clone(),
        }
    }
}

impl<T> Drop for SinglyLinkedList<T> {
    // Unlink iteratively so long lists do not overflow the stack.
    fn drop(&mut self) {
        let mut next = self.head.take();
        while let Some(link) = next {
            match Arc::try_unwrap(link) {
                Ok(mut link) => next = link.next.take(),
                Err(_) => break,
            }
        }
    }
}
