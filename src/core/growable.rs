//! Growable array with an exact doubling growth policy.
//!
//! Every collection in the catalog (child lists, filed books, borrower
//! links, loans) is a `GrowableArray`. Capacity is tracked by the array
//! itself rather than delegated to the allocator, so the growth sequence is
//! observable and stable: 0, 1, 2, 4, 8, ...
//!
//! # Layout
//!
//! ```text
//! slots: [ Some(a) | Some(b) | Some(c) | None | None ... ]
//!          `--------- len ----------'
//!          `---------------- capacity -----------------'
//! ```
//!
//! Occupied slots are always the prefix `slots[..len]`.

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Structural errors raised by checked array access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArrayError {
    #[error("Index out of range: {index} (length {len})")]
    OutOfRange { index: usize, len: usize },

    #[error("Array is empty")]
    Empty,
}

/// A resizable, exclusively-owned sequence
pub struct GrowableArray<T> {
    /// Backing buffer; an empty boxed slice owns no allocation
    slots: Box<[Option<T>]>,

    /// Number of occupied slots
    len: usize,
}

impl<T> GrowableArray<T> {
    /// Create an empty array with capacity 0
    pub fn new() -> Self {
        Self {
            slots: Box::default(),
            len: 0,
        }
    }

    /// Create an empty array with exactly `capacity` slots
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Self::allocate(capacity),
            len: 0,
        }
    }

    fn allocate(capacity: usize) -> Box<[Option<T>]> {
        (0..capacity).map(|_| None).collect()
    }

    /// Move the occupied prefix into a fresh buffer of `capacity` slots
    fn reallocate(&mut self, capacity: usize) {
        let mut next = Self::allocate(capacity);
        for (dst, src) in next.iter_mut().zip(self.slots[..self.len].iter_mut()) {
            *dst = src.take();
        }
        self.slots = next;
    }

    /// Make room for one more element (0 -> 1, otherwise double)
    fn reserve_one(&mut self) {
        if self.len == self.capacity() {
            let next = match self.capacity() {
                0 => 1,
                cap => cap * 2,
            };
            self.reallocate(next);
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.len
    }

    /// Number of allocated slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append an element at the end
    pub fn push(&mut self, value: T) {
        self.reserve_one();
        self.slots[self.len] = Some(value);
        self.len += 1;
    }

    /// Insert an element at `index`, shifting the tail right.
    ///
    /// `index == len()` appends.
    pub fn insert(&mut self, index: usize, value: T) -> Result<(), ArrayError> {
        if index > self.len {
            return Err(ArrayError::OutOfRange {
                index,
                len: self.len,
            });
        }

        self.reserve_one();
        self.slots[self.len] = Some(value);
        self.slots[index..=self.len].rotate_right(1);
        self.len += 1;
        Ok(())
    }

    /// Remove and return the element at `index`, shifting the tail left
    pub fn remove(&mut self, index: usize) -> Result<T, ArrayError> {
        let len = self.len;
        if index >= len {
            return Err(ArrayError::OutOfRange { index, len });
        }

        let removed = self.slots[index].take();
        self.slots[index..len].rotate_left(1);
        self.len -= 1;
        removed.ok_or(ArrayError::OutOfRange { index, len })
    }

    /// Remove the last element
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        self.slots[self.len].take()
    }

    /// Drop every element, keeping the allocation
    pub fn clear(&mut self) {
        for slot in self.slots[..self.len].iter_mut() {
            *slot = None;
        }
        self.len = 0;
    }

    /// Checked access
    pub fn get(&self, index: usize) -> Result<&T, ArrayError> {
        self.slots[..self.len]
            .get(index)
            .and_then(Option::as_ref)
            .ok_or(ArrayError::OutOfRange {
                index,
                len: self.len,
            })
    }

    /// Checked mutable access
    pub fn get_mut(&mut self, index: usize) -> Result<&mut T, ArrayError> {
        let len = self.len;
        self.slots[..len]
            .get_mut(index)
            .and_then(Option::as_mut)
            .ok_or(ArrayError::OutOfRange { index, len })
    }

    pub fn front(&self) -> Result<&T, ArrayError> {
        if self.is_empty() {
            return Err(ArrayError::Empty);
        }
        self.get(0)
    }

    pub fn back(&self) -> Result<&T, ArrayError> {
        if self.is_empty() {
            return Err(ArrayError::Empty);
        }
        self.get(self.len - 1)
    }

    /// Reallocate so that capacity equals length
    pub fn shrink_to_fit(&mut self) {
        if self.capacity() > self.len {
            self.reallocate(self.len);
        }
    }

    /// Index of the first element matching `pred`
    pub fn position<P>(&self, pred: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool,
    {
        self.iter().position(pred)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.slots[..self.len].iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            inner: self.slots[..self.len].iter_mut(),
        }
    }
}

impl<T: PartialEq> GrowableArray<T> {
    pub fn contains(&self, value: &T) -> bool {
        self.iter().any(|v| v == value)
    }
}

impl<T> Default for GrowableArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for GrowableArray<T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            len: self.len,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for GrowableArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for GrowableArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for GrowableArray<T> {}

impl<T: Serialize> Serialize for GrowableArray<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Unchecked-contract access: out-of-range indices panic
impl<T> Index<usize> for GrowableArray<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Ok(value) => value,
            Err(e) => panic!("{}", e),
        }
    }
}

impl<T> IndexMut<usize> for GrowableArray<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        match self.get_mut(index) {
            Ok(value) => value,
            Err(e) => panic!("{}", e),
        }
    }
}

impl<T> FromIterator<T> for GrowableArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = GrowableArray::new();
        array.extend(iter);
        array
    }
}

impl<T> Extend<T> for GrowableArray<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

// ============================================================================
// Iterators
// ============================================================================

/// Borrowing iterator over a `GrowableArray`
pub struct Iter<'a, T> {
    inner: std::slice::Iter<'a, Option<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        self.inner.next().and_then(Option::as_ref)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        self.inner.next_back().and_then(Option::as_ref)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// Mutable iterator over a `GrowableArray`
pub struct IterMut<'a, T> {
    inner: std::slice::IterMut<'a, Option<T>>,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        self.inner.next().and_then(Option::as_mut)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Owning iterator over a `GrowableArray`
pub struct IntoIter<T> {
    inner: std::iter::Take<std::vec::IntoIter<Option<T>>>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.inner.next().flatten()
    }
}

impl<T> IntoIterator for GrowableArray<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        let len = self.len;
        IntoIter {
            inner: Vec::from(self.slots).into_iter().take(len),
        }
    }
}

impl<'a, T> IntoIterator for &'a GrowableArray<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut GrowableArray<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}
