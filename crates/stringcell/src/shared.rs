//! Reference-counted handles over [`StringValue`].
//!
//! The kernel's mutators take `&mut StringValue` and treat exclusive access
//! as proof of unique ownership. This module supplies the sharing story on
//! top: a [`SharedString`] is a cheap-to-clone handle, and whether a handle
//! is shared is a property of the handle graph, queried with
//! [`is_shared`](SharedString::is_shared), never a flag stored inside the
//! value.
//!
//! Reads through a shared handle use an already-cached fast path when one
//! exists but never populate a cache, since that would require mutating a
//! value another handle can observe. [`value_mut`](SharedString::value_mut)
//! insists on uniqueness and panics otherwise; callers that want mutate-or-
//! copy semantics go through [`make_unique`](SharedString::make_unique) or
//! the copy-on-write [`reverse`](SharedString::reverse).

use alloc::rc::Rc;

use crate::value::{Chars, StringValue};

/// A clonable handle to a [`StringValue`].
#[derive(Clone)]
pub struct SharedString {
    inner: Rc<StringValue>,
}

impl SharedString {
    /// Wraps a value in a handle, taking sole ownership of it.
    #[must_use]
    pub fn new(value: StringValue) -> Self {
        SharedString {
            inner: Rc::new(value),
        }
    }

    /// True when any other live handle refers to the same value.
    #[must_use]
    pub fn is_shared(&self) -> bool {
        Rc::strong_count(&self.inner) > 1
    }

    /// Borrows the value for reading.
    #[must_use]
    pub fn value(&self) -> &StringValue {
        &self.inner
    }

    /// Borrows the value for mutation. The handle must be unique; mutating
    /// through a shared handle is a caller bug and panics.
    pub fn value_mut(&mut self) -> &mut StringValue {
        assert!(
            !self.is_shared(),
            "cannot mutate a shared string value in place"
        );
        // Uniqueness was just asserted.
        match Rc::get_mut(&mut self.inner) {
            Some(value) => value,
            None => unreachable!(),
        }
    }

    /// Borrows the value for mutation, cloning it first when shared. Other
    /// handles keep the original.
    pub fn make_unique(&mut self) -> &mut StringValue {
        Rc::make_mut(&mut self.inner)
    }

    /// Number of abstract characters. A unique handle computes and caches
    /// the count; a shared one reads a cached count when present and scans
    /// otherwise.
    #[must_use]
    pub fn char_length(&mut self) -> usize {
        match Rc::get_mut(&mut self.inner) {
            Some(value) => value.char_length(),
            None => self.inner.char_length_uncached(),
        }
    }

    /// The `index`'th character. Out-of-range indices panic.
    #[must_use]
    pub fn char_at(&mut self, index: usize) -> char {
        match Rc::get_mut(&mut self.inner) {
            Some(value) => value.char_at(index),
            None => self.inner.char_at_uncached(index),
        }
    }

    /// The characters from `first` through `last` inclusive, as a fresh
    /// unshared handle.
    #[must_use]
    pub fn substring(&mut self, first: usize, last: usize) -> SharedString {
        let value = match Rc::get_mut(&mut self.inner) {
            Some(value) => value.substring(first, last),
            None => self.inner.substring_uncached(first, last),
        };
        SharedString::new(value)
    }

    /// Iterates the characters without touching any cache.
    pub fn chars(&self) -> Chars<'_> {
        self.inner.chars()
    }

    /// Reverses the character sequence. A unique handle reverses in place;
    /// a shared one is repointed at a reversed copy, leaving the other
    /// handles' view intact.
    pub fn reverse(&mut self) {
        match Rc::get_mut(&mut self.inner) {
            Some(value) => value.reverse_in_place(),
            None => self.inner = Rc::new(self.inner.reversed()),
        }
    }
}

impl From<StringValue> for SharedString {
    fn from(value: StringValue) -> Self {
        SharedString::new(value)
    }
}

impl From<&str> for SharedString {
    fn from(text: &str) -> Self {
        SharedString::new(StringValue::from_str(text))
    }
}

impl PartialEq for SharedString {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner) || *self.inner == *other.inner
    }
}

impl Eq for SharedString {}

impl core::fmt::Display for SharedString {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.inner.fmt(f)
    }
}

impl core::fmt::Debug for SharedString {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SharedString({:?})", self.inner)
    }
}
