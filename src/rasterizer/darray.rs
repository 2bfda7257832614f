//! Growable buffer used for mesh storage and per-frame scratch lists
//!
//! Growth is geometric: when an append does not fit, capacity becomes the
//! larger of twice the old capacity and the exact amount needed. The buffer
//! never shrinks on its own; `reset_size` rewinds the logical length and
//! keeps the storage, `shrink_to_fit` is the only way to give memory back.
//!
//! An empty, never-allocated buffer behaves like a null handle: queries
//! return zero, removals do nothing, appends allocate.

use std::ops::{Deref, DerefMut};
use super::error::RenderError;

#[derive(Debug, Clone)]
pub struct GrowBuffer<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> Default for GrowBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> GrowBuffer<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            capacity: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Result<Self, RenderError> {
        let mut buf = Self::new();
        buf.reserve(capacity)?;
        Ok(buf)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Logical capacity (what the growth policy has committed to)
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn element_size(&self) -> usize {
        std::mem::size_of::<T>()
    }

    fn grow_for(&mut self, additional: usize) -> Result<(), RenderError> {
        let needed = self.items.len() + additional;
        if needed <= self.capacity {
            return Ok(());
        }
        let new_cap = needed.max(self.capacity * 2);
        self.set_capacity(new_cap)
    }

    fn set_capacity(&mut self, new_cap: usize) -> Result<(), RenderError> {
        let extra = new_cap.saturating_sub(self.items.len());
        self.items
            .try_reserve_exact(extra)
            .map_err(|_| RenderError::Allocation { requested: new_cap })?;
        self.capacity = new_cap;
        Ok(())
    }

    pub fn push(&mut self, value: T) -> Result<(), RenderError> {
        self.grow_for(1)?;
        self.items.push(value);
        Ok(())
    }

    /// Insert at `position`, shifting the tail up by one.
    /// Positions past the end append.
    pub fn insert(&mut self, position: usize, value: T) -> Result<(), RenderError> {
        self.grow_for(1)?;
        let position = position.min(self.items.len());
        self.items.insert(position, value);
        Ok(())
    }

    /// Remove the first element, shifting the rest down
    pub fn pop_first(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        Some(self.items.remove(0))
    }

    pub fn pop_last(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Logical clear; capacity is kept
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Rewind the length to `size`. Larger sizes are ignored.
    pub fn reset_size(&mut self, size: usize) {
        if size > self.items.len() {
            return;
        }
        self.items.truncate(size);
    }

    /// Grow capacity to exactly `new_cap`; smaller requests are ignored
    pub fn reserve(&mut self, new_cap: usize) -> Result<(), RenderError> {
        if new_cap < self.capacity {
            return Ok(());
        }
        self.set_capacity(new_cap)
    }

    pub fn shrink_to_fit(&mut self) {
        self.items.shrink_to_fit();
        self.capacity = self.items.len();
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T: Default> GrowBuffer<T> {
    /// Append `count` default elements
    pub fn alloc(&mut self, count: usize) -> Result<(), RenderError> {
        self.grow_for(count)?;
        self.items.extend((0..count).map(|_| T::default()));
        Ok(())
    }

    /// Open a gap of `count` default elements at `position`
    pub fn make_space(&mut self, position: usize, count: usize) -> Result<(), RenderError> {
        self.grow_for(count)?;
        let position = position.min(self.items.len());
        self.items
            .splice(position..position, (0..count).map(|_| T::default()));
        Ok(())
    }
}

impl<T> Deref for GrowBuffer<T> {
    type Target = [T];
    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> DerefMut for GrowBuffer<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.items
    }
}

impl<'a, T> IntoIterator for &'a GrowBuffer<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_read_back_in_order() {
        for n in [0usize, 1, 2, 3, 7, 64, 1000] {
            let mut buf = GrowBuffer::new();
            for i in 0..n {
                buf.push(i as u32 * 3).unwrap();
            }
            assert_eq!(buf.len(), n);
            for (i, v) in buf.iter().enumerate() {
                assert_eq!(*v, i as u32 * 3);
            }
        }
    }

    #[test]
    fn test_growth_doubles() {
        let mut buf = GrowBuffer::new();
        buf.push(1u8).unwrap();
        assert_eq!(buf.capacity(), 1);
        buf.push(2).unwrap();
        assert_eq!(buf.capacity(), 2);
        buf.push(3).unwrap();
        assert_eq!(buf.capacity(), 4);
        buf.push(4).unwrap();
        buf.push(5).unwrap();
        assert_eq!(buf.capacity(), 8);
    }

    #[test]
    fn test_alloc_larger_than_double_is_exact() {
        let mut buf: GrowBuffer<f32> = GrowBuffer::new();
        buf.push(1.0).unwrap();
        buf.alloc(10).unwrap();
        assert_eq!(buf.len(), 11);
        assert_eq!(buf.capacity(), 11);
        assert_eq!(buf[5], 0.0);
    }

    #[test]
    fn test_empty_buffer_queries() {
        let mut buf: GrowBuffer<i32> = GrowBuffer::new();
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.capacity(), 0);
        assert_eq!(buf.pop_first(), None);
        assert_eq!(buf.pop_last(), None);
        buf.reset_size(4);
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.element_size(), 4);
    }

    #[test]
    fn test_make_space_and_insert() {
        let mut buf = GrowBuffer::new();
        for v in [1, 2, 5] {
            buf.push(v).unwrap();
        }
        buf.make_space(2, 2).unwrap();
        assert_eq!(buf.as_slice(), &[1, 2, 0, 0, 5]);
        buf[2] = 3;
        buf[3] = 4;
        buf.insert(0, 0).unwrap();
        assert_eq!(buf.as_slice(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_pops() {
        let mut buf = GrowBuffer::new();
        for v in 0..4 {
            buf.push(v).unwrap();
        }
        assert_eq!(buf.pop_first(), Some(0));
        assert_eq!(buf.pop_last(), Some(3));
        assert_eq!(buf.as_slice(), &[1, 2]);
    }

    #[test]
    fn test_reset_size_keeps_capacity() {
        let mut buf = GrowBuffer::new();
        for v in 0..10 {
            buf.push(v).unwrap();
        }
        let cap = buf.capacity();
        buf.reset_size(3);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.capacity(), cap);
        buf.reset_size(8);
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_reserve_and_shrink() {
        let mut buf = GrowBuffer::with_capacity(16).unwrap();
        assert_eq!(buf.capacity(), 16);
        buf.reserve(4).unwrap();
        assert_eq!(buf.capacity(), 16);
        buf.push(1u64).unwrap();
        buf.push(2).unwrap();
        assert_eq!(buf.capacity(), 16);
        buf.shrink_to_fit();
        assert_eq!(buf.capacity(), 2);
        assert_eq!(buf.as_slice(), &[1, 2]);
    }
}
