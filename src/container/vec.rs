//! Contiguous growable array over raw allocation.
//!
//! This is the storage primitive the rest of the crate is built on. Elements
//! are owned by value; duplication only ever happens through explicit
//! `T: Clone` bounds ([`merge`](GrowVec::merge), [`duplicate`](GrowVec::duplicate)),
//! and release happens through `Drop`. Moving a value in transfers ownership
//! without any copy hook.
//!
//! All fallible operations validate their arguments first and leave the
//! array untouched on error, including allocation failure.

use crate::errors::ContainerError;
use std::{
    alloc::{self, Layout},
    cmp::Ordering,
    fmt,
    marker::PhantomData,
    mem::{self, ManuallyDrop},
    ops::Index,
    ptr::{self, NonNull},
    slice,
};

/// Contiguous, resizable, order-aware storage.
///
/// Capacity doubles on overflow (minimum 1) and shrinks only on an explicit
/// [`compact`](Self::compact). `len() <= capacity()` always holds, and
/// `capacity() == 0` exactly when no allocation exists.
pub struct GrowVec<T> {
    ptr: NonNull<T>,
    cap: usize,
    len: usize,
    marker: PhantomData<T>,
}

// Ownership of the elements is by value, so thread transfer and shared reads
// follow the element type.
unsafe impl<T: Send> Send for GrowVec<T> {}
unsafe impl<T: Sync> Sync for GrowVec<T> {}

impl<T> GrowVec<T> {
    /// Creates an empty array. Does not allocate.
    pub const fn new() -> Self {
        GrowVec {
            ptr: NonNull::dangling(),
            cap: 0,
            len: 0,
            marker: PhantomData,
        }
    }

    /// Creates an empty array with room for exactly `n` elements.
    pub fn with_capacity(n: usize) -> Result<Self, ContainerError> {
        let mut vec = Self::new();
        vec.reserve(n)?;
        Ok(vec)
    }

    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        self.cap
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    #[inline]
    pub fn first(&self) -> Option<&T> {
        self.as_slice().first()
    }

    #[inline]
    pub fn last(&self) -> Option<&T> {
        self.as_slice().last()
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    // Zero-sized element types have nothing to store. Rejected up front by
    // every mutating operation, which keeps the allocation paths free of
    // ZST special cases.
    #[inline(always)]
    fn check_item_size() -> Result<(), ContainerError> {
        if mem::size_of::<T>() == 0 {
            log::error!("zero-sized element type.");
            return Err(ContainerError::ZeroSizedItem);
        }
        Ok(())
    }

    /// Grows the allocation to hold at least `n` elements. Never shrinks.
    pub fn reserve(&mut self, n: usize) -> Result<(), ContainerError> {
        Self::check_item_size()?;
        self.grow_to(n)
    }

    /// Grows capacity to the next power of two that holds `n` elements.
    /// No-op for `n == 0`.
    pub fn reserve_pow2(&mut self, n: usize) -> Result<(), ContainerError> {
        Self::check_item_size()?;
        if n == 0 {
            return Ok(());
        }
        let n2 = n
            .checked_next_power_of_two()
            .ok_or(ContainerError::CapacityOverflow)?;
        self.grow_to(n2)
    }

    /// Shrinks the allocation to the current length. An empty array gives
    /// its storage back entirely, restoring `capacity() == 0`.
    pub fn compact(&mut self) -> Result<(), ContainerError> {
        Self::check_item_size()?;
        if self.cap == self.len {
            return Ok(());
        }

        let old_layout = layout_for::<T>(self.cap)?;
        if self.len == 0 {
            unsafe { alloc::dealloc(self.ptr.as_ptr().cast(), old_layout) };
            self.ptr = NonNull::dangling();
            self.cap = 0;
            return Ok(());
        }

        let new_layout = layout_for::<T>(self.len)?;
        let new_ptr =
            unsafe { alloc::realloc(self.ptr.as_ptr().cast(), old_layout, new_layout.size()) };
        match NonNull::new(new_ptr.cast::<T>()) {
            Some(ptr) => {
                self.ptr = ptr;
                self.cap = self.len;
                Ok(())
            }
            None => {
                log::error!("realloc() failed while compacting.");
                Err(ContainerError::AllocFailed)
            }
        }
    }

    fn grow_to(&mut self, new_cap: usize) -> Result<(), ContainerError> {
        if new_cap <= self.cap {
            return Ok(());
        }

        let new_layout = layout_for::<T>(new_cap)?;
        let new_ptr = if self.cap == 0 {
            unsafe { alloc::alloc(new_layout) }
        } else {
            let old_layout = layout_for::<T>(self.cap)?;
            unsafe { alloc::realloc(self.ptr.as_ptr().cast(), old_layout, new_layout.size()) }
        };

        match NonNull::new(new_ptr.cast::<T>()) {
            Some(ptr) => {
                self.ptr = ptr;
                self.cap = new_cap;
                Ok(())
            }
            None => {
                log::error!("allocation of {} elements failed.", new_cap);
                Err(ContainerError::AllocFailed)
            }
        }
    }

    // Doubling growth, minimum capacity 1.
    fn grow_for_push(&mut self) -> Result<(), ContainerError> {
        if self.len < self.cap {
            return Ok(());
        }
        let new_cap = if self.cap == 0 {
            1
        } else {
            self.cap
                .checked_mul(2)
                .ok_or(ContainerError::CapacityOverflow)?
        };
        self.grow_to(new_cap)
    }

    /// Appends `value` at the end.
    #[inline]
    pub fn push(&mut self, value: T) -> Result<(), ContainerError> {
        self.insert(self.len, value)
    }

    /// Inserts `value` at `index`, shifting `index..len` one slot right.
    /// `index == len` appends. Relative order of later elements is preserved.
    pub fn insert(&mut self, index: usize, value: T) -> Result<(), ContainerError> {
        Self::check_item_size()?;
        if index > self.len {
            log::error!("insert index {} out of bounds (len {}).", index, self.len);
            return Err(ContainerError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        self.grow_for_push()?;

        unsafe {
            let base = self.ptr.as_ptr();
            if index < self.len {
                ptr::copy(base.add(index), base.add(index + 1), self.len - index);
            }
            ptr::write(base.add(index), value);
        }
        self.len += 1;
        Ok(())
    }

    /// Inserts `value` at `index` by relocating the element currently there
    /// to the last slot. O(1) relocation instead of an O(n) shift, at the
    /// cost of not preserving the relative order of later elements. Only for
    /// order-irrelevant storage.
    pub fn insert_fast(&mut self, index: usize, value: T) -> Result<(), ContainerError> {
        Self::check_item_size()?;
        if index > self.len {
            log::error!("insert index {} out of bounds (len {}).", index, self.len);
            return Err(ContainerError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        self.grow_for_push()?;

        unsafe {
            let base = self.ptr.as_ptr();
            if index < self.len {
                ptr::copy_nonoverlapping(base.add(index), base.add(self.len), 1);
            }
            ptr::write(base.add(index), value);
        }
        self.len += 1;
        Ok(())
    }

    #[inline]
    fn check_range(&self, start: usize, count: usize) -> Result<(), ContainerError> {
        let oob = ContainerError::RangeOutOfBounds {
            start,
            count,
            len: self.len,
        };
        match start.checked_add(count) {
            Some(end) if end <= self.len => Ok(()),
            _ => {
                log::error!("range {}+{} out of bounds (len {}).", start, count, self.len);
                Err(oob)
            }
        }
    }

    /// Removes `count` elements starting at `start`, dropping each, and
    /// closes the gap by shifting. Relative order is preserved.
    pub fn remove_range(&mut self, start: usize, count: usize) -> Result<(), ContainerError> {
        Self::check_item_size()?;
        self.check_range(start, count)?;
        if count == 0 {
            return Ok(());
        }

        let old_len = self.len;
        let end = start + count;
        unsafe {
            let base = self.ptr.as_ptr();
            // If an element drop panics, len has already been pulled back:
            // the tail leaks but nothing is dropped twice.
            self.len = start;
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(base.add(start), count));
            ptr::copy(base.add(end), base.add(start), old_len - end);
        }
        self.len = old_len - count;
        Ok(())
    }

    /// Removes `count` elements starting at `start`, dropping each, and
    /// fills the gap with elements taken from the tail. Relative order is
    /// not preserved.
    pub fn remove_range_fast(&mut self, start: usize, count: usize) -> Result<(), ContainerError> {
        Self::check_item_size()?;
        self.check_range(start, count)?;
        if count == 0 {
            return Ok(());
        }

        let old_len = self.len;
        let end = start + count;
        unsafe {
            let base = self.ptr.as_ptr();
            self.len = start;
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(base.add(start), count));

            // Pull as many elements from the very end as the gap needs; when
            // the live tail is shorter than the gap this degenerates to a
            // plain shift of that tail.
            let tail = old_len - end;
            let moved = tail.min(count);
            ptr::copy(base.add(old_len - moved), base.add(start), moved);
        }
        self.len = old_len - count;
        Ok(())
    }

    /// Moves `count` elements starting at `start` out into a new array.
    /// Ownership transfers to the returned array, no element is dropped.
    /// The gap closes by shifting, preserving order of the remainder.
    pub fn drain_range(&mut self, start: usize, count: usize) -> Result<Self, ContainerError> {
        Self::check_item_size()?;
        self.check_range(start, count)?;

        let mut out = Self::new();
        out.grow_to(count)?;

        let end = start + count;
        unsafe {
            let base = self.ptr.as_ptr();
            ptr::copy_nonoverlapping(base.add(start), out.ptr.as_ptr(), count);
            out.len = count;
            ptr::copy(base.add(end), base.add(start), self.len - end);
        }
        self.len -= count;
        Ok(out)
    }

    /// Drops every element past `n`. No-op when `n >= len`.
    pub fn truncate(&mut self, n: usize) {
        if n >= self.len {
            return;
        }
        let count = self.len - n;
        unsafe {
            let base = self.ptr.as_ptr();
            self.len = n;
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(base.add(n), count));
        }
    }

    /// Drops all elements. Capacity is kept; see [`compact`](Self::compact).
    #[inline]
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// In-place comparison sort. Stability is not guaranteed.
    #[inline]
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.as_mut_slice().sort_unstable_by(compare);
    }

    /// Raw exchange of two slots. No ownership transfer takes place.
    pub fn swap(&mut self, a: usize, b: usize) -> Result<(), ContainerError> {
        for index in [a, b] {
            if index >= self.len {
                log::error!("swap index {} out of bounds (len {}).", index, self.len);
                return Err(ContainerError::IndexOutOfBounds {
                    index,
                    len: self.len,
                });
            }
        }
        self.as_mut_slice().swap(a, b);
        Ok(())
    }

    /// Reverses element order with len/2 pairwise swaps.
    pub fn reverse(&mut self) {
        let len = self.len;
        let items = self.as_mut_slice();
        let mut i = len / 2;
        while i > 0 {
            i -= 1;
            items.swap(i, len - (i + 1));
        }
    }
}

impl<T: Clone> GrowVec<T> {
    /// Appends a clone of every element of `other`.
    pub fn merge(&mut self, other: &Self) -> Result<(), ContainerError> {
        self.push_slice(other.as_slice())
    }

    /// Appends a clone of every element of `items`.
    pub fn push_slice(&mut self, items: &[T]) -> Result<(), ContainerError> {
        Self::check_item_size()?;
        let total = self
            .len
            .checked_add(items.len())
            .ok_or(ContainerError::CapacityOverflow)?;
        self.reserve_pow2(total)?;

        for item in items {
            self.insert(self.len, item.clone())?;
        }
        Ok(())
    }

    /// Deep copy of the whole array.
    ///
    /// `Clone` is deliberately not implemented: duplication allocates, and
    /// allocation failure here is reported rather than aborted on.
    pub fn duplicate(&self) -> Result<Self, ContainerError> {
        let mut copy = Self::new();
        copy.merge(self)?;
        Ok(copy)
    }
}

impl<T> Drop for GrowVec<T> {
    fn drop(&mut self) {
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.len));
            if self.cap != 0 {
                if let Ok(layout) = Layout::array::<T>(self.cap) {
                    alloc::dealloc(self.ptr.as_ptr().cast(), layout);
                }
            }
        }
    }
}

impl<T> Default for GrowVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for GrowVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for GrowVec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}
impl<T: Eq> Eq for GrowVec<T> {}

impl<T> Index<usize> for GrowVec<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<'a, T> IntoIterator for &'a GrowVec<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut GrowVec<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T> IntoIterator for GrowVec<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        let this = ManuallyDrop::new(self);
        IntoIter {
            buf: this.ptr,
            cap: this.cap,
            start: 0,
            end: this.len,
            marker: PhantomData,
        }
    }
}

/// By-value iterator over a consumed [`GrowVec`].
pub struct IntoIter<T> {
    buf: NonNull<T>,
    cap: usize,
    start: usize,
    end: usize,
    marker: PhantomData<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        let value = unsafe { ptr::read(self.buf.as_ptr().add(self.start)) };
        self.start += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.end - self.start;
        (rest, Some(rest))
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> Drop for IntoIter<T> {
    fn drop(&mut self) {
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.buf.as_ptr().add(self.start),
                self.end - self.start,
            ));
            if self.cap != 0 {
                if let Ok(layout) = Layout::array::<T>(self.cap) {
                    alloc::dealloc(self.buf.as_ptr().cast(), layout);
                }
            }
        }
    }
}

#[inline]
fn layout_for<T>(n: usize) -> Result<Layout, ContainerError> {
    Layout::array::<T>(n).map_err(|_| ContainerError::CapacityOverflow)
}

#[cfg(test)]
mod vec_self {
    use super::*;
    use std::{cell::Cell, rc::Rc};

    fn filled(values: &[i32]) -> GrowVec<i32> {
        let mut vec = GrowVec::new();
        for &v in values {
            vec.push(v).unwrap();
        }
        vec
    }

    // Drops tick a shared counter so release paths are observable.
    #[derive(Clone)]
    struct Tracked {
        value: i32,
        drops: Rc<Cell<usize>>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    #[test]
    fn append_read_back() {
        let values: Vec<i32> = (0..100).collect();
        let vec = filled(&values);

        assert_eq!(vec.len(), 100);
        for (i, &v) in values.iter().enumerate() {
            assert_eq!(vec.get(i), Some(&v));
        }
        assert_eq!(vec.get(100), None);
    }

    #[test]
    fn capacity_invariant() {
        let mut vec = GrowVec::<i32>::new();
        assert_eq!(vec.capacity(), 0);

        let mut expected_cap = 0;
        for i in 0..33 {
            vec.push(i).unwrap();
            if vec.len() > expected_cap {
                expected_cap = if expected_cap == 0 { 1 } else { expected_cap * 2 };
            }
            assert!(vec.len() <= vec.capacity());
            assert_eq!(vec.capacity(), expected_cap);
        }

        vec.compact().unwrap();
        assert_eq!(vec.capacity(), 33);

        vec.clear();
        vec.compact().unwrap();
        assert_eq!(vec.capacity(), 0);
    }

    #[test]
    fn insert_preserves_order() {
        for i in 0..=4 {
            let mut vec = filled(&[10, 20, 30, 40]);
            vec.insert(i, 99).unwrap();

            let mut expected = vec![10, 20, 30, 40];
            expected.insert(i, 99);
            assert_eq!(vec.as_slice(), expected.as_slice());
        }
    }

    #[test]
    fn insert_fast_relocates_to_tail() {
        let mut vec = filled(&[10, 20, 30, 40]);
        vec.insert_fast(1, 99).unwrap();
        assert_eq!(vec.as_slice(), &[10, 99, 30, 40, 20]);

        // Appending through the fast path is a plain append.
        let mut vec = filled(&[10]);
        vec.insert_fast(1, 99).unwrap();
        assert_eq!(vec.as_slice(), &[10, 99]);
    }

    #[test]
    fn out_of_bounds_leaves_state() {
        let mut vec = filled(&[1, 2, 3]);

        assert_eq!(
            vec.insert(4, 9),
            Err(ContainerError::IndexOutOfBounds { index: 4, len: 3 })
        );
        assert_eq!(
            vec.remove_range(2, 2),
            Err(ContainerError::RangeOutOfBounds { start: 2, count: 2, len: 3 })
        );
        assert_eq!(
            vec.swap(0, 3),
            Err(ContainerError::IndexOutOfBounds { index: 3, len: 3 })
        );
        assert_eq!(vec.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn zero_sized_items_rejected() {
        let mut vec = GrowVec::<()>::new();
        assert_eq!(vec.push(()), Err(ContainerError::ZeroSizedItem));
        assert_eq!(vec.len(), 0);
        assert_eq!(vec.capacity(), 0);
    }

    #[test]
    fn remove_insert_inverse() {
        let original = [1, 2, 3, 4, 5, 6];
        let mut vec = filled(&original);

        let removed = vec.drain_range(2, 3).unwrap();
        assert_eq!(removed.as_slice(), &[3, 4, 5]);
        assert_eq!(vec.as_slice(), &[1, 2, 6]);

        for (offset, value) in removed.into_iter().enumerate() {
            vec.insert(2 + offset, value).unwrap();
        }
        assert_eq!(vec.as_slice(), &original);
    }

    #[test]
    fn remove_range_drops_elements() {
        let drops = Rc::new(Cell::new(0));
        let mut vec = GrowVec::new();
        for value in 0..5 {
            vec.push(Tracked { value, drops: Rc::clone(&drops) }).unwrap();
        }

        vec.remove_range(1, 3).unwrap();
        assert_eq!(drops.get(), 3);
        assert_eq!(vec.len(), 2);
        assert_eq!(vec[0].value, 0);
        assert_eq!(vec[1].value, 4);

        drop(vec);
        assert_eq!(drops.get(), 5);
    }

    #[test]
    fn drain_transfers_ownership_without_drop() {
        let drops = Rc::new(Cell::new(0));
        let mut vec = GrowVec::new();
        for value in 0..4 {
            vec.push(Tracked { value, drops: Rc::clone(&drops) }).unwrap();
        }

        let taken = vec.drain_range(0, 2).unwrap();
        assert_eq!(drops.get(), 0);
        assert_eq!(taken.len(), 2);

        drop(taken);
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn remove_range_fast_fills_from_tail() {
        // Tail longer than the gap: the last `count` elements move in.
        let mut vec = filled(&[1, 2, 3, 4, 5, 6]);
        vec.remove_range_fast(1, 2).unwrap();
        assert_eq!(vec.as_slice(), &[1, 5, 6, 4]);

        // Tail shorter than the gap: the tail shifts into place.
        let mut vec = filled(&[1, 2, 3, 4, 5]);
        vec.remove_range_fast(1, 3).unwrap();
        assert_eq!(vec.as_slice(), &[1, 5]);

        // Gap reaching the end: nothing to move.
        let mut vec = filled(&[1, 2, 3]);
        vec.remove_range_fast(1, 2).unwrap();
        assert_eq!(vec.as_slice(), &[1]);
    }

    #[test]
    fn sort_and_reverse() {
        let mut vec = filled(&[5, 1, 4, 2, 3]);
        vec.sort_by(|a, b| a.cmp(b));
        assert_eq!(vec.as_slice(), &[1, 2, 3, 4, 5]);

        vec.reverse();
        assert_eq!(vec.as_slice(), &[5, 4, 3, 2, 1]);

        let mut empty = GrowVec::<i32>::new();
        empty.reverse();
        assert!(empty.is_empty());
    }

    #[test]
    fn merge_appends_clones() {
        let mut a = filled(&[1, 2]);
        let b = filled(&[3, 4, 5]);

        a.merge(&b).unwrap();
        assert_eq!(a.as_slice(), &[1, 2, 3, 4, 5]);
        assert_eq!(b.as_slice(), &[3, 4, 5]);
    }

    #[test]
    fn duplicate_is_deep() {
        let mut vec = GrowVec::new();
        vec.push(String::from("alpha")).unwrap();
        vec.push(String::from("beta")).unwrap();

        let copy = vec.duplicate().unwrap();
        drop(vec);

        assert_eq!(copy.len(), 2);
        assert_eq!(copy[0], "alpha");
        assert_eq!(copy[1], "beta");
    }

    #[test]
    fn reserve_pow2_rounds_up() {
        let mut vec = GrowVec::<i32>::new();
        vec.reserve_pow2(0).unwrap();
        assert_eq!(vec.capacity(), 0);

        vec.reserve_pow2(5).unwrap();
        assert_eq!(vec.capacity(), 8);

        // Never shrinks.
        vec.reserve_pow2(2).unwrap();
        assert_eq!(vec.capacity(), 8);
    }

    #[test]
    fn into_iter_drains_by_value() {
        let vec = filled(&[7, 8, 9]);
        let collected: Vec<i32> = vec.into_iter().collect();
        assert_eq!(collected, vec![7, 8, 9]);

        // A half-consumed iterator drops the rest.
        let drops = Rc::new(Cell::new(0));
        let mut vec = GrowVec::new();
        for value in 0..3 {
            vec.push(Tracked { value, drops: Rc::clone(&drops) }).unwrap();
        }
        let mut iter = vec.into_iter();
        let first = iter.next().unwrap();
        assert_eq!(first.value, 0);
        drop(iter);
        drop(first);
        assert_eq!(drops.get(), 3);
    }
}
