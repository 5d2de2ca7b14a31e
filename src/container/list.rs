//! Doubly-linked list with the array's positional contract.
//!
//! Nodes are individually heap-allocated and own their element inline, so
//! one node is exactly one allocation. Lookup by index is a linear walk from
//! the head; the list earns its keep on head/tail-heavy workloads where the
//! array would shift in bulk.

use crate::{container::vec::GrowVec, errors::ContainerError};
use std::{
    alloc::{self, Layout},
    cmp::Ordering,
    fmt,
    marker::PhantomData,
    mem, ptr,
    ptr::NonNull,
};

struct Node<T> {
    prev: Option<NonNull<Node<T>>>,
    next: Option<NonNull<Node<T>>>,
    data: T,
}

/// Node-based, order-aware storage mirroring [`GrowVec`]'s operations.
///
/// `len()` always equals the number of nodes reachable head to tail, and
/// head/tail are both absent exactly when the list is empty.
pub struct DoublyList<T> {
    head: Option<NonNull<Node<T>>>,
    tail: Option<NonNull<Node<T>>>,
    len: usize,
    marker: PhantomData<Box<Node<T>>>,
}

unsafe impl<T: Send> Send for DoublyList<T> {}
unsafe impl<T: Sync> Sync for DoublyList<T> {}

impl<T> DoublyList<T> {
    /// Creates an empty list. Does not allocate.
    pub const fn new() -> Self {
        DoublyList {
            head: None,
            tail: None,
            len: 0,
            marker: PhantomData,
        }
    }

    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.head.map(|node| unsafe { &node.as_ref().data })
    }

    #[inline]
    pub fn back(&self) -> Option<&T> {
        self.tail.map(|node| unsafe { &node.as_ref().data })
    }

    /// Element at `index`, walking from the head. O(index).
    pub fn get(&self, index: usize) -> Option<&T> {
        self.node_at(index).map(|node| unsafe { &node.as_ref().data })
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.node_at(index)
            .map(|mut node| unsafe { &mut node.as_mut().data })
    }

    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            next: self.head,
            rest: self.len,
            marker: PhantomData,
        }
    }

    #[inline(always)]
    fn check_item_size() -> Result<(), ContainerError> {
        if mem::size_of::<T>() == 0 {
            log::error!("zero-sized element type.");
            return Err(ContainerError::ZeroSizedItem);
        }
        Ok(())
    }

    // Linear traversal from head. The dominant cost driver of every
    // positional operation here.
    fn node_at(&self, index: usize) -> Option<NonNull<Node<T>>> {
        if index >= self.len {
            return None;
        }
        let mut node = self.head;
        for _ in 0..index {
            node = unsafe { node?.as_ref().next };
        }
        node
    }

    // Nodes are allocated by hand so an allocator refusal surfaces as an
    // error instead of a process abort.
    fn alloc_node(data: T) -> Result<NonNull<Node<T>>, ContainerError> {
        let layout = Layout::new::<Node<T>>();
        let raw = unsafe { alloc::alloc(layout) }.cast::<Node<T>>();
        let Some(node) = NonNull::new(raw) else {
            log::error!("node allocation failed.");
            return Err(ContainerError::AllocFailed);
        };
        unsafe {
            ptr::write(
                node.as_ptr(),
                Node {
                    prev: None,
                    next: None,
                    data,
                },
            );
        }
        Ok(node)
    }

    // Reads the element out and frees the node allocation.
    fn free_node(node: NonNull<Node<T>>) -> T {
        let layout = Layout::new::<Node<T>>();
        unsafe {
            let inner = ptr::read(node.as_ptr());
            alloc::dealloc(node.as_ptr().cast(), layout);
            inner.data
        }
    }

    #[inline]
    pub fn push_front(&mut self, value: T) -> Result<(), ContainerError> {
        self.insert(0, value)
    }

    #[inline]
    pub fn push_back(&mut self, value: T) -> Result<(), ContainerError> {
        self.insert(self.len, value)
    }

    /// Inserts `value` at `index`. `index == len` appends a new tail node;
    /// `index < len` links a new node immediately before the node currently
    /// at `index`.
    pub fn insert(&mut self, index: usize, value: T) -> Result<(), ContainerError> {
        Self::check_item_size()?;
        if index > self.len {
            log::error!("insert index {} out of bounds (len {}).", index, self.len);
            return Err(ContainerError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }

        let mut new_node = Self::alloc_node(value)?;

        if index == self.len {
            // New tail (also the head when the list was empty).
            unsafe {
                new_node.as_mut().prev = self.tail;
                match self.tail {
                    Some(mut old_tail) => old_tail.as_mut().next = Some(new_node),
                    None => self.head = Some(new_node),
                }
            }
            self.tail = Some(new_node);
        } else {
            // Link before the node currently at `index`.
            let mut at = match self.node_at(index) {
                Some(node) => node,
                None => {
                    // Unreachable given the bounds check; keep the node from
                    // leaking rather than trusting it.
                    drop(Self::free_node(new_node));
                    return Err(ContainerError::IndexOutOfBounds {
                        index,
                        len: self.len,
                    });
                }
            };
            unsafe {
                let prev = at.as_ref().prev;
                new_node.as_mut().prev = prev;
                new_node.as_mut().next = Some(at);
                at.as_mut().prev = Some(new_node);
                match prev {
                    Some(mut prev) => prev.as_mut().next = Some(new_node),
                    None => self.head = Some(new_node),
                }
            }
        }

        self.len += 1;
        Ok(())
    }

    #[inline]
    fn check_range(&self, start: usize, count: usize) -> Result<(), ContainerError> {
        match start.checked_add(count) {
            Some(end) if end <= self.len => Ok(()),
            _ => {
                log::error!("range {}+{} out of bounds (len {}).", start, count, self.len);
                Err(ContainerError::RangeOutOfBounds {
                    start,
                    count,
                    len: self.len,
                })
            }
        }
    }

    // Unlinks `count` nodes starting at `start` and hands each element to
    // `sink`. Shared spine of remove_range/drain_range.
    fn unlink_range<F>(&mut self, start: usize, count: usize, mut sink: F)
    where
        F: FnMut(T),
    {
        let Some(first) = self.node_at(start) else {
            return; // count == 0 past the tail position
        };

        let before = unsafe { first.as_ref().prev };
        let mut node = Some(first);
        for _ in 0..count {
            let Some(current) = node else { break };
            node = unsafe { current.as_ref().next };
            sink(Self::free_node(current));
            self.len -= 1;
        }

        // Relink the survivors around the hole.
        match before {
            Some(mut before) => unsafe { before.as_mut().next = node },
            None => self.head = node,
        }
        match node {
            Some(mut after) => unsafe { after.as_mut().prev = before },
            None => self.tail = before,
        }
    }

    /// Removes `count` elements starting at `start`, dropping each and
    /// freeing each node.
    pub fn remove_range(&mut self, start: usize, count: usize) -> Result<(), ContainerError> {
        Self::check_item_size()?;
        self.check_range(start, count)?;
        if count == 0 {
            return Ok(());
        }
        self.unlink_range(start, count, drop);
        Ok(())
    }

    /// Moves `count` elements starting at `start` out into a contiguous
    /// array. Ownership transfers; only the nodes are freed.
    pub fn drain_range(&mut self, start: usize, count: usize) -> Result<GrowVec<T>, ContainerError> {
        Self::check_item_size()?;
        self.check_range(start, count)?;

        let mut out = GrowVec::with_capacity(count)?;
        self.unlink_range(start, count, |value| {
            // Capacity is reserved up front, the push cannot fail.
            let _ = out.push(value);
        });
        Ok(out)
    }

    /// Drops every element and frees every node.
    pub fn clear(&mut self) {
        self.unlink_range(0, self.len, drop);
    }

    /// Sorts by draining everything into a contiguous buffer, sorting that
    /// with the array's sort, and re-appending. Trades temporary memory for
    /// not reimplementing a sort over links.
    pub fn sort_by<F>(&mut self, compare: F) -> Result<(), ContainerError>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut buf = self.drain_range(0, self.len)?;
        buf.sort_by(compare);
        for value in buf {
            self.push_back(value)?;
        }
        Ok(())
    }

    /// Exchanges the payloads of the nodes at `a` and `b` in place.
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
        if a == b {
            return Ok(());
        }

        // Both lookups succeed after the bounds check; the fallback swap of
        // a node with itself is a no-op.
        let Some(mut na) = self.node_at(a) else { return Ok(()) };
        let Some(mut nb) = self.node_at(b) else { return Ok(()) };
        unsafe { mem::swap(&mut na.as_mut().data, &mut nb.as_mut().data) };
        Ok(())
    }

    /// Reverses element order with len/2 pairwise payload swaps, walking
    /// inward from both ends.
    pub fn reverse(&mut self) {
        let mut front = self.head;
        let mut back = self.tail;
        let mut rest = self.len / 2;

        while rest > 0 {
            rest -= 1;
            let (Some(mut a), Some(mut b)) = (front, back) else { break };
            unsafe {
                mem::swap(&mut a.as_mut().data, &mut b.as_mut().data);
                front = a.as_ref().next;
                back = b.as_ref().prev;
            }
        }
    }
}

impl<T: Clone> DoublyList<T> {
    /// Appends a clone of every element of `other`.
    pub fn merge(&mut self, other: &Self) -> Result<(), ContainerError> {
        for value in other.iter() {
            self.push_back(value.clone())?;
        }
        Ok(())
    }

    /// Deep copy of the whole list. Fallible for the same reason as
    /// [`GrowVec::duplicate`].
    pub fn duplicate(&self) -> Result<Self, ContainerError> {
        let mut copy = Self::new();
        copy.merge(self)?;
        Ok(copy)
    }
}

impl<T> Drop for DoublyList<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T> Default for DoublyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for DoublyList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for DoublyList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}
impl<T: Eq> Eq for DoublyList<T> {}

impl<'a, T> IntoIterator for &'a DoublyList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Forward iterator over list elements.
pub struct Iter<'a, T> {
    next: Option<NonNull<Node<T>>>,
    rest: usize,
    marker: PhantomData<&'a Node<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node = self.next?;
        unsafe {
            self.next = node.as_ref().next;
            self.rest -= 1;
            Some(&node.as_ref().data)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.rest, Some(self.rest))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

#[cfg(test)]
mod list_self {
    use super::*;
    use std::{cell::Cell, rc::Rc};

    fn filled(values: &[i32]) -> DoublyList<i32> {
        let mut list = DoublyList::new();
        for &v in values {
            list.push_back(v).unwrap();
        }
        list
    }

    fn linearized(list: &DoublyList<i32>) -> Vec<i32> {
        list.iter().copied().collect()
    }

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
    fn push_and_read_back() {
        let list = filled(&[1, 2, 3, 4]);

        assert_eq!(list.len(), 4);
        assert_eq!(list.front(), Some(&1));
        assert_eq!(list.back(), Some(&4));
        for i in 0..4 {
            assert_eq!(list.get(i), Some(&(i as i32 + 1)));
        }
        assert_eq!(list.get(4), None);
    }

    #[test]
    fn insert_positions() {
        let mut list = filled(&[2, 4]);

        list.push_front(1).unwrap();
        list.insert(2, 3).unwrap();
        list.insert(4, 5).unwrap();
        assert_eq!(linearized(&list), vec![1, 2, 3, 4, 5]);
        assert_eq!(list.front(), Some(&1));
        assert_eq!(list.back(), Some(&5));

        assert_eq!(
            list.insert(6, 9),
            Err(ContainerError::IndexOutOfBounds { index: 6, len: 5 })
        );
        assert_eq!(linearized(&list), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn remove_range_relinks() {
        let mut list = filled(&[1, 2, 3, 4, 5]);

        list.remove_range(1, 3).unwrap();
        assert_eq!(linearized(&list), vec![1, 5]);
        assert_eq!(list.front(), Some(&1));
        assert_eq!(list.back(), Some(&5));

        // Head removal moves the head, tail removal moves the tail.
        list.remove_range(0, 1).unwrap();
        assert_eq!(list.front(), Some(&5));
        list.remove_range(0, 1).unwrap();
        assert!(list.is_empty());
        assert_eq!(list.front(), None);
        assert_eq!(list.back(), None);
    }

    #[test]
    fn remove_range_drops_elements() {
        let drops = Rc::new(Cell::new(0));
        let mut list = DoublyList::new();
        for value in 0..4 {
            list.push_back(Tracked { value, drops: Rc::clone(&drops) }).unwrap();
        }

        list.remove_range(1, 2).unwrap();
        assert_eq!(drops.get(), 2);

        drop(list);
        assert_eq!(drops.get(), 4);
    }

    #[test]
    fn drain_moves_into_contiguous_buffer() {
        let drops = Rc::new(Cell::new(0));
        let mut list = DoublyList::new();
        for value in 0..5 {
            list.push_back(Tracked { value, drops: Rc::clone(&drops) }).unwrap();
        }

        let buf = list.drain_range(1, 3).unwrap();
        assert_eq!(drops.get(), 0);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf[0].value, 1);
        assert_eq!(buf[2].value, 3);
        assert_eq!(list.len(), 2);

        drop(buf);
        assert_eq!(drops.get(), 3);
    }

    #[test]
    fn sort_matches_vec_sort() {
        let values = [5, 1, 9, 1, 4, 8, 2];

        let mut list = filled(&values);
        list.sort_by(|a, b| a.cmp(b)).unwrap();

        let mut vec = GrowVec::new();
        for &v in &values {
            vec.push(v).unwrap();
        }
        vec.sort_by(|a, b| a.cmp(b));

        assert_eq!(linearized(&list), vec.as_slice().to_vec());
    }

    #[test]
    fn swap_and_reverse() {
        let mut list = filled(&[1, 2, 3, 4]);

        list.swap(0, 3).unwrap();
        assert_eq!(linearized(&list), vec![4, 2, 3, 1]);
        assert_eq!(
            list.swap(0, 4),
            Err(ContainerError::IndexOutOfBounds { index: 4, len: 4 })
        );

        let mut list = filled(&[1, 2, 3, 4, 5]);
        list.reverse();
        assert_eq!(linearized(&list), vec![5, 4, 3, 2, 1]);

        let mut single = filled(&[1]);
        single.reverse();
        assert_eq!(linearized(&single), vec![1]);
    }

    #[test]
    fn merge_appends_clones() {
        let mut a = filled(&[1, 2]);
        let b = filled(&[3, 4]);

        a.merge(&b).unwrap();
        assert_eq!(linearized(&a), vec![1, 2, 3, 4]);
        assert_eq!(linearized(&b), vec![3, 4]);
    }

    #[test]
    fn duplicate_is_deep() {
        let mut list = DoublyList::new();
        list.push_back(String::from("alpha")).unwrap();
        list.push_back(String::from("beta")).unwrap();

        let copy = list.duplicate().unwrap();
        drop(list);

        assert_eq!(copy.get(0).map(String::as_str), Some("alpha"));
        assert_eq!(copy.get(1).map(String::as_str), Some("beta"));
    }

    #[test]
    fn zero_sized_items_rejected() {
        let mut list = DoublyList::<()>::new();
        assert_eq!(list.push_back(()), Err(ContainerError::ZeroSizedItem));
        assert_eq!(list.len(), 0);
    }
}
