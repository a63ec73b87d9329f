//! String queue on an intrusive circular doubly-linked list.
//!
//! A [`Queue`] owns a heap-allocated sentinel [`Link`]; every [`Element`]
//! embeds its own link and owns a private copy of its string. Both the
//! sentinel and the elements come from a tracked [`Heap`], so the harness can
//! tell when a queue was not fully released.
//!
//! # Engine seam
//!
//! [`QueueEngine`] is the interface the harness drives. Every operation takes
//! the queue as `Option`, because the harness also probes the absent-queue
//! case. The provided methods are the reference behavior; [`LinkedEngine`]
//! uses them unchanged. An alternative engine overrides only what it
//! replaces.
//!
//! # Ownership
//!
//! Linked elements are owned by the list. Removing an element hands an
//! [`ElementBox`] back to the caller, who decides when to release it.

mod ops;
pub mod sort;

use core::ptr::NonNull;

use crate::harness::heap::{Block, Heap};
use crate::sim::rng::SimRng;
use crate::stdx::display_buf::DisplayBuf;
use crate::stdx::list::{self, Link};

pub use ops::Values;

/// One queue entry. The link is the first field, so a link handle and the
/// element it belongs to share an address.
#[repr(C)]
pub struct Element {
    link: Link,
    value: Block<str>,
}

const _: () = assert!(core::mem::offset_of!(Element, link) == 0);

impl Element {
    pub fn new(value: Block<str>) -> Self {
        Self {
            link: Link::new(),
            value,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// The block holding the string, for aliasing checks.
    pub fn value_block(&self) -> &Block<str> {
        &self.value
    }

    pub fn link(&self) -> &Link {
        &self.link
    }

    /// Element that embeds `link`.
    ///
    /// # Safety
    /// `link` must be the link of a live `Element`, not a sentinel.
    #[inline]
    pub unsafe fn from_link(link: NonNull<Link>) -> NonNull<Element> {
        link.cast()
    }

    /// # Safety
    /// As for [`Element::from_link`], and the element must not be mutated
    /// while the reference is alive.
    #[inline]
    pub unsafe fn value_at<'a>(link: NonNull<Link>) -> &'a str {
        let elem: &'a Element = &*Self::from_link(link).as_ptr();
        &elem.value
    }

    /// Exchange the strings of two elements; their links stay put.
    ///
    /// # Safety
    /// Both links must belong to live elements.
    #[inline]
    pub unsafe fn swap_values(a: NonNull<Link>, b: NonNull<Link>) {
        if a == b {
            return;
        }
        let a = Self::from_link(a).as_ptr();
        let b = Self::from_link(b).as_ptr();
        core::ptr::swap(
            core::ptr::addr_of_mut!((*a).value),
            core::ptr::addr_of_mut!((*b).value),
        );
    }
}

/// A removed element, owned by the caller. Dropping it releases both the
/// element and its string.
pub type ElementBox = Block<Element>;

/// A circular list of elements headed by a sentinel.
pub struct Queue {
    head: NonNull<Link>,
    heap: Heap,
}

impl Queue {
    /// Allocate an empty queue, or `None` if the heap refuses.
    pub fn new(heap: &Heap) -> Option<Queue> {
        let head = heap.alloc(Link::new())?.into_raw();
        // SAFETY: freshly allocated and not yet part of any cycle.
        unsafe { list::init(head) };
        Some(Queue {
            head,
            heap: heap.clone(),
        })
    }

    /// The sentinel link.
    pub fn sentinel(&self) -> NonNull<Link> {
        self.head
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn is_empty(&self) -> bool {
        // SAFETY: the sentinel is live for the queue's lifetime.
        unsafe { list::is_empty(self.head) }
    }

    pub fn is_singular(&self) -> bool {
        // SAFETY: as above.
        unsafe { list::is_singular(self.head) }
    }

    /// Values from head to tail.
    pub fn iter(&self) -> Values<'_> {
        Values::new(self)
    }

    pub fn front(&self) -> Option<&str> {
        self.iter().next()
    }

    pub fn back(&self) -> Option<&str> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: non-empty, so the backward neighbor is an element.
        unsafe { Some(Element::value_at(list::prev(self.head))) }
    }
}

impl Drop for Queue {
    fn drop(&mut self) {
        // A queue abandoned by a fault is in an unknown state; leak it.
        if std::thread::panicking() {
            return;
        }
        // SAFETY: the queue owns its sentinel and every linked element.
        unsafe {
            if self.heap.cautious() {
                if let Err(err) = list::check_cycle(self.head, self.heap.outstanding()) {
                    self.heap
                        .record_error(crate::harness::HeapError::CorruptedList(err));
                    return;
                }
            }
            let mut cur = list::next(self.head);
            while cur != self.head {
                let next = list::next(cur);
                drop(Block::from_raw(Element::from_link(cur), &self.heap));
                cur = next;
            }
            drop(Block::from_raw(self.head, &self.heap));
        }
    }
}

/// The operations the harness exercises.
pub trait QueueEngine {
    /// Create an empty queue.
    fn new_queue(&mut self, heap: &Heap) -> Option<Queue> {
        Queue::new(heap)
    }

    /// Release the queue and everything in it.
    fn free(&mut self, q: Option<Queue>) {
        drop(q);
    }

    /// Insert a private copy of `s` at the head.
    fn insert_head(&mut self, q: Option<&mut Queue>, s: &str) -> bool {
        q.is_some_and(|q| q.insert_head(s))
    }

    /// Insert a private copy of `s` at the tail.
    fn insert_tail(&mut self, q: Option<&mut Queue>, s: &str) -> bool {
        q.is_some_and(|q| q.insert_tail(s))
    }

    /// Unlink the head element, copying its value into `buf` when given.
    fn remove_head(
        &mut self,
        q: Option<&mut Queue>,
        buf: Option<&mut DisplayBuf>,
    ) -> Option<ElementBox> {
        q.and_then(|q| q.remove_head(buf))
    }

    /// Unlink the tail element, copying its value into `buf` when given.
    fn remove_tail(
        &mut self,
        q: Option<&mut Queue>,
        buf: Option<&mut DisplayBuf>,
    ) -> Option<ElementBox> {
        q.and_then(|q| q.remove_tail(buf))
    }

    /// Number of elements, counted by traversal.
    fn size(&mut self, q: Option<&Queue>) -> usize {
        q.map_or(0, Queue::size)
    }

    /// Delete the element at 0-based position ⌈n/2⌉ − 1.
    fn delete_mid(&mut self, q: Option<&mut Queue>) -> bool {
        q.is_some_and(Queue::delete_mid)
    }

    /// On a sorted queue, delete every value that occurs more than once.
    fn delete_dup(&mut self, q: Option<&mut Queue>) -> bool {
        q.is_some_and(Queue::delete_dup)
    }

    /// Exchange the values of each adjacent pair.
    fn swap(&mut self, q: Option<&mut Queue>) {
        if let Some(q) = q {
            q.swap_pairs();
        }
    }

    fn reverse(&mut self, q: Option<&mut Queue>) {
        if let Some(q) = q {
            q.reverse();
        }
    }

    /// Stable ascending sort by byte order.
    fn sort(&mut self, q: Option<&mut Queue>) {
        if let Some(q) = q {
            q.sort();
        }
    }

    /// Uniformly permute the values.
    fn shuffle(&mut self, q: Option<&mut Queue>, rng: &mut SimRng) {
        if let Some(q) = q {
            q.shuffle(rng);
        }
    }
}

/// Reference engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinkedEngine;

impl QueueEngine for LinkedEngine {}
