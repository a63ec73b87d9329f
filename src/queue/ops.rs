use core::marker::PhantomData;
use core::ptr::NonNull;

use super::{sort, Element, ElementBox, Queue};
use crate::harness::heap::Block;
use crate::sim::rng::SimRng;
use crate::stdx::display_buf::DisplayBuf;
use crate::stdx::list::{self, Link};
use crate::stdx::list_sort::list_sort;

/// Iterator over queue values, head to tail.
pub struct Values<'a> {
    head: NonNull<Link>,
    cur: NonNull<Link>,
    _queue: PhantomData<&'a Queue>,
}

impl<'a> Values<'a> {
    pub(super) fn new(q: &'a Queue) -> Self {
        Self {
            head: q.head,
            cur: q.head,
            _queue: PhantomData,
        }
    }
}

impl<'a> Iterator for Values<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        // SAFETY: the borrowed queue keeps every link alive and unchanged.
        unsafe {
            let next = list::next(self.cur);
            if next == self.head {
                return None;
            }
            self.cur = next;
            Some(Element::value_at(next))
        }
    }
}

impl Queue {
    // Value first, then the element, so a refused element allocation drops
    // the string again and nothing leaks.
    fn alloc_element(&self, s: &str) -> Option<NonNull<Link>> {
        let value = self.heap.alloc_str(s)?;
        let elem = self.heap.alloc(Element::new(value))?;
        Some(elem.into_raw().cast())
    }

    pub fn insert_head(&mut self, s: &str) -> bool {
        let Some(node) = self.alloc_element(s) else {
            return false;
        };
        // SAFETY: `node` is detached; the sentinel heads a live cycle.
        unsafe { list::link_after(node, self.head) };
        true
    }

    pub fn insert_tail(&mut self, s: &str) -> bool {
        let Some(node) = self.alloc_element(s) else {
            return false;
        };
        // SAFETY: as for `insert_head`.
        unsafe { list::link_before(node, self.head) };
        true
    }

    // Detach `node` and hand ownership to the caller.
    unsafe fn take(&mut self, node: NonNull<Link>, buf: Option<&mut DisplayBuf>) -> ElementBox {
        list::unlink(node);
        let elem = Block::from_raw(Element::from_link(node), &self.heap);
        if let Some(buf) = buf {
            buf.write_truncated(elem.value().as_bytes());
        }
        elem
    }

    pub fn remove_head(&mut self, buf: Option<&mut DisplayBuf>) -> Option<ElementBox> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: non-empty, so the forward neighbor is a linked element.
        unsafe {
            let node = list::next(self.head);
            Some(self.take(node, buf))
        }
    }

    pub fn remove_tail(&mut self, buf: Option<&mut DisplayBuf>) -> Option<ElementBox> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: as above, from the tail.
        unsafe {
            let node = list::prev(self.head);
            Some(self.take(node, buf))
        }
    }

    pub fn size(&self) -> usize {
        self.iter().count()
    }

    pub fn delete_mid(&mut self) -> bool {
        if self.is_empty() {
            return false;
        }
        // `fast` moves two hops per hop of `slow`; when it cannot, `slow` sits
        // at position ceil(n/2) - 1.
        // SAFETY: all links visited belong to this queue.
        unsafe {
            let mut slow = list::next(self.head);
            let mut fast = slow;
            loop {
                let one = list::next(fast);
                if one == self.head {
                    break;
                }
                let two = list::next(one);
                if two == self.head {
                    break;
                }
                slow = list::next(slow);
                fast = two;
            }
            drop(self.take(slow, None));
        }
        true
    }

    pub fn delete_dup(&mut self) -> bool {
        // SAFETY: nodes are only released after they are unlinked, and the
        // walk never revisits them.
        unsafe {
            let mut cur = list::next(self.head);
            while cur != self.head {
                let mut end = list::next(cur);
                let mut run = 1usize;
                while end != self.head && Element::value_at(end) == Element::value_at(cur) {
                    end = list::next(end);
                    run += 1;
                }
                if run > 1 {
                    let mut node = cur;
                    while node != end {
                        let next = list::next(node);
                        drop(self.take(node, None));
                        node = next;
                    }
                }
                cur = end;
            }
        }
        true
    }

    pub fn swap_pairs(&mut self) {
        // SAFETY: only values move; every visited link stays in place.
        unsafe {
            let mut a = list::next(self.head);
            while a != self.head {
                let b = list::next(a);
                if b == self.head {
                    break;
                }
                Element::swap_values(a, b);
                a = list::next(b);
            }
        }
    }

    pub fn reverse(&mut self) {
        // Flip both neighbors of every link, the sentinel included.
        // SAFETY: each link is rewritten only after both neighbors are read.
        unsafe {
            let mut cur = self.head;
            loop {
                let next = list::next(cur);
                let prev = list::prev(cur);
                let c = cur.as_ptr();
                (*c).next = Some(prev);
                (*c).prev = Some(next);
                cur = next;
                if cur == self.head {
                    break;
                }
            }
        }
    }

    /// Reference sort: recursive top-down merge sort.
    pub fn sort(&mut self) {
        // SAFETY: the queue owns the cycle headed by its sentinel.
        unsafe { sort::merge_sort(self.head) }
    }

    /// Alternate sort through the generic bottom-up list sort.
    pub fn list_sort(&mut self) {
        // SAFETY: as above; the comparator only reads values.
        unsafe {
            list_sort(self.head, |a, b| {
                Element::value_at(a).cmp(Element::value_at(b))
            })
        }
    }

    // Link at 0-based position `index`. Callers keep `index < size`.
    unsafe fn nth(&self, index: usize) -> NonNull<Link> {
        let mut cur = list::next(self.head);
        for _ in 0..index {
            cur = list::next(cur);
        }
        cur
    }

    /// Fisher-Yates from the tail: each position swaps with a uniformly chosen
    /// position at or before it. Positions are found by walking, so this is
    /// quadratic.
    pub fn shuffle(&mut self, rng: &mut SimRng) {
        let n = self.size();
        if n < 2 {
            return;
        }
        // SAFETY: all positions are below `n`.
        unsafe {
            let mut last = list::prev(self.head);
            for i in (1..n).rev() {
                let j = rng.below(i + 1);
                if j != i {
                    Element::swap_values(last, self.nth(j));
                }
                last = list::prev(last);
            }
        }
    }
}
