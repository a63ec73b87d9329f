//! Recursive top-down merge sort, the queue's reference sort.
//!
//! The cycle is opened into a null-terminated `next` chain, sorted by
//! midpoint splitting, and closed again once at the end, which is also the
//! only pass that rewrites `prev` links. Recursion depth is ⌈log2 n⌉.

use core::ptr::{addr_of_mut, NonNull};

use super::Element;
use crate::harness::exception;
use crate::stdx::list::{self, Link};

type Slot = Option<NonNull<Link>>;

#[inline]
unsafe fn next_of(node: NonNull<Link>) -> Slot {
    (*node.as_ptr()).next
}

/// Sort the element list headed by `head` ascending by value.
///
/// # Safety
/// `head` must be the sentinel of a well-formed list of `Element`s.
pub unsafe fn merge_sort(head: NonNull<Link>) {
    if list::is_empty(head) || list::is_singular(head) {
        return;
    }
    let first = list::next(head);
    let last = list::prev(head);
    (*last.as_ptr()).next = None;

    let sorted = sort_chain(first);

    // Rebuild backward links and close the cycle.
    let mut tail = head;
    let mut cur = Some(sorted);
    while let Some(node) = cur {
        exception::poll();
        (*tail.as_ptr()).next = Some(node);
        (*node.as_ptr()).prev = Some(tail);
        tail = node;
        cur = next_of(node);
    }
    (*tail.as_ptr()).next = Some(head);
    (*head.as_ptr()).prev = Some(tail);
}

unsafe fn sort_chain(first: NonNull<Link>) -> NonNull<Link> {
    if next_of(first).is_none() {
        return first;
    }

    // `fast` runs two hops ahead, so `slow` stops at the end of the left half.
    let mut slow = first;
    let mut fast = next_of(first);
    while let Some(f) = fast {
        let Some(f2) = next_of(f) else {
            break;
        };
        exception::poll();
        slow = match next_of(slow) {
            Some(s) => s,
            None => exception::illegal_access("sort split followed a null link"),
        };
        fast = next_of(f2);
    }

    let right = match next_of(slow) {
        Some(r) => r,
        None => exception::illegal_access("sort split produced an empty half"),
    };
    (*slow.as_ptr()).next = None;

    let left = sort_chain(first);
    let right = sort_chain(right);
    merge(left, right)
}

// Ties take from the left run, which holds the earlier input.
unsafe fn merge(a: NonNull<Link>, b: NonNull<Link>) -> NonNull<Link> {
    let mut head: Slot = None;
    let mut tail: *mut Slot = &mut head;
    let mut left = Some(a);
    let mut right = Some(b);

    while let (Some(l), Some(r)) = (left, right) {
        exception::poll();
        if Element::value_at(l) <= Element::value_at(r) {
            *tail = Some(l);
            tail = addr_of_mut!((*l.as_ptr()).next);
            left = next_of(l);
        } else {
            *tail = Some(r);
            tail = addr_of_mut!((*r.as_ptr()).next);
            right = next_of(r);
        }
    }
    // Exactly one run can remain.
    *tail = left.or(right);

    match head {
        Some(h) => h,
        None => exception::illegal_access("merge of two empty runs"),
    }
}
