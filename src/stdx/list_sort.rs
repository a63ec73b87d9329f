//! Stable bottom-up merge sort over an intrusive circular list.
//!
//! The sort needs no allocation and only O(log n) pointers of state. Input
//! nodes are consumed one at a time onto a stack of pending sorted runs whose
//! sizes are powers of two. Runs are chained newest-first through their `prev`
//! links while `next` links inside a run form a null-terminated chain.
//!
//! # Merge schedule
//!
//! With `count` nodes consumed so far, each set bit of `count` corresponds to
//! one pending run of that size. Before the next node is pushed, the lowest
//! clear bit above the trailing ones of `count` selects the two runs of equal
//! size that are merged. Merges therefore stay balanced (never worse than 2:1)
//! and a run of a given size is merged only once at least as many nodes have
//! arrived behind it, which keeps the total work at O(n log n) comparisons.
//!
//! When the input is exhausted, the pending runs are merged smallest to
//! largest. The last merge restores `prev` links and closes the cycle.
//!
//! # Stability
//!
//! Whenever the comparator reports `a` and `b` equal, the node that appeared
//! earlier in the input is taken first.

use core::cmp::Ordering;
use core::ptr::{addr_of_mut, NonNull};

use super::list::Link;
use crate::harness::exception;

type Slot = Option<NonNull<Link>>;

#[inline]
fn expect_link(link: Slot) -> NonNull<Link> {
    match link {
        Some(l) => l,
        None => exception::illegal_access("list sort followed a null link"),
    }
}

// Merge two null-terminated runs. `a` holds the earlier input.
unsafe fn merge<F>(cmp: &mut F, mut a: NonNull<Link>, mut b: NonNull<Link>) -> NonNull<Link>
where
    F: FnMut(NonNull<Link>, NonNull<Link>) -> Ordering,
{
    let mut head: Slot = None;
    let mut tail: *mut Slot = &mut head;

    loop {
        exception::poll();
        if cmp(a, b) != Ordering::Greater {
            *tail = Some(a);
            tail = addr_of_mut!((*a.as_ptr()).next);
            match *tail {
                Some(n) => a = n,
                None => {
                    *tail = Some(b);
                    break;
                }
            }
        } else {
            *tail = Some(b);
            tail = addr_of_mut!((*b.as_ptr()).next);
            match *tail {
                Some(n) => b = n,
                None => {
                    *tail = Some(a);
                    break;
                }
            }
        }
    }
    expect_link(head)
}

// Final merge: rebuilds `prev` links and re-closes the cycle around `head`.
unsafe fn merge_final<F>(cmp: &mut F, head: NonNull<Link>, mut a: NonNull<Link>, mut b: NonNull<Link>)
where
    F: FnMut(NonNull<Link>, NonNull<Link>) -> Ordering,
{
    let mut tail = head;

    let mut rest = loop {
        exception::poll();
        if cmp(a, b) != Ordering::Greater {
            (*tail.as_ptr()).next = Some(a);
            (*a.as_ptr()).prev = Some(tail);
            tail = a;
            match (*a.as_ptr()).next {
                Some(n) => a = n,
                None => break b,
            }
        } else {
            (*tail.as_ptr()).next = Some(b);
            (*b.as_ptr()).prev = Some(tail);
            tail = b;
            match (*b.as_ptr()).next {
                Some(n) => b = n,
                None => break a,
            }
        }
    };

    // Splice the remainder, fixing `prev` as we go. A long, already sorted
    // remainder still hands control to the comparator every 256 nodes.
    let mut stride: u8 = 0;
    loop {
        stride = stride.wrapping_add(1);
        if stride == 0 {
            cmp(rest, rest);
        }
        exception::poll();
        (*tail.as_ptr()).next = Some(rest);
        (*rest.as_ptr()).prev = Some(tail);
        tail = rest;
        match (*rest.as_ptr()).next {
            Some(n) => rest = n,
            None => break,
        }
    }

    (*tail.as_ptr()).next = Some(head);
    (*head.as_ptr()).prev = Some(tail);
}

/// Sort the list headed by `head` in place, stably, using `cmp`.
///
/// `cmp(a, b)` receives two payload links; `Greater` means `a` sorts after
/// `b`. Any other result keeps `a` first.
///
/// # Safety
/// `head` must be the sentinel of a well-formed list and every payload link
/// must stay valid for the duration of the call. `cmp` must not modify links.
pub unsafe fn list_sort<F>(head: NonNull<Link>, mut cmp: F)
where
    F: FnMut(NonNull<Link>, NonNull<Link>) -> Ordering,
{
    let h = head.as_ptr();
    let first = expect_link((*h).next);
    let last = expect_link((*h).prev);
    // Zero or one element.
    if first == last {
        return;
    }

    // Break the cycle: the input becomes a null-terminated `next` chain.
    (*last.as_ptr()).next = None;

    let mut list: Slot = Some(first);
    let mut pending: Slot = None;
    let mut count: usize = 0;

    loop {
        let mut tail: *mut Slot = &mut pending;
        let mut bits = count;

        // Skip runs that have no partner of equal size yet.
        while bits & 1 != 0 {
            tail = addr_of_mut!((*expect_link(*tail).as_ptr()).prev);
            bits >>= 1;
        }

        // Merge the two runs at this position.
        if bits != 0 {
            let a = expect_link(*tail);
            let b = expect_link((*a.as_ptr()).prev);
            let merged = merge(&mut cmp, b, a);
            (*merged.as_ptr()).prev = (*b.as_ptr()).prev;
            *tail = Some(merged);
        }

        // Push one node as a run of length one.
        let node = expect_link(list);
        (*node.as_ptr()).prev = pending;
        pending = Some(node);
        list = (*node.as_ptr()).next;
        (*node.as_ptr()).next = None;
        count += 1;

        if list.is_none() {
            break;
        }
    }

    // Merge all pending runs, smallest first.
    let mut merged = expect_link(pending);
    let mut run = expect_link((*merged.as_ptr()).prev);
    loop {
        let Some(older) = (*run.as_ptr()).prev else {
            break;
        };
        merged = merge(&mut cmp, run, merged);
        run = older;
    }

    merge_final(&mut cmp, head, run, merged);
}
