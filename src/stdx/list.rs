//! Intrusive circular doubly-linked list primitive.
//!
//! A list is a sentinel [`Link`] whose neighbors point back at itself when the
//! list is empty. Payload nodes embed a `Link` and are threaded into the cycle.
//! Nothing here allocates or knows about payloads; every operation is an O(1)
//! rewiring of neighbor pointers.
//!
//! # Safety
//!
//! This is an intrusive data structure over raw pointers. Callers must ensure:
//! - Links are not moved while they are threaded into a cycle
//! - Links outlive every cycle they are threaded into
//! - The handles passed in belong to a live, well-formed list
//!
//! A `None` neighbor only exists transiently (inside a sort, or after
//! [`unlink`]) or on a corrupted list. [`next`] and [`prev`] treat following it
//! as an illegal access and trap to the enclosing protected region, the way a
//! null dereference would fault.

use core::marker::PhantomPinned;
use core::ptr::NonNull;

use crate::harness::exception;

/// Forward/backward neighbor pair embedded in every list node.
///
/// The sentinel of a list is a bare `Link`; payload nodes place a `Link` as
/// their first field so a link handle can be cast back to the node.
#[repr(C)]
#[derive(Debug)]
pub struct Link {
    pub(crate) next: Option<NonNull<Link>>,
    pub(crate) prev: Option<NonNull<Link>>,
    _pin: PhantomPinned,
}

impl Link {
    /// A link that belongs to no cycle.
    pub const fn new() -> Self {
        Self {
            next: None,
            prev: None,
            _pin: PhantomPinned,
        }
    }

    /// Returns `true` if neither neighbor is set.
    #[inline]
    pub fn is_detached(&self) -> bool {
        self.next.is_none() && self.prev.is_none()
    }

    /// Overwrite the forward neighbor. The cycle is not kept consistent.
    #[inline]
    pub fn set_next(&mut self, next: Option<NonNull<Link>>) {
        self.next = next;
    }

    /// Overwrite the backward neighbor. The cycle is not kept consistent.
    #[inline]
    pub fn set_prev(&mut self, prev: Option<NonNull<Link>>) {
        self.prev = prev;
    }
}

impl Default for Link {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn `head` into an empty list: both neighbors point at itself.
///
/// # Safety
/// `head` must be valid for writes and must not be threaded into another cycle.
#[inline]
pub unsafe fn init(head: NonNull<Link>) {
    let h = head.as_ptr();
    (*h).next = Some(head);
    (*h).prev = Some(head);
}

/// Forward neighbor of `node`. Traps on a null link.
///
/// # Safety
/// `node` must be a valid link.
#[inline]
pub unsafe fn next(node: NonNull<Link>) -> NonNull<Link> {
    exception::poll();
    match (*node.as_ptr()).next {
        Some(n) => n,
        None => exception::illegal_access("followed a null next link"),
    }
}

/// Backward neighbor of `node`. Traps on a null link.
///
/// # Safety
/// `node` must be a valid link.
#[inline]
pub unsafe fn prev(node: NonNull<Link>) -> NonNull<Link> {
    exception::poll();
    match (*node.as_ptr()).prev {
        Some(p) => p,
        None => exception::illegal_access("followed a null prev link"),
    }
}

// Thread `node` between two adjacent links.
#[inline]
unsafe fn link_between(node: NonNull<Link>, before: NonNull<Link>, after: NonNull<Link>) {
    let n = node.as_ptr();
    (*n).next = Some(after);
    (*n).prev = Some(before);
    (*before.as_ptr()).next = Some(node);
    (*after.as_ptr()).prev = Some(node);
}

/// Insert `node` directly after `at` (at the head when `at` is the sentinel).
///
/// # Safety
/// `at` must be threaded into a well-formed cycle; `node` must be detached.
#[inline]
pub unsafe fn link_after(node: NonNull<Link>, at: NonNull<Link>) {
    debug_assert!((*node.as_ptr()).is_detached(), "linking an attached node");
    let after = next(at);
    link_between(node, at, after);
}

/// Insert `node` directly before `at` (at the tail when `at` is the sentinel).
///
/// # Safety
/// `at` must be threaded into a well-formed cycle; `node` must be detached.
#[inline]
pub unsafe fn link_before(node: NonNull<Link>, at: NonNull<Link>) {
    debug_assert!((*node.as_ptr()).is_detached(), "linking an attached node");
    let before = prev(at);
    link_between(node, before, at);
}

/// Remove `node` from whatever cycle it is in. The node's own links are
/// cleared; it can be linked again afterwards.
///
/// # Safety
/// `node` must be threaded into a well-formed cycle and must not be the
/// sentinel of a list that is still in use.
#[inline]
pub unsafe fn unlink(node: NonNull<Link>) {
    let before = prev(node);
    let after = next(node);
    (*before.as_ptr()).next = Some(after);
    (*after.as_ptr()).prev = Some(before);

    let n = node.as_ptr();
    (*n).next = None;
    (*n).prev = None;
}

/// Returns `true` if the list headed by `head` has no nodes.
///
/// # Safety
/// `head` must be a valid link.
#[inline]
pub unsafe fn is_empty(head: NonNull<Link>) -> bool {
    (*head.as_ptr()).next == Some(head)
}

/// Returns `true` if the list headed by `head` has exactly one node.
///
/// # Safety
/// `head` must be a valid link.
#[inline]
pub unsafe fn is_singular(head: NonNull<Link>) -> bool {
    let h = head.as_ptr();
    !is_empty(head) && (*h).next.is_some() && (*h).next == (*h).prev
}

/// Structural defect found while walking a cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleError {
    /// A neighbor was `None` after `steps` hops.
    NullLink { forward: bool, steps: usize },
    /// `a.next.prev != a` (or the mirror) after `steps` hops.
    Asymmetric { forward: bool, steps: usize },
    /// The walk did not return to the sentinel within `limit` nodes.
    Overlong { forward: bool, limit: usize },
    /// Forward and backward walks disagree on the node count.
    CountMismatch { forward: usize, backward: usize },
}

impl CycleError {
    /// `true` for defects that mean the list is not doubly circular, as
    /// opposed to merely being longer than expected.
    pub fn is_broken(&self) -> bool {
        !matches!(self, CycleError::Overlong { .. })
    }
}

/// Walk the cycle in both directions and return the node count.
///
/// Never follows more than `limit + 1` links per direction, so a corrupted
/// cycle that skips the sentinel is reported instead of looping.
///
/// # Safety
/// Every link reachable from `head` within `limit + 1` hops must be valid
/// for reads.
pub unsafe fn check_cycle(head: NonNull<Link>, limit: usize) -> Result<usize, CycleError> {
    let forward = walk(head, limit, true)?;
    let backward = walk(head, limit, false)?;
    if forward != backward {
        return Err(CycleError::CountMismatch { forward, backward });
    }
    Ok(forward)
}

unsafe fn walk(head: NonNull<Link>, limit: usize, forward: bool) -> Result<usize, CycleError> {
    let step = |p: NonNull<Link>| {
        if forward {
            (*p.as_ptr()).next
        } else {
            (*p.as_ptr()).prev
        }
    };
    let back = |p: NonNull<Link>| {
        if forward {
            (*p.as_ptr()).prev
        } else {
            (*p.as_ptr()).next
        }
    };

    let mut cur = head;
    let mut steps = 0usize;
    loop {
        let Some(n) = step(cur) else {
            return Err(CycleError::NullLink { forward, steps });
        };
        if back(n) != Some(cur) {
            return Err(CycleError::Asymmetric { forward, steps });
        }
        if n == head {
            return Ok(steps);
        }
        steps += 1;
        if steps > limit {
            return Err(CycleError::Overlong { forward, limit });
        }
        cur = n;
    }
}
