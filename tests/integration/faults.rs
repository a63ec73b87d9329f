//! Deliberately broken engines. Each one must be caught by the console and
//! reported as a failure, never crash the test process.

use std::ptr::NonNull;

use qtest_rs::harness::exception;
use qtest_rs::queue::QueueEngine;
use qtest_rs::sim::TraceEvent;
use qtest_rs::stdx::list;
use qtest_rs::{DisplayBuf, ElementBox, Queue};

use super::{console_with, run_with};

/// Reports one more element than the queue holds.
struct OffByOne;

impl QueueEngine for OffByOne {
    fn size(&mut self, q: Option<&Queue>) -> usize {
        q.map_or(0, |q| q.size() + 1)
    }
}

#[test]
fn wrong_size_is_reported() {
    let (out, t) = run_with(OffByOne, "new\nit a\nit b\nit c\nsize\n");
    assert!(!out.ok);
    assert_eq!(out.errors, 1);
    assert!(t
        .text()
        .contains("ERROR: Computed queue size as 4, but correct value is 3"));
}

/// Reverses correctly, then clears the sentinel's back link.
struct DropsBackLink;

impl QueueEngine for DropsBackLink {
    fn reverse(&mut self, q: Option<&mut Queue>) {
        if let Some(q) = q {
            q.reverse();
            let head = q.sentinel();
            // SAFETY: the sentinel is live for the queue's lifetime.
            unsafe { (*head.as_ptr()).set_prev(None) };
        }
    }
}

#[test]
fn broken_cycle_is_detected_and_teardown_fails() {
    let (out, t) = run_with(DropsBackLink, "new\nit a\nit b\nreverse\n");
    assert!(!out.ok);
    assert!(!out.fatal);
    let text = t.text();
    assert!(text.contains("ERROR:  Queue is not doubly circular"), "{text}");
    assert!(text.contains("Corrupted queue detected while freeing"), "{text}");
    assert!(text.contains("blocks are still allocated"), "{text}");
}

/// Leaves the queue untouched on swap.
struct SkipsSwap;

impl QueueEngine for SkipsSwap {
    fn swap(&mut self, _q: Option<&mut Queue>) {}
}

#[test]
fn missing_swap_is_caught_by_value_check() {
    let (out, t) = run_with(SkipsSwap, "new\nit a\nit b\nswap\n");
    assert!(!out.ok);
    assert_eq!(out.errors, 1);
    assert!(t
        .text()
        .contains("ERROR: After swap, element 0 is 'a' but 'b' was expected"));
}

/// Writes a byte past the payload capacity of the removal buffer.
struct Overrun;

impl QueueEngine for Overrun {
    fn remove_head(
        &mut self,
        q: Option<&mut Queue>,
        mut buf: Option<&mut DisplayBuf>,
    ) -> Option<ElementBox> {
        let removed = q?.remove_head(buf.as_deref_mut());
        if let Some(buf) = buf {
            let cap = buf.capacity();
            buf.backing_mut()[cap + 3] = b'!';
        }
        removed
    }
}

#[test]
fn buffer_overrun_hits_guard() {
    let (out, t) = run_with(Overrun, "new\nit a\nrh\n");
    assert!(!out.ok);
    assert!(t
        .text()
        .contains("copying of string in remove_head overflowed destination buffer."));
}

/// Walks the cycle forever.
struct Spins;

impl QueueEngine for Spins {
    fn size(&mut self, q: Option<&Queue>) -> usize {
        let Some(q) = q else { return 0 };
        let mut cur = q.sentinel();
        loop {
            // SAFETY: every link of a well-formed queue is live.
            cur = unsafe { list::next(cur) };
        }
    }
}

#[test]
fn runaway_loop_hits_time_limit_and_run_continues() {
    let (out, t) = run_with(Spins, "option timeout 50\nnew\nit a\nsize\nit b\nshow\n");
    assert!(!out.ok);
    assert!(!out.fatal);
    assert_eq!(out.errors, 1);
    let text = t.text();
    assert!(text.contains("Time limit exceeded."));
    assert!(text.contains("l = [a b]"));
}

/// Forgets the queue instead of freeing it.
struct Leaks;

impl QueueEngine for Leaks {
    fn free(&mut self, q: Option<Queue>) {
        std::mem::forget(q);
    }
}

#[test]
fn leaked_blocks_are_counted() {
    let (out, t) = run_with(Leaks, "new\nit a\nit b\nfree\n");
    assert!(!out.ok);
    assert!(t
        .text()
        .contains("ERROR: Freed queue, but 5 blocks are still allocated"));
}

/// Allocates inside sort, which runs with allocation disallowed.
struct AllocatingSort;

impl QueueEngine for AllocatingSort {
    fn sort(&mut self, q: Option<&mut Queue>) {
        if let Some(q) = q {
            let _scratch = q.heap().alloc(0u64);
            q.sort();
        }
    }
}

#[test]
fn allocation_during_sort_is_a_heap_error() {
    let (out, t) = run_with(AllocatingSort, "new\nit b\nit a\nsort\n");
    assert!(!out.ok);
    assert!(t.text().contains("ERROR: Calls to malloc disallowed"));
}

/// Sorts, then clears the first element's forward link.
struct NullsFirstNext;

impl QueueEngine for NullsFirstNext {
    fn sort(&mut self, q: Option<&mut Queue>) {
        if let Some(q) = q {
            q.sort();
            // SAFETY: the queue is non-empty, so the sentinel's neighbor is a
            // live element.
            unsafe {
                let first = list::next(q.sentinel());
                (*first.as_ptr()).set_next(None);
            }
        }
    }
}

#[test]
fn corrupting_sort_is_reported_and_run_continues() {
    let (out, t) = run_with(NullsFirstNext, "new\nit b\nit a\nsort\nshow\n");
    assert!(!out.ok);
    assert!(!out.fatal);
    let text = t.text();
    assert_eq!(
        text.matches("ERROR:  Queue is not doubly circular").count(),
        2,
        "{text}"
    );
    assert!(text.contains("Corrupted queue detected while freeing"), "{text}");
    assert!(!text.contains("l = [a"), "{text}");
    assert!(!text.contains("Segmentation fault"), "{text}");
}

/// Indexes out of bounds while sorting.
struct Panics;

impl QueueEngine for Panics {
    fn sort(&mut self, q: Option<&mut Queue>) {
        let n = q.map_or(0, |q| q.size());
        let scratch: Vec<usize> = Vec::new();
        let _first: usize = scratch[n];
    }
}

#[test]
fn panic_in_engine_is_fatal_and_dumps() {
    let (mut console, t) = console_with(Panics, 3);
    console.push_script("script", "new\nit a\nsort\nit b\n");
    console.run();
    let out = console.finish();
    assert!(out.fatal);
    assert!(!out.ok);
    let text = t.text();
    assert!(text.contains("Segmentation fault occurred."));
    assert!(!text.contains("cmd> it b"));
    assert!(!text.contains("Freeing queue"));

    let dump = console.crash_dump().expect("fatal run has a dump");
    assert_eq!(dump.command, "sort");
    assert_eq!(dump.seed, 42);
    assert!(dump.detail.is_some_and(|d| d.contains("index out of bounds")));
    assert!(dump
        .trace
        .iter()
        .any(|ev| matches!(ev, TraceEvent::Fault { .. })));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crash.json");
    console.crash_dump().unwrap().write_to(&path).unwrap();
    let back = qtest_rs::CrashDump::read_from(&path).unwrap();
    assert_eq!(back.command, "sort");
}

/// Follows a cleared link.
struct NullDeref;

impl QueueEngine for NullDeref {
    fn delete_mid(&mut self, q: Option<&mut Queue>) -> bool {
        let Some(q) = q else { return false };
        let head: NonNull<list::Link> = q.sentinel();
        // SAFETY: deliberately traps through the checked accessor.
        unsafe {
            (*head.as_ptr()).set_next(None);
            list::next(head);
        }
        true
    }
}

#[test]
fn null_link_is_illegal_access() {
    let (out, t) = run_with(NullDeref, "new\nit a\ndm\nsize\n");
    assert!(out.fatal);
    assert!(t
        .text()
        .contains("Segmentation fault occurred.  You dereferenced a NULL or invalid pointer"));
    assert!(!t.text().contains("cmd> size"));
}

#[test]
fn raise_inside_region_is_recoverable() {
    let fault = exception::protect(None, || exception::raise("bail")).unwrap_err();
    assert!(!fault.is_fatal());
    assert_eq!(fault.to_string(), "bail");
}
