//! Tracked, failure-injecting allocator for queue storage.
//!
//! Every block handed out by a [`Heap`] is counted until it is released, so the
//! harness can tell whether destroying a queue really returned everything.
//! The heap can also refuse allocations: randomly with a configured
//! probability, or unconditionally while no-allocate mode is on. Misuse is
//! latched into an error flag the harness inspects after each command.
//!
//! Blocks are owning handles. Dropping a [`Block`] frees it; [`Block::into_raw`]
//! and [`Block::from_raw`] move ownership through an intrusive list.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::rc::Rc;

use crate::sim::rng::SimRng;
use crate::stdx::list::CycleError;

/// Heap misuse detected by the allocator.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HeapError {
    #[error("Calls to malloc disallowed")]
    AllocDisallowed,
    #[error("Calls to free disallowed")]
    FreeDisallowed,
    #[error("Attempted to free unallocated block")]
    Unallocated,
    #[error("Corrupted queue detected while freeing ({0:?})")]
    CorruptedList(CycleError),
}

struct HeapState {
    /// Address to block count. Zero-sized blocks share one address.
    live: RefCell<HashMap<usize, usize>>,
    outstanding: Cell<usize>,
    fail_percent: Cell<u32>,
    noallocate: Cell<bool>,
    cautious: Cell<bool>,
    error: RefCell<Option<HeapError>>,
    injected: Cell<u64>,
    rng: RefCell<SimRng>,
}

/// Shared handle to one simulated heap. Clones refer to the same heap.
#[derive(Clone)]
pub struct Heap {
    state: Rc<HeapState>,
}

impl fmt::Debug for Heap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heap")
            .field("outstanding", &self.outstanding())
            .field("fail_percent", &self.state.fail_percent.get())
            .field("noallocate", &self.state.noallocate.get())
            .field("cautious", &self.state.cautious.get())
            .finish()
    }
}

impl Heap {
    /// A heap that never fails, with cautious mode on. `seed` drives fault
    /// injection.
    pub fn new(seed: u64) -> Self {
        Self {
            state: Rc::new(HeapState {
                live: RefCell::new(HashMap::new()),
                outstanding: Cell::new(0),
                fail_percent: Cell::new(0),
                noallocate: Cell::new(false),
                cautious: Cell::new(true),
                error: RefCell::new(None),
                injected: Cell::new(0),
                rng: RefCell::new(SimRng::new(seed ^ 0xA5A5_5A5A_0F0F_F0F0)),
            }),
        }
    }

    /// Number of blocks allocated and not yet released.
    pub fn outstanding(&self) -> usize {
        self.state.outstanding.get()
    }

    /// Number of allocations refused by fault injection so far.
    pub fn injected_failures(&self) -> u64 {
        self.state.injected.get()
    }

    /// Allocation failure probability in percent; clamped to 100.
    pub fn set_fail_percent(&self, percent: u32) {
        self.state.fail_percent.set(percent.min(100));
    }

    pub fn fail_percent(&self) -> u32 {
        self.state.fail_percent.get()
    }

    /// While on, every allocation and free is a heap error.
    pub fn set_noallocate(&self, on: bool) {
        self.state.noallocate.set(on);
    }

    /// While on, destroying a queue validates every link before freeing.
    pub fn set_cautious(&self, on: bool) {
        self.state.cautious.set(on);
    }

    pub fn cautious(&self) -> bool {
        self.state.cautious.get()
    }

    /// Latch `err`. The first error since the last [`Heap::take_error`] wins.
    pub fn record_error(&self, err: HeapError) {
        tracing::warn!(error = %err, "heap error");
        let mut slot = self.state.error.borrow_mut();
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    /// Clear and return the latched error.
    pub fn take_error(&self) -> Option<HeapError> {
        self.state.error.borrow_mut().take()
    }

    // Common gate for every allocation.
    fn admit(&self) -> bool {
        if self.state.noallocate.get() {
            self.record_error(HeapError::AllocDisallowed);
            return false;
        }
        let percent = self.state.fail_percent.get();
        if percent > 0 && self.state.rng.borrow_mut().gen_bool(percent, 100) {
            self.state.injected.set(self.state.injected.get() + 1);
            tracing::trace!(percent, "injected allocation failure");
            return false;
        }
        true
    }

    fn register<T: ?Sized>(&self, boxed: Box<T>) -> Block<T> {
        let ptr = NonNull::from(Box::leak(boxed));
        *self.state.live.borrow_mut().entry(addr(ptr)).or_insert(0) += 1;
        self.state.outstanding.set(self.state.outstanding.get() + 1);
        Block {
            ptr,
            heap: self.clone(),
        }
    }

    /// Allocate a block holding `value`, or `None` if the heap refuses.
    pub fn alloc<T>(&self, value: T) -> Option<Block<T>> {
        if !self.admit() {
            return None;
        }
        Some(self.register(Box::new(value)))
    }

    /// Allocate a private copy of `s`, or `None` if the heap refuses.
    pub fn alloc_str(&self, s: &str) -> Option<Block<str>> {
        if !self.admit() {
            return None;
        }
        Some(self.register(Box::<str>::from(s)))
    }

    /// Returns `true` if `ptr` is the address of a live block from this heap.
    pub fn owns<T: ?Sized>(&self, ptr: NonNull<T>) -> bool {
        self.state.live.borrow().contains_key(&addr(ptr))
    }
}

fn addr<T: ?Sized>(ptr: NonNull<T>) -> usize {
    ptr.cast::<u8>().as_ptr() as usize
}

/// Owning handle to one tracked allocation.
pub struct Block<T: ?Sized> {
    ptr: NonNull<T>,
    heap: Heap,
}

impl<T: ?Sized> Block<T> {
    /// Give up the handle and return the raw block. The block stays counted as
    /// outstanding until [`Block::from_raw`] reclaims it.
    pub fn into_raw(self) -> NonNull<T> {
        let this = ManuallyDrop::new(self);
        // Release our reference to the heap without freeing the block.
        // SAFETY: `this` is never used again and its `heap` is read once.
        drop(unsafe { std::ptr::read(&this.heap) });
        this.ptr
    }

    /// Reclaim a block previously released with [`Block::into_raw`].
    ///
    /// # Safety
    /// `ptr` must come from `into_raw` on a block of `heap`, and must not be
    /// reclaimed twice.
    pub unsafe fn from_raw(ptr: NonNull<T>, heap: &Heap) -> Self {
        Block {
            ptr,
            heap: heap.clone(),
        }
    }

    pub fn as_ptr(&self) -> NonNull<T> {
        self.ptr
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }
}

impl<T: ?Sized> Deref for Block<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the block is live while the handle exists.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T: ?Sized> DerefMut for Block<T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: the handle owns the block exclusively.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T: ?Sized> Drop for Block<T> {
    fn drop(&mut self) {
        let state = &self.heap.state;
        if state.noallocate.get() {
            self.heap.record_error(HeapError::FreeDisallowed);
        }
        let key = addr(self.ptr);
        let known = {
            let mut live = state.live.borrow_mut();
            match live.get(&key).copied() {
                Some(1) => {
                    live.remove(&key);
                    true
                }
                Some(n) => {
                    live.insert(key, n - 1);
                    true
                }
                None => false,
            }
        };
        if !known {
            // Double free through a reclaimed pointer: leave memory alone.
            self.heap.record_error(HeapError::Unallocated);
            return;
        }
        state.outstanding.set(state.outstanding.get() - 1);
        // SAFETY: the block came from `Box::leak` and is freed exactly once.
        drop(unsafe { Box::from_raw(self.ptr.as_ptr()) });
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Block<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
