//! Verification harness for an intrusive, doubly linked, circular queue of
//! strings.
//!
//! ## Scope
//! A queue engine (the code under test) implements [`QueueEngine`] over
//! [`Queue`]. The console drives it with scripted commands and checks every
//! result against independent bookkeeping: a shadow element count, value
//! snapshots and the tracked heap.
//!
//! ## Key invariants
//! - Every walk over a possibly corrupted list is bounded by the shadow count.
//! - Engine code runs inside a protected region with a deadline; an overrun
//!   or a broken link becomes a [`Fault`] instead of a hang or a crash.
//! - All engine allocations go through [`Heap`], so leaks, double frees and
//!   allocation inside no-allocate commands are reported by the console.
//!
//! ## Layout
//! - [`stdx`]: intrusive list links, the generic list sort and guarded
//!   display buffers.
//! - [`harness`]: protected regions and the tracked heap.
//! - [`queue`]: the queue type, the engine trait and the reference engine.
//! - [`console`]: command table, handlers, validation and the command loop.
//! - [`sim`]: deterministic RNG, trace ring and crash artifacts.

pub mod console;
pub mod harness;
pub mod queue;
pub mod sim;
pub mod stdx;

pub use console::{CommandError, Config, Console, Outcome, Reporter, Transcript};
pub use harness::{protect, Block, Fault, Heap, HeapError};
pub use queue::{Element, ElementBox, LinkedEngine, Queue, QueueEngine};
pub use sim::{CrashDump, SimRng};
pub use stdx::{list_sort, CycleError, DisplayBuf, Link};
