//! Fault injection and recovery primitives the console builds on.
//!
//! - [`heap`]: tracked allocation, outstanding-block counting, simulated
//!   allocation failure, no-allocate and cautious modes.
//! - [`exception`]: protected regions that turn traps and expired deadlines
//!   into [`Fault`] values.

pub mod exception;
pub mod heap;

pub use exception::{protect, Fault};
pub use heap::{Block, Heap, HeapError};
