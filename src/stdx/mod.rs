//! Payload-agnostic building blocks for the queue engine and harness.

pub mod display_buf;
pub mod list;
pub mod list_sort;

pub use display_buf::DisplayBuf;
pub use list::{CycleError, Link};
pub use list_sort::list_sort;
