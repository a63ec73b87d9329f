//! Interactive test console.
//!
//! The console reads commands (from a file, stdin or an in-memory script),
//! drives a [`QueueEngine`](crate::queue::QueueEngine) through them and
//! checks every result against its own bookkeeping:
//!
//! - a shadow element count, independent of the engine's `size`;
//! - a snapshot of the values before reordering commands;
//! - the heap's outstanding-block count after `free`.
//!
//! Output goes through [`Reporter`], which filters by verbosity and can copy
//! everything to a log file.

pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub(crate) mod handlers;
pub mod report;
pub mod runner;
mod validate;

pub use config::Config;
pub use context::{RunContext, TimedOp, TimingOracle};
pub use error::CommandError;
pub use report::{Reporter, Transcript};
pub use runner::{Console, FixedOracle, Outcome};
