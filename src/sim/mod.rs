//! Deterministic run support for the harness.
//!
//! Purpose:
//! - A seedable RNG so `RAND` values, shuffles and injected allocation faults
//!   replay exactly.
//! - A bounded trace of recent harness events.
//! - A JSON crash dump that captures both when a run dies.
//!
//! Invariants:
//! - `TraceRing` never exceeds its capacity and evicts oldest events first.
//! - `SimRng` is deterministic and remaps a zero seed to a non-zero state.

pub mod artifact;
pub mod rng;
pub mod trace;

pub use artifact::{CrashDump, CRASH_DUMP_SCHEMA_VERSION};
pub use rng::SimRng;
pub use trace::{TraceEvent, TraceRing};
