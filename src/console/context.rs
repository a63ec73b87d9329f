//! State of one harness run.
//!
//! Everything the command handlers touch lives in [`RunContext`]: the engine
//! under test, its heap, the live queue, the shadow count, configuration and
//! output. Handlers reach the engine only through [`RunContext::run`], which
//! wraps the call in a protected region with the configured time limit.

use core::ptr::NonNull;

use crate::harness::exception::{self, Fault};
use crate::harness::heap::Heap;
use crate::queue::{LinkedEngine, Queue, QueueEngine};
use crate::sim::rng::SimRng;
use crate::sim::trace::{TraceEvent, TraceRing};
use crate::stdx::display_buf::DisplayBuf;

use super::config::Config;
use super::report::Reporter;

/// Guard bytes appended behind every removal buffer.
pub const STRING_PAD: usize = 1024;

/// Bounds of generated `RAND` strings, as `[min, max)`.
pub const RAND_LEN: (usize, usize) = (5, 10);

const TRACE_CAPACITY: usize = 64;

/// Operations a timing oracle can be asked about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimedOp {
    InsertHead,
    InsertTail,
    RemoveHead,
    RemoveTail,
}

/// Decides whether an operation runs in constant time. Statistical leakage
/// detection lives behind this trait.
pub trait TimingOracle {
    fn is_constant_time(&mut self, op: TimedOp) -> bool;
}

pub struct RunContext<E: QueueEngine = LinkedEngine> {
    pub engine: E,
    pub heap: Heap,
    pub queue: Option<Queue>,
    /// Ground-truth element count, maintained by the handlers only.
    pub shadow: usize,
    pub config: Config,
    pub rng: SimRng,
    pub seed: u64,
    pub reporter: Reporter,
    pub trace: TraceRing,
    /// Consecutive failed queue operations.
    pub fail_count: u32,
    pub oracle: Option<Box<dyn TimingOracle>>,
    /// Set once an illegal access ends the run.
    pub fatal: Option<Fault>,
    pub command_index: u64,
    pub current_line: String,
}

impl<E: QueueEngine> RunContext<E> {
    pub fn new(engine: E, config: Config, seed: u64, reporter: Reporter) -> Self {
        let heap = Heap::new(seed);
        let mut ctx = Self {
            engine,
            heap,
            queue: None,
            shadow: 0,
            config,
            rng: SimRng::new(seed),
            seed,
            reporter,
            trace: TraceRing::new(TRACE_CAPACITY),
            fail_count: 0,
            oracle: None,
            fatal: None,
            command_index: 0,
            current_line: String::new(),
        };
        ctx.sync_config();
        ctx
    }

    /// Push configuration into the heap and reporter.
    pub fn sync_config(&mut self) {
        self.heap.set_fail_percent(self.config.fail_probability);
        self.reporter.set_verbosity(self.config.verbosity);
    }

    /// Run `f` in a protected region. A fault is reported and `None` is
    /// returned; an illegal access additionally marks the run fatal.
    pub fn run<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> Option<R> {
        let limit = Some(self.config.time_limit());
        let result = exception::protect(limit, || f(&mut *self));
        match result {
            Ok(v) => Some(v),
            Err(fault) => {
                self.on_fault(fault);
                None
            }
        }
    }

    fn on_fault(&mut self, fault: Fault) {
        self.reporter.report(1, &fault);
        self.trace.push(TraceEvent::Fault {
            index: self.command_index,
            message: fault.detail().unwrap_or("time limit").to_string(),
        });
        if fault.is_fatal() {
            tracing::error!(fault = ?fault, line = %self.current_line, "fatal fault");
            self.fatal = Some(fault);
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal.is_some()
    }

    /// Report and clear a latched heap error. Returns `true` if there was one.
    pub fn heap_check(&mut self) -> bool {
        let Some(err) = self.heap.take_error() else {
            return false;
        };
        self.reporter.error(&err);
        self.trace.push(TraceEvent::HeapError {
            index: self.command_index,
            message: err.to_string(),
        });
        true
    }

    /// Report a failed harness check.
    pub fn violation(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        self.reporter.error(&msg);
        self.record_violation(msg);
    }

    /// Report a queue that is no longer a well-formed cycle of the expected
    /// length.
    pub fn structure_violation(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        self.reporter.structure_error(&msg);
        self.record_violation(msg);
    }

    fn record_violation(&mut self, msg: String) {
        self.trace.push(TraceEvent::InvariantFail {
            index: self.command_index,
            check: msg,
        });
    }

    /// Count a failed queue operation. Returns `true` while the failure is
    /// still tolerated.
    pub fn note_failure(&mut self) -> bool {
        self.fail_count = self.fail_count.saturating_add(1);
        self.fail_count < self.config.fail_limit
    }

    pub fn note_success(&mut self) {
        self.fail_count = 0;
    }

    pub fn rand_string(&mut self) -> String {
        self.rng.lowercase(RAND_LEN.0, RAND_LEN.1)
    }

    /// Destination for removed values: `length + 1` payload bytes and a
    /// guard region.
    pub fn removal_buf(&self) -> DisplayBuf {
        DisplayBuf::new(self.config.string_length + 1, STRING_PAD)
    }

    /// Stored string at one end of the queue.
    pub fn end_value(&self, head: bool) -> Option<NonNull<u8>> {
        let q = self.queue.as_ref()?;
        let s = if head { q.front()? } else { q.back()? };
        Some(NonNull::from(s.as_bytes()).cast())
    }
}
