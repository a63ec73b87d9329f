//! Bounded history of recent harness events.
//!
//! The console records what it dispatched and how each command ended. Only the
//! newest events are kept; the ring is dumped into a crash artifact when the
//! run dies on a fatal fault.

use std::collections::VecDeque;

/// One harness event.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TraceEvent {
    /// A command line was dispatched. `index` counts dispatched commands.
    Command { index: u64, line: String },
    /// The command finished with the given verdict.
    Verdict { index: u64, ok: bool },
    /// A protected region was interrupted.
    Fault { index: u64, message: String },
    /// A harness check failed.
    InvariantFail { index: u64, check: String },
    /// The heap latched an error.
    HeapError { index: u64, message: String },
}

/// Fixed-capacity ring; the oldest events are evicted first.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TraceRing {
    cap: usize,
    buf: VecDeque<TraceEvent>,
}

impl TraceRing {
    /// A ring with at least one slot.
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            cap,
            buf: VecDeque::with_capacity(cap),
        }
    }

    #[inline(always)]
    pub fn cap(&self) -> usize {
        self.cap
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn push(&mut self, ev: TraceEvent) {
        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(ev);
    }

    /// Most recent event, if any.
    pub fn last(&self) -> Option<&TraceEvent> {
        self.buf.back()
    }

    /// Events in chronological order.
    pub fn dump(&self) -> Vec<TraceEvent> {
        self.buf.iter().cloned().collect()
    }
}
