//! Protected regions and fault recovery.
//!
//! A protected region runs a closure under a checkpoint. Faults raised inside
//! the closure unwind straight back to the checkpoint and come out of
//! [`protect`] as a [`Fault`] value; nothing between the trap and the region
//! boundary gets to observe a half-finished harness update.
//!
//! Two fault sources exist:
//! - Traps: [`illegal_access`] (a null or invalid link was followed) and
//!   [`raise`] (an explicit harness-detected failure).
//! - Deadlines: every region may carry a time limit. Code running inside it
//!   calls [`poll`] on its hot paths; once the deadline passes, the next poll
//!   raises [`Fault::TimeLimit`]. List traversal polls on every hop, so a
//!   cycle that never returns to its sentinel is cancelled instead of hanging.
//!
//! Any other panic escaping a region is treated as an illegal access: the
//! engine under test is in an unknown state.
//!
//! Regions nest. An inner region inherits the tighter of its own and its
//! parent's deadline. All state is thread-local.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;
use std::time::{Duration, Instant};

/// Reads of the clock happen once per this many polls.
const POLL_STRIDE: u32 = 256;

/// Outcome of a protected region that did not run to completion.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Fault {
    /// The region's deadline passed.
    TimeLimit,
    /// A null or invalid link was followed, or the engine panicked.
    IllegalAccess { message: String },
    /// The harness raised a failure explicitly.
    Raised { message: String },
}

impl Fault {
    /// Illegal accesses end the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Fault::IllegalAccess { .. })
    }

    /// Free-form detail carried by the fault, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Fault::TimeLimit => None,
            Fault::IllegalAccess { message } | Fault::Raised { message } => Some(message),
        }
    }

    fn from_payload(payload: Box<dyn std::any::Any + Send>) -> Self {
        let payload = match payload.downcast::<Fault>() {
            Ok(fault) => return *fault,
            Err(other) => other,
        };
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic with non-string payload".to_string()
        };
        Fault::IllegalAccess { message }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::TimeLimit => f.write_str(
                "Time limit exceeded.  Either you are in an infinite loop, or your code is too inefficient",
            ),
            Fault::IllegalAccess { .. } => f.write_str(
                "Segmentation fault occurred.  You dereferenced a NULL or invalid pointer",
            ),
            Fault::Raised { message } => f.write_str(message),
        }
    }
}

impl std::error::Error for Fault {}

thread_local! {
    static CHECKPOINTS: RefCell<Vec<Option<Instant>>> = const { RefCell::new(Vec::new()) };
    static DEPTH: Cell<usize> = const { Cell::new(0) };
    static POLLS: Cell<u32> = const { Cell::new(0) };
}

static HOOK: Once = Once::new();

// Keep the default hook quiet for faults that a region is about to catch.
fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !in_region() {
                previous(info);
            }
        }));
    });
}

/// Returns `true` while the current thread is inside a protected region.
pub fn in_region() -> bool {
    DEPTH.try_with(|d| d.get() > 0).unwrap_or(false)
}

/// Run `f` inside a protected region with an optional time limit.
///
/// Returns `Ok` with the closure's value if it completed, or the [`Fault`]
/// that interrupted it.
pub fn protect<R>(limit: Option<Duration>, f: impl FnOnce() -> R) -> Result<R, Fault> {
    install_hook();

    let own = limit.and_then(|d| Instant::now().checked_add(d));
    CHECKPOINTS.with(|c| {
        let mut c = c.borrow_mut();
        let parent = c.last().copied().flatten();
        let deadline = match (own, parent) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        c.push(deadline);
    });
    DEPTH.with(|d| d.set(d.get() + 1));

    let result = panic::catch_unwind(AssertUnwindSafe(f));

    DEPTH.with(|d| d.set(d.get() - 1));
    CHECKPOINTS.with(|c| {
        c.borrow_mut().pop();
    });

    result.map_err(|payload| {
        let fault = Fault::from_payload(payload);
        tracing::warn!(fault = ?fault, "protected region interrupted");
        fault
    })
}

/// Cooperative deadline check. Cheap enough for every list hop; the clock is
/// only read once per `POLL_STRIDE` calls.
#[inline]
pub fn poll() {
    let due = POLLS
        .try_with(|p| {
            let n = p.get().wrapping_add(1);
            p.set(n);
            n % POLL_STRIDE == 0
        })
        .unwrap_or(false);
    if due {
        check_deadline();
    }
}

/// Check the innermost deadline now, regardless of the poll stride.
pub fn check_deadline() {
    if std::thread::panicking() {
        return;
    }
    let deadline = CHECKPOINTS
        .try_with(|c| c.borrow().last().copied().flatten())
        .ok()
        .flatten();
    if let Some(deadline) = deadline {
        if Instant::now() >= deadline {
            time_limit();
        }
    }
}

/// Trap: a null or invalid link was followed.
pub fn illegal_access(message: &str) -> ! {
    panic::panic_any(Fault::IllegalAccess {
        message: message.to_string(),
    })
}

/// Trap: the region's time limit was exceeded.
pub fn time_limit() -> ! {
    panic::panic_any(Fault::TimeLimit)
}

/// Trap: the harness detected a failure and abandons the region.
pub fn raise(message: impl Into<String>) -> ! {
    panic::panic_any(Fault::Raised {
        message: message.into(),
    })
}
