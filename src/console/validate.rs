//! Structural and content checks run after every queue command.
//!
//! Every walk here is bounded by the shadow count, so a corrupted cycle is
//! reported instead of followed forever.

use crate::queue::QueueEngine;
use crate::stdx::list::{self, CycleError};

use super::context::RunContext;

impl<E: QueueEngine> RunContext<E> {
    /// Verify the queue is doubly circular and holds exactly the shadow
    /// count of elements.
    pub fn check_structure(&mut self) -> bool {
        let Some(q) = self.queue.as_ref() else {
            return true;
        };
        // SAFETY: bounded to `shadow + 1` hops per direction; every link an
        // engine can produce points at a live node or is `None`.
        let walked = unsafe { list::check_cycle(q.sentinel(), self.shadow) };
        match walked {
            Ok(n) if n == self.shadow => true,
            Ok(n) => {
                self.structure_violation(format!(
                    "Queue has {} elements, but {} were expected",
                    n, self.shadow
                ));
                false
            }
            Err(CycleError::Overlong { .. }) => {
                self.structure_violation(format!("Queue has more than {} elements", self.shadow));
                false
            }
            Err(err) => {
                tracing::debug!(?err, "cycle check failed");
                self.structure_violation("Queue is not doubly circular");
                false
            }
        }
    }

    /// Values head to tail, or `None` if the queue is absent.
    /// Call only after [`RunContext::check_structure`] succeeded.
    pub fn values(&self) -> Option<Vec<String>> {
        let q = self.queue.as_ref()?;
        Some(q.iter().take(self.shadow).map(str::to_string).collect())
    }

    /// Silent form of [`RunContext::check_structure`]. An absent queue
    /// counts as well formed.
    fn well_formed(&self) -> bool {
        let Some(q) = self.queue.as_ref() else {
            return true;
        };
        // SAFETY: bounded walk, as in `check_structure`.
        matches!(
            unsafe { list::check_cycle(q.sentinel(), self.shadow) },
            Ok(n) if n == self.shadow
        )
    }

    /// Values before a reordering or deletion, when the queue is small
    /// enough to copy and well formed.
    pub fn snapshot(&self) -> Option<Vec<String>> {
        if self.shadow > self.config.snapshot_limit || !self.well_formed() {
            return None;
        }
        self.values()
    }

    /// Compare the queue against `want` after command `what`.
    pub fn expect_values(&mut self, what: &str, want: &[String]) -> bool {
        let Some(got) = self.values() else {
            return want.is_empty();
        };
        if got.len() != want.len() {
            self.violation(format!(
                "After {what}, queue holds {} elements but {} were expected",
                got.len(),
                want.len()
            ));
            return false;
        }
        match got.iter().zip(want).position(|(g, w)| g != w) {
            None => true,
            Some(i) => {
                self.violation(format!(
                    "After {what}, element {i} is '{}' but '{}' was expected",
                    got[i], want[i]
                ));
                false
            }
        }
    }

    /// Print the queue at `level`: `l = [a b c]`, truncated past the big
    /// list size. A malformed queue is never walked and prints nothing.
    pub fn show(&mut self, level: u8) {
        if !self.reporter.enabled(level) || !self.well_formed() {
            return;
        }
        let Some(q) = self.queue.as_ref() else {
            self.reporter.report(level, "l = NULL");
            return;
        };
        let big = self.config.big_list_size;
        let shown: Vec<&str> = q.iter().take(self.shadow.min(big)).collect();
        let mut line = format!("l = [{}", shown.join(" "));
        line.push_str(if self.shadow > big { " ... ]" } else { "]" });
        self.reporter.report(level, line);
    }

    /// Structure check followed by display. Skipped once the run is fatal.
    pub fn post_check(&mut self, level: u8) -> bool {
        if self.is_fatal() {
            return false;
        }
        if !self.check_structure() {
            return false;
        }
        self.show(level);
        true
    }
}
