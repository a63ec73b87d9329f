//! Queue command handlers.
//!
//! Each handler returns `Err` for a usage error, `Ok(false)` for a failed
//! check and `Ok(true)` when the command passed. Engine calls happen inside
//! [`RunContext::run`]; the shadow count is only updated from results the
//! engine actually returned.

use core::ptr::NonNull;

use crate::queue::{Queue, QueueEngine};

use super::command::parse_int;
use super::context::{RunContext, TimedOp};
use super::error::CommandError;

/// Level at which handlers print the queue and their warnings.
const SHOW_LEVEL: u8 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum End {
    Head,
    Tail,
}

impl End {
    fn name(self) -> &'static str {
        match self {
            End::Head => "head",
            End::Tail => "tail",
        }
    }
}

fn count_arg(what: &'static str, value: &str) -> Result<usize, CommandError> {
    let n = parse_int(what, value)?;
    usize::try_from(n).map_err(|_| CommandError::InvalidInteger {
        what,
        value: value.to_string(),
    })
}

/// Number of values that occur in a run of length one.
pub(crate) fn singleton_runs<'a>(values: impl Iterator<Item = &'a str>) -> usize {
    let mut count = 0;
    let mut prev: Option<&str> = None;
    let mut run = 0usize;
    for v in values {
        if prev == Some(v) {
            run += 1;
        } else {
            if run == 1 {
                count += 1;
            }
            prev = Some(v);
            run = 1;
        }
    }
    if run == 1 {
        count += 1;
    }
    count
}

impl<E: QueueEngine> RunContext<E> {
    fn warn_absent(&mut self, msg: &str) {
        if self.queue.is_none() {
            self.reporter.report(SHOW_LEVEL, msg);
        }
    }

    pub(crate) fn simulate(
        &mut self,
        name: &str,
        op: TimedOp,
        args: &[&str],
    ) -> Result<bool, CommandError> {
        if !args.is_empty() {
            return Err(CommandError::SimulationArgs(name.to_string()));
        }
        let oracle = self.oracle.as_mut().ok_or(CommandError::NoOracle)?;
        if oracle.is_constant_time(op) {
            self.reporter.report(1, "Probably constant time");
            Ok(true)
        } else {
            self.reporter.error("Probably not constant time");
            Ok(false)
        }
    }

    pub(crate) fn do_new(&mut self) -> Result<bool, CommandError> {
        let mut ok = true;
        if self.queue.is_some() {
            self.reporter.report(SHOW_LEVEL, "Freeing old queue");
            ok = self.do_free()?;
            if self.is_fatal() {
                return Ok(false);
            }
        }
        self.heap_check();

        let heap = self.heap.clone();
        match self.run(|ctx| ctx.engine.new_queue(&heap)) {
            Some(Some(q)) => self.queue = Some(q),
            Some(None) => self.reporter.report(2, "Allocation of new queue failed"),
            None => ok = false,
        }
        self.shadow = 0;
        ok &= self.post_check(SHOW_LEVEL);
        Ok(ok && !self.heap_check())
    }

    pub(crate) fn do_free(&mut self) -> Result<bool, CommandError> {
        self.warn_absent("Warning: Calling free on null queue");
        self.heap_check();
        Ok(self.release_queue())
    }

    /// Destroy the queue, then require that nothing is left allocated.
    pub(crate) fn release_queue(&mut self) -> bool {
        if self.shadow > self.config.big_list_size {
            self.heap.set_cautious(false);
        }
        let q = self.queue.take();
        let freed = self.run(|ctx| ctx.engine.free(q)).is_some();
        self.heap.set_cautious(true);

        self.shadow = 0;
        let mut ok = freed && self.post_check(SHOW_LEVEL);

        let outstanding = self.heap.outstanding();
        if outstanding > 0 {
            self.violation(format!(
                "Freed queue, but {outstanding} blocks are still allocated"
            ));
            ok = false;
        }
        ok && !self.heap_check()
    }

    pub(crate) fn do_insert(
        &mut self,
        name: &str,
        end: End,
        args: &[&str],
    ) -> Result<bool, CommandError> {
        if self.config.simulation {
            let op = match end {
                End::Head => TimedOp::InsertHead,
                End::Tail => TimedOp::InsertTail,
            };
            return self.simulate(name, op, args);
        }
        let arg = args[0];
        let reps = match args.get(1) {
            Some(n) => count_arg("number of insertions", n)?,
            None => 1,
        };
        let rand = arg == "RAND";

        self.warn_absent(match end {
            End::Head => "Warning: Calling insert head on null queue",
            End::Tail => "Warning: Calling insert tail on null queue",
        });
        self.heap_check();

        let completed = self.run(|ctx| {
            let mut last: Option<NonNull<u8>> = None;
            for r in 0..reps {
                let value = if rand {
                    ctx.rand_string()
                } else {
                    arg.to_string()
                };
                let inserted = match end {
                    End::Head => ctx.engine.insert_head(ctx.queue.as_mut(), &value),
                    End::Tail => ctx.engine.insert_tail(ctx.queue.as_mut(), &value),
                };
                if !inserted {
                    if ctx.note_failure() {
                        ctx.reporter.report(2, format_args!("Insertion of {value} failed"));
                    } else {
                        let total = ctx.fail_count;
                        ctx.violation(format!(
                            "Insertion of {value} failed ({total} failures total)"
                        ));
                        return false;
                    }
                    if ctx.heap_check() {
                        return false;
                    }
                    continue;
                }

                ctx.shadow += 1;
                ctx.note_success();
                let Some(stored) = ctx.end_value(end == End::Head) else {
                    ctx.violation("Failed to save copy of string in queue");
                    return false;
                };
                if stored.as_ptr() as *const u8 == value.as_ptr() || !ctx.heap.owns(stored) {
                    ctx.violation("Need to allocate and copy string for new queue element");
                    return false;
                }
                if r > 0 && last == Some(stored) {
                    ctx.violation("Need to allocate separate string for each queue element");
                    return false;
                }
                last = Some(stored);
                if ctx.heap_check() {
                    return false;
                }
            }
            true
        });

        let ok = completed.unwrap_or(false);
        Ok(self.post_check(SHOW_LEVEL) && ok)
    }

    pub(crate) fn do_remove(
        &mut self,
        name: &str,
        end: End,
        args: &[&str],
    ) -> Result<bool, CommandError> {
        if self.config.simulation {
            let op = match end {
                End::Head => TimedOp::RemoveHead,
                End::Tail => TimedOp::RemoveTail,
            };
            return self.simulate(name, op, args);
        }

        let limit = self.config.string_length;
        let expected: Option<&[u8]> = args.first().map(|s| {
            let b = s.as_bytes();
            &b[..b.len().min(limit)]
        });
        let mut buf = self.removal_buf();

        if self.shadow == 0 {
            self.reporter.report(
                SHOW_LEVEL,
                format_args!("Warning: Calling remove {} on empty queue", end.name()),
            );
        }
        self.heap_check();

        let removed = self
            .run(|ctx| match end {
                End::Head => ctx.engine.remove_head(ctx.queue.as_mut(), Some(&mut buf)),
                End::Tail => ctx.engine.remove_tail(ctx.queue.as_mut(), Some(&mut buf)),
            })
            .flatten();
        if self.is_fatal() {
            if let Some(elem) = removed {
                std::mem::forget(elem);
            }
            return Ok(false);
        }

        let mut ok = true;
        match removed {
            Some(elem) => {
                drop(elem);
                self.shadow = self.shadow.saturating_sub(1);
                self.note_success();
                if buf.as_bytes().is_empty() {
                    self.violation("Failed to store removed value");
                    ok = false;
                }
                if !buf.guard_intact() {
                    self.violation(format!(
                        "copying of string in remove_{} overflowed destination buffer.",
                        end.name()
                    ));
                    ok = false;
                } else {
                    self.reporter
                        .report(2, format_args!("Removed {} from queue", buf.text()));
                }
            }
            None => {
                let tolerated = self.note_failure() && expected.is_none();
                if tolerated {
                    self.reporter.report(2, "Removal from queue failed");
                } else {
                    let total = self.fail_count;
                    self.violation(format!("Removal from queue failed ({total} failures total)"));
                    ok = false;
                }
            }
        }

        if ok {
            if let Some(want) = expected {
                if buf.as_bytes() != want {
                    self.violation(format!(
                        "Removed value {} != expected value {}",
                        buf.text(),
                        String::from_utf8_lossy(want)
                    ));
                    ok = false;
                }
            }
        }

        ok &= self.post_check(SHOW_LEVEL);
        Ok(ok && !self.heap_check())
    }

    pub(crate) fn do_remove_quiet(&mut self) -> Result<bool, CommandError> {
        if self.shadow == 0 {
            self.reporter
                .report(SHOW_LEVEL, "Warning: Calling remove head on empty queue");
        }
        self.heap_check();

        let removed = self
            .run(|ctx| ctx.engine.remove_head(ctx.queue.as_mut(), None))
            .flatten();
        if self.is_fatal() {
            if let Some(elem) = removed {
                std::mem::forget(elem);
            }
            return Ok(false);
        }

        let mut ok = true;
        match removed {
            Some(elem) => {
                drop(elem);
                self.shadow = self.shadow.saturating_sub(1);
                self.note_success();
                self.reporter.report(2, "Removed element from queue");
            }
            None => {
                if self.note_failure() {
                    self.reporter.report(2, "Removal failed");
                } else {
                    let total = self.fail_count;
                    self.violation(format!("Removal failed ({total} failures total)"));
                    ok = false;
                }
            }
        }
        ok &= self.post_check(SHOW_LEVEL);
        Ok(ok && !self.heap_check())
    }

    pub(crate) fn do_size(&mut self, args: &[&str]) -> Result<bool, CommandError> {
        let reps = match args.first() {
            Some(n) => count_arg("number of calls to size", n)?,
            None => 1,
        };
        self.warn_absent("Warning: Calling size on null queue");
        self.heap_check();

        let counted = self.run(|ctx| {
            let mut cnt = 0;
            for _ in 0..reps {
                cnt = ctx.engine.size(ctx.queue.as_ref());
                if ctx.heap_check() {
                    return None;
                }
            }
            Some(cnt)
        });

        let mut ok = false;
        if let Some(Some(cnt)) = counted {
            if cnt == self.shadow {
                self.reporter.report(2, format_args!("Queue size = {cnt}"));
                ok = true;
            } else {
                let want = self.shadow;
                self.violation(format!(
                    "Computed queue size as {cnt}, but correct value is {want}"
                ));
            }
        }
        ok &= self.post_check(SHOW_LEVEL);
        Ok(ok && !self.heap_check())
    }

    pub(crate) fn do_sort(&mut self, args: &[&str]) -> Result<bool, CommandError> {
        let generic = match args.first() {
            None => false,
            Some(&"l") => true,
            Some(_) => return Err(CommandError::InvalidSortOption),
        };
        self.warn_absent("Warning: Calling sort on null queue");
        if self.queue.is_some() && self.shadow < 2 {
            self.reporter
                .report(SHOW_LEVEL, "Warning: Calling sort on single node");
        }
        self.heap_check();

        let before = self.snapshot();
        self.heap.set_noallocate(true);
        let done = self.run(|ctx| {
            if generic {
                if let Some(q) = ctx.queue.as_mut() {
                    q.list_sort();
                }
            } else {
                ctx.engine.sort(ctx.queue.as_mut());
            }
        });
        self.heap.set_noallocate(false);

        let formed = done.is_some() && !self.is_fatal() && self.check_structure();
        let mut ok = formed;
        if ok {
            if let Some(after) = self.values() {
                if after.windows(2).any(|w| w[0] > w[1]) {
                    self.violation("Not sorted in ascending order");
                    ok = false;
                }
            }
        }
        if ok {
            if let Some(mut want) = before {
                want.sort();
                ok = self.expect_values("sort", &want);
            }
        }
        if formed {
            self.show(SHOW_LEVEL);
        }
        Ok(ok && !self.heap_check())
    }

    /// Shared shape of reverse, swap and shuffle: no allocation for the
    /// first two, and a value-level expectation computed from the snapshot.
    fn reorder(
        &mut self,
        what: &str,
        noallocate: bool,
        op: impl FnOnce(&mut Self),
        expect: impl FnOnce(Vec<String>) -> Vec<String>,
    ) -> bool {
        self.heap_check();
        let before = self.snapshot();
        self.heap.set_noallocate(noallocate);
        let done = self.run(op).is_some();
        self.heap.set_noallocate(false);

        let mut ok = done && self.post_check(SHOW_LEVEL);
        if ok {
            if let Some(before) = before {
                let want = expect(before);
                ok = self.expect_values(what, &want);
            }
        }
        ok && !self.heap_check()
    }

    pub(crate) fn do_reverse(&mut self) -> Result<bool, CommandError> {
        self.warn_absent("Warning: Calling reverse on null queue");
        Ok(self.reorder(
            "reverse",
            true,
            |ctx| ctx.engine.reverse(ctx.queue.as_mut()),
            |mut v| {
                v.reverse();
                v
            },
        ))
    }

    pub(crate) fn do_swap(&mut self) -> Result<bool, CommandError> {
        self.warn_absent("Warning: Try to access null queue");
        Ok(self.reorder(
            "swap",
            true,
            |ctx| ctx.engine.swap(ctx.queue.as_mut()),
            |mut v| {
                for pair in v.chunks_exact_mut(2) {
                    pair.swap(0, 1);
                }
                v
            },
        ))
    }

    pub(crate) fn do_shuffle(&mut self) -> Result<bool, CommandError> {
        self.warn_absent("Warning: Calling shuffle on null queue");
        self.heap_check();
        let before = self.snapshot();
        let done = self
            .run(|ctx| ctx.engine.shuffle(ctx.queue.as_mut(), &mut ctx.rng))
            .is_some();

        let mut ok = done && self.post_check(SHOW_LEVEL);
        if ok {
            if let (Some(mut want), Some(mut got)) = (before, self.values()) {
                want.sort();
                got.sort();
                if got != want {
                    self.violation("Shuffle changed the set of values in the queue");
                    ok = false;
                }
            }
        }
        Ok(ok && !self.heap_check())
    }

    pub(crate) fn do_delete_mid(&mut self) -> Result<bool, CommandError> {
        self.warn_absent("Warning: Try to access null queue");
        self.heap_check();
        let before = self.snapshot();
        let deleted = self.run(|ctx| ctx.engine.delete_mid(ctx.queue.as_mut()));

        let mut ok = deleted == Some(true);
        if ok {
            self.shadow = self.shadow.saturating_sub(1);
        }
        ok &= self.post_check(SHOW_LEVEL);
        if ok {
            if let Some(mut want) = before.filter(|v| !v.is_empty()) {
                want.remove(want.len().div_ceil(2) - 1);
                ok = self.expect_values("dm", &want);
            }
        }
        Ok(ok && !self.heap_check())
    }

    pub(crate) fn do_dedup(&mut self) -> Result<bool, CommandError> {
        self.heap_check();
        let before = self.snapshot();
        // Survivors, counted without copying when the queue is too big to
        // snapshot.
        let survivors = match &before {
            Some(v) => Some(singleton_runs(v.iter().map(String::as_str))),
            None => self.walk_singletons(),
        };

        let result = self.run(|ctx| ctx.engine.delete_dup(ctx.queue.as_mut()));
        match result {
            None => return Ok(false),
            Some(false) => {
                self.violation("Calling delete duplicate on null queue");
                return Ok(false);
            }
            Some(true) => {}
        }
        if let Some(n) = survivors {
            self.shadow = n;
        }

        let mut ok = self.post_check(SHOW_LEVEL);
        if ok {
            if let Some(after) = self.values() {
                if after.windows(2).any(|w| w[0] == w[1]) {
                    self.violation("Contain duplicate string on queue");
                    ok = false;
                }
            }
        }
        if ok {
            if let Some(before) = before {
                let want = keep_singletons(&before);
                ok = self.expect_values("dedup", &want);
            }
        }
        Ok(ok && !self.heap_check())
    }

    fn walk_singletons(&mut self) -> Option<usize> {
        if !self.check_structure() {
            return None;
        }
        let shadow = self.shadow;
        let q: &Queue = self.queue.as_ref()?;
        Some(singleton_runs(q.iter().take(shadow)))
    }
}

fn keep_singletons(values: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < values.len() {
        let mut j = i + 1;
        while j < values.len() && values[j] == values[i] {
            j += 1;
        }
        if j - i == 1 {
            out.push(values[i].clone());
        }
        i = j;
    }
    out
}
