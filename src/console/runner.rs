//! Command loop.
//!
//! Reads lines from a stack of inputs (the `source` command pushes a file on
//! top), dispatches each through the static command table, and counts failed
//! commands. The loop stops on `quit`, on end of input, when the error limit
//! is reached, or after a fatal fault.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::queue::{LinkedEngine, QueueEngine};
use crate::sim::artifact::{CrashDump, CRASH_DUMP_SCHEMA_VERSION};
use crate::sim::trace::TraceEvent;

use super::command::{self, CommandKind, CommandSpec, Line, COMMANDS};
use super::config::{Config, OPTIONS};
use super::context::{RunContext, TimedOp, TimingOracle};
use super::error::CommandError;
use super::handlers::End;
use super::report::Reporter;

struct Input {
    name: String,
    reader: Box<dyn BufRead>,
}

/// Final state of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    /// Every command passed and teardown released everything.
    pub ok: bool,
    /// Number of failed commands.
    pub errors: u32,
    /// The run ended on an illegal access.
    pub fatal: bool,
}

pub struct Console<E: QueueEngine = LinkedEngine> {
    ctx: RunContext<E>,
    inputs: Vec<Input>,
    errors: u32,
    quit: bool,
    torn_down: bool,
    teardown_ok: bool,
}

impl Console<LinkedEngine> {
    /// Console over the reference engine.
    pub fn reference(config: Config, seed: u64, reporter: Reporter) -> Self {
        Self::new(LinkedEngine, config, seed, reporter)
    }
}

impl<E: QueueEngine> Console<E> {
    pub fn new(engine: E, config: Config, seed: u64, reporter: Reporter) -> Self {
        Self {
            ctx: RunContext::new(engine, config, seed, reporter),
            inputs: Vec::new(),
            errors: 0,
            quit: false,
            torn_down: false,
            teardown_ok: true,
        }
    }

    pub fn with_oracle(mut self, oracle: Box<dyn TimingOracle>) -> Self {
        self.ctx.oracle = Some(oracle);
        self
    }

    pub fn context(&self) -> &RunContext<E> {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut RunContext<E> {
        &mut self.ctx
    }

    pub fn errors(&self) -> u32 {
        self.errors
    }

    /// Read from `reader` before resuming the current input.
    pub fn push_input(&mut self, name: impl Into<String>, reader: Box<dyn BufRead>) {
        self.inputs.push(Input {
            name: name.into(),
            reader,
        });
    }

    pub fn push_file(&mut self, path: &Path) -> Result<(), CommandError> {
        let file = File::open(path).map_err(|source| CommandError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        self.push_input(path.display().to_string(), Box::new(BufReader::new(file)));
        Ok(())
    }

    pub fn push_script(&mut self, name: &str, script: &str) {
        let reader = std::io::Cursor::new(script.as_bytes().to_vec());
        self.push_input(name, Box::new(reader));
    }

    fn stopped(&self) -> bool {
        self.quit || self.ctx.is_fatal()
    }

    fn next_line(&mut self) -> Option<String> {
        while let Some(input) = self.inputs.last_mut() {
            let mut line = String::new();
            match input.reader.read_line(&mut line) {
                Ok(0) => {
                    self.inputs.pop();
                }
                Ok(_) => return Some(line),
                Err(err) => {
                    tracing::warn!(input = %input.name, error = %err, "input read failed");
                    self.inputs.pop();
                }
            }
        }
        None
    }

    /// Execute lines until the inputs run dry or the console stops.
    pub fn run(&mut self) {
        while !self.stopped() {
            let Some(line) = self.next_line() else {
                break;
            };
            if !self.run_line(&line) {
                self.errors += 1;
                if self.errors >= self.ctx.config.error_limit && !self.stopped() {
                    self.ctx
                        .reporter
                        .report(1, "Error limit exceeded.  Stopping command execution");
                    self.quit = true;
                }
            }
        }
    }

    /// Echo and execute one line. Returns `false` if the command failed.
    pub fn run_line(&mut self, line: &str) -> bool {
        let line = line.trim_end_matches(['\n', '\r']);
        match command::parse_line(line) {
            Line::Blank => true,
            Line::Comment => {
                self.echo(line);
                true
            }
            Line::Command { name, args } => {
                self.echo(line);
                self.ctx.command_index += 1;
                self.ctx.current_line = line.to_string();
                self.ctx.trace.push(TraceEvent::Command {
                    index: self.ctx.command_index,
                    line: line.to_string(),
                });
                let ok = self.dispatch(name, &args);
                self.ctx.trace.push(TraceEvent::Verdict {
                    index: self.ctx.command_index,
                    ok,
                });
                ok
            }
        }
    }

    fn echo(&mut self, line: &str) {
        if self.ctx.config.echo {
            self.ctx.reporter.report(1, format_args!("cmd> {line}"));
        }
    }

    fn dispatch(&mut self, name: &str, args: &[&str]) -> bool {
        let Some(spec) = command::lookup(name) else {
            self.ctx
                .reporter
                .report(1, CommandError::UnknownCommand(name.to_string()));
            return false;
        };
        tracing::debug!(command = spec.name, ?args, "dispatch");

        let checked = if spec.simulated && self.ctx.config.simulation {
            Ok(())
        } else {
            spec.arity.check(name, args.len())
        };
        let result = checked.and_then(|()| self.execute(spec, name, args));
        match result {
            Ok(ok) => ok,
            Err(err) => {
                self.ctx.reporter.report(1, &err);
                false
            }
        }
    }

    fn execute(
        &mut self,
        spec: &'static CommandSpec,
        name: &str,
        args: &[&str],
    ) -> Result<bool, CommandError> {
        let ctx = &mut self.ctx;
        match spec.kind {
            CommandKind::New => ctx.do_new(),
            CommandKind::Free => ctx.do_free(),
            CommandKind::InsertHead => ctx.do_insert(name, End::Head, args),
            CommandKind::InsertTail => ctx.do_insert(name, End::Tail, args),
            CommandKind::RemoveHead => ctx.do_remove(name, End::Head, args),
            CommandKind::RemoveTail => ctx.do_remove(name, End::Tail, args),
            CommandKind::RemoveHeadQuiet => ctx.do_remove_quiet(),
            CommandKind::Size => ctx.do_size(args),
            CommandKind::Sort => ctx.do_sort(args),
            CommandKind::Reverse => ctx.do_reverse(),
            CommandKind::Swap => ctx.do_swap(),
            CommandKind::DeleteMid => ctx.do_delete_mid(),
            CommandKind::DeleteDup => ctx.do_dedup(),
            CommandKind::Shuffle => ctx.do_shuffle(),
            CommandKind::Show => Ok(ctx.post_check(0)),
            CommandKind::Help => {
                self.help();
                Ok(true)
            }
            CommandKind::Quit => {
                self.quit = true;
                Ok(self.teardown())
            }
            CommandKind::Option => self.option(name, args),
            CommandKind::Source => {
                self.push_file(Path::new(args[0]))?;
                Ok(true)
            }
            CommandKind::Log => {
                let path = PathBuf::from(args[0]);
                self.ctx
                    .reporter
                    .set_log(&path)
                    .map_err(|source| CommandError::Unreadable { path, source })?;
                Ok(true)
            }
            CommandKind::Time => {
                let start = Instant::now();
                let rest = args[1..].join(" ");
                let ok = self.dispatch(args[0], &args[1..]);
                let delta = start.elapsed().as_secs_f64();
                tracing::debug!(command = %args[0], rest = %rest, delta, "timed");
                self.ctx
                    .reporter
                    .report(1, format_args!("Delta time = {delta:.3}"));
                Ok(ok)
            }
        }
    }

    fn help(&mut self) {
        let r = &mut self.ctx.reporter;
        r.report(1, "Commands:");
        for spec in COMMANDS {
            r.report(1, format_args!("\t{:<8} {:<14} | {}", spec.name, spec.usage, spec.doc));
        }
        self.list_options();
    }

    fn list_options(&mut self) {
        let ctx = &mut self.ctx;
        ctx.reporter.report(1, "Options:");
        for spec in OPTIONS {
            let value = (spec.get)(&ctx.config);
            ctx.reporter
                .report(1, format_args!("\t{}\t{}\t{}", spec.name, value, spec.doc));
        }
    }

    fn option(&mut self, name: &str, args: &[&str]) -> Result<bool, CommandError> {
        match args {
            [] => {
                self.list_options();
                Ok(true)
            }
            [opt, value] => {
                let value = command::parse_int("value", value)?;
                self.ctx.config.set(opt, value)?;
                self.ctx.sync_config();
                Ok(true)
            }
            _ => Err(CommandError::arity(name, "takes 0 or 2 arguments")),
        }
    }

    /// Release the queue at the end of a run. Runs at most once and never
    /// after a fatal fault.
    fn teardown(&mut self) -> bool {
        if self.torn_down {
            return self.teardown_ok;
        }
        self.torn_down = true;
        if self.ctx.is_fatal() {
            // The queue is in an unknown state.
            std::mem::forget(self.ctx.queue.take());
            self.teardown_ok = false;
            return false;
        }
        self.ctx.reporter.report(3, "Freeing queue");
        self.teardown_ok = self.ctx.release_queue();
        self.teardown_ok
    }

    /// Run teardown if `quit` did not, and report the overall outcome.
    pub fn finish(&mut self) -> Outcome {
        let clean = self.teardown();
        self.ctx.reporter.flush();
        Outcome {
            ok: clean && self.errors == 0 && !self.ctx.is_fatal(),
            errors: self.errors,
            fatal: self.ctx.is_fatal(),
        }
    }

    /// Crash artifact for a run that ended on a fatal fault.
    pub fn crash_dump(&self) -> Option<CrashDump> {
        let fault = self.ctx.fatal.as_ref()?;
        Some(CrashDump {
            schema_version: CRASH_DUMP_SCHEMA_VERSION,
            package_version: env!("CARGO_PKG_VERSION").to_string(),
            seed: self.ctx.seed,
            config: self.ctx.config.clone(),
            command: self.ctx.current_line.clone(),
            fault: fault.to_string(),
            detail: fault.detail().map(str::to_string),
            trace: self.ctx.trace.dump(),
        })
    }
}

/// An oracle that gives the same answer for every operation.
#[derive(Clone, Copy, Debug)]
pub struct FixedOracle(pub bool);

impl TimingOracle for FixedOracle {
    fn is_constant_time(&mut self, _op: TimedOp) -> bool {
        self.0
    }
}
