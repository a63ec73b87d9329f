//! Leveled protocol output.
//!
//! The transcript a user sees: one line per message, printed when the
//! message level is at or below the configured verbosity, and mirrored into
//! an optional log file. Diagnostics for developers go through `tracing`
//! instead.

use std::cell::RefCell;
use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::rc::Rc;

pub struct Reporter {
    verbosity: u8,
    out: Box<dyn Write>,
    log: Option<BufWriter<File>>,
}

impl Reporter {
    pub fn new(verbosity: u8, out: Box<dyn Write>) -> Self {
        Self {
            verbosity,
            out,
            log: None,
        }
    }

    pub fn stdout(verbosity: u8) -> Self {
        Self::new(verbosity, Box::new(io::stdout()))
    }

    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: u8) {
        self.verbosity = verbosity;
    }

    /// Returns `true` if a message at `level` would be printed.
    pub fn enabled(&self, level: u8) -> bool {
        level <= self.verbosity
    }

    /// Mirror every printed line into `path`, replacing any earlier log.
    pub fn set_log(&mut self, path: &Path) -> io::Result<()> {
        let file = File::create(path)?;
        self.close_log();
        self.log = Some(BufWriter::new(file));
        Ok(())
    }

    pub fn close_log(&mut self) {
        if let Some(mut log) = self.log.take() {
            let _ = log.flush();
        }
    }

    /// Print `msg` if `level` is enabled. Output errors are ignored; the
    /// transcript is best effort.
    pub fn report(&mut self, level: u8, msg: impl Display) {
        if !self.enabled(level) {
            return;
        }
        let line = format!("{msg}\n");
        let _ = self.out.write_all(line.as_bytes());
        if let Some(log) = self.log.as_mut() {
            let _ = log.write_all(line.as_bytes());
        }
    }

    /// Level-1 line prefixed with `ERROR: `.
    pub fn error(&mut self, msg: impl Display) {
        self.report(1, format_args!("ERROR: {msg}"));
    }

    /// Level-1 line for a malformed queue, prefixed with `ERROR:  `.
    pub fn structure_error(&mut self, msg: impl Display) {
        self.report(1, format_args!("ERROR:  {msg}"));
    }

    pub fn flush(&mut self) {
        let _ = self.out.flush();
        if let Some(log) = self.log.as_mut() {
            let _ = log.flush();
        }
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        self.flush();
    }
}

/// In-memory sink that can be read back while a console still writes to it.
#[derive(Clone, Default)]
pub struct Transcript {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.buf.borrow()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(str::to_string).collect()
    }
}

impl Write for Transcript {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
