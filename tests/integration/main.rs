//! Console-level integration tests.
//!
//! Run with: `cargo test --test integration`

mod faults;
mod scenarios;
mod traces;

use qtest_rs::queue::QueueEngine;
use qtest_rs::{Config, Console, LinkedEngine, Outcome, Reporter, Transcript};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Console over `engine` writing into an in-memory transcript.
pub fn console_with<E: QueueEngine>(engine: E, verbosity: u8) -> (Console<E>, Transcript) {
    init_tracing();
    let transcript = Transcript::new();
    let reporter = Reporter::new(verbosity, Box::new(transcript.clone()));
    let console = Console::new(engine, Config::with_verbosity(verbosity), 42, reporter);
    (console, transcript)
}

/// Run `script` against the reference engine at verbosity 3.
pub fn run_script(script: &str) -> (Outcome, Transcript) {
    run_with(LinkedEngine, script)
}

pub fn run_with<E: QueueEngine>(engine: E, script: &str) -> (Outcome, Transcript) {
    let (mut console, transcript) = console_with(engine, 3);
    console.push_script("script", script);
    console.run();
    (console.finish(), transcript)
}

/// Every `l = [...]` line of the transcript, in order. The `l = NULL` lines
/// printed after a free are skipped.
pub fn shown(t: &Transcript) -> Vec<String> {
    t.lines()
        .into_iter()
        .filter(|l| l.starts_with("l = ["))
        .collect()
}
