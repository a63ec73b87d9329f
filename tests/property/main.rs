//! Property tests over the reference engine and the console.
//!
//! Run with: `cargo test --test property`

#[allow(dead_code)]
#[path = "../../src/test_utils.rs"]
mod test_utils;

mod console_ops;
mod queue_laws;
