//! Replays the bundled command scripts under `traces/`.

use std::path::{Path, PathBuf};

use qtest_rs::LinkedEngine;

use super::console_with;

fn trace_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("traces")
}

fn replay(name: &str) {
    let (mut console, t) = console_with(LinkedEngine, 3);
    console
        .push_file(&trace_dir().join(name))
        .unwrap_or_else(|e| panic!("{name}: {e}"));
    console.run();
    let out = console.finish();
    assert!(out.ok, "{name} failed:\n{}", t.text());
    assert_eq!(console.context().heap.outstanding(), 0, "{name} leaked");
}

#[test]
fn trace_01_ops() {
    replay("trace-01-ops.cmd");
}

#[test]
fn trace_02_reorder() {
    replay("trace-02-reorder.cmd");
}

#[test]
fn trace_03_sort_dedup() {
    replay("trace-03-sort-dedup.cmd");
}

#[test]
fn trace_04_malloc() {
    replay("trace-04-malloc.cmd");
}

#[test]
fn trace_05_big() {
    replay("trace-05-big.cmd");
}

#[test]
fn trace_06_absent() {
    replay("trace-06-absent.cmd");
}

#[test]
fn every_trace_is_listed() {
    let mut names: Vec<String> = std::fs::read_dir(trace_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".cmd"))
        .collect();
    names.sort();
    assert_eq!(
        names,
        [
            "trace-01-ops.cmd",
            "trace-02-reorder.cmd",
            "trace-03-sort-dedup.cmd",
            "trace-04-malloc.cmd",
            "trace-05-big.cmd",
            "trace-06-absent.cmd",
        ]
    );
}

#[test]
fn log_copies_transcript() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("run.log");
    let (mut console, _) = console_with(LinkedEngine, 3);
    console.push_script("script", &format!("log {}\nnew\nit a\n", log.display()));
    console.run();
    assert!(console.finish().ok);
    let text = std::fs::read_to_string(&log).unwrap();
    assert!(text.contains("l = [a]"), "{text}");
}
