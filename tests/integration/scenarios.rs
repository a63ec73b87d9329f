use super::{console_with, run_script, shown};
use qtest_rs::LinkedEngine;

#[test]
fn insert_at_both_ends() {
    let (out, t) = run_script("new\nih a\nih b\nit c\nsize\n");
    assert!(out.ok, "{}", t.text());
    assert_eq!(shown(&t).last().map(String::as_str), Some("l = [b a c]"));
    assert!(t.text().contains("Queue size = 3"));
}

#[test]
fn both_sort_paths_agree() {
    let (out, t) = run_script("new\nit c\nit a\nit b\nsort\nfree\nnew\nit c\nit a\nit b\nsort l\n");
    assert!(out.ok, "{}", t.text());
    let sorted: Vec<_> = shown(&t)
        .into_iter()
        .filter(|l| l == "l = [a b c]")
        .collect();
    assert_eq!(sorted.len(), 2);
}

#[test]
fn dedup_keeps_singletons() {
    let (out, t) = run_script("new\nit a\nit a\nit b\nit c\nit c\ndedup\nsize\n");
    assert!(out.ok, "{}", t.text());
    assert!(shown(&t).contains(&"l = [b]".to_string()));
    assert!(t.text().contains("Queue size = 1"));
}

#[test]
fn dedup_is_idempotent() {
    let (out, t) = run_script("new\nit a\nit b\nit b\nit c\ndedup\ndedup\n");
    assert!(out.ok, "{}", t.text());
    let lines = shown(&t);
    assert_eq!(lines[lines.len() - 1], "l = [a c]");
    assert_eq!(lines[lines.len() - 2], "l = [a c]");
}

#[test]
fn delete_middle_of_six() {
    let (out, t) = run_script("new\nit a\nit b\nit c\nit d\nit e\nit f\ndm\n");
    assert!(out.ok, "{}", t.text());
    assert_eq!(shown(&t).last().map(String::as_str), Some("l = [a b d e f]"));
}

#[test]
fn delete_middle_positions() {
    let cases = [
        (1, "l = []"),
        (2, "l = [v1]"),
        (3, "l = [v0 v2]"),
        (4, "l = [v0 v2 v3]"),
        (5, "l = [v0 v1 v3 v4]"),
    ];
    for (n, want) in cases {
        let mut script = String::from("new\n");
        for i in 0..n {
            script.push_str(&format!("it v{i}\n"));
        }
        script.push_str("dm\n");
        let (out, t) = run_script(&script);
        assert!(out.ok, "n={n}: {}", t.text());
        assert_eq!(shown(&t).last().map(String::as_str), Some(want), "n={n}");
    }
}

#[test]
fn pairwise_swap() {
    let (out, t) = run_script("new\nit a\nit b\nit c\nit d\nswap\nit e\nswap\n");
    assert!(out.ok, "{}", t.text());
    let lines = shown(&t);
    assert!(lines.contains(&"l = [b a d c]".to_string()));
    assert_eq!(lines.last().map(String::as_str), Some("l = [a b c d e]"));
}

#[test]
fn reverse_twice_restores_order() {
    let (out, t) = run_script("new\nit a\nit b\nit c\nreverse\nreverse\n");
    assert!(out.ok, "{}", t.text());
    let lines = shown(&t);
    assert_eq!(lines[lines.len() - 2], "l = [c b a]");
    assert_eq!(lines[lines.len() - 1], "l = [a b c]");
}

#[test]
fn remove_checks_expected_value() {
    let (out, t) = run_script("new\nit a\nit b\nrh a\nrt c\n");
    assert!(!out.ok);
    assert_eq!(out.errors, 1);
    let text = t.text();
    assert!(text.contains("Removed a from queue"));
    assert!(text.contains("ERROR: Removed value b != expected value c"));
}

#[test]
fn remove_truncates_to_configured_length() {
    let (out, t) = run_script("option length 3\nnew\nit abcdefgh\nrh abc\n");
    assert!(out.ok, "{}", t.text());
    assert!(t.text().contains("Removed abc from queue"));
}

#[test]
fn operations_on_absent_queue_warn() {
    let (out, t) = run_script("ih a\nsize\nreverse\nsort\n");
    let text = t.text();
    assert!(text.contains("Warning: Calling insert head on null queue"));
    assert!(text.contains("Warning: Calling size on null queue"));
    assert!(text.contains("Warning: Calling reverse on null queue"));
    assert!(text.contains("Warning: Calling sort on null queue"));
    assert!(out.ok, "{text}");
}

#[test]
fn full_allocation_failure_leaves_heap_unchanged() {
    let (mut console, t) = console_with(LinkedEngine, 3);
    assert!(console.run_line("new"));
    let before = console.context().heap.outstanding();
    assert!(console.run_line("option malloc 100"));
    assert!(console.run_line("ih a 5"));
    assert!(console.run_line("it RAND 5"));
    assert_eq!(console.context().heap.outstanding(), before);
    assert_eq!(console.context().shadow, 0);
    assert!(t.text().contains("Insertion of a failed"));
    assert!(console.context().heap.injected_failures() >= 10);
    assert!(console.run_line("option malloc 0"));
    assert!(console.finish().ok);
}

#[test]
fn repeated_failures_escalate() {
    let (out, t) = run_script("new\noption malloc 100\noption fail 3\nih a 5\n");
    assert!(!out.ok);
    assert!(t.text().contains("ERROR: Insertion of a failed (3 failures total)"));
}

#[test]
fn rand_values_are_lowercase_and_bounded() {
    let (mut console, _) = console_with(LinkedEngine, 1);
    assert!(console.run_line("new"));
    assert!(console.run_line("it RAND 50"));
    let values = console.context().values().unwrap();
    assert_eq!(values.len(), 50);
    for v in &values {
        assert!((5..10).contains(&v.len()), "{v}");
        assert!(v.bytes().all(|b| b.is_ascii_lowercase()), "{v}");
    }
    assert!(console.finish().ok);
}

#[test]
fn big_queue_display_truncates() {
    let (out, t) = run_script("option big 3\nnew\nit RAND 5\nsort\nshuffle\nfree\n");
    assert!(out.ok, "{}", t.text());
    assert!(shown(&t).iter().any(|l| l.ends_with(" ... ]")));
}

#[test]
fn shuffle_preserves_values() {
    let mut script = String::from("new\n");
    for i in 0..20 {
        script.push_str(&format!("it v{i:02}\n"));
    }
    script.push_str("shuffle\nsort\n");
    let (out, t) = run_script(&script);
    assert!(out.ok, "{}", t.text());
}

#[test]
fn same_seed_replays_rand_and_shuffle() {
    let run = || {
        let (mut console, _) = console_with(LinkedEngine, 1);
        console.run_line("new");
        console.run_line("it RAND 10");
        console.run_line("shuffle");
        let values = console.context().values().unwrap();
        console.finish();
        values
    };
    assert_eq!(run(), run());
}
