//! Random command streams against the reference engine: every command must
//! pass and the queue must match a plain `Vec` model afterwards.

use proptest::prelude::*;
use qtest_rs::{Config, Console, Reporter, Transcript};

use crate::test_utils::proptest_cases;

const CASES: u32 = 32;

#[derive(Clone, Debug)]
enum Op {
    InsertHead(&'static str),
    InsertTail(&'static str),
    RemoveHead,
    RemoveTail,
    RemoveQuiet,
    Size,
    Sort,
    ListSort,
    Reverse,
    Swap,
    DeleteMid,
    SortDedup,
    ShuffleSort,
    Renew,
}

fn op() -> impl Strategy<Value = Op> {
    let word = prop::sample::select(vec!["a", "b", "c", "dd", "Ee"]);
    prop_oneof![
        3 => word.clone().prop_map(Op::InsertHead),
        3 => word.prop_map(Op::InsertTail),
        1 => Just(Op::RemoveHead),
        1 => Just(Op::RemoveTail),
        1 => Just(Op::RemoveQuiet),
        1 => Just(Op::Size),
        1 => Just(Op::Sort),
        1 => Just(Op::ListSort),
        1 => Just(Op::Reverse),
        1 => Just(Op::Swap),
        1 => Just(Op::DeleteMid),
        1 => Just(Op::SortDedup),
        1 => Just(Op::ShuffleSort),
        1 => Just(Op::Renew),
    ]
}

/// Script for `ops` and the values the queue must hold after it. Commands
/// whose failure is the documented outcome (deleting from an empty queue) are
/// skipped.
fn script(ops: &[Op]) -> (String, Vec<String>) {
    let mut out = String::from("option fail 1000\nnew\n");
    let mut model: Vec<String> = Vec::new();
    for op in ops {
        match op {
            Op::InsertHead(w) => {
                out.push_str(&format!("ih {w}\n"));
                model.insert(0, w.to_string());
            }
            Op::InsertTail(w) => {
                out.push_str(&format!("it {w}\n"));
                model.push(w.to_string());
            }
            Op::RemoveHead => {
                match model.first() {
                    Some(v) => out.push_str(&format!("rh {v}\n")),
                    None => out.push_str("rh\n"),
                }
                if !model.is_empty() {
                    model.remove(0);
                }
            }
            Op::RemoveTail => {
                match model.pop() {
                    Some(v) => out.push_str(&format!("rt {v}\n")),
                    None => out.push_str("rt\n"),
                };
            }
            Op::RemoveQuiet => {
                out.push_str("rhq\n");
                if !model.is_empty() {
                    model.remove(0);
                }
            }
            Op::Size => out.push_str("size\n"),
            Op::Sort => {
                out.push_str("sort\n");
                model.sort();
            }
            Op::ListSort => {
                out.push_str("sort l\n");
                model.sort();
            }
            Op::Reverse => {
                out.push_str("reverse\n");
                model.reverse();
            }
            Op::Swap => {
                out.push_str("swap\n");
                for pair in model.chunks_exact_mut(2) {
                    pair.swap(0, 1);
                }
            }
            Op::DeleteMid => {
                if !model.is_empty() {
                    out.push_str("dm\n");
                    model.remove(model.len().div_ceil(2) - 1);
                }
            }
            Op::SortDedup => {
                out.push_str("sort\ndedup\n");
                model.sort();
                let mut kept = Vec::new();
                for (i, v) in model.iter().enumerate() {
                    let left = i > 0 && model[i - 1] == *v;
                    let right = i + 1 < model.len() && model[i + 1] == *v;
                    if !left && !right {
                        kept.push(v.clone());
                    }
                }
                model = kept;
            }
            Op::ShuffleSort => {
                out.push_str("shuffle\nsort\n");
                model.sort();
            }
            Op::Renew => {
                out.push_str("new\n");
                model.clear();
            }
        }
    }
    out.push_str("size\n");
    (out, model)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(proptest_cases(CASES)))]

    #[test]
    fn reference_engine_passes_random_scripts(
        ops in prop::collection::vec(op(), 0..60),
        seed in any::<u64>(),
    ) {
        let (text, model) = script(&ops);
        let transcript = Transcript::new();
        let reporter = Reporter::new(3, Box::new(transcript.clone()));
        let mut console = Console::reference(Config::with_verbosity(3), seed, reporter);
        console.push_script("prop", &text);
        console.run();

        let values = console.context().values().unwrap_or_default();
        prop_assert_eq!(&values, &model);
        prop_assert_eq!(console.context().shadow, model.len());
        let out = console.finish();
        prop_assert!(out.ok, "script:\n{}\ntranscript:\n{}", text, transcript.text());
        prop_assert_eq!(console.context().heap.outstanding(), 0);
    }
}
