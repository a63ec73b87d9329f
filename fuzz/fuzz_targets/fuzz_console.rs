#![no_main]

use libfuzzer_sys::fuzz_target;

use qtest_rs::{Config, Console, Reporter, Transcript};

// Interprets a byte stream as a command script for the reference engine.
// The reference engine must never fault fatally, whatever the script.
//
// Byte layout: `(opcode, operand)` pairs.
// - opcode % 16 selects the command; operand picks a value or a count
// - `option` commands only touch the fail probability and the big-list size
const WORDS: [&str; 6] = ["a", "b", "c", "a", "RAND", "Zz"];

fn line(opcode: u8, operand: u8) -> String {
    let word = WORDS[operand as usize % WORDS.len()];
    let count = operand % 8 + 1;
    match opcode % 16 {
        0 => "new".to_string(),
        1 => "free".to_string(),
        2 => format!("ih {word} {count}"),
        3 => format!("it {word} {count}"),
        4 => "rh".to_string(),
        5 => format!("rt {word}"),
        6 => "rhq".to_string(),
        7 => format!("size {count}"),
        8 => "sort".to_string(),
        9 => "sort l".to_string(),
        10 => "reverse".to_string(),
        11 => "swap".to_string(),
        12 => "dm".to_string(),
        13 => "dedup".to_string(),
        14 => "shuffle".to_string(),
        _ if operand % 2 == 0 => format!("option malloc {}", operand % 101),
        _ => format!("option big {}", operand % 40),
    }
}

fuzz_target!(|data: &[u8]| {
    let mut script = String::from("option error 1000000\noption fail 1000000\n");
    for pair in data.chunks_exact(2) {
        script.push_str(&line(pair[0], pair[1]));
        script.push('\n');
    }
    script.push_str("option malloc 0\n");

    let transcript = Transcript::new();
    let reporter = Reporter::new(0, Box::new(transcript));
    let mut console = Console::reference(Config::with_verbosity(0), 7, reporter);
    console.push_script("fuzz", &script);
    console.run();
    let out = console.finish();
    assert!(!out.fatal, "reference engine faulted on:\n{script}");
    assert_eq!(console.context().heap.outstanding(), 0);
});
