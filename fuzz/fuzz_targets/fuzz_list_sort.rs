#![no_main]

use libfuzzer_sys::fuzz_target;

use qtest_rs::stdx::list;
use qtest_rs::{Heap, Queue};

// Each input byte becomes a one-byte value. Both sort paths must produce
// `slice::sort` order and leave a well-formed cycle.
fuzz_target!(|data: &[u8]| {
    let values: Vec<String> = data.iter().map(|b| format!("{:02x}", b % 32)).collect();
    let heap = Heap::new(1);
    let (Some(mut a), Some(mut b)) = (Queue::new(&heap), Queue::new(&heap)) else {
        return;
    };
    for v in &values {
        assert!(a.insert_tail(v));
        assert!(b.insert_tail(v));
    }
    a.sort();
    b.list_sort();

    let mut want = values.clone();
    want.sort();
    let got_a: Vec<&str> = a.iter().collect();
    let got_b: Vec<&str> = b.iter().collect();
    assert_eq!(got_a, want);
    assert_eq!(got_b, want);
    let n = values.len();
    assert_eq!(unsafe { list::check_cycle(a.sentinel(), n) }, Ok(n));
    assert_eq!(unsafe { list::check_cycle(b.sentinel(), n) }, Ok(n));
});
