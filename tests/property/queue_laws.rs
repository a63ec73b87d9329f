use proptest::prelude::*;
use qtest_rs::stdx::list;
use qtest_rs::{DisplayBuf, Heap, Queue, SimRng};

use crate::test_utils::proptest_cases;

const CASES: u32 = 64;

fn value() -> impl Strategy<Value = String> {
    "[a-e]{1,3}"
}

fn queue_of(heap: &Heap, values: &[String]) -> Queue {
    let mut q = Queue::new(heap).unwrap();
    for v in values {
        assert!(q.insert_tail(v));
    }
    q
}

fn contents(q: &Queue) -> Vec<String> {
    q.iter().map(str::to_string).collect()
}

fn well_formed(q: &Queue, n: usize) -> bool {
    (unsafe { list::check_cycle(q.sentinel(), n) }) == Ok(n)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(proptest_cases(CASES)))]

    #[test]
    fn both_sorts_agree_with_std(values in prop::collection::vec(value(), 0..80)) {
        let heap = Heap::new(3);
        let mut a = queue_of(&heap, &values);
        let mut b = queue_of(&heap, &values);
        a.sort();
        b.list_sort();
        let mut want = values.clone();
        want.sort();
        prop_assert_eq!(contents(&a), want.clone());
        prop_assert_eq!(contents(&b), want);
        prop_assert!(well_formed(&a, values.len()));
        prop_assert!(well_formed(&b, values.len()));
    }

    #[test]
    fn sorts_are_stable(values in prop::collection::vec(value(), 0..60)) {
        let heap = Heap::new(3);
        let mut a = queue_of(&heap, &values);
        let mut b = queue_of(&heap, &values);
        // Address order equals insertion order only by accident, so tag each
        // block with its position before sorting.
        let tags = |q: &Queue| -> Vec<(String, usize)> {
            q.iter().map(|s| s.to_string()).zip(0..).collect()
        };
        let mut want = tags(&a);
        want.sort_by(|x, y| x.0.cmp(&y.0));
        let before_a: Vec<_> = a.iter().map(|s| s.as_ptr()).collect();
        let before_b: Vec<_> = b.iter().map(|s| s.as_ptr()).collect();
        a.sort();
        b.list_sort();
        let order = |q: &Queue, before: &[*const u8]| -> Vec<usize> {
            q.iter()
                .map(|s| before.iter().position(|p| *p == s.as_ptr()).unwrap())
                .collect()
        };
        let want_order: Vec<usize> = want.iter().map(|(_, i)| *i).collect();
        prop_assert_eq!(order(&a, &before_a), want_order.clone());
        prop_assert_eq!(order(&b, &before_b), want_order);
    }

    #[test]
    fn reverse_is_an_involution(values in prop::collection::vec(value(), 0..50)) {
        let heap = Heap::new(3);
        let mut q = queue_of(&heap, &values);
        q.reverse();
        let mut rev = values.clone();
        rev.reverse();
        prop_assert_eq!(contents(&q), rev);
        q.reverse();
        prop_assert_eq!(contents(&q), values.clone());
        prop_assert!(well_formed(&q, values.len()));
    }

    #[test]
    fn dedup_is_idempotent(mut values in prop::collection::vec(value(), 0..60)) {
        values.sort();
        let heap = Heap::new(3);
        let mut q = queue_of(&heap, &values);
        prop_assert!(q.delete_dup());
        let once = contents(&q);
        prop_assert!(once.windows(2).all(|w| w[0] != w[1]));
        prop_assert!(q.delete_dup());
        prop_assert_eq!(contents(&q), once);
    }

    #[test]
    fn delete_mid_removes_ceil_half(values in prop::collection::vec(value(), 1..40)) {
        let heap = Heap::new(3);
        let mut q = queue_of(&heap, &values);
        let before = heap.outstanding();
        prop_assert!(q.delete_mid());
        let mut want = values.clone();
        want.remove(values.len().div_ceil(2) - 1);
        prop_assert_eq!(contents(&q), want);
        prop_assert_eq!(heap.outstanding(), before - 2);
    }

    #[test]
    fn size_tracks_inserts_and_removes(ops in prop::collection::vec(0u8..4, 0..100)) {
        let heap = Heap::new(3);
        let mut q = Queue::new(&heap).unwrap();
        let mut shadow = 0usize;
        for op in ops {
            match op {
                0 => { prop_assert!(q.insert_head("h")); shadow += 1; }
                1 => { prop_assert!(q.insert_tail("t")); shadow += 1; }
                2 => if q.remove_head(None).is_some() { shadow -= 1; },
                _ => if q.remove_tail(None).is_some() { shadow -= 1; },
            }
            prop_assert_eq!(q.size(), shadow);
        }
        drop(q);
        prop_assert_eq!(heap.outstanding(), 0);
    }

    #[test]
    fn removal_never_touches_guard(s in "[a-z]{0,40}", cap in 1usize..20) {
        let heap = Heap::new(3);
        let mut q = Queue::new(&heap).unwrap();
        prop_assert!(q.insert_tail(&s));
        let mut buf = DisplayBuf::new(cap, 16);
        let removed = q.remove_head(Some(&mut buf));
        prop_assert!(removed.is_some());
        prop_assert!(buf.guard_intact());
        let n = s.len().min(cap - 1);
        prop_assert_eq!(buf.as_bytes(), &s.as_bytes()[..n]);
    }

    #[test]
    fn full_failure_rate_never_changes_heap(values in prop::collection::vec(value(), 0..20)) {
        let heap = Heap::new(3);
        let mut q = Queue::new(&heap).unwrap();
        heap.set_fail_percent(100);
        for v in &values {
            prop_assert!(!q.insert_head(v));
            prop_assert!(!q.insert_tail(v));
        }
        prop_assert_eq!(heap.outstanding(), 1);
        prop_assert_eq!(heap.take_error(), None);
    }

    #[test]
    fn shuffle_is_a_permutation(values in prop::collection::vec(value(), 0..50), seed in any::<u64>()) {
        let heap = Heap::new(3);
        let mut q = queue_of(&heap, &values);
        q.shuffle(&mut SimRng::new(seed));
        let mut got = contents(&q);
        let mut want = values.clone();
        got.sort();
        want.sort();
        prop_assert_eq!(got, want);
        prop_assert!(well_formed(&q, values.len()));
    }
}
