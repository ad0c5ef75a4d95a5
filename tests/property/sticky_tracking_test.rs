//! Property-based tests for sticky line tracking.

use std::collections::BTreeMap;

use numbered_bookmarks::managers::sticky_tracker::adjust_numbers;
use numbered_bookmarks::types::events::EditDelta;
use proptest::prelude::*;

fn arb_numbers() -> impl Strategy<Value = BTreeMap<u8, u32>> {
    prop::collection::btree_map(0u8..=9, 0u32..500, 0..10).prop_map(|map| {
        // One number per line.
        let mut seen = std::collections::HashSet::new();
        map.into_iter().filter(|(_, l)| seen.insert(*l)).collect()
    })
}

// **Property: marks at or above the edit never move**
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn marks_before_edit_are_untouched(
        numbers in arb_numbers(),
        start in 0u32..500,
        span in 0u32..50,
        inserted in 0u32..50,
    ) {
        let mut adjusted = numbers.clone();
        adjust_numbers(&mut adjusted, &EditDelta::new(start, start + span, inserted));
        for (n, line) in numbers.iter().filter(|(_, l)| **l <= start) {
            prop_assert_eq!(adjusted.get(n), Some(line));
        }
    }
}

// **Property: marks below the edit shift by exactly the line delta**
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn marks_after_edit_shift_by_delta(
        numbers in arb_numbers(),
        start in 0u32..500,
        span in 0u32..50,
        inserted in 0u32..50,
    ) {
        let edit = EditDelta::new(start, start + span, inserted);
        let mut adjusted = numbers.clone();
        adjust_numbers(&mut adjusted, &edit);
        for (n, line) in numbers.iter().filter(|(_, l)| **l > start + span) {
            let expected = i64::from(*line) + edit.line_delta();
            prop_assert_eq!(adjusted.get(n).map(|l| i64::from(*l)), Some(expected));
        }
    }
}

// **Property: pure insertions never drop marks and keep them distinct**
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn insertions_keep_every_mark(
        numbers in arb_numbers(),
        at in 0u32..500,
        count in 0u32..100,
    ) {
        let mut adjusted = numbers.clone();
        let outcome = adjust_numbers(&mut adjusted, &EditDelta::insert(at, count));
        prop_assert_eq!(outcome.removed, 0);
        prop_assert_eq!(adjusted.len(), numbers.len());
        let mut lines: Vec<u32> = adjusted.values().copied().collect();
        lines.sort_unstable();
        lines.dedup();
        prop_assert_eq!(lines.len(), numbers.len());
    }
}
