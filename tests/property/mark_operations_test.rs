//! Property-based tests for numbered-mark operations on the bookmark tree.
//!
//! These tests check the per-file invariants under arbitrary sequences of
//! toggles, sets and clears: one node per file, no empty nodes, at most one
//! number per line, and numbers confined to 0..=9.

use std::collections::HashSet;

use numbered_bookmarks::managers::bookmark_tree::{BookmarkTree, BookmarkTreeTrait};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Toggle(String, u8, u32),
    Set(String, u8, u32),
    Clear(String, u8),
}

fn arb_file() -> impl Strategy<Value = String> {
    prop_oneof![Just("a.rs"), Just("b.rs"), Just("src/c.rs")].prop_map(String::from)
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (arb_file(), 0u8..=9, 0u32..20).prop_map(|(f, n, l)| Op::Toggle(f, n, l)),
        (arb_file(), 0u8..=9, 0u32..20).prop_map(|(f, n, l)| Op::Set(f, n, l)),
        (arb_file(), 0u8..=9).prop_map(|(f, n)| Op::Clear(f, n)),
    ]
}

fn apply(tree: &mut BookmarkTree, op: &Op) {
    match op {
        Op::Toggle(f, n, l) => {
            tree.toggle_mark(f, *n, *l);
        }
        Op::Set(f, n, l) => {
            tree.set_mark(f, *n, *l);
        }
        Op::Clear(f, n) => {
            tree.clear_mark(f, *n);
        }
    }
}

fn check_invariants(tree: &BookmarkTree) -> Result<(), TestCaseError> {
    let mut files = HashSet::new();
    for bookmark in tree.bookmarks() {
        prop_assert!(files.insert(bookmark.file_path.clone()), "duplicate node for {}", bookmark.file_path);
        prop_assert!(!bookmark.numbers.is_empty());
        let mut lines = HashSet::new();
        for (number, line) in &bookmark.numbers {
            prop_assert!(*number <= 9);
            prop_assert!(lines.insert(*line), "line {} carries two numbers", line);
        }
        prop_assert!(bookmark.updated_at >= bookmark.created_at);
    }
    Ok(())
}

// **Property: tree invariants survive any mark sequence**
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn mark_sequences_preserve_invariants(ops in prop::collection::vec(arb_op(), 1..60)) {
        let mut tree = BookmarkTree::new();
        for op in &ops {
            apply(&mut tree, op);
            check_invariants(&tree)?;
        }
    }
}

// **Property: toggling a fresh mark twice restores the file's marks**
//
// Starting from any mark set where `number` is absent and `line` is free,
// toggling (file, number, line) twice leaves the marks exactly as before.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn toggle_twice_is_identity(
        setup in prop::collection::vec((0u8..=9, 0u32..20), 0..6),
        number in 0u8..=9,
        line in 20u32..40,
    ) {
        let mut tree = BookmarkTree::new();
        for (n, l) in setup.iter().filter(|(n, _)| *n != number) {
            tree.set_mark("a.rs", *n, *l);
        }
        let before = tree.find_bookmark("a.rs").map(|b| b.numbers.clone());

        prop_assert!(tree.toggle_mark("a.rs", number, line));
        prop_assert!(tree.toggle_mark("a.rs", number, line));

        let after = tree.find_bookmark("a.rs").map(|b| b.numbers.clone());
        prop_assert_eq!(before, after);
    }
}

// **Property: a later number takes over the line**
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn set_mark_on_taken_line_evicts_previous(
        n in 0u8..=9,
        m in 0u8..=9,
        line in 0u32..1000,
    ) {
        prop_assume!(n != m);
        let mut tree = BookmarkTree::new();
        tree.set_mark("a.rs", n, line);
        tree.set_mark("a.rs", m, line);
        let bookmark = tree.find_bookmark("a.rs").unwrap();
        prop_assert_eq!(bookmark.line_of(n), None);
        prop_assert_eq!(bookmark.line_of(m), Some(line));
    }
}

// **Property: clearing the last mark removes the node**
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn clearing_every_mark_removes_node(
        marks in prop::collection::btree_map(0u8..=9, 0u32..100, 1..10),
    ) {
        let mut tree = BookmarkTree::new();
        for (n, l) in &marks {
            tree.set_mark("a.rs", *n, *l);
        }
        let present: Vec<u8> = tree.find_bookmark("a.rs").unwrap().numbers.keys().copied().collect();
        for n in present {
            tree.clear_mark("a.rs", n);
        }
        prop_assert!(tree.find_bookmark("a.rs").is_none());
        prop_assert!(tree.is_empty());
    }
}
