//! Property-based tests for the stored document format.
//!
//! Any tree the engine can build must survive a write and a load unchanged,
//! and must never be flagged as needing repair.

use std::time::Duration;

use numbered_bookmarks::managers::bookmark_tree::{BookmarkTree, BookmarkTreeTrait};
use numbered_bookmarks::services::document_repair::repair_document;
use numbered_bookmarks::services::persistence::PersistenceService;
use numbered_bookmarks::services::reporter::Reporter;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    Mark(usize, u8, u32),
    Folder(String, Option<usize>),
    Move(usize, Option<usize>),
    Label(usize, Option<String>),
    Collapse(usize),
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0usize..5, 0u8..=9, 0u32..200).prop_map(|(f, n, l)| Step::Mark(f, n, l)),
        ("[A-Za-z ]{1,12}", proptest::option::of(0usize..4))
            .prop_map(|(name, parent)| Step::Folder(name, parent)),
        (0usize..8, proptest::option::of(0usize..4)).prop_map(|(n, t)| Step::Move(n, t)),
        (0usize..5, proptest::option::of("[a-z]{1,10}")).prop_map(|(f, l)| Step::Label(f, l)),
        (0usize..4).prop_map(Step::Collapse),
    ]
}

fn build(steps: &[Step]) -> BookmarkTree {
    let mut tree = BookmarkTree::new();
    let mut folders: Vec<String> = Vec::new();
    let file = |i: usize| format!("dir{}/file{}.rs", i % 2, i);

    for step in steps {
        match step {
            Step::Mark(f, n, l) => {
                tree.set_mark(&file(*f), *n, *l);
            }
            Step::Folder(name, parent) => {
                let parent = parent.and_then(|p| folders.get(p)).cloned();
                folders.push(tree.create_folder(name, parent.as_deref()));
            }
            Step::Move(node, target) => {
                let ids: Vec<String> = tree
                    .bookmarks()
                    .iter()
                    .map(|b| b.id.clone())
                    .chain(folders.iter().cloned())
                    .collect();
                if let Some(id) = ids.get(*node) {
                    let target = target.and_then(|t| folders.get(t)).cloned();
                    tree.move_node(id, target.as_deref());
                }
            }
            Step::Label(f, label) => {
                if let Some(id) = tree.find_bookmark(&file(*f)).map(|b| b.id.clone()) {
                    tree.relabel_bookmark(&id, label.as_deref());
                }
            }
            Step::Collapse(i) => {
                if let Some(id) = folders.get(*i) {
                    tree.set_folder_expanded(id, false);
                }
            }
        }
    }
    tree
}

// **Property: engine-built documents need no repair**
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn built_documents_pass_repair_unchanged(steps in prop::collection::vec(arb_step(), 0..40)) {
        let document = build(&steps).to_document("1.0");
        let value = serde_json::to_value(&document).unwrap();
        let repaired = repair_document(value, "1.0").unwrap();
        prop_assert!(!repaired.changed);
        prop_assert_eq!(repaired.document, document);
    }
}

// **Property: write then load returns the same document**
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn write_then_load_roundtrips(steps in prop::collection::vec(arb_step(), 0..40)) {
        let dir = tempfile::tempdir().unwrap();
        let document = build(&steps).to_document("1.0");

        let mut svc = PersistenceService::new(
            dir.path().join("bookmarks.json"),
            Duration::from_millis(300),
            "1.0",
            Reporter::default(),
        );
        svc.write(&document).unwrap();
        let outcome = svc.load();

        prop_assert!(outcome.error.is_none());
        prop_assert!(!outcome.repaired);
        prop_assert_eq!(outcome.document, document);
    }
}
