//! Unit tests for the bookmark tree through `BookmarkTreeTrait`.
//!
//! Covers numbered-mark CRUD, folder structure edits, and path-based
//! re-keying used by reconciliation.

use numbered_bookmarks::managers::bookmark_tree::{BookmarkTree, BookmarkTreeTrait};
use numbered_bookmarks::types::bookmark::TreeNode;

fn marks(tree: &BookmarkTree, file: &str) -> Vec<(u8, u32)> {
    tree.find_bookmark(file)
        .map(|b| b.numbers.iter().map(|(n, l)| (*n, *l)).collect())
        .unwrap_or_default()
}

#[test]
fn test_relocate_then_clear_scenario() {
    let mut tree = BookmarkTree::new();
    tree.toggle_mark("a.ts", 1, 10);
    tree.toggle_mark("a.ts", 3, 20);

    tree.toggle_mark("a.ts", 1, 70);
    assert_eq!(marks(&tree, "a.ts"), vec![(1, 70), (3, 20)]);

    tree.clear_mark("a.ts", 3);
    assert_eq!(marks(&tree, "a.ts"), vec![(1, 70)]);

    tree.clear_mark("a.ts", 1);
    assert!(tree.find_bookmark("a.ts").is_none());
    assert!(tree.is_empty());
}

#[test]
fn test_toggle_same_line_twice_removes() {
    let mut tree = BookmarkTree::new();
    assert!(tree.toggle_mark("a.rs", 2, 5));
    assert!(tree.toggle_mark("a.rs", 2, 5));
    assert!(tree.find_bookmark("a.rs").is_none());
}

#[test]
fn test_toggle_existing_number_twice_relocates_then_removes() {
    let mut tree = BookmarkTree::new();
    tree.set_mark("a.rs", 1, 5);
    tree.set_mark("a.rs", 2, 8);

    assert!(tree.toggle_mark("a.rs", 1, 12));
    assert_eq!(marks(&tree, "a.rs"), vec![(1, 12), (2, 8)]);

    assert!(tree.toggle_mark("a.rs", 1, 12));
    assert_eq!(marks(&tree, "a.rs"), vec![(2, 8)]);
}

#[test]
fn test_set_mark_steals_line() {
    let mut tree = BookmarkTree::new();
    tree.set_mark("a.rs", 1, 8);
    tree.set_mark("a.rs", 2, 8);
    assert_eq!(marks(&tree, "a.rs"), vec![(2, 8)]);
}

#[test]
fn test_out_of_range_number_is_ignored() {
    let mut tree = BookmarkTree::new();
    assert!(!tree.set_mark("a.rs", 10, 1));
    assert!(!tree.toggle_mark("a.rs", 42, 1));
    assert!(tree.is_empty());
}

#[test]
fn test_one_bookmark_node_per_file() {
    let mut tree = BookmarkTree::new();
    for n in 0..=9 {
        tree.set_mark("a.rs", n, u32::from(n) * 10);
    }
    assert_eq!(tree.bookmarks().len(), 1);
    assert_eq!(marks(&tree, "a.rs").len(), 10);
}

#[test]
fn test_create_folder_unknown_parent_falls_back_to_root() {
    let mut tree = BookmarkTree::new();
    let id = tree.create_folder("Work", Some("missing"));
    assert_eq!(tree.items().len(), 1);
    assert_eq!(tree.items()[0].id(), id);
    assert_eq!(tree.parent_of(&id), None);
}

#[test]
fn test_move_into_folder_and_back() {
    let mut tree = BookmarkTree::new();
    let folder = tree.create_folder("Work", None);
    tree.set_mark("a.rs", 1, 1);
    let bookmark_id = tree.find_bookmark("a.rs").unwrap().id.clone();

    assert!(tree.move_node(&bookmark_id, Some(&folder)));
    assert_eq!(tree.parent_of(&bookmark_id), Some(folder.clone()));

    assert!(tree.move_node(&bookmark_id, None));
    assert_eq!(tree.parent_of(&bookmark_id), None);
}

#[test]
fn test_move_into_own_descendant_is_rejected() {
    let mut tree = BookmarkTree::new();
    let outer = tree.create_folder("Outer", None);
    let inner = tree.create_folder("Inner", Some(&outer));
    let before = tree.clone();

    assert!(!tree.move_node(&outer, Some(&inner)));
    assert!(!tree.move_node(&outer, Some(&outer)));
    assert_eq!(tree, before);
}

#[test]
fn test_move_onto_bookmark_is_rejected() {
    let mut tree = BookmarkTree::new();
    let folder = tree.create_folder("Work", None);
    tree.set_mark("a.rs", 1, 1);
    let bookmark_id = tree.find_bookmark("a.rs").unwrap().id.clone();
    assert!(!tree.move_node(&folder, Some(&bookmark_id)));
}

#[test]
fn test_delete_folder_removes_subtree() {
    let mut tree = BookmarkTree::new();
    let folder = tree.create_folder("Work", None);
    tree.set_mark("a.rs", 1, 1);
    let bookmark_id = tree.find_bookmark("a.rs").unwrap().id.clone();
    tree.move_node(&bookmark_id, Some(&folder));

    assert!(tree.delete_node(&folder));
    assert!(tree.find_bookmark("a.rs").is_none());
    assert!(!tree.delete_node(&folder));
}

#[test]
fn test_rename_and_relabel() {
    let mut tree = BookmarkTree::new();
    let folder = tree.create_folder("Work", None);
    tree.set_mark("a.rs", 1, 1);
    let bookmark_id = tree.find_bookmark("a.rs").unwrap().id.clone();

    assert!(tree.rename_folder(&folder, "Play"));
    assert!(!tree.rename_folder(&folder, "Play"));
    assert!(!tree.rename_folder(&bookmark_id, "Nope"));
    assert_eq!(tree.find_node(&folder).and_then(TreeNode::as_folder).unwrap().name, "Play");

    assert!(tree.relabel_bookmark(&bookmark_id, Some("entry point")));
    assert_eq!(tree.find_bookmark("a.rs").unwrap().display_name(), "entry point");
    assert!(tree.relabel_bookmark(&bookmark_id, None));
    assert_eq!(tree.find_bookmark("a.rs").unwrap().display_name(), "a.rs");
}

#[test]
fn test_clear_all_keeps_folders() {
    let mut tree = BookmarkTree::new();
    let folder = tree.create_folder("Work", None);
    tree.set_mark("a.rs", 1, 1);
    tree.set_mark("b.rs", 1, 1);
    let b_id = tree.find_bookmark("b.rs").unwrap().id.clone();
    tree.move_node(&b_id, Some(&folder));

    assert!(tree.clear_all());
    assert!(tree.bookmarks().is_empty());
    assert_eq!(tree.folders().len(), 1);
    assert!(!tree.clear_all());
}

#[test]
fn test_clear_file() {
    let mut tree = BookmarkTree::new();
    tree.set_mark("a.rs", 1, 1);
    tree.set_mark("a.rs", 2, 2);
    assert!(tree.clear_file("a.rs"));
    assert!(!tree.clear_file("a.rs"));
    assert!(tree.is_empty());
}

#[test]
fn test_rename_directory_rekeys_children() {
    let mut tree = BookmarkTree::new();
    tree.set_mark("src/a.rs", 1, 1);
    tree.set_mark("src/sub/b.rs", 2, 2);
    tree.set_mark("srcs/c.rs", 3, 3);
    let id = tree.find_bookmark("src/a.rs").unwrap().id.clone();

    assert_eq!(tree.rename_path("src", "lib"), 2);
    assert_eq!(tree.find_bookmark("lib/a.rs").unwrap().id, id);
    assert!(tree.find_bookmark("lib/sub/b.rs").is_some());
    assert!(tree.find_bookmark("srcs/c.rs").is_some());
}

#[test]
fn test_rename_onto_existing_bookmark_merges() {
    let mut tree = BookmarkTree::new();
    tree.set_mark("a.rs", 1, 10);
    tree.set_mark("a.rs", 2, 20);
    tree.set_mark("b.rs", 1, 5);

    assert_eq!(tree.rename_path("a.rs", "b.rs"), 1);
    assert_eq!(tree.bookmarks().len(), 1);
    assert_eq!(marks(&tree, "b.rs"), vec![(1, 5), (2, 20)]);
}

#[test]
fn test_remove_path_covers_directory() {
    let mut tree = BookmarkTree::new();
    tree.set_mark("src/a.rs", 1, 1);
    tree.set_mark("src/b.rs", 1, 1);
    tree.set_mark("main.rs", 1, 1);
    assert_eq!(tree.remove_path("src"), 2);
    assert_eq!(tree.bookmarks().len(), 1);
}

#[test]
fn test_set_folder_expanded() {
    let mut tree = BookmarkTree::new();
    let folder = tree.create_folder("Work", None);
    assert!(tree.set_folder_expanded(&folder, false));
    assert!(!tree.set_folder_expanded(&folder, false));
    assert!(!tree.set_folder_expanded("missing", true));
}

#[test]
fn test_ids_are_unique() {
    let mut tree = BookmarkTree::new();
    let a = tree.create_folder("A", None);
    let b = tree.create_folder("B", Some(&a));
    tree.set_mark("x.rs", 1, 1);
    let x = tree.find_bookmark("x.rs").unwrap().id.clone();
    assert_ne!(a, b);
    assert_ne!(a, x);
    assert_ne!(b, x);
}
