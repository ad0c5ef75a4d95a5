// Bookmark state managers
// Managers own the in-memory tree logic: structure, lookup, navigation, line tracking, reconciliation.

pub mod bookmark_tree;
pub mod lookup_cache;
pub mod navigation;
pub mod reconciler;
pub mod sticky_tracker;
