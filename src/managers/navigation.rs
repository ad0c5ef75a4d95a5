//! Read-side navigation over numbered marks.
//!
//! Nothing here is stored; every query walks the current tree.

use crate::managers::bookmark_tree::BookmarkTree;
use crate::types::bookmark::Bookmark;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Which marks a navigation query considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    File(&'a str),
    Global,
}

/// Where navigation starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor<'a> {
    BeforeFirst,
    AfterLast,
    /// The active number, file unknown.
    Number(u8),
    /// The active number in a specific file.
    Mark(u8, &'a str),
}

/// One numbered mark in the tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkEntry<'a> {
    pub number: u8,
    pub bookmark: &'a Bookmark,
    pub line: u32,
}

impl MarkEntry<'_> {
    pub fn file_path(&self) -> &str {
        &self.bookmark.file_path
    }
}

/// Active numbers in `file_path`, ascending.
pub fn numbers_in_file(tree: &BookmarkTree, file_path: &str) -> Vec<u8> {
    tree.find_bookmark(file_path)
        .map(|b| b.numbers.keys().copied().collect())
        .unwrap_or_default()
}

/// Every mark in the tree, by number, ties broken by bookmark creation order.
pub fn all_marks_sorted(tree: &BookmarkTree) -> Vec<MarkEntry<'_>> {
    let mut marks: Vec<MarkEntry<'_>> = tree
        .bookmarks()
        .into_iter()
        .flat_map(|bookmark| {
            bookmark.numbers.iter().map(move |(number, line)| MarkEntry {
                number: *number,
                bookmark,
                line: *line,
            })
        })
        .collect();
    marks.sort_by_key(|m| (m.number, m.bookmark.created_at));
    marks
}

fn marks_in_scope<'a>(tree: &'a BookmarkTree, scope: Scope<'_>) -> Vec<MarkEntry<'a>> {
    match scope {
        Scope::Global => all_marks_sorted(tree),
        Scope::File(file_path) => match tree.find_bookmark(file_path) {
            Some(bookmark) => bookmark
                .numbers
                .iter()
                .map(|(number, line)| MarkEntry {
                    number: *number,
                    bookmark,
                    line: *line,
                })
                .collect(),
            None => Vec::new(),
        },
    }
}

/// The mark after or before `cursor` within `scope`, wrapping at both ends.
pub fn adjacent<'a>(
    tree: &'a BookmarkTree,
    cursor: Cursor<'_>,
    direction: Direction,
    scope: Scope<'_>,
) -> Option<MarkEntry<'a>> {
    let marks = marks_in_scope(tree, scope);
    let len = marks.len();
    if len == 0 {
        return None;
    }

    let current = match cursor {
        Cursor::BeforeFirst | Cursor::AfterLast => None,
        Cursor::Number(n) => Some((n, marks.iter().position(|m| m.number == n))),
        Cursor::Mark(n, file) => Some((
            n,
            marks
                .iter()
                .position(|m| m.number == n && m.file_path() == file),
        )),
    };

    let index = match (current, direction) {
        (None, Direction::Next) => 0,
        (None, Direction::Previous) => len - 1,
        (Some((_, Some(i))), Direction::Next) => (i + 1) % len,
        (Some((_, Some(i))), Direction::Previous) => (i + len - 1) % len,
        (Some((n, None)), Direction::Next) => marks.iter().position(|m| m.number > n).unwrap_or(0),
        (Some((n, None)), Direction::Previous) => marks
            .iter()
            .rposition(|m| m.number < n)
            .unwrap_or(len - 1),
    };
    marks.get(index).copied()
}
