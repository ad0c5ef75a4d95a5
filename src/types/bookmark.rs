use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Version string written into freshly created documents.
pub const DOCUMENT_VERSION: &str = "1.0";

/// Highest mark number a file can carry (numbers are `0..=9`).
pub const MAX_MARK_NUMBER: u8 = 9;

/// Returns the current UTC timestamp.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Generates a fresh node id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Moves `updated_at` forward to now, never backwards.
fn touch(updated_at: &mut DateTime<Utc>) {
    let now = now();
    if now > *updated_at {
        *updated_at = now;
    }
}

/// A node of the bookmark tree, tagged by `"type"` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    Folder(Folder),
    Bookmark(Bookmark),
}

impl TreeNode {
    pub fn id(&self) -> &str {
        match self {
            TreeNode::Folder(f) => &f.id,
            TreeNode::Bookmark(b) => &b.id,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            TreeNode::Folder(f) => f.created_at,
            TreeNode::Bookmark(b) => b.created_at,
        }
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        match self {
            TreeNode::Folder(f) => f.updated_at,
            TreeNode::Bookmark(b) => b.updated_at,
        }
    }

    pub fn touch(&mut self) {
        match self {
            TreeNode::Folder(f) => f.touch(),
            TreeNode::Bookmark(b) => b.touch(),
        }
    }

    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            TreeNode::Folder(f) => Some(f),
            TreeNode::Bookmark(_) => None,
        }
    }

    pub fn as_folder_mut(&mut self) -> Option<&mut Folder> {
        match self {
            TreeNode::Folder(f) => Some(f),
            TreeNode::Bookmark(_) => None,
        }
    }

    pub fn as_bookmark(&self) -> Option<&Bookmark> {
        match self {
            TreeNode::Bookmark(b) => Some(b),
            TreeNode::Folder(_) => None,
        }
    }

    pub fn as_bookmark_mut(&mut self) -> Option<&mut Bookmark> {
        match self {
            TreeNode::Bookmark(b) => Some(b),
            TreeNode::Folder(_) => None,
        }
    }

    /// Whether `id` names this node or any node below it.
    pub fn contains_id(&self, id: &str) -> bool {
        if self.id() == id {
            return true;
        }
        match self {
            TreeNode::Folder(f) => f.children.iter().any(|c| c.contains_id(id)),
            TreeNode::Bookmark(_) => false,
        }
    }
}

/// A user-created container for other nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub children: Vec<TreeNode>,
    pub expanded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    pub fn new(name: &str) -> Self {
        let now = now();
        Self {
            id: new_id(),
            name: name.to_string(),
            children: Vec::new(),
            expanded: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        touch(&mut self.updated_at);
    }
}

/// The numbered marks of a single file.
///
/// `numbers` maps a mark number (`0..=9`) to a 0-based line. No two numbers
/// share a line, and the map is never empty while the node is in a tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub file_path: String,
    pub numbers: BTreeMap<u8, u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bookmark {
    pub fn new(file_path: &str) -> Self {
        let now = now();
        Self {
            id: new_id(),
            label: None,
            file_path: file_path.to_string(),
            numbers: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Line currently carrying `number`, if any.
    pub fn line_of(&self, number: u8) -> Option<u32> {
        self.numbers.get(&number).copied()
    }

    /// Number currently sitting on `line`, if any.
    pub fn number_at(&self, line: u32) -> Option<u8> {
        self.numbers
            .iter()
            .find(|(_, l)| **l == line)
            .map(|(n, _)| *n)
    }

    /// Assigns `number -> line`, evicting any other number on that line.
    /// Returns `false` when the mapping was already in place.
    pub fn assign(&mut self, number: u8, line: u32) -> bool {
        if self.line_of(number) == Some(line) {
            return false;
        }
        self.numbers.retain(|n, l| *n == number || *l != line);
        self.numbers.insert(number, line);
        touch(&mut self.updated_at);
        true
    }

    /// Removes `number`, returning the line it was on.
    pub fn unassign(&mut self, number: u8) -> Option<u32> {
        let line = self.numbers.remove(&number)?;
        touch(&mut self.updated_at);
        Some(line)
    }

    /// Takes over marks from `other` whose number and line are both free
    /// here. Returns how many were taken.
    pub fn absorb(&mut self, other: &BTreeMap<u8, u32>) -> usize {
        let mut taken = 0;
        for (number, line) in other {
            if self.line_of(*number).is_none() && self.number_at(*line).is_none() {
                self.numbers.insert(*number, *line);
                taken += 1;
            }
        }
        if taken > 0 {
            touch(&mut self.updated_at);
        }
        taken
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn touch(&mut self) {
        touch(&mut self.updated_at);
    }

    /// Text shown for this bookmark: the label when set, otherwise the path.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.file_path)
    }
}

/// The persisted document: `{ "version": ..., "items": [...] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkDocument {
    pub version: String,
    pub items: Vec<TreeNode>,
}

impl Default for BookmarkDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION.to_string(),
            items: Vec::new(),
        }
    }
}
