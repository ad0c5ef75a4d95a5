//! Bookmark tree model.
//!
//! Implements `BookmarkTreeTrait`: numbered-mark CRUD and folder structure
//! edits over an in-memory tree of folders and per-file bookmarks.
//!
//! Nodes only link downwards. A node is addressed by its index path from the
//! root sequence, and parent lookup is a traversal.

use tracing::debug;

use crate::types::bookmark::{
    Bookmark, BookmarkDocument, Folder, TreeNode, MAX_MARK_NUMBER,
};

/// Index path from the root sequence down to a node.
pub type NodePath = Vec<usize>;

/// Trait defining the tree mutation contract.
///
/// Every method returns whether the tree changed. Unknown ids and rejected
/// moves are silent no-ops that return `false`. The resulting aggregate is
/// read back through `items()`, or `StateEngine::document()` on the façade.
pub trait BookmarkTreeTrait {
    fn toggle_mark(&mut self, file_path: &str, number: u8, line: u32) -> bool;
    fn set_mark(&mut self, file_path: &str, number: u8, line: u32) -> bool;
    fn clear_mark(&mut self, file_path: &str, number: u8) -> bool;
    fn delete_node(&mut self, id: &str) -> bool;
    fn rename_folder(&mut self, id: &str, name: &str) -> bool;
    fn relabel_bookmark(&mut self, id: &str, label: Option<&str>) -> bool;
    /// Returns the new folder's id. Unknown parents fall back to the root.
    fn create_folder(&mut self, name: &str, parent_id: Option<&str>) -> String;
    fn move_node(&mut self, id: &str, target_folder_id: Option<&str>) -> bool;
    fn clear_file(&mut self, file_path: &str) -> bool;
    fn clear_all(&mut self) -> bool;
}

/// Whether `file_path` is `path` itself or lies in directory `path`.
pub fn path_matches(file_path: &str, path: &str) -> bool {
    let path = path.trim_end_matches('/');
    file_path == path
        || (file_path.len() > path.len()
            && file_path.starts_with(path)
            && file_path.as_bytes()[path.len()] == b'/')
}

/// In-memory bookmark tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookmarkTree {
    items: Vec<TreeNode>,
}

impl BookmarkTree {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn from_items(items: Vec<TreeNode>) -> Self {
        Self { items }
    }

    /// Root sequence.
    pub fn items(&self) -> &[TreeNode] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_document(&self, version: &str) -> BookmarkDocument {
        BookmarkDocument {
            version: version.to_string(),
            items: self.items.clone(),
        }
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&TreeNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.items.get(*first)?;
        for idx in rest {
            node = node.as_folder()?.children.get(*idx)?;
        }
        Some(node)
    }

    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut TreeNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.items.get_mut(*first)?;
        for idx in rest {
            node = node.as_folder_mut()?.children.get_mut(*idx)?;
        }
        Some(node)
    }

    /// Path of the first node, in pre-order, matching `pred`.
    pub fn find_path(&self, pred: impl Fn(&TreeNode) -> bool) -> Option<NodePath> {
        fn walk(nodes: &[TreeNode], pred: &dyn Fn(&TreeNode) -> bool, path: &mut NodePath) -> bool {
            for (i, node) in nodes.iter().enumerate() {
                path.push(i);
                if pred(node) {
                    return true;
                }
                if let TreeNode::Folder(folder) = node {
                    if walk(&folder.children, pred, path) {
                        return true;
                    }
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        if walk(&self.items, &pred, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    pub fn find_path_by_id(&self, id: &str) -> Option<NodePath> {
        self.find_path(|n| n.id() == id)
    }

    pub fn find_path_by_file(&self, file_path: &str) -> Option<NodePath> {
        self.find_path(|n| n.as_bookmark().is_some_and(|b| b.file_path == file_path))
    }

    pub fn find_node(&self, id: &str) -> Option<&TreeNode> {
        let path = self.find_path_by_id(id)?;
        self.node_at(&path)
    }

    pub fn find_bookmark(&self, file_path: &str) -> Option<&Bookmark> {
        let path = self.find_path_by_file(file_path)?;
        self.node_at(&path)?.as_bookmark()
    }

    /// Id of the folder directly containing `id`, `None` for root-level nodes.
    pub fn parent_of(&self, id: &str) -> Option<String> {
        let path = self.find_path_by_id(id)?;
        let (_, parent) = path.split_last()?;
        if parent.is_empty() {
            return None;
        }
        self.node_at(parent).map(|n| n.id().to_string())
    }

    /// All bookmarks in pre-order.
    pub fn bookmarks(&self) -> Vec<&Bookmark> {
        fn collect<'a>(nodes: &'a [TreeNode], out: &mut Vec<&'a Bookmark>) {
            for node in nodes {
                match node {
                    TreeNode::Bookmark(b) => out.push(b),
                    TreeNode::Folder(f) => collect(&f.children, out),
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.items, &mut out);
        out
    }

    /// All folders in pre-order.
    pub fn folders(&self) -> Vec<&Folder> {
        fn collect<'a>(nodes: &'a [TreeNode], out: &mut Vec<&'a Folder>) {
            for node in nodes {
                if let TreeNode::Folder(f) = node {
                    out.push(f);
                    collect(&f.children, out);
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.items, &mut out);
        out
    }

    /// Detaches and returns the node at `path`.
    fn take_at(&mut self, path: &[usize]) -> Option<TreeNode> {
        let (last, parent) = path.split_last()?;
        let container = if parent.is_empty() {
            &mut self.items
        } else {
            let folder = self.node_at_mut(parent)?.as_folder_mut()?;
            folder.touch();
            &mut folder.children
        };
        if *last < container.len() {
            Some(container.remove(*last))
        } else {
            None
        }
    }

    /// Appends `node` to folder `parent_id`, or to the root when the folder
    /// is absent or unknown.
    fn append_to(&mut self, parent_id: Option<&str>, node: TreeNode) {
        if let Some(pid) = parent_id {
            if let Some(path) = self.find_path_by_id(pid) {
                if let Some(folder) = self.node_at_mut(&path).and_then(TreeNode::as_folder_mut) {
                    folder.children.push(node);
                    folder.touch();
                    return;
                }
            }
            debug!("Parent folder {} not found, appending to root", pid);
        }
        self.items.push(node);
    }

    /// Runs `f` on the bookmark for `file_path`; removes the node if `f`
    /// leaves it without marks.
    pub fn update_bookmark<R>(
        &mut self,
        file_path: &str,
        f: impl FnOnce(&mut Bookmark) -> R,
    ) -> Option<R> {
        let path = self.find_path_by_file(file_path)?;
        let bookmark = self.node_at_mut(&path)?.as_bookmark_mut()?;
        let result = f(bookmark);
        let emptied = bookmark.is_empty();
        if emptied {
            self.take_at(&path);
            debug!("Removed bookmark node for {} (no marks left)", file_path);
        }
        Some(result)
    }

    pub fn set_folder_expanded(&mut self, id: &str, expanded: bool) -> bool {
        let Some(path) = self.find_path_by_id(id) else {
            return false;
        };
        match self.node_at_mut(&path).and_then(TreeNode::as_folder_mut) {
            Some(folder) if folder.expanded != expanded => {
                folder.expanded = expanded;
                folder.touch();
                true
            }
            _ => false,
        }
    }

    /// Re-keys every bookmark at or under `from` to live at or under `to`.
    ///
    /// When the destination already has a bookmark, the moved marks are
    /// merged into it (existing numbers and lines win) and the moved node is
    /// dropped. Returns the number of bookmarks re-keyed.
    pub fn rename_path(&mut self, from: &str, to: &str) -> usize {
        let from = from.trim_end_matches('/');
        let to = to.trim_end_matches('/');
        let affected: Vec<String> = self
            .bookmarks()
            .into_iter()
            .filter(|b| path_matches(&b.file_path, from))
            .map(|b| b.file_path.clone())
            .collect();

        let mut renamed = 0;
        for old_path in affected {
            let new_path = format!("{}{}", to, &old_path[from.len()..]);
            if new_path == old_path {
                continue;
            }
            let Some(old_node_path) = self.find_path_by_file(&old_path) else {
                continue;
            };

            if self.find_path_by_file(&new_path).is_some() {
                let Some(TreeNode::Bookmark(moved)) = self.take_at(&old_node_path) else {
                    continue;
                };
                self.update_bookmark(&new_path, |existing| existing.absorb(&moved.numbers));
                debug!("Merged bookmark {} into existing {}", old_path, new_path);
            } else if let Some(bookmark) = self
                .node_at_mut(&old_node_path)
                .and_then(TreeNode::as_bookmark_mut)
            {
                bookmark.file_path = new_path;
                bookmark.touch();
            }
            renamed += 1;
        }
        renamed
    }

    /// Removes every bookmark at or under `path`. Returns how many went.
    pub fn remove_path(&mut self, path: &str) -> usize {
        let mut removed = 0;
        while let Some(node_path) =
            self.find_path(|n| n.as_bookmark().is_some_and(|b| path_matches(&b.file_path, path)))
        {
            if self.take_at(&node_path).is_none() {
                break;
            }
            removed += 1;
        }
        removed
    }
}

impl BookmarkTreeTrait for BookmarkTree {
    /// Creates, relocates, or removes mark `number` depending on where it sits.
    fn toggle_mark(&mut self, file_path: &str, number: u8, line: u32) -> bool {
        if number > MAX_MARK_NUMBER {
            debug!("Ignoring toggle of out-of-range mark number {}", number);
            return false;
        }
        let current = self.find_bookmark(file_path).and_then(|b| b.line_of(number));
        if current == Some(line) {
            self.clear_mark(file_path, number)
        } else {
            self.set_mark(file_path, number, line)
        }
    }

    fn set_mark(&mut self, file_path: &str, number: u8, line: u32) -> bool {
        if number > MAX_MARK_NUMBER {
            debug!("Ignoring out-of-range mark number {}", number);
            return false;
        }
        if self.find_path_by_file(file_path).is_none() {
            let mut bookmark = Bookmark::new(file_path);
            bookmark.assign(number, line);
            self.items.push(TreeNode::Bookmark(bookmark));
            return true;
        }
        self.update_bookmark(file_path, |b| b.assign(number, line))
            .unwrap_or(false)
    }

    fn clear_mark(&mut self, file_path: &str, number: u8) -> bool {
        self.update_bookmark(file_path, |b| b.unassign(number).is_some())
            .unwrap_or(false)
    }

    fn delete_node(&mut self, id: &str) -> bool {
        match self.find_path_by_id(id) {
            Some(path) => self.take_at(&path).is_some(),
            None => {
                debug!("delete_node: {} not found", id);
                false
            }
        }
    }

    fn rename_folder(&mut self, id: &str, name: &str) -> bool {
        let Some(path) = self.find_path_by_id(id) else {
            return false;
        };
        match self.node_at_mut(&path).and_then(TreeNode::as_folder_mut) {
            Some(folder) if folder.name != name => {
                folder.name = name.to_string();
                folder.touch();
                true
            }
            _ => false,
        }
    }

    fn relabel_bookmark(&mut self, id: &str, label: Option<&str>) -> bool {
        let label = label.map(str::trim).filter(|l| !l.is_empty()).map(String::from);
        let Some(path) = self.find_path_by_id(id) else {
            return false;
        };
        match self.node_at_mut(&path).and_then(TreeNode::as_bookmark_mut) {
            Some(bookmark) if bookmark.label != label => {
                bookmark.label = label;
                bookmark.touch();
                true
            }
            _ => false,
        }
    }

    fn create_folder(&mut self, name: &str, parent_id: Option<&str>) -> String {
        let folder = Folder::new(name);
        let id = folder.id.clone();
        self.append_to(parent_id, TreeNode::Folder(folder));
        id
    }

    /// Re-parents the subtree at `id` under `target_folder_id` (root when `None`).
    fn move_node(&mut self, id: &str, target_folder_id: Option<&str>) -> bool {
        let Some(source) = self.find_path_by_id(id) else {
            debug!("move_node: {} not found", id);
            return false;
        };

        if let Some(target) = target_folder_id {
            let Some(node) = self.node_at(&source) else {
                return false;
            };
            if node.contains_id(target) {
                debug!("move_node: rejected moving {} into itself or a descendant", id);
                return false;
            }
            if self.find_node(target).and_then(TreeNode::as_folder).is_none() {
                debug!("move_node: target folder {} not found", target);
                return false;
            }
        }

        let Some(mut node) = self.take_at(&source) else {
            return false;
        };
        node.touch();
        self.append_to(target_folder_id, node);
        true
    }

    fn clear_file(&mut self, file_path: &str) -> bool {
        match self.find_path_by_file(file_path) {
            Some(path) => self.take_at(&path).is_some(),
            None => false,
        }
    }

    /// Removes every bookmark. Folders are user structure and stay.
    fn clear_all(&mut self) -> bool {
        fn strip(nodes: &mut Vec<TreeNode>) -> bool {
            let before = nodes.len();
            nodes.retain(|n| matches!(n, TreeNode::Folder(_)));
            let mut changed = nodes.len() != before;
            for node in nodes.iter_mut() {
                if let TreeNode::Folder(folder) = node {
                    if strip(&mut folder.children) {
                        folder.touch();
                        changed = true;
                    }
                }
            }
            changed
        }
        strip(&mut self.items)
    }
}
