//! Field-by-field repair of stored bookmark documents.
//!
//! A document that parses as JSON but does not match the expected shape is
//! coerced node by node instead of being thrown away. Only a root that is
//! not an object counts as unrecoverable.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::managers::bookmark_tree::BookmarkTree;
use crate::types::bookmark::{
    new_id, now, Bookmark, BookmarkDocument, Folder, TreeNode, MAX_MARK_NUMBER,
};

/// Result of a repair pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Repaired {
    pub document: BookmarkDocument,
    /// Whether anything had to be coerced, dropped, or merged.
    pub changed: bool,
}

#[derive(Default)]
struct RepairContext {
    changed: bool,
    seen_ids: HashSet<String>,
    seen_files: HashSet<String>,
    duplicates: Vec<Bookmark>,
}

impl RepairContext {
    fn note(&mut self, what: &str) {
        debug!("Repairing bookmark document: {}", what);
        self.changed = true;
    }

    fn claim_id(&mut self, obj: &Map<String, Value>) -> String {
        match obj.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() && !self.seen_ids.contains(id) => {
                self.seen_ids.insert(id.to_string());
                id.to_string()
            }
            Some(id) if !id.is_empty() => {
                self.note(&format!("duplicate id {}", id));
                self.fresh_id()
            }
            _ => {
                self.note("missing id");
                self.fresh_id()
            }
        }
    }

    fn fresh_id(&mut self) -> String {
        let id = new_id();
        self.seen_ids.insert(id.clone());
        id
    }

    fn timestamps(&mut self, obj: &Map<String, Value>) -> (DateTime<Utc>, DateTime<Utc>) {
        let created_at = self.timestamp(obj, "createdAt");
        let mut updated_at = self.timestamp(obj, "updatedAt");
        if updated_at < created_at {
            self.note("updatedAt before createdAt");
            updated_at = created_at;
        }
        (created_at, updated_at)
    }

    fn timestamp(&mut self, obj: &Map<String, Value>, key: &str) -> DateTime<Utc> {
        let parsed = obj
            .get(key)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        match parsed {
            Some(dt) => dt,
            None => {
                self.note(&format!("bad {}", key));
                now()
            }
        }
    }
}

/// Repairs a parsed document. Returns `Err(detail)` when the root is not an
/// object and nothing can be salvaged.
pub fn repair_document(value: Value, default_version: &str) -> Result<Repaired, String> {
    let root = match value {
        Value::Object(root) => root,
        other => {
            return Err(format!("expected a JSON object at the root, found {}", kind_of(&other)));
        }
    };
    let mut ctx = RepairContext::default();

    let version = match root.get("version").and_then(Value::as_str) {
        Some(v) => v.to_string(),
        None => {
            ctx.note("missing version");
            default_version.to_string()
        }
    };

    let items = match root.get("items").and_then(Value::as_array) {
        Some(items) => repair_nodes(items, &mut ctx),
        None => {
            ctx.note("items is not an array");
            Vec::new()
        }
    };

    let mut tree = BookmarkTree::from_items(items);
    for duplicate in std::mem::take(&mut ctx.duplicates) {
        ctx.note(&format!("duplicate bookmark for {}", duplicate.file_path));
        tree.update_bookmark(&duplicate.file_path, |existing| existing.absorb(&duplicate.numbers));
    }

    Ok(Repaired {
        document: tree.to_document(&version),
        changed: ctx.changed,
    })
}

fn repair_nodes(values: &[Value], ctx: &mut RepairContext) -> Vec<TreeNode> {
    values.iter().filter_map(|v| repair_node(v, ctx)).collect()
}

fn repair_node(value: &Value, ctx: &mut RepairContext) -> Option<TreeNode> {
    let Some(obj) = value.as_object() else {
        ctx.note("non-object node");
        return None;
    };
    match obj.get("type").and_then(Value::as_str) {
        Some("folder") => Some(TreeNode::Folder(repair_folder(obj, ctx))),
        Some("bookmark") => repair_bookmark(obj, ctx).map(TreeNode::Bookmark),
        other => {
            ctx.note(&format!("unknown node type {:?}", other));
            None
        }
    }
}

fn repair_folder(obj: &Map<String, Value>, ctx: &mut RepairContext) -> Folder {
    let id = ctx.claim_id(obj);
    let name = match obj.get("name").and_then(Value::as_str) {
        Some(name) => name.to_string(),
        None => {
            ctx.note("folder without name");
            "Untitled".to_string()
        }
    };
    let children = match obj.get("children").and_then(Value::as_array) {
        Some(children) => repair_nodes(children, ctx),
        None => {
            ctx.note("folder children is not an array");
            Vec::new()
        }
    };
    let expanded = match obj.get("expanded").and_then(Value::as_bool) {
        Some(expanded) => expanded,
        None => {
            ctx.note("folder expanded is not a bool");
            false
        }
    };
    let (created_at, updated_at) = ctx.timestamps(obj);

    Folder {
        id,
        name,
        children,
        expanded,
        created_at,
        updated_at,
    }
}

fn repair_bookmark(obj: &Map<String, Value>, ctx: &mut RepairContext) -> Option<Bookmark> {
    let file_path = match obj.get("filePath").and_then(Value::as_str) {
        Some(path) if !path.is_empty() => path.to_string(),
        _ => {
            ctx.note("bookmark without filePath");
            return None;
        }
    };

    let numbers = repair_numbers(obj.get("numbers"), ctx);
    if numbers.is_empty() {
        ctx.note(&format!("bookmark for {} has no marks", file_path));
        return None;
    }

    let label = match obj.get("label") {
        None | Some(Value::Null) => None,
        Some(Value::String(label)) => Some(label.clone()),
        Some(_) => {
            ctx.note("label is not a string");
            None
        }
    };

    let (created_at, updated_at) = ctx.timestamps(obj);
    let bookmark = Bookmark {
        id: String::new(),
        label,
        file_path,
        numbers,
        created_at,
        updated_at,
    };

    if !ctx.seen_files.insert(bookmark.file_path.clone()) {
        ctx.duplicates.push(bookmark);
        return None;
    }
    Some(Bookmark {
        id: ctx.claim_id(obj),
        ..bookmark
    })
}

fn repair_numbers(value: Option<&Value>, ctx: &mut RepairContext) -> BTreeMap<u8, u32> {
    let mut numbers = BTreeMap::new();
    let Some(entries) = value.and_then(Value::as_object) else {
        ctx.note("numbers is not an object");
        return numbers;
    };

    let mut used_lines = HashSet::new();
    for (key, line) in entries {
        let number = key.parse::<u8>().ok().filter(|n| *n <= MAX_MARK_NUMBER);
        let line = line.as_u64().and_then(|l| u32::try_from(l).ok());
        match (number, line) {
            (Some(number), Some(line)) if used_lines.insert(line) => {
                numbers.insert(number, line);
            }
            _ => ctx.note(&format!("dropped mark entry {}", key)),
        }
    }
    numbers
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
