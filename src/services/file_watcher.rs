//! Project file watcher.
//!
//! Turns `notify` events under the project root into `FsEvent`s with
//! root-relative, `/`-separated paths. Events inside ignored directories
//! (version control, the bookmark metadata directory, ...) never leave
//! this module.

use std::path::{Component, Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::types::errors::EngineError;
use crate::types::events::FsEvent;

pub struct FileWatcher {
    root: PathBuf,
    /// Dropping the watcher stops delivery.
    watcher: RecommendedWatcher,
    event_rx: mpsc::UnboundedReceiver<FsEvent>,
}

impl FileWatcher {
    /// Starts watching `root` recursively.
    pub fn new(root: PathBuf, ignored_dirs: Vec<String>) -> Result<Self, EngineError> {
        // FSEvents reports canonical paths (/private/var vs /var on macOS).
        let root = root.canonicalize().unwrap_or(root);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let root_clone = root.clone();

        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            match result {
                Ok(event) => {
                    for fs_event in translate(&event, &root_clone, &ignored_dirs) {
                        debug!("File event: {:?}", fs_event);
                        if event_tx.send(fs_event).is_err() {
                            // Receiver dropped
                            return;
                        }
                    }
                }
                Err(e) => error!("File watcher error: {}", e),
            }
        })
        .map_err(|e| EngineError::storage_io(&root, "watch", e))?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|e| EngineError::storage_io(&root, "watch", e))?;

        Ok(Self {
            root,
            watcher,
            event_rx,
        })
    }

    pub fn event_rx(&mut self) -> &mut mpsc::UnboundedReceiver<FsEvent> {
        &mut self.event_rx
    }

    /// Splits into the watcher handle and its receiver. Events stop when
    /// the handle is dropped.
    pub fn split(self) -> (RecommendedWatcher, mpsc::UnboundedReceiver<FsEvent>) {
        (self.watcher, self.event_rx)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Maps one `notify` event to zero or more engine events.
pub fn translate(event: &Event, root: &Path, ignored_dirs: &[String]) -> Vec<FsEvent> {
    let relative = |path: &PathBuf| {
        relative_path(path, root).filter(|rel| !is_ignored(rel, ignored_dirs))
    };

    match event.kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            event.paths.iter().filter_map(relative).map(FsEvent::Created).collect()
        }
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            event.paths.iter().filter_map(relative).map(FsEvent::Deleted).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.as_slice() {
            [from, to] => match (relative(from), relative(to)) {
                (Some(from), Some(to)) => vec![FsEvent::Renamed { from, to }],
                // Moved into an ignored directory: gone as far as we care.
                (Some(from), None) => vec![FsEvent::Deleted(from)],
                (None, Some(to)) => vec![FsEvent::Created(to)],
                (None, None) => Vec::new(),
            },
            _ => Vec::new(),
        },
        // FSEvents reports both halves of a rename, and moves to the trash,
        // without saying which side a path is on.
        EventKind::Modify(ModifyKind::Name(RenameMode::Any)) => event
            .paths
            .iter()
            .filter_map(|path| {
                let rel = relative(path)?;
                Some(if path.exists() {
                    FsEvent::Created(rel)
                } else {
                    FsEvent::Deleted(rel)
                })
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// `path` relative to `root` with `/` separators, or `None` outside `root`.
pub fn relative_path(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Whether any segment of `relative` names an ignored directory.
pub fn is_ignored(relative: &str, ignored_dirs: &[String]) -> bool {
    relative
        .split('/')
        .any(|segment| ignored_dirs.iter().any(|dir| dir == segment))
}
