//! Bookmark state engine.
//!
//! Composes the tree, lookup cache, sticky tracking, reconciliation and
//! persistence behind one mutation path: every committed change clears the
//! lookup cache, schedules a debounced write, and publishes exactly one
//! `StateEvent::Changed`. Structural no-ops publish nothing.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::managers::bookmark_tree::{BookmarkTree, BookmarkTreeTrait};
use crate::managers::lookup_cache::LookupCache;
use crate::managers::navigation::{self, Cursor, Direction, MarkEntry, Scope};
use crate::managers::reconciler::Reconciler;
use crate::managers::sticky_tracker::{self, StickyOutcome};
use crate::services::persistence::PersistenceService;
use crate::services::reporter::Reporter;
use crate::services::storage_location;
use crate::types::bookmark::{Bookmark, BookmarkDocument, Folder, TreeNode};
use crate::types::config::{EngineConfig, StorageScope};
use crate::types::errors::EngineError;
use crate::types::events::{EditDelta, FsEvent, StateEvent};

/// What one `poll_timers` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerOutcome {
    /// Bookmarks removed because their grace period ran out.
    pub deletions_committed: usize,
    /// Whether the debounced document was written.
    pub wrote: bool,
}

pub struct StateEngine {
    tree: BookmarkTree,
    version: String,
    cache: LookupCache,
    persistence: PersistenceService,
    reconciler: Reconciler,
    reporter: Reporter,
    load_error: Option<EngineError>,
}

impl StateEngine {
    /// Loads the document at `document_path`. Load failures leave an empty
    /// tree and are available from `load_error`.
    pub fn open(config: &EngineConfig, document_path: PathBuf, reporter: Reporter) -> Self {
        let persistence = PersistenceService::new(
            document_path,
            config.save_debounce(),
            &config.document_version,
            reporter.clone(),
        );
        let outcome = persistence.load();

        let mut engine = Self {
            tree: BookmarkTree::from_items(outcome.document.items),
            version: outcome.document.version,
            cache: LookupCache::new(config.cache_capacity),
            persistence,
            reconciler: Reconciler::new(config.deletion_grace()),
            reporter,
            load_error: outcome.error,
        };

        if outcome.repaired {
            engine.schedule_save(Instant::now());
        }
        engine
    }

    /// Opens the document for the project at `root`, resolving its location
    /// from the configured scope. Global scope first migrates the legacy
    /// single-file document if it is still around.
    pub fn open_project(config: &EngineConfig, root: &Path, data_dir: &Path, reporter: Reporter) -> Self {
        let path = storage_location::resolve(root, config.storage_scope, data_dir);
        if config.storage_scope == StorageScope::Global {
            let legacy = storage_location::legacy_path(data_dir);
            if let Err(e) = storage_location::migrate_legacy(&legacy, &path) {
                reporter.error(&e);
            }
        }
        info!("Opening bookmarks for {} at {}", root.display(), path.display());
        Self::open(config, path, reporter)
    }

    pub fn load_error(&self) -> Option<&EngineError> {
        self.load_error.as_ref()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.reporter.subscribe()
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn document_path(&self) -> &Path {
        self.persistence.path()
    }

    // === Commit path ===

    fn schedule_save(&mut self, now: Instant) {
        let document = self.tree.to_document(&self.version);
        self.persistence.save(document, now);
    }

    fn commit(&mut self, now: Instant) {
        self.cache.invalidate();
        self.schedule_save(now);
        self.reporter.changed();
    }

    fn commit_if(&mut self, changed: bool) -> bool {
        if changed {
            self.commit(Instant::now());
        }
        changed
    }

    // === Tree mutations ===

    pub fn toggle_mark(&mut self, file_path: &str, number: u8, line: u32) -> bool {
        let changed = self.tree.toggle_mark(file_path, number, line);
        self.commit_if(changed)
    }

    pub fn set_mark(&mut self, file_path: &str, number: u8, line: u32) -> bool {
        let changed = self.tree.set_mark(file_path, number, line);
        self.commit_if(changed)
    }

    pub fn clear_mark(&mut self, file_path: &str, number: u8) -> bool {
        let changed = self.tree.clear_mark(file_path, number);
        self.commit_if(changed)
    }

    pub fn delete_node(&mut self, id: &str) -> bool {
        let changed = self.tree.delete_node(id);
        self.commit_if(changed)
    }

    pub fn rename_folder(&mut self, id: &str, name: &str) -> bool {
        let changed = self.tree.rename_folder(id, name);
        self.commit_if(changed)
    }

    pub fn relabel_bookmark(&mut self, id: &str, label: Option<&str>) -> bool {
        let changed = self.tree.relabel_bookmark(id, label);
        self.commit_if(changed)
    }

    pub fn create_folder(&mut self, name: &str, parent_id: Option<&str>) -> String {
        let id = self.tree.create_folder(name, parent_id);
        self.commit(Instant::now());
        id
    }

    pub fn move_node(&mut self, id: &str, target_folder_id: Option<&str>) -> bool {
        let changed = self.tree.move_node(id, target_folder_id);
        self.commit_if(changed)
    }

    pub fn clear_file(&mut self, file_path: &str) -> bool {
        let changed = self.tree.clear_file(file_path);
        self.commit_if(changed)
    }

    pub fn clear_all(&mut self) -> bool {
        let changed = self.tree.clear_all();
        self.commit_if(changed)
    }

    pub fn set_folder_expanded(&mut self, id: &str, expanded: bool) -> bool {
        let changed = self.tree.set_folder_expanded(id, expanded);
        self.commit_if(changed)
    }

    /// Runs several tree edits as one commit: at most one write and one
    /// notification, none if the tree ends up unchanged.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut BookmarkTree) -> R) -> R {
        let before = self.tree.clone();
        let result = f(&mut self.tree);
        let changed = self.tree != before;
        self.commit_if(changed);
        result
    }

    /// Shifts the marks of `file_path` through a batch of buffer edits.
    pub fn apply_edits(&mut self, file_path: &str, edits: &[EditDelta]) -> StickyOutcome {
        let outcome = sticky_tracker::apply_edits(&mut self.tree, file_path, edits);
        self.commit_if(outcome.changed());
        outcome
    }

    // === File-system reconciliation ===

    /// Feeds one host file-system event. Returns whether the tree changed
    /// right away; deletions only land later through `poll_timers`.
    pub fn handle_fs_event(&mut self, event: FsEvent, now: Instant) -> bool {
        match event {
            FsEvent::Deleted(path) => {
                self.reconciler.on_delete(&self.tree, &path, now);
                false
            }
            FsEvent::Created(path) => {
                self.reconciler.on_create(&path, now);
                false
            }
            FsEvent::Renamed { from, to } => {
                let renamed = self.reconciler.on_rename(&mut self.tree, &from, &to);
                if renamed > 0 {
                    self.commit(now);
                }
                renamed > 0
            }
        }
    }

    /// Fires every timer due at `now`: expired pending deletions first, then
    /// the debounced write. Write failures are already reported.
    pub fn poll_timers(&mut self, now: Instant) -> TimerOutcome {
        let mut outcome = TimerOutcome::default();

        for path in self.reconciler.expire(now) {
            let removed = self.tree.remove_path(&path);
            if removed > 0 {
                info!("Removed {} bookmark(s) for deleted path {}", removed, path);
            }
            outcome.deletions_committed += removed;
        }
        if outcome.deletions_committed > 0 {
            self.commit(now);
        }

        outcome.wrote = self.persistence.poll(now).unwrap_or(false);
        outcome
    }

    /// Earliest instant at which `poll_timers` has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.persistence.next_deadline(), self.reconciler.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn has_pending_deletion(&self, path: &str) -> bool {
        self.reconciler.is_pending(path)
    }

    // === Persistence ===

    /// Writes any pending document now.
    pub fn flush(&mut self) -> Result<bool, EngineError> {
        self.persistence.flush()
    }

    /// Flushes before the engine goes away. Pending deletions are dropped,
    /// so their bookmarks survive.
    pub fn shutdown(&mut self) -> Result<bool, EngineError> {
        debug!("Shutting down bookmark engine");
        self.flush()
    }

    /// Deletes the stored document and starts over with an empty tree.
    pub fn discard_and_reset(&mut self) -> Result<(), EngineError> {
        self.persistence.discard_and_reset()?;
        self.tree = BookmarkTree::new();
        self.load_error = None;
        self.cache.invalidate();
        self.reporter.changed();
        Ok(())
    }

    pub fn write_count(&self) -> u64 {
        self.persistence.write_count()
    }

    pub fn has_pending_write(&self) -> bool {
        self.persistence.has_pending()
    }

    // === Queries ===

    pub fn document(&self) -> BookmarkDocument {
        self.tree.to_document(&self.version)
    }

    pub fn items(&self) -> &[TreeNode] {
        self.tree.items()
    }

    pub fn tree(&self) -> &BookmarkTree {
        &self.tree
    }

    pub fn cache(&self) -> &LookupCache {
        &self.cache
    }

    pub fn find_by_file_path(&mut self, file_path: &str) -> Option<&Bookmark> {
        let path = self.cache.bookmark_path(&self.tree, file_path)?;
        self.tree.node_at(&path)?.as_bookmark()
    }

    pub fn find_node(&mut self, id: &str) -> Option<&TreeNode> {
        let path = self.cache.node_path(&self.tree, id)?;
        self.tree.node_at(&path)
    }

    pub fn find_folder(&mut self, id: &str) -> Option<&Folder> {
        self.find_node(id)?.as_folder()
    }

    pub fn parent_of(&self, id: &str) -> Option<String> {
        self.tree.parent_of(id)
    }

    pub fn bookmarks(&self) -> Vec<&Bookmark> {
        self.tree.bookmarks()
    }

    pub fn folders(&self) -> Vec<&Folder> {
        self.tree.folders()
    }

    pub fn line_of(&mut self, file_path: &str, number: u8) -> Option<u32> {
        self.find_by_file_path(file_path)?.line_of(number)
    }

    pub fn number_at_line(&mut self, file_path: &str, line: u32) -> Option<u8> {
        self.find_by_file_path(file_path)?.number_at(line)
    }

    pub fn numbers_in_file(&self, file_path: &str) -> Vec<u8> {
        navigation::numbers_in_file(&self.tree, file_path)
    }

    pub fn all_marks_sorted(&self) -> Vec<MarkEntry<'_>> {
        navigation::all_marks_sorted(&self.tree)
    }

    pub fn adjacent(&self, cursor: Cursor<'_>, direction: Direction, scope: Scope<'_>) -> Option<MarkEntry<'_>> {
        navigation::adjacent(&self.tree, cursor, direction, scope)
    }
}
