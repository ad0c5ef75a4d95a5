//! File-system reconciliation.
//!
//! A delete does not remove bookmarks right away. It arms a per-path pending
//! deletion that commits only after the grace period passes without a
//! matching create, so delete-then-recreate saves keep their marks. Renames
//! re-key bookmarks in place and cancel any pending deletion of either path.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::managers::bookmark_tree::{path_matches, BookmarkTree};

/// Default grace period before a delete is treated as permanent.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(1000);

/// A delete waiting out its grace period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeletion {
    pub path: String,
    pub requested_at: Instant,
    pub deadline: Instant,
}

pub struct Reconciler {
    grace: Duration,
    pending: HashMap<String, PendingDeletion>,
}

impl Reconciler {
    pub fn new(grace: Duration) -> Self {
        Self {
            grace,
            pending: HashMap::new(),
        }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace
    }

    /// Arms a pending deletion for `path` if any bookmark lives at or under
    /// it. A repeated delete re-arms the timer. Returns whether one is armed.
    pub fn on_delete(&mut self, tree: &BookmarkTree, path: &str, now: Instant) -> bool {
        let affected = tree
            .bookmarks()
            .iter()
            .any(|b| path_matches(&b.file_path, path));
        if !affected {
            return false;
        }

        let entry = PendingDeletion {
            path: path.to_string(),
            requested_at: now,
            deadline: now + self.grace,
        };
        if self.pending.insert(path.to_string(), entry).is_some() {
            debug!("Re-armed pending deletion for {}", path);
        } else {
            debug!("Pending deletion armed for {} ({:?} grace)", path, self.grace);
        }
        true
    }

    /// Cancels the pending deletion for `path` if it is still inside its
    /// grace period. Returns whether one was cancelled.
    pub fn on_create(&mut self, path: &str, now: Instant) -> bool {
        match self.pending.get(path) {
            Some(entry) if now < entry.deadline => {
                self.pending.remove(path);
                info!("File {} recreated within grace period, keeping bookmarks", path);
                true
            }
            _ => false,
        }
    }

    /// Re-keys bookmarks from `from` to `to` and cancels any pending
    /// deletion at or under either path. Landing on `to` recreates it.
    /// Returns the number of bookmarks re-keyed.
    pub fn on_rename(&mut self, tree: &mut BookmarkTree, from: &str, to: &str) -> usize {
        self.pending.retain(|path, _| {
            if path_matches(path, to) {
                info!("File {} replaced by rename within grace period, keeping bookmarks", path);
                return false;
            }
            !path_matches(path, from)
        });
        let renamed = tree.rename_path(from, to);
        if renamed > 0 {
            info!("Renamed {} bookmark(s) from {} to {}", renamed, from, to);
        }
        renamed
    }

    /// Removes and returns every pending deletion whose grace period is over.
    pub fn expire(&mut self, now: Instant) -> Vec<String> {
        let mut due: Vec<PendingDeletion> = Vec::new();
        self.pending.retain(|_, entry| {
            if entry.deadline <= now {
                due.push(entry.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|entry| entry.deadline);
        due.into_iter().map(|entry| entry.path).collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|entry| entry.deadline).min()
    }

    pub fn is_pending(&self, path: &str) -> bool {
        self.pending.contains_key(path)
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingDeletion> {
        self.pending.values()
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD)
    }
}
