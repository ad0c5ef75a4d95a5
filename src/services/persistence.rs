//! Persistence service.
//!
//! Loads the bookmark document once at startup and writes it back through a
//! single debounce slot. Only the newest pending document is ever written.
//! Unreadable documents are backed up next to the original and replaced by
//! an empty default; the failure is reported, never raised as a panic.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::services::debouncer::Debouncer;
use crate::services::document_repair::repair_document;
use crate::services::reporter::Reporter;
use crate::types::bookmark::BookmarkDocument;
use crate::types::errors::EngineError;

/// What `load` produced.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub document: BookmarkDocument,
    /// The stored document needed field-level repair.
    pub repaired: bool,
    /// Recoverable failure that led to a default document, already reported.
    pub error: Option<EngineError>,
}

pub struct PersistenceService {
    path: PathBuf,
    default_version: String,
    debouncer: Debouncer<BookmarkDocument>,
    writes: u64,
    reporter: Reporter,
}

impl PersistenceService {
    pub fn new(path: PathBuf, debounce: Duration, default_version: &str, reporter: Reporter) -> Self {
        Self {
            path,
            default_version: default_version.to_string(),
            debouncer: Debouncer::new(debounce),
            writes: 0,
            reporter,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn empty_document(&self) -> BookmarkDocument {
        BookmarkDocument {
            version: self.default_version.clone(),
            items: Vec::new(),
        }
    }

    /// Reads the document. Never fails: every problem degrades to the empty
    /// default and is carried in `LoadOutcome::error`.
    pub fn load(&self) -> LoadOutcome {
        if !self.path.exists() {
            debug!("No bookmark document at {}, starting empty", self.path.display());
            return self.outcome(self.empty_document(), false, None);
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                let err = EngineError::storage_io(&self.path, "read", e);
                self.reporter.error(&err);
                return self.outcome(self.empty_document(), false, Some(err));
            }
        };

        let value: Value = match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => return self.recover_corrupted(e.to_string()),
        };

        match repair_document(value, &self.default_version) {
            Ok(repaired) => {
                if repaired.changed {
                    warn!("Bookmark document {} was repaired on load", self.path.display());
                }
                info!(
                    "Loaded {} root node(s) from {}",
                    repaired.document.items.len(),
                    self.path.display()
                );
                self.outcome(repaired.document, repaired.changed, None)
            }
            Err(detail) => self.recover_corrupted(detail),
        }
    }

    fn outcome(&self, document: BookmarkDocument, repaired: bool, error: Option<EngineError>) -> LoadOutcome {
        LoadOutcome {
            document,
            repaired,
            error,
        }
    }

    fn recover_corrupted(&self, detail: String) -> LoadOutcome {
        let backup = match self.backup_corrupted() {
            Ok(backup) => Some(backup),
            Err(e) => {
                warn!("Failed to back up corrupted document {}: {}", self.path.display(), e);
                None
            }
        };
        let err = EngineError::CorruptedData {
            path: self.path.clone(),
            backup,
            detail,
        };
        self.reporter.error(&err);
        self.outcome(self.empty_document(), false, Some(err))
    }

    /// Copies the current document to a timestamped sibling.
    fn backup_corrupted(&self) -> std::io::Result<PathBuf> {
        let target = backup_path(&self.path, Utc::now());
        fs::copy(&self.path, &target)?;
        info!("Backed up corrupted bookmarks to {}", target.display());
        Ok(target)
    }

    /// Schedules `document` for writing after the debounce window,
    /// superseding anything still pending.
    pub fn save(&mut self, document: BookmarkDocument, now: Instant) {
        if self.debouncer.arm(document, now) {
            debug!("Superseded pending bookmark write");
        }
    }

    /// Writes the pending document if its deadline has passed. Returns
    /// whether a write happened. A failed write stays pending and is retried
    /// one debounce window later.
    pub fn poll(&mut self, now: Instant) -> Result<bool, EngineError> {
        match self.debouncer.take_due(now) {
            Some(document) => self.write_or_rearm(document, now),
            None => Ok(false),
        }
    }

    /// Writes the pending document immediately, if any. On failure the
    /// document stays pending.
    pub fn flush(&mut self) -> Result<bool, EngineError> {
        match self.debouncer.take() {
            Some(document) => self.write_or_rearm(document, Instant::now()),
            None => Ok(false),
        }
    }

    fn write_or_rearm(&mut self, document: BookmarkDocument, now: Instant) -> Result<bool, EngineError> {
        match self.write(&document) {
            Ok(()) => Ok(true),
            Err(err) => {
                debug!("Write failed, keeping document pending for retry");
                self.debouncer.arm(document, now);
                Err(err)
            }
        }
    }

    /// Writes `document` now. Failures are reported and returned; the caller's
    /// in-memory state is unaffected.
    pub fn write(&mut self, document: &BookmarkDocument) -> Result<(), EngineError> {
        let result = self.write_atomic(document);
        if let Err(err) = &result {
            self.reporter.error(err);
        }
        result
    }

    fn write_atomic(&mut self, document: &BookmarkDocument) -> Result<(), EngineError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| EngineError::storage_io(parent, "create directory", e))?;
        }

        let json = serde_json::to_string_pretty(document)
            .map_err(|e| EngineError::storage_io(&self.path, "serialize", e))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &json).map_err(|e| EngineError::storage_io(&tmp, "write", e))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            EngineError::storage_io(&self.path, "write", e)
        })?;

        self.writes += 1;
        debug!("Wrote {} bytes to {}", json.len(), self.path.display());
        Ok(())
    }

    /// Drops any pending write and deletes the stored document.
    pub fn discard_and_reset(&mut self) -> Result<(), EngineError> {
        self.debouncer.take();
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                let err = EngineError::storage_io(&self.path, "delete", e);
                self.reporter.error(&err);
                err
            })?;
            info!("Discarded bookmark document {}", self.path.display());
        }
        Ok(())
    }

    /// Number of completed writes since construction.
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    pub fn has_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}

/// `<stem>.corrupted-<UTC timestamp>.json` next to `path`, made unique if a
/// backup with the same timestamp already exists.
pub fn backup_path(path: &Path, at: DateTime<Utc>) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "bookmarks".to_string());
    let stamp = at.format("%Y%m%dT%H%M%S%.3fZ");
    let mut candidate = path.with_file_name(format!("{}.corrupted-{}.json", stem, stamp));
    let mut n = 1;
    while candidate.exists() {
        candidate = path.with_file_name(format!("{}.corrupted-{}-{}.json", stem, stamp, n));
        n += 1;
    }
    candidate
}
