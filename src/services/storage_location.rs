//! Where the bookmark document lives, and the one-time move out of the
//! legacy single-file location.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::types::config::StorageScope;
use crate::types::errors::EngineError;

/// Metadata directory created inside the project in project scope.
pub const PROJECT_DIR: &str = ".bookmarks";

/// Document file name in project scope and for the legacy location.
pub const DOCUMENT_FILE: &str = "bookmarks.json";

const PROJECTS_DIR: &str = "projects";
const KEY_LEN: usize = 16;

/// Stable key for a project root: the first 16 hex chars of the SHA-256 of
/// its canonical path.
pub fn project_key(root: &Path) -> String {
    let canonical = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let digest = Sha256::digest(canonical.to_string_lossy().as_bytes());
    let mut key = hex::encode(digest);
    key.truncate(KEY_LEN);
    key
}

/// Resolves the document path for `root` under `scope`.
pub fn resolve(root: &Path, scope: StorageScope, data_dir: &Path) -> PathBuf {
    match scope {
        StorageScope::Project => root.join(PROJECT_DIR).join(DOCUMENT_FILE),
        StorageScope::Global => data_dir
            .join(PROJECTS_DIR)
            .join(format!("{}.json", project_key(root))),
    }
}

/// Location of the pre-project-keyed global document.
pub fn legacy_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DOCUMENT_FILE)
}

/// Moves `legacy` to `target` if `legacy` exists and `target` does not.
/// Returns whether a move happened. Never overwrites `target`.
pub fn migrate_legacy(legacy: &Path, target: &Path) -> Result<bool, EngineError> {
    if !legacy.is_file() || target.exists() || legacy == target {
        return Ok(false);
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| EngineError::storage_io(parent, "migrate", e))?;
    }

    if let Err(e) = fs::rename(legacy, target) {
        // Rename fails across file systems; fall back to copy and remove.
        warn!("Rename of legacy bookmarks failed ({}), copying instead", e);
        fs::copy(legacy, target).map_err(|e| EngineError::storage_io(target, "migrate", e))?;
        if let Err(e) = fs::remove_file(legacy) {
            warn!("Failed to remove legacy bookmarks file {}: {}", legacy.display(), e);
        }
    }

    info!(
        "Migrated legacy bookmarks from {} to {}",
        legacy.display(),
        target.display()
    );
    Ok(true)
}
