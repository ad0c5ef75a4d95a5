use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::bookmark::DOCUMENT_VERSION;

/// Engine configuration, persisted as JSON. Missing fields take defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub save_debounce_ms: u64,
    pub deletion_grace_ms: u64,
    pub cache_capacity: usize,
    pub storage_scope: StorageScope,
    pub ignored_dirs: Vec<String>,
    pub document_version: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            save_debounce_ms: 300,
            deletion_grace_ms: 1000,
            cache_capacity: 100,
            storage_scope: StorageScope::Project,
            ignored_dirs: Self::default_ignored_dirs(),
            document_version: DOCUMENT_VERSION.to_string(),
        }
    }
}

impl EngineConfig {
    /// Directories whose events never reach the reconciler.
    pub fn default_ignored_dirs() -> Vec<String> {
        [".git", ".svn", ".hg", ".bookmarks", "node_modules"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    pub fn deletion_grace(&self) -> Duration {
        Duration::from_millis(self.deletion_grace_ms)
    }
}

/// Where the bookmark document lives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageScope {
    /// Inside the project, next to the marked files.
    Project,
    /// In the per-user data directory, keyed by a hash of the project path.
    Global,
}
