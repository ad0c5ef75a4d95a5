use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

// === ErrorKind ===

/// Coarse classification of engine failures, carried on error notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    NotFound,
    CorruptedData,
    StorageIo,
    InvalidTransform,
}

/// Recovery a collaborator may offer the user alongside an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecoveryAction {
    /// Delete the unreadable document and start from an empty tree.
    DiscardCorruptedFile,
}

// === EngineError ===

/// Errors raised by the bookmark state engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// No node with the given id or path exists.
    #[error("Node not found: {0}")]
    NotFound(String),
    /// The stored document could not be read as a bookmark tree.
    #[error("Corrupted bookmark data in {}: {detail}", .path.display())]
    CorruptedData {
        path: PathBuf,
        backup: Option<PathBuf>,
        detail: String,
    },
    /// Reading or writing at the file-system boundary failed.
    #[error("Storage I/O error during {operation} of {}: {message}", .path.display())]
    StorageIo {
        path: PathBuf,
        operation: String,
        message: String,
    },
    /// A structural edit would break the tree shape.
    #[error("Invalid transform: {0}")]
    InvalidTransform(String),
}

impl EngineError {
    pub fn storage_io(path: impl Into<PathBuf>, operation: &str, err: impl ToString) -> Self {
        EngineError::StorageIo {
            path: path.into(),
            operation: operation.to_string(),
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::CorruptedData { .. } => ErrorKind::CorruptedData,
            EngineError::StorageIo { .. } => ErrorKind::StorageIo,
            EngineError::InvalidTransform(_) => ErrorKind::InvalidTransform,
        }
    }

    /// Suggested user-facing recovery, if one exists.
    pub fn recovery_action(&self) -> Option<RecoveryAction> {
        match self {
            EngineError::CorruptedData { .. } => Some(RecoveryAction::DiscardCorruptedFile),
            _ => None,
        }
    }

    /// Whether this error should reach the user. Structural no-ops never do.
    pub fn is_reportable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::CorruptedData | ErrorKind::StorageIo
        )
    }

    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            EngineError::CorruptedData { path, .. } | EngineError::StorageIo { path, .. } => {
                Some(path)
            }
            _ => None,
        }
    }
}

// === ConfigError ===

/// Errors related to engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading or writing the config file.
    #[error("Config I/O error: {0}")]
    Io(String),
    /// Failed to serialize or deserialize the config.
    #[error("Config serialization error: {0}")]
    Serialization(String),
    /// The provided config key is invalid.
    #[error("Invalid config key: {0}")]
    InvalidKey(String),
    /// The provided config value is invalid.
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}
