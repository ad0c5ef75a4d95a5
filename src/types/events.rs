use std::path::PathBuf;

use serde::Serialize;

use super::errors::{EngineError, ErrorKind, RecoveryAction};

/// One buffer change: lines `start_line..=end_line` were replaced by
/// `inserted_lines` new line breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditDelta {
    pub start_line: u32,
    pub end_line: u32,
    pub inserted_lines: u32,
}

impl EditDelta {
    pub fn new(start_line: u32, end_line: u32, inserted_lines: u32) -> Self {
        // Hosts occasionally report reversed ranges.
        let (start_line, end_line) = if end_line < start_line {
            (end_line, start_line)
        } else {
            (start_line, end_line)
        };
        Self {
            start_line,
            end_line,
            inserted_lines,
        }
    }

    /// Pure insertion of `count` lines after `line`.
    pub fn insert(line: u32, count: u32) -> Self {
        Self::new(line, line, count)
    }

    /// Net change in line count: `inserted - (end - start)`.
    pub fn line_delta(&self) -> i64 {
        i64::from(self.inserted_lines) - (i64::from(self.end_line) - i64::from(self.start_line))
    }
}

/// A file-system change reported by the host, with project-relative paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEvent {
    Created(String),
    Deleted(String),
    Renamed { from: String, to: String },
}

/// Notification published after engine activity.
#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    /// A mutation was committed; re-read the current state.
    Changed,
    /// A recoverable failure collaborators should surface.
    Error(ErrorReport),
}

/// Recoverable-error payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    pub path: Option<PathBuf>,
    pub operation: Option<String>,
    pub action: Option<RecoveryAction>,
}

impl From<&EngineError> for ErrorReport {
    fn from(err: &EngineError) -> Self {
        let operation = match err {
            EngineError::StorageIo { operation, .. } => Some(operation.clone()),
            EngineError::CorruptedData { .. } => Some("load".to_string()),
            _ => None,
        };
        Self {
            kind: err.kind(),
            message: err.to_string(),
            path: err.path().cloned(),
            operation,
            action: err.recovery_action(),
        }
    }
}
