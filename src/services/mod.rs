// Bookmark engine services
// Services sit at the edges: storage, configuration, timers, notifications, file watching.

pub mod config_engine;
pub mod debouncer;
pub mod document_repair;
pub mod file_watcher;
pub mod persistence;
pub mod reporter;
pub mod storage_location;
