// Numbered Bookmarks platform paths
// Per-user config and data directories for Windows, macOS, and Linux.
//
// The data directory holds globally scoped bookmark documents and the
// legacy single-file document.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Returns the configuration directory.
///
/// - **Linux**: `$XDG_CONFIG_HOME/numbered-bookmarks` or `~/.config/numbered-bookmarks`
/// - **macOS**: `~/Library/Application Support/NumberedBookmarks`
/// - **Windows**: `%APPDATA%/NumberedBookmarks`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Returns the data directory.
///
/// - **Linux**: `$XDG_DATA_HOME/numbered-bookmarks` or `~/.local/share/numbered-bookmarks`
/// - **macOS**: `~/Library/Application Support/NumberedBookmarks/data`
/// - **Windows**: `%LOCALAPPDATA%/NumberedBookmarks`
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}
