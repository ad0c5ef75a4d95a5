//! Numbered Bookmarks: a state engine for per-file numbered line marks.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod managers;
pub mod platform;
pub mod runtime;
pub mod services;
pub mod state_engine;
pub mod types;
