// Shared type definitions
// Each submodule defines types used across the engine.

pub mod bookmark;
pub mod config;
pub mod errors;
pub mod events;
