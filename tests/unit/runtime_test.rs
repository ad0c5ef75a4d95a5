//! Tests for the single-task engine loop.

use std::path::Path;
use std::time::Duration;

use numbered_bookmarks::runtime::{self, EngineInput};
use numbered_bookmarks::services::reporter::Reporter;
use numbered_bookmarks::state_engine::StateEngine;
use numbered_bookmarks::types::config::EngineConfig;
use numbered_bookmarks::types::events::{EditDelta, FsEvent};
use tokio::sync::mpsc;

fn fast_config() -> EngineConfig {
    EngineConfig {
        save_debounce_ms: 20,
        deletion_grace_ms: 50,
        ..EngineConfig::default()
    }
}

fn open(dir: &Path) -> StateEngine {
    StateEngine::open(&fast_config(), dir.join("bookmarks.json"), Reporter::default())
}

#[tokio::test]
async fn test_debounced_write_fires_without_input() {
    let dir = tempfile::tempdir().unwrap();
    let (handle, task) = runtime::spawn(open(dir.path()));

    handle.with(|engine| engine.set_mark("a.rs", 1, 3)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(dir.path().join("bookmarks.json").exists());

    let writes = handle.with(|engine| engine.write_count()).await.unwrap();
    assert_eq!(writes, 1);

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test]
async fn test_edits_are_applied_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let (handle, task) = runtime::spawn(open(dir.path()));

    handle.with(|engine| engine.set_mark("a.rs", 1, 10)).await.unwrap();
    handle.edit("a.rs", vec![EditDelta::insert(0, 5)]);
    handle.edit("a.rs", vec![EditDelta::new(12, 14, 0)]);

    let line = handle.with(|engine| engine.line_of("a.rs", 1)).await.unwrap();
    assert_eq!(line, Some(13));

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test]
async fn test_grace_period_expires_on_its_own() {
    let dir = tempfile::tempdir().unwrap();
    let (handle, task) = runtime::spawn(open(dir.path()));

    handle.with(|engine| engine.set_mark("a.rs", 1, 1)).await.unwrap();
    handle.fs_event(FsEvent::Deleted("a.rs".to_string()));
    tokio::time::sleep(Duration::from_millis(200)).await;

    let gone = handle
        .with(|engine| engine.find_by_file_path("a.rs").is_none())
        .await
        .unwrap();
    assert!(gone);

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test]
async fn test_shutdown_flushes_pending_write() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig {
        save_debounce_ms: 60_000,
        ..EngineConfig::default()
    };
    let engine = StateEngine::open(&config, dir.path().join("bookmarks.json"), Reporter::default());
    let (handle, task) = runtime::spawn(engine);

    handle.with(|engine| engine.set_mark("a.rs", 1, 1)).await.unwrap();
    handle.shutdown();
    let engine = task.await.unwrap();

    assert_eq!(engine.write_count(), 1);
    assert!(!engine.has_pending_write());
    assert!(!handle.send(EngineInput::Shutdown));
}

#[tokio::test]
async fn test_forwarded_fs_events_reach_engine() {
    let dir = tempfile::tempdir().unwrap();
    let (handle, task) = runtime::spawn(open(dir.path()));
    handle.with(|engine| engine.set_mark("old.rs", 2, 2)).await.unwrap();

    let (tx, rx) = mpsc::unbounded_channel();
    let forwarder = runtime::forward_fs_events(rx, handle.clone());
    tx.send(FsEvent::Renamed {
        from: "old.rs".to_string(),
        to: "new.rs".to_string(),
    })
    .unwrap();
    drop(tx);
    forwarder.await.unwrap();

    let moved = handle
        .with(|engine| engine.line_of("new.rs", 2))
        .await
        .unwrap();
    assert_eq!(moved, Some(2));

    handle.shutdown();
    task.await.unwrap();
}
