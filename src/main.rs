//! Numbered Bookmarks inspector.
//!
//! Usage: `numbered-bookmarks [PROJECT_ROOT] [--watch] [--verbose]`
//!
//! Prints the bookmark tree and marks stored for a project. With `--watch`,
//! keeps the engine running against the project's file system until Ctrl-C,
//! so renames and deletions are reconciled into the stored document.

use std::path::PathBuf;

use numbered_bookmarks::managers::navigation::{Cursor, Direction, Scope};
use numbered_bookmarks::platform;
use numbered_bookmarks::runtime;
use numbered_bookmarks::services::config_engine::{ConfigEngine, ConfigEngineTrait};
use numbered_bookmarks::services::file_watcher::FileWatcher;
use numbered_bookmarks::services::reporter::Reporter;
use numbered_bookmarks::state_engine::StateEngine;
use numbered_bookmarks::types::bookmark::TreeNode;
use numbered_bookmarks::types::events::StateEvent;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

struct Args {
    root: PathBuf,
    watch: bool,
    verbose: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        root: PathBuf::from("."),
        watch: false,
        verbose: false,
    };
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--watch" | "-w" => args.watch = true,
            "--verbose" | "-v" => args.verbose = true,
            other => args.root = PathBuf::from(other),
        }
    }
    args
}

#[tokio::main]
async fn main() {
    let args = parse_args();

    let default_filter = if args.verbose {
        "numbered_bookmarks=debug"
    } else {
        "numbered_bookmarks=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config_engine = ConfigEngine::new(None);
    let config = match config_engine.load() {
        Ok(config) => config,
        Err(e) => {
            warn!("{}; using defaults", e);
            config_engine.get_config().clone()
        }
    };

    let reporter = Reporter::default();
    let mut engine = StateEngine::open_project(&config, &args.root, &platform::get_data_dir(), reporter);
    if let Some(err) = engine.load_error() {
        warn!("{}", err);
    }

    print_tree(&engine);
    print_marks(&engine);

    if args.watch {
        watch(engine, args.root, config.ignored_dirs).await;
    } else if let Err(e) = engine.shutdown() {
        error!("{}", e);
    }
}

fn print_tree(engine: &StateEngine) {
    fn walk(nodes: &[TreeNode], depth: usize) {
        let indent = "  ".repeat(depth);
        for node in nodes {
            match node {
                TreeNode::Folder(folder) => {
                    let marker = if folder.expanded { "▾" } else { "▸" };
                    println!("{}{} {}", indent, marker, folder.name);
                    walk(&folder.children, depth + 1);
                }
                TreeNode::Bookmark(bookmark) => {
                    let marks: Vec<String> = bookmark
                        .numbers
                        .iter()
                        .map(|(n, line)| format!("{}:{}", n, line + 1))
                        .collect();
                    println!("{}• {} [{}]", indent, bookmark.display_name(), marks.join(" "));
                }
            }
        }
    }

    println!("Bookmarks in {}", engine.document_path().display());
    if engine.items().is_empty() {
        println!("  (none)");
    }
    walk(engine.items(), 1);
}

fn print_marks(engine: &StateEngine) {
    let marks = engine.all_marks_sorted();
    if marks.is_empty() {
        return;
    }
    println!();
    println!("Marks by number:");
    for mark in &marks {
        println!("  {}  {}:{}", mark.number, mark.file_path(), mark.line + 1);
    }
    if let Some(first) = engine.adjacent(Cursor::BeforeFirst, Direction::Next, Scope::Global) {
        println!("Navigation starts at mark {} in {}", first.number, first.file_path());
    }
}

async fn watch(engine: StateEngine, root: PathBuf, ignored_dirs: Vec<String>) {
    let watcher = match FileWatcher::new(root, ignored_dirs) {
        Ok(watcher) => watcher,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };
    info!("Watching {}", watcher.root().display());

    let mut events = engine.subscribe();
    let (handle, task) = runtime::spawn(engine);
    let (_watcher, fs_rx) = watcher.split();
    let forwarder = runtime::forward_fs_events(fs_rx, handle.clone());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(StateEvent::Changed) => info!("Bookmarks changed"),
                Ok(StateEvent::Error(report)) => warn!("{}", report.message),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            },
        }
    }

    info!("Shutting down");
    handle.shutdown();
    forwarder.abort();
    match task.await {
        Ok(engine) => info!("Stopped with {} write(s)", engine.write_count()),
        Err(e) => error!("Engine task failed: {}", e),
    }
}
