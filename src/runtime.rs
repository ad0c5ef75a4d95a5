//! Single-task event loop around a `StateEngine`.
//!
//! The engine is owned by one tokio task. Edits, file-system events and
//! arbitrary engine calls arrive over a channel and run one at a time; the
//! loop sleeps until the engine's next timer deadline when idle.

use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::state_engine::StateEngine;
use crate::types::events::{EditDelta, FsEvent};

/// Work run against the engine inside the loop.
pub type EngineJob = Box<dyn FnOnce(&mut StateEngine) + Send>;

pub enum EngineInput {
    Edit {
        file_path: String,
        edits: Vec<EditDelta>,
    },
    Fs(FsEvent),
    Apply(EngineJob),
    Shutdown,
}

/// Cloneable sender side of a running engine loop.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<EngineInput>,
}

impl EngineHandle {
    /// Queues `input`. Returns `false` once the loop has stopped.
    pub fn send(&self, input: EngineInput) -> bool {
        self.tx.send(input).is_ok()
    }

    pub fn edit(&self, file_path: &str, edits: Vec<EditDelta>) -> bool {
        self.send(EngineInput::Edit {
            file_path: file_path.to_string(),
            edits,
        })
    }

    pub fn fs_event(&self, event: FsEvent) -> bool {
        self.send(EngineInput::Fs(event))
    }

    /// Runs `f` on the engine and waits for its result. `None` if the loop
    /// has stopped.
    pub async fn with<R, F>(&self, f: F) -> Option<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut StateEngine) -> R + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: EngineJob = Box::new(move |engine| {
            let _ = reply_tx.send(f(engine));
        });
        if !self.send(EngineInput::Apply(job)) {
            return None;
        }
        reply_rx.await.ok()
    }

    /// Asks the loop to flush and stop.
    pub fn shutdown(&self) -> bool {
        self.send(EngineInput::Shutdown)
    }
}

/// Moves `engine` into a new task. The join handle gives the engine back
/// after shutdown.
pub fn spawn(engine: StateEngine) -> (EngineHandle, JoinHandle<StateEngine>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(engine, rx));
    (EngineHandle { tx }, task)
}

/// Drives `engine` until a `Shutdown` arrives or every handle is dropped,
/// then flushes.
pub async fn run(mut engine: StateEngine, mut rx: mpsc::UnboundedReceiver<EngineInput>) -> StateEngine {
    loop {
        let deadline = engine.next_deadline();
        tokio::select! {
            input = rx.recv() => match input {
                Some(EngineInput::Edit { file_path, edits }) => {
                    engine.apply_edits(&file_path, &edits);
                }
                Some(EngineInput::Fs(event)) => {
                    engine.handle_fs_event(event, Instant::now());
                }
                Some(EngineInput::Apply(job)) => job(&mut engine),
                Some(EngineInput::Shutdown) | None => break,
            },
            _ = sleep_until(deadline) => {
                let outcome = engine.poll_timers(Instant::now());
                if outcome.wrote || outcome.deletions_committed > 0 {
                    debug!("Timers fired: {:?}", outcome);
                }
            }
        }
    }

    // Failures were already reported through the engine's reporter.
    let _ = engine.shutdown();
    info!("Bookmark engine stopped");
    engine
}

/// Pipes watcher output into the engine loop until either side closes.
pub fn forward_fs_events(
    mut events: mpsc::UnboundedReceiver<FsEvent>,
    handle: EngineHandle,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if !handle.fs_event(event) {
                break;
            }
        }
    })
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
