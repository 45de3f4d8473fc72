//! Task supervisor
//!
//! Watches background tasks launched next to the VM loop (e.g. a long
//! teleport started by a quest driver) and surfaces the first failure.
//!
//! - `register`/`spawn` add a task to the watch set
//! - `unregister` aborts the task if it is still running, then forgets it
//! - `tick` scans the watch set once; finished tasks are removed, and the
//!   first failed one is returned as an error
//! - `start` runs `tick` periodically on a background task of its own; a
//!   failure ends that loop and is handed to whoever `join`s it

use crate::config::SupervisorSettings;
use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Result type of supervised tasks
pub type TaskResult = anyhow::Result<()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    fn new() -> Self {
        TaskId(Uuid::new_v4())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("task {id} failed: {error:#}")]
    Failed { id: TaskId, error: anyhow::Error },

    #[error("task {id} panicked")]
    Panicked { id: TaskId },

    #[error("supervisor loop was aborted")]
    LoopAborted,
}

/* ===================== Supervisor ===================== */

struct Watched {
    id: TaskId,
    handle: JoinHandle<TaskResult>,
}

struct Inner {
    tasks: Mutex<Vec<Watched>>,
    tick_interval: Duration,
    started: AtomicBool,
    loop_handle: Mutex<Option<JoinHandle<Result<(), SupervisorError>>>>,
    shutdown: CancellationToken,
}

/// Cheap to clone; clones share the same watch set
#[derive(Clone)]
pub struct TaskSupervisor {
    inner: Arc<Inner>,
}

impl TaskSupervisor {
    pub fn new(settings: &SupervisorSettings) -> Self {
        Self::with_tick_interval(settings.tick_interval())
    }

    pub fn with_tick_interval(tick_interval: Duration) -> Self {
        TaskSupervisor {
            inner: Arc::new(Inner {
                tasks: Mutex::new(Vec::new()),
                tick_interval,
                started: AtomicBool::new(false),
                loop_handle: Mutex::new(None),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Watch an already running task
    pub fn register(&self, handle: JoinHandle<TaskResult>) -> TaskId {
        let id = TaskId::new();
        self.inner.tasks.lock().push(Watched { id, handle });
        trace!(%id, "task registered");
        id
    }

    /// Spawn `future` on the runtime and watch it
    pub fn spawn<F>(&self, future: F) -> TaskId
    where
        F: Future<Output = TaskResult> + Send + 'static,
    {
        self.register(tokio::spawn(future))
    }

    /// Stop watching a task, aborting it first if it has not finished
    ///
    /// Returns `false` if the task was not being watched.
    pub fn unregister(&self, id: TaskId) -> bool {
        let mut tasks = self.inner.tasks.lock();
        let Some(pos) = tasks.iter().position(|w| w.id == id) else {
            return false;
        };
        if !tasks[pos].handle.is_finished() {
            tasks[pos].handle.abort();
        }
        tasks.remove(pos);
        trace!(%id, "task unregistered");
        true
    }

    /// Scan the watch set once
    ///
    /// Finished tasks are dropped from the set. The first one (in
    /// registration order) that failed or panicked is returned as an error;
    /// tasks after it are left for the next tick. Aborted tasks are not
    /// failures.
    pub fn tick(&self) -> Result<(), SupervisorError> {
        let mut tasks = self.inner.tasks.lock();
        let mut i = 0;
        while i < tasks.len() {
            if !tasks[i].handle.is_finished() {
                i += 1;
                continue;
            }
            let Some(result) = (&mut tasks[i].handle).now_or_never() else {
                i += 1;
                continue;
            };
            let id = tasks.remove(i).id;
            match result {
                Ok(Ok(())) => trace!(%id, "task finished"),
                Ok(Err(error)) => return Err(SupervisorError::Failed { id, error }),
                Err(err) if err.is_panic() => return Err(SupervisorError::Panicked { id }),
                Err(_) => trace!(%id, "task cancelled"),
            }
        }
        Ok(())
    }

    /// Start the periodic tick loop
    ///
    /// Idempotent: returns `false` if the loop was already started.
    pub fn start(&self) -> bool {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return false;
        }
        let supervisor = self.clone();
        let handle = tokio::spawn(async move { supervisor.run_loop().await });
        *self.inner.loop_handle.lock() = Some(handle);
        debug!(tick_ms = self.inner.tick_interval.as_millis() as u64, "supervisor started");
        true
    }

    /// Wait for the tick loop to end and return its failure, if any
    ///
    /// Returns immediately when the loop was never started or was already joined.
    pub async fn join(&self) -> Result<(), SupervisorError> {
        let handle = self.inner.loop_handle.lock().take();
        match handle {
            Some(handle) => handle.await.unwrap_or(Err(SupervisorError::LoopAborted)),
            None => Ok(()),
        }
    }

    /// Stop the tick loop and abort every watched task
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        for watched in self.inner.tasks.lock().drain(..) {
            watched.handle.abort();
        }
    }

    pub fn len(&self) -> usize {
        self.inner.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.tasks.lock().is_empty()
    }

    async fn run_loop(self) -> Result<(), SupervisorError> {
        let mut ticker = tokio::time::interval(self.inner.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = self.inner.shutdown.cancelled() => {
                    debug!("supervisor stopped");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.tick() {
                        warn!(error = %err, "supervised task failed");
                        return Err(err);
                    }
                }
            }
        }
    }
}

impl Default for TaskSupervisor {
    fn default() -> Self {
        Self::new(&SupervisorSettings::default())
    }
}
