//! Single-slot background executor of reconfiguration tasks.

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::time::Duration;

use threadpool::ThreadPool;

use crate::core::placement::Placement;
use crate::core::scalarization::APrioriBounds;
use crate::error::VmpError;
use crate::reconfiguration::Reconfigurator;

/// How long shutdown waits for a running task.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(60);

struct PendingTask {
    receiver: Receiver<Result<Placement, VmpError>>,
    started_at: u32,
}

/// Runs at most one optimizer at a time on a dedicated thread.
///
/// The optimizer gets an owned snapshot, the caller only reads the result through
/// [`await_result`](Self::await_result). Discarding a task does not interrupt it, its result
/// is dropped when it arrives.
pub struct ReconfigurationWorker {
    pool: ThreadPool,
    pending: Option<PendingTask>,
}

impl ReconfigurationWorker {
    pub fn new() -> Self {
        Self {
            pool: ThreadPool::with_name("reconfiguration".to_string(), 1),
            pending: None,
        }
    }

    /// Starts the optimizer on the snapshot. A previously pending task is discarded.
    pub fn submit(&mut self, mut optimizer: Box<dyn Reconfigurator>, snapshot: Placement, bounds: APrioriBounds, time: u32) {
        let (sender, receiver) = channel();
        self.pool.execute(move || {
            let result = optimizer.reconfigure(&snapshot, &bounds);
            // receiver is gone if the task was discarded
            let _ = sender.send(result);
        });
        self.pending = Some(PendingTask {
            receiver,
            started_at: time,
        });
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time unit the pending task was submitted at.
    pub fn started_at(&self) -> Option<u32> {
        self.pending.as_ref().map(|task| task.started_at)
    }

    /// Forgets the pending task, its result will be ignored.
    pub fn discard(&mut self) {
        self.pending = None;
    }

    /// Blocks until the pending task completes.
    ///
    /// Returns `Ok(None)` if nothing is pending. A failed or crashed task is an error.
    pub fn await_result(&mut self) -> Result<Option<Placement>, VmpError> {
        let Some(task) = self.pending.take() else {
            return Ok(None);
        };
        match task.receiver.recv() {
            Ok(result) => result.map(Some),
            Err(_) => Err(VmpError::Reconfiguration(
                "reconfiguration task terminated without result".to_string(),
            )),
        }
    }

    /// Waits for the pending task up to `timeout`, then abandons it.
    ///
    /// Returns `false` if the task had to be abandoned.
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        let Some(task) = self.pending.take() else {
            return true;
        };
        !matches!(task.receiver.recv_timeout(timeout), Err(RecvTimeoutError::Timeout))
    }
}

impl Default for ReconfigurationWorker {
    fn default() -> Self {
        Self::new()
    }
}
