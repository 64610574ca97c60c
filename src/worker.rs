//! Off-thread statement execution.
//!
//! Each submitted request runs on its own named thread against the shared
//! engine. The outcome, success or failure, is handed to the completion sink
//! together with the wall-clock time since submission. The interactive thread
//! never waits on a worker.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::engine::QueryEngine;
use crate::error::{ExecutionError, ExecutionErrorKind};
use crate::result::ResultSet;
use crate::session::SessionId;
use crate::statement::Statement;

/// Shared flag a worker polls to stop early.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once the token has been tripped.
    pub fn check(&self) -> Result<(), ExecutionError> {
        if self.is_cancelled() {
            Err(ExecutionError::cancelled())
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub session: SessionId,
    pub seq: u64,
    pub statement: Statement,
    pub submitted_at: Instant,
}

pub type ExecutionResult = Result<Arc<ResultSet>, ExecutionError>;

/// Result envelope posted back to the interactive thread.
#[derive(Debug, Clone)]
pub struct Completion {
    pub session: SessionId,
    pub seq: u64,
    pub elapsed: Duration,
    pub result: ExecutionResult,
}

type Sink = Arc<dyn Fn(Completion) + Send + Sync>;

pub struct Executor {
    engine: Arc<dyn QueryEngine>,
    sink: Sink,
    gate: Arc<Gate>,
}

impl Executor {
    /// `sink` receives every completion on the worker thread that produced it;
    /// the application passes a closure that forwards onto its event channel.
    pub fn new(
        engine: Arc<dyn QueryEngine>,
        max_concurrent: usize,
        sink: impl Fn(Completion) + Send + Sync + 'static,
    ) -> Self {
        Self {
            engine,
            sink: Arc::new(sink),
            gate: Arc::new(Gate::new(max_concurrent)),
        }
    }

    pub fn submit(&self, request: ExecutionRequest, cancel: CancelToken) {
        let engine = Arc::clone(&self.engine);
        let sink = Arc::clone(&self.sink);
        let gate = Arc::clone(&self.gate);
        let name = format!("openduck-worker-{}-{}", request.session.0, request.seq);
        let (session, seq, submitted_at) = (request.session, request.seq, request.submitted_at);

        let spawned = thread::Builder::new().name(name).spawn(move || {
            let result = {
                let _permit = gate.acquire();
                run_guarded(engine.as_ref(), &request.statement, &cancel)
            };
            tracing::debug!(%session, seq, ok = result.is_ok(), "worker finished");
            sink(Completion {
                session,
                seq,
                elapsed: submitted_at.elapsed(),
                result,
            });
        });

        if let Err(e) = spawned {
            tracing::error!(%session, seq, "could not spawn worker: {e}");
            (self.sink)(Completion {
                session,
                seq,
                elapsed: submitted_at.elapsed(),
                result: Err(ExecutionError::new(
                    ExecutionErrorKind::Other,
                    format!("could not start worker: {e}"),
                )),
            });
        }
    }
}

/// Run one statement, turning a panic in the engine into an `Other` error.
fn run_guarded(
    engine: &dyn QueryEngine,
    statement: &Statement,
    cancel: &CancelToken,
) -> ExecutionResult {
    cancel.check()?;
    match panic::catch_unwind(AssertUnwindSafe(|| engine.execute(statement, cancel))) {
        Ok(result) => result.map(Arc::new),
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(ExecutionError::new(
                ExecutionErrorKind::Other,
                format!("engine panicked: {detail}"),
            ))
        }
    }
}

/// Counting gate bounding how many workers talk to the engine at once.
struct Gate {
    limit: usize,
    active: Mutex<usize>,
    freed: Condvar,
}

struct Permit(Arc<Gate>);

impl Gate {
    fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            active: Mutex::new(0),
            freed: Condvar::new(),
        }
    }

    fn acquire(self: &Arc<Self>) -> Permit {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        while *active >= self.limit {
            active = self
                .freed
                .wait(active)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *active += 1;
        Permit(Arc::clone(self))
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        let mut active = self.0.active.lock().unwrap_or_else(PoisonError::into_inner);
        *active = active.saturating_sub(1);
        self.0.freed.notify_one();
    }
}
