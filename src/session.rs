//! One tab: its SQL buffer, run state and last result.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::error::ExecutionError;
use crate::result::ResultSet;
use crate::result_view::ResultView;
use crate::statement::{PreviewDirective, Statement};
use crate::worker::{CancelToken, Completion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Scratch,
    File(PathBuf),
}

/// What the last resolved run reported.
#[derive(Debug, Clone, Default)]
pub struct RunMetadata {
    pub row_count: Option<usize>,
    pub elapsed: Option<Duration>,
    pub error: Option<ExecutionError>,
    pub chosen_object: Option<String>,
    pub finished_at: Option<DateTime<Local>>,
}

#[derive(Debug, Clone)]
struct InFlight {
    seq: u64,
    cancel: CancelToken,
    sql: String,
}

/// Result of offering a completion to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The completion was for the latest run and is now shown. `sql` is the
    /// text that ran, for the history log.
    Applied { sql: String, succeeded: bool },
    /// A newer run was submitted (or the run was cancelled); nothing changed.
    Stale,
}

#[derive(Debug)]
pub struct TabSession {
    id: SessionId,
    title: String,
    buffer: String,
    source: SourceKind,
    phase: Phase,
    last_result: Option<Arc<ResultSet>>,
    metadata: RunMetadata,
    latest_seq: u64,
    in_flight: Option<InFlight>,
    pending_preview: Option<PreviewDirective>,
    pub view: ResultView,
}

impl TabSession {
    pub fn new_scratch(id: SessionId, title: impl Into<String>, buffer: impl Into<String>) -> Self {
        Self::with_source(id, title.into(), buffer.into(), SourceKind::Scratch, None)
    }

    /// A tab previewing `path`, pre-filled with its preview statement.
    pub fn new_file(id: SessionId, path: &Path, statement: Statement) -> Self {
        let title = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::with_source(
            id,
            title,
            statement.sql,
            SourceKind::File(path.to_path_buf()),
            statement.preview,
        )
    }

    fn with_source(
        id: SessionId,
        title: String,
        buffer: String,
        source: SourceKind,
        pending_preview: Option<PreviewDirective>,
    ) -> Self {
        Self {
            id,
            title,
            buffer,
            source,
            phase: Phase::Idle,
            last_result: None,
            metadata: RunMetadata::default(),
            latest_seq: 0,
            in_flight: None,
            pending_preview,
            view: ResultView::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn source(&self) -> &SourceKind {
        &self.source
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            SourceKind::File(p) => Some(p),
            SourceKind::Scratch => None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn last_result(&self) -> Option<&Arc<ResultSet>> {
        self.last_result.as_ref()
    }

    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    pub fn next_seq(&self) -> u64 {
        self.latest_seq + 1
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn pending_preview(&self) -> Option<&PreviewDirective> {
        self.pending_preview.as_ref()
    }

    /// Replace the buffer. Never changes the phase. Hand edits drop a pending
    /// preview directive since the buffer no longer holds the generated SQL.
    pub fn set_buffer(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.buffer {
            self.buffer = text;
            self.pending_preview = None;
        }
    }

    /// Start run `seq`, cancelling any run still in flight. Returns the
    /// statement to submit, or `None` when the buffer is blank.
    pub fn begin_run(&mut self, seq: u64, cancel: CancelToken) -> Option<Statement> {
        if self.buffer.trim().is_empty() {
            return None;
        }
        debug_assert!(seq > self.latest_seq, "sequence numbers must increase");
        self.cancel_in_flight();
        self.latest_seq = seq;
        self.in_flight = Some(InFlight {
            seq,
            cancel,
            sql: self.buffer.clone(),
        });
        self.phase = Phase::Running;
        Some(Statement {
            sql: self.buffer.clone(),
            preview: self.pending_preview.clone(),
        })
    }

    /// Apply a worker's completion if it belongs to the latest run.
    pub fn apply(&mut self, completion: Completion) -> RunOutcome {
        let current = match &self.in_flight {
            Some(f) if f.seq == completion.seq && completion.seq == self.latest_seq => f,
            _ => return RunOutcome::Stale,
        };
        if current.cancel.is_cancelled() {
            return RunOutcome::Stale;
        }
        let mut sql = current.sql.clone();
        self.in_flight = None;
        self.metadata.elapsed = Some(completion.elapsed);
        self.metadata.finished_at = Some(Local::now());

        match completion.result {
            Ok(result) => {
                self.phase = Phase::Completed;
                self.metadata.row_count = Some(result.row_count());
                self.metadata.error = None;
                self.metadata.chosen_object = result.chosen_object.clone();
                if let Some(executed) = &result.executed_sql {
                    // Edits made while the run was in flight win over the
                    // rewritten preview.
                    if self.buffer == sql {
                        self.buffer = executed.clone();
                    }
                    sql = executed.clone();
                }
                self.pending_preview = None;
                if self
                    .last_result
                    .as_ref()
                    .map(|prev| prev.headers() != result.headers())
                    .unwrap_or(true)
                {
                    self.view.clear();
                }
                self.last_result = Some(result);
                RunOutcome::Applied {
                    sql,
                    succeeded: true,
                }
            }
            Err(error) => {
                tracing::debug!(session = %self.id, "run failed: {error}");
                self.phase = Phase::Failed;
                self.metadata.row_count = None;
                self.metadata.chosen_object = None;
                self.metadata.error = Some(error);
                self.last_result = None;
                RunOutcome::Applied {
                    sql,
                    succeeded: false,
                }
            }
        }
    }

    /// Trip the cancel token of the run in flight, if any. Its completion
    /// will be stale. A running tab goes back to its previous resolved phase.
    pub fn cancel_in_flight(&mut self) {
        if let Some(flight) = self.in_flight.take() {
            flight.cancel.cancel();
            self.phase = if self.metadata.error.is_some() {
                Phase::Failed
            } else if self.metadata.finished_at.is_some() {
                Phase::Completed
            } else {
                Phase::Idle
            };
        }
    }

    /// Text for the metadata bar under the results.
    pub fn status_line(&self) -> String {
        match self.phase {
            Phase::Idle => "Ready".to_string(),
            Phase::Running => "Executing...".to_string(),
            Phase::Failed => "Error occurred".to_string(),
            Phase::Completed => {
                let mut line = format!(
                    "Rows: {} | Time: {:.4}s",
                    self.metadata.row_count.unwrap_or(0),
                    self.metadata.elapsed.unwrap_or_default().as_secs_f64()
                );
                if let Some(at) = self.metadata.finished_at {
                    line.push_str(&format!(" | Finished: {}", at.format("%H:%M:%S")));
                }
                if let Some(object) = &self.metadata.chosen_object {
                    line.push_str(&format!(" | Table: {object}"));
                }
                line
            }
        }
    }
}
