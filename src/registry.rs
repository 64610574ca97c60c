//! Owner of every open tab. All intents from the interface are routed here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use openduck_cli::FileFormat;

use crate::error::{BuildError, PersistenceError, RegistryError};
use crate::export::{export_base_name, export_result, ExportFormat};
use crate::session::{RunOutcome, SessionId, TabSession};
use crate::statement::{attach_alias, build_with_alias, PREVIEW_LIMIT};
use crate::store::QueryStore;
use crate::worker::{CancelToken, Completion, ExecutionRequest, Executor};

#[derive(Debug, Clone)]
pub struct RegistryOptions {
    pub preview_limit: usize,
    /// Record applied runs in the history log.
    pub record_history: bool,
    /// Run a file tab as soon as it opens.
    pub run_on_open: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            preview_limit: PREVIEW_LIMIT,
            record_history: true,
            run_on_open: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    NewScratch,
    OpenFile(PathBuf),
    Run(SessionId),
    Edit(SessionId, String),
    Close(SessionId),
    Switch(SessionId),
    LoadHistory { session: SessionId, index: usize },
    LoadSaved { session: SessionId, name: String },
    Save { session: SessionId, name: String },
    DeleteSaved(String),
    Export {
        session: SessionId,
        format: ExportFormat,
        dir: PathBuf,
    },
}

/// What an intent did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    Opened(SessionId),
    Submitted { session: SessionId, seq: u64 },
    /// Run requested on a blank buffer.
    NothingToRun,
    BufferChanged,
    Closed { active: Option<SessionId> },
    Activated(SessionId),
    Saved(String),
    Deleted(bool),
    Exported(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Stale,
    /// The tab was closed before its run finished.
    UnknownSession,
}

pub struct SessionRegistry {
    sessions: Vec<TabSession>,
    active: Option<SessionId>,
    next_id: u64,
    store: QueryStore,
    executor: Executor,
    options: RegistryOptions,
    warnings: Vec<String>,
    /// Catalog alias -> database file it was handed out for. Every tab
    /// shares one engine, so an alias must never name two files.
    attached: HashMap<String, PathBuf>,
}

impl SessionRegistry {
    pub fn new(store: QueryStore, executor: Executor, options: RegistryOptions) -> Self {
        Self {
            sessions: Vec::new(),
            active: None,
            next_id: 1,
            store,
            executor,
            options,
            warnings: Vec::new(),
            attached: HashMap::new(),
        }
    }

    pub fn dispatch(&mut self, intent: Intent) -> Result<Dispatched, RegistryError> {
        tracing::debug!(?intent, "dispatch");
        match intent {
            Intent::NewScratch => {
                let title = format!("Query {}", self.next_id);
                Ok(Dispatched::Opened(self.new_scratch(title, "")))
            }
            Intent::OpenFile(path) => self.open_file(&path, None).map(Dispatched::Opened),
            Intent::Run(id) => self.run(id),
            Intent::Edit(id, text) => {
                self.session_mut(id)?.set_buffer(text);
                Ok(Dispatched::BufferChanged)
            }
            Intent::Close(id) => self.close(id),
            Intent::Switch(id) => {
                self.session(id)?;
                self.active = Some(id);
                Ok(Dispatched::Activated(id))
            }
            Intent::LoadHistory { session, index } => {
                let sql = self
                    .store
                    .history_entry(index)
                    .ok_or(RegistryError::UnknownHistoryEntry(index))?
                    .sql
                    .clone();
                self.session_mut(session)?.set_buffer(sql);
                Ok(Dispatched::BufferChanged)
            }
            Intent::LoadSaved { session, name } => {
                let sql = self
                    .store
                    .saved(&name)
                    .ok_or(RegistryError::UnknownSavedQuery(name))?
                    .sql
                    .clone();
                self.session_mut(session)?.set_buffer(sql);
                Ok(Dispatched::BufferChanged)
            }
            Intent::Save { session, name } => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(RegistryError::EmptyName);
                }
                let sql = self.session(session)?.buffer().to_string();
                let saved = self.store.save(&name, &sql);
                self.note(saved);
                Ok(Dispatched::Saved(name))
            }
            Intent::DeleteSaved(name) => {
                let deleted = match self.store.delete_saved(&name) {
                    Ok(d) => d,
                    Err(e) => {
                        self.note(Err(e));
                        true
                    }
                };
                Ok(Dispatched::Deleted(deleted))
            }
            Intent::Export {
                session,
                format,
                dir,
            } => self.export(session, format, &dir),
        }
    }

    /// Create a scratch tab and make it active.
    pub fn new_scratch(&mut self, title: impl Into<String>, buffer: impl Into<String>) -> SessionId {
        let id = self.allocate_id();
        self.sessions.push(TabSession::new_scratch(id, title, buffer));
        self.active = Some(id);
        id
    }

    /// Open a preview tab for `path` and make it active. The format is
    /// detected from the file name unless given.
    pub fn open_file(
        &mut self,
        path: &Path,
        format: Option<FileFormat>,
    ) -> Result<SessionId, RegistryError> {
        let format = format
            .or_else(|| FileFormat::from_path(path))
            .ok_or_else(|| BuildError::UnsupportedExtension {
                path: path.to_path_buf(),
            })?;
        let alias = if format.is_database() {
            self.alias_for(path)
        } else {
            attach_alias(path)
        };
        let statement = build_with_alias(path, format, self.options.preview_limit, &alias);
        let id = self.allocate_id();
        self.sessions.push(TabSession::new_file(id, path, statement));
        self.active = Some(id);
        tracing::info!(session = %id, path = %path.display(), ?format, "opened file tab");
        if self.options.run_on_open {
            self.run(id)?;
        }
        Ok(id)
    }

    /// The file-stem alias, or the first free `<stem>_N` when that alias is
    /// already attached for a different file. Reopening a file reuses its
    /// alias.
    fn alias_for(&mut self, path: &Path) -> String {
        let file = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let base = attach_alias(path);
        let mut alias = base.clone();
        let mut n = 1;
        while let Some(bound) = self.attached.get(&alias) {
            if *bound == file {
                return alias;
            }
            n += 1;
            alias = format!("{base}_{n}");
        }
        self.attached.insert(alias.clone(), file);
        alias
    }

    fn run(&mut self, id: SessionId) -> Result<Dispatched, RegistryError> {
        let session = self.session_mut(id)?;
        let seq = session.next_seq();
        let cancel = CancelToken::new();
        let Some(statement) = session.begin_run(seq, cancel.clone()) else {
            return Ok(Dispatched::NothingToRun);
        };
        self.executor.submit(
            ExecutionRequest {
                session: id,
                seq,
                statement,
                submitted_at: Instant::now(),
            },
            cancel,
        );
        Ok(Dispatched::Submitted { session: id, seq })
    }

    fn close(&mut self, id: SessionId) -> Result<Dispatched, RegistryError> {
        let idx = self
            .sessions
            .iter()
            .position(|s| s.id() == id)
            .ok_or(RegistryError::UnknownSession(id))?;
        let mut session = self.sessions.remove(idx);
        session.cancel_in_flight();
        if self.active == Some(id) {
            self.active = self.sessions.iter().map(TabSession::id).max();
        }
        tracing::debug!(session = %id, "closed tab");
        Ok(Dispatched::Closed {
            active: self.active,
        })
    }

    fn export(
        &mut self,
        id: SessionId,
        format: ExportFormat,
        dir: &Path,
    ) -> Result<Dispatched, RegistryError> {
        let session = self.session(id)?;
        let result = session
            .last_result()
            .ok_or(RegistryError::NothingToExport(id))?;
        let rows = session.view.visible_rows(result);
        let shown = result.subset(&rows);
        let sql = result.executed_sql.as_deref().unwrap_or(session.buffer());
        let path = export_result(&shown, format, dir, &export_base_name(sql))?;
        Ok(Dispatched::Exported(path))
    }

    /// Offer a worker's completion to its tab and log applied runs.
    pub fn apply_completion(&mut self, completion: Completion) -> ApplyOutcome {
        let id = completion.session;
        let Some(session) = self.sessions.iter_mut().find(|s| s.id() == id) else {
            tracing::debug!(session = %id, seq = completion.seq, "dropping result for closed tab");
            return ApplyOutcome::UnknownSession;
        };
        match session.apply(completion) {
            RunOutcome::Applied { sql, succeeded } => {
                tracing::info!(session = %id, succeeded, "run finished");
                if self.options.record_history {
                    let recorded = self.store.record(&sql);
                    self.note(recorded);
                }
                ApplyOutcome::Applied
            }
            RunOutcome::Stale => {
                tracing::debug!(session = %id, "discarding stale result");
                ApplyOutcome::Stale
            }
        }
    }

    fn note(&mut self, result: Result<(), PersistenceError>) {
        if let Err(e) = result {
            tracing::warn!("{e}");
            self.warnings.push(e.to_string());
        }
    }

    /// Persistence problems since the last call, oldest first.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    fn allocate_id(&mut self) -> SessionId {
        let id = SessionId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Open tabs in creation order.
    pub fn sessions(&self) -> &[TabSession] {
        &self.sessions
    }

    pub fn session(&self, id: SessionId) -> Result<&TabSession, RegistryError> {
        self.sessions
            .iter()
            .find(|s| s.id() == id)
            .ok_or(RegistryError::UnknownSession(id))
    }

    pub fn session_mut(&mut self, id: SessionId) -> Result<&mut TabSession, RegistryError> {
        self.sessions
            .iter_mut()
            .find(|s| s.id() == id)
            .ok_or(RegistryError::UnknownSession(id))
    }

    pub fn active_id(&self) -> Option<SessionId> {
        self.active
    }

    pub fn active(&self) -> Option<&TabSession> {
        self.active.and_then(|id| self.session(id).ok())
    }

    pub fn active_mut(&mut self) -> Option<&mut TabSession> {
        let id = self.active?;
        self.session_mut(id).ok()
    }

    pub fn next_tab(&mut self) -> Option<SessionId> {
        self.step(1)
    }

    pub fn prev_tab(&mut self) -> Option<SessionId> {
        self.step(-1)
    }

    fn step(&mut self, delta: isize) -> Option<SessionId> {
        let len = self.sessions.len() as isize;
        if len == 0 {
            return None;
        }
        let current = self
            .active
            .and_then(|id| self.sessions.iter().position(|s| s.id() == id))
            .unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        let id = self.sessions[next].id();
        self.active = Some(id);
        Some(id)
    }

    pub fn store(&self) -> &QueryStore {
        &self.store
    }

    pub fn clear_history(&mut self) {
        let cleared = self.store.clear_history();
        self.note(cleared);
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }
}
