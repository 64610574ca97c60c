//! Error types for the query-session core.
//!
//! None of these are fatal: build errors stop a tab from opening, execution
//! errors become a tab's `Failed` state, persistence errors degrade to a
//! warning while the in-memory store stays intact.

use std::fmt;
use std::path::PathBuf;

use crate::session::SessionId;

/// The file could not be turned into a preview statement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("unsupported file type: {}", path.display())]
    UnsupportedExtension { path: PathBuf },
}

/// Broad category of an engine failure, used for display and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionErrorKind {
    /// The SQL text did not parse.
    Syntax,
    /// A table, column, schema or function does not exist.
    Catalog,
    /// Reading or writing a file failed.
    Io,
    /// An extension could not be installed or loaded.
    Extension,
    /// The run was cancelled before it produced a result.
    Cancelled,
    Other,
}

impl fmt::Display for ExecutionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Syntax => "syntax error",
            Self::Catalog => "missing object",
            Self::Io => "I/O error",
            Self::Extension => "extension error",
            Self::Cancelled => "cancelled",
            Self::Other => "error",
        };
        f.write_str(name)
    }
}

/// An engine-reported failure. The message is kept verbatim so the tab can
/// show exactly what DuckDB said.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ExecutionError {
    pub kind: ExecutionErrorKind,
    pub message: String,
}

impl ExecutionError {
    pub fn new(kind: ExecutionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(ExecutionErrorKind::Cancelled, "Query cancelled")
    }

    /// Classify a DuckDB error message by its `<Kind> Error:` prefix.
    pub fn from_engine_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = classify(&message);
        Self { kind, message }
    }
}

fn classify(message: &str) -> ExecutionErrorKind {
    let head = message.trim_start();
    if head.starts_with("Parser Error") || head.starts_with("Syntax Error") {
        ExecutionErrorKind::Syntax
    } else if head.starts_with("Catalog Error") || head.starts_with("Binder Error") {
        ExecutionErrorKind::Catalog
    } else if head.starts_with("IO Error") || head.starts_with("HTTP Error") {
        ExecutionErrorKind::Io
    } else if head.starts_with("Extension")
        || head.contains("Extension \"")
        || (head.contains("extension")
            && (head.contains("not found") || head.contains("could not be loaded")))
    {
        ExecutionErrorKind::Extension
    } else if head.starts_with("INTERRUPT Error") {
        ExecutionErrorKind::Cancelled
    } else {
        ExecutionErrorKind::Other
    }
}

impl From<duckdb::Error> for ExecutionError {
    fn from(err: duckdb::Error) -> Self {
        Self::from_engine_message(err.to_string())
    }
}

/// The store file could not be read or written.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not encode store: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("could not lock {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// An intent could not be routed.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no open tab with id {0}")]
    UnknownSession(SessionId),
    #[error("no history entry at position {0}")]
    UnknownHistoryEntry(usize),
    #[error("no saved query named {0:?}")]
    UnknownSavedQuery(String),
    #[error("saved query name must not be empty")]
    EmptyName,
    #[error("tab {0} has no result to export")]
    NothingToExport(SessionId),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Writing a result to disk failed.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("could not create {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not build export frame: {0}")]
    Frame(#[from] polars::prelude::PolarsError),
    #[error("could not write workbook: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
}
