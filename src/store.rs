//! Query history and saved queries, persisted as one JSON file.
//!
//! The in-memory store is authoritative. Every mutating call is followed by
//! `flush`, which writes a temp file next to the target and renames it over
//! the old one while holding an exclusive lock on a sibling `.lock` file.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use fs2::FileExt;
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::error::PersistenceError;

/// Default number of history entries kept.
pub const HISTORY_LIMIT: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub sql: String,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedQuery {
    pub name: String,
    pub sql: String,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// ISO-8601 timestamp. RFC 3339 with an offset is read as written. A date or
/// date-time without an offset is taken to be UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| de::Error::custom(format!("invalid timestamp {raw:?}")))
}

/// On-disk layout. Unknown fields are ignored, missing lists are empty.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    history: Vec<HistoryEntry>,
    #[serde(default)]
    saved_queries: Vec<SavedQuery>,
}

#[derive(Debug)]
pub struct QueryStore {
    path: Option<PathBuf>,
    history: Vec<HistoryEntry>,
    saved: BTreeMap<String, SavedQuery>,
    history_limit: usize,
}

impl QueryStore {
    /// Store that never touches the disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            history: Vec::new(),
            saved: BTreeMap::new(),
            history_limit: HISTORY_LIMIT,
        }
    }

    /// Load the store at `path`. A missing file is an empty store. A file that
    /// cannot be read or parsed also yields an empty store, together with the
    /// error so the caller can warn. An unparsable file is copied to
    /// `<path>.bak` first, since the next flush replaces it.
    pub fn load(path: impl Into<PathBuf>) -> (Self, Option<PersistenceError>) {
        let path = path.into();
        let mut store = Self {
            path: Some(path.clone()),
            ..Self::in_memory()
        };
        match read_file(&path) {
            Ok(Some(file)) => {
                store.history = file.history;
                store.saved = file
                    .saved_queries
                    .into_iter()
                    .map(|q| (q.name.clone(), q))
                    .collect();
                tracing::info!(
                    path = %path.display(),
                    history = store.history.len(),
                    saved = store.saved.len(),
                    "loaded query store"
                );
                (store, None)
            }
            Ok(None) => (store, None),
            Err(e) => {
                tracing::warn!("{e}; starting with an empty query store");
                if matches!(e, PersistenceError::Parse { .. }) {
                    let backup = backup_path(&path);
                    match fs::copy(&path, &backup) {
                        Ok(_) => tracing::info!("kept unreadable store as {}", backup.display()),
                        Err(err) => tracing::warn!("could not back up {}: {err}", path.display()),
                    }
                }
                (store, Some(e))
            }
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self.trim_history();
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append `sql` to the history.
    pub fn record(&mut self, sql: &str) -> Result<(), PersistenceError> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Ok(());
        }
        self.history.push(HistoryEntry {
            sql: sql.to_string(),
            timestamp: Utc::now(),
        });
        self.trim_history();
        self.flush()
    }

    /// Save under `name`, replacing any query already saved with that name.
    pub fn save(&mut self, name: &str, sql: &str) -> Result<(), PersistenceError> {
        self.saved.insert(
            name.to_string(),
            SavedQuery {
                name: name.to_string(),
                sql: sql.to_string(),
                timestamp: Utc::now(),
            },
        );
        self.flush()
    }

    /// Returns whether a query was removed.
    pub fn delete_saved(&mut self, name: &str) -> Result<bool, PersistenceError> {
        let removed = self.saved.remove(name).is_some();
        if removed {
            self.flush()?;
        }
        Ok(removed)
    }

    pub fn clear_history(&mut self) -> Result<(), PersistenceError> {
        self.history.clear();
        self.flush()
    }

    /// Oldest first.
    pub fn list_history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// In name order.
    pub fn list_saved(&self) -> impl Iterator<Item = &SavedQuery> {
        self.saved.values()
    }

    pub fn history_entry(&self, index: usize) -> Option<&HistoryEntry> {
        self.history.get(index)
    }

    pub fn saved(&self, name: &str) -> Option<&SavedQuery> {
        self.saved.get(name)
    }

    pub fn last_history(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }

    fn trim_history(&mut self) {
        if self.history.len() > self.history_limit {
            let excess = self.history.len() - self.history_limit;
            self.history.drain(..excess);
        }
    }

    /// Write the whole store to disk. No-op for an in-memory store.
    pub fn flush(&self) -> Result<(), PersistenceError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let file = StoreFile {
            history: self.history.clone(),
            saved_queries: self.saved.values().cloned().collect(),
        };
        let bytes = serde_json::to_vec_pretty(&file)?;
        write_atomic(path, &bytes)
    }
}

/// `query_store.json` -> `query_store.json.bak`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

fn read_file(path: &Path) -> Result<Option<StoreFile>, PersistenceError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistenceError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if content.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| PersistenceError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    let write_err = |source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };
    fs::create_dir_all(dir).map_err(write_err)?;

    let lock_path = path.with_extension("lock");
    let lock = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .map_err(|source| PersistenceError::Lock {
            path: lock_path.clone(),
            source,
        })?;
    FileExt::lock_exclusive(&lock).map_err(|source| PersistenceError::Lock {
        path: lock_path.clone(),
        source,
    })?;

    let result = replace_file(dir, path, bytes);

    if let Err(e) = FileExt::unlock(&lock) {
        tracing::debug!("could not release {}: {e}", lock_path.display());
    }
    result
}

fn replace_file(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    let write_err = |source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
