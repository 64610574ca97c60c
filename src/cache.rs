//! Per-user cache directory. Holds the query store and the log file.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// History and saved queries
pub const STORE_FILE: &str = "query_store.json";
/// Application log written by the tracing appender
pub const LOG_FILE: &str = "openduck.log";

/// Everything `--clear-cache` removes. The lock and backup files sit next
/// to the store.
const OWNED_FILES: &[&str] = &[
    STORE_FILE,
    "query_store.lock",
    "query_store.json.bak",
    LOG_FILE,
];

#[derive(Debug, Clone)]
pub struct CacheManager {
    root: PathBuf,
}

impl CacheManager {
    /// `<platform cache dir>/<app_name>`
    pub fn new(app_name: &str) -> Result<Self> {
        let base = dirs::cache_dir().ok_or_else(|| eyre!("No cache directory on this platform"))?;
        Ok(Self::with_dir(base.join(app_name)))
    }

    pub fn with_dir(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.root
    }

    pub fn cache_file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Default location of the query store
    pub fn store_file(&self) -> PathBuf {
        self.cache_file(STORE_FILE)
    }

    pub fn ensure_cache_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .map_err(|e| eyre!("Could not create {}: {}", self.root.display(), e))
    }

    /// Delete the files openduck owns in the cache directory and return the
    /// ones that were actually there. A file that cannot be removed is
    /// reported on stderr and left in place.
    pub fn clear_all(&self) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();
        for name in OWNED_FILES {
            let path = self.cache_file(name);
            match fs::remove_file(&path) {
                Ok(()) => removed.push(path),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => eprintln!("Warning: could not remove {}: {}", path.display(), e),
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clear_all_removes_only_owned_files() {
        let dir = TempDir::new().unwrap();
        let cache = CacheManager::with_dir(dir.path().to_path_buf());
        cache.ensure_cache_dir().unwrap();
        fs::write(cache.store_file(), "{}").unwrap();
        fs::write(cache.cache_file("unrelated.txt"), "keep").unwrap();

        let removed = cache.clear_all().unwrap();
        assert_eq!(removed, vec![cache.store_file()]);
        assert!(!cache.store_file().exists());
        assert!(cache.cache_file("unrelated.txt").exists());
    }
}
