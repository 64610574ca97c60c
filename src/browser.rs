//! Directory tree restricted to directories and recognized data files.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use openduck_cli::FileFormat;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserEntry {
    pub path: PathBuf,
    pub name: String,
    pub depth: usize,
    pub is_dir: bool,
}

/// Children of `dir` worth showing: directories first, then recognized data
/// files, each group by name. Hidden entries are skipped.
pub fn list_dir(dir: &Path) -> io::Result<Vec<(PathBuf, bool)>> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false) || path.is_dir();
        if is_dir {
            dirs.push(path);
        } else if FileFormat::from_path(&path).is_some() {
            files.push(path);
        }
    }
    let by_name = |a: &PathBuf, b: &PathBuf| {
        a.file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .cmp(&b.file_name().map(|n| n.to_string_lossy().to_lowercase()))
    };
    dirs.sort_by(by_name);
    files.sort_by(by_name);
    Ok(dirs
        .into_iter()
        .map(|p| (p, true))
        .chain(files.into_iter().map(|p| (p, false)))
        .collect())
}

/// What activating the selected row did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Expanded,
    Collapsed,
    OpenFile(PathBuf),
    Nothing,
}

#[derive(Debug)]
pub struct FileBrowser {
    root: PathBuf,
    expanded: BTreeSet<PathBuf>,
    entries: Vec<BrowserEntry>,
    selected: usize,
}

impl FileBrowser {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let mut browser = Self {
            root: root.into(),
            expanded: BTreeSet::new(),
            entries: Vec::new(),
            selected: 0,
        };
        browser.refresh();
        browser
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &[BrowserEntry] {
        &self.entries
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_entry(&self) -> Option<&BrowserEntry> {
        self.entries.get(self.selected)
    }

    /// Re-read the tree from disk, keeping expanded directories open.
    pub fn refresh(&mut self) {
        let mut entries = Vec::new();
        self.walk(&self.root.clone(), 0, &mut entries);
        self.entries = entries;
        self.selected = self.selected.min(self.entries.len().saturating_sub(1));
    }

    fn walk(&self, dir: &Path, depth: usize, out: &mut Vec<BrowserEntry>) {
        let children = match list_dir(dir) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!("cannot list {}: {e}", dir.display());
                return;
            }
        };
        for (path, is_dir) in children {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            out.push(BrowserEntry {
                path: path.clone(),
                name,
                depth,
                is_dir,
            });
            if is_dir && self.expanded.contains(&path) {
                self.walk(&path, depth + 1, out);
            }
        }
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.entries.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Expand or collapse the selected directory, or hand back the selected
    /// file.
    pub fn activate(&mut self) -> Activation {
        let Some(entry) = self.entries.get(self.selected).cloned() else {
            return Activation::Nothing;
        };
        if !entry.is_dir {
            return Activation::OpenFile(entry.path);
        }
        let outcome = if self.expanded.remove(&entry.path) {
            Activation::Collapsed
        } else {
            self.expanded.insert(entry.path);
            Activation::Expanded
        };
        self.refresh();
        outcome
    }

    /// Make the parent of the root the new root.
    pub fn go_up(&mut self) {
        if let Some(parent) = self.root.parent() {
            self.root = parent.to_path_buf();
            self.selected = 0;
            self.refresh();
        }
    }
}
