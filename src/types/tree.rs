//! FileTree - Directory structure representation

use super::FileEntry;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Scanned directory tree, keyed by path relative to `root_path`
#[derive(Debug, Clone, PartialEq)]
pub struct FileTree {
    /// Map: relative_path → FileEntry
    pub entries: HashMap<PathBuf, FileEntry>,

    /// Aggregate statistics
    pub total_size: u64,
    pub total_files: usize,
    pub total_dirs: usize,

    /// Scan metadata
    pub scan_duration: Duration,
    pub root_path: PathBuf,

    /// Paths the scan could not read or descend into, with the reason.
    /// Whatever lies at or below them is unknown for this scan.
    pub unreadable: BTreeMap<PathBuf, String>,
}

impl FileTree {
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            entries: HashMap::new(),
            total_size: 0,
            total_files: 0,
            total_dirs: 0,
            scan_duration: Duration::from_secs(0),
            root_path,
            unreadable: BTreeMap::new(),
        }
    }

    /// Insert an entry into the tree
    ///
    /// Directories count towards `total_dirs`, everything else towards
    /// `total_files` and `total_size`. Replacing an existing path adjusts the
    /// counters for the old entry first.
    pub fn insert(&mut self, path: PathBuf, entry: FileEntry) {
        if let Some(old_entry) = self.entries.get(&path) {
            if old_entry.is_dir() {
                self.total_dirs = self.total_dirs.saturating_sub(1);
            } else {
                self.total_size = self.total_size.saturating_sub(old_entry.size);
                self.total_files = self.total_files.saturating_sub(1);
            }
        }

        if entry.is_dir() {
            self.total_dirs += 1;
        } else {
            self.total_size += entry.size;
            self.total_files += 1;
        }
        self.entries.insert(path, entry);
    }

    /// Record that `path` (and everything below it) could not be scanned
    ///
    /// An empty path means the location of the failure is unknown, which
    /// covers the whole tree.
    pub fn mark_unreadable(&mut self, path: PathBuf, reason: String) {
        self.unreadable.insert(path, reason);
    }

    /// True when `path` is at or below a path the scan could not read
    pub fn is_unreadable(&self, path: &Path) -> bool {
        self.unreadable.keys().any(|blocked| path.starts_with(blocked))
    }

    pub fn get(&self, path: &Path) -> Option<&FileEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of entries (files, directories and symlinks)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &FileEntry)> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.keys()
    }

    pub fn set_scan_duration(&mut self, duration: Duration) {
        self.scan_duration = duration;
    }
}
