//! FileEntry - Represents a single entry in a mirrored tree

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

/// What kind of filesystem object an entry is
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

impl EntryKind {
    /// Noun used in log lines ("Created file: ...")
    pub fn label(self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
            EntryKind::Symlink => "symlink",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Represents an entry in the sync tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileEntry {
    /// Relative path from sync root
    pub path: PathBuf,

    /// File, directory or symlink
    pub kind: EntryKind,

    /// Size in bytes (0 for directories)
    pub size: u64,

    /// Last modification time
    pub mtime: SystemTime,

    /// Unix permissions (mode bits)
    pub permissions: u32,

    /// Blake3 content hash (computed lazily, checksum mode only)
    pub hash: Option<[u8; 32]>,

    /// Link target for symlinks
    pub symlink_target: Option<PathBuf>,
}

impl FileEntry {
    /// Create a new regular file entry
    pub fn new(path: PathBuf, size: u64, mtime: SystemTime, permissions: u32) -> Self {
        Self {
            path,
            kind: EntryKind::File,
            size,
            mtime,
            permissions,
            hash: None,
            symlink_target: None,
        }
    }

    /// Create a new directory entry
    pub fn new_dir(path: PathBuf, mtime: SystemTime, permissions: u32) -> Self {
        Self {
            path,
            kind: EntryKind::Directory,
            size: 0,
            mtime,
            permissions,
            hash: None,
            symlink_target: None,
        }
    }

    /// Create a new symlink entry
    pub fn new_symlink(
        path: PathBuf,
        size: u64,
        mtime: SystemTime,
        permissions: u32,
        target: PathBuf,
    ) -> Self {
        Self {
            path,
            kind: EntryKind::Symlink,
            size,
            mtime,
            permissions,
            hash: None,
            symlink_target: Some(target),
        }
    }

    /// Set the hash for this entry
    pub fn with_hash(mut self, hash: [u8; 32]) -> Self {
        self.hash = Some(hash);
        self
    }

    pub fn has_hash(&self) -> bool {
        self.hash.is_some()
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }
}
