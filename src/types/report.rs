//! PassReport - What one sync pass did

use super::{ActionKind, EntryKind};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One applied (or, in dry-run mode, planned) action
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRecord {
    pub kind: ActionKind,
    pub entry_kind: EntryKind,
    /// Path relative to the tree roots
    pub path: PathBuf,
    pub at: DateTime<Local>,
}

/// One action that failed and was skipped
#[derive(Debug, Clone, PartialEq)]
pub struct FailureRecord {
    /// `None` when the source entry could not be read, so no action was planned
    pub kind: Option<ActionKind>,
    pub path: PathBuf,
    pub message: String,
    pub at: DateTime<Local>,
}

/// Result of a single comparison-and-reconciliation pass
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    pub started_at: DateTime<Local>,
    pub duration: Duration,
    pub records: Vec<ActionRecord>,
    pub failures: Vec<FailureRecord>,
    pub bytes_copied: u64,
    /// True when nothing was written and `records` lists planned actions
    pub dry_run: bool,
}

impl PassReport {
    pub fn new(started_at: DateTime<Local>, dry_run: bool) -> Self {
        Self {
            started_at,
            duration: Duration::ZERO,
            records: Vec::new(),
            failures: Vec::new(),
            bytes_copied: 0,
            dry_run,
        }
    }

    pub fn record(&mut self, kind: ActionKind, entry_kind: EntryKind, path: &Path) {
        self.records.push(ActionRecord {
            kind,
            entry_kind,
            path: path.to_path_buf(),
            at: Local::now(),
        });
    }

    pub fn record_failure(&mut self, kind: ActionKind, path: &Path, message: String) {
        self.failures.push(FailureRecord {
            kind: Some(kind),
            path: path.to_path_buf(),
            message,
            at: Local::now(),
        });
    }

    /// Source path that could not be read; its replica copy was left alone
    pub fn record_unreadable(&mut self, path: &Path, message: String) {
        self.failures.push(FailureRecord {
            kind: None,
            path: path.to_path_buf(),
            message,
            at: Local::now(),
        });
    }

    /// Number of successful actions of `kind`
    pub fn count(&self, kind: ActionKind) -> usize {
        self.records.iter().filter(|r| r.kind == kind).count()
    }

    /// Paths of successful actions of `kind` on entries of `entry_kind`
    pub fn paths(&self, kind: ActionKind, entry_kind: EntryKind) -> Vec<&Path> {
        self.records
            .iter()
            .filter(|r| r.kind == kind && r.entry_kind == entry_kind)
            .map(|r| r.path.as_path())
            .collect()
    }

    pub fn action_count(&self) -> usize {
        self.records.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// True when the pass found nothing to do
    pub fn is_noop(&self) -> bool {
        self.records.is_empty() && self.failures.is_empty()
    }
}
