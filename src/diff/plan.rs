//! Diff plan types

use crate::types::SyncAction;
use std::cmp::Ordering;
use std::path::Path;

/// Diff plan containing actions and statistics
#[derive(Debug, Clone, PartialEq)]
pub struct DiffPlan {
    /// List of sync actions to execute
    pub actions: Vec<SyncAction>,

    /// Aggregate statistics about the plan
    pub stats: PlanStats,
}

impl DiffPlan {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            stats: PlanStats::default(),
        }
    }

    /// Add an action to the plan and update statistics
    pub fn add_action(&mut self, action: SyncAction) {
        match &action {
            SyncAction::CreateDir(_) => {
                self.stats.create_count += 1;
            }
            SyncAction::CopyNew(entry) => {
                self.stats.create_count += 1;
                self.stats.total_files += 1;
                self.stats.total_bytes += entry.size;
            }
            SyncAction::Overwrite(entry) => {
                self.stats.update_count += 1;
                self.stats.total_files += 1;
                self.stats.total_bytes += entry.size;
            }
            SyncAction::Delete(_) => {
                self.stats.delete_count += 1;
            }
            SyncAction::Skip => {
                self.stats.skip_count += 1;
            }
        }

        self.actions.push(action);
    }

    /// Order actions so that applying them front to back converges the replica
    ///
    /// Deletes come first, deepest paths before their parents, so that a
    /// replica directory standing where the source has a file (or the
    /// reverse) is gone before the create. Creates follow in path order,
    /// which puts every directory before its children. Updates come last.
    pub fn sort_for_execution(&mut self) {
        self.actions.sort_by(|a, b| {
            phase(a).cmp(&phase(b)).then_with(|| match (a, b) {
                (SyncAction::Delete(x), SyncAction::Delete(y)) => y.path.cmp(&x.path),
                _ => compare_paths(a, b),
            })
        });
    }

    /// Paths only in the source
    pub fn creates(&self) -> impl Iterator<Item = &Path> {
        self.paths_where(SyncAction::is_create)
    }

    /// Paths in both trees that differ
    pub fn updates(&self) -> impl Iterator<Item = &Path> {
        self.paths_where(SyncAction::is_overwrite)
    }

    /// Replica paths to remove
    pub fn deletes(&self) -> impl Iterator<Item = &Path> {
        self.paths_where(SyncAction::is_delete)
    }

    /// True when applying the plan would change the replica
    pub fn has_changes(&self) -> bool {
        self.actions.iter().any(|action| !action.is_skip())
    }

    fn paths_where(&self, keep: fn(&SyncAction) -> bool) -> impl Iterator<Item = &Path> {
        self.actions
            .iter()
            .filter(move |action| keep(action))
            .filter_map(|action| action.path().map(|p| p.as_path()))
    }
}

impl Default for DiffPlan {
    fn default() -> Self {
        Self::new()
    }
}

fn phase(action: &SyncAction) -> u8 {
    match action {
        SyncAction::Delete(_) => 0,
        SyncAction::CreateDir(_) | SyncAction::CopyNew(_) => 1,
        SyncAction::Overwrite(_) => 2,
        SyncAction::Skip => 3,
    }
}

fn compare_paths(a: &SyncAction, b: &SyncAction) -> Ordering {
    match (a.path(), b.path()) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Statistics about a diff plan
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlanStats {
    /// Files and symlinks to transfer (CopyNew + Overwrite)
    pub total_files: usize,

    /// Bytes to transfer (CopyNew + Overwrite)
    pub total_bytes: u64,

    /// CreateDir + CopyNew actions
    pub create_count: usize,

    /// Overwrite actions
    pub update_count: usize,

    /// Delete actions
    pub delete_count: usize,

    /// Skip actions
    pub skip_count: usize,
}
