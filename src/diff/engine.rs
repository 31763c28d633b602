//! SyncAction plan generation

use crate::diff::{compare_files, DiffPlan};
use crate::types::{FileEntry, FileTree, SyncAction};
use crate::Config;
use tracing::debug;

/// Generate a sync plan by comparing source and replica trees
///
/// Every source entry missing from the replica becomes a create, every
/// replica entry missing from the source becomes a delete, and entries
/// present on both sides are handed to [`compare_files`]. When the same path
/// holds different kinds (a file on one side, a directory on the other) the
/// replica entry is deleted and the source entry created.
///
/// Replica entries at or below a path the source scan could not read
/// ([`FileTree::unreadable`]) are never deleted: their source state is
/// unknown, not gone.
///
/// The returned plan is already in execution order
/// (see [`DiffPlan::sort_for_execution`]).
///
/// # Example
/// ```
/// use dirmirror::diff::generate_sync_plan;
/// use dirmirror::types::{FileEntry, FileTree};
/// use dirmirror::Config;
/// use std::path::PathBuf;
/// use std::time::{Duration, UNIX_EPOCH};
///
/// let mut src = FileTree::new(PathBuf::from("src"));
/// let replica = FileTree::new(PathBuf::from("replica"));
/// src.insert(
///     PathBuf::from("new.txt"),
///     FileEntry::new(
///         PathBuf::from("new.txt"),
///         4,
///         UNIX_EPOCH + Duration::from_secs(1_000),
///         0o644,
///     ),
/// );
///
/// let plan = generate_sync_plan(&src, &replica, &Config::default());
/// assert_eq!(plan.stats.create_count, 1);
/// ```
pub fn generate_sync_plan(src_tree: &FileTree, dest_tree: &FileTree, config: &Config) -> DiffPlan {
    let mut plan = DiffPlan::new();

    for (path, src_entry) in src_tree.iter() {
        match dest_tree.get(path) {
            None => plan.add_action(create_action(src_entry)),
            Some(dest_entry) if dest_entry.kind != src_entry.kind => {
                plan.add_action(SyncAction::Delete(dest_entry.clone()));
                plan.add_action(create_action(src_entry));
            }
            Some(dest_entry) => plan.add_action(compare_files(src_entry, dest_entry, config)),
        }
    }

    for (path, dest_entry) in dest_tree.iter() {
        if src_tree.contains(path) {
            continue;
        }
        if src_tree.is_unreadable(path) {
            debug!(
                "Keeping {}: its source could not be read this pass",
                path.display()
            );
            continue;
        }
        plan.add_action(SyncAction::Delete(dest_entry.clone()));
    }

    plan.sort_for_execution();

    plan
}

fn create_action(entry: &FileEntry) -> SyncAction {
    if entry.is_dir() {
        SyncAction::CreateDir(entry.clone())
    } else {
        SyncAction::CopyNew(entry.clone())
    }
}
