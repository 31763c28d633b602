//! Executor module for file operations

pub mod copy;

use crate::diff::DiffPlan;
use crate::types::{FileEntry, MirrorError, SyncAction};
use crate::Config;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Execution statistics for one plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionStats {
    /// Number of non-skip actions in the input plan.
    pub total_actions: usize,
    /// Number of successfully processed actions.
    pub completed_actions: usize,
    /// Number of failed actions.
    pub failed_actions: usize,
    /// Directory deletes left undone because excluded entries remain inside.
    pub kept_actions: usize,
    /// Aggregate copied bytes (CopyNew + Overwrite).
    pub bytes_copied: u64,
}

/// Events emitted while executing a plan.
#[derive(Debug)]
pub enum ExecutionEvent<'a> {
    /// Action execution started.
    ActionStart {
        index: usize,
        total: usize,
        action: &'a SyncAction,
    },
    /// Action execution succeeded.
    ActionSuccess {
        index: usize,
        total: usize,
        action: &'a SyncAction,
        bytes_copied: u64,
    },
    /// Action was deliberately not applied (a directory still holding
    /// excluded entries).
    ActionKept {
        index: usize,
        total: usize,
        action: &'a SyncAction,
        reason: &'static str,
    },
    /// Action execution failed but executor continued.
    ActionError {
        index: usize,
        total: usize,
        action: &'a SyncAction,
        error: &'a MirrorError,
    },
    /// Plan execution completed (with or without errors).
    Complete { stats: &'a ExecutionStats },
}

/// Optional callback used to receive execution events.
pub type ExecutionCallback<'cb> = dyn FnMut(&ExecutionEvent<'_>) + 'cb;

pub use copy::copy_file_atomic;

/// Execute a sync plan against the replica
///
/// Actions run sequentially in plan order. A failing action is reported
/// through the callback and counted; the remaining actions still run.
/// Skips are not executed and do not produce events.
pub fn execute_plan(
    plan: &DiffPlan,
    config: &Config,
    mut on_event: Option<&mut ExecutionCallback<'_>>,
) -> ExecutionStats {
    let mut stats = ExecutionStats {
        total_actions: plan.actions.iter().filter(|a| !a.is_skip()).count(),
        ..Default::default()
    };

    let runnable = plan.actions.iter().filter(|a| !a.is_skip());
    for (idx, action) in runnable.enumerate() {
        let index = idx + 1;
        let total = stats.total_actions;
        emit_event(
            &mut on_event,
            ExecutionEvent::ActionStart {
                index,
                total,
                action,
            },
        );

        match execute_action(action, config) {
            Ok(ActionOutcome::Kept(reason)) => {
                stats.kept_actions += 1;
                emit_event(
                    &mut on_event,
                    ExecutionEvent::ActionKept {
                        index,
                        total,
                        action,
                        reason,
                    },
                );
            }
            Ok(ActionOutcome::Applied(bytes)) => {
                stats.completed_actions += 1;
                stats.bytes_copied += bytes;
                emit_event(
                    &mut on_event,
                    ExecutionEvent::ActionSuccess {
                        index,
                        total,
                        action,
                        bytes_copied: bytes,
                    },
                );
            }
            Err(error) => {
                stats.failed_actions += 1;
                emit_event(
                    &mut on_event,
                    ExecutionEvent::ActionError {
                        index,
                        total,
                        action,
                        error: &error,
                    },
                );
            }
        }
    }

    emit_event(&mut on_event, ExecutionEvent::Complete { stats: &stats });

    stats
}

/// What applying one action did
enum ActionOutcome {
    /// Applied; bytes copied
    Applied(u64),
    /// Left undone on purpose
    Kept(&'static str),
}

fn execute_action(action: &SyncAction, config: &Config) -> Result<ActionOutcome, MirrorError> {
    match action {
        SyncAction::CreateDir(entry) => {
            let dest_path = config.replica.join(&entry.path);
            fs::create_dir_all(&dest_path).map_err(|e| MirrorError::from_io(&dest_path, e))?;
            Ok(ActionOutcome::Applied(0))
        }
        SyncAction::CopyNew(entry) | SyncAction::Overwrite(entry) => {
            let src_path = config.source.join(&entry.path);
            let dest_path = config.replica.join(&entry.path);
            let bytes = if entry.is_symlink() {
                copy_symlink(&src_path, &dest_path, entry)?
            } else {
                copy_file_atomic(&src_path, &dest_path)?
            };
            Ok(ActionOutcome::Applied(bytes))
        }
        SyncAction::Delete(entry) => {
            let dest_path = config.replica.join(&entry.path);
            if entry.is_dir() && !config.exclude_patterns.is_empty() {
                // Planned child deletes already ran; whatever is left was excluded from the scan
                remove_dir_unless_occupied(&dest_path)
            } else {
                remove_path_any(&dest_path)?;
                Ok(ActionOutcome::Applied(0))
            }
        }
        SyncAction::Skip => Ok(ActionOutcome::Applied(0)),
    }
}

/// Remove an empty replica directory; keep it when entries remain inside
fn remove_dir_unless_occupied(path: &Path) -> Result<ActionOutcome, MirrorError> {
    let err = match fs::remove_dir(path) {
        Ok(()) => return Ok(ActionOutcome::Applied(0)),
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ActionOutcome::Applied(0)),
        Err(e) => e,
    };

    match fs::read_dir(path).map(|mut entries| entries.next().is_some()) {
        Ok(true) => Ok(ActionOutcome::Kept("contains excluded entries")),
        _ => Err(MirrorError::from_io(path, err)),
    }
}

/// Copy a symlink entry without dereferencing its target.
///
/// If a destination path already exists, it is removed first (file/dir/symlink).
fn copy_symlink(src_path: &Path, dest_path: &Path, entry: &FileEntry) -> Result<u64, MirrorError> {
    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent).map_err(|e| MirrorError::from_io(parent, e))?;
    }

    if fs::symlink_metadata(dest_path).is_ok() {
        remove_path_any(dest_path)?;
    }

    let target: PathBuf = match &entry.symlink_target {
        Some(t) => t.clone(),
        None => fs::read_link(src_path).map_err(|e| MirrorError::from_io(src_path, e))?,
    };

    create_symlink(&target, dest_path)?;
    Ok(0)
}

/// Remove any filesystem entry at `path`.
///
/// Directories are removed recursively; files and symlinks are removed as
/// files. An entry that is already gone counts as removed. With exclude
/// patterns configured, directory deletes go through
/// [`remove_dir_unless_occupied`] instead so excluded replica files survive.
fn remove_path_any(path: &Path) -> Result<(), MirrorError> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(MirrorError::from_io(path, e)),
    };

    let result = if metadata.file_type().is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MirrorError::from_io(path, e)),
    }
}

#[cfg(unix)]
fn create_symlink(target: &Path, link_path: &Path) -> Result<(), MirrorError> {
    std::os::unix::fs::symlink(target, link_path).map_err(|e| MirrorError::from_io(link_path, e))
}

#[cfg(windows)]
fn create_symlink(target: &Path, link_path: &Path) -> Result<(), MirrorError> {
    use std::os::windows::fs::{symlink_dir, symlink_file};

    match symlink_file(target, link_path) {
        Ok(()) => Ok(()),
        Err(file_err) => match symlink_dir(target, link_path) {
            Ok(()) => Ok(()),
            Err(_) => Err(MirrorError::from_io(link_path, file_err)),
        },
    }
}

fn emit_event(on_event: &mut Option<&mut ExecutionCallback<'_>>, event: ExecutionEvent<'_>) {
    if let Some(callback) = on_event.as_mut() {
        callback(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    fn config_for(source: &TempDir, replica: &TempDir) -> Config {
        Config {
            source: source.path().to_path_buf(),
            replica: replica.path().to_path_buf(),
            ..Config::default()
        }
    }

    fn entry(path: &str, size: u64) -> FileEntry {
        FileEntry::new(
            PathBuf::from(path),
            size,
            UNIX_EPOCH + Duration::from_secs(1_000),
            0o644,
        )
    }

    fn dir(path: &str) -> FileEntry {
        FileEntry::new_dir(PathBuf::from(path), UNIX_EPOCH, 0o755)
    }

    #[test]
    fn test_execute_plan_copy_overwrite_skip() {
        let src = tempfile::tempdir().expect("create src tempdir");
        let dst = tempfile::tempdir().expect("create dst tempdir");
        let config = config_for(&src, &dst);

        fs::write(src.path().join("new.txt"), b"new-content").expect("write src new");
        fs::write(src.path().join("keep.txt"), b"updated").expect("write src keep");
        fs::write(dst.path().join("keep.txt"), b"old").expect("write dst keep old");

        let mut plan = DiffPlan::new();
        plan.add_action(SyncAction::CopyNew(entry("new.txt", 11)));
        plan.add_action(SyncAction::Overwrite(entry("keep.txt", 7)));
        plan.add_action(SyncAction::Skip);

        let stats = execute_plan(&plan, &config, None);

        assert_eq!(stats.total_actions, 2);
        assert_eq!(stats.completed_actions, 2);
        assert_eq!(stats.failed_actions, 0);
        assert_eq!(stats.bytes_copied, 18);
        assert_eq!(
            fs::read(dst.path().join("new.txt")).expect("read dst new"),
            b"new-content"
        );
        assert_eq!(
            fs::read(dst.path().join("keep.txt")).expect("read dst keep"),
            b"updated"
        );
    }

    #[test]
    fn test_execute_plan_creates_directories() {
        let src = tempfile::tempdir().expect("create src tempdir");
        let dst = tempfile::tempdir().expect("create dst tempdir");
        let config = config_for(&src, &dst);

        let mut plan = DiffPlan::new();
        plan.add_action(SyncAction::CreateDir(dir("empty/nested")));

        let stats = execute_plan(&plan, &config, None);
        assert_eq!(stats.failed_actions, 0);
        assert!(dst.path().join("empty/nested").is_dir());
    }

    #[test]
    fn test_execute_plan_deletes_file_and_directory_tree() {
        let src = tempfile::tempdir().expect("create src tempdir");
        let dst = tempfile::tempdir().expect("create dst tempdir");
        let config = config_for(&src, &dst);

        fs::write(dst.path().join("old.txt"), b"to-delete").expect("write dst old");
        fs::create_dir_all(dst.path().join("gone/deep")).expect("create dst tree");
        fs::write(dst.path().join("gone/deep/x.bin"), b"x").expect("write nested");

        let mut plan = DiffPlan::new();
        plan.add_action(SyncAction::Delete(entry("old.txt", 9)));
        plan.add_action(SyncAction::Delete(dir("gone")));

        let stats = execute_plan(&plan, &config, None);
        assert_eq!(stats.failed_actions, 0);
        assert!(!dst.path().join("old.txt").exists());
        assert!(!dst.path().join("gone").exists());
    }

    #[test]
    fn test_execute_plan_delete_missing_entry_is_ok() {
        let src = tempfile::tempdir().expect("create src tempdir");
        let dst = tempfile::tempdir().expect("create dst tempdir");
        let config = config_for(&src, &dst);

        let mut plan = DiffPlan::new();
        plan.add_action(SyncAction::Delete(entry("missing.txt", 0)));

        let stats = execute_plan(&plan, &config, None);
        assert_eq!(stats.failed_actions, 0);
        assert_eq!(stats.completed_actions, 1);
    }

    #[test]
    #[cfg(unix)]
    fn test_execute_plan_delete_broken_symlink() {
        let src = tempfile::tempdir().expect("create src tempdir");
        let dst = tempfile::tempdir().expect("create dst tempdir");
        let config = config_for(&src, &dst);

        std::os::unix::fs::symlink("missing-target.txt", dst.path().join("broken-link"))
            .expect("create broken symlink");

        let mut plan = DiffPlan::new();
        plan.add_action(SyncAction::Delete(FileEntry::new_symlink(
            PathBuf::from("broken-link"),
            0,
            UNIX_EPOCH,
            0o777,
            PathBuf::from("missing-target.txt"),
        )));

        let stats = execute_plan(&plan, &config, None);
        assert_eq!(stats.failed_actions, 0);
        assert!(fs::symlink_metadata(dst.path().join("broken-link")).is_err());
    }

    #[test]
    #[cfg(unix)]
    fn test_execute_plan_copy_new_preserves_symlink() {
        let src = tempfile::tempdir().expect("create src tempdir");
        let dst = tempfile::tempdir().expect("create dst tempdir");
        let config = config_for(&src, &dst);

        fs::write(src.path().join("target.txt"), b"payload").expect("write target");
        std::os::unix::fs::symlink("target.txt", src.path().join("link.txt"))
            .expect("create symlink");

        let mut plan = DiffPlan::new();
        plan.add_action(SyncAction::CopyNew(FileEntry::new_symlink(
            PathBuf::from("link.txt"),
            0,
            UNIX_EPOCH + Duration::from_secs(2_000),
            0o777,
            PathBuf::from("target.txt"),
        )));

        let stats = execute_plan(&plan, &config, None);
        assert_eq!(stats.failed_actions, 0);

        let link_path = dst.path().join("link.txt");
        let metadata = fs::symlink_metadata(&link_path).expect("symlink metadata");
        assert!(metadata.file_type().is_symlink());
        assert_eq!(
            fs::read_link(&link_path).expect("read link"),
            PathBuf::from("target.txt")
        );
    }

    #[test]
    fn test_execute_plan_continue_on_error() {
        let src = tempfile::tempdir().expect("create src tempdir");
        let dst = tempfile::tempdir().expect("create dst tempdir");
        let config = config_for(&src, &dst);

        fs::write(src.path().join("good.txt"), b"good").expect("write src good");

        let mut plan = DiffPlan::new();
        plan.add_action(SyncAction::CopyNew(entry("missing.txt", 10)));
        plan.add_action(SyncAction::CopyNew(entry("good.txt", 4)));

        let stats = execute_plan(&plan, &config, None);
        assert_eq!(stats.failed_actions, 1);
        assert_eq!(stats.completed_actions, 1);
        assert!(dst.path().join("good.txt").exists());
        assert!(
            !dst.path().join(".missing.txt.dirmirror-part").exists(),
            "failed copies leave no temporary file behind"
        );
    }

    #[test]
    fn test_execute_plan_emits_events() {
        let src = tempfile::tempdir().expect("create src tempdir");
        let dst = tempfile::tempdir().expect("create dst tempdir");
        let config = config_for(&src, &dst);

        fs::write(src.path().join("new.txt"), b"new-content").expect("write src new");
        let mut plan = DiffPlan::new();
        plan.add_action(SyncAction::CopyNew(entry("new.txt", 11)));
        plan.add_action(SyncAction::CopyNew(entry("absent.txt", 1)));
        plan.add_action(SyncAction::Skip);

        let mut events: Vec<&'static str> = Vec::new();
        let mut callback = |event: &ExecutionEvent<'_>| {
            events.push(match event {
                ExecutionEvent::ActionStart { .. } => "start",
                ExecutionEvent::ActionSuccess { .. } => "success",
                ExecutionEvent::ActionKept { .. } => "kept",
                ExecutionEvent::ActionError { .. } => "error",
                ExecutionEvent::Complete { .. } => "complete",
            });
        };

        let stats = execute_plan(&plan, &config, Some(&mut callback));
        assert_eq!(stats.failed_actions, 1);
        assert_eq!(
            events,
            vec!["start", "success", "start", "error", "complete"]
        );
    }

    #[test]
    fn test_directory_delete_keeps_excluded_replica_entries() {
        let src = tempfile::tempdir().expect("create src tempdir");
        let dst = tempfile::tempdir().expect("create dst tempdir");
        let config = Config {
            exclude_patterns: vec!["*.tmp".to_string()],
            ..config_for(&src, &dst)
        };

        fs::create_dir_all(dst.path().join("d")).expect("create dst dir");
        fs::write(dst.path().join("d/a.txt"), b"a").expect("write mirrored file");
        fs::write(dst.path().join("d/keep.tmp"), b"local").expect("write excluded file");
        fs::create_dir_all(dst.path().join("empty")).expect("create empty dir");

        let mut plan = DiffPlan::new();
        plan.add_action(SyncAction::Delete(entry("d/a.txt", 1)));
        plan.add_action(SyncAction::Delete(dir("d")));
        plan.add_action(SyncAction::Delete(dir("empty")));

        let mut kept = Vec::new();
        let mut callback = |event: &ExecutionEvent<'_>| {
            if let ExecutionEvent::ActionKept { action, reason, .. } = event {
                kept.push((action.path().cloned(), *reason));
            }
        };
        let stats = execute_plan(&plan, &config, Some(&mut callback));

        assert_eq!(stats.failed_actions, 0);
        assert_eq!(stats.completed_actions, 2);
        assert_eq!(stats.kept_actions, 1);
        assert_eq!(
            kept,
            vec![(Some(PathBuf::from("d")), "contains excluded entries")]
        );
        assert!(!dst.path().join("d/a.txt").exists());
        assert_eq!(
            fs::read(dst.path().join("d/keep.tmp")).expect("excluded file survives"),
            b"local"
        );
        assert!(!dst.path().join("empty").exists());
    }
}
