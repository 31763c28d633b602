//! One comparison-and-reconciliation pass

use crate::diff::{generate_sync_plan, DiffPlan};
use crate::executor::{execute_plan, ExecutionEvent};
use crate::scanner::scan_directory;
use crate::types::{FileTree, MirrorError, PassReport};
use crate::Config;
use chrono::Local;
use indicatif::HumanBytes;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Run a single pass: scan both trees, plan, apply, log
///
/// Every applied action is logged at info level as
/// `<Verb> <entry kind>: <relative path>` and recorded in the returned
/// report. A failing action is logged at error level with a hint and the
/// pass moves on. A replica directory whose source is gone but which still
/// holds excluded entries is kept and logged, not recorded as deleted. In dry-run mode the planned actions are logged and
/// recorded but nothing is written.
///
/// # Errors
/// * Source root unreadable → `MirrorError::SourceUnavailable` (fatal)
/// * Replica root cannot be created or listed → IO error for this pass
pub fn run_pass(config: &Config) -> Result<PassReport, MirrorError> {
    let started = Instant::now();
    let mut report = PassReport::new(Local::now(), config.dry_run);

    let src_tree = scan_directory(&config.source, config).map_err(|e| match e {
        MirrorError::Io(source) => MirrorError::SourceUnavailable {
            path: config.source.clone(),
            source,
        },
        other => other,
    })?;
    for (path, reason) in &src_tree.unreadable {
        warn!(
            "Could not read source {}: {}. Its replica copy is left as is.",
            display_relative(path),
            reason
        );
        report.record_unreadable(path, reason.clone());
    }

    let dest_tree = scan_replica(config)?;

    let plan = generate_sync_plan(&src_tree, &dest_tree, config);
    debug!("{}", format_plan_preview(&plan));

    if config.dry_run {
        record_dry_run(&plan, &mut report);
    } else if plan.has_changes() {
        let mut on_event = |event: &ExecutionEvent<'_>| match event {
            ExecutionEvent::ActionSuccess { action, .. } => {
                if let (Some(kind), Some(entry)) = (action.kind(), action.entry()) {
                    info!("{} {}: {}", kind.verb(), entry.kind, entry.path.display());
                    report.record(kind, entry.kind, &entry.path);
                }
            }
            ExecutionEvent::ActionKept { action, reason, .. } => {
                if let Some(entry) = action.entry() {
                    info!("Kept {}: {}: {}", entry.kind, entry.path.display(), reason);
                }
            }
            ExecutionEvent::ActionError { action, error, .. } => {
                if let (Some(kind), Some(entry)) = (action.kind(), action.entry()) {
                    let (message, suggestion) = humanize_error(error);
                    match suggestion {
                        Some(hint) => error!(
                            "Failed to {} {} {}: {}. {}",
                            kind.infinitive(),
                            entry.kind,
                            entry.path.display(),
                            message,
                            hint
                        ),
                        None => error!(
                            "Failed to {} {} {}: {}",
                            kind.infinitive(),
                            entry.kind,
                            entry.path.display(),
                            message
                        ),
                    }
                    report.record_failure(kind, &entry.path, message);
                }
            }
            ExecutionEvent::ActionStart { action, index, total } => {
                debug!("[{}/{}] {} {:?}", index, total, action.action_name(), action.path());
            }
            ExecutionEvent::Complete { .. } => {}
        };

        let stats = execute_plan(&plan, config, Some(&mut on_event));
        report.bytes_copied = stats.bytes_copied;
    }

    report.duration = started.elapsed();
    log_pass_summary(&report);

    Ok(report)
}

/// Scan the replica, creating its root first when it is missing
fn scan_replica(config: &Config) -> Result<FileTree, MirrorError> {
    match fs::symlink_metadata(&config.replica) {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {
            if config.dry_run {
                info!(
                    "Would create replica directory: {}",
                    config.replica.display()
                );
                return Ok(FileTree::new(config.replica.clone()));
            }
            fs::create_dir_all(&config.replica)
                .map_err(|e| MirrorError::from_io(&config.replica, e))?;
            info!("Created replica directory: {}", config.replica.display());
        }
        Err(e) => return Err(MirrorError::from_io(&config.replica, e)),
    }

    scan_directory(&config.replica, config)
}

fn display_relative(path: &Path) -> String {
    if path.as_os_str().is_empty() {
        ".".to_string()
    } else {
        path.display().to_string()
    }
}

fn record_dry_run(plan: &DiffPlan, report: &mut PassReport) {
    for action in &plan.actions {
        if let (Some(kind), Some(entry)) = (action.kind(), action.entry()) {
            info!(
                "Would {} {}: {}",
                kind.infinitive(),
                entry.kind,
                entry.path.display()
            );
            report.record(kind, entry.kind, &entry.path);
        }
    }
}

fn log_pass_summary(report: &PassReport) {
    if report.is_noop() {
        debug!("Replica already matches source ({:.2?})", report.duration);
        return;
    }

    let summary = format_pass_summary(report);
    if report.failure_count() > 0 {
        warn!("{}", summary);
    } else {
        info!("{}", summary);
    }
}

fn format_pass_summary(report: &PassReport) -> String {
    use crate::types::ActionKind;

    let prefix = if report.dry_run {
        "Dry run complete (no changes made)"
    } else {
        "Pass complete"
    };
    format!(
        "{}: {} created, {} updated, {} deleted, {} failed, {} copied in {:.2?}",
        prefix,
        report.count(ActionKind::Created),
        report.count(ActionKind::Updated),
        report.count(ActionKind::Deleted),
        report.failure_count(),
        HumanBytes(report.bytes_copied),
        report.duration
    )
}

fn format_plan_preview(plan: &DiffPlan) -> String {
    format!(
        "Plan: create {}  update {}  delete {}  unchanged {}  ({} to transfer)",
        plan.stats.create_count,
        plan.stats.update_count,
        plan.stats.delete_count,
        plan.stats.skip_count,
        HumanBytes(plan.stats.total_bytes)
    )
}

/// Plain-English message plus an optional hint for a failed action
fn humanize_error(error: &MirrorError) -> (String, Option<String>) {
    if error.is_permission_error() {
        return (
            "permission denied".to_string(),
            Some("Check permissions on the source and replica paths.".to_string()),
        );
    }
    if error.is_disk_space_error() {
        return (
            "not enough disk space".to_string(),
            Some("Free space on the replica volume.".to_string()),
        );
    }

    match error {
        MirrorError::Io(io) => match io.kind() {
            ErrorKind::NotFound => (
                "file or directory vanished during the pass".to_string(),
                Some("It will be picked up again on the next pass.".to_string()),
            ),
            ErrorKind::AlreadyExists => (
                "the replica path already exists as a different kind of entry".to_string(),
                Some("Remove the conflicting path from the replica.".to_string()),
            ),
            ErrorKind::WriteZero | ErrorKind::BrokenPipe | ErrorKind::UnexpectedEof => (
                "the transfer was interrupted before completion".to_string(),
                Some("It will be retried on the next pass.".to_string()),
            ),
            _ => (format!("I/O operation failed: {}", io), None),
        },
        other => (other.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActionKind, EntryKind, FileEntry, SyncAction};
    use std::io;
    use std::path::PathBuf;
    use std::time::{Duration, UNIX_EPOCH};

    fn config_for(source: &Path, replica: &Path) -> Config {
        Config {
            source: source.to_path_buf(),
            replica: replica.to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn test_format_plan_preview_contains_counts_and_bytes() {
        let mut plan = DiffPlan::new();
        plan.add_action(SyncAction::CopyNew(FileEntry::new(
            PathBuf::from("big.bin"),
            5 * 1024 * 1024,
            UNIX_EPOCH + Duration::from_secs(1_000),
            0o644,
        )));
        plan.add_action(SyncAction::Skip);

        let preview = format_plan_preview(&plan);
        assert!(preview.contains("create 1"));
        assert!(preview.contains("unchanged 1"));
        assert!(preview.contains("MiB"), "got: {preview}");
    }

    #[test]
    fn test_format_pass_summary_marks_dry_run() {
        let mut report = PassReport::new(Local::now(), true);
        report.record(ActionKind::Created, EntryKind::File, Path::new("a.txt"));
        let summary = format_pass_summary(&report);
        assert!(summary.starts_with("Dry run complete"));
        assert!(summary.contains("1 created"));
    }

    #[test]
    fn test_humanize_error_gives_hints() {
        let (message, hint) = humanize_error(&MirrorError::DiskFull {
            path: PathBuf::from("/replica/a"),
        });
        assert_eq!(message, "not enough disk space");
        assert!(hint.is_some());

        let (message, hint) = humanize_error(&MirrorError::Io(io::Error::new(
            ErrorKind::PermissionDenied,
            "denied",
        )));
        assert_eq!(message, "permission denied");
        assert!(hint.is_some());

        let (message, hint) =
            humanize_error(&MirrorError::Io(io::Error::new(ErrorKind::NotFound, "gone")));
        assert!(message.contains("vanished"));
        assert!(hint.is_some());

        let (message, hint) = humanize_error(&MirrorError::Io(io::Error::new(
            ErrorKind::Other,
            "weird",
        )));
        assert!(message.contains("weird"));
        assert!(hint.is_none());
    }

    #[test]
    fn test_run_pass_populates_empty_replica() {
        let root = tempfile::tempdir().expect("tempdir");
        let src = root.path().join("src");
        let dst = root.path().join("replica");
        fs::create_dir_all(src.join("d")).expect("create src");
        fs::write(src.join("a.txt"), b"X").expect("write a");
        fs::write(src.join("d/b.txt"), b"B").expect("write b");

        let report = run_pass(&config_for(&src, &dst)).expect("pass succeeds");

        assert_eq!(
            report.paths(ActionKind::Created, EntryKind::File),
            vec![Path::new("a.txt"), Path::new("d/b.txt")]
        );
        assert_eq!(
            report.paths(ActionKind::Created, EntryKind::Directory),
            vec![Path::new("d")]
        );
        assert_eq!(fs::read(dst.join("a.txt")).expect("read a"), b"X");
        assert_eq!(report.bytes_copied, 2);
    }

    #[test]
    fn test_run_pass_missing_source_is_fatal() {
        let root = tempfile::tempdir().expect("tempdir");
        let config = config_for(&root.path().join("nope"), &root.path().join("replica"));

        let err = run_pass(&config).expect_err("missing source must fail");
        assert!(matches!(err, MirrorError::SourceUnavailable { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_run_pass_dry_run_leaves_missing_replica_absent() {
        let root = tempfile::tempdir().expect("tempdir");
        let src = root.path().join("src");
        let dst = root.path().join("replica");
        fs::create_dir_all(&src).expect("create src");
        fs::write(src.join("a.txt"), b"X").expect("write a");

        let config = Config {
            dry_run: true,
            ..config_for(&src, &dst)
        };
        let report = run_pass(&config).expect("dry run succeeds");

        assert!(report.dry_run);
        assert_eq!(report.count(ActionKind::Created), 1);
        assert!(!dst.exists());
    }
}
