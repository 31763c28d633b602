//! Sequential directory walker

use crate::config::Config;
use crate::types::{FileEntry, FileTree, MirrorError};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};

/// Scan a directory and build a FileTree
///
/// Walks the tree recursively without following symlinks and records every
/// file, directory and symlink below `root_path` (the root itself is not an
/// entry). Unlike a backup of a working copy, nothing is filtered implicitly:
/// hidden files and `.gitignore`d paths are mirrored too. Only the configured
/// exclude patterns are applied.
///
/// # Errors
/// * The root itself cannot be listed → `MirrorError::Io`
/// * Invalid exclude patterns → `MirrorError::Config`
/// * Unreadable entries below the root are logged, skipped and listed in
///   [`FileTree::unreadable`] so that nothing under them is treated as gone
pub fn scan_directory(root_path: &Path, config: &Config) -> Result<FileTree, MirrorError> {
    let start_time = Instant::now();

    // An unreadable root must fail loudly rather than look like an empty tree
    fs::read_dir(root_path)?;

    let mut tree = FileTree::new(root_path.to_path_buf());

    let mut override_builder = ignore::overrides::OverrideBuilder::new(root_path);
    for pattern in &config.exclude_patterns {
        // OverrideBuilder treats `!glob` as "ignore"
        override_builder.add(&format!("!{}", pattern)).map_err(|e| {
            MirrorError::Config(format!("Invalid exclude pattern '{}': {}", pattern, e))
        })?;
    }
    let overrides = override_builder
        .build()
        .map_err(|e| MirrorError::Config(format!("Failed to build exclude overrides: {}", e)))?;

    let walker = ignore::WalkBuilder::new(root_path)
        .standard_filters(false)
        .follow_links(false)
        .overrides(overrides)
        .build();

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                let blocked = traversal_error_path(&e)
                    .and_then(|p| p.strip_prefix(root_path).ok())
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                warn!("Error during directory traversal: {}. Skipping entry.", e);
                tree.mark_unreadable(blocked, e.to_string());
                continue;
            }
        };

        if entry.depth() == 0 {
            continue;
        }

        let file_type = match entry.file_type() {
            Some(ft) => ft,
            None => continue,
        };

        let relative_path = match entry.path().strip_prefix(root_path) {
            Ok(p) => p.to_path_buf(),
            Err(_) => {
                warn!(
                    "Failed to calculate relative path for {}. Entry will be skipped.",
                    entry.path().display()
                );
                continue;
            }
        };

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                warn!(
                    "Failed to read metadata for {}: {}. It may have been deleted during the scan.",
                    entry.path().display(),
                    e
                );
                tree.mark_unreadable(relative_path, e.to_string());
                continue;
            }
        };

        #[cfg(unix)]
        let permissions = {
            use std::os::unix::fs::PermissionsExt;
            metadata.permissions().mode()
        };

        #[cfg(not(unix))]
        let permissions = if metadata.permissions().readonly() {
            0o444
        } else {
            0o644
        };

        let mtime = match metadata.modified() {
            Ok(t) => t,
            Err(e) => {
                warn!(
                    "Failed to get modification time for {}: {}. Skipping.",
                    entry.path().display(),
                    e
                );
                tree.mark_unreadable(relative_path, e.to_string());
                continue;
            }
        };

        let file_entry = if file_type.is_dir() {
            FileEntry::new_dir(relative_path.clone(), mtime, permissions)
        } else if file_type.is_symlink() {
            match fs::read_link(entry.path()) {
                Ok(target) => FileEntry::new_symlink(
                    relative_path.clone(),
                    metadata.len(),
                    mtime,
                    permissions,
                    target,
                ),
                Err(e) => {
                    warn!(
                        "Failed to read symlink target for {}: {}. Skipping.",
                        entry.path().display(),
                        e
                    );
                    tree.mark_unreadable(relative_path, e.to_string());
                    continue;
                }
            }
        } else if file_type.is_file() {
            FileEntry::new(relative_path.clone(), metadata.len(), mtime, permissions)
        } else {
            debug!("Skipping special file {}", entry.path().display());
            continue;
        };

        tree.insert(relative_path, file_entry);
    }

    tree.set_scan_duration(start_time.elapsed());
    debug!(
        "Scanned {}: {} files, {} directories in {:?}",
        root_path.display(),
        tree.total_files,
        tree.total_dirs,
        tree.scan_duration
    );

    Ok(tree)
}

/// Path a traversal error refers to, if ignore attached one
fn traversal_error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            traversal_error_path(err)
        }
        ignore::Error::Partial(errs) if errs.len() == 1 => traversal_error_path(&errs[0]),
        _ => None,
    }
}
