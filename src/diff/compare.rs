//! Entry comparison logic

use crate::hash::compute_hash;
use crate::types::{EntryKind, FileEntry, SyncAction};
use crate::Config;
use tracing::warn;

/// Compare two entries of the same kind and decide whether the replica needs an update
///
/// Rules, applied in order:
///
/// 1. **Directories** are always equal; their contents are compared entry by entry.
/// 2. **Symlinks** are equal when they point at the same target.
/// 3. **Files** differ when the sizes differ or the modification times differ
///    in either direction. A replica file that is newer than its source is
///    still replaced: the source is authoritative.
/// 4. In checksum mode, files whose size and mtime match are additionally
///    compared by BLAKE3 hash. A file that cannot be hashed is treated as changed.
///
/// Entries of different kinds are handled by the plan generator (delete then create).
pub fn compare_files(src: &FileEntry, dest: &FileEntry, config: &Config) -> SyncAction {
    match src.kind {
        EntryKind::Directory => SyncAction::Skip,
        EntryKind::Symlink => {
            if src.symlink_target == dest.symlink_target {
                SyncAction::Skip
            } else {
                SyncAction::Overwrite(src.clone())
            }
        }
        EntryKind::File => {
            if src.size != dest.size || src.mtime != dest.mtime {
                return SyncAction::Overwrite(src.clone());
            }

            if config.checksum_mode && !contents_match(src, dest, config) {
                return SyncAction::Overwrite(src.clone());
            }

            SyncAction::Skip
        }
    }
}

fn contents_match(src: &FileEntry, dest: &FileEntry, config: &Config) -> bool {
    let src_hash = match src.hash {
        Some(hash) => Ok(hash),
        None => compute_hash(&config.source.join(&src.path)),
    };
    let dest_hash = match dest.hash {
        Some(hash) => Ok(hash),
        None => compute_hash(&config.replica.join(&dest.path)),
    };

    match (src_hash, dest_hash) {
        (Ok(a), Ok(b)) => a == b,
        (Err(e), _) | (_, Err(e)) => {
            warn!(
                "Could not hash {}: {}. Treating it as changed.",
                src.path.display(),
                e
            );
            false
        }
    }
}
