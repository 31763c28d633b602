//! Atomic file copy implementation

use crate::types::MirrorError;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Copy a file atomically using the write-then-rename strategy
///
/// 1. Write to a hidden `.<name>.dirmirror-part` file beside the target
/// 2. Flush and sync to disk
/// 3. Preserve permissions and mtime
/// 4. Rename over the final destination
///
/// A reader of the replica therefore sees either the old file or the new
/// one, never a half-written copy. The source mtime is carried over so that
/// the next comparison finds the pair equal.
///
/// # Returns
/// * `Ok(u64)` - Number of bytes copied
///
/// # Example
/// ```no_run
/// use dirmirror::executor::copy_file_atomic;
/// use std::path::Path;
///
/// let bytes = copy_file_atomic(Path::new("source.txt"), Path::new("replica.txt"))?;
/// # Ok::<(), dirmirror::types::MirrorError>(())
/// ```
pub fn copy_file_atomic(src: &Path, dest: &Path) -> Result<u64, MirrorError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| MirrorError::from_io(parent, e))?;
    }

    let part_path = part_path_for(dest);

    let result = write_part_file(src, &part_path)
        .and_then(|bytes| commit(src, &part_path, dest).map(|_| bytes));

    if result.is_err() {
        let _ = fs::remove_file(&part_path);
    }
    result
}

/// Temporary path used while `dest` is being written
pub fn part_path_for(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}.dirmirror-part", name))
}

fn write_part_file(src: &Path, part_path: &Path) -> Result<u64, MirrorError> {
    let mut src_file = File::open(src).map_err(|e| MirrorError::from_io(src, e))?;
    let mut part_file = File::create(part_path).map_err(|e| MirrorError::from_io(part_path, e))?;

    let mut buffer = vec![0u8; 128 * 1024];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = src_file
            .read(&mut buffer)
            .map_err(|e| MirrorError::from_io(src, e))?;
        if bytes_read == 0 {
            break;
        }

        part_file
            .write_all(&buffer[0..bytes_read])
            .map_err(|e| MirrorError::from_io(part_path, e))?;
        total_bytes += bytes_read as u64;
    }

    part_file
        .sync_all()
        .map_err(|e| MirrorError::from_io(part_path, e))?;

    Ok(total_bytes)
}

fn commit(src: &Path, part_path: &Path, dest: &Path) -> Result<(), MirrorError> {
    let src_metadata = fs::metadata(src).map_err(|e| MirrorError::from_io(src, e))?;

    fs::set_permissions(part_path, src_metadata.permissions())
        .map_err(|e| MirrorError::from_io(part_path, e))?;

    let mtime = src_metadata.modified().map_err(MirrorError::Io)?;
    filetime::set_file_mtime(part_path, filetime::FileTime::from_system_time(mtime))
        .map_err(|e| MirrorError::from_io(part_path, e))?;

    // Single rename syscall; atomic on POSIX
    fs::rename(part_path, dest).map_err(|e| MirrorError::from_io(dest, e))
}
