//! Hashing utilities

use crate::types::MirrorError;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Compute the BLAKE3 hash of a file
///
/// The file is streamed in 64KB chunks, so memory use does not grow with
/// file size.
///
/// # Example
/// ```no_run
/// use dirmirror::hash::compute_hash;
/// use std::path::Path;
///
/// let hash = compute_hash(Path::new("file.txt"))?;
/// # Ok::<(), dirmirror::types::MirrorError>(())
/// ```
pub fn compute_hash(file_path: &Path) -> Result<[u8; 32], MirrorError> {
    let mut file = File::open(file_path).map_err(MirrorError::Io)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; 64 * 1024];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(MirrorError::Io)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[0..bytes_read]);
    }

    Ok(*hasher.finalize().as_bytes())
}
