//! Content hashing tests (checksum mode)
//!
//! Files whose size and mtime match are only told apart when checksum mode is on.

use dirmirror::hash::compute_hash;
use dirmirror::run_pass;
use dirmirror::types::{ActionKind, EntryKind};
use dirmirror::Config;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};
use tempfile::TempDir;

fn create_file_with_mtime(path: &Path, content: &[u8], mtime_secs: u64) {
    fs::write(path, content).expect("Failed to write test file");
    filetime::set_file_mtime(
        path,
        filetime::FileTime::from_system_time(UNIX_EPOCH + Duration::from_secs(mtime_secs)),
    )
    .expect("Failed to set mtime");
}

/// Source and replica holding `same.txt` with equal size and mtime but different bytes
fn disguised_change() -> (TempDir, PathBuf, PathBuf) {
    let root = TempDir::new().expect("tempdir");
    let src = root.path().join("src");
    let dst = root.path().join("replica");
    fs::create_dir_all(&src).expect("create src");
    fs::create_dir_all(&dst).expect("create replica");

    create_file_with_mtime(&src.join("same.txt"), b"AAAA", 1_000_000);
    create_file_with_mtime(&dst.join("same.txt"), b"BBBB", 1_000_000);
    (root, src, dst)
}

fn config(src: &Path, dst: &Path, checksum_mode: bool) -> Config {
    Config {
        source: src.to_path_buf(),
        replica: dst.to_path_buf(),
        checksum_mode,
        ..Config::default()
    }
}

#[test]
fn test_compute_hash_deterministic() {
    let temp_dir = TempDir::new().expect("tempdir");
    let file1 = temp_dir.path().join("file1.txt");
    let file2 = temp_dir.path().join("file2.txt");
    fs::write(&file1, b"Same content").expect("write file1");
    fs::write(&file2, b"Same content").expect("write file2");

    let hash1 = compute_hash(&file1).expect("Failed to compute hash1");
    let hash2 = compute_hash(&file2).expect("Failed to compute hash2");

    assert_eq!(hash1, hash2);
}

#[test]
fn test_compute_hash_different_content() {
    let temp_dir = TempDir::new().expect("tempdir");
    let file1 = temp_dir.path().join("file1.txt");
    let file2 = temp_dir.path().join("file2.txt");
    fs::write(&file1, b"Content A").expect("write file1");
    fs::write(&file2, b"Content B").expect("write file2");

    assert_ne!(
        compute_hash(&file1).expect("hash1"),
        compute_hash(&file2).expect("hash2")
    );
}

#[test]
fn test_compute_hash_large_file() {
    let temp_dir = TempDir::new().expect("tempdir");
    let path = temp_dir.path().join("large.bin");
    let content: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
    fs::write(&path, &content).expect("write large file");

    let hash = compute_hash(&path).expect("hash large file");
    assert_eq!(hash, *blake3::hash(&content).as_bytes());
}

#[test]
fn test_checksum_mode_off_trusts_metadata() {
    let (_root, src, dst) = disguised_change();

    let report = run_pass(&config(&src, &dst, false)).expect("pass succeeds");

    assert!(report.is_noop());
    assert_eq!(fs::read(dst.join("same.txt")).expect("read replica"), b"BBBB");
}

#[test]
fn test_checksum_mode_detects_content_change() {
    let (_root, src, dst) = disguised_change();

    let report = run_pass(&config(&src, &dst, true)).expect("pass succeeds");

    assert_eq!(
        report.paths(ActionKind::Updated, EntryKind::File),
        vec![Path::new("same.txt")]
    );
    assert_eq!(fs::read(dst.join("same.txt")).expect("read replica"), b"AAAA");

    let second = run_pass(&config(&src, &dst, true)).expect("second pass succeeds");
    assert!(second.is_noop(), "replica should have converged");
}

#[test]
fn test_checksum_mode_skips_identical_content() {
    let root = TempDir::new().expect("tempdir");
    let src = root.path().join("src");
    let dst = root.path().join("replica");
    fs::create_dir_all(&src).expect("create src");
    fs::create_dir_all(&dst).expect("create replica");
    create_file_with_mtime(&src.join("same.txt"), b"CCCC", 2_000_000);
    create_file_with_mtime(&dst.join("same.txt"), b"CCCC", 2_000_000);

    let report = run_pass(&config(&src, &dst, true)).expect("pass succeeds");
    assert!(report.is_noop());
}

#[test]
fn test_size_mismatch_always_overwrites() {
    let root = TempDir::new().expect("tempdir");
    let src = root.path().join("src");
    let dst = root.path().join("replica");
    fs::create_dir_all(&src).expect("create src");
    fs::create_dir_all(&dst).expect("create replica");
    create_file_with_mtime(&src.join("a.txt"), b"longer", 3_000_000);
    create_file_with_mtime(&dst.join("a.txt"), b"short", 3_000_000);

    let report = run_pass(&config(&src, &dst, false)).expect("pass succeeds");
    assert_eq!(report.count(ActionKind::Updated), 1);
    assert_eq!(fs::read(dst.join("a.txt")).expect("read replica"), b"longer");
}
