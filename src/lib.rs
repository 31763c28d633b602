//! # dirmirror - One-way directory mirroring
//!
//! Keeps a replica directory identical to a source directory by comparing
//! the two trees at a fixed interval and applying the creates, updates and
//! deletes that converge the replica. Every action is logged to stdout and
//! to an append-mode log file.

// Module declarations
pub mod config;
pub mod logging;
pub mod scanner;
pub mod diff;
pub mod executor;
pub mod hash;
pub mod commands;
pub mod types;

// Re-export commonly used types
pub use types::{FileEntry, FileTree, SyncAction, MirrorError, PassReport};
pub use config::Config;
pub use commands::{run_loop, run_pass};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
