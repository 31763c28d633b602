//! Core type definitions for dirmirror

mod action;
mod entry;
mod error;
mod report;
mod tree;

pub use action::{ActionKind, SyncAction};
pub use entry::{EntryKind, FileEntry};
pub use error::MirrorError;
pub use report::{ActionRecord, FailureRecord, PassReport};
pub use tree::FileTree;
