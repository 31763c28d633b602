//! SyncAction - Actions determined by the diff engine

use super::FileEntry;
use std::fmt;
use std::path::PathBuf;

/// Sync action determined by diff engine
#[derive(Debug, Clone, PartialEq)]
pub enum SyncAction {
    /// Create a directory that exists only in the source
    CreateDir(FileEntry),

    /// Copy new file or symlink (exists in source, missing in replica)
    CopyNew(FileEntry),

    /// Overwrite existing file or symlink (source and replica differ)
    Overwrite(FileEntry),

    /// Remove a replica entry (carries the replica's entry so the kind is known)
    Delete(FileEntry),

    /// Skip (entries identical)
    Skip,
}

/// The three outcomes a pass reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionKind {
    Created,
    Updated,
    Deleted,
}

impl ActionKind {
    /// Capitalised verb for log lines
    pub fn verb(self) -> &'static str {
        match self {
            ActionKind::Created => "Created",
            ActionKind::Updated => "Updated",
            ActionKind::Deleted => "Deleted",
        }
    }

    /// Infinitive used when describing a failed or planned action
    pub fn infinitive(self) -> &'static str {
        match self {
            ActionKind::Created => "create",
            ActionKind::Updated => "update",
            ActionKind::Deleted => "delete",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionKind::Created => "created",
            ActionKind::Updated => "updated",
            ActionKind::Deleted => "deleted",
        })
    }
}

impl SyncAction {
    /// Relative path the action touches (`None` for `Skip`)
    pub fn path(&self) -> Option<&PathBuf> {
        self.entry().map(|entry| &entry.path)
    }

    /// Entry carried by the action (`None` for `Skip`)
    pub fn entry(&self) -> Option<&FileEntry> {
        match self {
            SyncAction::CreateDir(entry)
            | SyncAction::CopyNew(entry)
            | SyncAction::Overwrite(entry)
            | SyncAction::Delete(entry) => Some(entry),
            SyncAction::Skip => None,
        }
    }

    pub fn kind(&self) -> Option<ActionKind> {
        match self {
            SyncAction::CreateDir(_) | SyncAction::CopyNew(_) => Some(ActionKind::Created),
            SyncAction::Overwrite(_) => Some(ActionKind::Updated),
            SyncAction::Delete(_) => Some(ActionKind::Deleted),
            SyncAction::Skip => None,
        }
    }

    /// Short name used in execution events
    pub fn action_name(&self) -> &'static str {
        match self {
            SyncAction::CreateDir(_) => "Mkdir",
            SyncAction::CopyNew(_) => "Copy",
            SyncAction::Overwrite(_) => "Update",
            SyncAction::Delete(_) => "Delete",
            SyncAction::Skip => "Skip",
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self, SyncAction::CreateDir(_) | SyncAction::CopyNew(_))
    }

    pub fn is_overwrite(&self) -> bool {
        matches!(self, SyncAction::Overwrite(_))
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, SyncAction::Delete(_))
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, SyncAction::Skip)
    }
}
