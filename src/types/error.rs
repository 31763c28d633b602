//! Error types for dirmirror

use std::path::PathBuf;
use thiserror::Error;

/// Error types for mirroring operations
#[derive(Debug, Error)]
pub enum MirrorError {
    /// Standard IO error (automatically converted via #[from])
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed command-line / config-file settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required setting was given neither on the command line nor in `--config`
    #[error("missing required setting {flag} (pass it on the command line or set `{key}` in --config)")]
    MissingSetting { flag: String, key: String },

    /// Validation error (logic checks)
    #[error("Validation error: {0}")]
    Validation(String),

    /// The source tree cannot be read; nothing can be mirrored
    #[error("Source directory unavailable: {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The log file cannot be opened for appending
    #[error("Cannot open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Permission denied for specific path
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Disk full while writing a specific path
    #[error("Disk full while writing {path}")]
    DiskFull { path: PathBuf },

    /// Background task failure inside the pass driver
    #[error("Pass driver error: {0}")]
    Runtime(String),
}

impl MirrorError {
    /// Errors caused by bad arguments; the CLI answers these with usage text
    pub fn is_usage_error(&self) -> bool {
        matches!(self, MirrorError::Config(_) | MirrorError::MissingSetting { .. })
    }

    /// Errors that must stop the process rather than skip one entry
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MirrorError::Config(_)
                | MirrorError::MissingSetting { .. }
                | MirrorError::Validation(_)
                | MirrorError::SourceUnavailable { .. }
                | MirrorError::LogFile { .. }
                | MirrorError::Runtime(_)
        )
    }

    pub fn is_permission_error(&self) -> bool {
        match self {
            MirrorError::PermissionDenied { .. } => true,
            MirrorError::Io(e) => e.kind() == std::io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }

    pub fn is_disk_space_error(&self) -> bool {
        matches!(self, MirrorError::DiskFull { .. })
    }

    /// Classify a raw IO error raised while touching `path`
    pub fn from_io(path: &std::path::Path, error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::PermissionDenied {
            MirrorError::PermissionDenied {
                path: path.to_path_buf(),
            }
        } else if error.kind() == std::io::ErrorKind::StorageFull
            || matches!(error.raw_os_error(), Some(28 | 122))
        {
            MirrorError::DiskFull {
                path: path.to_path_buf(),
            }
        } else {
            MirrorError::Io(error)
        }
    }
}
