//! Configuration management
//!
//! Settings come from the command line and, optionally, a TOML file named by
//! `--config`. Command-line values win over file values; exclude lists are
//! concatenated. The result is validated once into an immutable [`Config`].

use crate::types::MirrorError;
use clap::error::ErrorKind;
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name used when `--log-file` points at a directory
pub const DEFAULT_LOG_FILE_NAME: &str = "dirmirror.log";

/// Keep a replica directory identical to a source directory
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "dirmirror", author, version, about, long_about = None)]
pub struct Cli {
    /// Source directory to mirror (must exist)
    #[arg(long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Replica directory kept identical to the source (created if absent)
    #[arg(long, value_name = "DIR")]
    pub replica: Option<PathBuf>,

    /// Log file to append to, or a directory to hold dirmirror.log
    #[arg(long, alias = "log_file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Seconds to wait between the end of one pass and the start of the next
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// TOML file providing any of the settings above
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Glob of paths to leave alone on both sides (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Also compare file contents (BLAKE3) when size and mtime match
    #[arg(long)]
    pub checksum: bool,

    /// Log what would change without touching the replica
    #[arg(long)]
    pub dry_run: bool,

    /// Run a single pass and exit
    #[arg(long)]
    pub once: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Settings accepted from a `--config` TOML file
#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub source: Option<PathBuf>,
    pub replica: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub interval: Option<u64>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub checksum: bool,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, MirrorError> {
        let content = fs::read_to_string(path).map_err(|e| {
            MirrorError::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| MirrorError::Config(format!("{} in {}", e, path.display())))
    }

    pub fn parse(content: &str) -> Result<Self, MirrorError> {
        toml::from_str(content)
            .map_err(|e| MirrorError::Config(format!("Invalid config file: {}", e)))
    }
}

/// Validated, immutable run configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Source directory
    pub source: PathBuf,

    /// Replica directory
    pub replica: PathBuf,

    /// Resolved log file path (never a directory)
    pub log_path: PathBuf,

    /// Sleep between passes
    pub interval: Duration,

    /// Exclude patterns (globs, gitignore syntax)
    pub exclude_patterns: Vec<String>,

    /// Compare BLAKE3 hashes in addition to size and mtime
    pub checksum_mode: bool,

    /// Plan and log only
    pub dry_run: bool,

    /// Stop after the first pass
    pub once: bool,

    /// Debug-level logging
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            replica: PathBuf::new(),
            log_path: PathBuf::from(DEFAULT_LOG_FILE_NAME),
            interval: Duration::from_secs(60),
            exclude_patterns: Vec::new(),
            checksum_mode: false,
            dry_run: false,
            once: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), MirrorError> {
        if self.interval.is_zero() {
            return Err(MirrorError::Config(
                "--interval must be a positive number of seconds".to_string(),
            ));
        }

        let source_meta =
            fs::metadata(&self.source).map_err(|source| MirrorError::SourceUnavailable {
                path: self.source.clone(),
                source,
            })?;
        if !source_meta.is_dir() {
            return Err(MirrorError::Validation(format!(
                "Source is not a directory: {}",
                self.source.display()
            )));
        }

        if let Ok(replica_meta) = fs::metadata(&self.replica) {
            if !replica_meta.is_dir() {
                return Err(MirrorError::Validation(format!(
                    "Replica exists but is not a directory: {}",
                    self.replica.display()
                )));
            }
        }

        let source = normalize(&self.source);
        let replica = normalize(&self.replica);
        if source == replica {
            return Err(MirrorError::Validation(
                "Source and replica cannot be the same directory".to_string(),
            ));
        }
        if replica.starts_with(&source) || source.starts_with(&replica) {
            return Err(MirrorError::Validation(format!(
                "Source and replica cannot be nested inside each other: {} / {}",
                self.source.display(),
                self.replica.display()
            )));
        }

        if normalize(&self.log_path).starts_with(&replica) {
            return Err(MirrorError::Validation(format!(
                "Log file {} lives inside the replica and would be deleted by the next pass",
                self.log_path.display()
            )));
        }

        Ok(())
    }

    /// Map a `--log-file` value to the file that is actually appended to
    pub fn resolve_log_path(path: &Path) -> PathBuf {
        if path.is_dir() {
            path.join(DEFAULT_LOG_FILE_NAME)
        } else {
            path.to_path_buf()
        }
    }
}

impl TryFrom<Cli> for Config {
    type Error = MirrorError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let source = cli
            .source
            .or(file.source)
            .ok_or_else(|| missing_setting("--source", "source"))?;
        let replica = cli
            .replica
            .or(file.replica)
            .ok_or_else(|| missing_setting("--replica", "replica"))?;
        let log_file = cli
            .log_file
            .or(file.log_file)
            .ok_or_else(|| missing_setting("--log-file", "log_file"))?;
        let interval = cli
            .interval
            .or(file.interval)
            .ok_or_else(|| missing_setting("--interval", "interval"))?;

        let mut exclude_patterns = file.exclude;
        exclude_patterns.extend(cli.exclude);

        let config = Config {
            source,
            replica,
            log_path: Config::resolve_log_path(&log_file),
            interval: Duration::from_secs(interval),
            exclude_patterns,
            checksum_mode: cli.checksum || file.checksum,
            dry_run: cli.dry_run,
            once: cli.once,
            verbose: cli.verbose,
        };
        config.validate()?;
        Ok(config)
    }
}

/// clap error kind used when reporting a usage error
///
/// Absent settings read as a missing argument; anything else the user
/// supplied (a bad `--config` file, a zero interval in it) as a bad value.
pub fn usage_error_kind(err: &MirrorError) -> ErrorKind {
    match err {
        MirrorError::MissingSetting { .. } => ErrorKind::MissingRequiredArgument,
        _ => ErrorKind::ValueValidation,
    }
}

fn missing_setting(flag: &str, key: &str) -> MirrorError {
    MirrorError::MissingSetting {
        flag: flag.to_string(),
        key: key.to_string(),
    }
}

/// Absolute form of `path` for containment checks; works for paths that do not exist yet
fn normalize(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut rest = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            let mut out = canonical;
            for component in rest.iter().rev() {
                out.push(component);
            }
            return out;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
            }
            _ => return path.to_path_buf(),
        }
    }
}
