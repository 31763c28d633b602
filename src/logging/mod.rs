//! Logging setup
//!
//! Every record goes to stdout and to an append-mode log file. The file
//! writer degrades to a no-op after the first failed write, printing a single
//! warning on stderr, so a full disk or revoked permission never stops the
//! mirror loop.

use crate::types::MirrorError;
use crate::Config;
use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::Subscriber;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Shared append-mode log file
#[derive(Debug, Clone)]
pub struct LogFile {
    path: PathBuf,
    file: Arc<Mutex<Option<File>>>,
}

impl LogFile {
    /// Open (or create) `path` for appending; failure here is fatal
    pub fn open(path: &Path) -> Result<Self, MirrorError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| MirrorError::LogFile {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Arc::new(Mutex::new(Some(file))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once a write has failed and file logging was switched off
    pub fn is_degraded(&self) -> bool {
        self.lock().is_none()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<File>> {
        self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Write for &LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.lock();
        if let Some(file) = guard.as_mut() {
            if let Err(e) = file.write_all(buf) {
                *guard = None;
                drop(guard);
                eprintln!(
                    "Warning: log file {} is no longer writable ({}). Continuing with console logging only.",
                    self.path.display(),
                    e
                );
            }
        }
        // Swallow the bytes either way; the console layer still has them.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(file) = self.lock().as_mut() {
            let _ = file.flush();
        }
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = &'a LogFile;

    fn make_writer(&'a self) -> Self::Writer {
        self
    }
}

/// Build the console + file subscriber without installing it
///
/// `RUST_LOG` overrides the default level (`info`, or `debug` with
/// `verbose`).
pub fn build_subscriber(
    log_file: LogFile,
    verbose: bool,
) -> impl Subscriber + Send + Sync + 'static {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let console_layer = fmt::layer()
        .with_target(false)
        .with_ansi(io::stdout().is_terminal())
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_writer(io::stdout);

    let file_layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_writer(log_file);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
}

/// Open the configured log file and install the global subscriber
pub fn init(config: &Config) -> Result<LogFile, MirrorError> {
    let log_file = LogFile::open(&config.log_path)?;
    build_subscriber(log_file.clone(), config.verbose)
        .try_init()
        .map_err(|e| MirrorError::Runtime(format!("Failed to install logger: {}", e)))?;
    Ok(log_file)
}
