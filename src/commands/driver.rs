//! Pass driver: run passes at a fixed interval until stopped

use crate::commands::sync::run_pass;
use crate::types::MirrorError;
use crate::Config;
use std::future::Future;
use std::sync::Arc;
use tokio::signal;
use tracing::{debug, error, info, warn};

/// Totals over all passes run by [`run_loop`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverStats {
    /// Passes that ran to completion (including ones that failed non-fatally)
    pub passes: u64,
    pub actions: usize,
    pub failures: usize,
}

/// Run passes until `shutdown` resolves
///
/// Each pass runs on the blocking pool and is awaited; the interval sleep
/// starts when the pass ends, so passes never overlap. `shutdown` is raced
/// against both the running pass and the sleep. A pass interrupted by
/// `shutdown` is abandoned; its blocking task is cut off when the runtime
/// shuts down.
///
/// With `config.once` set, exactly one pass runs.
///
/// # Errors
/// Returns the first fatal pass error (see [`MirrorError::is_fatal`]).
/// Non-fatal pass errors are logged and the loop carries on.
pub async fn run_loop<F>(config: Config, shutdown: F) -> Result<DriverStats, MirrorError>
where
    F: Future<Output = ()>,
{
    let config = Arc::new(config);
    let mut stats = DriverStats::default();
    tokio::pin!(shutdown);

    info!(
        "Mirroring {} -> {} every {}s",
        config.source.display(),
        config.replica.display(),
        config.interval.as_secs()
    );

    loop {
        let pass_config = Arc::clone(&config);
        let pass = tokio::task::spawn_blocking(move || run_pass(&pass_config));

        let joined = tokio::select! {
            joined = pass => joined,
            _ = &mut shutdown => {
                info!("Stop requested during a pass; abandoning it");
                return Ok(stats);
            }
        };

        stats.passes += 1;
        match joined {
            Ok(Ok(report)) => {
                stats.actions += report.action_count();
                stats.failures += report.failure_count();
            }
            Ok(Err(e)) if e.is_fatal() => {
                error!("{}", e);
                return Err(e);
            }
            Ok(Err(e)) => warn!("Pass aborted: {}", e),
            Err(join_error) => {
                return Err(MirrorError::Runtime(format!(
                    "sync pass task failed: {}",
                    join_error
                )));
            }
        }

        if config.once {
            break;
        }

        debug!("Next pass in {:?}", config.interval);
        tokio::select! {
            _ = tokio::time::sleep(config.interval) => {}
            _ = &mut shutdown => {
                info!("Stop requested; exiting");
                break;
            }
        }
    }

    Ok(stats)
}

/// Resolves on Ctrl+C, or SIGTERM on unix
///
/// If a handler cannot be installed that signal is ignored and a warning is
/// logged; the other one still works.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Stop signal received");
}
