use clap::{CommandFactory, Parser};
use dirmirror::commands::{run_loop, shutdown_signal};
use dirmirror::config::{usage_error_kind, Cli};
use dirmirror::{logging, Config};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Convert CLI args to Config - this validates immediately
    let config = match Config::try_from(cli) {
        Ok(config) => config,
        Err(err) if err.is_usage_error() => Cli::command()
            .error(usage_error_kind(&err), err.to_string())
            .exit(),
        Err(err) => return Err(err.into()),
    };

    let log_file = logging::init(&config)?;
    info!(
        "dirmirror v{} logging to {}",
        dirmirror::VERSION,
        log_file.path().display()
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(run_loop(config, shutdown_signal()));

    // Do not wait for a pass abandoned on stop
    runtime.shutdown_background();

    let stats = result?;
    info!(
        "Stopped after {} pass(es): {} action(s), {} failure(s)",
        stats.passes, stats.actions, stats.failures
    );

    Ok(())
}
