use anyhow::{Context, Result};
use clap::Args;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use flexi_logger::{default_format, Logger, LoggerHandle};
use log::Level;

#[derive(Args, Debug)]
pub struct Params {
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

/// Logs to stderr. `RUST_LOG` overrides the level picked with `-v`/`-q`.
pub fn configure_from(params: &Params) -> Result<LoggerHandle> {
    // log_level() returns None iff fully silenced; errors still get through
    let cli_level = params.verbose.log_level().unwrap_or(Level::Error);

    Logger::try_with_env_or_str(cli_level.to_string())
        .context("failed to parse logger spec from env RUST_LOG or cli level")?
        .format(default_format)
        .start()
        .context("failed to start logger")
}
