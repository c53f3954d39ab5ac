use crate::cli::ScaleTunnelCli;
use clap::Parser;

/// Initialise the CLI and logging for the scale tunnel runner.
pub fn init() -> ScaleTunnelCli {
    env_logger::init();

    ScaleTunnelCli::parse()
}
