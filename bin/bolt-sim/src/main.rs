//! CLI to inspect protocol parameters, produce and check relay attestations, and simulate a pair
//! of networks running the relay bridge.

mod cli;
mod handlers;
mod params;

use anyhow::Result;
use bolt_bridge_common::logging::{self, LoggerConfig};
use clap::Parser;

use crate::handlers::{attest, demo, show_params};

fn main() -> Result<()> {
    logging::init(LoggerConfig::from_env("bolt-sim"))?;

    let cli = cli::Cli::parse();
    match cli.command {
        cli::Commands::DefaultParams => show_params::handle_default_params(),
        cli::Commands::Sign(args) => attest::handle_sign(args),
        cli::Commands::Recover(args) => attest::handle_recover(args),
        cli::Commands::Demo(args) => demo::handle_demo(args),
    }
}
