mod app;
mod config;
mod effects;
mod input;
mod logging;
mod terminal;

use clap::Parser;

use crate::config::{AppConfig, CliArgs};

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let config = AppConfig::try_from(args)?;
    logging::initialize(config.log_destination);
    app::run(config)
}
