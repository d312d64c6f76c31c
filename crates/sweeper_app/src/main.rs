use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

mod cli;
mod commands;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    sweeper_logging::initialize(cli.log.into(), LevelFilter::Info);

    match cli.command {
        Command::Sweep(args) => commands::sweep::run(args).await,
        Command::Pending(args) => commands::pending::run(args),
    }
}
