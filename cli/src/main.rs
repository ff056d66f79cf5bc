use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::args::{Cli, Commands};
use cli::commands::{check, debug, dump, run};
use cli::config::BotsConfig;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = BotsConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Run { path, budget } => run::run_file(path, *budget, &config),
        Commands::Check { path } => check::check_file(path),
        Commands::Dump { path, json } => dump::dump_file(path, *json),
        Commands::Debug { path, breakpoints } => debug::debug_file(path, breakpoints, &config),
    }
}
