mod aggregate;
mod cli;
mod client;
mod commands;
mod console;
mod error;
mod insight;
mod model;
mod session;
mod transcode;
mod util;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config(args) => commands::config::run(&cli.service, args),
        Commands::Files(args) => commands::files::run(&cli.service, args),
        Commands::Run(args) => commands::run::run(&cli.service, args),
        Commands::Summarize(args) => commands::summarize::run(args),
        Commands::Insight(args) => commands::insight::run(&cli.service, args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
