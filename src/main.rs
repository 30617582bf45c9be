//! sdgprogress - Main CLI Entry Point

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use sdgprogress::{
    cli::{commands, Args, Config},
    telemetry,
};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;

    let level = telemetry::parse_level(&config.logging.level)?;
    telemetry::init_tracing(
        args.json_logs || config.logging.json,
        args.verbosity().log_level(level),
    );

    commands::run(&args, &config).await
}
