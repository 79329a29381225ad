// src/main.rs — seqforge entry point

use clap::Parser;

use seqforge::cli::inspect;
use seqforge::cli::run::run_generation;
use seqforge::cli::{Cli, Commands};
use seqforge::infra::config::Config;
use seqforge::infra::logger;

fn main() {
    // Initialize logging (respects RUST_LOG / SEQFORGE_LOG)
    logger::init_logging("warn");

    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config (falls back to defaults if no seqforge.toml)
    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Some(Commands::Targets) => inspect::show_targets(),
        Some(Commands::Config) => inspect::show_config(&config),
        Some(Commands::Run(ref args)) => run_generation(args, config),
        None => run_generation(&cli.run, config),
    }
}
