//! Alchemist CLI - reconcile, validate and apply rules to business tables.

mod cli;
mod commands;

use std::env;

use clap::Parser;
use cli::{Cli, Commands};
use log::LevelFilter;

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    if env::var("RUST_LOG").is_err() {
        let level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
        builder.filter_module("alchemist", level);
    }
    let _ = builder.format_timestamp_millis().try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = commands::Options {
        config: cli.config,
        advisor: cli.advisor,
        verbose: cli.verbose,
    };

    let result = match cli.command {
        Commands::Inspect { file, json } => commands::inspect::run(file, json, &options),
        Commands::Validate { files, rules, json } => {
            commands::validate::run(files, rules, json, &options)
        }
        Commands::Apply { files, rules, out } => commands::apply::run(files, rules, out, &options),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
