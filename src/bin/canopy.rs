//! Canopy CLI Binary
//!
//! Command-line interface for the canopy virtual filesystem engine.

use canopy::logging::{init_logging, LoggingConfig};
use canopy::tooling::cli::{Cli, CliContext};
use clap::Parser;
use std::process;

fn main() {
    let cli = Cli::parse();

    let context = match CliContext::new(cli.tree_file.clone(), cli.config.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };

    let mut logging = context.config().logging.clone();
    if let Some(level) = cli.log_level.clone() {
        logging.level = level;
    }
    if let Some(format) = cli.log_format.clone() {
        logging.format = format;
    }
    if let Err(e) = init_logging(&logging) {
        eprintln!("Error initializing logging: {}", e);
        process::exit(1);
    }

    match context.execute(&cli.command) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
