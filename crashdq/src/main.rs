//! Vehicle-crash record data-quality tool.
//!
//! This binary loads a record batch, partitions it into clean, quarantine
//! and discard tables and writes the tables with their metrics to a
//! per-run-date output directory.

use anyhow::{Context, Result};
use clap::Parser;
use crashdq::{Cli, Command, run};
use crashdq_core::{init_logging, initialize_batch_validator};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.global.verbose, cli.global.quiet)?;

    // Initialize JSON Schema validator
    initialize_batch_validator().context("Failed to initialize batch validator")?;

    match &cli.command {
        Command::Classify(args) => run::classify_command(args, &cli.global).await,
        Command::Validate(args) => run::validate_command(args, &cli.global).await,
        Command::Rules(args) => run::rules_command(args).await,
    }
}
