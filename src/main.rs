use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use savecheck::cli::Cli;
use savecheck::{SaveContext, commands};
use std::process;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
const LOG_ENV: &str = "SAVECHECK_LOG";

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

/// Runs one check of the current directory.
fn run() -> Result<()> {
    let _cli = Cli::parse();

    init_logging();

    let ctx = SaveContext::from_current_dir()?;
    commands::check::execute(&ctx)?;

    Ok(())
}

/// Installs the stderr subscriber.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
