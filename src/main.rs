#![deny(unsafe_code)]

mod cli;
mod commands;
mod config;
mod constants;
mod host;
mod probe;
mod profiles;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::Cli;
use config::JsonStore;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for command output
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let mut store = match &cli.config {
        Some(path) => JsonStore::open(path)?,
        None => JsonStore::open_default()?,
    };

    debug!("Using service store at {:?}", store.path());

    let stdout = std::io::stdout();
    commands::execute(cli.command, &mut store, &mut stdout.lock())
}
