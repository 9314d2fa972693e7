//! harmony: a headless music player.
//!
//! Plays a directory or a JSON track list through the default audio output.
//! Control it by typing commands on stdin (`next`, `seek +10`, `repeat all`,
//! ...) or through any MPRIS client.

mod cli;
mod config;
mod control;
mod error;
mod library;
mod media;
mod mpris;
mod player;
mod runtime;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = cli::Cli::parse();

    let (mut settings, problem) = runtime::load_settings(cli.config.as_deref());
    cli.apply_overrides(&mut settings);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();

    if let Some(e) = problem {
        tracing::warn!(error = %e, "config ignored, using defaults");
    }

    if cli.print_config {
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    runtime::run(&cli, settings)?;
    Ok(())
}
