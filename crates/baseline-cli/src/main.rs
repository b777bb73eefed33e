//! Baseline CLI Application
//!
//! Command-line interface for the baseline change-control engine.

mod args;
mod cli;
mod renderer;

use anyhow::{Context, Result};
use args::{Args, Commands};
use baseline_core::EngineBuilder;
use clap::Parser;
use cli::Cli;
use log::info;
use renderer::TerminalRenderer;
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        no_color,
        command,
    } = Args::parse();

    let mut builder = EngineBuilder::new();
    if let Some(path) = database_file {
        builder = builder.with_database_path(path);
    }
    let engine = builder
        .build()
        .await
        .context("Failed to initialize engine")?;

    let renderer = TerminalRenderer::new(!no_color);

    info!("Baseline started");

    let cli = Cli::new(engine, renderer);
    match command {
        Variation { command } => cli.handle_variation_command(command).await,
        Impact { command } => cli.handle_impact_command(command).await,
        Milestone { command } => cli.handle_milestone_command(command).await,
        Summary(args) => cli.show_summary(args).await,
    }
}
