use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::{ImpactCommands, MilestoneCommands, SummaryArgs, VariationCommands};

/// Main command-line interface for the Baseline change-control tool
///
/// Baseline tracks contract variations against project milestones: drafting
/// change requests, collecting supplier and customer signatures, and
/// applying approved variations to the project baselines with a full
/// append-only version history and frozen approval certificates.
#[derive(Parser)]
#[command(version, about, name = "bl")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/baseline/baseline.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for the Baseline CLI
///
/// The CLI is organized into four command categories:
/// - `variation`: The change-request lifecycle (create, submit, sign, apply, ...)
/// - `impact`: The milestone impact ledger of a variation
/// - `milestone`: Milestones and their baseline version history
/// - `summary`: Per-project variation statistics
#[derive(Subcommand)]
pub enum Commands {
    /// Manage variations
    #[command(alias = "v")]
    Variation {
        #[command(subcommand)]
        command: VariationCommands,
    },
    /// Manage milestone impacts of a variation
    #[command(alias = "i")]
    Impact {
        #[command(subcommand)]
        command: ImpactCommands,
    },
    /// Manage milestones and baseline history
    #[command(alias = "m")]
    Milestone {
        #[command(subcommand)]
        command: MilestoneCommands,
    },
    /// Show per-project variation statistics
    Summary(SummaryArgs),
}
