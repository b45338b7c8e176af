//! Command-line interface

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ds9_rgb_grid", version, about)]
pub struct Cli {
    /// Configuration file merged over the built-in defaults
    /// (default: ./ds9_grid.json when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Coordinate CSV, overriding `input_csv` from the configuration
    #[arg(long, global = true, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Warnings and errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Composite every survey, then build the grid (default)
    Run(SurveyArgs),
    /// Only run DS9 over the targets
    Composite(SurveyArgs),
    /// Only build the grid from existing composites
    Grid,
    /// Print the DS9 command lines without launching anything
    DryRun(SurveyArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct SurveyArgs {
    /// Restrict to these surveys (repeatable, case-insensitive)
    #[arg(long = "survey", value_name = "NAME")]
    pub surveys: Vec<String>,
}
