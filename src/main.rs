//! ds9_rgb_grid - main entry point
//!
//! Loads the coordinate table, runs DS9 over every (survey, target) pair and
//! assembles the grid figure. Subcommands run the two stages separately or
//! print the DS9 command lines without launching anything.

mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command, SurveyArgs};
use ds9_rgb_grid::compositor::{self, CompositeReport};
use ds9_rgb_grid::config::RunConfig;
use ds9_rgb_grid::grid;
use ds9_rgb_grid::targets::{self, Target};
use std::path::Path;
use tracing::{info, warn};

/// Configuration picked up from the working directory when --config is absent
const LOCAL_CONFIG_FILE: &str = "ds9_grid.json";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = init_tracing(cli.quiet, cli.verbose) {
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli).await {
        eprintln!("✗ Run failed: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("DS9_GRID_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {}", e))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    info!("ds9_rgb_grid v{}", env!("CARGO_PKG_VERSION"));

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(input) = cli.input {
        config.input_csv = input;
    }
    print_config_info(&config);

    match cli.command.unwrap_or_else(|| Command::Run(SurveyArgs::default())) {
        Command::Run(args) => {
            let targets = load_targets(&config, "[1/3]")?;
            info!("[2/3] Compositing...");
            let report = composite(&config, &targets, &args).await?;
            info!("[3/3] Creating visualization grid...");
            grid::render_grid(&config, &targets)?;
            finish(&report);
        }
        Command::Composite(args) => {
            let targets = load_targets(&config, "[1/2]")?;
            info!("[2/2] Compositing...");
            let report = composite(&config, &targets, &args).await?;
            finish(&report);
        }
        Command::Grid => {
            let targets = load_targets(&config, "[1/2]")?;
            info!("[2/2] Creating visualization grid...");
            grid::render_grid(&config, &targets)?;
            info!("Processing complete!");
        }
        Command::DryRun(args) => {
            let targets = load_targets(&config, "[1/1]")?;
            let surveys = compositor::select_surveys(&config, &args.surveys)?;
            for job in compositor::plan_jobs(&config, &targets, &surveys) {
                println!(
                    "{}",
                    job.command_line(&config.ds9_executable, config.export_quality)
                );
            }
        }
    }

    Ok(())
}

/// --config file, else ./ds9_grid.json, else the built-in defaults
fn load_config(explicit: Option<&Path>) -> anyhow::Result<RunConfig> {
    if let Some(path) = explicit {
        info!("Loading configuration from {}", path.display());
        return RunConfig::from_file(path)
            .with_context(|| format!("loading configuration {}", path.display()));
    }

    let local = Path::new(LOCAL_CONFIG_FILE);
    if local.is_file() {
        info!("Loading configuration from {}", local.display());
        return RunConfig::from_file(local).context("loading ./ds9_grid.json");
    }

    info!("No {} found, using defaults", LOCAL_CONFIG_FILE);
    RunConfig::embedded().context("loading built-in configuration")
}

fn print_config_info(config: &RunConfig) {
    info!("Configuration:");
    info!("  Input: {}", config.input_csv.display());
    info!("  FITS base: {}", config.fits_base_dir.display());
    info!("  DS9: {}", config.ds9_executable.display());
    info!(
        "  Settle: {:?} (delay {}s, poll {}ms, timeout {}s)",
        config.settle.strategy,
        config.settle.delay_secs,
        config.settle.poll_interval_ms,
        config.settle.timeout_secs
    );
    let names: Vec<&str> = config.surveys.iter().map(|s| s.name.as_str()).collect();
    info!("  Surveys: {}", names.join(", "));
    info!(
        "  Grid: {} {}×{} (max {}) → {}",
        config.grid.survey,
        config.grid.rows,
        config.grid.cols,
        config.grid.max_images,
        config.grid.output_path.display()
    );
}

fn load_targets(config: &RunConfig, step: &str) -> anyhow::Result<Vec<Target>> {
    info!("{} Loading coordinate data...", step);
    let targets = targets::load_targets(&config.input_csv)
        .with_context(|| format!("reading targets from {}", config.input_csv.display()))?;
    info!("✓ Loaded {} targets", targets.len());
    Ok(targets)
}

async fn composite(
    config: &RunConfig,
    targets: &[Target],
    args: &SurveyArgs,
) -> anyhow::Result<CompositeReport> {
    let surveys = compositor::select_surveys(config, &args.surveys)?;
    let report = compositor::composite_all(config, targets, &surveys).await?;
    Ok(report)
}

fn finish(report: &CompositeReport) {
    if !report.failures.is_empty() {
        warn!("⚠ {} pair(s) failed:", report.failures.len());
        for failure in &report.failures {
            warn!("    {} [{}]: {}", failure.key, failure.survey, failure.error);
        }
    }
    info!("Processing complete!");
}
