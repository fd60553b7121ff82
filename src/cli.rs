use std::io::{self, BufRead, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::error;

use crate::data::{load_player_pool, DEFAULT_PLAYER_POOL_PATH};
use crate::league::{load_league_settings, LeagueSettings};
use crate::optimizer::manager::{
    DEFAULT_BASE_SEED, DEFAULT_OUTPUT_DIR, DEFAULT_SIMS_PER_CONFIG, DEFAULT_WORKERS,
};
use crate::optimizer::{ManagerSettings, OptimalConfiguration, SavedOutputs, SimulationManager, SweepMode};
use crate::params::{load_baseline, ConfigGenerator, ConfigId, ParameterSchema};

pub const DEFAULT_BASELINE_PATH: &str = "sim_data/baseline.json";
pub const DEFAULT_SUBSET_CONFIGS: usize = 100;
/// Sweeps above this many runs ask for confirmation unless `--yes` is given.
pub const LARGE_SWEEP_RUNS: u128 = 1_000_000;

#[derive(Debug, Parser)]
#[command(name = "draftsim", version)]
#[command(about = "Search scoring-parameter configurations by simulating drafted seasons")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the first configuration only, for debugging
    Single(SweepArgs),
    /// Run an evenly spaced sample of configurations
    Subset(SweepArgs),
    /// Run every configuration
    Full(SweepArgs),
    /// Optimize one parameter at a time, resuming from saved checkpoints
    Iterative(SweepArgs),
}

impl Command {
    pub fn mode(&self) -> SweepMode {
        match self {
            Self::Single(_) => SweepMode::Single,
            Self::Subset(_) => SweepMode::Subset,
            Self::Full(_) => SweepMode::Full,
            Self::Iterative(_) => SweepMode::Iterative,
        }
    }

    pub fn args(&self) -> &SweepArgs {
        match self {
            Self::Single(args) | Self::Subset(args) | Self::Full(args) | Self::Iterative(args) => args,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct SweepArgs {
    /// Simulated seasons per configuration
    #[arg(long, default_value_t = DEFAULT_SIMS_PER_CONFIG)]
    pub sims: usize,

    /// Configurations to sample in subset mode
    #[arg(long, default_value_t = DEFAULT_SUBSET_CONFIGS)]
    pub configs: usize,

    /// Worker threads (0 uses every core)
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Baseline parameter document (JSON)
    #[arg(long, default_value = DEFAULT_BASELINE_PATH)]
    pub baseline: PathBuf,

    /// Directory for result files
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Player pool (JSON array or CSV)
    #[arg(long, default_value = DEFAULT_PLAYER_POOL_PATH)]
    pub data: PathBuf,

    /// League shape overrides (YAML)
    #[arg(long)]
    pub league: Option<PathBuf>,

    /// Base seed every run seed is derived from
    #[arg(long, default_value_t = DEFAULT_BASE_SEED)]
    pub seed: u64,

    /// Skip the confirmation prompt for very large sweeps
    #[arg(long)]
    pub yes: bool,
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    mode: SweepMode,
    configurations_tested: usize,
    total_runs: usize,
    failed_runs: usize,
    failed_configurations: Vec<ConfigId>,
    optimal: &'a OptimalConfiguration,
    saved: Option<&'a SavedOutputs>,
}

/// Exit codes: 0 success, 1 missing input or failed/declined sweep, 2 usage error.
pub fn run_with_args(args: &[String]) -> i32 {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return err.exit_code();
        }
    };
    handle_sweep(cli.command.mode(), cli.command.args())
}

fn handle_sweep(mode: SweepMode, args: &SweepArgs) -> i32 {
    let mut required: Vec<(&str, &Path)> = vec![
        ("baseline", args.baseline.as_path()),
        ("player data", args.data.as_path()),
    ];
    if let Some(league) = &args.league {
        required.push(("league settings", league.as_path()));
    }
    for (what, path) in required {
        if !path.exists() {
            eprintln!("error: {what} not found: {}", path.display());
            return 1;
        }
    }

    match run_sweep(mode, args) {
        Ok(code) => code,
        Err(err) => {
            error!(%mode, "sweep failed: {err:#}");
            eprintln!("error: {err:#}");
            1
        }
    }
}

fn run_sweep(mode: SweepMode, args: &SweepArgs) -> Result<i32> {
    let schema = ParameterSchema::default_scoring();
    let baseline = load_baseline(&args.baseline, &schema)
        .with_context(|| format!("loading baseline {}", args.baseline.display()))?;
    let players = load_player_pool(&args.data)
        .with_context(|| format!("loading player pool {}", args.data.display()))?;
    let league = match &args.league {
        Some(path) => load_league_settings(path)
            .with_context(|| format!("loading league settings {}", path.display()))?,
        None => LeagueSettings::default(),
    };

    let manager = SimulationManager::new(
        ConfigGenerator::from_baseline(baseline, schema),
        Arc::new(players),
        league,
        ManagerSettings {
            sims_per_config: args.sims,
            workers: args.workers,
            base_seed: args.seed,
            output_dir: args.output.clone(),
            ..ManagerSettings::default()
        },
    )?;

    let planned = manager.planned_runs(mode, args.configs);
    if planned > LARGE_SWEEP_RUNS && !args.yes && !confirm_large_sweep(planned)? {
        eprintln!("sweep cancelled");
        return Ok(1);
    }

    let report = match mode {
        SweepMode::Single => manager.run_single_config_test(),
        SweepMode::Subset => manager.run_subset_test(args.configs),
        SweepMode::Full => manager.run_full_optimization(),
        SweepMode::Iterative => manager.run_iterative_optimization(),
    }
    .with_context(|| format!("{mode} sweep"))?;

    let summary = RunSummary {
        mode,
        configurations_tested: report.configurations_tested,
        total_runs: report.total_runs,
        failed_runs: report.failed_runs,
        failed_configurations: report.failed_configurations(),
        optimal: &report.optimal,
        saved: report.saved.as_ref(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(0)
}

fn confirm_large_sweep(planned: u128) -> Result<bool> {
    eprint!("This sweep will run {planned} simulated seasons. Continue? [y/N] ");
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
