//! Drives a sweep end to end: pick configuration indices, run them on the
//! worker pool, fold outcomes into aggregates, select the optimum.
//!
//! Configurations are decoded from their index one chunk at a time and raw
//! outcomes are dropped once aggregated, so memory stays proportional to the
//! number of configurations rather than to the number of runs.

use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::{self, SyncSender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::iterative::ParameterPass;
use super::output::{save_sweep, OptimalConfiguration, SavedOutputs};
use super::{rank_configurations, select_optimal, ConfigPerformance, PerformanceSummary, SweepError};
use crate::accuracy::{evaluate_pool, AccuracyReport};
use crate::data::PlayerPool;
use crate::league::{simulate_league, LeagueSettings};
use crate::parallel::{
    channel_callback, chunk_ranges, drain_progress, evenly_spaced_indices, MultiLevelProgressTracker,
    ParallelLeagueRunner, ProgressEvent, SimulateFn, WorkerPool,
};
use crate::params::{ConfigGenerator, ConfigId, ConfigValidationError, ParameterConfiguration};

pub const DEFAULT_SIMS_PER_CONFIG: usize = 50;
pub const DEFAULT_WORKERS: usize = 7;
pub const DEFAULT_BASE_SEED: u64 = 42;
pub const DEFAULT_OUTPUT_DIR: &str = "simulation_results";
pub const DEFAULT_CHUNK_SIZE: u64 = 256;
const PROGRESS_CHANNEL_CAPACITY: usize = 1024;

/// Configurations decoded together; decoding stops the sweep on the first invalid document.
pub(super) type ConfigBatch = Result<Vec<ParameterConfiguration>, ConfigValidationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepMode {
    Single,
    Subset,
    Full,
    Iterative,
}

impl SweepMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Subset => "subset",
            Self::Full => "full",
            Self::Iterative => "iterative",
        }
    }
}

impl fmt::Display for SweepMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ManagerSettings {
    pub sims_per_config: usize,
    /// 0 uses every core.
    pub workers: usize,
    pub base_seed: u64,
    pub output_dir: PathBuf,
    /// Configurations decoded and held at once.
    pub chunk_size: u64,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            sims_per_config: DEFAULT_SIMS_PER_CONFIG,
            workers: DEFAULT_WORKERS,
            base_seed: DEFAULT_BASE_SEED,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub mode: SweepMode,
    pub baseline_name: String,
    pub generated_at: String,
    pub total_combinations: u128,
    pub configurations_tested: usize,
    pub sims_per_config: usize,
    pub workers: usize,
    pub base_seed: u64,
    pub total_runs: usize,
    pub failed_runs: usize,
    /// Configurations without a single successful run; excluded from ranking.
    pub failed: Vec<PerformanceSummary>,
    pub ranked: Vec<PerformanceSummary>,
    pub optimal: OptimalConfiguration,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub passes: Vec<ParameterPass>,
    pub accuracy: Option<AccuracyReport>,
    pub elapsed_secs: f64,
    #[serde(skip)]
    pub saved: Option<SavedOutputs>,
}

impl SweepReport {
    pub fn failed_configurations(&self) -> Vec<ConfigId> {
        self.failed.iter().map(|summary| summary.config_id).collect()
    }
}

pub struct SimulationManager {
    generator: ConfigGenerator,
    players: Arc<PlayerPool>,
    league: Arc<LeagueSettings>,
    settings: ManagerSettings,
    pool: WorkerPool,
    simulate: SimulateFn,
}

impl SimulationManager {
    pub fn new(
        generator: ConfigGenerator,
        players: Arc<PlayerPool>,
        league: LeagueSettings,
        settings: ManagerSettings,
    ) -> Result<Self, SweepError> {
        if settings.sims_per_config == 0 {
            return Err(SweepError::NoSimulations);
        }
        league.validate()?;
        let pool = WorkerPool::with_workers(settings.workers)?;
        info!(
            baseline = generator.config_name(),
            combinations = %generator.num_combinations(),
            sims = settings.sims_per_config,
            workers = pool.workers(),
            players = players.len(),
            "simulation manager ready"
        );
        Ok(Self {
            generator,
            players,
            league: Arc::new(league),
            settings,
            pool,
            simulate: simulate_league,
        })
    }

    /// Replace the per-run season simulation handed to every worker.
    pub fn with_simulator(mut self, simulate: SimulateFn) -> Self {
        self.simulate = simulate;
        self
    }

    pub fn generator(&self) -> &ConfigGenerator {
        &self.generator
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    pub fn total_configurations(&self) -> u128 {
        self.generator.num_combinations()
    }

    /// Runs a sweep would launch, for pre-flight confirmation. An upper bound in iterative mode.
    pub fn planned_runs(&self, mode: SweepMode, subset_size: usize) -> u128 {
        let configs = match mode {
            SweepMode::Single => 1,
            SweepMode::Subset => (subset_size as u128).min(self.total_configurations()),
            SweepMode::Full => self.total_configurations(),
            SweepMode::Iterative => self
                .generator
                .generate_all_parameter_value_sets()
                .values()
                .map(|values| values.len() as u128)
                .sum(),
        };
        configs.saturating_mul(self.settings.sims_per_config as u128)
    }

    /// Every parameter at its first candidate, run N times. Nothing is written.
    pub fn run_single_config_test(&self) -> Result<SweepReport, SweepError> {
        self.indexable_total()?;
        let first = std::iter::once(self.generator.configurations_for([0]));
        let report = self.sweep(SweepMode::Single, 1, first)?;
        let best = &report.optimal.performance;
        info!(
            win_rate = best.mean_win_rate,
            mean_points = best.mean_points,
            failures = best.failures,
            "single configuration test finished"
        );
        Ok(report)
    }

    /// `k` evenly spaced configurations; the best one is persisted.
    pub fn run_subset_test(&self, k: usize) -> Result<SweepReport, SweepError> {
        if k == 0 {
            return Err(SweepError::EmptySubset);
        }
        let total = self.indexable_total()?;
        let indices = evenly_spaced_indices(total, k as u64);
        let chunk = self.settings.chunk_size.max(1) as usize;
        let batches = indices
            .chunks(chunk)
            .map(|window| self.generator.configurations_for(window.iter().copied()));
        let mut report = self.sweep(SweepMode::Subset, indices.len(), batches)?;
        report.saved = Some(save_sweep(&report, &self.settings.output_dir)?);
        Ok(report)
    }

    /// The whole configuration space, decoded lazily chunk by chunk.
    pub fn run_full_optimization(&self) -> Result<SweepReport, SweepError> {
        let total = self.indexable_total()?;
        let count = usize::try_from(total).map_err(|_| SweepError::SpaceTooLarge(u128::from(total)))?;
        let batches = chunk_ranges(total, self.settings.chunk_size.max(1))
            .into_iter()
            .map(|(start, end)| self.generator.configurations_for(start..end));
        let mut report = self.sweep(SweepMode::Full, count, batches)?;
        report.saved = Some(save_sweep(&report, &self.settings.output_dir)?);
        Ok(report)
    }

    pub(super) fn indexable_total(&self) -> Result<u64, SweepError> {
        match u64::try_from(self.total_configurations()) {
            Ok(0) => Err(SweepError::EmptySpace),
            Ok(total) => Ok(total),
            Err(_) => Err(SweepError::SpaceTooLarge(self.total_configurations())),
        }
    }

    fn sweep<I>(&self, mode: SweepMode, config_count: usize, batches: I) -> Result<SweepReport, SweepError>
    where
        I: IntoIterator<Item = ConfigBatch>,
    {
        let started = Instant::now();
        let generated_at = Utc::now();
        info!(%mode, configurations = config_count, sims = self.settings.sims_per_config, "starting sweep");

        let performances = self.run_tracked(config_count, batches)?;
        let optimal = select_optimal(&performances).map(ConfigPerformance::config_id);
        self.build_report(mode, performances, optimal, Vec::new(), started, generated_at)
    }

    /// Run `batches` with a reporter thread draining progress events.
    pub(super) fn run_tracked<I>(
        &self,
        config_count: usize,
        batches: I,
    ) -> Result<Vec<ConfigPerformance>, SweepError>
    where
        I: IntoIterator<Item = ConfigBatch>,
    {
        let (sender, events) = mpsc::sync_channel(PROGRESS_CHANNEL_CAPACITY);
        let tracker = MultiLevelProgressTracker::new(config_count, self.settings.sims_per_config);
        thread::scope(|scope| {
            let reporter = scope.spawn(move || drain_progress(events, tracker));
            let swept = self.run_batches(batches, sender);
            if reporter.join().is_err() {
                warn!("progress reporter panicked");
            }
            swept
        })
    }

    /// Assemble the report around `optimal`, which must name a viable configuration.
    pub(super) fn build_report(
        &self,
        mode: SweepMode,
        performances: Vec<ConfigPerformance>,
        optimal: Option<ConfigId>,
        passes: Vec<ParameterPass>,
        started: Instant,
        generated_at: DateTime<Utc>,
    ) -> Result<SweepReport, SweepError> {
        let sims = self.settings.sims_per_config;
        let failed: Vec<PerformanceSummary> = performances
            .iter()
            .filter(|performance| !performance.is_viable())
            .map(ConfigPerformance::summary)
            .collect();
        let failed_runs: usize = performances.iter().map(ConfigPerformance::failures).sum();
        for summary in &failed {
            warn!(
                config = %summary.config_id,
                runs = summary.runs,
                reason = summary.first_failure.as_deref().unwrap_or("unknown"),
                "configuration had no successful run, excluded from selection"
            );
        }

        let best = optimal
            .and_then(|id| {
                performances
                    .iter()
                    .find(|performance| performance.config_id() == id && performance.is_viable())
            })
            .ok_or(SweepError::NoViableConfiguration {
                configurations: performances.len(),
                failed_runs,
            })?;
        let optimal = self.optimal_configuration(best)?;
        let ranked = rank_configurations(&performances)
            .into_iter()
            .map(ConfigPerformance::summary)
            .collect();

        let elapsed_secs = started.elapsed().as_secs_f64();
        info!(
            %mode,
            optimal = %optimal.config_id,
            win_rate = optimal.performance.mean_win_rate,
            mean_points = optimal.performance.mean_points,
            failed_runs,
            failed_configs = failed.len(),
            elapsed_secs,
            "sweep finished"
        );

        Ok(SweepReport {
            mode,
            baseline_name: self.generator.config_name().to_string(),
            generated_at: generated_at.to_rfc3339(),
            total_combinations: self.total_configurations(),
            configurations_tested: performances.len(),
            sims_per_config: sims,
            workers: self.pool.workers(),
            base_seed: self.settings.base_seed,
            total_runs: performances.len() * sims,
            failed_runs,
            failed,
            ranked,
            optimal,
            passes,
            accuracy: evaluate_pool(&self.players),
            elapsed_secs,
            saved: None,
        })
    }

    fn run_batches<I>(
        &self,
        batches: I,
        progress: SyncSender<ProgressEvent>,
    ) -> Result<Vec<ConfigPerformance>, SweepError>
    where
        I: IntoIterator<Item = ConfigBatch>,
    {
        let runner = ParallelLeagueRunner::new(
            self.pool.clone(),
            Arc::clone(&self.players),
            Arc::clone(&self.league),
            self.settings.base_seed,
        )
        .with_simulator(self.simulate)
        .with_progress(channel_callback(progress.clone()));

        let mut performances = Vec::new();
        for batch in batches {
            let configs = batch?;
            runner.run_configs_with(&configs, self.settings.sims_per_config, |config, outcomes| {
                performances.push(ConfigPerformance::from_outcomes(config.id, &outcomes));
                // A closed channel only means the reporter is gone; the sweep carries on.
                let _ = progress.send(ProgressEvent::ConfigCompleted);
            });
        }
        Ok(performances)
    }

    fn optimal_configuration(&self, best: &ConfigPerformance) -> Result<OptimalConfiguration, SweepError> {
        let id = best.config_id();
        let values = self
            .generator
            .combination_at(u128::from(id.0))
            .ok_or(SweepError::SpaceTooLarge(u128::from(id.0)))?;
        Ok(OptimalConfiguration {
            config_name: format!("{}_{}", self.generator.config_name(), id),
            description: format!(
                "Best of {} by mean win rate; derived from '{}'",
                self.total_configurations(),
                self.generator.config_name()
            ),
            config_id: id,
            performance: best.summary(),
            parameters: self.generator.create_config_dict(&values),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic_players;
    use crate::league::{LeagueError, ScoringParameters, SimulationResult};
    use crate::params::{BaselineDocument, ParameterSchema};

    fn manager(sims: usize, output_dir: PathBuf) -> SimulationManager {
        let schema = ParameterSchema::default_scoring();
        let mut baseline =
            BaselineDocument::from_scoring("unit", "", &ScoringParameters::default(), &schema).unwrap();
        baseline
            .parameters
            .insert("NORMALIZATION_MAX_SCALE".to_string(), vec![50.0, 100.0, 150.0]);
        baseline
            .parameters
            .insert("BASE_BYE_PENALTY".to_string(), vec![0.0, 40.0]);
        SimulationManager::new(
            ConfigGenerator::from_baseline(baseline, schema),
            Arc::new(PlayerPool::new(synthetic_players(5)).unwrap()),
            LeagueSettings::default(),
            ManagerSettings {
                sims_per_config: sims,
                workers: 2,
                base_seed: 11,
                output_dir,
                chunk_size: 4,
            },
        )
        .unwrap()
    }

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("draftsim-manager-{name}-{}", std::process::id()))
    }

    /// Every run of a configuration with a 40-point bye penalty panics.
    fn bye_penalty_forty_panics(
        pool: &PlayerPool,
        params: &ScoringParameters,
        settings: &LeagueSettings,
        seed: u64,
    ) -> Result<SimulationResult, LeagueError> {
        if params.base_bye_penalty == 40.0 {
            panic!("bye penalty overflow");
        }
        simulate_league(pool, params, settings, seed)
    }

    fn always_fails(
        _: &PlayerPool,
        _: &ScoringParameters,
        _: &LeagueSettings,
        _: u64,
    ) -> Result<SimulationResult, LeagueError> {
        Err(LeagueError::NoDraftHelper)
    }

    #[test]
    fn single_test_runs_first_configuration() {
        let manager = manager(3, std::env::temp_dir());
        let report = manager.run_single_config_test().unwrap();
        assert_eq!(report.configurations_tested, 1);
        assert_eq!(report.total_runs, 3);
        assert_eq!(report.optimal.config_id, ConfigId(0));
        assert_eq!(report.optimal.performance.runs, 3);
        assert!(report.saved.is_none());
        assert!(report.passes.is_empty());
        assert_eq!(report.optimal.parameters["BASE_BYE_PENALTY"], 0.0);
    }

    #[test]
    fn full_sweep_covers_every_configuration_in_chunks() {
        let dir = temp_dir("full");
        let manager = manager(2, dir.clone());
        assert_eq!(manager.planned_runs(SweepMode::Full, 0), 12);

        let report = manager.run_full_optimization().unwrap();
        assert_eq!(report.configurations_tested, 6);
        assert_eq!(report.ranked.len() + report.failed.len(), 6);
        assert_eq!(report.ranked[0].config_id, report.optimal.config_id);

        let saved = report.saved.as_ref().unwrap();
        assert!(saved.optimal_config.exists());
        assert!(saved.report_json.exists());
        assert!(saved.report_csv.exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn failing_configurations_are_reported_and_skipped() {
        let dir = temp_dir("partial-failure");
        let manager = manager(3, dir.clone()).with_simulator(bye_penalty_forty_panics);

        let report = manager.run_full_optimization().unwrap();
        assert_eq!(report.configurations_tested, 6);
        assert_eq!(
            report.failed_configurations(),
            vec![ConfigId(3), ConfigId(4), ConfigId(5)]
        );
        assert_eq!(report.failed_runs, 9);
        assert!(report.failed.iter().all(|summary| {
            summary.successes == 0
                && summary.failures == 3
                && summary
                    .first_failure
                    .as_deref()
                    .is_some_and(|reason| reason.contains("bye penalty overflow"))
        }));

        let ranked: Vec<u64> = report.ranked.iter().map(|row| row.config_id.0).collect();
        assert_eq!(ranked.len(), 3);
        assert!(ranked.iter().all(|id| *id < 3));
        assert!(report.optimal.config_id.0 < 3);
        assert_eq!(report.optimal.parameters["BASE_BYE_PENALTY"], 0.0);

        let csv = std::fs::read_to_string(&report.saved.as_ref().unwrap().report_csv).unwrap();
        assert_eq!(csv.lines().count(), 7);
        assert_eq!(
            csv.lines()
                .filter(|line| line.contains("panic: bye penalty overflow"))
                .count(),
            3
        );
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn sweep_fails_when_no_configuration_succeeds() {
        let dir = temp_dir("all-failed");
        let manager = manager(2, dir.clone()).with_simulator(always_fails);
        let err = manager.run_full_optimization().unwrap_err();
        assert!(matches!(
            err,
            SweepError::NoViableConfiguration {
                configurations: 6,
                failed_runs: 12
            }
        ));
        assert!(!dir.exists());
    }

    #[test]
    fn empty_subset_is_rejected_up_front() {
        let manager = manager(2, temp_dir("empty-subset"));
        assert!(matches!(manager.run_subset_test(0), Err(SweepError::EmptySubset)));
    }

    #[test]
    fn zero_simulations_are_rejected_up_front() {
        let schema = ParameterSchema::default_scoring();
        let baseline =
            BaselineDocument::from_scoring("unit", "", &ScoringParameters::default(), &schema).unwrap();
        let result = SimulationManager::new(
            ConfigGenerator::from_baseline(baseline, schema),
            Arc::new(PlayerPool::new(synthetic_players(5)).unwrap()),
            LeagueSettings::default(),
            ManagerSettings {
                sims_per_config: 0,
                ..ManagerSettings::default()
            },
        );
        assert!(matches!(result, Err(SweepError::NoSimulations)));
    }
}
