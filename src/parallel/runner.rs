//! Runs many independent league simulations per configuration on a shared
//! worker pool.
//!
//! Every run builds its own league from the read-only player pool, so runs
//! never observe each other. A run that errors or panics is recorded as a
//! [RunFailure] in its slot; the outcome vector always has one entry per run.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::WorkerPool;
use crate::data::PlayerPool;
use crate::league::{simulate_league, LeagueError, LeagueSettings, ScoringParameters, SimulationResult};
use crate::params::{ConfigId, ParameterConfiguration};
use crate::rng::mix_seed;

/// `(completed, total)` for the configuration currently running. Called from worker threads.
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

pub type RunOutcome = Result<SimulationResult, RunFailure>;

/// One seeded season. [simulate_league] unless replaced with [ParallelLeagueRunner::with_simulator].
pub type SimulateFn =
    fn(&PlayerPool, &ScoringParameters, &LeagueSettings, u64) -> Result<SimulationResult, LeagueError>;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("run {run_index} (seed {seed:#018x}) failed: {message}")]
pub struct RunFailure {
    pub run_index: usize,
    pub seed: u64,
    pub message: String,
}

/// Seed for one run; stable across sweeps with the same base seed.
pub fn run_seed(base_seed: u64, config: ConfigId, run_index: usize) -> u64 {
    mix_seed(mix_seed(base_seed, config.0), run_index as u64)
}

#[derive(Clone)]
pub struct ParallelLeagueRunner {
    pool: WorkerPool,
    players: Arc<PlayerPool>,
    settings: Arc<LeagueSettings>,
    base_seed: u64,
    parallel: bool,
    progress: Option<ProgressCallback>,
    simulate: SimulateFn,
}

impl ParallelLeagueRunner {
    pub fn new(
        pool: WorkerPool,
        players: Arc<PlayerPool>,
        settings: Arc<LeagueSettings>,
        base_seed: u64,
    ) -> Self {
        Self {
            pool,
            players,
            settings,
            base_seed,
            parallel: true,
            progress: None,
            simulate: simulate_league,
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn with_simulator(mut self, simulate: SimulateFn) -> Self {
        self.simulate = simulate;
        self
    }

    /// Run on the calling thread only. Outcomes are identical to the parallel path.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn workers(&self) -> usize {
        if self.parallel {
            self.pool.workers()
        } else {
            1
        }
    }

    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    pub fn players(&self) -> &PlayerPool {
        &self.players
    }

    /// Exactly `n` outcomes, in run-index order.
    pub fn run_simulations_for_config(
        &self,
        config: &ParameterConfiguration,
        n: usize,
    ) -> Vec<RunOutcome> {
        let completed = AtomicUsize::new(0);
        let run_one = |run_index: usize| {
            let outcome = self.run_one(config, run_index);
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(progress) = &self.progress {
                progress(done, n);
            }
            outcome
        };

        let outcomes: Vec<RunOutcome> = if self.parallel {
            self.pool
                .install(|| (0..n).into_par_iter().map(run_one).collect())
        } else {
            (0..n).map(run_one).collect()
        };

        let failures = outcomes.iter().filter(|outcome| outcome.is_err()).count();
        debug!(config = %config.id, runs = n, failures, "configuration finished");
        outcomes
    }

    /// Run every configuration, handing each one's outcomes to `visit` as soon as it finishes.
    pub fn run_configs_with<'c, I, F>(&self, configs: I, sims_per_config: usize, mut visit: F)
    where
        I: IntoIterator<Item = &'c ParameterConfiguration>,
        F: FnMut(&ParameterConfiguration, Vec<RunOutcome>),
    {
        for config in configs {
            let outcomes = self.run_simulations_for_config(config, sims_per_config);
            visit(config, outcomes);
        }
    }

    pub fn run_multiple_configs(
        &self,
        configs: &[ParameterConfiguration],
        sims_per_config: usize,
    ) -> BTreeMap<ConfigId, Vec<RunOutcome>> {
        let mut results = BTreeMap::new();
        self.run_configs_with(configs, sims_per_config, |config, outcomes| {
            results.insert(config.id, outcomes);
        });
        results
    }

    fn run_one(&self, config: &ParameterConfiguration, run_index: usize) -> RunOutcome {
        let seed = run_seed(self.base_seed, config.id, run_index);
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
            (self.simulate)(&self.players, &config.params, &self.settings, seed)
        }));
        let message = match attempt {
            Ok(Ok(result)) => return Ok(result),
            Ok(Err(err)) => err.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };
        warn!(config = %config.id, run_index, seed, error = %message, "simulation run failed");
        Err(RunFailure {
            run_index,
            seed,
            message,
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        format!("panic: {text}")
    } else if let Some(text) = payload.downcast_ref::<String>() {
        format!("panic: {text}")
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic_players;

    fn runner(workers: usize) -> ParallelLeagueRunner {
        let players = Arc::new(PlayerPool::new(synthetic_players(3)).unwrap());
        ParallelLeagueRunner::new(
            WorkerPool::with_workers(workers).unwrap(),
            players,
            Arc::new(LeagueSettings::default()),
            99,
        )
    }

    fn config(id: u64) -> ParameterConfiguration {
        ParameterConfiguration {
            id: ConfigId(id),
            values: Default::default(),
            params: ScoringParameters::default(),
        }
    }

    #[test]
    fn returns_exactly_n_outcomes() {
        let outcomes = runner(2).run_simulations_for_config(&config(0), 6);
        assert_eq!(outcomes.len(), 6);
        for outcome in &outcomes {
            let result = outcome.as_ref().unwrap();
            assert_eq!(result.games(), 17);
        }
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let parallel = runner(3).run_simulations_for_config(&config(7), 5);
        let sequential = runner(3).sequential().run_simulations_for_config(&config(7), 5);
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn failing_runs_are_recorded_not_dropped() {
        let mut settings = LeagueSettings::default();
        settings.num_teams = 11;
        let runner = ParallelLeagueRunner::new(
            WorkerPool::with_workers(2).unwrap(),
            Arc::new(PlayerPool::new(synthetic_players(3)).unwrap()),
            Arc::new(settings),
            1,
        );
        let outcomes = runner.run_simulations_for_config(&config(0), 4);
        assert_eq!(outcomes.len(), 4);
        for (index, outcome) in outcomes.iter().enumerate() {
            let failure = outcome.as_ref().unwrap_err();
            assert_eq!(failure.run_index, index);
            assert_eq!(failure.seed, run_seed(1, ConfigId(0), index));
        }
    }

    fn panic_on_third_run(
        pool: &PlayerPool,
        params: &ScoringParameters,
        settings: &LeagueSettings,
        seed: u64,
    ) -> Result<SimulationResult, LeagueError> {
        if seed == run_seed(99, ConfigId(0), 2) {
            panic!("roster state corrupted");
        }
        simulate_league(pool, params, settings, seed)
    }

    #[test]
    fn a_panicking_run_leaves_its_siblings_intact() {
        let clean = runner(3).run_simulations_for_config(&config(0), 6);
        let outcomes = runner(3)
            .with_simulator(panic_on_third_run)
            .run_simulations_for_config(&config(0), 6);

        assert_eq!(outcomes.len(), 6);
        assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 5);
        let failure = outcomes[2].as_ref().unwrap_err();
        assert_eq!(failure.run_index, 2);
        assert_eq!(failure.seed, run_seed(99, ConfigId(0), 2));
        assert_eq!(failure.message, "panic: roster state corrupted");
        for index in [0, 1, 3, 4, 5] {
            assert_eq!(outcomes[index], clean[index]);
        }
    }

    #[test]
    fn progress_callback_sees_every_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let callback: ProgressCallback = {
            let calls = Arc::clone(&calls);
            let max_seen = Arc::clone(&max_seen);
            Arc::new(move |completed, total| {
                assert_eq!(total, 4);
                calls.fetch_add(1, Ordering::SeqCst);
                max_seen.fetch_max(completed, Ordering::SeqCst);
            })
        };
        let runner = runner(2).with_progress(callback);
        let results = runner.run_multiple_configs(&[config(0), config(1)], 4);
        assert_eq!(results.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 8);
        assert_eq!(max_seen.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn panics_become_failures() {
        let message = panic_message(&"boom" as &(dyn std::any::Any + Send));
        assert_eq!(message, "panic: boom");
        let caught = panic::catch_unwind(|| panic!("{}", "formatted")).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "panic: formatted");
    }

    #[test]
    fn seeds_differ_across_configs_and_runs() {
        let a = run_seed(5, ConfigId(0), 0);
        assert_ne!(a, run_seed(5, ConfigId(1), 0));
        assert_ne!(a, run_seed(5, ConfigId(0), 1));
        assert_eq!(a, run_seed(5, ConfigId(0), 0));
    }
}
