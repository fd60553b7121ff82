use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use draftsim::data::{synthetic_players, PlayerPool};
use draftsim::league::{simulate_league, LeagueSettings, ScoringParameters, SimulatedLeague};
use draftsim::optimizer::{ManagerSettings, SimulationManager, SweepError, SweepMode};
use draftsim::parallel::{ParallelLeagueRunner, ProgressCallback, WorkerPool};
use draftsim::params::{BaselineDocument, ConfigGenerator, ConfigId, ParameterSchema};

fn players() -> Arc<PlayerPool> {
    Arc::new(PlayerPool::new(synthetic_players(2024)).expect("synthetic pool is valid"))
}

fn generator(extra: &[(&str, Vec<f64>)]) -> ConfigGenerator {
    let schema = ParameterSchema::default_scoring();
    let mut baseline =
        BaselineDocument::from_scoring("sweep", "", &ScoringParameters::default(), &schema).unwrap();
    for (name, values) in extra {
        baseline.parameters.insert(name.to_string(), values.clone());
    }
    ConfigGenerator::from_baseline(baseline, schema)
}

#[test]
fn same_seed_replays_the_same_season() {
    let pool = players();
    let params = ScoringParameters::default();
    let settings = LeagueSettings::default();
    let first = simulate_league(&pool, &params, &settings, 77).unwrap();
    let second = simulate_league(&pool, &params, &settings, 77).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.games(), 17);
    assert!(first.total_points > 0.0);
}

#[test]
fn every_team_plays_the_full_season() {
    let pool = players();
    let params = ScoringParameters::default();
    let settings = LeagueSettings::default();
    let mut league = SimulatedLeague::new(&pool, &params, &settings, 5).unwrap();
    league.run_draft().unwrap();
    league.run_season().unwrap();

    let records = league.all_team_results().unwrap();
    assert_eq!(records.len(), 10);
    let wins: u32 = records.iter().map(|(_, r)| r.wins).sum();
    let losses: u32 = records.iter().map(|(_, r)| r.losses).sum();
    assert_eq!(wins, losses);
    assert!(records.iter().all(|(_, r)| r.games() == 17));
    assert_eq!(league.weekly_results().len(), 17 * 5);
}

#[test]
fn runner_returns_one_outcome_per_run_for_each_config() {
    let generator = generator(&[("BASE_BYE_PENALTY", vec![0.0, 50.0])]);
    let configs = generator.configurations_for(0..2).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let callback: ProgressCallback = {
        let calls = Arc::clone(&calls);
        Arc::new(move |_, _| {
            calls.fetch_add(1, Ordering::Relaxed);
        })
    };
    let runner = ParallelLeagueRunner::new(
        WorkerPool::with_workers(3).unwrap(),
        players(),
        Arc::new(LeagueSettings::default()),
        1,
    )
    .with_progress(callback);

    let results = runner.run_multiple_configs(&configs, 7);
    assert_eq!(results.len(), 2);
    assert!(results.values().all(|outcomes| outcomes.len() == 7));
    assert_eq!(calls.load(Ordering::Relaxed), 14);
    assert!(results[&ConfigId(1)].iter().all(Result::is_ok));
}

#[test]
fn subset_sweep_is_reproducible_for_a_fixed_seed() {
    let dir = std::env::temp_dir().join(format!("draftsim-sweep-tests-{}", std::process::id()));
    let build = || {
        SimulationManager::new(
            generator(&[
                ("NORMALIZATION_MAX_SCALE", vec![60.0, 100.0, 140.0]),
                ("INJURY_PENALTIES_HIGH", vec![10.0, 80.0]),
            ]),
            players(),
            LeagueSettings::default(),
            ManagerSettings {
                sims_per_config: 4,
                workers: 2,
                base_seed: 3,
                output_dir: dir.clone(),
                chunk_size: 2,
            },
        )
        .unwrap()
    };

    let first = build().run_subset_test(4).unwrap();
    let second = build().run_subset_test(4).unwrap();
    assert_eq!(first.mode, SweepMode::Subset);
    assert_eq!(first.configurations_tested, 4);
    assert_eq!(first.total_runs, 16);
    assert_eq!(first.ranked, second.ranked);
    assert_eq!(first.optimal.config_id, second.optimal.config_id);

    let ids: Vec<u64> = {
        let mut ids: Vec<u64> = first.ranked.iter().map(|row| row.config_id.0).collect();
        ids.sort_unstable();
        ids
    };
    assert_eq!(ids, vec![0, 1, 3, 4]);

    let best = &first.ranked[0];
    assert!(first.ranked.iter().all(|row| row.mean_win_rate <= best.mean_win_rate));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn invalid_league_shape_fails_before_simulating() {
    let mut league = LeagueSettings::default();
    league.opponent_error_rate = 1.5;
    let result = SimulationManager::new(generator(&[]), players(), league, ManagerSettings::default());
    assert!(matches!(result, Err(SweepError::Settings(_))));
}
