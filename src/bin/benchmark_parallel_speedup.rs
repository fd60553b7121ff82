//! Run one configuration's seasons on a single worker and then on the full
//! pool, and print timings and speedup.
//!
//! Usage: cargo run --release --bin benchmark_parallel_speedup [sims] [workers]
//!
//! Uses the deterministic synthetic player pool, so no data files are needed.

use std::env;
use std::sync::Arc;
use std::time::Instant;

use draftsim::data::{synthetic_players, PlayerPool};
use draftsim::league::{LeagueSettings, ScoringParameters};
use draftsim::parallel::{ParallelLeagueRunner, WorkerPool};
use draftsim::params::{ConfigId, ParameterConfiguration};

fn main() {
    let sims: usize = env::args().nth(1).and_then(|raw| raw.parse().ok()).unwrap_or(200);
    let workers: usize = env::args().nth(2).and_then(|raw| raw.parse().ok()).unwrap_or(0);
    let seed = 12345u64;

    let players = match PlayerPool::new(synthetic_players(seed)) {
        Ok(pool) => Arc::new(pool),
        Err(err) => {
            eprintln!("failed to build synthetic pool: {err}");
            std::process::exit(1);
        }
    };
    let settings = Arc::new(LeagueSettings::default());
    let config = ParameterConfiguration {
        id: ConfigId(0),
        values: Default::default(),
        params: ScoringParameters::default(),
    };

    let build = |n: usize| -> ParallelLeagueRunner {
        let pool = match WorkerPool::with_workers(n) {
            Ok(pool) => pool,
            Err(err) => {
                eprintln!("failed to build worker pool: {err}");
                std::process::exit(1);
            }
        };
        ParallelLeagueRunner::new(pool, Arc::clone(&players), Arc::clone(&settings), seed)
    };

    let single = build(1);
    let parallel = build(workers);
    println!(
        "League runner: {} seasons, {} players, 1 worker vs {} workers",
        sims,
        players.len(),
        parallel.workers()
    );
    println!();

    let t0 = Instant::now();
    let results_seq = single.run_simulations_for_config(&config, sims);
    let elapsed_seq = t0.elapsed();
    let seq_ms = elapsed_seq.as_secs_f64() * 1000.0;
    println!("1 worker:    {:.2} ms  ({:.1} seasons/s)", seq_ms, sims as f64 / elapsed_seq.as_secs_f64());

    let t0 = Instant::now();
    let results_par = parallel.run_simulations_for_config(&config, sims);
    let elapsed_par = t0.elapsed();
    let par_ms = elapsed_par.as_secs_f64() * 1000.0;
    println!("{} workers:  {:.2} ms  ({:.1} seasons/s)", parallel.workers(), par_ms, sims as f64 / elapsed_par.as_secs_f64());

    println!();
    println!("Speedup:     {:.2}x", seq_ms / par_ms);

    assert_eq!(results_seq, results_par, "seeded runs must not depend on worker count");
    println!("(Results match across worker counts)");
}
