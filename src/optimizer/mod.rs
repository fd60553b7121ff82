//! Parameter sweep orchestration: run configurations, aggregate, rank, persist.

pub mod iterative;
pub mod manager;
pub mod output;
pub mod ranking;
pub mod results;

pub use iterative::{ParameterPass, CHECKPOINT_PREFIX};
pub use manager::{ManagerSettings, SimulationManager, SweepMode, SweepReport};
pub use output::{prune_saved_sweeps, save_sweep, OptimalConfiguration, SavedOutputs, MAX_SAVED_SWEEPS};
pub use ranking::{compare_performance, rank_configurations, select_optimal};
pub use results::{ConfigPerformance, PerformanceSummary};

use std::path::PathBuf;

use thiserror::Error;

use crate::league::SettingsError;
use crate::params::ConfigValidationError;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error(transparent)]
    Validation(#[from] ConfigValidationError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error("simulations per configuration must be at least 1")]
    NoSimulations,
    #[error("subset size must be at least 1")]
    EmptySubset,
    #[error("configuration space is empty")]
    EmptySpace,
    #[error("configuration space of {0} entries is too large to index")]
    SpaceTooLarge(u128),
    #[error(
        "no configuration produced a successful run ({configurations} configurations, {failed_runs} failed runs)"
    )]
    NoViableConfiguration {
        configurations: usize,
        failed_runs: usize,
    },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize results: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write CSV results: {0}")]
    Csv(#[from] csv::Error),
}
