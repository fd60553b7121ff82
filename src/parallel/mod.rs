pub mod batch;
pub mod pool;
pub mod progress;
pub mod runner;

pub use batch::{batch_ranges, chunk_ranges, evenly_spaced_indices};
pub use pool::WorkerPool;
pub use progress::{
    channel_callback, drain_progress, format_duration, MultiLevelProgressTracker, ProgressEvent,
    ProgressStats, ProgressTracker,
};
pub use runner::{run_seed, ParallelLeagueRunner, ProgressCallback, RunFailure, RunOutcome, SimulateFn};
