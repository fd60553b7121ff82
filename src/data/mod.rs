pub mod loader;
pub mod player;
pub mod pool;
pub mod synthetic;

pub use loader::{load_player_pool, parse_players_csv, DEFAULT_PLAYER_POOL_PATH};
pub use player::{InjuryStatus, Player, Position, SEASON_WEEKS};
pub use pool::{PlayerPool, WeeklyPoints};
pub use synthetic::synthetic_players;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to read player pool {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("player pool is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("player pool is not valid CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("player pool CSV is missing column '{0}'")]
    MissingColumn(String),
    #[error("row {row}: invalid {column} value '{value}'")]
    InvalidField {
        row: usize,
        column: String,
        value: String,
    },
    #[error("player {player_id}: {reason}")]
    Invalid { player_id: u32, reason: String },
    #[error("duplicate player id {0}")]
    DuplicateId(u32),
    #[error("player pool is empty")]
    Empty,
}
