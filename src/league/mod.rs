//! Draft and season engine.

pub mod roster;
pub mod scoring;
pub mod settings;
pub mod simulated;
pub mod strategy;

pub use roster::{Roster, Team, TeamRecord};
pub use scoring::{adjusted_week_score, draft_score, DraftValuation, ScoringParameters};
pub use settings::{
    load_league_settings, DraftRoundPriority, DraftSlot, LeagueSettings, LineupSlots,
    RosterLimits, SettingsError, StrategyMix,
};
pub use simulated::{simulate_league, LeagueState, MatchupResult, SimulatedLeague, SimulationResult};
pub use strategy::{DraftContext, DraftStrategy, SelectPlayer};

use thiserror::Error;

use crate::schedule::ScheduleError;

#[derive(Debug, Error)]
pub enum LeagueError {
    #[error("league is {found:?}, operation needs {expected:?}")]
    InvalidState {
        expected: LeagueState,
        found: LeagueState,
    },
    #[error("no eligible player left for team {team} in round {round}")]
    PoolExhausted { team: usize, round: usize },
    #[error("league has no draft-helper team")]
    NoDraftHelper,
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
