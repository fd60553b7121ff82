//! Season calendars for a fantasy league.
//!
//! Schedules are generic over the team handle so the league engine can schedule
//! team indices while tests schedule plain labels.

pub mod round_robin;

pub use round_robin::{
    generate_double_round_robin, generate_round_robin, generate_schedule_for_nfl_season,
    validate_schedule,
};

use thiserror::Error;

/// One head-to-head pairing. The first team is the nominal home side.
pub type Matchup<T> = (T, T);

/// All matchups played in one week.
pub type ScheduleWeek<T> = Vec<Matchup<T>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("round-robin scheduling needs an even number of teams, got {0}")]
    OddTeamCount(usize),
    #[error("cannot schedule an empty team list")]
    NoTeams,
}
