//! One simulated league: shuffled strategy assignment, snake draft and a
//! round-robin season, producing the helper team's record.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::roster::{Team, TeamRecord};
use super::scoring::{adjusted_week_score, ScoringParameters};
use super::settings::LeagueSettings;
use super::strategy::{DraftContext, DraftStrategy, SelectPlayer};
use super::LeagueError;
use crate::data::{PlayerPool, Position};
use crate::rng::Rng;
use crate::schedule::{generate_schedule_for_nfl_season, ScheduleWeek};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LeagueState {
    Init,
    Drafting,
    SeasonInProgress,
    Complete,
}

/// Season outcome for the parameter-driven team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub wins: u32,
    pub losses: u32,
    /// Equal-score matchups; counted in neither column.
    pub ties: u32,
    pub total_points: f64,
}

impl SimulationResult {
    pub fn games(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    /// Wins over games played; a tie is a non-win.
    pub fn win_rate(&self) -> f64 {
        match self.games() {
            0 => 0.0,
            games => f64::from(self.wins) / f64::from(games),
        }
    }
}

impl From<TeamRecord> for SimulationResult {
    fn from(record: TeamRecord) -> Self {
        Self {
            wins: record.wins,
            losses: record.losses,
            ties: record.ties,
            total_points: record.points,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchupResult {
    pub week: u32,
    pub home: usize,
    pub away: usize,
    pub home_points: f64,
    pub away_points: f64,
}

pub struct SimulatedLeague<'a> {
    pool: &'a PlayerPool,
    params: &'a ScoringParameters,
    settings: &'a LeagueSettings,
    rng: Rng,
    state: LeagueState,
    teams: Vec<Team>,
    /// Team ids in first-round pick order.
    draft_order: Vec<usize>,
    /// Undrafted pool indices, ascending.
    available: Vec<usize>,
    schedule: Vec<ScheduleWeek<usize>>,
    records: Vec<TeamRecord>,
    matchups: Vec<MatchupResult>,
}

impl<'a> SimulatedLeague<'a> {
    pub fn new(
        pool: &'a PlayerPool,
        params: &'a ScoringParameters,
        settings: &'a LeagueSettings,
        seed: u64,
    ) -> Result<Self, LeagueError> {
        settings.validate()?;
        let mut rng = Rng::new(seed);

        let mut strategies = settings.strategy_mix.strategies();
        rng.shuffle(&mut strategies);
        let teams: Vec<Team> = strategies
            .into_iter()
            .enumerate()
            .map(|(id, strategy)| Team::new(id, strategy))
            .collect();

        let team_ids: Vec<usize> = (0..teams.len()).collect();
        let mut draft_order = team_ids.clone();
        rng.shuffle(&mut draft_order);
        let schedule = generate_schedule_for_nfl_season(&team_ids, settings.season_weeks)?;

        Ok(Self {
            pool,
            params,
            settings,
            rng,
            state: LeagueState::Init,
            records: vec![TeamRecord::default(); teams.len()],
            teams,
            draft_order,
            available: (0..pool.len()).collect(),
            schedule,
            matchups: Vec::new(),
        })
    }

    pub fn state(&self) -> LeagueState {
        self.state
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn schedule(&self) -> &[ScheduleWeek<usize>] {
        &self.schedule
    }

    fn expect_state(&self, expected: LeagueState) -> Result<(), LeagueError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(LeagueError::InvalidState {
                expected,
                found: self.state,
            })
        }
    }

    fn helper_id(&self) -> Result<usize, LeagueError> {
        self.teams
            .iter()
            .position(|team| team.strategy.is_helper())
            .ok_or(LeagueError::NoDraftHelper)
    }

    /// Snake draft over every round of the draft-order table.
    pub fn run_draft(&mut self) -> Result<(), LeagueError> {
        self.expect_state(LeagueState::Init)?;
        self.state = LeagueState::Drafting;

        for (round, priority) in self.settings.draft_order.iter().enumerate() {
            let order: Vec<usize> = if round % 2 == 0 {
                self.draft_order.clone()
            } else {
                self.draft_order.iter().rev().copied().collect()
            };

            for team_id in order {
                let team = &self.teams[team_id];
                let ctx = DraftContext {
                    pool: self.pool,
                    available: &self.available,
                    roster: &team.roster,
                    limits: &self.settings.roster_limits,
                    round: priority,
                    params: self.params,
                    opponent_error_rate: self.settings.opponent_error_rate,
                    opponent_error_pool: self.settings.opponent_error_pool,
                };
                let pick = team
                    .strategy
                    .select_player(&ctx, &mut self.rng)
                    .ok_or(LeagueError::PoolExhausted {
                        team: team_id,
                        round: round + 1,
                    })?;

                if let Ok(slot) = self.available.binary_search(&pick) {
                    self.available.remove(slot);
                }
                let position = self.pool.player(pick).position;
                self.teams[team_id].roster.add(pick, position);
                trace!(round = round + 1, team = team_id, player = pick, %position, "pick");
            }
        }

        debug!(
            picks = self.pool.len() - self.available.len(),
            "draft complete"
        );
        self.state = LeagueState::SeasonInProgress;
        Ok(())
    }

    /// Play every scheduled week.
    pub fn run_season(&mut self) -> Result<(), LeagueError> {
        self.expect_state(LeagueState::SeasonInProgress)?;

        for (week_idx, week) in self.schedule.iter().enumerate() {
            let week_no = week_idx as u32 + 1;
            for &(home, away) in week {
                let home_defense = self.starting_defense_strength(away, week_no);
                let away_defense = self.starting_defense_strength(home, week_no);
                let home_points = self.team_week_score(home, week_no, home_defense);
                let away_points = self.team_week_score(away, week_no, away_defense);

                self.records[home].points += home_points;
                self.records[away].points += away_points;
                if home_points > away_points {
                    self.records[home].wins += 1;
                    self.records[away].losses += 1;
                } else if away_points > home_points {
                    self.records[away].wins += 1;
                    self.records[home].losses += 1;
                } else {
                    self.records[home].ties += 1;
                    self.records[away].ties += 1;
                }

                self.matchups.push(MatchupResult {
                    week: week_no,
                    home,
                    away,
                    home_points,
                    away_points,
                });
            }
        }

        self.state = LeagueState::Complete;
        Ok(())
    }

    /// Record of the helper team. Only available once the season is complete.
    pub fn results(&self) -> Result<SimulationResult, LeagueError> {
        self.expect_state(LeagueState::Complete)?;
        Ok(self.records[self.helper_id()?].into())
    }

    pub fn all_team_results(&self) -> Result<Vec<(DraftStrategy, TeamRecord)>, LeagueError> {
        self.expect_state(LeagueState::Complete)?;
        Ok(self
            .teams
            .iter()
            .map(|team| (team.strategy, self.records[team.id]))
            .collect())
    }

    pub fn weekly_results(&self) -> &[MatchupResult] {
        &self.matchups
    }

    /// How a team values a rostered player when setting its lineup.
    /// The helper sees parameter-adjusted points; opponents trust raw projections.
    fn lineup_value(&self, team_id: usize, idx: usize, week: u32, opposing_defense: Option<f64>) -> f64 {
        let player = self.pool.player(idx);
        if self.teams[team_id].strategy.is_helper() {
            let bye_penalty = if player.is_on_bye(week) {
                self.params.base_bye_penalty
            } else {
                0.0
            };
            adjusted_week_score(self.params, player, week, opposing_defense) - bye_penalty
        } else {
            player.week_points(week)
        }
    }

    /// Strength percentile of the DST `team_id` starts this week.
    fn starting_defense_strength(&self, team_id: usize, week: u32) -> Option<f64> {
        if self.settings.lineup.dst == 0 {
            return None;
        }
        let roster = &self.teams[team_id].roster;
        roster
            .at_position(Position::Dst)
            .iter()
            .copied()
            .max_by(|&a, &b| {
                self.lineup_value(team_id, a, week, None)
                    .total_cmp(&self.lineup_value(team_id, b, week, None))
                    .then_with(|| b.cmp(&a))
            })
            .and_then(|idx| self.pool.defense_strength(idx))
    }

    fn team_week_score(&self, team_id: usize, week: u32, opposing_defense: Option<f64>) -> f64 {
        let lineup = self.teams[team_id]
            .roster
            .select_lineup(&self.settings.lineup, |idx| {
                self.lineup_value(team_id, idx, week, opposing_defense)
            });

        lineup
            .iter()
            .map(|&idx| {
                let player = self.pool.player(idx);
                let points = adjusted_week_score(self.params, player, week, opposing_defense);
                if player.is_on_bye(week) {
                    points - self.params.base_bye_penalty
                } else {
                    points
                }
            })
            .sum()
    }
}

/// Build, draft and play one league.
pub fn simulate_league(
    pool: &PlayerPool,
    params: &ScoringParameters,
    settings: &LeagueSettings,
    seed: u64,
) -> Result<SimulationResult, LeagueError> {
    let mut league = SimulatedLeague::new(pool, params, settings, seed)?;
    league.run_draft()?;
    league.run_season()?;
    league.results()
}
