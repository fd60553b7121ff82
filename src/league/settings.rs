//! League shape: team count, roster limits, lineup, draft-order table and the
//! opponent strategy mix. Loadable from YAML; every field has a default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::strategy::DraftStrategy;
use crate::data::Position;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read league settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("league settings are not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid league settings: {0}")]
    Invalid(String),
}

/// A draft-order table entry target: a concrete position or the FLEX group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DraftSlot {
    Qb,
    Rb,
    Wr,
    Te,
    K,
    Dst,
    Flex,
}

impl DraftSlot {
    pub fn matches(&self, position: Position) -> bool {
        match self {
            Self::Qb => position == Position::Qb,
            Self::Rb => position == Position::Rb,
            Self::Wr => position == Position::Wr,
            Self::Te => position == Position::Te,
            Self::K => position == Position::K,
            Self::Dst => position == Position::Dst,
            Self::Flex => position.is_flex_eligible(),
        }
    }
}

/// Positions a team wants in one draft round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRoundPriority {
    pub primary: DraftSlot,
    #[serde(default)]
    pub secondary: Option<DraftSlot>,
}

impl DraftRoundPriority {
    const fn new(primary: DraftSlot, secondary: Option<DraftSlot>) -> Self {
        Self { primary, secondary }
    }

    /// Primary bonus if `position` is the round's priority, secondary bonus if it is the fallback.
    pub fn bonus(&self, position: Position, primary_bonus: f64, secondary_bonus: f64) -> f64 {
        if self.primary.matches(position) {
            primary_bonus
        } else if self.secondary.is_some_and(|slot| slot.matches(position)) {
            secondary_bonus
        } else {
            0.0
        }
    }
}

fn default_draft_order() -> Vec<DraftRoundPriority> {
    use DraftSlot::*;
    vec![
        DraftRoundPriority::new(Flex, Some(Qb)),
        DraftRoundPriority::new(Flex, Some(Qb)),
        DraftRoundPriority::new(Flex, Some(Qb)),
        DraftRoundPriority::new(Flex, Some(Qb)),
        DraftRoundPriority::new(Qb, Some(Flex)),
        DraftRoundPriority::new(Te, Some(Flex)),
        DraftRoundPriority::new(Flex, None),
        DraftRoundPriority::new(Qb, Some(Flex)),
        DraftRoundPriority::new(Te, Some(Flex)),
        DraftRoundPriority::new(Flex, None),
        DraftRoundPriority::new(Flex, None),
        DraftRoundPriority::new(K, None),
        DraftRoundPriority::new(Dst, None),
        DraftRoundPriority::new(Flex, None),
        DraftRoundPriority::new(Flex, None),
    ]
}

/// Maximum rostered players per position plus shared FLEX spots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterLimits {
    pub qb: usize,
    pub rb: usize,
    pub wr: usize,
    pub te: usize,
    pub k: usize,
    pub dst: usize,
    pub flex: usize,
}

impl Default for RosterLimits {
    fn default() -> Self {
        Self {
            qb: 2,
            rb: 4,
            wr: 4,
            te: 2,
            k: 1,
            dst: 1,
            flex: 1,
        }
    }
}

impl RosterLimits {
    pub fn max_for(&self, position: Position) -> usize {
        match position {
            Position::Qb => self.qb,
            Position::Rb => self.rb,
            Position::Wr => self.wr,
            Position::Te => self.te,
            Position::K => self.k,
            Position::Dst => self.dst,
        }
    }

    pub fn roster_size(&self) -> usize {
        self.qb + self.rb + self.wr + self.te + self.k + self.dst + self.flex
    }
}

/// Weekly starting lineup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineupSlots {
    pub qb: usize,
    pub rb: usize,
    pub wr: usize,
    pub te: usize,
    pub flex: usize,
    pub k: usize,
    pub dst: usize,
}

impl Default for LineupSlots {
    fn default() -> Self {
        Self {
            qb: 1,
            rb: 2,
            wr: 2,
            te: 1,
            flex: 1,
            k: 1,
            dst: 1,
        }
    }
}

impl LineupSlots {
    pub fn starters_for(&self, position: Position) -> usize {
        match position {
            Position::Qb => self.qb,
            Position::Rb => self.rb,
            Position::Wr => self.wr,
            Position::Te => self.te,
            Position::K => self.k,
            Position::Dst => self.dst,
        }
    }
}

/// How many teams use each draft strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyMix {
    pub draft_helper: usize,
    pub adp_aggressive: usize,
    pub projected_points_aggressive: usize,
    pub adp_with_draft_order: usize,
    pub projected_points_with_draft_order: usize,
}

impl Default for StrategyMix {
    fn default() -> Self {
        Self {
            draft_helper: 1,
            adp_aggressive: 2,
            projected_points_aggressive: 2,
            adp_with_draft_order: 2,
            projected_points_with_draft_order: 3,
        }
    }
}

impl StrategyMix {
    pub fn total(&self) -> usize {
        self.draft_helper
            + self.adp_aggressive
            + self.projected_points_aggressive
            + self.adp_with_draft_order
            + self.projected_points_with_draft_order
    }

    /// One strategy per team, grouped by kind; callers shuffle.
    pub fn strategies(&self) -> Vec<DraftStrategy> {
        let groups = [
            (DraftStrategy::DraftHelper, self.draft_helper),
            (DraftStrategy::AdpAggressive, self.adp_aggressive),
            (DraftStrategy::ProjectedPointsAggressive, self.projected_points_aggressive),
            (DraftStrategy::AdpWithDraftOrder, self.adp_with_draft_order),
            (
                DraftStrategy::ProjectedPointsWithDraftOrder,
                self.projected_points_with_draft_order,
            ),
        ];
        groups
            .into_iter()
            .flat_map(|(strategy, count)| std::iter::repeat(strategy).take(count))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeagueSettings {
    pub num_teams: usize,
    pub season_weeks: usize,
    pub roster_limits: RosterLimits,
    pub lineup: LineupSlots,
    /// One entry per draft round.
    pub draft_order: Vec<DraftRoundPriority>,
    pub strategy_mix: StrategyMix,
    /// Probability an opponent ignores its top choice.
    pub opponent_error_rate: f64,
    /// How deep into its ranking an erring opponent may reach.
    pub opponent_error_pool: usize,
}

impl Default for LeagueSettings {
    fn default() -> Self {
        Self {
            num_teams: 10,
            season_weeks: 17,
            roster_limits: RosterLimits::default(),
            lineup: LineupSlots::default(),
            draft_order: default_draft_order(),
            strategy_mix: StrategyMix::default(),
            opponent_error_rate: 0.2,
            opponent_error_pool: 5,
        }
    }
}

impl LeagueSettings {
    pub fn rounds(&self) -> usize {
        self.draft_order.len()
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |msg: String| Err(SettingsError::Invalid(msg));

        if self.num_teams < 2 || self.num_teams % 2 != 0 {
            return invalid(format!(
                "num_teams must be an even number of at least 2, got {}",
                self.num_teams
            ));
        }
        if self.season_weeks == 0 {
            return invalid("season_weeks must be positive".to_string());
        }
        if self.strategy_mix.total() != self.num_teams {
            return invalid(format!(
                "strategy mix covers {} teams but the league has {}",
                self.strategy_mix.total(),
                self.num_teams
            ));
        }
        if self.strategy_mix.draft_helper != 1 {
            return invalid("exactly one team must use the draft helper".to_string());
        }
        if self.rounds() != self.roster_limits.roster_size() {
            return invalid(format!(
                "draft order has {} rounds but rosters hold {} players",
                self.rounds(),
                self.roster_limits.roster_size()
            ));
        }
        for position in Position::ALL {
            if self.lineup.starters_for(position) > self.roster_limits.max_for(position) {
                return invalid(format!("lineup starts more {position} than a roster may hold"));
            }
        }
        if !(0.0..=1.0).contains(&self.opponent_error_rate) {
            return invalid(format!(
                "opponent_error_rate must be within [0, 1], got {}",
                self.opponent_error_rate
            ));
        }
        if self.opponent_error_pool == 0 {
            return invalid("opponent_error_pool must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Load and validate league settings from a YAML file.
pub fn load_league_settings(path: impl AsRef<Path>) -> Result<LeagueSettings, SettingsError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let settings: LeagueSettings = serde_yaml::from_str(&raw)?;
    settings.validate()?;
    Ok(settings)
}
