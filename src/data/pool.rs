//! The validated, read-only player pool shared by every simulation.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

use super::player::{Player, Position, SEASON_WEEKS};
use super::PoolError;

/// Week number to player id to points.
pub type WeeklyPoints = BTreeMap<u32, BTreeMap<u32, f64>>;

#[derive(Debug, Clone)]
pub struct PlayerPool {
    players: Vec<Player>,
    /// Rank percentile of each player's NFL offense, 0.0 is the best offense.
    team_quality: Vec<f64>,
    /// Rank percentile of each DST by season projection, 0.0 is the strongest defense.
    defense_strength: Vec<Option<f64>>,
    volatility: Vec<f64>,
    season_projection: Vec<f64>,
}

impl PlayerPool {
    pub fn new(players: Vec<Player>) -> Result<Self, PoolError> {
        if players.is_empty() {
            return Err(PoolError::Empty);
        }

        let mut ids = HashSet::with_capacity(players.len());
        for player in &players {
            if !ids.insert(player.id) {
                return Err(PoolError::DuplicateId(player.id));
            }
            validate_player(player)?;
        }

        let season_projection: Vec<f64> = players.iter().map(Player::season_projection).collect();

        let mut offense_totals: HashMap<&str, f64> = HashMap::new();
        for (player, total) in players.iter().zip(&season_projection) {
            if !matches!(player.position, Position::K | Position::Dst) {
                *offense_totals.entry(player.team.as_str()).or_insert(0.0) += total;
            }
        }
        let offense_rank = percentile_ranks(offense_totals.into_iter().collect());
        let team_quality = players
            .iter()
            .map(|p| offense_rank.get(p.team.as_str()).copied().unwrap_or(1.0))
            .collect();

        let defenses: Vec<(u32, f64)> = players
            .iter()
            .zip(&season_projection)
            .filter(|(p, _)| p.position == Position::Dst)
            .map(|(p, total)| (p.id, *total))
            .collect();
        let defense_rank = percentile_ranks(defenses);
        let defense_strength = players
            .iter()
            .map(|p| {
                (p.position == Position::Dst)
                    .then(|| defense_rank.get(&p.id).copied())
                    .flatten()
            })
            .collect();

        let volatility = players.iter().map(Player::volatility).collect();

        Ok(Self {
            players,
            team_quality,
            defense_strength,
            volatility,
            season_projection,
        })
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, index: usize) -> &Player {
        &self.players[index]
    }

    pub fn season_projection(&self, index: usize) -> f64 {
        self.season_projection[index]
    }

    pub fn team_quality(&self, index: usize) -> f64 {
        self.team_quality[index]
    }

    pub fn defense_strength(&self, index: usize) -> Option<f64> {
        self.defense_strength[index]
    }

    pub fn volatility(&self, index: usize) -> f64 {
        self.volatility[index]
    }

    pub fn count_by_position(&self, position: Position) -> usize {
        self.players.iter().filter(|p| p.position == position).count()
    }

    /// Projections and actuals for every player that carries actual points.
    pub fn accuracy_inputs(&self) -> Option<(WeeklyPoints, WeeklyPoints)> {
        let mut projections = WeeklyPoints::new();
        let mut actuals = WeeklyPoints::new();
        for player in &self.players {
            let Some(actual) = &player.weekly_actual_points else {
                continue;
            };
            for (idx, (projected, observed)) in player.weekly_points.iter().zip(actual).enumerate() {
                let week = idx as u32 + 1;
                projections.entry(week).or_default().insert(player.id, *projected);
                actuals.entry(week).or_default().insert(player.id, *observed);
            }
        }
        (!actuals.is_empty()).then_some((projections, actuals))
    }
}

fn validate_player(player: &Player) -> Result<(), PoolError> {
    let invalid = |reason: String| PoolError::Invalid {
        player_id: player.id,
        reason,
    };
    if player.weekly_points.len() != SEASON_WEEKS {
        return Err(invalid(format!(
            "expected {SEASON_WEEKS} weekly projections, found {}",
            player.weekly_points.len()
        )));
    }
    if player.weekly_points.iter().any(|p| !p.is_finite()) {
        return Err(invalid("weekly projections must be finite".to_string()));
    }
    if !(0.0..=100.0).contains(&player.player_rating) {
        return Err(invalid(format!(
            "player_rating {} outside 0-100",
            player.player_rating
        )));
    }
    if let Some(week) = player.bye_week {
        if week == 0 || week as usize > SEASON_WEEKS {
            return Err(invalid(format!("bye_week {week} outside the season")));
        }
    }
    if let Some(actual) = &player.weekly_actual_points {
        if actual.len() != SEASON_WEEKS {
            return Err(invalid(format!(
                "expected {SEASON_WEEKS} weekly actuals, found {}",
                actual.len()
            )));
        }
    }
    Ok(())
}

/// Rank entries by value descending and map each key to `rank / count`.
fn percentile_ranks<K: Ord + Hash + Copy>(mut entries: Vec<(K, f64)>) -> HashMap<K, f64> {
    entries.sort_by(|left, right| right.1.total_cmp(&left.1).then_with(|| left.0.cmp(&right.0)));
    let count = entries.len().max(1) as f64;
    entries
        .into_iter()
        .enumerate()
        .map(|(rank, (key, _))| (key, rank as f64 / count))
        .collect()
}
