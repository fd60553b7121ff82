//! Team rosters, slot eligibility and weekly lineup selection.

use std::collections::BTreeMap;

use serde::Serialize;

use super::settings::{LineupSlots, RosterLimits};
use super::strategy::DraftStrategy;
use crate::data::{PlayerPool, Position};

/// Drafted players of one team, as pool indices.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    picks: Vec<usize>,
    by_position: BTreeMap<Position, Vec<usize>>,
}

impl Roster {
    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    /// Pool indices in draft order.
    pub fn picks(&self) -> &[usize] {
        &self.picks
    }

    pub fn at_position(&self, position: Position) -> &[usize] {
        self.by_position
            .get(&position)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn count(&self, position: Position) -> usize {
        self.at_position(position).len()
    }

    pub fn add(&mut self, index: usize, position: Position) {
        self.picks.push(index);
        self.by_position.entry(position).or_default().push(index);
    }

    /// FLEX spots consumed by RB/WR/TE beyond their own limits.
    pub fn flex_used(&self, limits: &RosterLimits) -> usize {
        Position::ALL
            .iter()
            .filter(|position| position.is_flex_eligible())
            .map(|position| self.count(*position).saturating_sub(limits.max_for(*position)))
            .sum()
    }

    pub fn can_add(&self, position: Position, limits: &RosterLimits) -> bool {
        if self.len() >= limits.roster_size() {
            return false;
        }
        if self.count(position) < limits.max_for(position) {
            return true;
        }
        position.is_flex_eligible() && self.flex_used(limits) < limits.flex
    }

    /// Rostered players sharing `bye_week`.
    pub fn bye_conflicts(&self, pool: &PlayerPool, bye_week: Option<u32>) -> usize {
        let Some(week) = bye_week else {
            return 0;
        };
        self.picks
            .iter()
            .filter(|&&idx| pool.player(idx).bye_week == Some(week))
            .count()
    }

    /// Best lineup by `value`: fixed positions first, then FLEX from the leftovers.
    /// Ties fall to the earlier pool index.
    pub fn select_lineup<F>(&self, slots: &LineupSlots, value: F) -> Vec<usize>
    where
        F: Fn(usize) -> f64,
    {
        let ranked = |candidates: &mut Vec<usize>| {
            candidates.sort_by(|&a, &b| value(b).total_cmp(&value(a)).then_with(|| a.cmp(&b)));
        };

        let mut lineup = Vec::new();
        let mut flex_pool = Vec::new();
        for position in Position::ALL {
            let mut candidates = self.at_position(position).to_vec();
            ranked(&mut candidates);
            let starters = slots.starters_for(position).min(candidates.len());
            lineup.extend_from_slice(&candidates[..starters]);
            if position.is_flex_eligible() {
                flex_pool.extend_from_slice(&candidates[starters..]);
            }
        }
        ranked(&mut flex_pool);
        lineup.extend(flex_pool.into_iter().take(slots.flex));
        lineup
    }
}

/// One league member.
#[derive(Debug, Clone)]
pub struct Team {
    pub id: usize,
    pub strategy: DraftStrategy,
    pub roster: Roster,
}

impl Team {
    pub fn new(id: usize, strategy: DraftStrategy) -> Self {
        Self {
            id,
            strategy,
            roster: Roster::default(),
        }
    }
}

/// Season record of one team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TeamRecord {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub points: f64,
}

impl TeamRecord {
    pub fn games(&self) -> u32 {
        self.wins + self.losses + self.ties
    }
}
