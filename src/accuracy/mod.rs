//! Projection accuracy: MAE against observed points plus per-position ranking metrics.

pub mod calculator;
pub mod ranking;

pub use calculator::{
    aggregate_season_results, calculate_mae, calculate_weekly_mae, AccuracyResult,
};
pub use ranking::{
    calculate_pairwise_accuracy, calculate_spearman_correlation, calculate_top_n_accuracy,
    RankingSample, MIN_MEANINGFUL_POINTS,
};

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::data::{PlayerPool, Position, SEASON_WEEKS};

/// Week windows the season is graded over.
const WEEK_WINDOWS: [(u32, u32); 4] = [(1, 4), (5, 8), (9, 12), (13, SEASON_WEEKS as u32)];

#[derive(Debug, Clone, Serialize)]
pub struct PositionAccuracy {
    pub pairwise: f64,
    pub top_5: f64,
    pub top_10: f64,
    pub spearman: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccuracyReport {
    pub overall: AccuracyResult,
    pub windows: BTreeMap<String, AccuracyResult>,
    pub by_position: BTreeMap<Position, PositionAccuracy>,
}

/// Grade the pool's projections. `None` when no player carries actual points.
pub fn evaluate_pool(pool: &PlayerPool) -> Option<AccuracyReport> {
    let (projections, actuals) = pool.accuracy_inputs()?;

    let labeled: Vec<(String, AccuracyResult)> = WEEK_WINDOWS
        .iter()
        .map(|&(start, end)| {
            (
                format!("weeks_{start}_{end}"),
                calculate_weekly_mae(&projections, &actuals, start..=end),
            )
        })
        .collect();
    let overall = aggregate_season_results(&labeled);

    let samples: Vec<RankingSample> = pool
        .players()
        .iter()
        .filter_map(|player| {
            let actual = player.weekly_actual_points.as_ref()?;
            Some(RankingSample {
                player_id: player.id,
                position: player.position,
                projected: player.weekly_points.iter().sum(),
                actual: actual.iter().sum(),
            })
        })
        .collect();

    let by_position = Position::ALL
        .iter()
        .map(|&position| {
            let metrics = PositionAccuracy {
                pairwise: calculate_pairwise_accuracy(&samples, position),
                top_5: calculate_top_n_accuracy(&samples, 5, position),
                top_10: calculate_top_n_accuracy(&samples, 10, position),
                spearman: calculate_spearman_correlation(&samples, position),
            };
            (position, metrics)
        })
        .collect();

    info!(mae = overall.mae, player_weeks = overall.player_count, "projection accuracy");
    Some(AccuracyReport {
        overall,
        windows: labeled.into_iter().collect(),
        by_position,
    })
}
