//! Mean absolute error between projected and observed points.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::data::WeeklyPoints;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyResult {
    pub mae: f64,
    /// Pairs that counted towards the error.
    pub player_count: usize,
    pub total_error: f64,
}

impl AccuracyResult {
    fn from_totals(total_error: f64, player_count: usize) -> Self {
        if player_count == 0 {
            return Self::default();
        }
        Self {
            mae: total_error / player_count as f64,
            player_count,
            total_error,
        }
    }
}

/// MAE over `(projected, actual)` pairs. Pairs with `actual <= 0` mean the
/// player did not play and are left out of numerator and denominator.
pub fn calculate_mae(pairs: &[(f64, f64)]) -> AccuracyResult {
    let (total_error, count) = pairs
        .iter()
        .filter(|(_, actual)| *actual > 0.0)
        .fold((0.0, 0usize), |(sum, count), (projected, actual)| {
            (sum + (projected - actual).abs(), count + 1)
        });
    AccuracyResult::from_totals(total_error, count)
}

/// MAE over every player-week in `weeks` present on both sides.
pub fn calculate_weekly_mae(
    projections: &WeeklyPoints,
    actuals: &WeeklyPoints,
    weeks: RangeInclusive<u32>,
) -> AccuracyResult {
    let mut pairs = Vec::new();
    for week in weeks.clone() {
        let (Some(projected), Some(observed)) = (projections.get(&week), actuals.get(&week)) else {
            warn!(week, "week data missing, skipping");
            continue;
        };
        pairs.extend(
            projected
                .iter()
                .filter_map(|(id, points)| observed.get(id).map(|actual| (*points, *actual))),
        );
    }
    debug!(
        start = weeks.start(),
        end = weeks.end(),
        pairs = pairs.len(),
        "weekly MAE inputs"
    );
    calculate_mae(&pairs)
}

/// Player-count weighted combination of several results.
pub fn aggregate_season_results<S: AsRef<str>>(results: &[(S, AccuracyResult)]) -> AccuracyResult {
    let (total_error, count) = results.iter().fold((0.0, 0usize), |(sum, count), (label, result)| {
        debug!(label = label.as_ref(), mae = result.mae, players = result.player_count, "aggregating");
        (sum + result.total_error, count + result.player_count)
    });
    AccuracyResult::from_totals(total_error, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn empty_or_unplayed_inputs_have_no_error() {
        assert_eq!(calculate_mae(&[]), AccuracyResult::default());
        let benched = calculate_mae(&[(10.0, 0.0), (7.5, -1.0)]);
        assert_eq!(benched.mae, 0.0);
        assert_eq!(benched.player_count, 0);
    }

    #[test]
    fn non_positive_actuals_are_excluded_from_both_sides() {
        let result = calculate_mae(&[(10.0, 12.0), (8.0, 0.0), (5.0, 2.0)]);
        assert_eq!(result.player_count, 2);
        assert_eq!(result.total_error, 5.0);
        assert_eq!(result.mae, 2.5);
    }

    #[test]
    fn aggregation_weights_by_player_count() {
        let a = AccuracyResult {
            mae: 5.0,
            player_count: 50,
            total_error: 250.0,
        };
        let b = AccuracyResult {
            mae: 3.0,
            player_count: 150,
            total_error: 450.0,
        };
        let combined = aggregate_season_results(&[("2023", a), ("2024", b)]);
        assert_eq!(combined.player_count, 200);
        assert!((combined.mae - 3.5).abs() < 1e-12);
        assert_eq!(aggregate_season_results::<&str>(&[]), AccuracyResult::default());
    }

    #[test]
    fn weekly_mae_skips_missing_weeks_and_players() {
        let mut projections = WeeklyPoints::new();
        let mut actuals = WeeklyPoints::new();
        projections.insert(1, BTreeMap::from([(1, 10.0), (2, 4.0)]));
        actuals.insert(1, BTreeMap::from([(1, 14.0)]));
        projections.insert(2, BTreeMap::from([(1, 9.0)]));
        actuals.insert(2, BTreeMap::from([(1, 8.0)]));
        projections.insert(3, BTreeMap::from([(1, 50.0)]));

        let result = calculate_weekly_mae(&projections, &actuals, 1..=3);
        assert_eq!(result.player_count, 2);
        assert_eq!(result.mae, 2.5);

        let only_second = calculate_weekly_mae(&projections, &actuals, 2..=2);
        assert_eq!(only_second.mae, 1.0);
    }

    #[test]
    fn weekly_sums_follow_player_id_order() {
        let mut projections = WeeklyPoints::new();
        let mut actuals = WeeklyPoints::new();
        let week_projected = projections.entry(1).or_default();
        let week_actual = actuals.entry(1).or_default();
        for id in (1..=40u32).rev() {
            week_projected.insert(id, 10.0);
            week_actual.insert(id, 10.0 + 0.1 * id as f64 + 1e-9 * (id * id) as f64);
        }

        let expected = (1..=40u32).fold(0.0, |sum, id| {
            sum + (10.0 - actuals[&1][&id]).abs()
        });
        let result = calculate_weekly_mae(&projections, &actuals, 1..=1);
        assert_eq!(result.player_count, 40);
        assert_eq!(result.total_error.to_bits(), expected.to_bits());
    }
}
