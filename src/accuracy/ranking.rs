//! Ordering quality of projections within a position: does the projection sort
//! players the same way the season did.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::data::Position;

/// Below this many actual points a performance is noise and is not ranked.
pub const MIN_MEANINGFUL_POINTS: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingSample {
    pub player_id: u32,
    pub position: Position,
    pub projected: f64,
    pub actual: f64,
}

fn meaningful(samples: &[RankingSample], position: Position) -> Vec<&RankingSample> {
    samples
        .iter()
        .filter(|sample| sample.position == position && sample.actual >= MIN_MEANINGFUL_POINTS)
        .collect()
}

/// Share of player pairs whose projected order matches the actual order.
/// Pairs tied on actual points are skipped; 0.0 when nothing can be compared.
pub fn calculate_pairwise_accuracy(samples: &[RankingSample], position: Position) -> f64 {
    let players = meaningful(samples, position);
    let mut correct = 0usize;
    let mut total = 0usize;
    for (i, left) in players.iter().enumerate() {
        for right in &players[i + 1..] {
            if left.actual == right.actual {
                continue;
            }
            if (left.projected > right.projected) == (left.actual > right.actual) {
                correct += 1;
            }
            total += 1;
        }
    }
    if total == 0 {
        if players.len() >= 2 {
            warn!(%position, "no comparable pairs, all actual scores tied");
        }
        return 0.0;
    }
    let accuracy = correct as f64 / total as f64;
    debug!(%position, correct, total, accuracy, "pairwise accuracy");
    accuracy
}

/// Overlap between the projected and actual top `n`, as a fraction of `n`.
/// 0.0 when fewer than `n` players qualify.
pub fn calculate_top_n_accuracy(samples: &[RankingSample], n: usize, position: Position) -> f64 {
    let mut players = meaningful(samples, position);
    if n == 0 || players.len() < n {
        return 0.0;
    }

    players.sort_by(|a, b| b.projected.total_cmp(&a.projected));
    let predicted: HashSet<u32> = players[..n].iter().map(|sample| sample.player_id).collect();
    players.sort_by(|a, b| b.actual.total_cmp(&a.actual));
    let overlap = players[..n]
        .iter()
        .filter(|sample| predicted.contains(&sample.player_id))
        .count();
    overlap as f64 / n as f64
}

/// Spearman rank correlation with average ranks for ties. 0.0 with fewer than
/// two players or zero variance.
pub fn calculate_spearman_correlation(samples: &[RankingSample], position: Position) -> f64 {
    let players = meaningful(samples, position);
    if players.len() < 2 {
        return 0.0;
    }
    let projected = average_ranks(&players.iter().map(|s| s.projected).collect::<Vec<_>>());
    let actual = average_ranks(&players.iter().map(|s| s.actual).collect::<Vec<_>>());
    pearson(&projected, &actual).unwrap_or_else(|| {
        warn!(%position, "zero variance in projections or actuals");
        0.0
    })
}

fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        let rank = (start + end - 1) as f64 / 2.0 + 1.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(player_id: u32, projected: f64, actual: f64) -> RankingSample {
        RankingSample {
            player_id,
            position: Position::Wr,
            projected,
            actual,
        }
    }

    #[test]
    fn pairwise_counts_agreeing_orders_and_skips_ties() {
        let samples = [
            sample(1, 20.0, 18.0),
            sample(2, 15.0, 12.0),
            sample(3, 10.0, 14.0),
            sample(4, 30.0, 14.0),
            sample(5, 50.0, 1.0),
        ];
        // (1,2) (1,3) (2,4) agree, (1,4) (2,3) do not, (3,4) is tied on actual.
        // Player 5 is below the meaningful threshold.
        let accuracy = calculate_pairwise_accuracy(&samples, Position::Wr);
        assert!((accuracy - 3.0 / 5.0).abs() < 1e-12, "{accuracy}");
        assert_eq!(calculate_pairwise_accuracy(&samples, Position::Qb), 0.0);
    }

    #[test]
    fn top_n_overlap() {
        let samples = [
            sample(1, 20.0, 5.0),
            sample(2, 18.0, 25.0),
            sample(3, 16.0, 20.0),
            sample(4, 10.0, 30.0),
        ];
        assert_eq!(calculate_top_n_accuracy(&samples, 2, Position::Wr), 0.5);
        assert_eq!(calculate_top_n_accuracy(&samples, 3, Position::Wr), 2.0 / 3.0);
        assert_eq!(calculate_top_n_accuracy(&samples, 5, Position::Wr), 0.0);
    }

    #[test]
    fn spearman_handles_perfect_and_degenerate_orders() {
        let perfect = [sample(1, 1.0, 10.0), sample(2, 2.0, 20.0), sample(3, 3.0, 30.0)];
        assert!((calculate_spearman_correlation(&perfect, Position::Wr) - 1.0).abs() < 1e-12);

        let reversed = [sample(1, 3.0, 10.0), sample(2, 2.0, 20.0), sample(3, 1.0, 30.0)];
        assert!((calculate_spearman_correlation(&reversed, Position::Wr) + 1.0).abs() < 1e-12);

        let flat = [sample(1, 5.0, 10.0), sample(2, 5.0, 20.0)];
        assert_eq!(calculate_spearman_correlation(&flat, Position::Wr), 0.0);
    }

    #[test]
    fn tied_values_share_the_average_rank() {
        assert_eq!(average_ranks(&[10.0, 20.0, 10.0, 5.0]), vec![2.5, 4.0, 2.5, 1.0]);
    }
}
