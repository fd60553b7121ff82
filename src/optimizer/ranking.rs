use std::cmp::Ordering;

use super::ConfigPerformance;

/// Best first: higher mean win rate, higher mean points, lower win-rate
/// variance, then lower configuration index.
pub fn compare_performance(left: &ConfigPerformance, right: &ConfigPerformance) -> Ordering {
    right
        .mean_win_rate()
        .total_cmp(&left.mean_win_rate())
        .then_with(|| right.mean_points().total_cmp(&left.mean_points()))
        .then_with(|| left.win_rate_variance().total_cmp(&right.win_rate_variance()))
        .then_with(|| left.config_id().cmp(&right.config_id()))
}

/// Viable configurations in ranking order. Configurations without a single
/// successful run are left out.
pub fn rank_configurations(performances: &[ConfigPerformance]) -> Vec<&ConfigPerformance> {
    let mut ranked: Vec<&ConfigPerformance> = performances
        .iter()
        .filter(|performance| performance.is_viable())
        .collect();
    ranked.sort_by(|left, right| compare_performance(left, right));
    ranked
}

pub fn select_optimal(performances: &[ConfigPerformance]) -> Option<&ConfigPerformance> {
    performances
        .iter()
        .filter(|performance| performance.is_viable())
        .min_by(|left, right| compare_performance(left, right))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::league::SimulationResult;
    use crate::parallel::RunFailure;
    use crate::params::ConfigId;

    fn perf(id: u64, seasons: &[(u32, u32, f64)]) -> ConfigPerformance {
        let outcomes: Vec<_> = seasons
            .iter()
            .map(|&(wins, losses, total_points)| {
                Ok(SimulationResult {
                    wins,
                    losses,
                    ties: 0,
                    total_points,
                })
            })
            .collect();
        ConfigPerformance::from_outcomes(ConfigId(id), &outcomes)
    }

    #[test]
    fn win_rate_then_points_then_variance_then_index() {
        let steady = perf(4, &[(1, 1, 2000.0), (1, 1, 2000.0)]);
        let swingy = perf(2, &[(0, 2, 2000.0), (2, 0, 2000.0)]);
        let more_points = perf(7, &[(1, 1, 2100.0), (1, 1, 2100.0)]);
        let best = perf(9, &[(3, 1, 1500.0), (3, 1, 1500.0)]);
        let twin = perf(1, &[(1, 1, 2000.0), (1, 1, 2000.0)]);

        let all = vec![steady, swingy, more_points, best, twin];
        let order: Vec<u64> = rank_configurations(&all)
            .iter()
            .map(|p| p.config_id().0)
            .collect();
        assert_eq!(order, vec![9, 7, 1, 4, 2]);
        assert_eq!(select_optimal(&all).map(|p| p.config_id()), Some(ConfigId(9)));
    }

    #[test]
    fn all_failed_configurations_are_never_selected() {
        let failed = ConfigPerformance::from_outcomes(
            ConfigId(0),
            &[Err(RunFailure {
                run_index: 0,
                seed: 0,
                message: "no".into(),
            })],
        );
        let weak = perf(1, &[(1, 16, 100.0)]);
        let all = vec![failed.clone(), weak];
        assert_eq!(rank_configurations(&all).len(), 1);
        assert_eq!(select_optimal(&all).map(|p| p.config_id()), Some(ConfigId(1)));
        assert!(select_optimal(&[failed]).is_none());
    }
}
