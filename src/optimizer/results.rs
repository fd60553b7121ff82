//! Per-configuration aggregates. Runs are folded in one at a time (Welford), so
//! raw outcomes can be dropped as soon as a configuration finishes.

use serde::{Deserialize, Serialize};

use crate::league::SimulationResult;
use crate::parallel::RunOutcome;
use crate::params::ConfigId;

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigPerformance {
    config_id: ConfigId,
    successes: usize,
    failures: usize,
    wins: u64,
    losses: u64,
    ties: u64,
    mean_win_rate: f64,
    win_rate_m2: f64,
    mean_points: f64,
    points_m2: f64,
    first_failure: Option<String>,
}

impl ConfigPerformance {
    pub fn new(config_id: ConfigId) -> Self {
        Self {
            config_id,
            successes: 0,
            failures: 0,
            wins: 0,
            losses: 0,
            ties: 0,
            mean_win_rate: 0.0,
            win_rate_m2: 0.0,
            mean_points: 0.0,
            points_m2: 0.0,
            first_failure: None,
        }
    }

    pub fn from_outcomes(config_id: ConfigId, outcomes: &[RunOutcome]) -> Self {
        let mut performance = Self::new(config_id);
        for outcome in outcomes {
            performance.record(outcome);
        }
        performance
    }

    pub fn record(&mut self, outcome: &RunOutcome) {
        match outcome {
            Ok(result) => self.record_success(result),
            Err(failure) => {
                self.failures += 1;
                if self.first_failure.is_none() {
                    self.first_failure = Some(failure.to_string());
                }
            }
        }
    }

    fn record_success(&mut self, result: &SimulationResult) {
        self.successes += 1;
        self.wins += u64::from(result.wins);
        self.losses += u64::from(result.losses);
        self.ties += u64::from(result.ties);

        let n = self.successes as f64;
        let win_rate = result.win_rate();
        let delta = win_rate - self.mean_win_rate;
        self.mean_win_rate += delta / n;
        self.win_rate_m2 += delta * (win_rate - self.mean_win_rate);

        let delta = result.total_points - self.mean_points;
        self.mean_points += delta / n;
        self.points_m2 += delta * (result.total_points - self.mean_points);
    }

    pub fn config_id(&self) -> ConfigId {
        self.config_id
    }

    pub fn runs(&self) -> usize {
        self.successes + self.failures
    }

    pub fn successes(&self) -> usize {
        self.successes
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    /// At least one run finished; only these configurations can be selected.
    pub fn is_viable(&self) -> bool {
        self.successes > 0
    }

    pub fn mean_win_rate(&self) -> f64 {
        self.mean_win_rate
    }

    pub fn mean_points(&self) -> f64 {
        self.mean_points
    }

    /// Sample variance; 0.0 below two successful runs.
    pub fn win_rate_variance(&self) -> f64 {
        sample_variance(self.win_rate_m2, self.successes)
    }

    pub fn points_variance(&self) -> f64 {
        sample_variance(self.points_m2, self.successes)
    }

    pub fn summary(&self) -> PerformanceSummary {
        PerformanceSummary {
            config_id: self.config_id,
            config_name: self.config_id.to_string(),
            runs: self.runs(),
            successes: self.successes,
            failures: self.failures,
            mean_win_rate: self.mean_win_rate,
            win_rate_variance: self.win_rate_variance(),
            mean_points: self.mean_points,
            points_variance: self.points_variance(),
            wins: self.wins,
            losses: self.losses,
            ties: self.ties,
            first_failure: self.first_failure.clone(),
        }
    }
}

fn sample_variance(m2: f64, count: usize) -> f64 {
    if count < 2 {
        0.0
    } else {
        m2 / (count - 1) as f64
    }
}

/// Flat, serializable view of a [ConfigPerformance]; one CSV row per configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub config_id: ConfigId,
    pub config_name: String,
    pub runs: usize,
    pub successes: usize,
    pub failures: usize,
    pub mean_win_rate: f64,
    pub win_rate_variance: f64,
    pub mean_points: f64,
    pub points_variance: f64,
    pub wins: u64,
    pub losses: u64,
    pub ties: u64,
    pub first_failure: Option<String>,
}
