//! Parameter-driven scoring: draft valuation for the helper team and weekly
//! matchup-adjusted points for every starter.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::{InjuryStatus, Player, Position};
use crate::params::ConfigValidationError;

// Tier cut-offs. Percentiles are rank / count, 0.0 being the best.
const ADP_EXCELLENT_MAX: f64 = 30.0;
const ADP_GOOD_MAX: f64 = 70.0;
const ADP_POOR_MIN: f64 = 150.0;
const RATING_EXCELLENT_MIN: f64 = 80.0;
const RATING_GOOD_MIN: f64 = 60.0;
const RATING_POOR_MAX: f64 = 35.0;
const TEAM_EXCELLENT_PERCENTILE: f64 = 0.25;
const TEAM_GOOD_PERCENTILE: f64 = 0.5;
const TEAM_POOR_PERCENTILE: f64 = 0.75;
const VOLATILITY_LOW_MAX: f64 = 0.35;
const VOLATILITY_MEDIUM_MAX: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DraftOrderBonuses {
    pub primary: f64,
    pub secondary: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct MatchupMultipliers {
    pub excellent: f64,
    pub good: f64,
    pub neutral: f64,
    pub poor: f64,
    pub very_poor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct InjuryPenalties {
    pub medium: f64,
    pub high: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct QualityTiers {
    pub excellent: f64,
    pub good: f64,
    pub poor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct QualityScoring {
    pub multipliers: QualityTiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ConsistencyTiers {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ConsistencyScoring {
    pub multipliers: ConsistencyTiers,
}

/// A fully resolved configuration, in the nested document layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ScoringParameters {
    pub normalization_max_scale: f64,
    pub draft_order_bonuses: DraftOrderBonuses,
    pub matchup_multipliers: MatchupMultipliers,
    pub injury_penalties: InjuryPenalties,
    pub base_bye_penalty: f64,
    pub adp_scoring: QualityScoring,
    pub player_rating_scoring: QualityScoring,
    pub team_quality_scoring: QualityScoring,
    pub consistency_scoring: ConsistencyScoring,
}

impl Default for ScoringParameters {
    fn default() -> Self {
        Self {
            normalization_max_scale: 100.0,
            draft_order_bonuses: DraftOrderBonuses {
                primary: 50.0,
                secondary: 25.0,
            },
            matchup_multipliers: MatchupMultipliers {
                excellent: 1.2,
                good: 1.1,
                neutral: 1.0,
                poor: 0.9,
                very_poor: 0.8,
            },
            injury_penalties: InjuryPenalties {
                medium: 25.0,
                high: 50.0,
            },
            base_bye_penalty: 20.0,
            adp_scoring: QualityScoring {
                multipliers: QualityTiers {
                    excellent: 1.15,
                    good: 1.05,
                    poor: 0.9,
                },
            },
            player_rating_scoring: QualityScoring {
                multipliers: QualityTiers {
                    excellent: 1.15,
                    good: 1.05,
                    poor: 0.9,
                },
            },
            team_quality_scoring: QualityScoring {
                multipliers: QualityTiers {
                    excellent: 1.1,
                    good: 1.05,
                    poor: 0.95,
                },
            },
            consistency_scoring: ConsistencyScoring {
                multipliers: ConsistencyTiers {
                    low: 1.05,
                    medium: 1.0,
                    high: 0.95,
                },
            },
        }
    }
}

impl ScoringParameters {
    /// Typed view of a nested configuration document.
    pub fn from_document(document: &Value) -> Result<Self, ConfigValidationError> {
        Self::deserialize(document).map_err(|err| ConfigValidationError::Layout(err.to_string()))
    }

    pub fn adp_multiplier(&self, adp: Option<f64>) -> f64 {
        let tiers = &self.adp_scoring.multipliers;
        match adp {
            Some(adp) if adp <= ADP_EXCELLENT_MAX => tiers.excellent,
            Some(adp) if adp <= ADP_GOOD_MAX => tiers.good,
            Some(adp) if adp >= ADP_POOR_MIN => tiers.poor,
            Some(_) => 1.0,
            None => tiers.poor,
        }
    }

    pub fn rating_multiplier(&self, rating: f64) -> f64 {
        let tiers = &self.player_rating_scoring.multipliers;
        if rating >= RATING_EXCELLENT_MIN {
            tiers.excellent
        } else if rating >= RATING_GOOD_MIN {
            tiers.good
        } else if rating <= RATING_POOR_MAX {
            tiers.poor
        } else {
            1.0
        }
    }

    pub fn team_quality_multiplier(&self, percentile: f64) -> f64 {
        let tiers = &self.team_quality_scoring.multipliers;
        if percentile < TEAM_EXCELLENT_PERCENTILE {
            tiers.excellent
        } else if percentile < TEAM_GOOD_PERCENTILE {
            tiers.good
        } else if percentile >= TEAM_POOR_PERCENTILE {
            tiers.poor
        } else {
            1.0
        }
    }

    pub fn consistency_multiplier(&self, volatility: f64) -> f64 {
        let tiers = &self.consistency_scoring.multipliers;
        if volatility < VOLATILITY_LOW_MAX {
            tiers.low
        } else if volatility < VOLATILITY_MEDIUM_MAX {
            tiers.medium
        } else {
            tiers.high
        }
    }

    /// Five tiers keyed to the opposing defense. A stronger defense is a worse matchup.
    pub fn matchup_multiplier(&self, opposing_defense: Option<f64>) -> f64 {
        let tiers = &self.matchup_multipliers;
        match opposing_defense {
            None => tiers.neutral,
            Some(p) if p < 0.2 => tiers.very_poor,
            Some(p) if p < 0.4 => tiers.poor,
            Some(p) if p < 0.6 => tiers.neutral,
            Some(p) if p < 0.8 => tiers.good,
            Some(_) => tiers.excellent,
        }
    }

    /// Draft-time penalty in points.
    pub fn injury_draft_penalty(&self, status: InjuryStatus) -> f64 {
        match status {
            InjuryStatus::Low => 0.0,
            InjuryStatus::Medium => self.injury_penalties.medium,
            InjuryStatus::High => self.injury_penalties.high,
        }
    }

    /// Weekly scoring factor: the penalty read as a percentage reduction.
    pub fn injury_weekly_factor(&self, status: InjuryStatus) -> f64 {
        (1.0 - self.injury_draft_penalty(status) / 100.0).clamp(0.0, 1.0)
    }
}

/// Inputs to the helper team's draft valuation that depend on the pool and roster.
#[derive(Debug, Clone, Copy)]
pub struct DraftValuation {
    pub season_projection: f64,
    pub max_available_projection: f64,
    pub team_quality: f64,
    pub volatility: f64,
    pub round_bonus: f64,
    pub bye_conflicts: usize,
}

/// Helper-team score for drafting `player`.
pub fn draft_score(params: &ScoringParameters, player: &Player, valuation: &DraftValuation) -> f64 {
    let normalized = if valuation.max_available_projection > 0.0 {
        valuation.season_projection / valuation.max_available_projection
            * params.normalization_max_scale
    } else {
        0.0
    };

    let weighted = normalized
        * params.adp_multiplier(player.average_draft_position)
        * params.rating_multiplier(player.player_rating)
        * params.team_quality_multiplier(valuation.team_quality)
        * params.consistency_multiplier(valuation.volatility);

    weighted + valuation.round_bonus
        - params.injury_draft_penalty(player.injury_status)
        - params.base_bye_penalty * valuation.bye_conflicts as f64
}

/// Points a starter contributes in `week`. Bye weeks score zero; the team-level
/// bye penalty is applied separately. DST keeps negative scores.
pub fn adjusted_week_score(
    params: &ScoringParameters,
    player: &Player,
    week: u32,
    opposing_defense: Option<f64>,
) -> f64 {
    if player.is_on_bye(week) {
        return 0.0;
    }
    let raw = player.week_points(week) * params.injury_weekly_factor(player.injury_status);
    if player.position == Position::Dst {
        raw
    } else {
        (raw * params.matchup_multiplier(opposing_defense)).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ConfigGenerator, ParameterSchema};
    use std::collections::BTreeMap;

    fn player(position: Position, weekly: f64) -> Player {
        Player {
            id: 9,
            name: "P".to_string(),
            position,
            team: "T01".to_string(),
            bye_week: Some(3),
            weekly_points: vec![weekly; 17],
            average_draft_position: Some(10.0),
            player_rating: 90.0,
            injury_status: InjuryStatus::Low,
            weekly_actual_points: None,
        }
    }

    #[test]
    fn typed_parameters_read_generated_documents() {
        let schema = ParameterSchema::default_scoring();
        let params: BTreeMap<String, Vec<f64>> = schema
            .fields()
            .iter()
            .enumerate()
            .map(|(i, field)| (field.name.clone(), vec![i as f64 + 1.0]))
            .collect();
        let generator = ConfigGenerator::from_parameters(params);
        let combination = generator.first_combination().unwrap();
        let document = generator.create_config_dict(&combination);
        let typed = ScoringParameters::from_document(&document).unwrap();
        assert_eq!(
            typed.matchup_multipliers.very_poor,
            combination["MATCHUP_VERY_POOR_MULTIPLIER"]
        );
        assert_eq!(
            typed.consistency_scoring.multipliers.medium,
            combination["CONSISTENCY_MEDIUM_MULTIPLIER"]
        );
        assert_eq!(typed.base_bye_penalty, combination["BASE_BYE_PENALTY"]);

        let round_trip = serde_json::to_value(typed).unwrap();
        assert_eq!(generator.flatten_config_dict(&round_trip).unwrap(), combination);
    }

    #[test]
    fn incomplete_document_is_a_layout_error() {
        let err = ScoringParameters::from_document(&serde_json::json!({"BASE_BYE_PENALTY": 1}))
            .unwrap_err();
        assert!(matches!(err, ConfigValidationError::Layout(_)));
    }

    #[test]
    fn weekly_score_rules() {
        let params = ScoringParameters::default();
        let wr = player(Position::Wr, 10.0);
        assert_eq!(adjusted_week_score(&params, &wr, 3, None), 0.0);
        assert!((adjusted_week_score(&params, &wr, 1, Some(0.1)) - 8.0).abs() < 1e-9);
        assert!((adjusted_week_score(&params, &wr, 1, Some(0.9)) - 12.0).abs() < 1e-9);

        let mut injured = player(Position::Rb, 10.0);
        injured.injury_status = InjuryStatus::Medium;
        assert!((adjusted_week_score(&params, &injured, 1, None) - 7.5).abs() < 1e-9);

        let negative_wr = player(Position::Wr, -2.0);
        assert_eq!(adjusted_week_score(&params, &negative_wr, 1, None), 0.0);
        let negative_dst = player(Position::Dst, -4.0);
        assert_eq!(adjusted_week_score(&params, &negative_dst, 1, Some(0.95)), -4.0);
    }

    #[test]
    fn draft_score_combines_tiers_bonus_and_penalties() {
        let params = ScoringParameters::default();
        let p = player(Position::Qb, 20.0);
        let valuation = DraftValuation {
            season_projection: 340.0,
            max_available_projection: 340.0,
            team_quality: 0.1,
            volatility: 0.0,
            round_bonus: 50.0,
            bye_conflicts: 2,
        };
        let expected = 100.0 * 1.15 * 1.15 * 1.1 * 1.05 + 50.0 - 40.0;
        assert!((draft_score(&params, &p, &valuation) - expected).abs() < 1e-9);

        let mut hurt = p.clone();
        hurt.injury_status = InjuryStatus::High;
        assert!((draft_score(&params, &hurt, &valuation) - (expected - 50.0)).abs() < 1e-9);
    }
}
