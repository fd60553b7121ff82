use std::fmt;

use serde::{Deserialize, Serialize};

/// Regular-season weeks covered by projections.
pub const SEASON_WEEKS: usize = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "QB")]
    Qb,
    #[serde(rename = "RB")]
    Rb,
    #[serde(rename = "WR")]
    Wr,
    #[serde(rename = "TE")]
    Te,
    #[serde(rename = "K")]
    K,
    #[serde(rename = "DST", alias = "DEF", alias = "D/ST")]
    Dst,
}

impl Position {
    pub const ALL: [Position; 6] = [
        Position::Qb,
        Position::Rb,
        Position::Wr,
        Position::Te,
        Position::K,
        Position::Dst,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Qb => "QB",
            Self::Rb => "RB",
            Self::Wr => "WR",
            Self::Te => "TE",
            Self::K => "K",
            Self::Dst => "DST",
        }
    }

    /// RB, WR and TE can fill the FLEX slot.
    pub fn is_flex_eligible(&self) -> bool {
        matches!(self, Self::Rb | Self::Wr | Self::Te)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "QB" => Some(Self::Qb),
            "RB" => Some(Self::Rb),
            "WR" => Some(Self::Wr),
            "TE" => Some(Self::Te),
            "K" => Some(Self::K),
            "DST" | "DEF" | "D/ST" => Some(Self::Dst),
            _ => None,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InjuryStatus {
    #[default]
    #[serde(alias = "ACTIVE", alias = "HEALTHY")]
    Low,
    #[serde(alias = "QUESTIONABLE")]
    Medium,
    #[serde(alias = "OUT", alias = "DOUBTFUL", alias = "IR")]
    High,
}

impl InjuryStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "" | "LOW" | "ACTIVE" | "HEALTHY" => Some(Self::Low),
            "MEDIUM" | "QUESTIONABLE" => Some(Self::Medium),
            "HIGH" | "OUT" | "DOUBTFUL" | "IR" => Some(Self::High),
            _ => None,
        }
    }
}

/// A draftable player. Read-only once the pool is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: u32,
    pub name: String,
    pub position: Position,
    pub team: String,
    #[serde(default)]
    pub bye_week: Option<u32>,
    /// Projected points for weeks 1..=17, index 0 is week 1.
    pub weekly_points: Vec<f64>,
    #[serde(default)]
    pub average_draft_position: Option<f64>,
    pub player_rating: f64,
    #[serde(default)]
    pub injury_status: InjuryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_actual_points: Option<Vec<f64>>,
}

impl Player {
    /// Projection for a 1-based week; zero outside the season.
    pub fn week_points(&self, week: u32) -> f64 {
        week.checked_sub(1)
            .and_then(|idx| self.weekly_points.get(idx as usize))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn season_projection(&self) -> f64 {
        self.weekly_points.iter().sum()
    }

    pub fn is_on_bye(&self, week: u32) -> bool {
        self.bye_week == Some(week)
    }

    /// Coefficient of variation of the weekly projections, bye week excluded.
    /// Players with no positive average are treated as maximally volatile.
    pub fn volatility(&self) -> f64 {
        let weeks: Vec<f64> = self
            .weekly_points
            .iter()
            .enumerate()
            .filter(|(idx, _)| !self.is_on_bye(*idx as u32 + 1))
            .map(|(_, points)| *points)
            .collect();
        if weeks.is_empty() {
            return f64::INFINITY;
        }
        let mean = weeks.iter().sum::<f64>() / weeks.len() as f64;
        if mean <= 0.0 {
            return f64::INFINITY;
        }
        let variance = weeks.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / weeks.len() as f64;
        variance.sqrt() / mean
    }
}
