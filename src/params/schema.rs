//! The set of parameter names a baseline must provide, and where each one lives
//! in the nested configuration document.

use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterField {
    pub name: String,
    /// Keys from the document root down to the scalar.
    pub path: Vec<String>,
}

impl ParameterField {
    pub fn new(name: &str, path: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            path: path.iter().map(|segment| segment.to_string()).collect(),
        }
    }

    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

/// Contract a baseline document is validated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSchema {
    fields: Vec<ParameterField>,
}

impl ParameterSchema {
    pub fn new(fields: Vec<ParameterField>) -> Self {
        Self { fields }
    }

    /// The 23 scoring parameters consumed by the draft and season engine.
    pub fn default_scoring() -> Self {
        let mut fields = vec![
            ParameterField::new("NORMALIZATION_MAX_SCALE", &["NORMALIZATION_MAX_SCALE"]),
            ParameterField::new("DRAFT_ORDER_PRIMARY_BONUS", &["DRAFT_ORDER_BONUSES", "PRIMARY"]),
            ParameterField::new(
                "DRAFT_ORDER_SECONDARY_BONUS",
                &["DRAFT_ORDER_BONUSES", "SECONDARY"],
            ),
            ParameterField::new("INJURY_PENALTIES_MEDIUM", &["INJURY_PENALTIES", "MEDIUM"]),
            ParameterField::new("INJURY_PENALTIES_HIGH", &["INJURY_PENALTIES", "HIGH"]),
            ParameterField::new("BASE_BYE_PENALTY", &["BASE_BYE_PENALTY"]),
        ];

        for tier in ["EXCELLENT", "GOOD", "NEUTRAL", "POOR", "VERY_POOR"] {
            fields.push(ParameterField::new(
                &format!("MATCHUP_{tier}_MULTIPLIER"),
                &["MATCHUP_MULTIPLIERS", tier],
            ));
        }

        let three_tier = [
            ("ADP", "ADP_SCORING"),
            ("PLAYER_RATING", "PLAYER_RATING_SCORING"),
            ("TEAM", "TEAM_QUALITY_SCORING"),
        ];
        for (prefix, section) in three_tier {
            for tier in ["EXCELLENT", "GOOD", "POOR"] {
                fields.push(ParameterField::new(
                    &format!("{prefix}_{tier}_MULTIPLIER"),
                    &[section, "MULTIPLIERS", tier],
                ));
            }
        }

        for tier in ["LOW", "MEDIUM", "HIGH"] {
            fields.push(ParameterField::new(
                &format!("CONSISTENCY_{tier}_MULTIPLIER"),
                &["CONSISTENCY_SCORING", "MULTIPLIERS", tier],
            ));
        }

        Self::new(fields)
    }

    pub fn fields(&self) -> &[ParameterField] {
        &self.fields
    }

    pub fn required_names(&self) -> BTreeSet<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }

    pub fn field(&self, name: &str) -> Option<&ParameterField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Nested location of `name`; names outside the schema sit at the document root.
    pub fn path_for(&self, name: &str) -> Vec<String> {
        self.field(name)
            .map(|field| field.path.clone())
            .unwrap_or_else(|| vec![name.to_string()])
    }
}

impl Default for ParameterSchema {
    fn default() -> Self {
        Self::default_scoring()
    }
}
